//! Display utilities for rendering FPY charts in the terminal.
//!
//! The `render_*` functions build the text; the `display_*` functions print
//! it. Percentages are rounded here and nowhere else.
//!
//! # Functions
//!
//! - [`truncate`] - Truncate strings to a maximum length with ellipsis
//! - [`make_bar`] - Create visual bar charts for relative values
//! - [`print_section`] / [`print_section_simple`] - Print section headers
//! - [`render_week_series`] / [`render_quarter_series`] / [`render_units_report`] - Chart bodies
//! - [`display_dashboard`] / [`display_units_report`] - Print formatted panels

use std::fmt::Write as _;

use crate::aggregate::{QuarterSeries, SeriesPoint, UnitsReport, WeekSeries};
use crate::navigation::{DashboardView, PanelState, QuarterPanel, WeeklyPanel};
use crate::types::format_percent;

const BAR_WIDTH: usize = 20;
const LABEL_WIDTH: usize = 20;

/// Truncate a string to a maximum length, adding "..." if truncated.
///
/// Counts characters rather than bytes. For `max_len < 3`, truncates without
/// ellipsis since there's no room for "...".
///
/// # Examples
///
/// ```
/// use fpy_dashboard::display::truncate;
///
/// assert_eq!(truncate("PN-1001", 10), "PN-1001");
/// assert_eq!(truncate("PN-1001-REV-B", 8), "PN-10...");
/// assert_eq!(truncate("PN-1", 2), "PN");
/// ```
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len < 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}

/// Create a visual bar for displaying relative values.
///
/// Uses Unicode block characters; values at or below 0 draw an empty track.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn make_bar(value: f64, max_value: f64, width: usize) -> String {
    if max_value <= 0.0 || value <= 0.0 {
        return "░".repeat(width);
    }
    let ratio = (value / max_value).clamp(0.0, 1.0);
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Print a section header with equals signs.
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("  {title}");
    println!("{}", "=".repeat(60));
}

/// Print a simple section header with dashes.
pub fn print_section_simple(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(30));
}

/// Baseline column text; absence never reads as 0%.
fn baseline_text(point: &SeriesPoint) -> String {
    point.baseline.map_or_else(|| "n/a".to_string(), format_percent)
}

fn delta_text(point: &SeriesPoint) -> String {
    match point.delta() {
        Some(delta) if point.exceeds_baseline => format!("▲ {delta:+.1}"),
        Some(delta) => format!("▼ {delta:+.1}"),
        None => String::new(),
    }
}

/// Weekly chart: one row per product, then the total.
#[must_use]
pub fn render_week_series(series: &WeekSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<LABEL_WIDTH$} {:<BAR_WIDTH$} {:>7} {:>8} {:>9}  {}",
        "Product", "", "FPY", "Baseline", "Units", "Δ"
    );
    for point in &series.points {
        if point.is_total() {
            let _ = writeln!(out, "  {}", "-".repeat(LABEL_WIDTH + BAR_WIDTH + 30));
        }
        let _ = writeln!(
            out,
            "  {:<LABEL_WIDTH$} {} {:>7} {:>8} {:>9}  {}",
            truncate(&point.label, LABEL_WIDTH),
            make_bar(point.current, 100.0, BAR_WIDTH),
            format_percent(point.current),
            baseline_text(point),
            format!("{}/{}", point.passed_units, point.total_units),
            delta_text(point),
        );
    }
    out
}

/// Quarterly chart: one row per active week, oldest first.
#[must_use]
pub fn render_quarter_series(series: &QuarterSeries) -> String {
    let mut out = String::new();
    for bar in &series.bars {
        let marker = if bar.selected { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker} {:<8} {} {:>7} {:>9}",
            bar.label,
            make_bar(bar.value, 100.0, BAR_WIDTH),
            format_percent(bar.value),
            format!("{}/{}", bar.passed_units, bar.total_units),
        );
    }
    let _ = writeln!(out, "\n  {}", series.footnote);
    out
}

fn render_state<T>(state: &PanelState<T>, body: impl FnOnce(&T) -> String) -> String {
    match state {
        PanelState::Idle => String::new(),
        PanelState::Loading => "  Loading...\n".to_string(),
        PanelState::Error(message) => format!("  Error: {message}\n"),
        PanelState::Empty(message) => format!("  {message}\n"),
        PanelState::Ready(value) => body(value),
    }
}

/// Weekly panel: position, tab strip and chart.
#[must_use]
pub fn render_weekly_panel(panel: &WeeklyPanel) -> String {
    let mut out = String::new();
    if let Some(series) = panel.state.ready() {
        let _ = writeln!(out, "{}", series.title);
    }
    if let Some(position) = &panel.position_label {
        let older = if panel.can_older { "[older]" } else { "" };
        let newer = if panel.can_newer { "[newer]" } else { "" };
        let _ = writeln!(out, "  {position}  {older} {newer}");
    }
    if !panel.tabs.is_empty() {
        let tabs: Vec<String> = panel
            .tabs
            .iter()
            .map(|t| {
                if t.selected {
                    format!("[{}]", t.label)
                } else {
                    t.label.clone()
                }
            })
            .collect();
        let back = if panel.can_slide_back { "« " } else { "" };
        let forward = if panel.can_slide_forward { " »" } else { "" };
        let _ = writeln!(out, "  {back}{}{forward}\n", tabs.join(" | "));
    }
    out.push_str(&render_state(&panel.state, render_week_series));
    if panel.baseline_missing && panel.state.ready().is_some() {
        let _ = writeln!(out, "  (baseline unavailable)");
    }
    out
}

/// Quarterly panel: title and bars.
#[must_use]
pub fn render_quarter_panel(panel: &QuarterPanel) -> String {
    let mut out = String::new();
    match panel.state.ready() {
        Some(series) => {
            let _ = writeln!(out, "{}", series.title);
        }
        None => {
            let _ = writeln!(out, "Quarterly FPY - {}", panel.label);
        }
    }
    out.push_str(&render_state(&panel.state, render_quarter_series));
    out
}

/// Stacked shipped-units report as a table, newest week first.
#[must_use]
pub fn render_units_report(report: &UnitsReport) -> String {
    let mut out = String::new();
    if report.is_empty() {
        let _ = writeln!(out, "  No weekly data available.");
        return out;
    }

    let max_total = report
        .totals
        .iter()
        .map(|t| t.get())
        .max()
        .unwrap_or(0);

    for week in &report.weeks {
        #[allow(clippy::cast_precision_loss)]
        let bar = make_bar(week.total_units.get() as f64, max_total as f64, BAR_WIDTH);
        let _ = writeln!(
            out,
            "  {}  {bar} {:>6}",
            week.label, week.total_units
        );
        for t in &week.type_counts {
            let _ = writeln!(
                out,
                "      {:<LABEL_WIDTH$} {:>6}",
                truncate(&t.model_type, LABEL_WIDTH),
                t.count
            );
        }
    }

    if !report.series.is_empty() {
        let _ = writeln!(out, "\n  By model type:");
        for s in &report.series {
            let counts: Vec<String> = s.counts.iter().map(ToString::to_string).collect();
            let _ = writeln!(
                out,
                "      {:<LABEL_WIDTH$} {}",
                truncate(&s.model_type, LABEL_WIDTH),
                counts.join(", ")
            );
        }
    }
    out
}

/// Print both dashboard panels.
pub fn display_dashboard(view: &DashboardView) {
    print_section("Quarterly overview");
    print!("{}", render_quarter_panel(&view.quarter));
    print_section("Weekly detail");
    print!("{}", render_weekly_panel(&view.weekly));
}

/// Print the shipped-units report.
pub fn display_units_report(report: &UnitsReport, weeks: u32) {
    print_section_simple(&format!("Units shipped, last {weeks} weeks"));
    print!("{}", render_units_report(report));
}

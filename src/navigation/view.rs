//! Presenter-facing snapshot of the dashboard

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::quarterly::{quarter_series, week_end_label, QuarterSeries};
use crate::aggregate::weekly::{series_for, WeekSeries};
use crate::stats::BaselineMap;

use super::dashboard::Dashboard;
use super::stream::StreamStatus;

/// Empty state of the weekly panel.
pub const WEEKLY_EMPTY: &str = "No FPY data found for the selected range.";

/// Position label when the loaded range has no week at the selection.
pub const NO_WEEK_SELECTED: &str = "No week selected";

/// What a chart panel should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum PanelState<T> {
    /// Nothing requested yet
    Idle,
    Loading,
    /// Inline error text
    Error(String),
    /// Loaded, but nothing to chart
    Empty(String),
    Ready(T),
}

impl<T> PanelState<T> {
    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// One entry of the week tab strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekTab {
    pub index: usize,
    pub start: NaiveDate,
    pub label: String,
    pub selected: bool,
}

/// Weekly detail panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyPanel {
    pub anchor_date: NaiveDate,
    pub weeks_count: u32,
    pub state: PanelState<WeekSeries>,
    /// `Viewing week 2 of 6 (...)`, or [`NO_WEEK_SELECTED`] once loaded
    pub position_label: Option<String>,
    pub can_older: bool,
    pub can_newer: bool,
    /// Visible slice of the tab strip
    pub tabs: Vec<WeekTab>,
    pub can_slide_back: bool,
    pub can_slide_forward: bool,
    /// Baseline still loading or unavailable
    pub baseline_missing: bool,
}

/// Quarterly overview panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterPanel {
    pub label: String,
    pub state: PanelState<QuarterSeries>,
    pub can_prev: bool,
    pub can_next: bool,
}

/// Both panels, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub quarter: QuarterPanel,
    pub weekly: WeeklyPanel,
}

impl DashboardView {
    #[must_use]
    pub fn of(dashboard: &Dashboard) -> Self {
        Self {
            quarter: quarter_panel(dashboard),
            weekly: weekly_panel(dashboard),
        }
    }
}

fn tab_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} - {}", start.format("%b %-d"), week_end_label(end))
}

fn weekly_panel(dashboard: &Dashboard) -> WeeklyPanel {
    let empty_baseline = BaselineMap::default();
    let baseline = dashboard.baseline().data().unwrap_or(&empty_baseline);
    let index = dashboard.selected_week_index();
    let tabs_window = dashboard.week_tabs();

    let mut panel = WeeklyPanel {
        anchor_date: dashboard.anchor_date(),
        weeks_count: dashboard.weeks_count(),
        state: PanelState::Idle,
        position_label: None,
        can_older: false,
        can_newer: false,
        tabs: Vec::new(),
        can_slide_back: false,
        can_slide_forward: false,
        baseline_missing: dashboard.baseline().data().is_none(),
    };

    panel.state = match dashboard.weekly().status() {
        StreamStatus::Idle => PanelState::Idle,
        StreamStatus::Loading => PanelState::Loading,
        StreamStatus::Error(message) => PanelState::Error(message.clone()),
        StreamStatus::Loaded(weeks) => {
            let total = weeks.len();
            panel.position_label = Some(weeks.get(index).map_or_else(
                || NO_WEEK_SELECTED.to_string(),
                |week| {
                    format!(
                        "Viewing week {} of {total} ({})",
                        total - index,
                        week.range_label()
                    )
                },
            ));
            panel.can_older = index + 1 < total;
            panel.can_newer = index > 0;
            panel.tabs = tabs_window
                .visible(total)
                .map(|i| WeekTab {
                    index: i,
                    start: weeks[i].start,
                    label: tab_label(weeks[i].start, weeks[i].end),
                    selected: i == index,
                })
                .collect();
            panel.can_slide_back = tabs_window.can_slide_back();
            panel.can_slide_forward = tabs_window.can_slide_forward(total);

            series_for(weeks, index, baseline)
                .map_or_else(|| PanelState::Empty(WEEKLY_EMPTY.to_string()), PanelState::Ready)
        }
    };
    panel
}

fn quarter_panel(dashboard: &Dashboard) -> QuarterPanel {
    let quarter = dashboard.quarter();
    let selected_start = dashboard.selected_week().map(|w| w.start);

    let state = match dashboard.quarterly().status() {
        StreamStatus::Idle => PanelState::Idle,
        StreamStatus::Loading => PanelState::Loading,
        StreamStatus::Error(message) => PanelState::Error(message.clone()),
        StreamStatus::Loaded(weeks) => quarter_series(&quarter, weeks, selected_start)
            .map_or_else(
                || PanelState::Empty(format!("No FPY data found for {}.", quarter.label())),
                PanelState::Ready,
            ),
    };

    QuarterPanel {
        label: quarter.label(),
        state,
        can_prev: true,
        can_next: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{CalendarWindow, TimePolicy};
    use crate::error::Error;
    use crate::navigation::{Command, Msg, RequestTag};
    use crate::stats::{ProductStat, WeekAggregate};
    use crate::types::UnitCount;
    use chrono::Duration;
    use std::collections::HashMap;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn week(start: NaiveDate, total: u64, passed: u64) -> WeekAggregate {
        WeekAggregate::new(
            start,
            start + Duration::days(6),
            vec![ProductStat::new(
                "PN-1",
                "PN-1",
                UnitCount::new(total),
                UnitCount::new(passed),
            )],
        )
    }

    fn tag_of(commands: &[Command], pick: fn(&Command) -> Option<RequestTag>) -> RequestTag {
        commands.iter().find_map(pick).unwrap()
    }

    fn weekly_tag(c: &Command) -> Option<RequestTag> {
        match c {
            Command::FetchWeekly { tag, .. } => Some(*tag),
            _ => None,
        }
    }

    fn quarter_tag(c: &Command) -> Option<RequestTag> {
        match c {
            Command::FetchQuarter { tag, .. } => Some(*tag),
            _ => None,
        }
    }

    fn baseline_tag(c: &Command) -> Option<RequestTag> {
        match c {
            Command::FetchBaseline { tag } => Some(*tag),
            _ => None,
        }
    }

    fn loaded() -> Dashboard {
        let mut d = Dashboard::anchored(CalendarWindow::new(TimePolicy::Utc), ymd(2024, 3, 15));
        let commands = d.start();
        let weeks: Vec<WeekAggregate> = (0..6)
            .map(|i| week(ymd(2024, 3, 10) - Duration::weeks(i), 10, 8))
            .collect();
        d.update(Msg::WeeklyLoaded {
            tag: tag_of(&commands, weekly_tag),
            result: Ok(weeks.clone()),
        });
        d.update(Msg::QuarterLoaded {
            tag: tag_of(&commands, quarter_tag),
            result: Ok(weeks),
        });
        d.update(Msg::BaselineLoaded {
            tag: tag_of(&commands, baseline_tag),
            result: Ok(BaselineMap::new(
                HashMap::from([("PN-1".to_string(), 75.0)]),
                Some(90.0),
            )),
        });
        d
    }

    #[test]
    fn test_loading_state() {
        let mut d = Dashboard::anchored(CalendarWindow::new(TimePolicy::Utc), ymd(2024, 3, 15));
        assert_eq!(DashboardView::of(&d).weekly.state, PanelState::Idle);
        d.start();
        let view = DashboardView::of(&d);
        assert_eq!(view.weekly.state, PanelState::Loading);
        assert_eq!(view.quarter.state, PanelState::Loading);
        assert!(view.weekly.baseline_missing);
    }

    #[test]
    fn test_weekly_panel() {
        let d = loaded();
        let view = DashboardView::of(&d);
        let weekly = &view.weekly;
        let series = weekly.state.ready().unwrap();
        assert_eq!(series.title, "First Pass Yield for 2024-03-10 → 2024-03-16");
        assert_eq!(series.points[0].baseline, Some(75.0));
        assert!(series.points[0].exceeds_baseline);
        assert_eq!(series.total().unwrap().baseline, Some(90.0));
        assert_eq!(
            weekly.position_label.as_deref(),
            Some("Viewing week 6 of 6 (2024-03-10 → 2024-03-16)")
        );
        assert!(weekly.can_older);
        assert!(!weekly.can_newer);
        assert_eq!(weekly.tabs.len(), 6);
        assert_eq!(weekly.tabs[0].label, "Mar 10 - Mar 16");
        assert!(weekly.tabs[0].selected);
        assert!(!weekly.baseline_missing);
    }

    #[test]
    fn test_quarter_panel_highlights_selected_week() {
        let mut d = loaded();
        d.update(Msg::SelectWeek(2));
        let view = DashboardView::of(&d);
        let series = view.quarter.state.ready().unwrap();
        assert_eq!(series.title, "Quarterly FPY - Q1 2024");
        let selected: Vec<NaiveDate> = series
            .bars
            .iter()
            .filter(|b| b.selected)
            .map(|b| b.start)
            .collect();
        assert_eq!(selected, vec![ymd(2024, 2, 25)]);
        assert!(view.quarter.can_prev && view.quarter.can_next);
    }

    #[test]
    fn test_empty_and_error_states() {
        let mut d = Dashboard::anchored(CalendarWindow::new(TimePolicy::Utc), ymd(2024, 3, 15));
        let commands = d.start();
        d.update(Msg::WeeklyLoaded {
            tag: tag_of(&commands, weekly_tag),
            result: Ok(Vec::new()),
        });
        d.update(Msg::QuarterLoaded {
            tag: tag_of(&commands, quarter_tag),
            result: Ok(vec![week(ymd(2024, 3, 10), 0, 0)]),
        });
        d.update(Msg::BaselineLoaded {
            tag: tag_of(&commands, baseline_tag),
            result: Err(Error::other("down")),
        });

        let view = DashboardView::of(&d);
        assert_eq!(view.weekly.state, PanelState::Empty(WEEKLY_EMPTY.to_string()));
        assert_eq!(
            view.weekly.position_label.as_deref(),
            Some(NO_WEEK_SELECTED)
        );
        assert_eq!(
            view.quarter.state,
            PanelState::Empty("No FPY data found for Q1 2024.".to_string())
        );

        let refetch = tag_of(&d.update(Msg::SetAnchorDate(ymd(2024, 1, 1))), weekly_tag);
        d.update(Msg::WeeklyLoaded {
            tag: refetch,
            result: Err(Error::Api {
                status: 502,
                message: String::new(),
            }),
        });
        let view = DashboardView::of(&d);
        assert_eq!(
            view.weekly.state,
            PanelState::Error("Failed to load FPY stats.".to_string())
        );
    }

    #[test]
    fn test_empty_week_still_renders() {
        let mut d = Dashboard::anchored(CalendarWindow::new(TimePolicy::Utc), ymd(2024, 3, 15));
        let commands = d.start();
        d.update(Msg::WeeklyLoaded {
            tag: tag_of(&commands, weekly_tag),
            result: Ok(vec![WeekAggregate::new(
                ymd(2024, 3, 10),
                ymd(2024, 3, 16),
                Vec::new(),
            )]),
        });
        let view = DashboardView::of(&d);
        let series = view.weekly.state.ready().unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].current, 0.0);
        assert_eq!(series.points[0].baseline, None);
    }
}

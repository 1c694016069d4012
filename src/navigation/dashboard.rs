//! Dashboard state machine.
//!
//! [`Dashboard::update`] is a pure reducer: it takes one [`Msg`], mutates the
//! state and returns the [`Command`]s to run. Nothing here does I/O; the
//! session layer executes commands and feeds the results back as messages.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::aggregate::quarterly::quarter_weeks;
use crate::aggregate::weekly::DEFAULT_WEEKS;
use crate::calendar::{shift_quarter, CalendarWindow, QuarterDescriptor};
use crate::config::validate_weeks;
use crate::error::Error;
use crate::stats::{BaselineMap, WeekAggregate};

use super::stream::{FetchStream, RequestTag};
use super::tabs::TabWindow;

/// Inline text when the weekly fetch fails without a backend message.
pub const WEEKLY_ERROR: &str = "Failed to load FPY stats.";

/// Inline text when the quarterly fetch fails without a backend message.
pub const QUARTER_ERROR: &str = "Failed to load quarterly FPY stats.";

/// Everything that can happen to the dashboard.
#[derive(Debug)]
pub enum Msg {
    SetAnchorDate(NaiveDate),
    /// Raw anchor input; unparsable text falls back to today
    AnchorInput(String),
    SetWeeksCount(u32),
    SetQuarterDate(NaiveDate),
    /// Raw quarter input; unparsable text falls back to today
    QuarterInput(String),
    PrevQuarter,
    NextQuarter,
    OlderWeek,
    NewerWeek,
    SelectWeek(usize),
    SlideWeekTabs(isize),
    /// A bar of the quarterly chart was clicked
    FocusQuarterWeek(usize),
    /// Reissue every fetch with the current parameters
    Refresh,
    WeeklyLoaded {
        tag: RequestTag,
        result: Result<Vec<WeekAggregate>, Error>,
    },
    QuarterLoaded {
        tag: RequestTag,
        result: Result<Vec<WeekAggregate>, Error>,
    },
    BaselineLoaded {
        tag: RequestTag,
        result: Result<BaselineMap, Error>,
    },
}

/// Side effects requested by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchWeekly {
        tag: RequestTag,
        anchor: NaiveDate,
        weeks: u32,
    },
    FetchQuarter {
        tag: RequestTag,
        quarter: QuarterDescriptor,
    },
    FetchBaseline {
        tag: RequestTag,
    },
    /// Bring the weekly view into focus
    FocusWeeklyView,
}

/// Session-local selection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationSelection {
    pub selected_week_index: usize,
    pub week_window_start: usize,
    pub quarter_date: NaiveDate,
    pub anchor_date: NaiveDate,
}

/// Weekly, quarterly and baseline streams plus the selection binding them.
#[derive(Debug, Clone)]
pub struct Dashboard {
    calendar: CalendarWindow,
    anchor_date: NaiveDate,
    weeks_count: u32,
    quarter_date: NaiveDate,
    selected_week_index: usize,
    week_tabs: TabWindow,
    /// Week start to select once the re-anchored weekly fetch lands
    pending_focus: Option<NaiveDate>,
    weekly: FetchStream<Vec<WeekAggregate>>,
    quarterly: FetchStream<Vec<WeekAggregate>>,
    baseline: FetchStream<BaselineMap>,
}

impl Dashboard {
    /// A dashboard anchored on today under `calendar`'s policy.
    #[must_use]
    pub fn new(calendar: CalendarWindow) -> Self {
        let today = calendar.today();
        Self::anchored(calendar, today)
    }

    /// A dashboard whose anchor and quarter both start at `date`.
    #[must_use]
    pub fn anchored(calendar: CalendarWindow, date: NaiveDate) -> Self {
        Self {
            calendar,
            anchor_date: date,
            weeks_count: DEFAULT_WEEKS,
            quarter_date: date,
            selected_week_index: 0,
            week_tabs: TabWindow::default(),
            pending_focus: None,
            weekly: FetchStream::new("weekly"),
            quarterly: FetchStream::new("quarterly"),
            baseline: FetchStream::new("baseline"),
        }
    }

    /// Use `weeks` for the weekly fetch. Unsupported counts are ignored.
    #[must_use]
    pub fn with_weeks(mut self, weeks: u32) -> Self {
        match validate_weeks(weeks) {
            Ok(()) => self.weeks_count = weeks,
            Err(e) => warn!("{e}, keeping {}", self.weeks_count),
        }
        self
    }

    /// Start the quarterly view on the quarter containing `date`.
    #[must_use]
    pub fn with_quarter_date(mut self, date: NaiveDate) -> Self {
        self.quarter_date = date;
        self
    }

    /// Show `width` week tabs at a time.
    #[must_use]
    pub fn with_tab_window(mut self, width: usize) -> Self {
        self.week_tabs = TabWindow::new(width);
        self
    }

    /// Initial load: all three streams at once.
    pub fn start(&mut self) -> Vec<Command> {
        vec![
            self.reload_weekly(),
            self.reload_quarter(),
            self.reload_baseline(),
        ]
    }

    /// Apply one message.
    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::SetAnchorDate(date) => self.set_anchor(date),
            Msg::AnchorInput(input) => {
                let date = self.calendar.date_or_today(&input);
                self.set_anchor(date)
            }
            Msg::SetWeeksCount(weeks) => self.set_weeks(weeks),
            Msg::SetQuarterDate(date) => self.set_quarter(date),
            Msg::QuarterInput(input) => {
                let date = self.calendar.date_or_today(&input);
                self.set_quarter(date)
            }
            Msg::PrevQuarter => self.step_quarter(-1),
            Msg::NextQuarter => self.step_quarter(1),
            Msg::OlderWeek => {
                self.select_week(self.selected_week_index + 1);
                Vec::new()
            }
            Msg::NewerWeek => {
                if let Some(index) = self.selected_week_index.checked_sub(1) {
                    self.select_week(index);
                }
                Vec::new()
            }
            Msg::SelectWeek(index) => {
                self.select_week(index);
                Vec::new()
            }
            Msg::SlideWeekTabs(delta) => {
                self.week_tabs.slide(delta, self.week_count_loaded());
                Vec::new()
            }
            Msg::FocusQuarterWeek(bar) => self.focus_quarter_week(bar),
            Msg::Refresh => self.start(),
            Msg::WeeklyLoaded { tag, result } => {
                self.weekly_loaded(tag, result);
                Vec::new()
            }
            Msg::QuarterLoaded { tag, result } => {
                let quarter = self.quarter();
                let result = result
                    .map(|weeks| quarter_weeks(&weeks, &quarter))
                    .map_err(|e| e.user_message(QUARTER_ERROR));
                self.quarterly.resolve(tag, result);
                Vec::new()
            }
            Msg::BaselineLoaded { tag, result } => {
                if let Err(e) = &result {
                    if self.baseline.is_current(tag) {
                        warn!("Baseline unavailable, comparing against nothing: {e}");
                    }
                }
                self.baseline.resolve(tag, result.map_err(|e| e.to_string()));
                Vec::new()
            }
        }
    }

    fn reload_weekly(&mut self) -> Command {
        Command::FetchWeekly {
            tag: self.weekly.begin(),
            anchor: self.anchor_date,
            weeks: self.weeks_count,
        }
    }

    fn reload_quarter(&mut self) -> Command {
        Command::FetchQuarter {
            tag: self.quarterly.begin(),
            quarter: self.quarter(),
        }
    }

    fn reload_baseline(&mut self) -> Command {
        Command::FetchBaseline {
            tag: self.baseline.begin(),
        }
    }

    fn set_anchor(&mut self, date: NaiveDate) -> Vec<Command> {
        if date == self.anchor_date {
            return Vec::new();
        }
        self.anchor_date = date;
        self.pending_focus = None;
        vec![self.reload_weekly()]
    }

    fn set_weeks(&mut self, weeks: u32) -> Vec<Command> {
        if let Err(e) = validate_weeks(weeks) {
            warn!("Ignoring week count: {e}");
            return Vec::new();
        }
        if weeks == self.weeks_count {
            return Vec::new();
        }
        self.weeks_count = weeks;
        self.pending_focus = None;
        vec![self.reload_weekly()]
    }

    fn set_quarter(&mut self, date: NaiveDate) -> Vec<Command> {
        if date == self.quarter_date {
            return Vec::new();
        }
        self.quarter_date = date;
        vec![self.reload_quarter()]
    }

    fn step_quarter(&mut self, offset: i32) -> Vec<Command> {
        let date = shift_quarter(self.quarter_date, offset).unwrap_or_else(|e| {
            warn!("{e}, using today instead");
            self.calendar.today()
        });
        self.set_quarter(date)
    }

    fn week_count_loaded(&self) -> usize {
        self.weekly.data().map_or(0, Vec::len)
    }

    fn select_week(&mut self, index: usize) {
        let total = self.week_count_loaded();
        if index >= total {
            return;
        }
        self.selected_week_index = index;
        self.week_tabs.reveal(index, total);
    }

    fn focus_quarter_week(&mut self, bar: usize) -> Vec<Command> {
        let Some(week) = self.quarterly.data().and_then(|weeks| weeks.get(bar)) else {
            debug!(bar, "focus on a quarterly bar that is not loaded");
            return Vec::new();
        };
        let (start, end) = (week.start, week.end);

        let loaded_index = self
            .weekly
            .data()
            .and_then(|weeks| weeks.iter().position(|w| w.start == start));
        if let Some(index) = loaded_index {
            self.select_week(index);
            return vec![Command::FocusWeeklyView];
        }

        debug!(%start, "week not loaded, re-anchoring weekly view");
        let mut commands = Vec::with_capacity(2);
        // An in-flight fetch for the same anchor will still land.
        if end != self.anchor_date || !self.weekly.is_loading() {
            self.anchor_date = end;
            commands.push(self.reload_weekly());
        }
        self.pending_focus = Some(start);
        commands.push(Command::FocusWeeklyView);
        commands
    }

    fn weekly_loaded(&mut self, tag: RequestTag, result: Result<Vec<WeekAggregate>, Error>) {
        let result = result.map_err(|e| e.user_message(WEEKLY_ERROR));
        if !self.weekly.resolve(tag, result) {
            return;
        }

        let focus = self.pending_focus.take();
        let total = self.week_count_loaded();
        self.selected_week_index = focus
            .and_then(|start| {
                let found = self
                    .weekly
                    .data()
                    .and_then(|weeks| weeks.iter().position(|w| w.start == start));
                if found.is_none() {
                    debug!(%start, "focused week missing from refetch, selecting newest");
                }
                found
            })
            .unwrap_or(0);
        self.week_tabs.reset();
        self.week_tabs.reveal(self.selected_week_index, total);
    }

    // Accessors

    #[must_use]
    pub const fn calendar(&self) -> CalendarWindow {
        self.calendar
    }

    #[must_use]
    pub const fn anchor_date(&self) -> NaiveDate {
        self.anchor_date
    }

    #[must_use]
    pub const fn weeks_count(&self) -> u32 {
        self.weeks_count
    }

    #[must_use]
    pub const fn quarter_date(&self) -> NaiveDate {
        self.quarter_date
    }

    /// The quarter currently shown.
    #[must_use]
    pub fn quarter(&self) -> QuarterDescriptor {
        self.calendar.quarter_of(self.quarter_date)
    }

    #[must_use]
    pub const fn selected_week_index(&self) -> usize {
        self.selected_week_index
    }

    #[must_use]
    pub const fn week_tabs(&self) -> TabWindow {
        self.week_tabs
    }

    #[must_use]
    pub const fn pending_focus(&self) -> Option<NaiveDate> {
        self.pending_focus
    }

    #[must_use]
    pub fn selection(&self) -> NavigationSelection {
        NavigationSelection {
            selected_week_index: self.selected_week_index,
            week_window_start: self.week_tabs.start(),
            quarter_date: self.quarter_date,
            anchor_date: self.anchor_date,
        }
    }

    /// The weekly week currently selected, if loaded.
    #[must_use]
    pub fn selected_week(&self) -> Option<&WeekAggregate> {
        self.weekly
            .data()
            .and_then(|weeks| weeks.get(self.selected_week_index))
    }

    #[must_use]
    pub const fn weekly(&self) -> &FetchStream<Vec<WeekAggregate>> {
        &self.weekly
    }

    #[must_use]
    pub const fn quarterly(&self) -> &FetchStream<Vec<WeekAggregate>> {
        &self.quarterly
    }

    #[must_use]
    pub const fn baseline(&self) -> &FetchStream<BaselineMap> {
        &self.baseline
    }

    /// Whether no stream is waiting on a response.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !(self.weekly.is_loading() || self.quarterly.is_loading() || self.baseline.is_loading())
    }
}

//! Navigation state machine binding quarter selection, week selection and
//! cross-chart focus.

mod dashboard;
mod stream;
mod tabs;
mod view;

pub use dashboard::{Command, Dashboard, Msg, NavigationSelection, QUARTER_ERROR, WEEKLY_ERROR};
pub use stream::{FetchStream, RequestTag, StreamStatus};
pub use tabs::TabWindow;
pub use view::{
    DashboardView, PanelState, QuarterPanel, WeekTab, WeeklyPanel, NO_WEEK_SELECTED, WEEKLY_EMPTY,
};

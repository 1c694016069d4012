//! Async driver for the dashboard.
//!
//! Commands from the reducer are spawned as independent tokio tasks; their
//! results come back through one channel and are applied in arrival order.
//! All state transitions happen on the task that owns the [`Session`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::client::StatsClient;
use crate::navigation::{Command, Dashboard, DashboardView, Msg};

/// A dashboard wired to a statistics source.
pub struct Session<C: ?Sized> {
    client: Arc<C>,
    dashboard: Dashboard,
    tx: mpsc::UnboundedSender<Msg>,
    rx: mpsc::UnboundedReceiver<Msg>,
    focus_requests: usize,
}

impl<C: StatsClient + ?Sized + 'static> Session<C> {
    #[must_use]
    pub fn new(client: Arc<C>, dashboard: Dashboard) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            dashboard,
            tx,
            rx,
            focus_requests: 0,
        }
    }

    /// Issue the initial fetches.
    pub fn start(&mut self) {
        let commands = self.dashboard.start();
        self.execute(commands);
    }

    /// Apply a message and run whatever it asks for.
    pub fn dispatch(&mut self, msg: Msg) {
        let commands = self.dashboard.update(msg);
        self.execute(commands);
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            debug!(?command, "executing");
            match command {
                Command::FetchWeekly { tag, anchor, weeks } => {
                    let client = Arc::clone(&self.client);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = client.fetch_weekly_fpy(anchor, weeks).await;
                        let _ = tx.send(Msg::WeeklyLoaded { tag, result });
                    });
                }
                Command::FetchQuarter { tag, quarter } => {
                    let client = Arc::clone(&self.client);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = client
                            .fetch_weekly_fpy(quarter.anchor_for_fetch, quarter.weeks_to_fetch)
                            .await;
                        let _ = tx.send(Msg::QuarterLoaded { tag, result });
                    });
                }
                Command::FetchBaseline { tag } => {
                    let client = Arc::clone(&self.client);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = client.fetch_overall_fpy().await;
                        let _ = tx.send(Msg::BaselineLoaded { tag, result });
                    });
                }
                Command::FocusWeeklyView => {
                    self.focus_requests += 1;
                    info!(
                        "Focusing week {}",
                        self.dashboard.selected_week_index() + 1
                    );
                }
            }
        }
    }

    /// Wait for the next response and apply it.
    pub async fn next(&mut self) {
        if let Some(msg) = self.rx.recv().await {
            self.dispatch(msg);
        }
    }

    /// Apply responses until no stream is loading.
    ///
    /// Responses to superseded requests that arrive later are left queued;
    /// [`Session::pump`] applies (and so discards) them.
    pub async fn settle(&mut self) {
        while !self.dashboard.is_settled() {
            self.next().await;
        }
    }

    /// Apply every response already queued without waiting. Returns how many
    /// were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.rx.try_recv() {
            self.dispatch(msg);
            applied += 1;
        }
        applied
    }

    #[must_use]
    pub const fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    #[must_use]
    pub fn view(&self) -> DashboardView {
        DashboardView::of(&self.dashboard)
    }

    /// How many times the weekly view was asked to take focus.
    #[must_use]
    pub const fn focus_requests(&self) -> usize {
        self.focus_requests
    }
}

//! # FPY Dashboard
//!
//! Weekly and quarterly first-pass-yield statistics for QC shipment tracking.
//!
//! This crate provides:
//! - Sunday-anchored week and calendar-quarter arithmetic under an explicit
//!   time policy
//! - Per-week, per-product FPY aggregation compared against an all-time baseline
//! - A quarterly overview built from a wider backward-walking weekly fetch
//! - A navigation state machine that keeps both views in step, with
//!   sequence-tagged fetches so late responses never overwrite newer ones
//! - A weekly shipped-units report
//!
//! Statistics come from the QC backend's REST API or from a local file of
//! shipment records.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregate;
pub mod calendar;
pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod navigation;
pub mod session;
pub mod stats;
pub mod types;

pub use calendar::{CalendarWindow, QuarterDescriptor, TimePolicy, WeekRange};
pub use client::{HttpStatsClient, RecordStatsClient, StatsClient};
pub use config::Config;
pub use error::{Error, Result};
pub use navigation::{Dashboard, DashboardView, Msg};
pub use session::Session;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "fpy-dashboard";

//! # Kitchen Metrics
//!
//! Sales aggregation engine for a restaurant kitchen dashboard.
//!
//! This crate polls a Poster-style point-of-sale API, classifies every sold line
//! item into a kitchen department (hot, cold, bar) through a cached product
//! catalog, bins quantities by the hour each order closed, and produces
//! comparable cumulative series for the current day versus the same weekday one
//! week earlier. The result is a single snapshot document the web layer can
//! return verbatim to the dashboard frontend.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`config`]: environment/TOML configuration with eager validation
//! - [`models`]: domain types (departments, hour ranges, daily series, snapshot)
//! - [`pos`]: the upstream POS API behind the [`pos::PosApi`] trait, with a
//!   reqwest implementation and an in-memory scripted one for tests
//! - [`services`]: catalog cache, transaction fetcher, hourly aggregator and the
//!   snapshot-producing dashboard service
//! - [`cache`]: the TTL cell both caches are built on
//! - [`clock`]: injected clock so cache expiry and "current hour" logic are
//!   testable without wall-clock sleeps
//!
//! ## Failure policy
//!
//! Availability of a possibly-stale number beats correctness-or-nothing: a
//! failed catalog rebuild keeps serving the last good catalog, a failed day
//! fetch degrades to an empty day, and a refresh that gets nothing at all from
//! upstream keeps serving the previous snapshot. Malformed upstream records are
//! dropped at line granularity and logged, never folded into totals as zeros.

pub mod cache;
pub mod clock;
pub mod config;
pub mod models;
pub mod pos;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, DashboardConfig};
pub use models::{DashboardSnapshot, DailySeries, Department, DepartmentScheme, HourRange};
pub use pos::{LocalPos, PosApi, PosError, PosResult};
#[cfg(feature = "live-pos")]
pub use pos::PosterClient;
pub use services::{DashboardError, DashboardService};

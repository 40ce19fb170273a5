//! Service layer: catalog cache, transaction fetching, hourly aggregation,
//! and the snapshot orchestrator the presentation layer calls.

pub mod aggregator;
pub mod catalog;
pub mod dashboard;
pub mod fetcher;


pub use aggregator::aggregate;
pub use catalog::CatalogService;
pub use dashboard::{DashboardError, DashboardService};
pub use fetcher::TransactionFetcher;

//! Domain types shared across the crate.
//!
//! Everything here is plain data: the classification scheme, flattened
//! transaction lines, the operating-hour window and the serialized snapshot
//! document. Upstream wire shapes live in [`crate::pos::wire`] instead.

pub mod department;
pub mod sales;
pub mod series;

pub use department::{Department, DepartmentScheme};
pub use sales::{Catalog, CategorySales, TransactionLine};
pub use series::{DailySeries, DashboardSnapshot, HourRange, PeriodTotals};

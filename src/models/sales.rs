//! Flattened sales records consumed by the aggregator.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::department::Department;

/// Product-to-department mapping built from the menu catalog.
///
/// Only products whose category classifies into a department appear; a lookup
/// miss means the item contributes to no department total.
pub type Catalog = HashMap<i64, Department>;

/// One sold line item, flattened out of a closed transaction.
///
/// The transaction wrapper is discarded during fetching; each line carries its
/// transaction's closing timestamp. Lines that could not be coerced into this
/// shape were dropped (and logged) before reaching here.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionLine {
    pub product_id: i64,
    /// Non-negative, finite quantity. Upstream sends this as a string or float.
    pub quantity: f64,
    /// Venue-local time the order was closed.
    pub closed_at: NaiveDateTime,
}

/// One row of the category sales summary endpoint, after coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySales {
    pub category_id: i64,
    pub category_name: String,
    pub count: f64,
}

//! Wire-format payloads of the POS HTTP API.
//!
//! Upstream serializes identifiers and quantities inconsistently — the same
//! field arrives as a number in one response and a numeric string in the
//! next, and occasionally as junk. Numeric fields therefore decode through a
//! tolerant intermediate into `Option`s: a page always decodes, and rows
//! whose fields still make no sense are dropped row-by-row by the caller.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

use crate::models::CategorySales;

/// Timestamp format of `date_close` ("2024-07-01 11:23:45").
pub const DATE_CLOSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The `{ "response": ... }` wrapper every endpoint uses.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub response: T,
}

/// One product row of the catalog listing (`menu.getProducts`).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub menu_category_id: Option<i64>,
}

impl ProductRow {
    /// `(product_id, category_id)` when both identifiers decoded.
    pub fn ids(&self) -> Option<(i64, i64)> {
        Some((self.product_id?, self.menu_category_id?))
    }
}

/// One row of the category sales summary (`dash.getCategoriesSales`).
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySalesRow {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub count: Option<f64>,
}

impl CategorySalesRow {
    /// Convert into the model type; `None` drops the row.
    pub fn into_model(self) -> Option<CategorySales> {
        Some(CategorySales {
            category_id: self.category_id?,
            category_name: self.category_name?,
            count: self.count.filter(|c| *c >= 0.0)?,
        })
    }
}

/// Decoded page of `transactions.getTransactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsPage {
    #[serde(default)]
    pub data: Vec<TransactionRow>,
    /// Total matching transactions as reported upstream; not trusted blindly.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub count: Option<i64>,
    #[serde(default)]
    pub page: Option<PageMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub per_page: Option<i64>,
}

/// One closed transaction with its nested order lines.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRow {
    #[serde(default)]
    pub date_close: Option<String>,
    #[serde(default)]
    pub products: Vec<OrderLineRow>,
}

impl TransactionRow {
    /// Convenience constructor used by the in-memory POS and tests.
    pub fn closed(date_close: impl Into<String>, products: Vec<(i64, f64)>) -> Self {
        Self {
            date_close: Some(date_close.into()),
            products: products
                .into_iter()
                .map(|(product_id, num)| OrderLineRow {
                    product_id: Some(product_id),
                    num: Some(num),
                })
                .collect(),
        }
    }

    /// Close timestamp, `None` when absent or unparsable.
    pub fn closed_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.date_close.as_deref()?, DATE_CLOSE_FORMAT).ok()
    }
}

/// One sold line item inside a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRow {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub product_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub num: Option<f64>,
}

/// Accept an integer, an integral float, or a numeric string; anything else
/// becomes `None` instead of failing the surrounding page.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Int(i64),
        Float(f64),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Field::deserialize(deserializer)? {
        Field::Int(i) => Some(i),
        Field::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
        Field::Float(_) => None,
        Field::Text(s) => s.trim().parse().ok(),
        Field::Other(_) => None,
    })
}

/// Accept a number or a numeric string; non-finite values and anything else
/// become `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Num(f64),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Field::deserialize(deserializer)? {
        Field::Num(f) if f.is_finite() => Some(f),
        Field::Num(_) => None,
        Field::Text(s) => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
        Field::Other(_) => None,
    })
}

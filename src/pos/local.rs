//! In-memory POS backend for tests and offline development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;

use super::api::{PosApi, ProductKind};
use super::error::{PosError, PosResult};
use super::wire::{CategorySalesRow, PageMeta, ProductRow, TransactionRow, TransactionsPage};

/// How many requests each endpoint has served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub products: u32,
    pub transactions: u32,
    pub category_sales: u32,
}

#[derive(Default)]
struct LocalState {
    products: HashMap<ProductKind, Vec<ProductRow>>,
    transactions: HashMap<NaiveDate, Vec<TransactionRow>>,
    category_sales: HashMap<NaiveDate, Vec<CategorySalesRow>>,
    /// When set, `transactions_page` reports this total instead of the real
    /// row count, to exercise miscount defenses.
    reported_count: Option<i64>,
    /// When set, `transactions_page` omits `count` entirely.
    omit_count: bool,
    fail_products: bool,
    fail_transactions: bool,
    fail_category_sales: bool,
    calls: CallCounts,
}

/// In-memory [`PosApi`] with the same 1-based paging behavior as the live
/// backend.
///
/// Failure toggles simulate upstream outages per endpoint, and [`calls`]
/// exposes request counts so cache tests can assert that a warm cache makes
/// zero upstream calls and a single-flight refresh makes exactly one.
///
/// [`calls`]: LocalPos::calls
#[derive(Default)]
pub struct LocalPos {
    state: RwLock<LocalState>,
}

impl LocalPos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_product(&self, kind: ProductKind, product_id: i64, category_id: i64) {
        self.state
            .write()
            .products
            .entry(kind)
            .or_default()
            .push(ProductRow {
                product_id: Some(product_id),
                menu_category_id: Some(category_id),
            });
    }

    /// Seed one closed transaction; `closed_at` uses the POS timestamp
    /// format ("2024-07-01 11:02:00") and `lines` is `(product_id, num)`.
    pub fn seed_transaction(&self, day: NaiveDate, closed_at: &str, lines: Vec<(i64, f64)>) {
        self.state
            .write()
            .transactions
            .entry(day)
            .or_default()
            .push(TransactionRow::closed(closed_at, lines));
    }

    pub fn seed_category_sales(&self, day: NaiveDate, category_id: i64, name: &str, count: f64) {
        self.state
            .write()
            .category_sales
            .entry(day)
            .or_default()
            .push(CategorySalesRow {
                category_id: Some(category_id),
                category_name: Some(name.to_string()),
                count: Some(count),
            });
    }

    /// Report this total from `transactions_page` regardless of how many
    /// rows actually exist.
    pub fn report_transaction_count(&self, count: i64) {
        self.state.write().reported_count = Some(count);
    }

    /// Leave `count` out of `transactions_page` responses entirely.
    pub fn omit_transaction_count(&self) {
        self.state.write().omit_count = true;
    }

    pub fn fail_products(&self, fail: bool) {
        self.state.write().fail_products = fail;
    }

    pub fn fail_transactions(&self, fail: bool) {
        self.state.write().fail_transactions = fail;
    }

    pub fn fail_category_sales(&self, fail: bool) {
        self.state.write().fail_category_sales = fail;
    }

    pub fn calls(&self) -> CallCounts {
        self.state.read().calls
    }
}

fn page_slice<T: Clone>(rows: &[T], page: u32, per_page: u32) -> Vec<T> {
    let start = ((page.max(1) - 1) as usize).saturating_mul(per_page as usize);
    rows.iter().skip(start).take(per_page as usize).cloned().collect()
}

#[async_trait]
impl PosApi for LocalPos {
    async fn products_page(
        &self,
        kind: ProductKind,
        page: u32,
        per_page: u32,
    ) -> PosResult<Vec<ProductRow>> {
        let mut state = self.state.write();
        state.calls.products += 1;
        if state.fail_products {
            return Err(PosError::transport("menu.getProducts", "simulated outage"));
        }
        let rows = state.products.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
        Ok(page_slice(rows, page, per_page))
    }

    async fn transactions_page(
        &self,
        day: NaiveDate,
        page: u32,
        per_page: u32,
    ) -> PosResult<TransactionsPage> {
        let mut state = self.state.write();
        state.calls.transactions += 1;
        if state.fail_transactions {
            return Err(PosError::transport(
                "transactions.getTransactions",
                "simulated outage",
            ));
        }
        let rows = state.transactions.get(&day).map(Vec::as_slice).unwrap_or(&[]);
        let count = if state.omit_count {
            None
        } else {
            Some(state.reported_count.unwrap_or(rows.len() as i64))
        };
        Ok(TransactionsPage {
            data: page_slice(rows, page, per_page),
            count,
            page: Some(PageMeta {
                per_page: Some(per_page as i64),
            }),
        })
    }

    async fn category_sales(&self, day: NaiveDate) -> PosResult<Vec<CategorySalesRow>> {
        let mut state = self.state.write();
        state.calls.category_sales += 1;
        if state.fail_category_sales {
            return Err(PosError::transport(
                "dash.getCategoriesSales",
                "simulated outage",
            ));
        }
        Ok(state.category_sales.get(&day).cloned().unwrap_or_default())
    }
}

//! The upstream POS interface the aggregation services are written against.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::PosResult;
use super::wire::{CategorySalesRow, ProductRow, TransactionsPage};

/// Which product listing to page through when rebuilding the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductKind {
    /// Regular standalone menu products.
    Standalone,
    /// Prep-batch items sold as portions of a larger batch.
    PrepBatch,
}

impl ProductKind {
    /// Both listings, in the order the catalog flattens them. Later listings
    /// overwrite earlier ones on product-id collisions.
    pub const ALL: [ProductKind; 2] = [ProductKind::Standalone, ProductKind::PrepBatch];

    /// Value of the `type` query parameter upstream expects.
    pub fn as_query(&self) -> &'static str {
        match self {
            ProductKind::Standalone => "products",
            ProductKind::PrepBatch => "batchtickets",
        }
    }
}

/// Read-side POS surface consumed by the services.
///
/// Two implementations exist: `PosterClient` speaks HTTP to a live backend,
/// `LocalPos` serves seeded data in memory for tests and offline work. The
/// trait sits at the decoded-wire level so pagination, flattening and
/// per-row drop policy live in one place above both.
#[async_trait]
pub trait PosApi: Send + Sync {
    /// One page (1-based) of the product listing for `kind`.
    async fn products_page(
        &self,
        kind: ProductKind,
        page: u32,
        per_page: u32,
    ) -> PosResult<Vec<ProductRow>>;

    /// One page (1-based) of transactions closed on `day`.
    async fn transactions_page(
        &self,
        day: NaiveDate,
        page: u32,
        per_page: u32,
    ) -> PosResult<TransactionsPage>;

    /// Whole-day totals from the category sales summary endpoint.
    async fn category_sales(&self, day: NaiveDate) -> PosResult<Vec<CategorySalesRow>>;
}

//! Product catalog cache: product id to department, on a long TTL.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use log::{debug, info, warn};

use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::models::{Catalog, DepartmentScheme};
use crate::pos::{PosApi, PosResult, ProductKind};

/// Maintains the product-to-department mapping used to classify sold lines.
///
/// The mapping is rebuilt wholesale when absent or older than the TTL, never
/// patched in place. A failed rebuild keeps serving the last known good
/// catalog: classification against a stale catalog beats classifying
/// nothing at all.
pub struct CatalogService {
    pos: Arc<dyn PosApi>,
    scheme: DepartmentScheme,
    clock: Arc<dyn Clock>,
    cache: TtlCache<Catalog>,
    per_page: u32,
}

impl CatalogService {
    pub fn new(
        pos: Arc<dyn PosApi>,
        scheme: DepartmentScheme,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        per_page: u32,
    ) -> Self {
        Self {
            pos,
            scheme,
            clock,
            cache: TtlCache::new("catalog", ttl),
            per_page: per_page.max(1),
        }
    }

    /// Current product-to-department mapping.
    ///
    /// # Errors
    /// Fails only when a rebuild is needed, it fails, and no previous
    /// catalog exists to fall back on.
    pub async fn get_catalog(&self) -> PosResult<Arc<Catalog>> {
        self.cache
            .get_or_refresh(|| self.clock.now(), || self.rebuild())
            .await
    }

    /// Rebuild the whole mapping from the two product listings.
    ///
    /// Any page failure aborts the rebuild; a half-built catalog must never
    /// replace a complete previous one.
    async fn rebuild(&self) -> PosResult<Catalog> {
        // First flatten both listings into product -> category. Listings are
        // walked in `ProductKind::ALL` order, so a product present in both
        // keeps the later listing's category.
        let mut categories: HashMap<i64, i64> = HashMap::new();
        for kind in ProductKind::ALL {
            let mut page = 1u32;
            loop {
                let rows = self.pos.products_page(kind, page, self.per_page).await?;
                let fetched = rows.len();

                for row in &rows {
                    match row.ids() {
                        Some((product_id, category_id)) => {
                            categories.insert(product_id, category_id);
                        }
                        None => warn!(
                            "dropping {} row with unparsable ids (product_id {:?}, category {:?})",
                            kind.as_query(),
                            row.product_id,
                            row.menu_category_id
                        ),
                    }
                }

                if fetched < self.per_page as usize {
                    break;
                }
                page += 1;
            }
        }

        // Then classify. Products in categories outside every department set
        // are excluded entirely so they can never land in a default bucket.
        let mut catalog = Catalog::new();
        let mut unclassified = 0usize;
        for (product_id, category_id) in categories {
            match self.scheme.classify(category_id) {
                Some(department) => {
                    catalog.insert(product_id, department);
                }
                None => unclassified += 1,
            }
        }

        if unclassified > 0 {
            debug!("catalog rebuild: {unclassified} product(s) in unclassified categories");
        }
        info!("catalog rebuilt: {} classified product(s)", catalog.len());
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::clock::ManualClock;
    use crate::models::Department;
    use crate::pos::LocalPos;

    fn scheme() -> DepartmentScheme {
        DepartmentScheme::new([4, 5], [6], [7])
    }

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn service(pos: Arc<LocalPos>, clock: &ManualClock, per_page: u32) -> CatalogService {
        CatalogService::new(
            pos as Arc<dyn PosApi>,
            scheme(),
            Arc::new(clock.clone()),
            Duration::hours(1),
            per_page,
        )
    }

    #[tokio::test]
    async fn both_listings_merge_with_later_overwriting() {
        let pos = Arc::new(LocalPos::new());
        pos.seed_product(ProductKind::Standalone, 101, 4);
        pos.seed_product(ProductKind::Standalone, 102, 6);
        pos.seed_product(ProductKind::Standalone, 103, 99); // unclassified
        pos.seed_product(ProductKind::PrepBatch, 102, 7); // overwrites the standalone entry
        pos.seed_product(ProductKind::PrepBatch, 104, 5);

        let clock = ManualClock::new(start());
        let catalog = service(pos, &clock, 500).get_catalog().await.unwrap();

        assert_eq!(catalog.get(&101), Some(&Department::Hot));
        assert_eq!(catalog.get(&102), Some(&Department::Bar));
        assert_eq!(catalog.get(&104), Some(&Department::Hot));
        assert!(!catalog.contains_key(&103));
    }

    #[tokio::test]
    async fn listing_pagination_stops_on_short_page() {
        let pos = Arc::new(LocalPos::new());
        for i in 0..5 {
            pos.seed_product(ProductKind::Standalone, 100 + i, 4);
        }

        let clock = ManualClock::new(start());
        let catalog = service(Arc::clone(&pos), &clock, 2).get_catalog().await.unwrap();

        assert_eq!(catalog.len(), 5);
        // standalone: 2 + 2 + 1(short); prep-batch: one empty page
        assert_eq!(pos.calls().products, 4);
    }

    #[tokio::test]
    async fn warm_cache_makes_no_upstream_calls() {
        let pos = Arc::new(LocalPos::new());
        pos.seed_product(ProductKind::Standalone, 101, 4);

        let clock = ManualClock::new(start());
        let service = service(Arc::clone(&pos), &clock, 500);

        service.get_catalog().await.unwrap();
        let after_first = pos.calls().products;
        service.get_catalog().await.unwrap();

        assert_eq!(pos.calls().products, after_first);
    }

    #[tokio::test]
    async fn ttl_expiry_triggers_a_rebuild() {
        let pos = Arc::new(LocalPos::new());
        pos.seed_product(ProductKind::Standalone, 101, 4);

        let clock = ManualClock::new(start());
        let service = service(Arc::clone(&pos), &clock, 500);

        service.get_catalog().await.unwrap();
        pos.seed_product(ProductKind::Standalone, 202, 6);
        clock.advance(Duration::hours(1));

        let catalog = service.get_catalog().await.unwrap();
        assert_eq!(catalog.get(&202), Some(&Department::Cold));
    }

    #[tokio::test]
    async fn failed_rebuild_serves_the_last_known_good_catalog() {
        let pos = Arc::new(LocalPos::new());
        pos.seed_product(ProductKind::Standalone, 101, 4);

        let clock = ManualClock::new(start());
        let service = service(Arc::clone(&pos), &clock, 500);

        let first = service.get_catalog().await.unwrap();
        clock.advance(Duration::hours(2));
        pos.fail_products(true);

        let fallback = service.get_catalog().await.unwrap();
        assert_eq!(*fallback, *first);

        // recovery: the slot stayed expired, so the next call rebuilds
        pos.fail_products(false);
        pos.seed_product(ProductKind::Standalone, 202, 6);
        let rebuilt = service.get_catalog().await.unwrap();
        assert!(rebuilt.contains_key(&202));
    }

    #[tokio::test]
    async fn first_rebuild_failure_propagates() {
        let pos = Arc::new(LocalPos::new());
        pos.fail_products(true);

        let clock = ManualClock::new(start());
        assert!(service(pos, &clock, 500).get_catalog().await.is_err());
    }
}

//! Period comparator and snapshot cache, the surface the web layer polls.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Timelike};
use log::{error, warn};
use thiserror::Error;

use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::config::{ConfigError, DashboardConfig};
use crate::models::{
    Catalog, CategorySales, DailySeries, DashboardSnapshot, Department, DepartmentScheme,
    HourRange, PeriodTotals,
};
use crate::pos::wire::CategorySalesRow;
use crate::pos::{PosApi, PosError};

use super::aggregator::aggregate;
use super::catalog::CatalogService;
use super::fetcher::TransactionFetcher;

/// Department totals from the transaction path and the category summary path
/// may differ by float rounding; anything past this is classification drift
/// and gets logged.
const DRIFT_TOLERANCE: f64 = 0.5;

/// Error surfaced by [`DashboardService::get_snapshot`].
///
/// Only raised when a refresh is due, every upstream fetch of the refresh
/// failed, and no previously cached snapshot exists to serve instead.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("dashboard data unavailable: {0}")]
    Unavailable(String),
}

/// Builds and caches the dashboard snapshot: today's cumulative series
/// against a reference day, plus category totals.
///
/// One instance owns both caches (catalog on a long TTL, snapshot on a short
/// one) and the clock; the web layer calls [`get_snapshot`] at arbitrary
/// frequency and the TTL bounds upstream call volume.
///
/// [`get_snapshot`]: DashboardService::get_snapshot
pub struct DashboardService {
    pos: Arc<dyn PosApi>,
    clock: Arc<dyn Clock>,
    catalog: CatalogService,
    fetcher: TransactionFetcher,
    scheme: DepartmentScheme,
    hours: HourRange,
    reference_days_back: i64,
    cache: TtlCache<DashboardSnapshot>,
}

impl DashboardService {
    /// Build the service, validating configuration eagerly so an overlapping
    /// department scheme or a bad hour window fails at startup instead of
    /// silently under-counting later.
    pub fn new(
        config: &DashboardConfig,
        pos: Arc<dyn PosApi>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let hours = config.hour_range()?;

        let catalog = CatalogService::new(
            Arc::clone(&pos),
            config.departments.clone(),
            Arc::clone(&clock),
            Duration::seconds(config.refresh.catalog_ttl_secs as i64),
            config.pos.catalog_page_size,
        );
        let fetcher = TransactionFetcher::new(Arc::clone(&pos), config.pos.page_size);

        Ok(Self {
            catalog,
            fetcher,
            scheme: config.departments.clone(),
            hours,
            reference_days_back: config.refresh.reference_days_back,
            cache: TtlCache::new(
                "snapshot",
                Duration::seconds(config.refresh.snapshot_ttl_secs as i64),
            ),
            pos,
            clock,
        })
    }

    /// The current snapshot, refreshed when older than the TTL.
    ///
    /// Warm-cache calls touch no upstream service. Concurrent expired
    /// callers share a single refresh. During an upstream outage the last
    /// cached snapshot keeps being served, growing stale; the error below
    /// reaches the caller only when there is nothing cached at all.
    pub async fn get_snapshot(&self) -> Result<Arc<DashboardSnapshot>, DashboardError> {
        self.cache
            .get_or_refresh(|| self.clock.now(), || self.refresh())
            .await
    }

    /// When the cached snapshot was last rebuilt, for staleness reporting.
    pub fn last_refreshed(&self) -> Option<chrono::NaiveDateTime> {
        self.cache.last_refreshed()
    }

    async fn refresh(&self) -> Result<DashboardSnapshot, DashboardError> {
        let now = self.clock.now();
        let today = now.date();
        let reference_day = today - Duration::days(self.reference_days_back);

        // A catalog outage must not take the snapshot down: with an empty
        // catalog the department series stay at zero while the
        // category-summary path still works.
        let catalog = match self.catalog.get_catalog().await {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!("catalog unavailable, department series will be empty: {err}");
                Arc::new(Catalog::new())
            }
        };

        let mut errors = Vec::new();
        let current_full = self.day_series(today, &catalog, &mut errors).await;
        let reference = self.day_series(reference_day, &catalog, &mut errors).await;
        let current_categories = self.day_categories(today, &mut errors).await;
        let reference_categories = self.day_categories(reference_day, &mut errors).await;

        // Each failed fetch degraded to an empty day above; if all four
        // failed there is nothing real to build from, and the cache layer
        // falls back to the previous snapshot.
        if errors.len() == 4 {
            return Err(DashboardError::Unavailable(errors.join("; ")));
        }

        self.log_classification_drift(today, &current_full, &current_categories);
        self.log_classification_drift(reference_day, &reference, &reference_categories);

        let department_totals = Department::ALL
            .iter()
            .map(|d| {
                (
                    *d,
                    PeriodTotals {
                        current: current_full.department_total(*d),
                        reference: reference.department_total(*d),
                    },
                )
            })
            .collect();
        let categories = merge_category_totals(&current_categories, &reference_categories);

        // An in-progress day must not claim hours that have not happened.
        let current = current_full.truncated(self.hours.clip_len(now.hour()));

        Ok(DashboardSnapshot {
            generated_at: now,
            current,
            reference,
            categories,
            department_totals,
        })
    }

    /// One day's cumulative series, degraded to the zero-filled full-window
    /// series when the transaction fetch fails.
    async fn day_series(
        &self,
        day: NaiveDate,
        catalog: &Catalog,
        errors: &mut Vec<String>,
    ) -> DailySeries {
        match self.fetcher.fetch_day(day).await {
            Ok(lines) => {
                DailySeries::new(day, self.hours, aggregate(&lines, catalog, self.hours))
            }
            Err(err) => {
                log_day_failure(day, "transactions", &err);
                errors.push(err.to_string());
                DailySeries::empty(day, self.hours)
            }
        }
    }

    /// One day's category summary, degraded to no rows on failure.
    async fn day_categories(&self, day: NaiveDate, errors: &mut Vec<String>) -> Vec<CategorySales> {
        match self.pos.category_sales(day).await {
            Ok(rows) => {
                let total = rows.len();
                let sales: Vec<CategorySales> = rows
                    .into_iter()
                    .filter_map(CategorySalesRow::into_model)
                    .collect();
                if sales.len() < total {
                    warn!(
                        "{day}: dropped {} malformed category sales row(s)",
                        total - sales.len()
                    );
                }
                sales
            }
            Err(err) => {
                log_day_failure(day, "category sales", &err);
                errors.push(err.to_string());
                Vec::new()
            }
        }
    }

    /// The transaction path and the summary path measure the same sales
    /// through different endpoints; persistent disagreement means the
    /// catalog and the category sets have drifted apart.
    fn log_classification_drift(
        &self,
        day: NaiveDate,
        series: &DailySeries,
        summary: &[CategorySales],
    ) {
        if summary.is_empty() {
            return;
        }
        let from_summary = category_department_totals(summary, &self.scheme);
        for department in Department::ALL {
            let transacted = series.department_total(department);
            let summarized = from_summary.get(&department).copied().unwrap_or(0.0);
            if (transacted - summarized).abs() > DRIFT_TOLERANCE {
                warn!(
                    "{day}: {department} totals disagree between paths: \
                     transactions={transacted}, summary={summarized}"
                );
            }
        }
    }
}

/// Transient upstream failures are routine and log as warnings; a decode
/// failure means the wire contract broke and logs as an error.
fn log_day_failure(day: NaiveDate, source: &str, err: &PosError) {
    if err.is_transient() {
        warn!("{day}: {source} unavailable, serving an empty day instead: {err}");
    } else {
        error!("{day}: {source} response was undecodable, serving an empty day instead: {err}");
    }
}

/// Join the two days' summaries into name-keyed rows for the table view.
fn merge_category_totals(
    current: &[CategorySales],
    reference: &[CategorySales],
) -> BTreeMap<String, PeriodTotals> {
    let mut merged: BTreeMap<String, PeriodTotals> = BTreeMap::new();
    for row in current {
        merged.entry(row.category_name.clone()).or_default().current += row.count;
    }
    for row in reference {
        merged.entry(row.category_name.clone()).or_default().reference += row.count;
    }
    merged
}

/// Department totals as seen through the category summary endpoint.
fn category_department_totals(
    sales: &[CategorySales],
    scheme: &DepartmentScheme,
) -> BTreeMap<Department, f64> {
    let mut totals = BTreeMap::new();
    for row in sales {
        if let Some(department) = scheme.classify(row.category_id) {
            *totals.entry(department).or_insert(0.0) += row.count;
        }
    }
    totals
}

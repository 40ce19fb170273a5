//! Pure hourly aggregation of transaction lines into cumulative series.

use std::collections::BTreeMap;

use chrono::Timelike;

use crate::models::{Catalog, Department, HourRange, TransactionLine};

/// Bin line quantities by closing hour and department, then convert each
/// department's buckets into a running total, left to right, independently
/// per department.
///
/// Lines closing outside `hours` are discarded, not reallocated to a window
/// edge. Lines whose product is absent from `catalog` are discarded rather
/// than landing in a default department. The function is pure: identical
/// inputs always produce identical output.
pub fn aggregate(
    lines: &[TransactionLine],
    catalog: &Catalog,
    hours: HourRange,
) -> BTreeMap<Department, Vec<f64>> {
    let mut series: BTreeMap<Department, Vec<f64>> = Department::ALL
        .iter()
        .map(|d| (*d, vec![0.0; hours.len()]))
        .collect();

    for line in lines {
        let Some(index) = hours.index_of(line.closed_at.hour()) else {
            continue;
        };
        let Some(department) = catalog.get(&line.product_id) else {
            continue;
        };
        if let Some(buckets) = series.get_mut(department) {
            buckets[index] += line.quantity;
        }
    }

    for buckets in series.values_mut() {
        running_total(buckets);
    }
    series
}

fn running_total(buckets: &mut [f64]) {
    let mut total = 0.0;
    for value in buckets.iter_mut() {
        total += *value;
        *value = total;
    }
}

//! Kitchen departments and the category partition that assigns them.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kitchen work area a sold item is routed to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Hot,
    Cold,
    Bar,
}

impl Department {
    /// All departments in stable display order.
    pub const ALL: [Department; 3] = [Department::Hot, Department::Cold, Department::Bar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Hot => "hot",
            Department::Cold => "cold",
            Department::Bar => "bar",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static partition of POS menu-category ids into departments.
///
/// The three sets are configuration, not data: they come from the dashboard
/// config and are validated disjoint at startup (see
/// [`crate::config::DashboardConfig::validate`]). `classify` itself resolves an
/// accidental overlap by first match, in hot → cold → bar order, but reaching
/// that path means validation was skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepartmentScheme {
    #[serde(default)]
    pub hot: HashSet<i64>,
    #[serde(default)]
    pub cold: HashSet<i64>,
    #[serde(default)]
    pub bar: HashSet<i64>,
}

impl DepartmentScheme {
    pub fn new(
        hot: impl IntoIterator<Item = i64>,
        cold: impl IntoIterator<Item = i64>,
        bar: impl IntoIterator<Item = i64>,
    ) -> Self {
        Self {
            hot: hot.into_iter().collect(),
            cold: cold.into_iter().collect(),
            bar: bar.into_iter().collect(),
        }
    }

    /// Resolve a menu category to its department.
    ///
    /// Returns `None` for categories outside every set; such items are excluded
    /// from department totals entirely rather than landing in a default bucket.
    pub fn classify(&self, category_id: i64) -> Option<Department> {
        if self.hot.contains(&category_id) {
            Some(Department::Hot)
        } else if self.cold.contains(&category_id) {
            Some(Department::Cold)
        } else if self.bar.contains(&category_id) {
            Some(Department::Bar)
        } else {
            None
        }
    }

    /// Category ids claimed by more than one department, sorted.
    ///
    /// Non-empty output is a configuration error; `DashboardConfig::validate`
    /// rejects it before any service is built.
    pub fn overlapping_ids(&self) -> Vec<i64> {
        let mut overlap: Vec<i64> = self
            .hot
            .intersection(&self.cold)
            .chain(self.hot.intersection(&self.bar))
            .chain(self.cold.intersection(&self.bar))
            .copied()
            .collect();
        overlap.sort_unstable();
        overlap.dedup();
        overlap
    }

    /// True when no category is assigned anywhere.
    pub fn is_empty(&self) -> bool {
        self.hot.is_empty() && self.cold.is_empty() && self.bar.is_empty()
    }
}

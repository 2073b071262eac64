// ── Metric snapshot ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::metric::Metric;

/// Every metric value captured by one successful poll.
///
/// Built in one piece by an extractor and never patched afterwards: a new
/// poll produces a new snapshot that replaces the old one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSnapshot {
    values: BTreeMap<Metric, Option<f64>>,
    captured_at: DateTime<Utc>,
}

impl MetricSnapshot {
    pub fn new(values: BTreeMap<Metric, Option<f64>>) -> Self {
        Self::captured_at(values, Utc::now())
    }

    pub fn captured_at(values: BTreeMap<Metric, Option<f64>>, at: DateTime<Utc>) -> Self {
        Self {
            values,
            captured_at: at,
        }
    }

    /// Value for `metric`, or `None` if it is absent or was reported empty.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied().flatten()
    }

    /// Whether the snapshot has an entry (possibly `None`) for `metric`.
    pub fn contains(&self, metric: Metric) -> bool {
        self.values.contains_key(&metric)
    }

    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, Option<f64>)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

impl FromIterator<(Metric, Option<f64>)> for MetricSnapshot {
    fn from_iter<I: IntoIterator<Item = (Metric, Option<f64>)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

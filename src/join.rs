// 🔗 Joiner
// Left join of tract geometries with metric rows on GEOID

use crate::error::{MapError, Result};
use crate::metrics::MetricRecord;
use crate::tracts::{Tract, TractId};
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// How many duplicate ids to list in an error before eliding
const MAX_REPORTED_DUPLICATES: usize = 10;

// ============================================================================
// CORE TYPES
// ============================================================================

/// A tract with the metric value joined onto it (if any)
#[derive(Debug, Clone)]
pub struct JoinedRecord {
    pub id: TractId,
    pub county_code: String,
    pub geometry: MultiPolygon<f64>,
    pub value: Option<f64>,
    /// Class label for categorical maps
    pub category: Option<String>,
    /// A metric row existed for this tract, even if its value is missing
    pub matched: bool,
}

impl JoinedRecord {
    /// True when the value can be placed on the color scale
    pub fn has_value(&self) -> bool {
        self.value.map_or(false, f64::is_finite)
    }
}

/// What to do when the metric file has more than one row for a tract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Relational semantics: one output row per match
    Multiply,
    /// Use the first row in file order
    KeepFirst,
    /// Fail, listing the duplicated tract ids
    #[default]
    Reject,
}

// ============================================================================
// MERGE
// ============================================================================

/// Left join: every tract survives, one row per matching metric record
pub fn merge(tracts: &[Tract], metrics: &[MetricRecord]) -> Vec<JoinedRecord> {
    let index = index_metrics(metrics);
    let mut joined = Vec::with_capacity(tracts.len());

    for tract in tracts {
        match index.get(&tract.id) {
            Some(matches) => {
                for metric in matches {
                    joined.push(joined_row(tract, Some(metric)));
                }
            }
            None => joined.push(joined_row(tract, None)),
        }
    }

    joined
}

/// Left join with an explicit answer to duplicate metric rows
pub fn merge_with(
    tracts: &[Tract],
    metrics: &[MetricRecord],
    policy: DuplicatePolicy,
) -> Result<Vec<JoinedRecord>> {
    match policy {
        DuplicatePolicy::Multiply => Ok(merge(tracts, metrics)),
        DuplicatePolicy::KeepFirst => {
            let index = index_metrics(metrics);
            Ok(tracts
                .iter()
                .map(|tract| {
                    let first = index.get(&tract.id).and_then(|m| m.first().copied());
                    joined_row(tract, first)
                })
                .collect())
        }
        DuplicatePolicy::Reject => {
            let duplicates = duplicate_ids(tracts, metrics);
            if !duplicates.is_empty() {
                let mut ids: Vec<String> = duplicates
                    .iter()
                    .take(MAX_REPORTED_DUPLICATES)
                    .map(|id| id.to_string())
                    .collect();
                if duplicates.len() > MAX_REPORTED_DUPLICATES {
                    ids.push(format!(
                        "... and {} more",
                        duplicates.len() - MAX_REPORTED_DUPLICATES
                    ));
                }
                return Err(MapError::DuplicateTractIds { ids });
            }
            Ok(merge(tracts, metrics))
        }
    }
}

/// Tract ids (in tract order) that have more than one metric row
pub fn duplicate_ids(tracts: &[Tract], metrics: &[MetricRecord]) -> Vec<TractId> {
    let index = index_metrics(metrics);
    let mut seen = HashSet::new();

    tracts
        .iter()
        .filter(|t| index.get(&t.id).map_or(false, |m| m.len() > 1))
        .filter(|t| seen.insert(t.id.clone()))
        .map(|t| t.id.clone())
        .collect()
}

fn index_metrics(metrics: &[MetricRecord]) -> HashMap<&TractId, Vec<&MetricRecord>> {
    let mut index: HashMap<&TractId, Vec<&MetricRecord>> = HashMap::new();
    for metric in metrics {
        index.entry(&metric.id).or_default().push(metric);
    }
    index
}

fn joined_row(tract: &Tract, metric: Option<&MetricRecord>) -> JoinedRecord {
    JoinedRecord {
        id: tract.id.clone(),
        county_code: tract.county_code.clone(),
        geometry: tract.geometry.clone(),
        value: metric.and_then(|m| m.value),
        category: metric.and_then(|m| m.category.clone()),
        matched: metric.is_some(),
    }
}

// ============================================================================
// JOIN REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct JoinReport {
    pub tracts: usize,
    pub rows: usize,
    pub matched_rows: usize,
    pub valued_rows: usize,
    pub unmatched_tracts: Vec<TractId>,
    /// Metric rows whose id is not among the tracts
    pub orphan_metrics: usize,
}

impl JoinReport {
    pub fn new(tracts: &[Tract], metrics: &[MetricRecord], joined: &[JoinedRecord]) -> Self {
        let tract_ids: HashSet<&TractId> = tracts.iter().map(|t| &t.id).collect();

        JoinReport {
            tracts: tracts.len(),
            rows: joined.len(),
            matched_rows: joined.iter().filter(|r| r.matched).count(),
            valued_rows: joined.iter().filter(|r| r.has_value()).count(),
            unmatched_tracts: joined
                .iter()
                .filter(|r| !r.matched)
                .map(|r| r.id.clone())
                .collect(),
            orphan_metrics: metrics
                .iter()
                .filter(|m| !tract_ids.contains(&m.id))
                .count(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} tracts, {} rows, {} matched, {} with values, {} unmatched",
            self.tracts,
            self.rows,
            self.matched_rows,
            self.valued_rows,
            self.unmatched_tracts.len()
        )
    }

    /// Share of rows that will be colored (0.0 for an empty join)
    pub fn coverage(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.valued_rows as f64 / self.rows as f64
        }
    }
}

// ============================================================================
// QA EXPORT
// ============================================================================

#[derive(Debug, Serialize)]
struct UnmatchedRow<'a> {
    #[serde(rename = "GEOID")]
    geoid: &'a str,
    status: &'static str,
}

/// Write every row without a plottable value to CSV for follow-up.
/// Returns the number of rows written; no file is created when there are none.
pub fn write_unmatched(path: &Path, joined: &[JoinedRecord]) -> Result<usize> {
    write_unplotted(path, joined, JoinedRecord::has_value)
}

/// Same as `write_unmatched`, with the caller deciding which rows got a color
pub fn write_unplotted<F>(path: &Path, joined: &[JoinedRecord], plotted: F) -> Result<usize>
where
    F: Fn(&JoinedRecord) -> bool,
{
    if joined.iter().all(|r| plotted(r)) {
        return Ok(0);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MapError::io(parent, e))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    let mut written = 0;

    for record in joined.iter().filter(|r| !plotted(r)) {
        writer.serialize(UnmatchedRow {
            geoid: record.id.as_str(),
            status: match (record.matched, &record.category) {
                (false, _) => "no_metric_row",
                (true, None) => "missing_value",
                (true, Some(_)) => "unclassified",
            },
        })?;
        written += 1;
    }

    writer.flush().map_err(|e| MapError::io(path, e))?;
    Ok(written)
}

// ============================================================================
// TESTS
// ============================================================================

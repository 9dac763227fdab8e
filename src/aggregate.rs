use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::metrika::{contains_too_complex, AnalyticsApi, ApiEntry, ApiResponse, ProviderQueryError};
use crate::period::Period;
use crate::query::Query;

/// Accumulated metrics for one primary grouping key.
///
/// `aux` holds the auxiliary dimension values recorded when the key was first
/// seen; they are not merged. Metrics are summed element-wise with the shorter
/// vector zero-padded on the right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub aux: Vec<String>,
    pub metrics: Vec<u64>,
}

/// Result rows keyed by primary grouping key, in first-seen order across all
/// sub-period executions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    rows: IndexMap<String, Row>,
}

impl ResultSet {
    pub fn new() -> Self {
        ResultSet::default()
    }

    fn accumulate(&mut self, key: String, aux: Vec<String>, metrics: Vec<u64>) {
        let row = self.rows.entry(key).or_insert_with(|| Row {
            aux,
            metrics: Vec::new(),
        });
        if metrics.len() > row.metrics.len() {
            row.metrics.resize(metrics.len(), 0);
        }
        for (total, value) in row.metrics.iter_mut().zip(metrics) {
            *total += value;
        }
    }

    pub fn get(&self, key: &str) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Row)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Run `query` over `period` and aggregate the results per primary grouping
/// key.
///
/// `grouping_keys` are field names of the first dimension object of each
/// entry; the first one is the primary key, the rest are recorded as
/// auxiliary values. When the provider rejects the period as too complex the
/// period is halved and both halves are processed into the same accumulator,
/// recursively, until every sub-window is accepted. Any other provider error
/// aborts the run.
pub fn process<A: AnalyticsApi>(
    api: &A,
    query: &Query,
    grouping_keys: &[&str],
    period: Period,
) -> Result<ResultSet> {
    anyhow::ensure!(
        !grouping_keys.is_empty(),
        "at least one grouping key is required"
    );

    let mut results = ResultSet::new();
    process_into(api, query, grouping_keys, period, &mut results)?;
    Ok(results)
}

fn process_into<A: AnalyticsApi>(
    api: &A,
    query: &Query,
    grouping_keys: &[&str],
    period: Period,
    results: &mut ResultSet,
) -> Result<()> {
    let resolved = query.clone().apply(period.as_fragment());
    log::debug!("processing period {}", period);

    match api.execute(&resolved)? {
        ApiResponse::Success { data } => {
            log::debug!("period {} returned {} entries", period, data.len());
            for entry in data {
                let mut values = grouping_values(&entry, grouping_keys)?;
                let key = values.remove(0);
                let metrics = entry.metrics.iter().map(|m| *m as u64).collect();
                results.accumulate(key, values, metrics);
            }
        }
        ApiResponse::Failure { errors } => {
            if contains_too_complex(&errors) {
                let (first, second) = period.split()?;
                log::info!(
                    "query too complex for {}, splitting into {} and {}",
                    period,
                    first,
                    second
                );
                process_into(api, query, grouping_keys, first, results)?;
                process_into(api, query, grouping_keys, second, results)?;
            } else {
                return Err(ProviderQueryError {
                    query: resolved,
                    errors,
                }
                .into());
            }
        }
    }

    Ok(())
}

fn grouping_values(entry: &ApiEntry, grouping_keys: &[&str]) -> Result<Vec<String>> {
    let dimension = entry
        .dimensions
        .first()
        .context("analytics entry has no dimensions")?;

    grouping_keys
        .iter()
        .map(|name| {
            let value = dimension
                .get(*name)
                .with_context(|| format!("analytics dimension has no '{}' field", name))?;
            Ok(match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            })
        })
        .collect()
}

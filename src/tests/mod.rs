use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use serde_json::json;

use crate::metrika::{AnalyticsApi, ApiEntry, ApiError, ApiResponse};
use crate::query::Query;

pub mod fixtures;

pub mod aggregate_tests;

/// In-memory analytics API scripted per requested date range, recording the
/// ranges it was called with.
pub struct ScriptedApi {
    responses: HashMap<(String, String), ApiResponse>,
    pub calls: RefCell<Vec<(String, String)>>,
    pub queries: RefCell<Vec<Query>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        ScriptedApi {
            responses: HashMap::new(),
            calls: RefCell::new(Vec::new()),
            queries: RefCell::new(Vec::new()),
        }
    }

    pub fn respond(mut self, date1: &str, date2: &str, response: ApiResponse) -> Self {
        self.responses
            .insert((date1.to_string(), date2.to_string()), response);
        self
    }
}

impl AnalyticsApi for ScriptedApi {
    fn execute(&self, query: &Query) -> Result<ApiResponse> {
        let date1 = query.get("date1").unwrap_or("").to_string();
        let date2 = query.get("date2").unwrap_or("").to_string();
        self.calls.borrow_mut().push((date1.clone(), date2.clone()));
        self.queries.borrow_mut().push(query.clone());

        self.responses
            .get(&(date1.clone(), date2))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no scripted response for date1={}", date1))
    }
}

/// Success payload with one single-dimension entry per `(name, metrics)` pair.
pub fn success(rows: &[(&str, &[f64])]) -> ApiResponse {
    let data = rows
        .iter()
        .map(|(name, metrics)| entry(json!([{ "name": name }]), metrics))
        .collect();
    ApiResponse::Success { data }
}

pub fn entry(dimensions: serde_json::Value, metrics: &[f64]) -> ApiEntry {
    serde_json::from_value(json!({ "dimensions": dimensions, "metrics": metrics })).unwrap()
}

pub fn failure(error_types: &[&str]) -> ApiResponse {
    ApiResponse::Failure {
        errors: error_types
            .iter()
            .map(|error_type| ApiError {
                error_type: error_type.to_string(),
                message: None,
            })
            .collect(),
    }
}

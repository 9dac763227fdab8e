use serde_json::json;

use super::{entry, failure, success, ScriptedApi};
use crate::aggregate::process;
use crate::metrika::{ApiResponse, ProviderQueryError};
use crate::period::{InvalidPeriod, Period};
use crate::query::Query;

fn period(start: &str, end: &str) -> Period {
    Period::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
}

#[test]
fn test_direct_success_is_aggregated_per_key() {
    let api = ScriptedApi::new().respond(
        "2022-01-01",
        "2022-01-31",
        success(&[("RU", &[10.0, 5.0]), ("DE", &[3.0, 1.0])]),
    );

    let results = process(&api, &Query::new(), &["name"], period("2022-01-01", "2022-01-31"))
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results.get("RU").unwrap().metrics, vec![10, 5]);
    assert_eq!(results.get("DE").unwrap().metrics, vec![3, 1]);
}

#[test]
fn test_too_complex_splits_once_and_merges_halves() {
    // Spec recovery scenario: the full year is rejected, both halves succeed.
    let api = ScriptedApi::new()
        .respond("2022-01-01", "2022-12-31", failure(&["query_error"]))
        .respond("2022-01-01", "2022-07-02", success(&[("x", &[1.0, 2.0])]))
        .respond("2022-07-03", "2022-12-31", success(&[("x", &[3.0, 4.0])]));

    let results = process(&api, &Query::new(), &["name"], period("2022-01-01", "2022-12-31"))
        .unwrap();

    assert_eq!(results.get("x").unwrap().metrics, vec![4, 6]);
    assert_eq!(
        *api.calls.borrow(),
        vec![
            ("2022-01-01".to_string(), "2022-12-31".to_string()),
            ("2022-01-01".to_string(), "2022-07-02".to_string()),
            ("2022-07-03".to_string(), "2022-12-31".to_string()),
        ]
    );
}

#[test]
fn test_recursive_splitting_reaches_accepted_windows() {
    // The first half is rejected again and splits a second time.
    let api = ScriptedApi::new()
        .respond("2022-01-01", "2022-01-04", failure(&["query_error"]))
        .respond("2022-01-01", "2022-01-02", failure(&["query_error"]))
        .respond("2022-01-01", "2022-01-01", success(&[("x", &[1.0])]))
        .respond("2022-01-02", "2022-01-02", success(&[("x", &[2.0])]))
        .respond("2022-01-03", "2022-01-04", success(&[("x", &[4.0])]));

    let results = process(&api, &Query::new(), &["name"], period("2022-01-01", "2022-01-04"))
        .unwrap();

    assert_eq!(results.get("x").unwrap().metrics, vec![7]);
}

#[test]
fn test_split_halves_sum_like_the_direct_query() {
    let direct = ScriptedApi::new().respond(
        "2022-01-01",
        "2022-01-10",
        success(&[("a", &[8.0, 6.0]), ("b", &[2.0, 2.0])]),
    );
    let split = ScriptedApi::new()
        .respond("2022-01-01", "2022-01-10", failure(&["query_error"]))
        .respond(
            "2022-01-01",
            "2022-01-05",
            success(&[("a", &[5.0, 4.0]), ("b", &[1.0, 1.0])]),
        )
        .respond(
            "2022-01-06",
            "2022-01-10",
            success(&[("a", &[3.0, 2.0]), ("b", &[1.0, 1.0])]),
        );

    let span = period("2022-01-01", "2022-01-10");
    let direct_results = process(&direct, &Query::new(), &["name"], span).unwrap();
    let split_results = process(&split, &Query::new(), &["name"], span).unwrap();

    assert_eq!(direct_results, split_results);
}

#[test]
fn test_shorter_metric_vectors_are_zero_padded() {
    let api = ScriptedApi::new()
        .respond("2022-01-01", "2022-01-31", failure(&["query_error"]))
        .respond("2022-01-01", "2022-01-16", success(&[("x", &[1.0, 2.0])]))
        .respond("2022-01-17", "2022-01-31", success(&[("x", &[3.0])]));

    let results = process(&api, &Query::new(), &["name"], period("2022-01-01", "2022-01-31"))
        .unwrap();

    assert_eq!(results.get("x").unwrap().metrics, vec![4, 2]);
}

#[test]
fn test_keys_keep_first_seen_order_across_sub_calls() {
    let api = ScriptedApi::new()
        .respond("2022-01-01", "2022-01-31", failure(&["query_error"]))
        .respond("2022-01-01", "2022-01-16", success(&[("B", &[1.0])]))
        .respond(
            "2022-01-17",
            "2022-01-31",
            success(&[("A", &[100.0]), ("B", &[1.0])]),
        );

    let results = process(&api, &Query::new(), &["name"], period("2022-01-01", "2022-01-31"))
        .unwrap();

    let keys: Vec<&str> = results.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec!["B", "A"]);
}

#[test]
fn test_auxiliary_dimensions_are_recorded_not_merged() {
    let api = ScriptedApi::new().respond(
        "2022-01-01",
        "2022-01-31",
        ApiResponse::Success {
            data: vec![
                entry(json!([{ "name": "Russia", "iso_name": "RU" }]), &[10.0]),
                entry(json!([{ "name": "Russia", "iso_name": "ignored" }]), &[5.0]),
            ],
        },
    );

    let results = process(
        &api,
        &Query::new(),
        &["name", "iso_name"],
        period("2022-01-01", "2022-01-31"),
    )
    .unwrap();

    let row = results.get("Russia").unwrap();
    assert_eq!(row.aux, vec!["RU"]);
    assert_eq!(row.metrics, vec![15]);
}

#[test]
fn test_other_provider_errors_are_fatal() {
    let api = ScriptedApi::new().respond(
        "2022-01-01",
        "2022-01-31",
        failure(&["backend_error"]),
    );

    let err = process(&api, &Query::new(), &["name"], period("2022-01-01", "2022-01-31"))
        .unwrap_err();

    let provider_error = err.downcast_ref::<ProviderQueryError>().unwrap();
    assert_eq!(provider_error.errors[0].error_type, "backend_error");
    assert_eq!(provider_error.query.get("date1"), Some("2022-01-01"));
}

#[test]
fn test_too_complex_single_day_fails_instead_of_looping() {
    let api = ScriptedApi::new().respond(
        "2022-01-01",
        "2022-01-01",
        failure(&["query_error"]),
    );

    let err = process(&api, &Query::new(), &["name"], period("2022-01-01", "2022-01-01"))
        .unwrap_err();

    assert!(err.downcast_ref::<InvalidPeriod>().is_some());
}

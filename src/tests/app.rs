use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::{build_app, TableEmbedder};
use crate::app::{AppError, RecommendRequest};
use crate::extract::ExtractError;
use crate::recommender::RecommendError;

const QUERY: &str = "Hiring graduates with strong numerical reasoning";

fn embedder() -> Arc<TableEmbedder> {
    Arc::new(TableEmbedder::with_catalog(&[(QUERY, vec![1.0, 0.0, 0.3])]))
}

fn query(text: &str) -> RecommendRequest {
    RecommendRequest {
        query: Some(text.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_recommend_direct_query() {
    let app = build_app(embedder());
    let response = app.recommend(query(QUERY)).unwrap();

    assert_eq!(response.results.len(), 2);
    assert_eq!(response.results[0].name, "General Ability Test");
    assert_eq!(response.results[0].duration_minutes, 30);
    assert_eq!(response.results[1].name, "Customer Service Simulation");
}

#[test]
fn test_response_entry_shape() {
    let app = build_app(embedder());
    let response = app.recommend(query(QUERY)).unwrap();
    let json = serde_json::to_value(&response).unwrap();

    let first = &json["results"][0];
    assert_eq!(first["name"], "General Ability Test");
    assert_eq!(first["url"], "https://www.shl.com/product/general-ability-test/");
    assert_eq!(first["test_type"], "Cognitive");
    assert_eq!(first["duration_minutes"], 30);
    assert_eq!(first["remote_testing"], "Yes");
    assert_eq!(first["adaptive_irt"], "Yes");
    assert!(first["description"].is_string());
    assert!(first["similarity_score"].as_f64().unwrap() > 0.4);
}

#[test]
fn test_no_query_and_no_url() {
    let app = build_app(embedder());
    let result = app.recommend(RecommendRequest::default());
    assert!(matches!(
        result,
        Err(AppError::Recommend(RecommendError::EmptyQuery))
    ));
}

#[test]
fn test_blank_query_rejected_without_embedding() {
    let emb = embedder();
    let app = build_app(emb.clone());

    let result = app.recommend(query("  \n "));
    assert!(matches!(
        result,
        Err(AppError::Recommend(RecommendError::EmptyQuery))
    ));
    assert_eq!(emb.query_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_url_takes_precedence_over_query() {
    let app = build_app(embedder());
    let request = RecommendRequest {
        query: Some(QUERY.to_string()),
        url: Some("not-a-url".to_string()),
        ..Default::default()
    };

    assert!(matches!(
        app.recommend(request),
        Err(AppError::Extract(ExtractError::InvalidUrl(_)))
    ));
}

#[test]
fn test_empty_url_falls_back_to_query() {
    let app = build_app(embedder());
    let request = RecommendRequest {
        query: Some(QUERY.to_string()),
        url: Some(String::new()),
        ..Default::default()
    };

    let response = app.recommend(request).unwrap();
    assert!(!response.results.is_empty());
}

#[test]
fn test_unreachable_url_is_fetch_error() {
    let app = build_app(embedder());
    let request = RecommendRequest {
        url: Some("http://127.0.0.1:9/job".to_string()),
        ..Default::default()
    };

    let err = app.recommend(request).unwrap_err();
    assert!(matches!(err, AppError::Extract(ExtractError::Fetch(_))));
    assert!(!err.is_user_error());
}

#[test]
fn test_overrides() {
    let app = build_app(embedder());

    let request = RecommendRequest {
        limit: Some(1),
        ..query(QUERY)
    };
    assert_eq!(app.recommend(request).unwrap().results.len(), 1);

    let request = RecommendRequest {
        threshold: Some(0.99),
        ..query(QUERY)
    };
    assert!(app.recommend(request).unwrap().results.is_empty());
}

#[test]
fn test_threshold_override_out_of_range() {
    let app = build_app(embedder());
    let request = RecommendRequest {
        threshold: Some(2.0),
        ..query(QUERY)
    };

    let err = app.recommend(request).unwrap_err();
    assert!(matches!(err, AppError::InvalidParams(_)));
    assert!(err.is_user_error());
}

#[test]
fn test_health_and_catalog() {
    let app = build_app(embedder());

    let health = app.health();
    assert_eq!(health.model, "table");
    assert_eq!(health.catalog_items, 3);
    assert_eq!(health.catalog_fingerprint.len(), 64);

    assert_eq!(app.catalog().len(), 3);
}

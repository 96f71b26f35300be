mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use wayfarer::adapters::flights_finder::FlightsFinder;
use wayfarer::adapters::hotels_finder::HotelsFinder;
use wayfarer::adapters::serpapi::{SearchLocale, SerpApiClient};
use wayfarer::config::SearchConfig;
use wayfarer::domain::Tool;

type Recorded = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn search(
    State(recorded): State<Recorded>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    recorded.lock().unwrap().push(params.clone());

    if params.get("api_key").map(String::as_str) != Some("serp-key") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid API key. Your API key should be here: https://serpapi.com/manage-api-key" })),
        )
            .into_response();
    }

    match params.get("engine").map(String::as_str) {
        Some("google_hotels") => Json(json!({
            "properties": [
                { "name": "Hotel Avenida" },
                { "name": "Casa do Largo" },
                { "name": "Pensao Amor" }
            ]
        }))
        .into_response(),
        Some("google_flights") => Json(json!({
            "best_flights": [{ "price": 420 }],
            "other_flights": [{ "price": 510 }, { "price": 530 }, { "price": 610 }]
        }))
        .into_response(),
        _ => Json(json!({ "error": "Unsupported engine" })).into_response(),
    }
}

async fn client(key: &str) -> (Arc<SerpApiClient>, Recorded) {
    let recorded: Recorded = Arc::default();
    let router = Router::new()
        .route("/search.json", get(search))
        .with_state(recorded.clone());
    let base_url = common::serve(router).await;

    let config = SearchConfig {
        base_url,
        api_key_env: "WAYFARER_TEST_UNSET_SERPAPI_KEY".to_string(),
        ..SearchConfig::default()
    };
    let client = SerpApiClient::from_config(&config).unwrap().with_api_key(key);
    (Arc::new(client), recorded)
}

#[tokio::test]
async fn test_hotels_through_serpapi_client() {
    let (client, recorded) = client("serp-key").await;
    let hotels = HotelsFinder::new(client, SearchLocale::default(), 2);

    let result = hotels
        .invoke(json!({
            "params": { "q": "Lisbon", "check_in_date": "2099-05-01", "check_out_date": "2099-05-04", "adults": 2 }
        }))
        .await
        .unwrap();

    assert_eq!(result, json!([{ "name": "Hotel Avenida" }, { "name": "Casa do Largo" }]));

    let params = &recorded.lock().unwrap()[0];
    assert_eq!(params["engine"], "google_hotels");
    assert_eq!(params["q"], "Lisbon");
    assert_eq!(params["adults"], "2");
    assert_eq!(params["currency"], "USD");
}

#[tokio::test]
async fn test_flights_top_up_from_other_flights() {
    let (client, recorded) = client("serp-key").await;
    let flights = FlightsFinder::new(client, SearchLocale::default(), 3);

    let result = flights
        .invoke(json!({
            "params": { "departure_airport": "lis", "arrival_airport": "JFK", "outbound_date": "2099-05-01" }
        }))
        .await
        .unwrap();

    let prices: Vec<i64> = result
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["price"].as_i64().unwrap())
        .collect();
    assert_eq!(prices, vec![420, 510, 530]);

    let params = &recorded.lock().unwrap()[0];
    assert_eq!(params["departure_id"], "LIS");
    assert_eq!(params["type"], "2");
}

#[tokio::test]
async fn test_serpapi_error_field_becomes_tool_error() {
    let (client, _) = client("wrong").await;
    let hotels = HotelsFinder::new(client, SearchLocale::default(), 2);

    let err = hotels
        .invoke(json!({
            "params": { "q": "Lisbon", "check_in_date": "2099-05-01", "check_out_date": "2099-05-04" }
        }))
        .await
        .unwrap_err();

    assert!(err.to_record()["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid API key"));
}

#[tokio::test]
async fn test_missing_key_never_reaches_network() {
    let config = SearchConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        api_key_env: "WAYFARER_TEST_UNSET_SERPAPI_KEY".to_string(),
        ..SearchConfig::default()
    };
    let hotels = HotelsFinder::new(
        Arc::new(SerpApiClient::from_config(&config).unwrap()),
        SearchLocale::default(),
        2,
    );

    let err = hotels
        .invoke(json!({
            "params": { "q": "Lisbon", "check_in_date": "2099-05-01", "check_out_date": "2099-05-04" }
        }))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_record(),
        json!({ "error": "WAYFARER_TEST_UNSET_SERPAPI_KEY is not set" })
    );
}

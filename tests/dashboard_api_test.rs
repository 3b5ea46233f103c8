//! Integration tests for the dashboard API against an in-process fake shop backend.
//!
//! Both servers bind to random local ports; no external services are needed.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{FixedOffset, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use shop_dashboard::config::AppConfig;
use shop_dashboard::services::dashboard::{DashboardOptions, DashboardService, LocalZone};
use shop_dashboard::services::shop_client::ShopClient;
use shop_dashboard::{routes, AppState};

/// Behaviour of the fake shop backend.
#[derive(Clone, Copy, Default)]
struct Backend {
    waste_fails: bool,
    sales_empty: bool,
}

#[derive(Clone)]
struct FakeShop {
    backend: Backend,
    sales_hits: Arc<AtomicUsize>,
}

async fn products() -> Json<Value> {
    Json(json!([
        {"id": 1, "name": "Rice", "category": "Grains", "stock_quantity": 0,
         "min_stock_level": 5, "cost_price": "2.00", "price": "3.00"},
        {"id": 2, "name": "Beans", "category": "Grains", "stock_quantity": 3,
         "min_stock_level": 5, "cost_price": "4.00", "price": "6.00"},
        {"id": 3, "name": "Coffee", "category": "Drinks", "stock_quantity": 50,
         "cost_price": "10.00", "price": "15.00"}
    ]))
}

async fn sales(State(shop): State<FakeShop>) -> Json<Value> {
    shop.sales_hits.fetch_add(1, Ordering::SeqCst);
    if shop.backend.sales_empty {
        return Json(json!({"count": 0, "results": []}));
    }
    let at = Utc::now().to_rfc3339();
    Json(json!({
        "count": 2,
        "next": null,
        "results": [
            {"id": 10, "created_at": at, "total_amount": "40.00",
             "items": [{"product": 3, "quantity": 2}]},
            {"id": 11, "created_at": at, "total_amount": "60.00",
             "items": [{"product_id": 3, "quantity": "1"}]}
        ]
    }))
}

async fn waste(State(shop): State<FakeShop>) -> (StatusCode, Json<Value>) {
    if shop.backend.waste_fails {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "boom"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "summary": {"total_waste_value": "25.60", "waste_count": 4, "total_waste_quantity": 9}
        })),
    )
}

async fn status() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}")
}

/// Start the fake shop backend, returning its API base URL and sales hit counter.
async fn start_shop(backend: Backend) -> (String, Arc<AtomicUsize>) {
    let sales_hits = Arc::new(AtomicUsize::new(0));
    let shop = FakeShop {
        backend,
        sales_hits: Arc::clone(&sales_hits),
    };
    let api = Router::new()
        .route("/products/", get(products))
        .route("/sales/", get(sales))
        .route("/wastes/summary/", get(waste))
        .route("/status/", get(status))
        .with_state(shop);
    let base = serve(Router::new().nest("/api/v1/shop", api)).await;
    (format!("{base}/api/v1/shop"), sales_hits)
}

/// Start the dashboard API against `shop_url`.
async fn start_dashboard(shop_url: &str, demo_mode: bool) -> String {
    let mut vars = vec![
        ("SHOP_API_BASE_URL", shop_url.to_string()),
        ("SHOP_API_TIMEOUT_SECS", "2".to_string()),
        ("DASHBOARD_UTC_OFFSET_MINUTES", "0".to_string()),
    ];
    if demo_mode {
        vars.push(("DASHBOARD_DEMO_MODE", "true".to_string()));
    }
    let config = AppConfig::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    })
    .expect("config");

    let client = ShopClient::new(&config.shop_api_base_url, config.shop_api_timeout()).expect("client");
    let dashboard = Arc::new(DashboardService::new(
        client,
        DashboardOptions {
            settings: config.metrics.clone(),
            zone: config.local_zone(),
            demo_mode: config.demo_mode,
        },
    ));
    assert_eq!(
        dashboard.options().zone,
        LocalZone::Fixed(FixedOffset::east_opt(0).unwrap())
    );

    serve(routes::router(AppState { config, dashboard })).await
}

/// Helper: extract `data` from the API envelope, panic with message on error.
fn extract_data(body: &Value) -> &Value {
    if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
        panic!(
            "API error: {}: {}",
            err["code"].as_str().unwrap_or("?"),
            err["message"].as_str().unwrap_or("?"),
        );
    }
    body.get("data").expect("missing 'data' field")
}

fn close(actual: &Value, expected: f64) -> bool {
    actual.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
}

#[tokio::test]
async fn dashboard_aggregates_live_shop_data() {
    let (shop, _) = start_shop(Backend::default()).await;
    let base = start_dashboard(&shop, false).await;
    let client = Client::new();

    let resp = client.get(format!("{base}/api/v1/dashboard")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let data = extract_data(&body);

    assert_eq!(data["sources"]["products"]["state"], "live");
    assert_eq!(data["sources"]["products"]["records"], 3);
    assert_eq!(data["sources"]["sales"]["records"], 2);
    assert_eq!(data["sources"]["waste"]["state"], "live");

    let metrics = &data["metrics"];
    assert_eq!(metrics["inventory"]["total_products"], 3);
    assert_eq!(metrics["inventory"]["out_of_stock_items"], 1);
    assert_eq!(metrics["inventory"]["low_stock_items"], 1);
    assert!(close(&metrics["inventory"]["total_inventory_value"], 512.0));

    // Sales stamped "now" may land on yesterday if the clock crosses midnight,
    // but always inside the weekly window.
    assert_eq!(metrics["week"]["total_sales"], 2);
    assert!(close(&metrics["week"]["total_revenue"], 100.0));
    assert!(close(&metrics["week"]["average_transaction"], 50.0));

    assert_eq!(metrics["waste"]["has_data"], true);
    assert!((metrics["waste"]["waste_percentage"].as_f64().unwrap() - 5.0).abs() < 1e-6);

    assert_eq!(metrics["daily_sales"].as_array().unwrap().len(), 7);
    assert_eq!(metrics["monthly_revenue"].as_array().unwrap().len(), 6);
    assert_eq!(metrics["hourly_sales"].as_array().unwrap().len(), 17);

    let top = metrics["top_products"].as_array().unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0]["name"], "Coffee");
    assert!(close(&top[0]["units_sold"], 3.0));
}

#[tokio::test]
async fn failed_waste_summary_is_reported_unavailable() {
    let (shop, _) = start_shop(Backend {
        waste_fails: true,
        ..Default::default()
    })
    .await;
    let base = start_dashboard(&shop, false).await;

    let body: Value = Client::new()
        .post(format!("{base}/api/v1/dashboard/refresh"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let data = extract_data(&body);

    assert_eq!(data["sources"]["waste"]["state"], "unavailable");
    assert!(data["sources"]["waste"]["reason"]
        .as_str()
        .unwrap()
        .contains("500"));
    assert_eq!(data["metrics"]["waste"]["has_data"], false);
    assert!(close(&data["metrics"]["waste"]["total_waste"], 0.0));
    // Other inputs are unaffected.
    assert_eq!(data["sources"]["products"]["state"], "live");
    assert_eq!(data["metrics"]["week"]["total_sales"], 2);
}

#[tokio::test]
async fn demo_mode_fills_empty_sales() {
    let (shop, _) = start_shop(Backend {
        sales_empty: true,
        ..Default::default()
    })
    .await;
    let base = start_dashboard(&shop, true).await;

    let body: Value = Client::new()
        .get(format!("{base}/api/v1/dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let data = extract_data(&body);

    assert_eq!(data["sources"]["sales"]["state"], "demo");
    assert_eq!(data["sources"]["waste"]["state"], "live");
    assert_eq!(data["metrics"]["week"]["total_sales"], 87);
}

#[tokio::test]
async fn latest_snapshot_is_reused_until_refresh() {
    let (shop, sales_hits) = start_shop(Backend::default()).await;
    let base = start_dashboard(&shop, false).await;
    let client = Client::new();

    for _ in 0..3 {
        let resp = client.get(format!("{base}/api/v1/dashboard")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert_eq!(sales_hits.load(Ordering::SeqCst), 1);

    let resp = client
        .get(format!("{base}/api/v1/dashboard?refresh=true"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(sales_hits.load(Ordering::SeqCst), 2);

    client
        .post(format!("{base}/api/v1/dashboard/refresh"))
        .send()
        .await
        .unwrap();
    assert_eq!(sales_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn invalid_query_is_a_validation_error() {
    let (shop, _) = start_shop(Backend::default()).await;
    let base = start_dashboard(&shop, false).await;

    let resp = Client::new()
        .get(format!("{base}/api/v1/dashboard?refresh=sometimes"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].is_null());
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn health_endpoints_report_status() {
    let (shop, _) = start_shop(Backend::default()).await;
    let base = start_dashboard(&shop, false).await;
    let client = Client::new();

    let resp = client.get(format!("{base}/health/live")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "OK");

    let body: Value = client
        .get(format!("{base}/health/ready"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let data = extract_data(&body);
    assert_eq!(data["shop_api"], "connected");
    assert_eq!(data["shop_api_url"], shop.as_str());
    assert_eq!(data["demo_mode"], false);
}

#[tokio::test]
async fn readiness_fails_when_shop_is_down() {
    // Bind and drop a listener to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let base = start_dashboard(&format!("http://{addr}/api/v1/shop"), false).await;
    let client = Client::new();

    let resp = client.get(format!("{base}/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UNAVAILABLE");

    // The dashboard still answers with an all-zero snapshot.
    let body: Value = client
        .get(format!("{base}/api/v1/dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let data = extract_data(&body);
    assert_eq!(data["sources"]["products"]["state"], "unavailable");
    assert_eq!(data["metrics"]["inventory"]["total_products"], 0);
    assert!(close(&data["metrics"]["today"]["total_revenue"], 0.0));
}

#[tokio::test]
async fn unknown_route_uses_the_envelope() {
    let (shop, _) = start_shop(Backend::default()).await;
    let base = start_dashboard(&shop, false).await;

    let resp = Client::new()
        .get(format!("{base}/api/v1/nothing"))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = api::create_default_state(InMemoryStore::new());
    api::create_app(state, get_metrics_handle())
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_product(app: &axum::Router, name: &str, weight: Value) -> i64 {
    let (status, json) = send(
        app,
        "POST",
        "/products/",
        Some(json!({ "name": name, "weight": weight })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["id"].as_i64().unwrap()
}

async fn create_customer(app: &axum::Router, name: &str) -> i64 {
    let (status, json) = send(
        app,
        "POST",
        "/customers/",
        Some(json!({
            "name": name,
            "contact_number": "+911234567890",
            "email": format!("{}@example.com", name.to_lowercase()),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["id"].as_i64().unwrap()
}

async fn post_order(app: &axum::Router, body: Value) -> (StatusCode, Value) {
    send(app, "POST", "/orders/", Some(body)).await
}

fn order_body(customer: Option<i64>, items: &[(i64, i64)]) -> Value {
    json!({
        "customer": customer,
        "order_date": "2024-05-01",
        "address": "12 Market Street",
        "order_items": items
            .iter()
            .map(|(product, quantity)| json!({ "product": product, "quantity": quantity }))
            .collect::<Vec<_>>(),
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

mod customers {
    use super::*;

    #[tokio::test]
    async fn test_customer_crud() {
        let app = setup();
        let id = create_customer(&app, "Alice").await;

        let (status, json) = send(&app, "GET", &format!("/customers/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["email"], "alice@example.com");

        let (status, json) = send(
            &app,
            "PUT",
            &format!("/customers/{id}"),
            Some(json!({ "name": "Alice B", "contact_number": "", "email": "ab@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Alice B");
        assert_eq!(json["contact_number"], "");

        let (status, json) = send(&app, "GET", "/customers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "DELETE", &format!("/customers/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, json) = send(&app, "GET", &format!("/customers/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Not found");
    }

    #[tokio::test]
    async fn test_invalid_customer_fields() {
        let app = setup();

        let (status, json) = send(
            &app,
            "POST",
            "/customers/",
            Some(json!({ "name": "Bob", "contact_number": "123", "email": "bob" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Validation failed");
        assert!(json["details"]["contact_number"].is_array());
        assert!(json["details"]["email"].is_array());
    }

    #[tokio::test]
    async fn test_duplicate_customer_name() {
        let app = setup();
        create_customer(&app, "Alice").await;

        let (status, json) = send(
            &app,
            "POST",
            "/customers/",
            Some(json!({ "name": "Alice", "email": "other@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["details"].as_str().unwrap().contains("Alice"));
    }
}

mod products {
    use super::*;

    #[tokio::test]
    async fn test_weight_accepts_string_or_number() {
        let app = setup();
        let a = create_product(&app, "Widget", json!("12.5")).await;
        let b = create_product(&app, "Gadget", json!(0.3)).await;
        let c = create_product(&app, "Gizmo", json!(2)).await;

        let (_, json) = send(&app, "GET", &format!("/products/{a}"), None).await;
        assert_eq!(json["weight"], "12.50");
        let (_, json) = send(&app, "GET", &format!("/products/{b}"), None).await;
        assert_eq!(json["weight"], "0.30");
        let (_, json) = send(&app, "GET", &format!("/products/{c}"), None).await;
        assert_eq!(json["weight"], "2.00");
    }

    #[tokio::test]
    async fn test_weight_out_of_range_or_too_precise() {
        let app = setup();

        for weight in [json!("0"), json!(25.01), json!("1.234"), json!("heavy")] {
            let (status, json) = send(
                &app,
                "POST",
                "/products",
                Some(json!({ "name": "Thing", "weight": weight })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{weight}");
            assert!(json["details"]["weight"].is_array(), "{json}");
        }
    }

    #[tokio::test]
    async fn test_product_update_and_delete() {
        let app = setup();
        let id = create_product(&app, "Widget", json!("1.00")).await;

        let (status, json) = send(
            &app,
            "PUT",
            &format!("/products/{id}"),
            Some(json!({ "name": "Widget XL", "weight": "2.00" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Widget XL");

        let (status, _) = send(&app, "DELETE", &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &format!("/products/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod orders {
    use super::*;

    #[tokio::test]
    async fn test_create_order() {
        let app = setup();
        let widget = create_product(&app, "Widget", json!("0.10")).await;
        let gadget = create_product(&app, "Gadget", json!("0.20")).await;
        let alice = create_customer(&app, "Alice").await;

        let (status, json) = send(
            &app,
            "POST",
            "/orders/",
            Some(order_body(Some(alice), &[(widget, 1), (gadget, 1)])),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED, "{json}");
        assert_eq!(json["order_number"], "ORD00001");
        assert_eq!(json["customer"], alice);
        assert_eq!(json["order_date"], "2024-05-01");
        assert_eq!(json["total_weight"], "0.30");
        let items = json["order_items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["product"], widget);
        assert!(items[0]["id"].is_i64());
    }

    #[tokio::test]
    async fn test_create_and_get_order() {
        let app = setup();
        let widget = create_product(&app, "Widget", json!("1.00")).await;

        let (_, created) = post_order(&app, order_body(None, &[(widget, 2)])).await;
        let id = created["id"].as_i64().unwrap();

        let (status, json) = send(&app, "GET", &format!("/orders/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, created);
    }

    #[tokio::test]
    async fn test_supplied_order_number() {
        let app = setup();
        let widget = create_product(&app, "Widget", json!("1.00")).await;

        let mut body = order_body(None, &[(widget, 1)]);
        body["order_number"] = json!("ORD00100");
        let (status, json) = post_order(&app, body.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["order_number"], "ORD00100");

        let (status, _) = post_order(&app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, json) = post_order(&app, order_body(None, &[(widget, 1)])).await;
        assert_eq!(json["order_number"], "ORD00101");
    }

    #[tokio::test]
    async fn test_weight_limit_rejected() {
        let app = setup();
        let anvil = create_product(&app, "Anvil", json!("25.00")).await;

        let (status, json) = post_order(&app, order_body(None, &[(anvil, 7)])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Order weight limit exceeded");
        assert!(json["details"].as_str().unwrap().contains("175.00"));

        let (_, json) = send(&app, "GET", "/orders/", None).await;
        assert_eq!(json, json!([]));
    }

    #[tokio::test]
    async fn test_unknown_references_are_bad_requests() {
        let app = setup();
        let widget = create_product(&app, "Widget", json!("1.00")).await;

        let (status, json) = post_order(&app, order_body(None, &[(999, 1)])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["details"].as_str().unwrap().contains("999"));

        let (status, _) = send(
            &app,
            "POST",
            "/orders/",
            Some(order_body(Some(77), &[(widget, 1)])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_items_and_bad_quantity() {
        let app = setup();
        let widget = create_product(&app, "Widget", json!("1.00")).await;

        let (status, json) = post_order(&app, order_body(None, &[])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["details"]["order_items"].is_array());

        let (status, json) = post_order(&app, order_body(None, &[(widget, 0)])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["details"]["order_items[0].quantity"].is_array());
    }

    #[tokio::test]
    async fn test_replace_order() {
        let app = setup();
        let widget = create_product(&app, "Widget", json!("1.00")).await;
        let gadget = create_product(&app, "Gadget", json!("2.00")).await;

        let (_, created) = post_order(&app, order_body(None, &[(widget, 1)])).await;
        let id = created["id"].as_i64().unwrap();

        let mut body = order_body(None, &[(gadget, 2), (widget, 1)]);
        body["address"] = json!("1 New Road");
        body["order_number"] = json!("ORD09999");
        let (status, json) = send(&app, "PUT", &format!("/orders/{id}"), Some(body)).await;

        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["order_number"], created["order_number"]);
        assert_eq!(json["address"], "1 New Road");
        assert_eq!(json["total_weight"], "5.00");
        assert_eq!(json["order_items"].as_array().unwrap().len(), 2);

        let (status, _) = send(
            &app,
            "PUT",
            "/orders/424242",
            Some(order_body(None, &[(widget, 1)])),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_order() {
        let app = setup();
        let anvil = create_product(&app, "Anvil", json!("25.00")).await;

        let (_, created) = post_order(&app, order_body(None, &[(anvil, 2)])).await;
        let id = created["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/orders/{id}"),
            Some(order_body(None, &[(anvil, 2), (anvil, 5)])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, json) = send(&app, "GET", &format!("/orders/{id}"), None).await;
        assert_eq!(json, created);
    }

    #[tokio::test]
    async fn test_delete_order() {
        let app = setup();
        let widget = create_product(&app, "Widget", json!("1.00")).await;
        let (_, created) = post_order(&app, order_body(None, &[(widget, 1)])).await;
        let id = created["id"].as_i64().unwrap();

        let (status, body) = send(&app, "DELETE", &format!("/orders/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&app, "GET", &format!("/orders/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let app = setup();
        let widget = create_product(&app, "Widget", json!("1.00")).await;
        let gadget = create_product(&app, "Gadget", json!("1.00")).await;
        let alice = create_customer(&app, "Alice").await;
        let bob = create_customer(&app, "Bob").await;

        post_order(&app, order_body(Some(alice), &[(widget, 1), (gadget, 1)])).await;
        post_order(&app, order_body(Some(bob), &[(gadget, 1)])).await;

        let numbers = |json: &Value| -> Vec<String> {
            json.as_array()
                .unwrap()
                .iter()
                .map(|o| o["order_number"].as_str().unwrap().to_string())
                .collect()
        };

        let (_, json) = send(&app, "GET", "/orders/?products=Widget,Gadget", None).await;
        assert_eq!(numbers(&json), vec!["ORD00001", "ORD00002"]);

        let (_, json) = send(&app, "GET", "/orders/?customer=Bob", None).await;
        assert_eq!(numbers(&json), vec!["ORD00002"]);

        let (_, json) = send(&app, "GET", "/orders?products=Widget&customer=Bob", None).await;
        assert_eq!(numbers(&json), Vec::<String>::new());

        let (_, json) = send(&app, "GET", "/orders/?customer=Alice%20Smith", None).await;
        assert_eq!(numbers(&json), Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_customer_delete_clears_order_reference() {
        let app = setup();
        let widget = create_product(&app, "Widget", json!("1.00")).await;
        let alice = create_customer(&app, "Alice").await;
        let (_, created) = post_order(&app, order_body(Some(alice), &[(widget, 1)])).await;

        send(&app, "DELETE", &format!("/customers/{alice}"), None).await;

        let (_, json) = send(&app, "GET", &format!("/orders/{}", created["id"]), None).await;
        assert_eq!(json["customer"], Value::Null);
    }

    #[tokio::test]
    async fn test_malformed_requests() {
        let app = setup();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/orders/")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, json) = send(&app, "GET", "/orders/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid path parameter");
    }
}

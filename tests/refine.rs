//! Refinement loop tests against a scripted transport and a mock HTTP server.
mod common;
use common::*;
use restflow::prelude::*;
use restflow::refine::Phase;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn find<'a>(dependencies: &'a [Dependency], from: &str, to: &str) -> &'a Dependency {
    dependencies
        .iter()
        .find(|d| d.from_operation == from && d.to_operation == to)
        .unwrap_or_else(|| panic!("no dependency {} -> {}", from, to))
}

#[tokio::test]
async fn test_cart_id_and_auth_verify_after_filled_iteration() {
    let analysis = Pipeline::from_document(shop_document()).unwrap();
    let transport = ScriptedTransport::new(shop_service);

    let outcome = analysis.refine(&transport, &config(3)).await;

    // Entity-id path dependency on cartId.
    let cart_id = find(&outcome.dependencies, "createCart", "addItem");
    assert_eq!(cart_id.reason, MatchReason::EntityId);
    assert_eq!(cart_id.verification, Some(Verification::Verified));

    // Login token reaches both secured operations as a bearer header.
    let auth = find(&outcome.dependencies, "login", "addItem");
    assert_eq!(auth.kind, DependencyKind::Auth);
    assert_eq!(auth.verification, Some(Verification::Verified));
    assert_eq!(outcome.verified_count(), 3);

    let filled_call = transport
        .requests()
        .into_iter()
        .find(|r| r.url.path() == "/carts/cart_1/items")
        .expect("addItem should be called with the pooled cart id");
    assert_eq!(filled_call.headers["Authorization"], "Bearer abc");
    assert_eq!(filled_call.headers["Content-Type"], "application/json");
    assert_eq!(filled_call.body, Some(json!({ "sku": "A1", "qty": 1 })));
}

#[tokio::test]
async fn test_iteration_trace() {
    let analysis = Pipeline::from_document(shop_document()).unwrap();
    let transport = ScriptedTransport::new(shop_service);

    let outcome = analysis.refine(&transport, &config(3)).await;
    let trace = &outcome.iterations;
    assert_eq!(trace.len(), 3);

    // Examples only: login succeeds, the secured operations are rejected.
    assert_eq!(trace[0].phase, Phase::Example);
    assert_eq!((trace[0].ok_operations, trace[0].total_operations), (1, 3));
    assert_eq!(trace[0].new_outputs, 1);
    assert!(trace[0].newly_verified.is_empty());

    assert_eq!(trace[1].phase, Phase::Filled);
    assert_eq!(trace[1].ok_operations, 3);
    assert_eq!(trace[1].new_outputs, 6);
    assert_eq!(trace[1].newly_verified.len(), 3);
    assert!(trace[1].newly_verified.iter().all(|d| d.is_verified()));

    assert_eq!(trace[2].ok_operations, 3);
    assert!(trace[2].newly_verified.is_empty());

    let results: Vec<(&str, u16, bool)> = outcome
        .operation_results
        .iter()
        .map(|r| (r.id.as_str(), r.status, r.ok))
        .collect();
    assert_eq!(
        results,
        vec![("login", 200, true), ("createCart", 201, true), ("addItem", 201, true)]
    );

    // Three iterations of three sequential calls, in document order.
    let paths: Vec<String> = transport.requests().iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(paths.len(), 9);
    assert_eq!(&paths[..3], &["/auth/login", "/carts", "/carts/cart_0/items"]);
}

#[tokio::test]
async fn test_terminates_when_every_call_fails() {
    let analysis = Pipeline::from_document(shop_document()).unwrap();
    let transport = ScriptedTransport::unreachable();

    let outcome = analysis.refine(&transport, &config(5)).await;

    // Example iteration plus one stalled filled iteration.
    assert_eq!(outcome.iterations.len(), 2);
    assert_eq!(outcome.iterations[1].phase, Phase::Filled);
    assert_eq!(outcome.verified_count(), 0);
    assert!(outcome
        .dependencies
        .iter()
        .all(|d| d.verification == Some(Verification::Unverified)));
    assert!(outcome.operation_results.iter().all(|r| r.status == 0 && !r.ok));
}

#[tokio::test]
async fn test_iteration_cap_of_one_runs_examples_only() {
    let analysis = Pipeline::from_document(shop_document()).unwrap();
    let transport = ScriptedTransport::new(shop_service);

    let outcome = analysis.refine(&transport, &config(1)).await;
    assert_eq!(outcome.iterations.len(), 1);
    assert_eq!(outcome.iterations[0].phase, Phase::Example);
    assert_eq!(outcome.verified_count(), 0);
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn test_get_requests_never_carry_a_body() {
    let doc = ApiDocument::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/search": {
                "get": {
                    "operationId": "search",
                    "parameters": [{ "name": "q", "in": "query", "schema": { "type": "string" }, "example": "shoes" }],
                    "requestBody": { "content": { "application/json": { "schema": { "type": "object" }, "example": { "ignored": true } } } },
                    "responses": { "200": { "description": "ok" } }
                }
            }
        }
    }))
    .unwrap();
    let analysis = Pipeline::from_document(doc).unwrap();
    let transport = ScriptedTransport::new(|_| Ok(HttpResponse::new(200, None)));

    analysis.refine(&transport, &config(1)).await;
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.is_none());
    assert_eq!(requests[0].url.query(), Some("q=shoes"));
}

/// `createCart` mints a fresh cart per call, `defaultCart` always answers with an old one.
fn cart_rotation_document() -> ApiDocument {
    let cart = json!({ "application/json": { "schema": { "$ref": "#/components/schemas/Cart" } } });
    ApiDocument::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/carts": {
                "post": { "operationId": "createCart", "responses": { "201": { "content": cart.clone() } } }
            },
            "/carts/{cartId}/items": {
                "post": {
                    "operationId": "addItem",
                    "parameters": [{ "name": "cartId", "in": "path", "schema": { "type": "string" }, "example": "cart_0" }],
                    "responses": { "201": { "description": "Added" } }
                }
            },
            "/carts/default": {
                "get": { "operationId": "defaultCart", "responses": { "200": { "content": cart } } }
            }
        },
        "components": {
            "schemas": { "Cart": { "type": "object", "properties": { "id": { "type": "string" } } } }
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_fill_uses_value_produced_earlier_in_same_iteration() {
    let analysis = Pipeline::from_document(cart_rotation_document()).unwrap();
    let minted = AtomicUsize::new(0);
    let transport = ScriptedTransport::new(move |request| {
        let response = match (request.method, request.url.path()) {
            (HttpMethod::Post, "/carts") => {
                let n = minted.fetch_add(1, Ordering::SeqCst) + 1;
                HttpResponse::new(201, Some(json!({ "id": format!("cart_{}", n) })))
            }
            (HttpMethod::Get, "/carts/default") => HttpResponse::new(200, Some(json!({ "id": "cart_old" }))),
            (HttpMethod::Post, _) => HttpResponse::new(201, None),
            _ => HttpResponse::new(404, None),
        };
        Ok(response)
    });

    analysis.refine(&transport, &config(2)).await;

    let paths: Vec<String> = transport.requests().iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(
        paths,
        vec![
            "/carts",
            "/carts/cart_0/items",
            "/carts/default",
            "/carts",
            "/carts/cart_2/items",
            "/carts/default",
        ]
    );
}

/// `openSession` returns values that `shipOrder` takes in its body, path, header,
/// cookie and query.
fn dispatch_document() -> ApiDocument {
    let string = json!({ "type": "string" });
    ApiDocument::from_value(json!({
        "openapi": "3.0.0",
        "paths": {
            "/sessions": {
                "post": {
                    "operationId": "openSession",
                    "requestBody": { "content": { "application/json": {
                        "schema": { "type": "object", "properties": { "user": string.clone() } },
                        "example": { "user": "ann" }
                    } } },
                    "responses": { "201": { "content": { "application/json": { "schema": {
                        "type": "object",
                        "properties": {
                            "id": string.clone(),
                            "xSession": string.clone(),
                            "locale": string.clone(),
                            "region": string.clone(),
                            "ownerOfLabel": string.clone()
                        }
                    } } } } }
                }
            },
            "/orders/{orderId}/ship": {
                "post": {
                    "operationId": "shipOrder",
                    "parameters": [
                        { "name": "orderId", "in": "path", "schema": string.clone(), "example": "ord_0" },
                        { "name": "X-Session", "in": "header", "schema": string.clone(), "example": "none" },
                        { "name": "locale", "in": "cookie", "schema": string.clone(), "example": "en" },
                        { "name": "owner_label", "in": "query", "schema": string.clone(), "example": "ann" }
                    ],
                    "requestBody": { "content": { "application/json": {
                        "schema": { "type": "object", "properties": { "region": string } },
                        "example": { "region": "unknown" }
                    } } },
                    "responses": { "200": { "description": "Shipped" } }
                }
            }
        }
    }))
    .unwrap()
}

fn dispatch_service(request: &HttpRequest) -> CallResult {
    let response = match request.url.path() {
        "/sessions" => HttpResponse::new(
            201,
            Some(json!({
                "id": "ord_9",
                "xSession": "s-42",
                "locale": "nb",
                "region": "eu-north",
                "ownerOfLabel": "ann"
            })),
        ),
        "/orders/ord_9/ship" if request.headers.get("X-Session").map(String::as_str) == Some("s-42") => {
            HttpResponse::new(200, None)
        }
        _ => HttpResponse::new(404, None),
    };
    Ok(response)
}

fn edge<'a>(dependencies: &'a [Dependency], field: &str) -> &'a Dependency {
    dependencies
        .iter()
        .find(|d| d.field == field)
        .unwrap_or_else(|| panic!("no dependency on {}", field))
}

#[tokio::test]
async fn test_name_based_edges_verify_in_every_location() {
    let analysis = Pipeline::from_document(dispatch_document()).unwrap();
    let kinds: Vec<(&str, DependencyKind, MatchReason)> = analysis
        .dependencies()
        .iter()
        .map(|d| (d.field.as_str(), d.kind, d.reason))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("region", DependencyKind::Body, MatchReason::ExactName),
            ("X-Session", DependencyKind::Header, MatchReason::ExactName),
            ("locale", DependencyKind::Cookie, MatchReason::ExactName),
            ("owner_label", DependencyKind::Query, MatchReason::TokenMatch),
        ]
    );

    let transport = ScriptedTransport::new(dispatch_service);
    let outcome = analysis.refine(&transport, &config(2)).await;

    assert_eq!(outcome.verified_count(), 4);
    assert_eq!(edge(&outcome.dependencies, "owner_label").source_field, "ownerOfLabel");
    assert!(edge(&outcome.dependencies, "X-Session").is_verified());
    assert!(edge(&outcome.dependencies, "locale").is_verified());
    assert_eq!(outcome.iterations[1].newly_verified.len(), 4);

    let shipped = transport
        .requests()
        .into_iter()
        .find(|r| r.url.path() == "/orders/ord_9/ship")
        .expect("orderId should fall back to the pooled id");
    assert_eq!(shipped.headers["X-Session"], "s-42");
    assert_eq!(shipped.cookies["locale"], "nb");
    assert_eq!(shipped.url.query(), Some("owner_label=ann"));
    assert_eq!(shipped.body, Some(json!({ "region": "eu-north" })));
}

#[tokio::test]
async fn test_name_based_edges_stay_unverified_when_values_differ() {
    let analysis = Pipeline::from_document(dispatch_document()).unwrap();
    // Same service, but the label owner it reports never matches the consumer's example.
    let transport = ScriptedTransport::new(|request| {
        let mut response = dispatch_service(request)?;
        if let Some(Value::Object(body)) = response.body.as_mut() {
            body.insert("ownerOfLabel".into(), json!("bob"));
        }
        Ok(response)
    });

    let outcome = analysis.refine(&transport, &config(2)).await;
    assert!(!edge(&outcome.dependencies, "owner_label").is_verified());
    assert_eq!(outcome.verified_count(), 3);
}

#[tokio::test]
async fn test_reqwest_transport_parses_json_only_when_declared() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "x1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new();
    let base = url::Url::parse(&server.uri()).unwrap();

    let json = transport
        .execute(HttpRequest::new(HttpMethod::Get, base.join("/json").unwrap()))
        .await
        .unwrap();
    assert_eq!(json.status, 200);
    assert_eq!(json.body, Some(json!({ "id": "x1" })));

    let text = transport
        .execute(HttpRequest::new(HttpMethod::Get, base.join("/text").unwrap()))
        .await
        .unwrap();
    assert_eq!(text.status, 200);
    assert!(text.body.is_none());
}

#[tokio::test]
async fn test_reqwest_transport_sends_headers_cookies_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/carts"))
        .and(header("authorization", "Bearer abc"))
        .and(header("cookie", "locale=en; session=s1"))
        .and(body_json(json!({ "qty": 2 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "cart_9" })))
        .mount(&server)
        .await;

    let base = url::Url::parse(&server.uri()).unwrap();
    let mut request = HttpRequest::new(HttpMethod::Post, base.join("/carts").unwrap());
    request.headers.insert("Authorization".into(), "Bearer abc".into());
    request.headers.insert("Content-Type".into(), "application/json".into());
    request.cookies.insert("session".into(), "s1".into());
    request.cookies.insert("locale".into(), "en".into());
    request.body = Some(json!({ "qty": 2 }));

    let response = ReqwestTransport::new().execute(request).await.unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.body, Some(json!({ "id": "cart_9" })));
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    let request = HttpRequest::new(
        HttpMethod::Get,
        url::Url::parse("http://127.0.0.1:1/nothing").unwrap(),
    );
    let err = ReqwestTransport::new().execute(request).await.unwrap_err();
    assert!(matches!(err, TransportError::Network { .. }));
}

#[tokio::test]
async fn test_refinement_against_live_mock_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "abc" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/carts"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "cart_1", "items": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/carts/cart_1/items"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": "cart_1", "items": [{ "sku": "A1", "qty": 1 }] })),
        )
        .mount(&server)
        .await;

    let analysis = Pipeline::from_document(shop_document()).unwrap();
    let config = RefineConfig::builder(server.uri())
        .with_max_iterations(2)
        .build()
        .unwrap();

    let outcome = analysis.refine(&ReqwestTransport::new(), &config).await;
    assert_eq!(outcome.verified_count(), 3);
    assert_eq!(outcome.iterations.len(), 2);
}

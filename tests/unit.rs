//! Unit tests for the refinement building blocks.
mod common;
use common::*;
use restflow::document::RequestInput;
use restflow::matcher::names::{entity_candidates, tokenize_name};
use restflow::refine::evidence::build_response_map;
use restflow::refine::fill::resolve_from_pool;
use restflow::refine::{Evidence, EvidenceStore, OutputPool, Phase, RequestEvidence, fill_inputs};
use restflow::prelude::*;
use serde_json::{Value, json};

fn record_success(store: &mut EvidenceStore, op: &OperationShape, body: Value, phase: Phase) {
    store.record(
        &op.id,
        Evidence {
            request: RequestEvidence::default(),
            response: build_response_map(op, Some(&body)),
            status: 200,
            ok: true,
            phase,
        },
    );
}

fn cart_provider() -> OperationShape {
    shape(
        "createCart",
        vec![
            FieldDescriptor::new("id", "string").with_entity(Some("Cart".into())),
            FieldDescriptor::new("owner.name", "string").with_entity(Some("Cart".into())),
        ],
    )
}

#[test]
fn test_name_helpers() {
    assert_eq!(tokenize_name("cartItemIds"), vec!["cart", "item", "id"]);
    assert_eq!(entity_candidates("cartItemIds"), vec!["cartitem", "item"]);
}

#[test]
fn test_response_map_reads_dotted_fields() {
    let op = cart_provider();
    let map = build_response_map(&op, Some(&json!({ "id": "cart_1", "owner": { "name": "ann" }, "extra": 1 })));
    assert_eq!(map.len(), 2);
    assert_eq!(map["owner.name"], json!("ann"));
    assert!(build_response_map(&op, None).is_empty());
}

#[test]
fn test_pool_prefers_filled_snapshot() {
    let op = cart_provider();
    let mut store = EvidenceStore::new();
    record_success(&mut store, &op, json!({ "id": "cart_example" }), Phase::Example);
    record_success(&mut store, &op, json!({ "id": "cart_filled" }), Phase::Filled);

    let pool = OutputPool::rebuild(&store, std::slice::from_ref(&op));
    assert_eq!(pool.values("id"), &[json!("cart_filled")]);
}

#[test]
fn test_resolution_order() {
    let cart = cart_provider();
    let user = shape(
        "createUser",
        vec![
            FieldDescriptor::new("id", "string").with_entity(Some("User".into())),
            FieldDescriptor::new("session_token", "string"),
        ],
    );
    let mut store = EvidenceStore::new();
    record_success(&mut store, &cart, json!({ "id": "cart_1" }), Phase::Example);
    record_success(&mut store, &user, json!({ "id": "user_1", "session_token": "t0k" }), Phase::Example);
    let pool = OutputPool::rebuild(&store, &[cart, user]);

    // (a) entity id
    assert_eq!(resolve_from_pool(&pool, "cartId"), Some(&json!("cart_1")));
    assert_eq!(resolve_from_pool(&pool, "user_id"), Some(&json!("user_1")));
    // (b) normalized name
    assert_eq!(resolve_from_pool(&pool, "SessionToken"), Some(&json!("t0k")));
    // (c) id fallback: the most recent pooled id
    assert_eq!(resolve_from_pool(&pool, "orderId"), Some(&json!("user_1")));
    assert_eq!(resolve_from_pool(&pool, "quantity"), None);
}

#[test]
fn test_fill_inputs_overrides_examples() {
    let cart = cart_provider();
    let mut store = EvidenceStore::new();
    record_success(
        &mut store,
        &cart,
        json!({ "id": "cart_1", "owner": { "name": "ann" } }),
        Phase::Example,
    );
    let login = shape("login", vec![FieldDescriptor::new("token", "string")]);
    record_success(&mut store, &login, json!({ "token": "abc" }), Phase::Example);
    let pool = OutputPool::rebuild(&store, &[cart, login]);

    let mut consumer = shape("checkout", Vec::new());
    consumer.request_fields = vec![
        FieldDescriptor::new("cartId", "string"),
        FieldDescriptor::new("owner.name", "string"),
    ];
    consumer.other_params = vec![ParamDescriptor {
        field: FieldDescriptor::new("cart_id", "string"),
        location: ParamLocation::Query,
    }];
    consumer.requires_auth = true;

    let mut example = RequestInput {
        body: Some(json!({ "note": "leave at door", "cartId": "cart_0" })),
        ..Default::default()
    };
    example.params.query.insert("page".into(), "1".into());

    let filled = fill_inputs(&consumer, &pool, &example, &config(2));
    assert_eq!(
        filled.body,
        Some(json!({ "note": "leave at door", "cartId": "cart_1", "owner": { "name": "ann" } }))
    );
    assert_eq!(filled.params.query["cart_id"], "cart_1");
    assert_eq!(filled.params.query["page"], "1");
    assert_eq!(filled.params.header["Authorization"], "Bearer abc");
}

#[test]
fn test_fill_leaves_unmatched_inputs_alone() {
    let pool = OutputPool::new();
    let mut consumer = shape("search", Vec::new());
    consumer.requires_auth = true;
    consumer.other_params = vec![ParamDescriptor {
        field: FieldDescriptor::new("q", "string"),
        location: ParamLocation::Query,
    }];

    let mut example = RequestInput::default();
    example.params.query.insert("q".into(), "shoes".into());

    let filled = fill_inputs(&consumer, &pool, &example, &config(2));
    assert_eq!(filled, example);
}

#[test]
fn test_config_validation() {
    assert!(matches!(
        RefineConfig::builder("http://localhost:3000").with_max_iterations(0).build(),
        Err(RefineError::InvalidIterationCap(0))
    ));
    let config = RefineConfig::builder("http://localhost:3000")
        .with_bearer_header("X-Auth")
        .with_bearer_prefix("Token ")
        .build()
        .unwrap();
    assert_eq!(config.bearer_value("abc"), "Token abc");
}

//! Common test utilities: fixture documents and an in-memory transport.
use async_trait::async_trait;
use restflow::prelude::*;
use serde_json::{Value, json};
use std::sync::Mutex;

/// A small shop API: login issues a token, carts are created and items added to them.
///
/// Operation order: `login`, `createCart`, `addItem`.
#[allow(dead_code)]
pub fn shop_document_json() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": { "title": "Shop", "version": "1.0.0" },
        "paths": {
            "/auth/login": {
                "post": {
                    "operationId": "login",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/Credentials" },
                                "example": { "username": "alice", "password": "secret" }
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": "Logged in",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "token": { "type": "string" } }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "/carts": {
                "post": {
                    "operationId": "createCart",
                    "security": [{ "bearerAuth": [] }],
                    "responses": {
                        "201": {
                            "description": "Created",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Cart" }
                                }
                            }
                        }
                    }
                }
            },
            "/carts/{cartId}/items": {
                "post": {
                    "operationId": "addItem",
                    "security": [{ "bearerAuth": [] }],
                    "parameters": [
                        {
                            "name": "cartId",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" },
                            "example": "cart_0"
                        }
                    ],
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CartItem" },
                                "example": { "sku": "A1", "qty": 1 }
                            }
                        }
                    },
                    "responses": {
                        "201": {
                            "description": "Item added",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Cart" }
                                }
                            }
                        },
                        "404": { "description": "No such cart" }
                    }
                }
            }
        },
        "components": {
            "securitySchemes": {
                "bearerAuth": { "type": "http", "scheme": "bearer" }
            },
            "schemas": {
                "Credentials": {
                    "type": "object",
                    "properties": {
                        "username": { "type": "string" },
                        "password": { "type": "string" }
                    }
                },
                "Cart": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "items": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/CartItem" }
                        }
                    }
                },
                "CartItem": {
                    "type": "object",
                    "properties": {
                        "sku": { "type": "string" },
                        "qty": { "type": "integer" }
                    }
                }
            }
        }
    })
}

#[allow(dead_code)]
pub fn shop_document() -> ApiDocument {
    ApiDocument::from_value(shop_document_json()).expect("Fixture document should decode")
}

/// Wraps a schema map into a minimal document.
#[allow(dead_code)]
pub fn document_with_schemas(schemas: Value) -> ApiDocument {
    ApiDocument::from_value(json!({
        "openapi": "3.0.0",
        "paths": {},
        "components": { "schemas": schemas }
    }))
    .expect("Schema document should decode")
}

/// Builds a bare operation shape for matcher tests.
#[allow(dead_code)]
pub fn shape(id: &str, response_fields: Vec<FieldDescriptor>) -> OperationShape {
    OperationShape {
        id: id.to_string(),
        method: HttpMethod::Post,
        path: format!("/{}", id),
        request_fields: Vec::new(),
        response_fields,
        path_params: Vec::new(),
        other_params: Vec::new(),
        requires_auth: false,
    }
}

#[allow(dead_code)]
pub fn config(max_iterations: usize) -> RefineConfig {
    RefineConfig::builder("http://shop.test")
        .with_max_iterations(max_iterations)
        .build()
        .expect("Fixture config should be valid")
}

/// Two-parameter result; the prelude's `Result` takes only the value type.
#[allow(dead_code)]
pub type CallResult = std::result::Result<HttpResponse, TransportError>;

type Handler = dyn Fn(&HttpRequest) -> CallResult + Send + Sync;

/// An `HttpTransport` answering from a closure and remembering every request.
#[allow(dead_code)]
pub struct ScriptedTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&HttpRequest) -> CallResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails at the network level.
    pub fn unreachable() -> Self {
        Self::new(|request| {
            Err(TransportError::Network {
                url: request.url.to_string(),
                message: "connection refused".to_string(),
            })
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> CallResult {
        let response = (self.handler)(&request);
        self.requests.lock().expect("request log poisoned").push(request);
        response
    }
}

/// Behaviour of the shop service: login is open, everything else needs `Bearer abc`,
/// and items can only be added to `cart_1`.
#[allow(dead_code)]
pub fn shop_service(request: &HttpRequest) -> CallResult {
    let authorized = request.headers.get("Authorization").map(String::as_str) == Some("Bearer abc");

    let response = match (request.method, request.url.path()) {
        (HttpMethod::Post, "/auth/login") => HttpResponse::new(200, Some(json!({ "token": "abc" }))),
        _ if !authorized => HttpResponse::new(401, Some(json!({ "error": "unauthorized" }))),
        (HttpMethod::Post, "/carts") => {
            HttpResponse::new(201, Some(json!({ "id": "cart_1", "items": [] })))
        }
        (HttpMethod::Post, "/carts/cart_1/items") => HttpResponse::new(
            201,
            Some(json!({ "id": "cart_1", "items": [{ "sku": "A1", "qty": 1 }] })),
        ),
        _ => HttpResponse::new(404, None),
    };
    Ok(response)
}

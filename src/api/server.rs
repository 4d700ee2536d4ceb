//! API Server Module
//!
//! This module implements a JSON-RPC server in front of the dispatcher.
//! Each request becomes one transaction; the response is sent once the
//! batch containing it has completed.

use crate::{
    ActionKind, TransactionOptions,
    config::ApiConfig,
    dispatcher::DispatcherHandle,
    error::{DispatchError, SubmitError},
};
use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info, warn};

const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const ITEM_FAILED: i32 = -32000;
const SHUTTING_DOWN: i32 = -32001;

/// Shared application state that is accessible across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Handle every request is submitted through
    dispatcher: DispatcherHandle,
}

/// The main API server struct
pub struct Server {
    /// Listen address
    config: ApiConfig,
    /// State shared with the handlers
    state: AppState,
}

impl Server {
    /// Creates a new API server instance
    ///
    /// # Arguments
    /// * `config` - Listen address
    /// * `dispatcher` - Handle requests are submitted through
    pub fn new(config: ApiConfig, dispatcher: DispatcherHandle) -> Self {
        Self {
            config,
            state: AppState { dispatcher },
        }
    }

    /// Build the router; exposed separately so it can be served by the caller
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", post(handle_rpc))
            .with_state(self.state.clone())
    }

    /// Serve requests until `shutdown` resolves
    ///
    /// # Returns
    /// `Ok(())` after a graceful stop, or an error if binding fails
    pub async fn start<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();

        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

/// JSON-RPC 2.0 request structure
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    id: Value,
}

/// JSON-RPC 2.0 response structure
///
/// Either `result` or `error` will be populated, but not both.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Parameters shared by every `bulk.*` method
#[derive(Debug, Deserialize)]
struct BulkParams {
    index: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    body: Option<Value>,
    #[serde(flatten)]
    options: TransactionOptions,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Json<Self> {
        Json(Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        })
    }

    fn error(id: Value, code: i32, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
            id,
        })
    }
}

fn action_for(method: &str) -> Option<ActionKind> {
    match method {
        "bulk.index" => Some(ActionKind::Index),
        "bulk.create" => Some(ActionKind::Create),
        "bulk.update" => Some(ActionKind::Update),
        "bulk.delete" => Some(ActionKind::Delete),
        "bulk.read" => Some(ActionKind::Read),
        "bulk.search" => Some(ActionKind::Search),
        _ => None,
    }
}

/// Main RPC request handler
///
/// Routes `bulk.*` methods into the dispatcher and maps the per-item
/// outcome back onto a JSON-RPC result or error.
async fn handle_rpc(
    State(state): State<AppState>,
    Json(request): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    debug!("Received RPC request: {}", request.method);

    // 1. Resolve the method to an action
    let Some(kind) = action_for(&request.method) else {
        return JsonRpcResponse::error(request.id, METHOD_NOT_FOUND, "Method not found");
    };

    // 2. Decode params and re-encode the document body
    let params: BulkParams = match serde_json::from_value(request.params) {
        Ok(params) => params,
        Err(e) => {
            return JsonRpcResponse::error(
                request.id,
                INVALID_PARAMS,
                format!("Invalid params: {}", e),
            );
        }
    };

    let body = match &params.body {
        Some(value) => match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                return JsonRpcResponse::error(
                    request.id,
                    INVALID_PARAMS,
                    format!("Invalid body: {}", e),
                );
            }
        },
        None => Vec::new(),
    };

    // 3. Submit and wait for the batch containing it
    let outcome = state
        .dispatcher
        .submit(kind, params.index, params.id, body, params.options)
        .await;

    // 4. Map the per-item outcome onto JSON-RPC
    match outcome {
        Ok(response) => match serde_json::to_value(response) {
            Ok(value) => JsonRpcResponse::result(request.id, value),
            Err(e) => JsonRpcResponse::error(request.id, ITEM_FAILED, e.to_string()),
        },
        Err(SubmitError::Dispatch(DispatchError::ShuttingDown)) => {
            JsonRpcResponse::error(request.id, SHUTTING_DOWN, "Server is shutting down")
        }
        Err(e) => {
            warn!("{} failed: {}", kind.as_str(), e);
            JsonRpcResponse::error(request.id, ITEM_FAILED, e.to_string())
        }
    }
}

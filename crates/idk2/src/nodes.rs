//! Node Registration
//!
//! Registers the idk2 nodes with a [`NodeRegistry`]: their definitions for the
//! host menu and the executors that run them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use blueprint_runtime::{NodeContext, NodeExecutor, NodeOutput, NodeRegistry};
use blueprint_types::{
    LatentState, LinearColor, LogVerbosity, NodeDef, PinDef, PinType, WakeCondition,
};
use serde_json::{Value, json};

use crate::http::{
    AsyncRequestProxy, HttpRequest, HttpTransport, PendingRequests, ProxyFailure, ProxyOptions,
};
use crate::overlay::NO_KEY_NAME;
use crate::print::{PrintParams, PrintSinks, print_with_raw_verbosity, print_with_verbosity};

pub const PRINT_NODE_ID: &str = "idk2/PrintWithVerbosity";
pub const HTTP_REQUEST_NODE_ID: &str = "idk2/HttpRequest";

const ON_COMPLETE_PIN: &str = "OnComplete";
const ON_FAILED_PIN: &str = "OnFailed";

/// Errors reading node inputs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("Invalid value on pin {pin}: {reason}")]
    InvalidPin { pin: &'static str, reason: String },
}

/// Collaborators the node executors need
#[derive(Clone)]
pub struct NodeServices {
    pub print: PrintSinks,
    pub transport: Arc<dyn HttpTransport>,
    pub proxy_options: ProxyOptions,
    pub pending: PendingRequests,
}

/// Register every idk2 node
pub fn register_idk2_nodes(registry: &mut NodeRegistry, services: &NodeServices) {
    registry.register(
        print_node_def(),
        Arc::new(PrintNode {
            sinks: services.print.clone(),
        }),
    );
    registry.register(
        http_request_node_def(),
        Arc::new(HttpRequestNode {
            transport: Arc::clone(&services.transport),
            options: services.proxy_options,
            pending: services.pending.clone(),
        }),
    );

    tracing::info!(total = registry.len(), "Registered idk2 nodes");
}

// ─────────────────────────────────────────────────────────────────────────────
// Print With Verbosity
// ─────────────────────────────────────────────────────────────────────────────

pub fn print_node_def() -> NodeDef {
    let defaults = PrintParams::default();
    NodeDef {
        id: PRINT_NODE_ID.to_string(),
        name: "Print With Verbosity".to_string(),
        category: "Development".to_string(),
        pure: false,
        latent: false,
        development_only: true,
        pins: vec![
            PinDef::exec_in(),
            PinDef::exec_out("then"),
            PinDef::data_in_with_default("InString", PinType::String, json!(defaults.message)),
            PinDef::data_in_with_default(
                "InVerbosity",
                PinType::enumeration("LogVerbosity"),
                json!(defaults.verbosity.name()),
            )
            .advanced(),
            PinDef::data_in_with_default("bPrintToScreen", PinType::Boolean, json!(true))
                .advanced(),
            PinDef::data_in_with_default("bPrintToLog", PinType::Boolean, json!(true)).advanced(),
            PinDef::data_in_with_default(
                "TextColor",
                PinType::structure("LinearColor"),
                json!(defaults.text_color),
            )
            .advanced(),
            PinDef::data_in_with_default("Duration", PinType::Real, json!(defaults.duration))
                .advanced(),
            PinDef::data_in_with_default("Key", PinType::Name, json!(NO_KEY_NAME)).advanced(),
        ],
        description: Some(
            "Print a string to the log at a chosen verbosity and to the screen".to_string(),
        ),
    }
}

/// Verbosity as carried on the pin: a name, or the raw enum byte
enum VerbosityPin {
    Level(LogVerbosity),
    Raw(u8),
}

fn verbosity_from_pin(value: Option<&Value>) -> Result<VerbosityPin, NodeError> {
    let invalid = |reason: String| NodeError::InvalidPin {
        pin: "InVerbosity",
        reason,
    };
    match value {
        None => Ok(VerbosityPin::Level(LogVerbosity::default())),
        Some(Value::String(name)) => name
            .parse()
            .map(VerbosityPin::Level)
            .map_err(|e| invalid(format!("{e}"))),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|raw| u8::try_from(raw).ok())
            .map(VerbosityPin::Raw)
            .ok_or_else(|| invalid(format!("{n} is not a byte"))),
        Some(other) => Err(invalid(format!("unexpected value {other}"))),
    }
}

fn print_params_from_pins(ctx: &NodeContext) -> Result<PrintParams, NodeError> {
    let defaults = PrintParams::default();

    let text_color = match ctx.get_input("TextColor") {
        None => defaults.text_color,
        Some(_) => ctx
            .get_input_as::<LinearColor>("TextColor")
            .ok_or_else(|| NodeError::InvalidPin {
                pin: "TextColor",
                reason: "expected {r, g, b, a}".to_string(),
            })?,
    };

    Ok(PrintParams {
        message: ctx
            .get_input_string("InString")
            .map(str::to_string)
            .unwrap_or(defaults.message),
        verbosity: defaults.verbosity,
        print_to_screen: ctx
            .get_input_bool("bPrintToScreen")
            .unwrap_or(defaults.print_to_screen),
        print_to_log: ctx
            .get_input_bool("bPrintToLog")
            .unwrap_or(defaults.print_to_log),
        text_color,
        duration: ctx
            .get_input_real("Duration")
            .map(|d| d as f32)
            .unwrap_or(defaults.duration),
        key: ctx.get_input_string("Key").map(str::to_string),
    })
}

struct PrintNode {
    sinks: PrintSinks,
}

#[async_trait]
impl NodeExecutor for PrintNode {
    async fn execute(&self, ctx: &mut NodeContext) -> NodeOutput {
        let result = verbosity_from_pin(ctx.get_input("InVerbosity"))
            .and_then(|verbosity| Ok((verbosity, print_params_from_pins(ctx)?)));

        match result {
            Ok((VerbosityPin::Level(verbosity), params)) => {
                print_with_verbosity(&self.sinks, &PrintParams { verbosity, ..params });
                NodeOutput::continue_default(HashMap::new())
            }
            Ok((VerbosityPin::Raw(raw), params)) => {
                print_with_raw_verbosity(&self.sinks, raw, params);
                NodeOutput::continue_default(HashMap::new())
            }
            Err(e) => {
                tracing::warn!(node_id = %ctx.node_id, error = %e, "Print node input rejected");
                NodeOutput::error(e.to_string())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Request
// ─────────────────────────────────────────────────────────────────────────────

pub fn http_request_node_def() -> NodeDef {
    NodeDef {
        id: HTTP_REQUEST_NODE_ID.to_string(),
        name: "HTTP Request".to_string(),
        category: "Networking".to_string(),
        pure: false,
        latent: true,
        development_only: false,
        pins: vec![
            PinDef::exec_in(),
            PinDef::exec_out("then"),
            PinDef::data_in("URL", PinType::String).describe("Address to GET"),
            PinDef::exec_out(ON_COMPLETE_PIN)
                .describe("Fires once the response arrives with a status below 400"),
            PinDef::exec_out(ON_FAILED_PIN)
                .describe("Fires on connection failure, error status or timeout"),
            PinDef::data_out("request_id", PinType::String),
        ],
        description: Some("Send an HTTP GET and continue when it completes".to_string()),
    }
}

struct HttpRequestNode {
    transport: Arc<dyn HttpTransport>,
    options: ProxyOptions,
    pending: PendingRequests,
}

#[async_trait]
impl NodeExecutor for HttpRequestNode {
    async fn execute(&self, ctx: &mut NodeContext) -> NodeOutput {
        let url = match ctx.get_input_string("URL") {
            Some(url) if !url.trim().is_empty() => url.to_string(),
            _ => {
                let e = NodeError::InvalidPin {
                    pin: "URL",
                    reason: "a URL is required".to_string(),
                };
                return NodeOutput::error(e.to_string());
            }
        };

        let handle = AsyncRequestProxy::create(
            HttpRequest::get(url),
            Arc::clone(&self.transport),
            self.options,
        );
        let request_id = handle.id().to_string();
        self.pending.track(handle);

        let mut values = HashMap::new();
        values.insert("request_id".to_string(), Value::from(request_id.clone()));

        NodeOutput::latent_then(
            "then",
            LatentState {
                node_id: ctx.node_id.clone(),
                // success pin; resume_http_request picks OnFailed on failure
                resume_pin: ON_COMPLETE_PIN.to_string(),
                wake_condition: WakeCondition::RequestCompleted { request_id },
            },
            values,
        )
    }
}

/// Settle the wake condition of an HTTP Request node.
///
/// Takes the request out of `pending`, waits for it if it is still in flight
/// and returns the exec pin the node resumes on: `OnComplete` on success,
/// `OnFailed` for any failure. Returns `None` for an unknown id or a cancelled
/// request, which resumes nothing.
pub async fn resume_http_request(
    pending: &PendingRequests,
    request_id: &str,
) -> Option<&'static str> {
    let Some(handle) = pending.take_by_request_id(request_id) else {
        tracing::debug!(%request_id, "No tracked request to resume");
        return None;
    };

    match handle.completed().await {
        Ok(()) => Some(ON_COMPLETE_PIN),
        Err(ProxyFailure::Cancelled { .. }) => None,
        Err(_) => Some(ON_FAILED_PIN),
    }
}

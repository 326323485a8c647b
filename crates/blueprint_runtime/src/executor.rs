// Executor - Node execution context and output types
//
// Provides the context passed to node executors and the output structure.

use std::collections::HashMap;

use serde_json::Value;

use blueprint_types::{LatentState, NodeDef, NodeResult};

// ─────────────────────────────────────────────────────────────────────────────
// Execution Context
// ─────────────────────────────────────────────────────────────────────────────

/// Context passed to node executors
pub struct NodeContext {
    /// Node instance ID
    pub node_id: String,
    /// Input values (pin_name -> value)
    pub inputs: HashMap<String, Value>,
}

impl NodeContext {
    /// Create a new node context
    pub fn new(node_id: impl Into<String>, inputs: HashMap<String, Value>) -> Self {
        Self {
            node_id: node_id.into(),
            inputs,
        }
    }

    /// Create a context whose unconnected inputs fall back to the pin defaults
    /// declared on `def`
    pub fn with_defaults(
        node_id: impl Into<String>,
        def: &NodeDef,
        mut inputs: HashMap<String, Value>,
    ) -> Self {
        for pin in def.data_inputs() {
            if let Some(default) = &pin.default {
                inputs
                    .entry(pin.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        Self::new(node_id, inputs)
    }

    /// Get an input value by pin name
    pub fn get_input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    /// Get input as f64
    pub fn get_input_real(&self, name: &str) -> Option<f64> {
        self.inputs.get(name).and_then(|v| v.as_f64())
    }

    /// Get input as bool
    pub fn get_input_bool(&self, name: &str) -> Option<bool> {
        self.inputs.get(name).and_then(|v| v.as_bool())
    }

    /// Get input as string
    pub fn get_input_string(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).and_then(|v| v.as_str())
    }

    /// Deserialize an input into a typed value (struct pins)
    pub fn get_input_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.inputs
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Output
// ─────────────────────────────────────────────────────────────────────────────

/// Output from a node execution
pub struct NodeOutput {
    /// Output values (pin_name -> value)
    pub values: HashMap<String, Value>,
    /// Result of execution (which exec pin to follow, etc.)
    pub result: NodeResult,
    /// Exec pin fired right away by a latent node, before it suspends
    pub immediate: Option<String>,
}

impl NodeOutput {
    fn with_result(result: NodeResult, values: HashMap<String, Value>) -> Self {
        Self {
            values,
            result,
            immediate: None,
        }
    }

    /// Continue on the default "then" pin
    pub fn continue_default(values: HashMap<String, Value>) -> Self {
        Self::with_result(NodeResult::Continue("then".to_string()), values)
    }

    /// Suspend until `state` wakes, firing `exec_pin` right away
    pub fn latent_then(exec_pin: &str, state: LatentState, values: HashMap<String, Value>) -> Self {
        Self {
            immediate: Some(exec_pin.to_string()),
            ..Self::with_result(NodeResult::Latent(state), values)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_result(NodeResult::Error(message.into()), HashMap::new())
    }

    pub fn is_latent(&self) -> bool {
        matches!(self.result, NodeResult::Latent(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.result, NodeResult::Error(_))
    }

    /// Exec pin to follow when continuing
    pub fn next_exec_pin(&self) -> Option<&str> {
        match &self.result {
            NodeResult::Continue(pin) => Some(pin),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.result {
            NodeResult::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn latent_state(&self) -> Option<&LatentState> {
        match &self.result {
            NodeResult::Latent(state) => Some(state),
            _ => None,
        }
    }
}

// Blueprint Types - Core data structures for node descriptors
//
// These types describe node types, their pins, and what a node reports back
// to the graph host after it runs.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Pin Types
// ─────────────────────────────────────────────────────────────────────────────

/// Direction of a pin on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    Input,
    Output,
}

/// Data types that can flow through pins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum PinType {
    /// Execution flow (no data, just control flow)
    Exec,
    /// Floating point
    Real,
    /// Signed integer
    Integer,
    /// Boolean value
    Boolean,
    /// String value
    String,
    /// Interned name; the literal "None" means no name
    Name,
    /// Byte-backed enumeration (e.g. "LogVerbosity")
    Enum { enum_id: String },
    /// Struct type (e.g. "LinearColor")
    Struct { struct_id: String },
    /// Dynamic type (serde_json::Value) - accepts anything
    Any,
}

impl PinType {
    /// Check if this type is compatible with another (for connection validation)
    pub fn is_compatible_with(&self, other: &PinType) -> bool {
        match (self, other) {
            (a, b) if a == b => true,
            (PinType::Any, _) | (_, PinType::Any) => true,
            // Integer can be implicitly converted to Real
            (PinType::Real, PinType::Integer) | (PinType::Integer, PinType::Real) => true,
            // An enum pin accepts the raw byte
            (PinType::Enum { .. }, PinType::Integer) => true,
            // Strings promote to names
            (PinType::Name, PinType::String) => true,
            _ => false,
        }
    }

    /// Check if this is an execution pin type
    pub fn is_exec(&self) -> bool {
        matches!(self, PinType::Exec)
    }

    /// Check if this is a data pin type
    pub fn is_data(&self) -> bool {
        !self.is_exec()
    }

    /// Create a new Enum pin type
    pub fn enumeration(enum_id: impl Into<String>) -> Self {
        PinType::Enum {
            enum_id: enum_id.into(),
        }
    }

    /// Create a new Struct pin type
    pub fn structure(struct_id: impl Into<String>) -> Self {
        PinType::Struct {
            struct_id: struct_id.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pin Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Definition of a pin on a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinDef {
    /// Pin name (used in connections)
    pub name: String,
    /// Pin direction (input or output)
    pub direction: PinDirection,
    /// Data type of the pin
    #[serde(rename = "type")]
    pub pin_type: PinType,
    /// Default value for input pins (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Hidden behind the node's "advanced" expander
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub advanced: bool,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PinDef {
    fn new(name: &str, direction: PinDirection, pin_type: PinType) -> Self {
        Self {
            name: name.to_string(),
            direction,
            pin_type,
            default: None,
            advanced: false,
            description: None,
        }
    }

    /// The single "exec" input every impure node has
    pub fn exec_in() -> Self {
        Self::new("exec", PinDirection::Input, PinType::Exec)
    }

    pub fn exec_out(name: &str) -> Self {
        Self::new(name, PinDirection::Output, PinType::Exec)
    }

    pub fn data_in(name: &str, pin_type: PinType) -> Self {
        Self::new(name, PinDirection::Input, pin_type)
    }

    /// Data input used when nothing is connected
    pub fn data_in_with_default(
        name: &str,
        pin_type: PinType,
        default: serde_json::Value,
    ) -> Self {
        Self {
            default: Some(default),
            ..Self::data_in(name, pin_type)
        }
    }

    pub fn data_out(name: &str, pin_type: PinType) -> Self {
        Self::new(name, PinDirection::Output, pin_type)
    }

    /// Move this pin behind the advanced expander
    pub fn advanced(mut self) -> Self {
        self.advanced = true;
        self
    }

    /// Attach a description
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// Definition of a node type (registered in the NodeRegistry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    /// Unique identifier (e.g., "idk2/PrintWithVerbosity")
    pub id: String,
    /// Human-readable display name
    pub name: String,
    /// Category for organization (e.g., "Development", "Networking")
    pub category: String,
    /// Whether this is a pure node (no exec pins, evaluated on demand)
    #[serde(default)]
    pub pure: bool,
    /// Whether this node can suspend execution (latent node)
    #[serde(default)]
    pub latent: bool,
    /// Compiled out of shipping graphs
    #[serde(default)]
    pub development_only: bool,
    /// Pin definitions for this node type
    pub pins: Vec<PinDef>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NodeDef {
    /// Get all input pins
    pub fn input_pins(&self) -> impl Iterator<Item = &PinDef> {
        self.pins
            .iter()
            .filter(|p| p.direction == PinDirection::Input)
    }

    /// Get all output pins
    pub fn output_pins(&self) -> impl Iterator<Item = &PinDef> {
        self.pins
            .iter()
            .filter(|p| p.direction == PinDirection::Output)
    }

    /// Get all execution output pins
    pub fn exec_outputs(&self) -> impl Iterator<Item = &PinDef> {
        self.output_pins().filter(|p| p.pin_type.is_exec())
    }

    /// Get all data input pins
    pub fn data_inputs(&self) -> impl Iterator<Item = &PinDef> {
        self.input_pins().filter(|p| p.pin_type.is_data())
    }

    /// Get all advanced pins
    pub fn advanced_pins(&self) -> impl Iterator<Item = &PinDef> {
        self.pins.iter().filter(|p| p.advanced)
    }

    /// Get a pin by name
    pub fn get_pin(&self, name: &str) -> Option<&PinDef> {
        self.pins.iter().find(|p| p.name == name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Execution Types
// ─────────────────────────────────────────────────────────────────────────────

/// Result of executing a single node
#[derive(Debug, Clone)]
pub enum NodeResult {
    /// Continue execution from the specified output exec pin
    Continue(String),
    /// Node is latent (async), execution is suspended
    Latent(LatentState),
    /// Node produced an error
    Error(String),
}

/// State for a suspended latent node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatentState {
    /// Node that is suspended
    pub node_id: String,
    /// Execution pin to resume from
    pub resume_pin: String,
    /// Condition to wake up
    pub wake_condition: WakeCondition,
}

/// Condition that will resume a latent node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WakeCondition {
    /// Wake when an in-flight request proxy resolves
    RequestCompleted { request_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_type_compatibility() {
        assert!(PinType::Real.is_compatible_with(&PinType::Real));
        assert!(PinType::Real.is_compatible_with(&PinType::Integer));
        assert!(PinType::Any.is_compatible_with(&PinType::String));
        assert!(PinType::enumeration("LogVerbosity").is_compatible_with(&PinType::Integer));
        assert!(PinType::Name.is_compatible_with(&PinType::String));
        assert!(!PinType::Boolean.is_compatible_with(&PinType::String));
        assert!(
            !PinType::structure("LinearColor").is_compatible_with(&PinType::structure("Vector"))
        );
    }

    #[test]
    fn test_advanced_pins_are_flagged() {
        let def = NodeDef {
            id: "test/Node".to_string(),
            name: "Test".to_string(),
            category: "Test".to_string(),
            pure: false,
            latent: false,
            development_only: false,
            pins: vec![
                PinDef::exec_in(),
                PinDef::data_in("a", PinType::Real).advanced(),
                PinDef::exec_out("then"),
            ],
            description: None,
        };

        let advanced: Vec<_> = def.advanced_pins().map(|p| p.name.as_str()).collect();
        assert_eq!(advanced, vec!["a"]);
        assert_eq!(def.exec_outputs().count(), 1);
        assert_eq!(def.data_inputs().count(), 1);
    }

    #[test]
    fn test_pin_def_serializes_without_empty_fields() {
        let pin = PinDef::data_in_with_default("Duration", PinType::Real, serde_json::json!(2.0));
        let json = serde_json::to_value(&pin).unwrap();
        assert_eq!(json["type"]["type"], "Real");
        assert_eq!(json["default"], 2.0);
        assert!(json.get("advanced").is_none());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_wake_condition_json() {
        let wake = WakeCondition::RequestCompleted {
            request_id: "abc".to_string(),
        };
        let json = serde_json::to_value(&wake).unwrap();
        assert_eq!(json["type"], "request_completed");
        assert_eq!(json["request_id"], "abc");
    }
}

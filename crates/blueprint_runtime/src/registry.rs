// Node Registry - Node definitions paired with their executors
//
// A plugin registers every node type it contributes here. The graph host reads
// the registry to populate its action menu and runs nodes through it by type id.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use blueprint_types::NodeDef;
use serde::{Deserialize, Serialize};

use super::executor::{NodeContext, NodeOutput};

// ─────────────────────────────────────────────────────────────────────────────
// Node Executor Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Runs one node type
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Execute the node with the given context
    async fn execute(&self, ctx: &mut NodeContext) -> NodeOutput;
}

// ─────────────────────────────────────────────────────────────────────────────
// Menu Actions
// ─────────────────────────────────────────────────────────────────────────────

/// One entry in the host's "add node" menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuAction {
    pub node_id: String,
    pub name: String,
    pub category: String,
    pub development_only: bool,
}

impl From<&NodeDef> for MenuAction {
    fn from(def: &NodeDef) -> Self {
        Self {
            node_id: def.id.clone(),
            name: def.name.clone(),
            category: def.category.clone(),
            development_only: def.development_only,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Registry
// ─────────────────────────────────────────────────────────────────────────────

struct Registration {
    definition: NodeDef,
    executor: Arc<dyn NodeExecutor>,
}

/// Every node type known to the host, keyed by type id
#[derive(Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<String, Registration>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type with its executor.
    ///
    /// Registering an id twice replaces the earlier entry.
    pub fn register(&mut self, definition: NodeDef, executor: Arc<dyn NodeExecutor>) {
        let id = definition.id.clone();
        let replaced = self
            .nodes
            .insert(id.clone(), Registration {
                definition,
                executor,
            })
            .is_some();
        if replaced {
            tracing::warn!(node_id = %id, "Replacing existing node registration");
        } else {
            tracing::debug!(node_id = %id, "Registered node");
        }
    }

    pub fn get_definition(&self, id: &str) -> Option<&NodeDef> {
        self.nodes.get(id).map(|r| &r.definition)
    }

    /// Run a node by type id, filling unconnected inputs from pin defaults.
    ///
    /// Returns `None` when the id is not registered.
    pub async fn execute(
        &self,
        node_type: &str,
        node_id: &str,
        inputs: HashMap<String, serde_json::Value>,
    ) -> Option<NodeOutput> {
        let registration = self.nodes.get(node_type)?;
        let mut ctx = NodeContext::with_defaults(node_id, &registration.definition, inputs);
        let executor = Arc::clone(&registration.executor);
        Some(executor.execute(&mut ctx).await)
    }

    /// All definitions in type id order
    pub fn definitions(&self) -> impl Iterator<Item = &NodeDef> {
        self.nodes.values().map(|r| &r.definition)
    }

    /// Menu entries sorted by category, then display name
    pub fn menu_actions(&self) -> Vec<MenuAction> {
        let mut actions: Vec<MenuAction> = self.definitions().map(MenuAction::from).collect();
        actions.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        actions
    }

    /// Distinct categories, sorted
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.definitions().map(|d| d.category.as_str()).collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_types::{PinDef, PinType};
    use serde_json::json;

    /// Copies the `text` input to an `echo` output
    struct Echo;

    #[async_trait]
    impl NodeExecutor for Echo {
        async fn execute(&self, ctx: &mut NodeContext) -> NodeOutput {
            let mut values = HashMap::new();
            values.insert(
                "echo".to_string(),
                json!(ctx.get_input_string("text").unwrap_or_default()),
            );
            NodeOutput::continue_default(values)
        }
    }

    fn def(id: &str, name: &str, category: &str) -> NodeDef {
        NodeDef {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            pure: false,
            latent: false,
            development_only: false,
            pins: vec![],
            description: None,
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = NodeRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.menu_actions().is_empty());
    }

    #[test]
    fn test_register_and_replace() {
        let mut registry = NodeRegistry::new();
        registry.register(def("test/Node", "First", "Test"), Arc::new(Echo));
        registry.register(def("test/Node", "Second", "Test"), Arc::new(Echo));

        assert!(registry.contains("test/Node"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_definition("test/Node").unwrap().name, "Second");
    }

    #[test]
    fn test_categories_and_menu_order() {
        let mut registry = NodeRegistry::new();
        registry.register(def("a/Get", "Get", "Networking"), Arc::new(Echo));
        registry.register(def("b/Print", "Print", "Development"), Arc::new(Echo));
        registry.register(def("c/Trace", "Trace", "Development"), Arc::new(Echo));

        assert_eq!(registry.categories(), vec!["Development", "Networking"]);

        let ids: Vec<_> = registry
            .menu_actions()
            .into_iter()
            .map(|a| a.node_id)
            .collect();
        assert_eq!(ids, vec!["b/Print", "c/Trace", "a/Get"]);
    }

    #[tokio::test]
    async fn test_execute_applies_pin_defaults() {
        let mut registry = NodeRegistry::new();
        let mut node = def("test/Echo", "Echo", "Test");
        node.pins = vec![
            PinDef::exec_in(),
            PinDef::data_in_with_default("text", PinType::String, json!("Hello")),
            PinDef::exec_out("then"),
        ];
        registry.register(node, Arc::new(Echo));

        let output = registry
            .execute("test/Echo", "n1", HashMap::new())
            .await
            .unwrap();
        assert_eq!(output.values["echo"], "Hello");
        assert_eq!(output.next_exec_pin(), Some("then"));

        let output = registry
            .execute("test/Echo", "n2", HashMap::from([("text".to_string(), json!("hi"))]))
            .await
            .unwrap();
        assert_eq!(output.values["echo"], "hi");

        assert!(registry.execute("test/Missing", "n3", HashMap::new()).await.is_none());
    }
}

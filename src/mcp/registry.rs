use indexmap::IndexMap;
use serde_json::json;
use std::fmt;

use super::protocol::Tool;

/// Tool registry holding the catalog advertised through `tools/list`.
///
/// Insertion order is the order clients see.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Tool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTool(pub String);

impl fmt::Display for DuplicateTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tool {:?} is registered more than once", self.0)
    }
}

impl std::error::Error for DuplicateTool {}

impl ToolRegistry {
    /// Build a registry from an explicit catalog; names must be unique.
    pub fn from_tools(tools: Vec<Tool>) -> Result<Self, DuplicateTool> {
        let mut registry = Self::default();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Catalog used when the configuration does not provide one.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        for tool in default_tools() {
            // names in default_tools() are distinct
            let _ = registry.register(tool);
        }
        registry
    }

    fn register(&mut self, tool: Tool) -> Result<(), DuplicateTool> {
        if self.tools.contains_key(&tool.name) {
            return Err(DuplicateTool(tool.name));
        }
        self.tools.insert(tool.name.clone(), tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.values().cloned().collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }
}

fn default_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "search".to_string(),
            description: "Search the downstream content source".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search terms" },
                    "limit": { "type": "integer", "minimum": 1, "maximum": 100 }
                },
                "required": ["query"]
            }),
        },
        Tool {
            name: "get_item".to_string(),
            description: "Fetch a single item by its identifier".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string" }
                },
                "required": ["id"]
            }),
        },
        Tool {
            name: "create_item".to_string(),
            description: "Create a new item on the downstream platform".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "body": { "type": "string" },
                    "target": { "type": "string", "description": "Destination collection" }
                },
                "required": ["title"]
            }),
        },
    ]
}

//! Workflow document parsing.
//!
//! Turns raw definition bytes into a [`WorkflowDocument`]: top-level metadata
//! plus a [`WorkflowGraph`] of nodes and their name-addressed connections.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value};

use flowindex_shared::{FlowIndexError, Result};

/// Output port followed by traversal and diagram rendering.
pub const MAIN_PORT: &str = "main";

/// A single processing node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    /// Display name; connections refer to nodes by this key.
    pub name: String,
    /// Namespaced capability identifier, e.g. `n8n-nodes-base.slack`.
    pub node_type: String,
    pub parameters: Value,
    /// Author note attached to the node, if non-blank.
    pub notes: Option<String>,
}

/// Outgoing connections of one source node: port name → output slots → target names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOutputs {
    ports: BTreeMap<String, Vec<Vec<String>>>,
}

impl NodeOutputs {
    pub fn port(&self, name: &str) -> &[Vec<String>] {
        self.ports.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn main(&self) -> &[Vec<String>] {
        self.port(MAIN_PORT)
    }

    pub fn port_names(&self) -> impl Iterator<Item = &str> {
        self.ports.keys().map(String::as_str)
    }
}

/// Nodes in document order plus their connections.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    nodes: Vec<Node>,
    connections: HashMap<String, NodeOutputs>,
    /// First position of each node name.
    by_name: HashMap<String, usize>,
}

impl WorkflowGraph {
    pub fn new(nodes: Vec<Node>, connections: HashMap<String, NodeOutputs>) -> Self {
        let mut by_name = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            by_name.entry(node.name.clone()).or_insert(i);
        }
        Self {
            nodes,
            connections,
            by_name,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position of the first node carrying `name`.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn outputs_of(&self, name: &str) -> Option<&NodeOutputs> {
        self.connections.get(name)
    }

    /// Slots of the `main` port of `name`, empty when it has none.
    pub fn main_outputs(&self, name: &str) -> &[Vec<String>] {
        self.outputs_of(name).map(NodeOutputs::main).unwrap_or(&[])
    }

    /// Every node name that appears as a `main` connection target.
    pub fn main_targets(&self) -> HashSet<&str> {
        self.connections
            .values()
            .flat_map(|outputs| outputs.main().iter().flatten())
            .map(String::as_str)
            .collect()
    }
}

/// A parsed workflow definition.
#[derive(Debug, Clone, Default)]
pub struct WorkflowDocument {
    pub name: Option<String>,
    pub id: String,
    pub active: bool,
    pub tags: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub graph: WorkflowGraph,
}

/// Parse raw definition bytes.
///
/// Invalid UTF-8 or JSON syntax is a decode error. A document that parses but
/// is not an object, or whose `nodes`/`connections` have the wrong JSON kind,
/// is an analysis error. A missing `nodes` array is an empty graph.
pub fn parse_document(raw: &[u8]) -> Result<WorkflowDocument> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| FlowIndexError::decode(format!("invalid UTF-8: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let value: Value = serde_json::from_str(text)
        .map_err(|e| FlowIndexError::decode(format!("invalid JSON: {e}")))?;

    let root = value
        .as_object()
        .ok_or_else(|| FlowIndexError::analysis("document root is not a JSON object"))?;

    let nodes = parse_nodes(root.get("nodes"))?;
    let connections = parse_connections(root.get("connections"))?;

    Ok(WorkflowDocument {
        name: root
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
        id: scalar_string(root.get("id")).unwrap_or_default(),
        active: root.get("active").is_some_and(truthy),
        tags: parse_tags(root.get("tags")),
        created_at: scalar_string(root.get("createdAt")),
        updated_at: scalar_string(root.get("updatedAt")),
        graph: WorkflowGraph::new(nodes, connections),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_nodes(value: Option<&Value>) -> Result<Vec<Node>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(FlowIndexError::analysis("`nodes` is not an array")),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let obj = item
                .as_object()
                .ok_or_else(|| FlowIndexError::analysis(format!("node {i} is not an object")))?;
            Ok(parse_node(i, obj))
        })
        .collect()
}

fn parse_node(index: usize, obj: &Map<String, Value>) -> Node {
    let text = |key: &str| obj.get(key).and_then(Value::as_str).map(String::from);

    Node {
        id: scalar_string(obj.get("id")).unwrap_or_default(),
        name: text("name").unwrap_or_else(|| format!("Node {index}")),
        node_type: text("type").unwrap_or_default(),
        parameters: obj
            .get("parameters")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())),
        notes: text("notes").filter(|n| !n.trim().is_empty()),
    }
}

fn parse_connections(value: Option<&Value>) -> Result<HashMap<String, NodeOutputs>> {
    let sources = match value {
        None | Some(Value::Null) => return Ok(HashMap::new()),
        Some(Value::Object(sources)) => sources,
        Some(_) => return Err(FlowIndexError::analysis("`connections` is not an object")),
    };

    let mut connections = HashMap::with_capacity(sources.len());
    for (source, ports) in sources {
        let Some(ports) = ports.as_object() else {
            continue;
        };

        let mut outputs = NodeOutputs::default();
        for (port, slots) in ports {
            let Some(slots) = slots.as_array() else {
                continue;
            };
            // Malformed slots stay as empty entries so output indexes keep their position.
            let slots = slots
                .iter()
                .map(|slot| {
                    slot.as_array()
                        .map(|targets| {
                            targets
                                .iter()
                                .filter_map(|t| t.get("node").and_then(Value::as_str))
                                .map(String::from)
                                .collect()
                        })
                        .unwrap_or_default()
                })
                .collect();
            outputs.ports.insert(port.clone(), slots);
        }
        connections.insert(source.clone(), outputs);
    }
    Ok(connections)
}

/// Tags are plain scalars or `{name, id}` objects; objects reduce to `name`, then `id`.
/// Numbers and booleans are kept in their JSON spelling.
fn parse_tags(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|tag| match tag {
            Value::Object(obj) => obj
                .get("name")
                .and_then(Value::as_str)
                .map(String::from)
                .or_else(|| scalar_string(obj.get("id"))),
            scalar => scalar_string(Some(scalar)),
        })
        .filter(|t| !t.trim().is_empty())
        .collect()
}

fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "Slack Alert",
        "id": 42,
        "active": true,
        "tags": ["ops", {"name": "alerts", "id": "7"}, {"id": "9"}, 3],
        "createdAt": "2024-01-02T03:04:05.000Z",
        "nodes": [
            {"id": "a", "name": "Hook", "type": "n8n-nodes-base.webhook", "parameters": {}},
            {"id": "b", "name": "Notify", "type": "n8n-nodes-base.slack", "notes": "  "}
        ],
        "connections": {
            "Hook": {"main": [[{"node": "Notify", "type": "main", "index": 0}]]}
        }
    }"#;

    #[test]
    fn parses_metadata_and_graph() {
        let doc = parse_document(SAMPLE.as_bytes()).expect("parse");
        assert_eq!(doc.name.as_deref(), Some("Slack Alert"));
        assert_eq!(doc.id, "42");
        assert!(doc.active);
        assert_eq!(doc.tags, vec!["ops", "alerts", "9", "3"]);
        assert_eq!(doc.created_at.as_deref(), Some("2024-01-02T03:04:05.000Z"));
        assert_eq!(doc.updated_at, None);

        let graph = &doc.graph;
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.nodes()[1].notes, None, "blank notes are dropped");
        assert_eq!(graph.main_outputs("Hook"), &[vec!["Notify".to_string()]]);
        assert!(graph.main_targets().contains("Notify"));
        assert_eq!(graph.position_of("Notify"), Some(1));
    }

    #[test]
    fn scalar_tags_are_stringified() {
        let tags = parse_tags(Some(&serde_json::json!([7, 2.5, true, null, "", {"name": "x"}, []])));
        assert_eq!(tags, vec!["7", "2.5", "true", "x"]);
    }

    #[test]
    fn missing_nodes_is_an_empty_graph() {
        let doc = parse_document(br#"{"name": "Empty"}"#).expect("parse");
        assert!(doc.graph.is_empty());
        assert!(!doc.active);
    }

    #[test]
    fn syntax_errors_are_decode_errors() {
        let err = parse_document(b"{\"nodes\": [").unwrap_err();
        assert!(matches!(err, FlowIndexError::Decode { .. }));

        let err = parse_document(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, FlowIndexError::Decode { .. }));
    }

    #[test]
    fn wrong_shapes_are_analysis_errors() {
        for raw in [
            &b"[1, 2, 3]"[..],
            br#"{"nodes": {"a": 1}}"#,
            br#"{"nodes": [1]}"#,
            br#"{"nodes": [], "connections": []}"#,
        ] {
            let err = parse_document(raw).unwrap_err();
            assert!(matches!(err, FlowIndexError::Analysis { .. }), "{err}");
        }
    }

    #[test]
    fn byte_order_mark_is_accepted() {
        let mut raw = "\u{feff}".as_bytes().to_vec();
        raw.extend_from_slice(br#"{"nodes": []}"#);
        assert!(parse_document(&raw).is_ok());
    }

    #[test]
    fn malformed_slots_keep_their_index() {
        let raw = br#"{
            "nodes": [{"name": "If", "type": "n8n-nodes-base.if"}, {"name": "B", "type": "x.y"}],
            "connections": {"If": {"main": [null, [{"node": "B"}, {"bogus": true}]]}}
        }"#;
        let doc = parse_document(raw).unwrap();
        let main = doc.graph.main_outputs("If");
        assert_eq!(main.len(), 2);
        assert!(main[0].is_empty());
        assert_eq!(main[1], vec!["B".to_string()]);
    }

    #[test]
    fn duplicate_names_resolve_to_first_position() {
        let raw = br#"{"nodes": [{"name": "Set"}, {"name": "Set"}]}"#;
        let doc = parse_document(raw).unwrap();
        assert_eq!(doc.graph.position_of("Set"), Some(0));
    }
}

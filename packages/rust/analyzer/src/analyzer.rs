//! Static analysis of a workflow graph into a [`WorkflowRecord`].

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};

use flowindex_shared::{
    Complexity, Result, SourceFile, TriggerType, WorkflowDetail, WorkflowRecord,
};

use crate::describe::synthesize_description;
use crate::diagram;
use crate::graph::{Node, WorkflowDocument, WorkflowGraph, parse_document};
use crate::services::ServiceCatalog;
use crate::steps;

/// Node count above which a workflow may be classified `Complex`.
const COMPLEX_MIN_NODES: usize = 10;

/// Distinct integration count above which a workflow may be classified `Complex`.
const COMPLEX_MIN_INTEGRATIONS: usize = 3;

const SCHEDULE_KEYWORDS: &[&str] = &["cron", "schedule", "interval"];

/// Derives structural metadata from workflow definitions.
///
/// The service table is injected so callers (and tests) control the mapping.
#[derive(Debug, Clone)]
pub struct GraphAnalyzer {
    catalog: Arc<ServiceCatalog>,
}

impl Default for GraphAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(ServiceCatalog::builtin()))
    }
}

impl GraphAnalyzer {
    pub fn new(catalog: Arc<ServiceCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Analyze one definition file into its persistent record.
    #[instrument(skip_all, fields(filename = %source.filename))]
    pub fn analyze(&self, source: &SourceFile) -> Result<WorkflowRecord> {
        let document = parse_document(&source.bytes)?;
        let record = self.build_record(source, &document);
        debug!(
            trigger = %record.trigger_type,
            complexity = %record.complexity,
            nodes = record.node_count,
            integrations = record.integrations.len(),
            "workflow analyzed"
        );
        Ok(record)
    }

    /// Analyze a file and also derive its step narrative and flow diagram.
    pub fn detail(&self, source: &SourceFile) -> Result<WorkflowDetail> {
        let document = parse_document(&source.bytes)?;
        let record = self.build_record(source, &document);
        Ok(WorkflowDetail {
            record,
            steps: steps::narrate(&document.graph, &self.catalog),
            diagram: diagram::render(&document.graph),
        })
    }

    /// Deduplicated integration display names of every node.
    pub fn integrations(&self, graph: &WorkflowGraph) -> BTreeSet<String> {
        graph
            .nodes()
            .iter()
            .filter_map(|node| self.catalog.integration_for(&node.node_type))
            .collect()
    }

    fn build_record(&self, source: &SourceFile, document: &WorkflowDocument) -> WorkflowRecord {
        let graph = &document.graph;
        let node_count = graph.node_count();
        let integrations = self.integrations(graph);
        let trigger_type = classify(graph.nodes(), integrations.len());
        let name = document
            .name
            .clone()
            .unwrap_or_else(|| source.stem().to_string());
        let description = synthesize_description(&name, trigger_type, &integrations, node_count);

        WorkflowRecord {
            filename: source.filename.clone(),
            name,
            workflow_id: document.id.clone(),
            active: document.active,
            description,
            trigger_type,
            complexity: Complexity::from_node_count(node_count),
            node_count,
            integrations: integrations.into_iter().collect(),
            tags: document.tags.clone(),
            created_at: document.created_at.clone(),
            updated_at: document.updated_at.clone(),
            file_hash: source.fingerprint.clone(),
            file_size: source.size(),
            analyzed_at: Utc::now(),
        }
    }
}

/// Final trigger classification, including the `Complex` override.
pub fn classify(nodes: &[Node], integration_count: usize) -> TriggerType {
    if nodes.len() > COMPLEX_MIN_NODES && integration_count > COMPLEX_MIN_INTEGRATIONS {
        return TriggerType::Complex;
    }
    classify_trigger(nodes)
}

/// Highest-priority trigger signal among all nodes: Scheduled > Webhook > Manual.
///
/// The result does not depend on node order.
pub fn classify_trigger(nodes: &[Node]) -> TriggerType {
    nodes
        .iter()
        .map(node_signal)
        .max_by_key(|t| priority(*t))
        .unwrap_or(TriggerType::Manual)
}

fn node_signal(node: &Node) -> TriggerType {
    let node_type = node.node_type.to_lowercase();
    let name = node.name.to_lowercase();
    let mentions = |kw: &str| node_type.contains(kw) || name.contains(kw);

    if SCHEDULE_KEYWORDS.iter().any(|kw| mentions(kw)) {
        TriggerType::Scheduled
    } else if mentions("webhook")
        || (node_type.contains("trigger") && !node_type.contains("manual"))
    {
        TriggerType::Webhook
    } else {
        TriggerType::Manual
    }
}

fn priority(trigger: TriggerType) -> u8 {
    match trigger {
        TriggerType::Manual => 0,
        TriggerType::Webhook => 1,
        TriggerType::Scheduled => 2,
        TriggerType::Complex => 3,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn node(name: &str, node_type: &str) -> Value {
        json!({ "id": name, "name": name, "type": node_type, "parameters": {} })
    }

    fn source(doc: Value) -> SourceFile {
        SourceFile::new("0001_test.json", serde_json::to_vec(&doc).unwrap())
    }

    fn graph_nodes(types: &[&str]) -> Vec<Node> {
        types
            .iter()
            .enumerate()
            .map(|(i, t)| Node {
                id: i.to_string(),
                name: format!("n{i}"),
                node_type: t.to_string(),
                parameters: Value::Null,
                notes: None,
            })
            .collect()
    }

    #[test]
    fn webhook_http_set_example() {
        let doc = json!({
            "name": "Forward hook",
            "nodes": [
                node("Hook", "n8n-nodes-base.webhookTrigger"),
                node("Call API", "n8n-nodes-base.httpRequest"),
                node("Shape", "n8n-nodes-base.set"),
            ],
            "connections": {}
        });
        let record = GraphAnalyzer::default().analyze(&source(doc)).unwrap();
        assert_eq!(record.complexity, Complexity::Low);
        assert_eq!(record.trigger_type, TriggerType::Webhook);
        assert_eq!(record.integrations, vec!["HTTP"]);
        assert_eq!(record.node_count, 3);
    }

    #[test]
    fn complex_override_beats_scheduled() {
        let mut nodes = vec![
            node("Every hour", "n8n-nodes-base.cron"),
            node("Sheet", "n8n-nodes-base.googleSheets"),
            node("Chat", "n8n-nodes-base.slack"),
            node("Mail", "n8n-nodes-base.gmail"),
            node("Pay", "n8n-nodes-base.stripe"),
        ];
        for i in 0..7 {
            nodes.push(node(&format!("Set {i}"), "n8n-nodes-base.set"));
        }
        let doc = json!({ "name": "Big", "nodes": nodes });
        let record = GraphAnalyzer::default().analyze(&source(doc)).unwrap();
        assert_eq!(record.node_count, 12);
        assert_eq!(record.integrations.len(), 4);
        assert_eq!(record.trigger_type, TriggerType::Complex);
        assert_eq!(record.complexity, Complexity::Medium);
    }

    #[test]
    fn complex_needs_both_thresholds() {
        // 11 nodes but only 3 integrations → keeps the scheduled signal.
        let mut types = vec![
            "n8n-nodes-base.scheduleTrigger",
            "n8n-nodes-base.slack",
            "n8n-nodes-base.gmail",
            "n8n-nodes-base.stripe",
        ];
        types.extend(std::iter::repeat_n("n8n-nodes-base.set", 7));
        let nodes = graph_nodes(&types);
        assert_eq!(classify(&nodes, 3), TriggerType::Scheduled);
        assert_eq!(classify(&nodes, 4), TriggerType::Complex);
        assert_eq!(classify(&nodes[..10], 4), TriggerType::Scheduled);
    }

    #[test]
    fn trigger_priority_is_order_independent() {
        let forward = graph_nodes(&[
            "n8n-nodes-base.cron",
            "n8n-nodes-base.webhook",
            "n8n-nodes-base.slack",
        ]);
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(classify_trigger(&forward), TriggerType::Scheduled);
        assert_eq!(classify_trigger(&reversed), TriggerType::Scheduled);
    }

    #[test]
    fn trigger_signals() {
        assert_eq!(
            classify_trigger(&graph_nodes(&["n8n-nodes-base.manualTrigger", "n8n-nodes-base.slack"])),
            TriggerType::Manual
        );
        assert_eq!(
            classify_trigger(&graph_nodes(&["n8n-nodes-base.telegramTrigger"])),
            TriggerType::Webhook
        );
        assert_eq!(classify_trigger(&[]), TriggerType::Manual);

        let mut named = graph_nodes(&["n8n-nodes-base.noOp"]);
        named[0].name = "Incoming Webhook".into();
        assert_eq!(classify_trigger(&named), TriggerType::Webhook);
    }

    #[test]
    fn mapping_collision_never_adds_excluded_node() {
        let catalog = ServiceCatalog::builtin().with_overrides([("if", "Intelligent Forms")]);
        let analyzer = GraphAnalyzer::new(Arc::new(catalog));
        let doc = json!({
            "nodes": [node("Check", "n8n-nodes-base.if"), node("Chat", "n8n-nodes-base.slack")]
        });
        let record = analyzer.analyze(&source(doc)).unwrap();
        assert_eq!(record.integrations, vec!["Slack"]);
    }

    #[test]
    fn record_metadata_comes_from_document_and_file() {
        let doc = json!({
            "id": "wf-1",
            "active": true,
            "tags": [{"name": "sales"}],
            "createdAt": "2023-05-01",
            "updatedAt": "2023-06-01",
            "nodes": []
        });
        let src = source(doc);
        let record = GraphAnalyzer::default().analyze(&src).unwrap();
        assert_eq!(record.filename, "0001_test.json");
        assert_eq!(record.name, "0001_test", "falls back to the file stem");
        assert_eq!(record.workflow_id, "wf-1");
        assert!(record.active);
        assert_eq!(record.tags, vec!["sales"]);
        assert_eq!(record.file_hash, src.fingerprint);
        assert_eq!(record.file_size, src.size());
        assert_eq!(record.node_count, 0);
        assert_eq!(record.trigger_type, TriggerType::Manual);
    }

    #[test]
    fn detail_includes_steps_and_diagram() {
        let doc = json!({
            "name": "Detail",
            "nodes": [node("Hook", "n8n-nodes-base.webhook"), node("Chat", "n8n-nodes-base.slack")],
            "connections": {"Hook": {"main": [[{"node": "Chat"}]]}}
        });
        let detail = GraphAnalyzer::default().detail(&source(doc)).unwrap();
        assert_eq!(detail.steps.len(), 2);
        assert!(detail.diagram.contains("node0 --> node1"));
        assert_eq!(detail.record.integrations, vec!["Slack"]);
    }
}

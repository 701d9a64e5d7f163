//! Mermaid flowchart rendering.
//!
//! Output is a pure function of the node array and connection map: node
//! identifiers are positional (`node0`, `node1`, ...), edges are emitted in
//! node order, then output-slot order, then target order.

use std::fmt::Write as _;

use crate::graph::WorkflowGraph;

/// Placeholder chart for a workflow without nodes.
pub const EMPTY_DIAGRAM: &str = "graph TD\n  EmptyWorkflow[No nodes found in workflow]";

/// Type fragments that mark an entry point of the flow.
const TRIGGER_FRAGMENTS: &[&str] = &["trigger", "webhook", "cron", "schedule", "interval"];

/// Visual class of a node in the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Trigger,
    Conditional,
    Code,
    Error,
    Default,
}

impl NodeCategory {
    /// Classify a node type by the fragments it contains.
    pub fn of(node_type: &str) -> Self {
        let t = node_type.to_lowercase();
        if TRIGGER_FRAGMENTS.iter().any(|f| t.contains(f)) {
            Self::Trigger
        } else if t.contains("if") || t.contains("switch") {
            Self::Conditional
        } else if t.contains("function") || t.contains("code") {
            Self::Code
        } else if t.contains("error") {
            Self::Error
        } else {
            Self::Default
        }
    }

    pub fn style(self) -> &'static str {
        match self {
            Self::Trigger => "fill:#b3e0ff,stroke:#0066cc",
            Self::Conditional => "fill:#ffffb3,stroke:#e6e600",
            Self::Code => "fill:#d9b3ff,stroke:#6600cc",
            Self::Error => "fill:#ffb3b3,stroke:#cc0000",
            Self::Default => "fill:#d9d9d9,stroke:#666666",
        }
    }
}

/// Render the `main`-port flow of a workflow as a Mermaid `graph TD` chart.
pub fn render(graph: &WorkflowGraph) -> String {
    if graph.is_empty() {
        return EMPTY_DIAGRAM.to_string();
    }

    let mut out = String::from("graph TD");

    for (i, node) in graph.nodes().iter().enumerate() {
        let label = format!("{}<br>({})", escape(&node.name), short_type(&node.node_type));
        let _ = write!(out, "\n  node{i}[\"{label}\"]");
        let _ = write!(out, "\n  style node{i} {}", NodeCategory::of(&node.node_type).style());
    }

    for (i, node) in graph.nodes().iter().enumerate() {
        // Duplicate names: only the first node owns the connection entry.
        if graph.position_of(&node.name) != Some(i) {
            continue;
        }
        let slots = graph.main_outputs(&node.name);
        let labelled = slots.len() > 1;

        for (slot, targets) in slots.iter().enumerate() {
            for target in targets {
                // Targets naming no node are dropped.
                let Some(j) = graph.position_of(target) else {
                    continue;
                };
                if labelled {
                    let _ = write!(out, "\n  node{i} -->|{slot}| node{j}");
                } else {
                    let _ = write!(out, "\n  node{i} --> node{j}");
                }
            }
        }
    }

    out
}

fn short_type(node_type: &str) -> &str {
    node_type.rsplit('.').next().unwrap_or(node_type)
}

fn escape(label: &str) -> String {
    label.replace('"', "'")
}

//! Ordered execution narrative of a workflow.
//!
//! Author notes win when present. Otherwise the graph is walked depth-first
//! from a start node along `main` outputs and each visited node gets a
//! generated one-line description.

use std::collections::HashSet;

use serde_json::Value;

use flowindex_shared::Step;

use crate::graph::{Node, WorkflowGraph};
use crate::services::ServiceCatalog;

/// Type fragments that mark a likely entry node.
const START_HINTS: &[&str] = &["trigger", "webhook", "cron", "schedule", "manual"];

/// How a rule matches a node type.
#[derive(Debug, Clone, Copy)]
enum Key {
    /// Any fragment occurs in the lowercased full type.
    Contains(&'static [&'static str]),
    /// The lowercased normalized token equals this value.
    Token(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    Webhook,
    Schedule,
    Manual,
    Http,
    Set,
    Conditional,
    Switch,
    Code,
    Merge,
    Split,
    Filter,
    Gmail,
    Slack,
    Discord,
    Telegram,
    Airtable,
    GoogleSheets,
    GoogleDrive,
    GoogleCalendar,
    Google,
    Outlook,
    Excel,
    Microsoft,
    OpenAi,
    Anthropic,
    Notion,
    Github,
    Database,
    Wait,
    Error,
}

/// First matching rule wins; unmatched nodes get the generic service sentence.
const RULES: &[(Key, StepKind)] = &[
    (Key::Contains(&["webhook"]), StepKind::Webhook),
    (Key::Contains(&["cron", "schedule"]), StepKind::Schedule),
    (Key::Contains(&["manual"]), StepKind::Manual),
    (Key::Contains(&["http"]), StepKind::Http),
    (Key::Token("set"), StepKind::Set),
    (Key::Contains(&["renamekeys"]), StepKind::Set),
    (Key::Token("if"), StepKind::Conditional),
    (Key::Contains(&["switch"]), StepKind::Switch),
    (Key::Contains(&["function"]), StepKind::Code),
    (Key::Token("code"), StepKind::Code),
    (Key::Contains(&["merge"]), StepKind::Merge),
    (Key::Contains(&["split"]), StepKind::Split),
    (Key::Contains(&["filter"]), StepKind::Filter),
    (Key::Contains(&["gmail"]), StepKind::Gmail),
    (Key::Contains(&["slack"]), StepKind::Slack),
    (Key::Contains(&["discord"]), StepKind::Discord),
    (Key::Contains(&["telegram"]), StepKind::Telegram),
    (Key::Contains(&["airtable"]), StepKind::Airtable),
    (Key::Contains(&["googlesheets"]), StepKind::GoogleSheets),
    (Key::Contains(&["googledrive"]), StepKind::GoogleDrive),
    (Key::Contains(&["googlecalendar"]), StepKind::GoogleCalendar),
    (Key::Contains(&["google"]), StepKind::Google),
    (Key::Contains(&["outlook"]), StepKind::Outlook),
    (Key::Contains(&["excel"]), StepKind::Excel),
    (Key::Contains(&["microsoft"]), StepKind::Microsoft),
    (Key::Contains(&["openai"]), StepKind::OpenAi),
    (Key::Contains(&["anthropic"]), StepKind::Anthropic),
    (Key::Contains(&["notion"]), StepKind::Notion),
    (Key::Contains(&["github"]), StepKind::Github),
    (Key::Contains(&["database", "mysql", "postgres"]), StepKind::Database),
    (Key::Contains(&["wait"]), StepKind::Wait),
    (Key::Contains(&["error"]), StepKind::Error),
];

/// Build the step narrative for a graph.
pub fn narrate(graph: &WorkflowGraph, catalog: &ServiceCatalog) -> Vec<Step> {
    let annotated: Vec<Step> = graph
        .nodes()
        .iter()
        .filter_map(|node| {
            node.notes.as_ref().map(|note| Step {
                name: node.name.clone(),
                node_type: node.node_type.clone(),
                note: note.clone(),
            })
        })
        .collect();
    if !annotated.is_empty() {
        return annotated;
    }

    let Some(start) = find_start(graph) else {
        return Vec::new();
    };

    traverse(graph, start)
        .into_iter()
        .map(|i| {
            let node = &graph.nodes()[i];
            Step {
                name: node.name.clone(),
                node_type: node.node_type.clone(),
                note: describe_node(node, catalog),
            }
        })
        .collect()
}

/// Entry node: first trigger-like node, else first node never targeted, else the first node.
fn find_start(graph: &WorkflowGraph) -> Option<usize> {
    let nodes = graph.nodes();
    if nodes.is_empty() {
        return None;
    }

    if let Some(i) = nodes.iter().position(|n| {
        let t = n.node_type.to_lowercase();
        START_HINTS.iter().any(|hint| t.contains(hint))
    }) {
        return Some(i);
    }

    let targets = graph.main_targets();
    nodes
        .iter()
        .position(|n| !targets.contains(n.name.as_str()))
        .or(Some(0))
}

/// Depth-first pre-order positions reachable from `start` along `main` outputs.
///
/// Each node is emitted at most once, so diamonds converge and cycles terminate.
fn traverse(graph: &WorkflowGraph, start: usize) -> Vec<usize> {
    let nodes = graph.nodes();
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![start];

    while let Some(i) = stack.pop() {
        if !visited.insert(i) {
            continue;
        }
        order.push(i);

        let next: Vec<usize> = graph
            .main_outputs(&nodes[i].name)
            .iter()
            .flatten()
            .filter_map(|target| graph.position_of(target))
            .collect();
        // Reversed so the first declared output is explored first.
        stack.extend(next.into_iter().rev());
    }
    order
}

/// One-line description of what a node does.
pub fn describe_node(node: &Node, catalog: &ServiceCatalog) -> String {
    let lower = node.node_type.to_lowercase();
    let token = ServiceCatalog::normalize(&node.node_type);
    let token_lower = token.to_lowercase();

    let kind = RULES.iter().find_map(|(key, kind)| {
        let hit = match key {
            Key::Contains(fragments) => fragments.iter().any(|f| lower.contains(f)),
            Key::Token(t) => token_lower == *t,
        };
        hit.then_some(*kind)
    });

    let Some(kind) = kind else {
        let service = catalog
            .display_name(&token)
            .unwrap_or_else(|| "an external".to_string());
        return format!("Integrates with {service} service to process data");
    };

    match kind {
        StepKind::Webhook => "Receives incoming webhook requests to trigger the workflow".into(),
        StepKind::Schedule => "Runs on a scheduled basis to trigger the workflow automatically".into(),
        StepKind::Manual => "Manual trigger to start the workflow execution".into(),
        StepKind::Http => {
            let method = param(node, "method")
                .or_else(|| param(node, "requestMethod"))
                .unwrap_or("GET");
            match param(node, "url") {
                Some(url) => format!("Makes {method} HTTP request to {url}"),
                None => format!("Makes {method} HTTP request"),
            }
        }
        StepKind::Set => "Sets and transforms data values for use in subsequent steps".into(),
        StepKind::Conditional => "Evaluates conditions to determine workflow path".into(),
        StepKind::Switch => "Routes workflow execution based on multiple conditions".into(),
        StepKind::Code => "Executes custom JavaScript code for data processing".into(),
        StepKind::Merge => "Combines data from multiple workflow branches".into(),
        StepKind::Split => "Splits data into multiple items for parallel processing".into(),
        StepKind::Filter => "Filters data based on specified conditions".into(),
        StepKind::Gmail => {
            format!("Performs Gmail {} operation", param(node, "operation").unwrap_or("send"))
        }
        StepKind::Slack => "Sends message or performs action in Slack".into(),
        StepKind::Discord => "Sends message or performs action in Discord".into(),
        StepKind::Telegram => "Sends message or performs action in Telegram".into(),
        StepKind::Airtable => format!(
            "Performs Airtable {} operation on records",
            param(node, "operation").unwrap_or("create")
        ),
        StepKind::GoogleSheets => "Reads from or writes to Google Sheets".into(),
        StepKind::GoogleDrive => "Manages files in Google Drive".into(),
        StepKind::GoogleCalendar => "Manages Google Calendar events".into(),
        StepKind::Google => format!("Integrates with {} service", service_name(catalog, &token)),
        StepKind::Outlook => "Manages Microsoft Outlook emails".into(),
        StepKind::Excel => "Works with Microsoft Excel files".into(),
        StepKind::Microsoft => format!("Integrates with {} service", service_name(catalog, &token)),
        StepKind::OpenAi => "Processes data using OpenAI AI models".into(),
        StepKind::Anthropic => "Processes data using Anthropic Claude AI".into(),
        StepKind::Notion => "Reads or updates pages and databases in Notion".into(),
        StepKind::Github => "Performs GitHub repository operations".into(),
        StepKind::Database => "Executes database operations".into(),
        StepKind::Wait => "Pauses workflow execution for specified duration".into(),
        StepKind::Error => "Handles errors and stops workflow execution".into(),
    }
}

fn service_name(catalog: &ServiceCatalog, token: &str) -> String {
    catalog
        .display_name(token)
        .unwrap_or_else(|| token.to_string())
}

fn param<'a>(node: &'a Node, key: &str) -> Option<&'a str> {
    node.parameters
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

//! Template-driven workflow descriptions.
//!
//! The summary is a pure function of (name, trigger type, integration set,
//! node count): no randomness, no dependence on iteration order.

use std::collections::BTreeSet;

use flowindex_shared::TriggerType;

/// Integration count above which the summary also states the service count.
const MANY_INTEGRATIONS: usize = 3;

/// Maximum number of integrations named in the summary.
const NAMED_INTEGRATIONS: usize = 3;

/// Purpose keyword groups, checked in order against the words of the name.
const PURPOSES: &[(&[&str], &str)] = &[
    (&["create", "add", "new", "generate", "build"], " to create new records"),
    (&["update", "modify", "change", "edit", "patch"], " to update existing data"),
    (&["sync", "synchronize", "mirror", "replicate"], " to synchronize data"),
    (
        &["send", "email", "message", "notify", "notification", "alert"],
        " for notifications and alerts",
    ),
    (&["import", "load", "fetch", "get", "retrieve"], " to import data"),
    (&["export", "save", "backup", "archive"], " for data export and backup"),
    (&["monitor", "check", "watch", "track", "status"], " for monitoring and reporting"),
    (&["process", "transform", "convert", "parse"], " to process and transform data"),
    (&["automate", "automation", "workflow", "bot"], " to automate routine tasks"),
];

const DEFAULT_PURPOSE: &str = " for data processing";

/// Inflections accepted after a purpose keyword (`alerts`, `syncing`, `created`).
const SUFFIXES: &[&str] = &["", "s", "es", "d", "ed", "ing", "ion", "ions", "er", "ers", "r", "rs"];

/// Build the one-paragraph summary of a workflow.
pub fn synthesize_description(
    name: &str,
    trigger: TriggerType,
    integrations: &BTreeSet<String>,
    node_count: usize,
) -> String {
    let mut desc = String::from(match trigger {
        TriggerType::Webhook => "Webhook-triggered automation that",
        TriggerType::Scheduled => "Scheduled automation that",
        TriggerType::Complex => "Complex multi-step automation that",
        TriggerType::Manual => "Manual workflow that",
    });

    let named: Vec<&str> = integrations
        .iter()
        .take(NAMED_INTEGRATIONS)
        .map(String::as_str)
        .collect();
    match named.as_slice() {
        [] => {}
        [one] => desc.push_str(&format!(" integrates with {one}")),
        [a, b] => desc.push_str(&format!(" connects {a} and {b}")),
        [head @ .., last] => {
            desc.push_str(&format!(" orchestrates {}, and {last}", head.join(", ")));
        }
    }

    desc.push_str(purpose_clause(name));

    let noun = if node_count == 1 { "node" } else { "nodes" };
    desc.push_str(&format!(". Uses {node_count} {noun}"));
    if integrations.len() > MANY_INTEGRATIONS {
        desc.push_str(&format!(
            " and integrates with {} services",
            integrations.len()
        ));
    }
    desc.push('.');
    desc
}

/// Pick the purpose clause from the first keyword group matching the name.
pub fn purpose_clause(name: &str) -> &'static str {
    let words = words(name);
    PURPOSES
        .iter()
        .find(|(keywords, _)| {
            words
                .iter()
                .any(|word| keywords.iter().any(|kw| inflection_of(word, kw)))
        })
        .map_or(DEFAULT_PURPOSE, |(_, clause)| clause)
}

fn inflection_of(word: &str, keyword: &str) -> bool {
    word.strip_prefix(keyword)
        .is_some_and(|rest| SUFFIXES.contains(&rest))
}

/// Lowercased words of a display name, splitting on punctuation and camelCase.
fn words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_integration_phrase() {
        let desc = synthesize_description(
            "Slack alert on new lead",
            TriggerType::Webhook,
            &set(&["Slack"]),
            3,
        );
        assert_eq!(
            desc,
            "Webhook-triggered automation that integrates with Slack to create new records. Uses 3 nodes."
        );
    }

    #[test]
    fn dual_and_plural_phrases() {
        let dual = synthesize_description("Sync", TriggerType::Scheduled, &set(&["Airtable", "Notion"]), 4);
        assert_eq!(
            dual,
            "Scheduled automation that connects Airtable and Notion to synchronize data. Uses 4 nodes."
        );

        let plural = synthesize_description(
            "Nightly report",
            TriggerType::Complex,
            &set(&["Gmail", "HTTP", "Slack", "Stripe", "Zoom"]),
            14,
        );
        assert_eq!(
            plural,
            "Complex multi-step automation that orchestrates Gmail, HTTP, and Slack for data processing. \
             Uses 14 nodes and integrates with 5 services."
        );
    }

    #[test]
    fn no_integrations_and_single_node() {
        let desc = synthesize_description("", TriggerType::Manual, &BTreeSet::new(), 1);
        assert_eq!(desc, "Manual workflow that for data processing. Uses 1 node.");
    }

    #[test]
    fn purpose_groups_in_order() {
        assert_eq!(purpose_clause("Create and update contacts"), " to create new records");
        assert_eq!(purpose_clause("UpdateDeals"), " to update existing data");
        assert_eq!(purpose_clause("Syncing CRM"), " to synchronize data");
        assert_eq!(purpose_clause("Error alerts"), " for notifications and alerts");
        assert_eq!(purpose_clause("Get weather"), " to import data");
        assert_eq!(purpose_clause("Backup n8n"), " for data export and backup");
        assert_eq!(purpose_clause("Track orders"), " for monitoring and reporting");
        assert_eq!(purpose_clause("Parse invoices"), " to process and transform data");
        assert_eq!(purpose_clause("Telegram bot"), " to automate routine tasks");
        assert_eq!(purpose_clause("Lorem ipsum"), " for data processing");
    }

    #[test]
    fn keywords_match_words_not_substrings() {
        // "address" must not read as "add", "target" must not read as "get".
        assert_eq!(purpose_clause("Address target list"), " for data processing");
    }

    #[test]
    fn description_is_deterministic() {
        let integrations = set(&["Stripe", "Gmail", "Slack", "HTTP"]);
        let a = synthesize_description("Invoice", TriggerType::Webhook, &integrations, 9);
        let b = synthesize_description("Invoice", TriggerType::Webhook, &integrations.clone(), 9);
        assert_eq!(a, b);
    }
}

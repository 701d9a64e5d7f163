//! Coarse domain categories for integrations and workflows.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use flowindex_shared::{FlowIndexError, Result, WorkflowRecord};

/// Label used for workflows no rule matches.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Shortest filename token considered for partial matching.
const MIN_PARTIAL_TOKEN: usize = 3;

const BUILTIN_CATEGORIES: &[(&str, &str)] = &[
    ("ai agent", "AI Agent Development"),
    ("anthropic", "AI Agent Development"),
    ("openai", "AI Agent Development"),
    ("airtable", "Data Processing & Analysis"),
    ("baserow", "Data Processing & Analysis"),
    ("google sheets", "Data Processing & Analysis"),
    ("microsoft excel", "Data Processing & Analysis"),
    ("spreadsheet file", "Data Processing & Analysis"),
    ("mongodb", "Data Processing & Analysis"),
    ("mysql", "Data Processing & Analysis"),
    ("postgresql", "Data Processing & Analysis"),
    ("redis", "Data Processing & Analysis"),
    ("supabase", "Data Processing & Analysis"),
    ("discord", "Communication & Messaging"),
    ("email", "Communication & Messaging"),
    ("gmail", "Communication & Messaging"),
    ("mattermost", "Communication & Messaging"),
    ("microsoft outlook", "Communication & Messaging"),
    ("microsoft teams", "Communication & Messaging"),
    ("slack", "Communication & Messaging"),
    ("telegram", "Communication & Messaging"),
    ("twilio", "Communication & Messaging"),
    ("whatsapp", "Communication & Messaging"),
    ("dropbox", "Cloud Storage & File Management"),
    ("google drive", "Cloud Storage & File Management"),
    ("onedrive", "Cloud Storage & File Management"),
    ("aws s3", "Cloud Storage & File Management"),
    ("ftp", "Cloud Storage & File Management"),
    ("github", "Technical Infrastructure & DevOps"),
    ("gitlab", "Technical Infrastructure & DevOps"),
    ("ssh", "Technical Infrastructure & DevOps"),
    ("aws", "Technical Infrastructure & DevOps"),
    ("azure", "Technical Infrastructure & DevOps"),
    ("google cloud", "Technical Infrastructure & DevOps"),
    ("asana", "Project Management"),
    ("clickup", "Project Management"),
    ("jira", "Project Management"),
    ("monday.com", "Project Management"),
    ("notion", "Project Management"),
    ("todoist", "Project Management"),
    ("trello", "Project Management"),
    ("hubspot", "CRM & Sales"),
    ("pipedrive", "CRM & Sales"),
    ("salesforce", "CRM & Sales"),
    ("zoho crm", "CRM & Sales"),
    ("mailchimp", "Marketing & Advertising Automation"),
    ("sendgrid", "Marketing & Advertising Automation"),
    ("facebook", "Social Media Management"),
    ("linkedin", "Social Media Management"),
    ("twitter", "Social Media Management"),
    ("youtube", "Social Media Management"),
    ("paypal", "Financial & Accounting"),
    ("quickbooks", "Financial & Accounting"),
    ("stripe", "Financial & Accounting"),
    ("shopify", "E-commerce & Retail"),
    ("woocommerce", "E-commerce & Retail"),
    ("calendly", "Business Process Automation"),
    ("google calendar", "Business Process Automation"),
    ("typeform", "Business Process Automation"),
    ("zoom", "Business Process Automation"),
    ("http", "Web Scraping & Data Extraction"),
    ("html", "Web Scraping & Data Extraction"),
    ("rss", "Web Scraping & Data Extraction"),
    ("wordpress", "Creative Content & Video Automation"),
];

/// One `integration → category` entry of a definitions file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub integration: String,
    pub category: String,
}

/// Static lookup of integration names to domain categories.
#[derive(Debug, Clone)]
pub struct CategoryMapper {
    /// Lowercased integration → category, sorted so partial matching is stable.
    table: BTreeMap<String, String>,
}

impl Default for CategoryMapper {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryMapper {
    pub fn builtin() -> Self {
        Self {
            table: BUILTIN_CATEGORIES
                .iter()
                .map(|(integration, category)| (integration.to_string(), category.to_string()))
                .collect(),
        }
    }

    /// Merge definitions over the current table; later entries win.
    pub fn with_definitions(mut self, definitions: impl IntoIterator<Item = CategoryDefinition>) -> Self {
        for def in definitions {
            let key = def.integration.trim().to_lowercase();
            if !key.is_empty() {
                self.table.insert(key, def.category);
            }
        }
        self
    }

    /// Built-in table extended by the JSON definitions file at `path`.
    pub fn from_definitions_file(path: &Path) -> Result<Self> {
        Ok(Self::builtin().with_definitions(load_definitions(path)?))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Exact, case-insensitive lookup of one integration name.
    pub fn category_for(&self, integration: &str) -> Option<&str> {
        self.table
            .get(&integration.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Category guessed from the tokens of a filename such as `0042_Slack_Stripe_Create.json`.
    ///
    /// Exact token matches are tried first, in token order. Then a token and an
    /// integration key may contain one another.
    pub fn category_for_filename(&self, filename: &str) -> Option<&str> {
        let tokens = filename_tokens(filename);

        if let Some(category) = tokens.iter().find_map(|t| self.table.get(t)) {
            return Some(category);
        }

        tokens
            .iter()
            .filter(|t| t.len() >= MIN_PARTIAL_TOKEN && !t.chars().all(|c| c.is_ascii_digit()))
            .find_map(|token| {
                self.table
                    .iter()
                    .find(|(key, _)| {
                        key.len() >= MIN_PARTIAL_TOKEN
                            && (key.contains(token.as_str()) || token.contains(key.as_str()))
                    })
                    .map(|(_, category)| category.as_str())
            })
    }

    /// Category of a workflow: its first categorized integration, else its filename.
    pub fn categorize<'a>(&'a self, record: &WorkflowRecord) -> Option<&'a str> {
        record
            .integrations
            .iter()
            .find_map(|i| self.category_for(i))
            .or_else(|| self.category_for_filename(&record.filename))
    }

    /// Workflow count per category: descending count, then name, `Uncategorized` last.
    pub fn tally<'r>(&self, records: impl IntoIterator<Item = &'r WorkflowRecord>) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut uncategorized = 0;
        for record in records {
            match self.categorize(record) {
                Some(category) => *counts.entry(category).or_default() += 1,
                None => uncategorized += 1,
            }
        }

        let mut rows: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(category, n)| (category.to_string(), n))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if uncategorized > 0 {
            rows.push((UNCATEGORIZED.to_string(), uncategorized));
        }
        rows
    }
}

/// Read a JSON array of [`CategoryDefinition`]s.
pub fn load_definitions(path: &Path) -> Result<Vec<CategoryDefinition>> {
    let raw = std::fs::read_to_string(path).map_err(|e| FlowIndexError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| {
        FlowIndexError::config(format!(
            "invalid category definitions in {}: {e}",
            path.display()
        ))
    })
}

fn filename_tokens(filename: &str) -> Vec<String> {
    let stem = filename.strip_suffix(".json").unwrap_or(filename);
    stem.split('_')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

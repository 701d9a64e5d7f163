//! Service identifier normalization and the curated display-name table.
//!
//! A [`ServiceCatalog`] is built once at start-up (built-in table plus any
//! configured overrides) and shared read-only by the analyzer.

use std::collections::HashMap;

/// Curated `service identifier → display name` table.
const BUILTIN_SERVICES: &[(&str, &str)] = &[
    ("httpRequest", "HTTP"),
    ("graphql", "GraphQL"),
    ("gmail", "Gmail"),
    ("emailSend", "Email"),
    ("emailReadImap", "Email (IMAP)"),
    ("slack", "Slack"),
    ("discord", "Discord"),
    ("telegram", "Telegram"),
    ("mattermost", "Mattermost"),
    ("microsoftTeams", "Microsoft Teams"),
    ("microsoftOutlook", "Microsoft Outlook"),
    ("microsoftExcel", "Microsoft Excel"),
    ("microsoftOneDrive", "OneDrive"),
    ("onedrive", "OneDrive"),
    ("twilio", "Twilio"),
    ("whatsApp", "WhatsApp"),
    ("googleSheets", "Google Sheets"),
    ("googleDrive", "Google Drive"),
    ("googleCalendar", "Google Calendar"),
    ("googleDocs", "Google Docs"),
    ("googleCloud", "Google Cloud"),
    ("airtable", "Airtable"),
    ("notion", "Notion"),
    ("baserow", "Baserow"),
    ("postgres", "PostgreSQL"),
    ("mySql", "MySQL"),
    ("mongoDb", "MongoDB"),
    ("redis", "Redis"),
    ("supabase", "Supabase"),
    ("dropbox", "Dropbox"),
    ("awsS3", "AWS S3"),
    ("aws", "AWS"),
    ("azure", "Azure"),
    ("ftp", "FTP"),
    ("ssh", "SSH"),
    ("github", "GitHub"),
    ("gitlab", "GitLab"),
    ("jira", "Jira"),
    ("trello", "Trello"),
    ("asana", "Asana"),
    ("clickUp", "ClickUp"),
    ("mondayCom", "monday.com"),
    ("todoist", "Todoist"),
    ("hubspot", "HubSpot"),
    ("salesforce", "Salesforce"),
    ("pipedrive", "Pipedrive"),
    ("zohoCrm", "Zoho CRM"),
    ("mailchimp", "Mailchimp"),
    ("sendGrid", "SendGrid"),
    ("stripe", "Stripe"),
    ("paypal", "PayPal"),
    ("shopify", "Shopify"),
    ("wooCommerce", "WooCommerce"),
    ("quickbooks", "QuickBooks"),
    ("calendly", "Calendly"),
    ("zoom", "Zoom"),
    ("typeform", "Typeform"),
    ("twitter", "Twitter"),
    ("linkedIn", "LinkedIn"),
    ("facebookGraphApi", "Facebook"),
    ("youTube", "YouTube"),
    ("rssFeedRead", "RSS"),
    ("openAi", "OpenAI"),
    ("lmChatOpenAi", "OpenAI"),
    ("lmChatAnthropic", "Anthropic"),
    ("anthropic", "Anthropic"),
    ("agent", "AI Agent"),
    ("wordpress", "WordPress"),
    ("spreadsheetFile", "Spreadsheet File"),
    ("readBinaryFile", "Binary File"),
    ("writeBinaryFile", "Binary File"),
    ("html", "HTML"),
    ("xml", "XML"),
];

/// Control-flow and utility node kinds, never counted as integrations.
const UTILITY_NODES: &[&str] = &[
    "set",
    "if",
    "switch",
    "merge",
    "splitInBatches",
    "splitOut",
    "filter",
    "stickyNote",
    "noOp",
    "code",
    "function",
    "functionItem",
    "wait",
    "stopAndError",
    "itemLists",
    "aggregate",
    "summarize",
    "sort",
    "limit",
    "removeDuplicates",
    "renameKeys",
    "dateTime",
    "crypto",
    "compareDatasets",
    "moveBinaryData",
    "convertToFile",
    "extractFromFile",
];

/// Trigger-category node kinds; they start a workflow rather than call a service.
const TRIGGER_NODES: &[&str] = &[
    "webhook",
    "respondToWebhook",
    "cron",
    "schedule",
    "interval",
    "manual",
    "start",
    "error",
    "executeWorkflow",
    "form",
];

/// Immutable lookup of service display names and excluded node kinds.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    /// Lowercased identifier → display name.
    names: HashMap<String, String>,
    /// Lowercased identifiers that never count as integrations.
    excluded: HashMap<String, ExclusionKind>,
}

/// Why a node kind is excluded from the integration set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionKind {
    Utility,
    Trigger,
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ServiceCatalog {
    /// The built-in table.
    pub fn builtin() -> Self {
        let names = BUILTIN_SERVICES
            .iter()
            .map(|(id, display)| (id.to_lowercase(), (*display).to_string()))
            .collect();

        let excluded = UTILITY_NODES
            .iter()
            .map(|id| (id.to_lowercase(), ExclusionKind::Utility))
            .chain(
                TRIGGER_NODES
                    .iter()
                    .map(|id| (id.to_lowercase(), ExclusionKind::Trigger)),
            )
            .collect();

        Self { names, excluded }
    }

    /// Add or replace display names (e.g. from the `[services]` config table).
    pub fn with_overrides<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (id, display) in entries {
            self.names.insert(id.as_ref().to_lowercase(), display.into());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Strip the namespace prefix and any `trigger` fragment from a node type.
    ///
    /// `n8n-nodes-base.googleSheetsTrigger` → `googleSheets`.
    pub fn normalize(node_type: &str) -> String {
        let token = node_type.rsplit('.').next().unwrap_or(node_type);
        token.replace("Trigger", "").replace("trigger", "")
    }

    pub fn exclusion(&self, token: &str) -> Option<ExclusionKind> {
        self.excluded.get(&token.to_lowercase()).copied()
    }

    pub fn is_excluded(&self, token: &str) -> bool {
        self.exclusion(token).is_some()
    }

    /// Curated name for a normalized token, if any.
    pub fn mapped_name(&self, token: &str) -> Option<&str> {
        self.names.get(&token.to_lowercase()).map(String::as_str)
    }

    /// Curated name, or a title-cased rendering for plausible identifiers.
    pub fn display_name(&self, token: &str) -> Option<String> {
        if let Some(name) = self.mapped_name(token) {
            return Some(name.to_string());
        }
        is_plausible_identifier(token).then(|| title_case(token))
    }

    /// The integration a node of this type contributes, if any.
    ///
    /// Excluded kinds are filtered before the table lookup, so a configured
    /// mapping can never pull a utility node into the set.
    pub fn integration_for(&self, node_type: &str) -> Option<String> {
        let token = Self::normalize(node_type);
        if token.is_empty() || self.is_excluded(&token) {
            return None;
        }
        self.display_name(&token)
    }
}

fn is_plausible_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric())
}

/// `activeCampaign` → `Active Campaign`, `awsS3` → `Aws S3`.
pub fn title_case(token: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for c in token.chars() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        let boundary = prev.is_some_and(|p| {
            c.is_ascii_uppercase() && (p.is_ascii_lowercase() || p.is_ascii_digit())
        });
        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
        prev = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_ascii_uppercase(), chars.as_str()),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

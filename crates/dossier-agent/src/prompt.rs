use crate::intent::Intent;
use serde::{Deserialize, Serialize};

/// One task as sent to the upstream agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub prompt: String,
    pub model: String,
    pub tools_enabled: bool,
    pub intent: Intent,
}

const CONVERSATIONAL_TEMPLATE: &str = "\
You are Dossier, a friendly assistant that writes background profiles of people.
Reply to the user's message briefly and naturally, in one or two sentences.
Answer directly from what you already know. If the user seems to want a profile,
invite them to send the full name of the person they are interested in.

User message: {query}";

const RESEARCH_TEMPLATE: &str = "\
You are Dossier, a research assistant that compiles verified background profiles of people.

Research the following person: {query}

Use the firecrawl_search tool to find sources about them, and the firecrawl_scrape
tool to read the most relevant pages. Prefer primary sources (official bios,
company pages, reputable news) and cross-check facts that appear only once.

Do not narrate your process or announce your next step. Write nothing until your
research is finished, then reply with the final verified summary only, in Markdown
with these sections:

## Summary
## Current Role
## Career History
## Education
## Public Presence
## Sources

Under each heading use short bullet points. Leave out anything you could not
verify, and say so plainly if a section has no verified information.";

/// Builds the task for `query` according to its classified intent.
///
/// Conversational tasks run with tools disabled and a prompt that never
/// mentions them.
pub fn build_task(query: &str, intent: Intent, model: &str) -> TaskRequest {
    let query = query.trim();
    let (template, tools_enabled) = match intent {
        Intent::Research => (RESEARCH_TEMPLATE, true),
        Intent::Conversational => (CONVERSATIONAL_TEMPLATE, false),
    };
    TaskRequest {
        prompt: template.replace("{query}", query),
        model: model.to_string(),
        tools_enabled,
        intent,
    }
}

use serde_json::Value;

const QUERY_PREVIEW_CHARS: usize = 30;

/// Friendly labels for tool identifiers the research agent is known to use.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("firecrawl_search", "Web Search"),
    ("firecrawl_scrape", "Reading Page"),
    ("firecrawl_crawl", "Crawling Site"),
    ("firecrawl_map", "Mapping Site"),
    ("firecrawl_extract", "Extracting Data"),
    ("firecrawl_deep_research", "Deep Research"),
    ("web_search", "Web Search"),
    ("web_fetch", "Reading Page"),
    ("fetch", "Reading Page"),
    ("search", "Search"),
];

/// Labels for well-known sites, keyed by the first DNS label of the host.
const SITE_NAMES: &[(&str, &str)] = &[
    ("linkedin", "LinkedIn"),
    ("github", "GitHub"),
    ("wikipedia", "Wikipedia"),
    ("twitter", "Twitter"),
    ("x", "X"),
    ("youtube", "YouTube"),
    ("facebook", "Facebook"),
    ("instagram", "Instagram"),
    ("crunchbase", "Crunchbase"),
    ("bloomberg", "Bloomberg"),
    ("nytimes", "NY Times"),
    ("wsj", "WSJ"),
    ("reuters", "Reuters"),
    ("forbes", "Forbes"),
    ("techcrunch", "TechCrunch"),
    ("medium", "Medium"),
    ("reddit", "Reddit"),
    ("imdb", "IMDb"),
    ("scholar", "Google Scholar"),
];

/// Ordered error triggers; the first group with a matching substring wins.
const ERROR_RULES: &[(&[&str], &str)] = &[
    (
        &["unsupported", "not supported", "does not support"],
        "This source isn't supported. Trying another one...",
    ),
    (
        &["validation", "invalid param", "invalid argument", "parameter"],
        "Adjusting search parameters. Retrying...",
    ),
    (
        &["timeout", "timed out", "deadline exceeded"],
        "The request took too long. Retrying...",
    ),
    (
        &["rate limit", "ratelimit", "too many requests", "429"],
        "Rate limited by the source. Retrying shortly...",
    ),
    (
        &["not found", "404"],
        "Page not found. Trying another source...",
    ),
    (
        &["forbidden", "403"],
        "Access blocked by the site. Trying another source...",
    ),
    (
        &["unauthorized", "401"],
        "Access denied by the site. Trying another source...",
    ),
];

const DEFAULT_ERROR: &str = "The tool ran into a problem. Trying another approach...";

/// Friendly label for a raw tool identifier.
///
/// Unknown names lose any namespace prefix (`mcp__server__tool`,
/// `server:tool`, `server/tool`) and have underscores turned into spaces.
pub fn tool_display_name(name: &str) -> String {
    if let Some((_, label)) = DISPLAY_NAMES.iter().find(|(raw, _)| *raw == name) {
        return (*label).to_string();
    }

    let base = strip_namespace(name);
    if let Some((_, label)) = DISPLAY_NAMES.iter().find(|(raw, _)| *raw == base) {
        return (*label).to_string();
    }
    base.replace('_', " ")
}

fn strip_namespace(name: &str) -> &str {
    let after_dunder = name.rsplit("__").next().unwrap_or(name);
    after_dunder
        .rsplit([':', '/'])
        .next()
        .unwrap_or(after_dunder)
}

/// Short summary of a tool's input: the search query for search tools, the
/// site name for fetch/crawl tools. Empty when the input cannot be parsed or
/// carries nothing worth showing.
pub fn extract_tool_detail(name: &str, raw_input: &str) -> String {
    let Ok(input) = serde_json::from_str::<Value>(raw_input) else {
        return String::new();
    };
    let lower = strip_namespace(name).to_lowercase();

    if lower.contains("search") {
        return input
            .get("query")
            .and_then(Value::as_str)
            .map(|q| truncate_chars(q.trim(), QUERY_PREVIEW_CHARS))
            .unwrap_or_default();
    }

    if ["fetch", "crawl", "scrape", "map", "extract", "read"]
        .iter()
        .any(|k| lower.contains(k))
    {
        let url = input.get("url").and_then(Value::as_str).or_else(|| {
            input
                .get("urls")
                .and_then(Value::as_array)
                .and_then(|urls| urls.first())
                .and_then(Value::as_str)
        });
        return url.and_then(site_label).unwrap_or_default();
    }

    String::new()
}

/// `"{display}: {detail}"`, or just the display name when there is no detail.
pub fn build_tool_display_with_detail(name: &str, raw_input: &str) -> String {
    let display = tool_display_name(name);
    let detail = extract_tool_detail(name, raw_input);
    if detail.is_empty() {
        display
    } else {
        format!("{display}: {detail}")
    }
}

/// Maps raw tool exception text to a short message suitable for end users.
pub fn simplify_tool_error(raw: &str) -> String {
    let lower = raw.to_lowercase();
    ERROR_RULES
        .iter()
        .find(|(triggers, _)| triggers.iter().any(|t| lower.contains(t)))
        .map_or(DEFAULT_ERROR, |(_, message)| *message)
        .to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{}...", head.trim_end())
}

fn site_label(raw_url: &str) -> Option<String> {
    let parsed = url::Url::parse(raw_url.trim())
        .or_else(|_| url::Url::parse(&format!("https://{}", raw_url.trim())))
        .ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let label = host.split('.').next().filter(|l| !l.is_empty())?;

    if let Some((_, pretty)) = SITE_NAMES.iter().find(|(key, _)| *key == label) {
        return Some((*pretty).to_string());
    }
    Some(capitalize(label))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

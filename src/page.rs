use anyhow::{anyhow, Result};
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::validate::{validate_job_posting, ValidationReport};

#[derive(Debug, Clone, Serialize)]
pub struct PostingReport {
    pub title: Option<String>,
    pub report: ValidationReport,
}

#[derive(Debug, Default, Serialize)]
pub struct PageReport {
    /// Number of `application/ld+json` blocks on the page.
    pub blocks: usize,
    /// Blocks that were not valid JSON.
    pub parse_errors: Vec<String>,
    pub postings: Vec<PostingReport>,
}

impl PageReport {
    pub fn all_valid(&self) -> bool {
        self.parse_errors.is_empty() && self.postings.iter().all(|p| p.report.valid)
    }
}

pub struct JsonLdBlocks {
    pub count: usize,
    pub values: Vec<Value>,
    pub errors: Vec<String>,
}

/// Pull every JSON-LD payload out of an HTML document.
///
/// Arrays and `@graph` containers are flattened into their entries.
/// Unparseable blocks are reported, not fatal.
pub fn extract_json_ld(html: &str) -> Result<JsonLdBlocks> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script[type='application/ld+json']")
        .map_err(|e| anyhow!("Invalid JSON-LD selector: {:?}", e))?;

    let mut blocks = JsonLdBlocks {
        count: 0,
        values: Vec::new(),
        errors: Vec::new(),
    };

    for (i, element) in document.select(&selector).enumerate() {
        blocks.count += 1;
        let text = element.text().collect::<String>();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(value) => flatten_into(value, &mut blocks.values),
            Err(e) => {
                warn!(block = i + 1, error = %e, "skipping unparseable JSON-LD block");
                blocks.errors.push(format!("Block {}: {}", i + 1, e));
            }
        }
    }

    debug!(blocks = blocks.count, values = blocks.values.len(), "extracted JSON-LD");
    Ok(blocks)
}

fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Object(mut map) if map.contains_key("@graph") => {
            if let Some(graph) = map.remove("@graph") {
                flatten_into(graph, out);
            }
        }
        other => out.push(other),
    }
}

pub fn is_job_posting(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(kind)) => kind == "JobPosting",
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some("JobPosting")),
        _ => false,
    }
}

/// Validate every `JobPosting` embedded in a page.
pub fn inspect_page(html: &str) -> Result<PageReport> {
    let blocks = extract_json_ld(html)?;

    let postings = blocks
        .values
        .iter()
        .filter(|value| is_job_posting(value))
        .map(|value| PostingReport {
            title: value.get("title").and_then(Value::as_str).map(str::to_string),
            report: validate_job_posting(value),
        })
        .collect();

    Ok(PageReport {
        blocks: blocks.count,
        parse_errors: blocks.errors,
        postings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::head::Head;
    use crate::models::sample_job;
    use crate::structured_data::{build_breadcrumb_list, build_job_posting, breadcrumb_trail};

    #[test]
    fn test_extract_json_ld_flattens_graph_and_arrays() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type": "WebSite", "name": "x"}</script>
            <script type="application/ld+json">[{"@type": "Organization"}, {"@type": "JobPosting"}]</script>
            <script type="application/ld+json">{"@context": "https://schema.org", "@graph": [{"@type": "Place"}]}</script>
            <script type="text/javascript">var x = 1;</script>
        </head><body></body></html>"#;

        let blocks = extract_json_ld(html).unwrap();
        assert_eq!(blocks.count, 3);
        assert!(blocks.errors.is_empty());
        let kinds: Vec<_> = blocks.values.iter().map(|v| v["@type"].as_str().unwrap()).collect();
        assert_eq!(kinds, vec!["WebSite", "Organization", "JobPosting", "Place"]);
    }

    #[test]
    fn test_extract_json_ld_reports_bad_blocks() {
        let html = r#"<script type="application/ld+json">{not json</script>
            <script type="application/ld+json">{"@type": "JobPosting"}</script>"#;
        let blocks = extract_json_ld(html).unwrap();
        assert_eq!(blocks.count, 2);
        assert_eq!(blocks.errors.len(), 1);
        assert!(blocks.errors[0].starts_with("Block 1:"));
        assert_eq!(blocks.values.len(), 1);
    }

    #[test]
    fn test_is_job_posting() {
        assert!(is_job_posting(&serde_json::json!({"@type": "JobPosting"})));
        assert!(is_job_posting(&serde_json::json!({"@type": ["Thing", "JobPosting"]})));
        assert!(!is_job_posting(&serde_json::json!({"@type": "BreadcrumbList"})));
        assert!(!is_job_posting(&serde_json::json!({"title": "x"})));
    }

    #[test]
    fn test_inspect_page_validates_rendered_head() {
        let config = SiteConfig::default();
        let job = sample_job();
        let mut head = Head::new();
        let _posting = head
            .attach("job-posting-42", &build_job_posting(&job, &config))
            .unwrap();
        let trail = breadcrumb_trail(&job.title, job.sector.as_deref(), true);
        let _crumbs = head
            .attach("breadcrumbs", &build_breadcrumb_list(&trail, &config))
            .unwrap();

        let html = format!("<html><head>{}</head><body></body></html>", head.render());
        let report = inspect_page(&html).unwrap();

        assert_eq!(report.blocks, 2);
        assert_eq!(report.postings.len(), 1);
        let posting = &report.postings[0];
        assert_eq!(posting.title.as_deref(), Some("Senior Program Officer"));
        assert!(posting.report.valid, "{:?}", posting.report.errors);
        assert!(report.all_valid());
    }

    #[test]
    fn test_inspect_page_flags_invalid_posting() {
        let html = r#"<script type="application/ld+json">
            {"@type": "JobPosting", "title": "Driver", "datePosted": "yesterday"}
        </script>"#;
        let report = inspect_page(html).unwrap();
        assert_eq!(report.postings.len(), 1);
        assert!(!report.postings[0].report.valid);
        assert!(!report.all_valid());
    }
}

//! JSON-LD `<script>` elements in a page head, keyed by marker.
//!
//! Attaching replaces any element with the same marker, so re-rendering
//! never accumulates duplicates. Each attach returns a handle; detaching a
//! handle removes only the element that handle created.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::meta::escape_xml;

pub const MARKER_ATTRIBUTE: &str = "data-schema-marker";

#[derive(Debug, Clone)]
struct MetadataElement {
    marker: String,
    generation: u64,
    json: String,
}

#[derive(Debug, Default)]
pub struct Head {
    elements: Vec<MetadataElement>,
    next_generation: u64,
}

/// Proof of one attach. Stale handles (whose element was since replaced) detach nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a metadata handle must be detached when its view goes away"]
pub struct MetadataHandle {
    marker: String,
    generation: u64,
}

impl MetadataHandle {
    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl Head {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach<T: Serialize>(&mut self, marker: &str, value: &T) -> Result<MetadataHandle> {
        let json = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize structured data for '{}'", marker))?;
        // A literal "</script>" inside the payload would end the element early
        let json = json.replace('<', "\\u003c");

        let before = self.elements.len();
        self.elements.retain(|el| el.marker != marker);
        if self.elements.len() != before {
            debug!(marker, "replaced existing metadata element");
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        self.elements.push(MetadataElement {
            marker: marker.to_string(),
            generation,
            json,
        });

        Ok(MetadataHandle {
            marker: marker.to_string(),
            generation,
        })
    }

    /// Returns whether an element was removed. Idempotent.
    pub fn detach(&mut self, handle: &MetadataHandle) -> bool {
        let before = self.elements.len();
        self.elements
            .retain(|el| !(el.marker == handle.marker && el.generation == handle.generation));
        let removed = self.elements.len() != before;
        if removed {
            debug!(marker = %handle.marker, "detached metadata element");
        }
        removed
    }

    #[cfg(test)]
    pub fn contains(&self, marker: &str) -> bool {
        self.elements.iter().any(|el| el.marker == marker)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Open a view-scoped session whose attachments are detached when it drops.
    pub fn scope(&mut self) -> MetadataScope<'_> {
        MetadataScope {
            head: self,
            handles: Vec::new(),
        }
    }

    pub fn render(&self) -> String {
        self.elements
            .iter()
            .map(|el| {
                format!(
                    "<script type=\"application/ld+json\" {}=\"{}\">{}</script>\n",
                    MARKER_ATTRIBUTE,
                    escape_xml(&el.marker),
                    el.json
                )
            })
            .collect()
    }
}

/// Attachments owned by one view. Dropping the scope detaches all of them,
/// whether the view finished normally or bailed out with an error.
pub struct MetadataScope<'h> {
    head: &'h mut Head,
    handles: Vec<MetadataHandle>,
}

impl MetadataScope<'_> {
    pub fn attach<T: Serialize>(&mut self, marker: &str, value: &T) -> Result<()> {
        let handle = self.head.attach(marker, value)?;
        // An earlier handle for the same marker is stale now
        self.handles.retain(|h| h.marker() != marker);
        self.handles.push(handle);
        Ok(())
    }

    pub fn head(&self) -> &Head {
        &*self.head
    }
}

impl Drop for MetadataScope<'_> {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            self.head.detach(&handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};
    use serde_json::json;

    fn script_markers(html: &str) -> Vec<String> {
        let document = Html::parse_fragment(html);
        let selector = Selector::parse("script[type=\"application/ld+json\"]").unwrap();
        document
            .select(&selector)
            .filter_map(|el| el.value().attr(MARKER_ATTRIBUTE).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_attach_replaces_same_marker() {
        let mut head = Head::new();
        let _first = head.attach("job-posting-1", &json!({"title": "A"})).unwrap();
        let _crumbs = head.attach("breadcrumbs", &json!({"n": 1})).unwrap();
        let _again = head.attach("job-posting-1", &json!({"title": "B"})).unwrap();

        assert_eq!(head.len(), 2);
        let html = head.render();
        assert_eq!(script_markers(&html), vec!["breadcrumbs", "job-posting-1"]);
        assert!(html.contains("\"title\":\"B\""));
        assert!(!html.contains("\"title\":\"A\""));
    }

    #[test]
    fn test_stale_handle_does_not_remove_replacement() {
        let mut head = Head::new();
        let old = head.attach("breadcrumbs", &json!([1])).unwrap();
        let new = head.attach("breadcrumbs", &json!([2])).unwrap();

        assert!(!head.detach(&old));
        assert!(head.contains("breadcrumbs"));
        assert!(head.detach(&new));
        assert!(!head.detach(&new));
        assert!(head.is_empty());
    }

    #[test]
    fn test_navigating_between_jobs_keeps_one_element_per_job() {
        let mut head = Head::new();
        let first = head.attach("job-posting-1", &json!({"id": 1})).unwrap();
        head.detach(&first);
        let second = head.attach("job-posting-2", &json!({"id": 2})).unwrap();
        assert_eq!(second.marker(), "job-posting-2");
        assert_eq!(script_markers(&head.render()), vec!["job-posting-2"]);
    }

    #[test]
    fn test_render_escapes_script_terminator() {
        let mut head = Head::new();
        let _h = head
            .attach("job-posting-9", &json!({"description": "</script><script>alert(1)</script>"}))
            .unwrap();
        let html = head.render();
        assert_eq!(html.matches("</script>").count(), 1);
        assert!(html.contains("\\u003c/script>"));

        // Still valid JSON that decodes to the original text
        let start = html.find('>').unwrap() + 1;
        let end = html.rfind("</script>").unwrap();
        let value: serde_json::Value = serde_json::from_str(&html[start..end]).unwrap();
        assert_eq!(value["description"], "</script><script>alert(1)</script>");
    }

    #[test]
    fn test_scope_detaches_on_drop() {
        let mut head = Head::new();
        let _site = head.attach("site", &json!({"@type": "WebSite"})).unwrap();
        {
            let mut scope = head.scope();
            scope.attach("job-posting-3", &json!({"id": 3})).unwrap();
            scope.attach("breadcrumbs", &json!([1])).unwrap();
            scope.attach("breadcrumbs", &json!([2])).unwrap();
            assert_eq!(scope.head().len(), 3);
        }
        assert_eq!(head.len(), 1);
        assert!(head.contains("site"));
    }

    #[test]
    fn test_scope_detaches_on_error_path() {
        fn render_view(head: &mut Head) -> Result<()> {
            let mut scope = head.scope();
            scope.attach("job-posting-4", &json!({"id": 4}))?;
            anyhow::bail!("render failed");
        }

        let mut head = Head::new();
        assert!(render_view(&mut head).is_err());
        assert!(head.is_empty());
    }
}

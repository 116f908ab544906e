use scraper::{Html, Selector};
use tracing::debug;

use crate::locate::{ContentLocator, compile};
use crate::normalize::normalize;

/// Heading used when a page has no usable `<title>`.
pub const NO_TITLE: &str = "No Title";

/// Returned in place of a document when extraction itself blows up.
pub const EXTRACTION_FAILURE_TEXT: &str = "Failed to process webpage content";

/// Title, description and normalized body of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredDocument {
    pub title: String,
    pub description: String,
    pub body: String,
}

impl StructuredDocument {
    pub fn render(&self) -> String {
        assemble(&self.title, &self.description, &self.body)
    }
}

/// Join the document sections with blank lines.
///
/// An empty description drops its section entirely; an empty body still emits
/// the `## Content` heading.
pub fn assemble(title: &str, description: &str, body: &str) -> String {
    let title = title.trim();
    let title = if title.is_empty() { NO_TITLE } else { title };

    let mut sections = vec![format!("# {title}")];
    let description = description.trim();
    if !description.is_empty() {
        sections.push(format!("## Description\n{description}"));
    }
    if body.is_empty() {
        sections.push("## Content".to_string());
    } else {
        sections.push(format!("## Content\n{body}"));
    }
    sections.join("\n\n")
}

pub struct PageExtractor {
    locator: ContentLocator,
    title: Option<Selector>,
    description: Option<Selector>,
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new(ContentLocator::default())
    }
}

impl PageExtractor {
    pub fn new(locator: ContentLocator) -> Self {
        Self {
            locator,
            title: compile("title"),
            description: compile("meta[name=\"description\"]"),
        }
    }

    pub fn extract(&self, html: &str) -> StructuredDocument {
        let document = Html::parse_document(html);

        let title = self
            .title
            .as_ref()
            .and_then(|sel| document.select(sel).next())
            .map(|el| collapse(&el.text().collect::<String>()))
            .unwrap_or_default();
        let description = self
            .description
            .as_ref()
            .and_then(|sel| document.select(sel).next())
            .and_then(|el| el.value().attr("content"))
            .map(collapse)
            .unwrap_or_default();

        let located = self.locator.locate(&document);
        if !located.fragment.issues.is_empty() {
            let skipped: Vec<String> = located
                .fragment
                .issues
                .iter()
                .map(ToString::to_string)
                .collect();
            debug!(target: "web.extract", count = skipped.len(), ?skipped, "subtrees skipped");
        }
        debug!(
            target: "web.extract",
            source = ?located.source,
            raw_chars = located.fragment.text.len(),
            "content rendered"
        );

        StructuredDocument {
            title,
            description,
            body: normalize(&located.fragment.text),
        }
    }
}

/// Full pipeline: parse, locate, markdownize, normalize, assemble.
pub fn extract_structured_document(html: &str) -> String {
    PageExtractor::default().extract(html).render()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! HTML subtree to markdown-like text.
//!
//! Rendering is a recursive match over [`DomNode`]. Every node render returns a
//! `Result`; a failed node contributes nothing to its parent and its cause is
//! collected into [`Fragment::issues`] so the caller can log once per page
//! instead of aborting the conversion.

use crate::dom::{DomNode, Element, ElementKind};

/// Nesting depth past which subtrees are skipped.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Why a subtree was left out of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderIssue {
    DepthExceeded { tag: String, depth: usize },
}

impl std::fmt::Display for RenderIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderIssue::DepthExceeded { tag, depth } => {
                write!(f, "<{tag}> skipped at depth {depth}")
            }
        }
    }
}

/// Rendered text plus whatever was skipped while producing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub issues: Vec<RenderIssue>,
}

#[derive(Debug, Clone, Copy)]
pub struct Markdownizer {
    max_depth: usize,
}

impl Default for Markdownizer {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Markdownizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Render `root` and its subtree.
    pub fn render(&self, root: Element<'_>) -> Fragment {
        let mut issues = Vec::new();
        let text = self
            .render_node(DomNode::Element(root), 0, &mut issues)
            .unwrap_or_else(|issue| {
                issues.push(issue);
                String::new()
            });
        Fragment { text, issues }
    }

    fn render_node(
        &self,
        node: DomNode<'_>,
        depth: usize,
        issues: &mut Vec<RenderIssue>,
    ) -> Result<String, RenderIssue> {
        let element = match node {
            DomNode::Text(text) => return Ok(render_text(text)),
            DomNode::Other => return Ok(String::new()),
            DomNode::Element(element) => element,
        };
        if depth > self.max_depth {
            return Err(RenderIssue::DepthExceeded {
                tag: element.tag().to_string(),
                depth,
            });
        }

        let rendered = match element.kind() {
            ElementKind::Image => element
                .attr("src")
                .map(|src| format!("[Image({src})] "))
                .unwrap_or_default(),
            ElementKind::Video => render_video(element),
            ElementKind::Anchor => match anchor_link(element) {
                Some(link) => link,
                None => self.render_children(element, depth, issues),
            },
            ElementKind::Block => {
                let content = self.render_children(element, depth, issues);
                if content.is_empty() {
                    content
                } else {
                    content + "\n\n"
                }
            }
            ElementKind::ListItem => {
                format!("- {}\n", self.render_children(element, depth, issues))
            }
            ElementKind::Heading(level) => format!(
                "{} {}\n\n",
                "#".repeat(usize::from(level)),
                self.render_children(element, depth, issues)
            ),
            ElementKind::LineBreak => "\n".to_string(),
            ElementKind::Suppressed => String::new(),
            ElementKind::Preformatted | ElementKind::Inline => {
                self.render_children(element, depth, issues)
            }
        };
        Ok(rendered)
    }

    fn render_children(
        &self,
        element: Element<'_>,
        depth: usize,
        issues: &mut Vec<RenderIssue>,
    ) -> String {
        let mut out = String::new();
        for child in element.children() {
            match self.render_node(child, depth + 1, issues) {
                Ok(text) => out.push_str(&text),
                Err(issue) => issues.push(issue),
            }
        }
        out
    }
}

/// Collapse whitespace runs to one space; non-empty text gets a trailing space.
fn render_text(text: &str) -> String {
    let mut words = text.split_whitespace();
    let Some(first) = words.next() else {
        return String::new();
    };
    let mut out = String::with_capacity(text.len());
    out.push_str(first);
    for word in words {
        out.push(' ');
        out.push_str(word);
    }
    out.push(' ');
    out
}

fn render_video(element: Element<'_>) -> String {
    element
        .attr("src")
        .into_iter()
        .chain(
            element
                .descendants_named("source")
                .filter_map(|source| source.attr("src")),
        )
        .map(|src| format!("[Video({src})] "))
        .collect()
}

fn anchor_link(element: Element<'_>) -> Option<String> {
    let href = element.attr("href")?;
    let text = element.text_content();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(format!("[{text}]({href})"))
}

//! Main-content heuristic.
//!
//! Candidates are tried in a fixed order and the first whose rendered text is
//! longer than [`MIN_CONTENT_CHARS`] characters wins. Pages without such a
//! candidate fall back to `<body>`, and documents without a body fall back to
//! the root element. `script` and `style` never reach the rendered text, so the
//! fallback needs no separate pruning step.

use scraper::{Html, Selector};
use tracing::{trace, warn};

use crate::dom::Element;
use crate::markdown::{Fragment, Markdownizer};

/// Candidate selectors, highest priority first.
pub const MAIN_CONTENT_SELECTORS: [&str; 7] = [
    "article",
    "main",
    "[role=\"main\"]",
    "#main-content",
    ".main-content",
    "#content",
    ".content",
];

/// A candidate must render to strictly more characters than this.
pub const MIN_CONTENT_CHARS: usize = 100;

/// Where the located content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Selector(&'static str),
    Body,
    Root,
}

pub struct Located<'a> {
    pub element: Element<'a>,
    pub source: ContentSource,
    pub fragment: Fragment,
}

pub struct ContentLocator {
    candidates: Vec<(&'static str, Selector)>,
    body: Option<Selector>,
    min_chars: usize,
    markdownizer: Markdownizer,
}

impl Default for ContentLocator {
    fn default() -> Self {
        Self::new(Markdownizer::default())
    }
}

impl ContentLocator {
    pub fn new(markdownizer: Markdownizer) -> Self {
        let candidates = MAIN_CONTENT_SELECTORS
            .iter()
            .filter_map(|raw| compile(raw).map(|sel| (*raw, sel)))
            .collect();
        Self {
            candidates,
            body: compile("body"),
            min_chars: MIN_CONTENT_CHARS,
            markdownizer,
        }
    }

    pub fn locate<'a>(&self, document: &'a Html) -> Located<'a> {
        for (name, selector) in &self.candidates {
            let Some(found) = document.select(selector).next() else {
                continue;
            };
            let element = Element::new(found);
            let fragment = self.markdownizer.render(element);
            let chars = fragment.text.chars().count();
            if chars > self.min_chars {
                trace!(target: "web.extract", selector = name, chars, "main content located");
                return Located {
                    element,
                    source: ContentSource::Selector(name),
                    fragment,
                };
            }
            trace!(target: "web.extract", selector = name, chars, "candidate too short");
        }

        let (found, source) = match self
            .body
            .as_ref()
            .and_then(|sel| document.select(sel).next())
        {
            Some(body) => (body, ContentSource::Body),
            None => (document.root_element(), ContentSource::Root),
        };
        let element = Element::new(found);
        Located {
            element,
            source,
            fragment: self.markdownizer.render(element),
        }
    }
}

pub(crate) fn compile(raw: &str) -> Option<Selector> {
    match Selector::parse(raw) {
        Ok(sel) => Some(sel),
        Err(err) => {
            warn!(target: "web.extract", selector = raw, error = %err, "selector rejected");
            None
        }
    }
}

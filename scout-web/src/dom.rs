//! Borrowed view over a parsed `scraper` document.
//!
//! The markdownizer only needs four capabilities from a node: what kind it is,
//! a few attributes, its ordered children, and its text. [`DomNode`] exposes
//! exactly that, with the element's tag already classified into an
//! [`ElementKind`] so rendering is a single exhaustive match.

use scraper::{ElementRef, Node};

/// Element categories with distinct rendering rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Image,
    Video,
    Anchor,
    /// `p`, `div`, `section`, `article`.
    Block,
    ListItem,
    /// Heading level 1 through 6.
    Heading(u8),
    LineBreak,
    /// `script` and `style`.
    Suppressed,
    /// `pre` and `code`.
    Preformatted,
    /// Everything else renders as inline content.
    Inline,
}

impl ElementKind {
    /// Classify a lowercase HTML tag name.
    pub fn of(tag: &str) -> Self {
        match tag {
            "img" => Self::Image,
            "video" => Self::Video,
            "a" => Self::Anchor,
            "p" | "div" | "section" | "article" => Self::Block,
            "li" => Self::ListItem,
            "h1" => Self::Heading(1),
            "h2" => Self::Heading(2),
            "h3" => Self::Heading(3),
            "h4" => Self::Heading(4),
            "h5" => Self::Heading(5),
            "h6" => Self::Heading(6),
            "br" => Self::LineBreak,
            "script" | "style" => Self::Suppressed,
            "pre" | "code" => Self::Preformatted,
            _ => Self::Inline,
        }
    }
}

/// One node of the document tree, borrowed for the duration of a conversion.
#[derive(Debug, Clone, Copy)]
pub enum DomNode<'a> {
    Text(&'a str),
    Element(Element<'a>),
    /// Comments, doctypes and processing instructions; they render as nothing.
    Other,
}

/// An element handle with its classified kind.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    inner: ElementRef<'a>,
    kind: ElementKind,
}

impl<'a> Element<'a> {
    pub fn new(inner: ElementRef<'a>) -> Self {
        Self {
            inner,
            kind: ElementKind::of(inner.value().name()),
        }
    }

    pub fn kind(self) -> ElementKind {
        self.kind
    }

    pub fn tag(self) -> &'a str {
        self.inner.value().name()
    }

    /// Attribute value; an empty value counts as absent.
    pub fn attr(self, name: &str) -> Option<&'a str> {
        self.inner.value().attr(name).filter(|v| !v.is_empty())
    }

    /// Child nodes in document order.
    pub fn children(self) -> impl Iterator<Item = DomNode<'a>> {
        self.inner.children().map(|child| match child.value() {
            Node::Text(text) => {
                let text: &'a str = &text.text;
                DomNode::Text(text)
            }
            Node::Element(_) => ElementRef::wrap(child)
                .map(|el| DomNode::Element(Element::new(el)))
                .unwrap_or(DomNode::Other),
            _ => DomNode::Other,
        })
    }

    /// Descendant elements with the given tag, in document order.
    pub fn descendants_named(self, tag: &'a str) -> impl Iterator<Item = Element<'a>> {
        self.inner
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(move |el| el.value().name() == tag)
            .map(Element::new)
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(self) -> String {
        self.inner.text().collect()
    }
}

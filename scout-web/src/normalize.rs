//! Whitespace cleanup for rendered page text.
//!
//! The output has no blank lines, no leading or trailing whitespace on any
//! line, and every `[Image(..)]` / `[Video(..)]` marker on a line of its own.
//! Running [`normalize`] on its own output returns it unchanged.

use regex::Regex;
use std::sync::OnceLock;

fn paragraph_break() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").ok()).as_ref()
}

fn media_marker() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(?:Image|Video)\([^)\n]+\)\]").ok())
        .as_ref()
}

fn newline_run() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").ok()).as_ref()
}

/// Normalize rendered text. See the module docs for the guarantees.
pub fn normalize(raw: &str) -> String {
    let paragraphs: Vec<String> = split_paragraphs(raw)
        .into_iter()
        .map(collapse_paragraph)
        .filter(|p| !p.is_empty())
        .collect();
    let joined = paragraphs.join("\n\n");

    let isolated = match media_marker() {
        Some(re) => re.replace_all(&joined, "\n${0}\n").into_owned(),
        None => joined,
    };
    let capped = match newline_run() {
        Some(re) => re.replace_all(&isolated, "\n\n").into_owned(),
        None => isolated,
    };

    capped
        .trim_matches('\n')
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_paragraphs(raw: &str) -> Vec<&str> {
    match paragraph_break() {
        Some(re) => re.split(raw).collect(),
        None => raw.split("\n\n").collect(),
    }
}

/// Collapse spaces within each line; single newlines inside a paragraph stay.
fn collapse_paragraph(paragraph: &str) -> String {
    paragraph
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

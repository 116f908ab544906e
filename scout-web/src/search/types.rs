use serde::Serialize;

/// One organic result scraped from the DuckDuckGo HTML endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResultEntry {
    pub title: String,
    /// Destination URL, with DuckDuckGo redirect links already unwrapped.
    pub url: String,
    pub snippet: String,
}

impl SearchResultEntry {
    fn render(&self) -> String {
        format!(
            "### {}\n- snippet: {}\n- page_url: {}",
            self.title, self.snippet, self.url
        )
    }
}

/// Render the text payload returned by the search tool.
pub fn format_results(query: &str, entries: &[SearchResultEntry]) -> String {
    let body = entries
        .iter()
        .map(SearchResultEntry::render)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "# DuckDuckGo search results\nquery: {query}\nresult count: {}\n\n-----\n\n{body}\n",
        entries.len()
    )
}

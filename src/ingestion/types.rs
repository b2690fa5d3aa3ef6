use serde::Serialize;

/// Channel-level view of a fetched RSS document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub title: String,
    pub link: String,
    pub items: Vec<ParsedItem>,
    /// Items dropped during parsing because they carried no link.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    // raw publish date as found in the document; parsed at ingest time
    pub pub_date: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub undated: usize,
}

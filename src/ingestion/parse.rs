use bytes::Bytes;
use chrono::{DateTime, Utc};
use rss::{Channel, Item};

use super::fetch::FetchError;
use super::types::{ParsedFeed, ParsedItem};

pub fn parse_channel(xml: &Bytes) -> Result<ParsedFeed, FetchError> {
    let ch = Channel::read_from(&xml[..]).map_err(|e| FetchError::Parse(e.to_string()))?;

    let mut items = Vec::with_capacity(ch.items().len());
    let mut skipped = 0usize;
    for item in ch.items() {
        match parse_item(item) {
            Some(parsed) => items.push(parsed),
            None => skipped += 1,
        }
    }

    Ok(ParsedFeed {
        title: ch.title().trim().to_string(),
        link: ch.link().trim().to_string(),
        items,
        skipped,
    })
}

// An item without a link has no dedup key and is dropped.
fn parse_item(item: &Item) -> Option<ParsedItem> {
    let link = item.link().map(str::trim).filter(|l| !l.is_empty())?.to_string();
    let title = non_blank(item.title()).unwrap_or_else(|| link.clone());
    let pub_date = non_blank(item.pub_date()).or_else(|| {
        item.dublin_core_ext()
            .and_then(|dc| dc.dates().first())
            .and_then(|d| non_blank(Some(d.as_str())))
    });
    Some(ParsedItem {
        title,
        link,
        description: non_blank(item.description()),
        pub_date,
    })
}

/// RFC 2822 (`pubDate`) first, then RFC 3339 (`dc:date`); anything else is unknown.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) { return Some(dt.with_timezone(&Utc)); }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) { return Some(dt.with_timezone(&Utc)); }
    None
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel>
  <title>Boot.dev Blog</title>
  <link>https://blog.boot.dev/</link>
  <description>Latest posts</description>
  <item>
    <title>First &amp; foremost</title>
    <link>https://blog.boot.dev/first</link>
    <description>One</description>
    <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
  </item>
  <item>
    <title>No link here</title>
    <description>dropped</description>
  </item>
  <item>
    <link>https://blog.boot.dev/untitled</link>
    <description>   </description>
    <dc:date>2024-03-01T10:00:00Z</dc:date>
  </item>
  <item>
    <title>Bad date</title>
    <link>https://blog.boot.dev/bad-date</link>
    <pubDate>sometime last week</pubDate>
  </item>
</channel>
</rss>"#;

    fn sample() -> ParsedFeed {
        parse_channel(&Bytes::from_static(SAMPLE.as_bytes())).unwrap()
    }

    #[test]
    fn channel_fields_and_item_order() {
        let feed = sample();
        assert_eq!(feed.title, "Boot.dev Blog");
        assert_eq!(feed.link, "https://blog.boot.dev/");
        let links: Vec<&str> = feed.items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, ["https://blog.boot.dev/first", "https://blog.boot.dev/untitled", "https://blog.boot.dev/bad-date"]);
        assert_eq!(feed.skipped, 1);
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(sample().items[0].title, "First & foremost");
    }

    #[test]
    fn missing_title_falls_back_to_link_and_blank_description_is_none() {
        let item = &sample().items[1];
        assert_eq!(item.title, "https://blog.boot.dev/untitled");
        assert_eq!(item.description, None);
        assert_eq!(item.pub_date.as_deref(), Some("2024-03-01T10:00:00Z"));
    }

    #[test]
    fn bad_date_is_kept_raw_and_parses_to_none() {
        let item = &sample().items[2];
        assert_eq!(item.pub_date.as_deref(), Some("sometime last week"));
        assert_eq!(parse_pub_date("sometime last week"), None);
    }

    #[test]
    fn rfc1123z_and_rfc3339_dates() {
        let want = Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap();
        assert_eq!(parse_pub_date("Mon, 02 Jan 2006 15:04:05 -0700"), Some(want));
        let want = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_pub_date(" 2024-03-01T10:00:00Z "), Some(want));
    }

    #[test]
    fn empty_channel_has_no_items() {
        let xml = r#"<rss version="2.0"><channel><title>t</title><link>l</link><description>d</description></channel></rss>"#;
        let feed = parse_channel(&Bytes::from_static(xml.as_bytes())).unwrap();
        assert!(feed.items.is_empty());
        assert_eq!(feed.skipped, 0);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = parse_channel(&Bytes::from_static(b"<html><body>nope</body></html>")).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }
}

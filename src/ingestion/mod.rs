//! Fetch one feed URL and turn its items into posts.

use async_trait::async_trait;

pub mod fetch;
pub mod parse;
pub mod types;
pub mod write;

pub use fetch::{FetchError, HttpFetcher};
pub use types::{IngestSummary, ParsedFeed, ParsedItem};

#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed, FetchError>;
}

#[async_trait]
impl FeedSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed, FetchError> {
        let xml = self.fetch_rss(url).await?;
        parse::parse_channel(&xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ONE_ITEM: &str = r#"<rss version="2.0"><channel><title>t</title><link>https://t</link><description>d</description>
<item><title>hello</title><link>https://t/hello</link><pubDate>Tue, 10 Jun 2003 04:00:00 GMT</pubDate></item>
</channel></rss>"#;

    fn fetcher(timeout: Duration) -> HttpFetcher {
        HttpFetcher::new(timeout).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_parses_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .and(header("user-agent", "gator"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ONE_ITEM))
            .expect(1)
            .mount(&server)
            .await;

        let feed = fetcher(Duration::from_secs(5)).fetch(&format!("{}/feed.xml", server.uri())).await.unwrap();
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].link, "https://t/hello");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = fetcher(Duration::from_secs(5)).fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(s) if s.as_u16() == 503));
    }

    #[tokio::test]
    async fn slow_server_hits_the_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ONE_ITEM).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let err = fetcher(Duration::from_millis(200)).fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout), "got {err}");
    }

    #[tokio::test]
    async fn html_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>not a feed</body></html>"))
            .mount(&server)
            .await;

        let err = fetcher(Duration::from_secs(5)).fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b' '; fetch::MAX_FEED_BYTES + 1]))
            .mount(&server)
            .await;

        let err = fetcher(Duration::from_secs(10)).fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge(n) if n == fetch::MAX_FEED_BYTES + 1), "got {err}");
    }

    #[tokio::test]
    async fn body_at_the_limit_is_read() {
        let mut xml = ONE_ITEM.as_bytes().to_vec();
        xml.resize(fetch::MAX_FEED_BYTES, b' ');
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(xml))
            .mount(&server)
            .await;

        let feed = fetcher(Duration::from_secs(10)).fetch(&server.uri()).await.unwrap();
        assert_eq!(feed.items.len(), 1);
    }

    #[tokio::test]
    async fn unreachable_host_is_an_http_error() {
        // nothing listens on port 9 of localhost in the test environment
        let err = fetcher(Duration::from_secs(2)).fetch("http://127.0.0.1:9/feed").await.unwrap_err();
        assert!(matches!(err, FetchError::Http(_) | FetchError::Timeout));
    }
}

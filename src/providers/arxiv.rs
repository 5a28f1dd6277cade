//! arXiv search provider.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use feed_rs::parser;

use crate::models::{Author, Paper, PaperBuilder, ProviderType, Timeframe, Topic};
use crate::providers::{status_error, Provider, ProviderError};
use crate::utils::{api_retry_config, with_retry, HttpClient};

/// Base URL for arXiv API
const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";
/// Base URL for arXiv PDFs
const ARXIV_PDF_URL: &str = "https://arxiv.org/pdf";
/// arXiv caps a single page of results
const ARXIV_MAX_RESULTS: usize = 200;

/// Field prefixes understood by the arXiv query language
const FIELD_PREFIXES: [&str; 8] = ["all:", "ti:", "au:", "abs:", "cat:", "co:", "jr:", "rn:"];

/// arXiv search provider
///
/// Every arXiv result carries an open-access PDF.
#[derive(Debug, Clone)]
pub struct ArxivProvider {
    client: HttpClient,
    base_url: String,
}

impl ArxivProvider {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: ARXIV_API_URL.to_string(),
        }
    }

    /// Point the provider at a different API endpoint (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Strip a trailing version suffix ("2301.12345v2" -> "2301.12345")
    pub fn strip_version(id: &str) -> &str {
        match id.rfind('v') {
            Some(pos)
                if pos + 1 < id.len() && id[pos + 1..].chars().all(|c| c.is_ascii_digit()) =>
            {
                &id[..pos]
            }
            _ => id,
        }
    }

    /// Build the `search_query` parameter for a topic
    fn build_search_query(topic: &Topic) -> String {
        let query = topic.query();
        let lowered = query.to_lowercase();
        let mut parts = Vec::new();

        if FIELD_PREFIXES.iter().any(|p| lowered.contains(p)) {
            parts.push(query.to_string());
        } else {
            parts.push(format!("all:{}", query));
        }

        if let Some(range) = topic.timeframe().and_then(Self::submitted_date_range) {
            parts.push(range);
        }

        parts.join(" AND ")
    }

    /// Translate a timeframe into a `submittedDate` clause
    fn submitted_date_range(timeframe: Timeframe) -> Option<String> {
        const FMT: &str = "%Y%m%d%H%M";
        match timeframe {
            Timeframe::Recent { hours } => {
                let end = Utc::now();
                let start = end - ChronoDuration::hours(i64::from(hours));
                Some(format!(
                    "submittedDate:[{} TO {}]",
                    start.format(FMT),
                    end.format(FMT)
                ))
            }
            Timeframe::SinceYear { year } => Some(format!(
                "submittedDate:[{}01010000 TO {}]",
                year,
                Utc::now().format(FMT)
            )),
            Timeframe::DateRange { start, end } => Some(format!(
                "submittedDate:[{} TO {}]",
                day_start(start),
                day_end(end)
            )),
        }
    }

    /// Parse arXiv Atom feed entry into Paper
    fn parse_entry(entry: &feed_rs::model::Entry) -> Result<Paper, ProviderError> {
        let raw_id = entry
            .id
            .rsplit("/abs/")
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::Parse("Missing arXiv ID".to_string()))?;
        let arxiv_id = Self::strip_version(raw_id).to_string();

        let title = entry
            .title
            .as_ref()
            .map(|t| collapse_whitespace(&t.content))
            .unwrap_or_default();

        let authors = entry
            .authors
            .iter()
            .map(|a| Author::new(a.name.trim()))
            .collect();

        let mut builder = PaperBuilder::new(title, ProviderType::Arxiv)
            .paper_id(arxiv_id.clone())
            .arxiv_id(arxiv_id.clone())
            .authors(authors)
            .venue("arXiv")
            .url(format!("https://arxiv.org/abs/{}", arxiv_id))
            .pdf(format!("{}/{}", ARXIV_PDF_URL, arxiv_id), "arxiv");

        if let Some(summary) = &entry.summary {
            builder = builder.abstract_text(collapse_whitespace(&summary.content));
        }
        if let Some(published) = entry.published.or(entry.updated) {
            builder = builder.published(published);
        }

        Ok(builder.build())
    }
}

fn day_start(date: NaiveDate) -> String {
    format!("{}0000", date.format("%Y%m%d"))
}

fn day_end(date: NaiveDate) -> String {
    format!("{}2359", date.format("%Y%m%d"))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl Provider for ArxivProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Arxiv
    }

    async fn search(&self, topic: &Topic) -> Result<Vec<Paper>, ProviderError> {
        let sort_by = match topic.timeframe() {
            Some(Timeframe::Recent { .. }) => "submittedDate",
            _ => "relevance",
        };

        let url = format!(
            "{}?search_query={}&start=0&max_results={}&sortBy={}&sortOrder=descending",
            self.base_url,
            urlencoding::encode(&Self::build_search_query(topic)),
            topic.max_results().min(ARXIV_MAX_RESULTS),
            sort_by
        );

        let body = with_retry(api_retry_config(), || {
            let url = url.clone();
            async move {
                let response = self.client.get(&url).send().await?;
                if !response.status().is_success() {
                    return Err(status_error("arXiv", &response));
                }
                Ok(response.bytes().await?)
            }
        })
        .await?;

        let feed = parser::parse(&body[..])
            .map_err(|e| ProviderError::Parse(format!("Atom feed: {}", e)))?;

        let papers = feed
            .entries
            .iter()
            .filter_map(|entry| match Self::parse_entry(entry) {
                Ok(paper) => Some(paper),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed arXiv entry");
                    None
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = papers.len(), "arXiv search complete");
        Ok(papers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Query</title>
  <id>http://arxiv.org/api/query</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <id>http://arxiv.org/abs/2401.01234v2</id>
    <updated>2024-01-05T00:00:00Z</updated>
    <published>2024-01-03T12:00:00Z</published>
    <title>Retrieval Augmented
      Generation at Scale</title>
    <summary>  We study RAG.  </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
  </entry>
</feed>"#;

    #[test]
    fn test_strip_version() {
        assert_eq!(ArxivProvider::strip_version("2401.01234v2"), "2401.01234");
        assert_eq!(ArxivProvider::strip_version("2401.01234"), "2401.01234");
        assert_eq!(ArxivProvider::strip_version("solv-int/9901001v1"), "solv-int/9901001");
        assert_eq!(ArxivProvider::strip_version("solv-int/9901001"), "solv-int/9901001");
    }

    #[test]
    fn test_build_search_query() {
        assert_eq!(ArxivProvider::build_search_query(&Topic::new("rag")), "all:rag");
        assert_eq!(
            ArxivProvider::build_search_query(&Topic::new("cat:cs.CL AND ti:agents")),
            "cat:cs.CL AND ti:agents"
        );

        let ranged = Topic::builder("rag")
            .timeframe(Timeframe::DateRange {
                start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
            })
            .build();
        assert_eq!(
            ArxivProvider::build_search_query(&ranged),
            "all:rag AND submittedDate:[202301010000 TO 202306302359]"
        );
    }

    #[test]
    fn test_parse_entry() {
        let feed = parser::parse(FEED.as_bytes()).unwrap();
        let paper = ArxivProvider::parse_entry(&feed.entries[0]).unwrap();

        assert_eq!(paper.arxiv_id.as_deref(), Some("2401.01234"));
        assert_eq!(paper.title, "Retrieval Augmented Generation at Scale");
        assert_eq!(paper.r#abstract.as_deref(), Some("We study RAG."));
        assert_eq!(paper.author_names(), vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(paper.year, Some(2024));
        assert!(paper.pdf_available);
        assert_eq!(paper.pdf_source.as_deref(), Some("arxiv"));
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let provider = ArxivProvider::new(HttpClient::new().unwrap()).with_base_url(server.url());
        let papers = provider.search(&Topic::new("rag")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].source, ProviderType::Arxiv);
    }

    #[tokio::test]
    async fn test_search_bad_request_is_invalid_query() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(400)
            .create_async()
            .await;

        let provider = ArxivProvider::new(HttpClient::new().unwrap()).with_base_url(server.url());
        let err = provider.search(&Topic::new("rag")).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidQuery(_)));
    }
}

//! HuggingFace Daily Papers provider.
//!
//! The daily papers feed has no search endpoint, so the provider fetches the
//! recent feed and filters it locally against the topic's query terms.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration as ChronoDuration, Utc};
use serde::Deserialize;

use crate::models::{Author, Paper, PaperBuilder, ProviderType, Timeframe, Topic};
use crate::providers::{status_error, Provider, ProviderError};
use crate::utils::{api_retry_config, with_retry, HttpClient};

const HF_API_BASE: &str = "https://huggingface.co";

/// Number of feed entries fetched per search
const HF_FEED_LIMIT: usize = 100;

/// Query terms shorter than this are ignored when matching
const MIN_TERM_LEN: usize = 3;

/// HuggingFace Daily Papers provider
#[derive(Debug, Clone)]
pub struct HuggingFaceProvider {
    client: HttpClient,
    base_url: String,
}

impl HuggingFaceProvider {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: HF_API_BASE.to_string(),
        }
    }

    /// Point the provider at a different API endpoint (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Lower-cased query terms used for local matching
    fn query_terms(query: &str) -> Vec<String> {
        query
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|t| t.chars().count() >= MIN_TERM_LEN)
            .map(str::to_lowercase)
            .collect()
    }

    /// Number of query terms found in the entry's title or summary
    fn match_count(entry: &HfPaper, terms: &[String]) -> usize {
        let haystack = format!(
            "{} {}",
            entry.title.to_lowercase(),
            entry.summary.as_deref().unwrap_or_default().to_lowercase()
        );
        terms.iter().filter(|t| haystack.contains(t.as_str())).count()
    }

    fn in_timeframe(published: Option<DateTime<Utc>>, timeframe: Option<Timeframe>) -> bool {
        let (Some(published), Some(timeframe)) = (published, timeframe) else {
            return true;
        };
        match timeframe {
            Timeframe::Recent { hours } => {
                published >= Utc::now() - ChronoDuration::hours(i64::from(hours))
            }
            Timeframe::SinceYear { year } => published.year() >= year,
            Timeframe::DateRange { start, end } => {
                let day = published.date_naive();
                day >= start && day <= end
            }
        }
    }

    fn parse_paper(entry: HfPaper) -> Paper {
        let authors = entry
            .authors
            .into_iter()
            .filter(|a| a.hidden != Some(true))
            .map(|a| Author::new(a.name))
            .collect();

        let mut builder = PaperBuilder::new(entry.title.trim(), ProviderType::HuggingFace)
            .paper_id(entry.id.clone())
            .arxiv_id(entry.id.clone())
            .authors(authors)
            .url(format!("https://huggingface.co/papers/{}", entry.id))
            .pdf(format!("https://arxiv.org/pdf/{}", entry.id), "arxiv");

        if let Some(summary) = entry.summary {
            builder = builder.abstract_text(summary.split_whitespace().collect::<Vec<_>>().join(" "));
        }
        if let Some(published) = entry.published_at {
            builder = builder.published(published);
        }
        builder.build()
    }
}

#[async_trait]
impl Provider for HuggingFaceProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::HuggingFace
    }

    fn name(&self) -> &str {
        "HuggingFace Daily Papers"
    }

    async fn search(&self, topic: &Topic) -> Result<Vec<Paper>, ProviderError> {
        let mut url = format!("{}/api/daily_papers?limit={}", self.base_url, HF_FEED_LIMIT);
        if let Some(Timeframe::DateRange { end, .. }) = topic.timeframe() {
            url.push_str(&format!("&date={}", end.format("%Y-%m-%d")));
        }

        let entries: Vec<HfDailyEntry> = with_retry(api_retry_config(), || {
            let url = url.clone();
            async move {
                let response = self.client.get(&url).send().await?;
                if !response.status().is_success() {
                    return Err(status_error("HuggingFace", &response));
                }
                let body = response.text().await?;
                Ok(serde_json::from_str(&body)?)
            }
        })
        .await?;

        let terms = Self::query_terms(topic.query());
        let mut matched: Vec<(usize, u32, HfPaper)> = entries
            .into_iter()
            .map(|e| e.paper)
            .filter(|p| !p.title.trim().is_empty())
            .filter(|p| Self::in_timeframe(p.published_at, topic.timeframe()))
            .filter_map(|p| {
                let hits = if terms.is_empty() { 1 } else { Self::match_count(&p, &terms) };
                (hits > 0).then(|| (hits, p.upvotes.unwrap_or(0), p))
            })
            .collect();

        // Daily papers carry no citations; upvotes break ties between equal matches
        matched.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

        let papers = matched
            .into_iter()
            .take(topic.max_results())
            .map(|(_, _, p)| Self::parse_paper(p))
            .collect::<Vec<_>>();

        tracing::debug!(count = papers.len(), "HuggingFace search complete");
        Ok(papers)
    }
}

#[derive(Debug, Deserialize)]
struct HfDailyEntry {
    paper: HfPaper,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HfPaper {
    id: String,
    #[serde(default)]
    title: String,
    summary: Option<String>,
    #[serde(default)]
    authors: Vec<HfAuthor>,
    published_at: Option<DateTime<Utc>>,
    upvotes: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct HfAuthor {
    name: String,
    hidden: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    const FEED: &str = r#"[
        {"paper": {"id": "2401.00001", "title": "Scaling LLM Agents", "summary": "Agents built on large language models.",
                   "authors": [{"name": "A. Author", "hidden": false}], "publishedAt": "2024-01-02T00:00:00.000Z", "upvotes": 12}},
        {"paper": {"id": "2401.00002", "title": "Protein Folding Revisited", "summary": "Structural biology.",
                   "authors": [], "publishedAt": "2024-01-02T00:00:00.000Z", "upvotes": 50}},
        {"paper": {"id": "2401.00003", "title": "LLM Agents for Tool Use", "summary": "Tool-using agents.",
                   "authors": [], "publishedAt": "2024-01-01T00:00:00.000Z", "upvotes": 40}}
    ]"#;

    #[test]
    fn test_query_terms() {
        assert_eq!(
            HuggingFaceProvider::query_terms("LLM agents, fine-tuning of AI"),
            vec!["llm", "agents", "fine-tuning"]
        );
    }

    #[test]
    fn test_in_timeframe() {
        let published = Some(Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_time(NaiveTime::MIN),
        ));
        assert!(HuggingFaceProvider::in_timeframe(published, None));
        assert!(HuggingFaceProvider::in_timeframe(
            published,
            Some(Timeframe::SinceYear { year: 2024 })
        ));
        assert!(!HuggingFaceProvider::in_timeframe(
            published,
            Some(Timeframe::DateRange {
                start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            })
        ));
    }

    #[tokio::test]
    async fn test_search_filters_and_orders_feed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/daily_papers")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(FEED)
            .create_async()
            .await;

        let provider =
            HuggingFaceProvider::new(HttpClient::new().unwrap()).with_base_url(server.url());
        let papers = provider.search(&Topic::new("llm agents")).await.unwrap();

        mock.assert_async().await;
        let ids: Vec<_> = papers.iter().filter_map(|p| p.paper_id.as_deref()).collect();
        assert_eq!(ids, vec!["2401.00003", "2401.00001"]);
        assert!(papers.iter().all(|p| p.pdf_available));
        assert!(papers.iter().all(|p| p.citation_count.is_none()));
    }
}

//! Semantic Scholar search provider.

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use serde::Deserialize;

use crate::models::{Author, Paper, PaperBuilder, ProviderType, Timeframe, Topic};
use crate::providers::{status_error, Provider, ProviderError};
use crate::utils::{api_retry_config, with_retry, HttpClient};

const SEMANTIC_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

/// The search endpoint returns at most this many results per page
const SEMANTIC_MAX_RESULTS: usize = 100;

const SEARCH_FIELDS: &str = "paperId,externalIds,title,abstract,venue,year,publicationDate,\
citationCount,influentialCitationCount,authors,url,openAccessPdf";

/// Semantic Scholar search provider
///
/// Requires an API key; without one the provider reports itself unavailable
/// and the selector skips it.
#[derive(Debug, Clone)]
pub struct SemanticScholarProvider {
    client: HttpClient,
    api_key: Option<String>,
    base_url: String,
}

impl SemanticScholarProvider {
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: SEMANTIC_API_BASE.to_string(),
        }
    }

    /// Point the provider at a different API endpoint (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_url(&self, topic: &Topic) -> String {
        let mut url = format!(
            "{}/paper/search?query={}&limit={}&fields={}",
            self.base_url,
            urlencoding::encode(topic.query()),
            topic.max_results().clamp(1, SEMANTIC_MAX_RESULTS),
            SEARCH_FIELDS
        );

        if let Some(min) = topic.min_citations().filter(|m| *m > 0) {
            url.push_str(&format!("&minCitationCount={}", min));
        }

        if let Some(range) = topic.timeframe().map(publication_date_range) {
            url.push_str(&format!("&publicationDateOrYear={}", range));
        }

        url
    }

    /// Parse Semantic Scholar paper data
    fn parse_paper(data: S2Paper) -> Paper {
        let ids = data.external_ids.unwrap_or_default();

        let authors = data
            .authors
            .into_iter()
            .filter_map(|a| {
                let name = a.name?;
                let author = Author::new(name);
                Some(match a.author_id {
                    Some(id) => author.with_id(id),
                    None => author,
                })
            })
            .collect();

        let mut builder = PaperBuilder::new(data.title, ProviderType::SemanticScholar)
            .paper_id(data.paper_id)
            .authors(authors);

        if let Some(doi) = ids.doi {
            builder = builder.doi(doi);
        }
        if let Some(arxiv) = ids.arxiv {
            builder = builder.arxiv_id(arxiv);
        }
        if let Some(text) = data.r#abstract {
            builder = builder.abstract_text(text);
        }
        if let Some(venue) = data.venue.filter(|v| !v.trim().is_empty()) {
            builder = builder.venue(venue);
        }
        if let Some(year) = data.year {
            builder = builder.year(year);
        }
        if let Some(published) = data
            .publication_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            builder = builder.published(Utc.from_utc_datetime(&published));
        }
        if let Some(count) = data.citation_count {
            builder = builder.citations(count);
        }
        if let Some(count) = data.influential_citation_count {
            builder = builder.influential_citations(count);
        }
        if let Some(url) = data.url {
            builder = builder.url(url);
        }
        if let Some(pdf) = data
            .open_access_pdf
            .and_then(|p| p.url)
            .filter(|u| !u.is_empty())
        {
            builder = builder.pdf(pdf, "semantic_scholar");
        }

        builder.build()
    }
}

/// `publicationDateOrYear` filter value for a timeframe
fn publication_date_range(timeframe: Timeframe) -> String {
    match timeframe {
        Timeframe::Recent { hours } => {
            let start = Utc::now() - chrono::Duration::hours(i64::from(hours));
            format!("{}:", start.format("%Y-%m-%d"))
        }
        Timeframe::SinceYear { year } => format!("{}:", year),
        Timeframe::DateRange { start, end } => {
            format!("{}:{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
        }
    }
}

#[async_trait]
impl Provider for SemanticScholarProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::SemanticScholar
    }

    fn requires_credential(&self) -> bool {
        true
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, topic: &Topic) -> Result<Vec<Paper>, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Unavailable("SEMANTIC_SCHOLAR_API_KEY is not set".to_string())
        })?;
        let url = self.build_url(topic);

        let data: S2SearchResponse = with_retry(api_retry_config(), || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header("x-api-key", api_key)
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(status_error("Semantic Scholar", &response));
                }
                let body = response.text().await?;
                Ok(serde_json::from_str(&body)?)
            }
        })
        .await?;

        let papers = data
            .data
            .into_iter()
            .filter(|p| !p.title.trim().is_empty())
            .map(Self::parse_paper)
            .collect::<Vec<_>>();

        tracing::debug!(count = papers.len(), "Semantic Scholar search complete");
        Ok(papers)
    }
}

#[derive(Debug, Deserialize)]
struct S2SearchResponse {
    #[serde(default)]
    data: Vec<S2Paper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    paper_id: String,
    #[serde(default)]
    external_ids: Option<S2ExternalIds>,
    #[serde(default)]
    title: String,
    r#abstract: Option<String>,
    venue: Option<String>,
    year: Option<i32>,
    publication_date: Option<String>,
    citation_count: Option<u32>,
    influential_citation_count: Option<u32>,
    #[serde(default)]
    authors: Vec<S2Author>,
    url: Option<String>,
    open_access_pdf: Option<S2OpenAccessPdf>,
}

#[derive(Debug, Default, Deserialize)]
struct S2ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "ArXiv")]
    arxiv: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Author {
    author_id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2OpenAccessPdf {
    url: Option<String>,
}

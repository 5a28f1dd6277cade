//! Paper model representing a research paper from any provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The search backend a paper was discovered through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "arxiv")]
    Arxiv,
    #[serde(rename = "semantic_scholar")]
    SemanticScholar,
    #[serde(rename = "huggingface")]
    HuggingFace,
}

impl ProviderType {
    /// Every provider type, in declaration order.
    ///
    /// Declaration order is the tie-break for anything that needs a
    /// deterministic ordering of providers.
    pub const ALL: [ProviderType; 3] = [
        ProviderType::Arxiv,
        ProviderType::SemanticScholar,
        ProviderType::HuggingFace,
    ];

    /// Returns the display name of the provider
    pub fn name(&self) -> &'static str {
        match self {
            ProviderType::Arxiv => "arXiv",
            ProviderType::SemanticScholar => "Semantic Scholar",
            ProviderType::HuggingFace => "HuggingFace Daily Papers",
        }
    }

    /// Returns the provider identifier used in config files and on the CLI
    pub fn id(&self) -> &'static str {
        match self {
            ProviderType::Arxiv => "arxiv",
            ProviderType::SemanticScholar => "semantic_scholar",
            ProviderType::HuggingFace => "huggingface",
        }
    }

    /// Position in declaration order
    pub fn declaration_index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|p| p == self)
            .unwrap_or(Self::ALL.len())
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A provider identifier that does not name any known backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown provider type: '{0}'")]
pub struct UnknownProviderType(pub String);

impl FromStr for ProviderType {
    type Err = UnknownProviderType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arxiv" => Ok(ProviderType::Arxiv),
            "semantic_scholar" | "semantic" | "semanticscholar" | "s2" => {
                Ok(ProviderType::SemanticScholar)
            }
            "huggingface" | "hugging_face" | "hf" => Ok(ProviderType::HuggingFace),
            _ => Err(UnknownProviderType(s.to_string())),
        }
    }
}

/// A paper author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,

    /// Provider-specific author identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author_id: None,
            affiliation: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.author_id = Some(id.into());
        self
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }
}

/// A research paper from any search provider
///
/// None of the identifiers is guaranteed to be present. Two papers are never
/// compared structurally for deduplication; see [`crate::utils::dedup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Provider-unique identifier (arXiv ID, Semantic Scholar paper ID, ...)
    #[serde(default)]
    pub paper_id: Option<String>,

    /// Digital Object Identifier
    #[serde(default)]
    pub doi: Option<String>,

    /// arXiv identifier without version suffix
    #[serde(default)]
    pub arxiv_id: Option<String>,

    pub title: String,

    #[serde(default)]
    pub r#abstract: Option<String>,

    /// Authors in publication order
    #[serde(default)]
    pub authors: Vec<Author>,

    #[serde(default)]
    pub venue: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    /// Publication timestamp, normalized to UTC
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,

    #[serde(default)]
    pub citation_count: Option<u32>,

    #[serde(default)]
    pub influential_citation_count: Option<u32>,

    /// Paper landing page
    #[serde(default)]
    pub url: Option<String>,

    /// Open-access PDF location
    #[serde(default)]
    pub pdf_url: Option<String>,

    #[serde(default)]
    pub pdf_available: bool,

    /// Where the PDF link came from (e.g. "arxiv", "open_access")
    #[serde(default)]
    pub pdf_source: Option<String>,

    /// Provider the paper was discovered through
    pub source: ProviderType,

    /// Composite 0-100 quality score, set by the quality scorer
    #[serde(default)]
    pub quality_score: Option<f64>,
}

impl Paper {
    /// Create a new paper with the required fields
    pub fn new(title: impl Into<String>, source: ProviderType) -> Self {
        Self {
            paper_id: None,
            doi: None,
            arxiv_id: None,
            title: title.into(),
            r#abstract: None,
            authors: Vec::new(),
            venue: None,
            year: None,
            published: None,
            citation_count: None,
            influential_citation_count: None,
            url: None,
            pdf_url: None,
            pdf_available: false,
            pdf_source: None,
            source,
            quality_score: None,
        }
    }

    /// Returns the most stable identifier available: DOI, then paper ID, then arXiv ID
    pub fn primary_id(&self) -> Option<&str> {
        non_empty(&self.doi)
            .or_else(|| non_empty(&self.paper_id))
            .or_else(|| non_empty(&self.arxiv_id))
    }

    /// Returns the author names in order
    pub fn author_names(&self) -> Vec<&str> {
        self.authors.iter().map(|a| a.name.as_str()).collect()
    }

    /// Check if paper has a downloadable PDF
    pub fn has_pdf(&self) -> bool {
        self.pdf_available
    }
}

/// Returns the trimmed value if it is present and non-empty
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Builder for constructing Paper objects
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    /// Create a new builder with required fields
    pub fn new(title: impl Into<String>, source: ProviderType) -> Self {
        Self {
            paper: Paper::new(title, source),
        }
    }

    pub fn paper_id(mut self, id: impl Into<String>) -> Self {
        self.paper.paper_id = Some(id.into());
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.paper.doi = Some(doi.into());
        self
    }

    pub fn arxiv_id(mut self, id: impl Into<String>) -> Self {
        self.paper.arxiv_id = Some(id.into());
        self
    }

    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.paper.r#abstract = Some(abstract_text.into());
        self
    }

    /// Append an author
    pub fn author(mut self, author: Author) -> Self {
        self.paper.authors.push(author);
        self
    }

    /// Replace the author list
    pub fn authors(mut self, authors: Vec<Author>) -> Self {
        self.paper.authors = authors;
        self
    }

    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.paper.venue = Some(venue.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.paper.year = Some(year);
        self
    }

    /// Set the publication timestamp; also fills `year` when unset
    pub fn published(mut self, published: DateTime<Utc>) -> Self {
        if self.paper.year.is_none() {
            self.paper.year = Some(chrono::Datelike::year(&published));
        }
        self.paper.published = Some(published);
        self
    }

    pub fn citations(mut self, count: u32) -> Self {
        self.paper.citation_count = Some(count);
        self
    }

    pub fn influential_citations(mut self, count: u32) -> Self {
        self.paper.influential_citation_count = Some(count);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.paper.url = Some(url.into());
        self
    }

    /// Set an open-access PDF link and mark the PDF as available
    pub fn pdf(mut self, url: impl Into<String>, source: impl Into<String>) -> Self {
        self.paper.pdf_url = Some(url.into());
        self.paper.pdf_source = Some(source.into());
        self.paper.pdf_available = true;
        self
    }

    pub fn pdf_available(mut self, available: bool) -> Self {
        self.paper.pdf_available = available;
        self
    }

    /// Build the Paper
    pub fn build(self) -> Paper {
        self.paper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_paper_builder() {
        let paper = PaperBuilder::new("Test Paper", ProviderType::Arxiv)
            .paper_id("2301.12345")
            .author(Author::new("John Doe"))
            .author(Author::new("Jane Smith").with_affiliation("MIT"))
            .abstract_text("This is a test abstract.")
            .doi("10.1234/test.1234")
            .pdf("https://arxiv.org/pdf/2301.12345.pdf", "arxiv")
            .citations(42)
            .build();

        assert_eq!(paper.paper_id.as_deref(), Some("2301.12345"));
        assert_eq!(paper.title, "Test Paper");
        assert_eq!(paper.author_names(), vec!["John Doe", "Jane Smith"]);
        assert_eq!(paper.doi.as_deref(), Some("10.1234/test.1234"));
        assert_eq!(paper.citation_count, Some(42));
        assert!(paper.has_pdf());
        assert_eq!(paper.quality_score, None);
    }

    #[test]
    fn test_published_fills_year() {
        let published = Utc.with_ymd_and_hms(2023, 5, 17, 0, 0, 0).unwrap();
        let paper = PaperBuilder::new("Test", ProviderType::Arxiv)
            .published(published)
            .build();
        assert_eq!(paper.year, Some(2023));

        let explicit = PaperBuilder::new("Test", ProviderType::Arxiv)
            .year(2022)
            .published(published)
            .build();
        assert_eq!(explicit.year, Some(2022));
    }

    #[test]
    fn test_primary_id() {
        let with_doi = PaperBuilder::new("Test", ProviderType::SemanticScholar)
            .paper_id("abc")
            .doi("10.1234/test")
            .build();
        assert_eq!(with_doi.primary_id(), Some("10.1234/test"));

        let blank_doi = PaperBuilder::new("Test", ProviderType::SemanticScholar)
            .paper_id("abc")
            .doi("   ")
            .build();
        assert_eq!(blank_doi.primary_id(), Some("abc"));

        let none = Paper::new("Test", ProviderType::Arxiv);
        assert_eq!(none.primary_id(), None);
    }

    #[test]
    fn test_provider_type_parse() {
        assert_eq!("arxiv".parse::<ProviderType>().unwrap(), ProviderType::Arxiv);
        assert_eq!(
            " Semantic_Scholar ".parse::<ProviderType>().unwrap(),
            ProviderType::SemanticScholar
        );
        assert_eq!("hf".parse::<ProviderType>().unwrap(), ProviderType::HuggingFace);

        let err = "pubmed".parse::<ProviderType>().unwrap_err();
        assert_eq!(err, UnknownProviderType("pubmed".to_string()));
    }

    #[test]
    fn test_provider_type_serde_matches_id() {
        for provider in ProviderType::ALL {
            let json = serde_json::to_string(&provider).unwrap();
            assert_eq!(json, format!("\"{}\"", provider.id()));
        }
    }

    #[test]
    fn test_declaration_index() {
        assert_eq!(ProviderType::Arxiv.declaration_index(), 0);
        assert_eq!(ProviderType::HuggingFace.declaration_index(), 2);
    }
}

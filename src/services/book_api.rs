use crate::error::{AppError, Result};
use crate::models::book::{normalize_tags, unique_authors, Tag};
use crate::models::{BookRecord, Isbn};
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_AUTHOR: &str = "Unknown Author";
const NO_DESCRIPTION: &str = "No description available.";

/// One source of book metadata.
#[async_trait]
pub trait BookProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, isbn: &Isbn) -> Result<Option<BookRecord>>;
}

/// Lookup-by-ISBN as seen by the matcher.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn lookup(&self, isbn: &Isbn) -> Result<Option<BookRecord>>;
}

fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("bookpal/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))
}

fn non_empty(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn authors_or_unknown(authors: Vec<String>) -> Vec<String> {
    let authors = unique_authors(authors);
    if authors.is_empty() {
        vec![UNKNOWN_AUTHOR.to_string()]
    } else {
        authors
    }
}

fn categories_or_unknown(categories: Vec<String>) -> Vec<String> {
    if categories.is_empty() {
        vec!["Unknown".to_string()]
    } else {
        categories
    }
}

// ---- Google Books ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleVolumes {
    #[serde(default)]
    total_items: u64,
    #[serde(default)]
    items: Vec<GoogleVolume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleVolume {
    volume_info: GoogleVolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleVolumeInfo {
    title: Option<String>,
    authors: Option<Vec<Tag>>,
    description: Option<String>,
    categories: Option<Vec<Tag>>,
    published_date: Option<String>,
    publisher: Option<String>,
    page_count: Option<u32>,
}

fn google_record(isbn: &Isbn, volumes: GoogleVolumes) -> Option<BookRecord> {
    if volumes.total_items == 0 {
        return None;
    }
    let info = volumes.items.into_iter().next()?.volume_info;

    Some(BookRecord {
        title: non_empty(info.title, UNKNOWN_TITLE),
        authors: authors_or_unknown(normalize_tags(info.authors)),
        description: non_empty(info.description, NO_DESCRIPTION),
        categories: categories_or_unknown(normalize_tags(info.categories)),
        published_date: info.published_date.unwrap_or_default(),
        publisher: info.publisher.unwrap_or_default(),
        page_count: info.page_count.filter(|n| *n > 0),
        isbn: isbn.clone(),
        source: "Google Books".to_string(),
        embedding: None,
    })
}

/// Primary provider: the Google Books volumes API.
pub struct GoogleBooksClient {
    client: Client,
    base_url: String,
}

impl GoogleBooksClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BookProvider for GoogleBooksClient {
    fn name(&self) -> &'static str {
        "Google Books"
    }

    async fn fetch(&self, isbn: &Isbn) -> Result<Option<BookRecord>> {
        let query = format!("isbn:{}", isbn);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let volumes: GoogleVolumes = response.json().await?;
                Ok(google_record(isbn, volumes))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(AppError::ExternalService(format!(
                "Google Books returned {}",
                status
            ))),
        }
    }
}

// ---- OpenLibrary ----

#[derive(Debug, Deserialize)]
struct OpenLibraryBrief {
    #[serde(default)]
    records: IndexMap<String, OpenLibraryRecord>,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryRecord {
    #[serde(default)]
    data: OpenLibraryData,
}

#[derive(Debug, Default, Deserialize)]
struct OpenLibraryData {
    title: Option<String>,
    authors: Option<Vec<Tag>>,
    description: Option<String>,
    subjects: Option<Vec<Tag>>,
    publish_date: Option<String>,
    publishers: Option<Vec<Tag>>,
    number_of_pages: Option<u32>,
}

fn openlibrary_record(isbn: &Isbn, brief: OpenLibraryBrief) -> Option<BookRecord> {
    let data = brief.records.into_values().next()?.data;

    Some(BookRecord {
        title: non_empty(data.title, UNKNOWN_TITLE),
        authors: authors_or_unknown(normalize_tags(data.authors)),
        description: non_empty(data.description, NO_DESCRIPTION),
        categories: categories_or_unknown(normalize_tags(data.subjects)),
        published_date: data.publish_date.unwrap_or_default(),
        publisher: normalize_tags(data.publishers)
            .into_iter()
            .next()
            .unwrap_or_default(),
        page_count: data.number_of_pages.filter(|n| *n > 0),
        isbn: isbn.clone(),
        source: "OpenLibrary".to_string(),
        embedding: None,
    })
}

/// Fallback provider: the OpenLibrary brief volumes API.
pub struct OpenLibraryClient {
    client: Client,
    base_url: String,
}

impl OpenLibraryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BookProvider for OpenLibraryClient {
    fn name(&self) -> &'static str {
        "OpenLibrary"
    }

    async fn fetch(&self, isbn: &Isbn) -> Result<Option<BookRecord>> {
        let url = format!("{}/{}.json", self.base_url, isbn);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::OK => {
                // an unknown ISBN comes back as `[]` or `{}`
                let body: serde_json::Value = response.json().await?;
                if !body.is_object() {
                    return Ok(None);
                }
                let brief: OpenLibraryBrief = serde_json::from_value(body)?;
                Ok(openlibrary_record(isbn, brief))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(AppError::ExternalService(format!(
                "OpenLibrary returned {}",
                status
            ))),
        }
    }
}

// ---- Fallback chain ----

/// Tries each provider in order and returns the first record found.
///
/// Provider failures (timeouts, transport errors, bad payloads) count as
/// "not found" for that provider.
#[derive(Clone)]
pub struct FallbackLookup {
    providers: Vec<Arc<dyn BookProvider>>,
}

impl FallbackLookup {
    pub fn new(providers: Vec<Arc<dyn BookProvider>>) -> Self {
        Self { providers }
    }

    /// Google Books first, OpenLibrary second.
    pub fn standard(
        google_books_url: &str,
        openlibrary_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let providers: Vec<Arc<dyn BookProvider>> = vec![
            Arc::new(GoogleBooksClient::new(google_books_url, timeout)?),
            Arc::new(OpenLibraryClient::new(openlibrary_url, timeout)?),
        ];
        Ok(Self::new(providers))
    }
}

#[async_trait]
impl MetadataLookup for FallbackLookup {
    async fn lookup(&self, isbn: &Isbn) -> Result<Option<BookRecord>> {
        if isbn.is_empty() {
            return Ok(None);
        }

        for provider in &self.providers {
            match provider.fetch(isbn).await {
                Ok(Some(book)) => {
                    info!("Found ISBN {} via {}: '{}'", isbn, provider.name(), book.title);
                    return Ok(Some(book));
                }
                Ok(None) => debug!("{} has no record for ISBN {}", provider.name(), isbn),
                Err(e) => warn!("{} lookup failed for ISBN {}: {}", provider.name(), isbn, e),
            }
        }

        Ok(None)
    }
}

use crate::ml::Embedding;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

static NON_ISBN_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9X]").expect("valid regex"));

/// Canonical ISBN: upper-cased, stripped of everything except digits and `X`.
///
/// Every ISBN entering the system goes through [`Isbn::new`], so two records
/// compare equal here exactly when they dedup against each other in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Isbn(String);

impl Isbn {
    pub fn new(raw: &str) -> Self {
        Self(NON_ISBN_CHARS.replace_all(&raw.to_uppercase(), "").into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Isbn {
    fn from(raw: String) -> Self {
        Isbn::new(&raw)
    }
}

impl From<Isbn> for String {
    fn from(isbn: Isbn) -> Self {
        isbn.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A provider tag, either a bare string or an object carrying a `name`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Tag {
    Plain(String),
    Named {
        #[serde(default)]
        name: Option<String>,
    },
    Other(serde_json::Value),
}

impl Tag {
    /// String form of a tag; structured tags without a name become `"Unknown"`.
    pub(crate) fn into_label(self) -> String {
        match self {
            Tag::Plain(label) => label,
            Tag::Named { name } => name.unwrap_or_else(|| "Unknown".to_string()),
            Tag::Other(serde_json::Value::Null) => "Unknown".to_string(),
            Tag::Other(value) => value.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Tag>),
    One(Tag),
}

/// Accepts `null`, a single tag, or a list of tags (strings, `{name}` objects or nulls).
pub(crate) fn normalize_tags(tags: Option<Vec<Tag>>) -> Vec<String> {
    tags.unwrap_or_default()
        .into_iter()
        .map(Tag::into_label)
        .collect()
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(tags)) => normalize_tags(Some(tags)),
        Some(OneOrMany::One(tag)) => vec![tag.into_label()],
    })
}

fn deserialize_authors<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_tags(deserializer).map(unique_authors)
}

fn deserialize_page_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        Int(u32),
        String(String),
    }

    match Option::<StringOrInt>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrInt::Int(0)) => Ok(None),
        Some(StringOrInt::Int(n)) => Ok(Some(n)),
        Some(StringOrInt::String(s)) if s.trim().is_empty() => Ok(None),
        Some(StringOrInt::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(|n| (n > 0).then_some(n))
            .map_err(serde::de::Error::custom),
    }
}

/// Drops blank and repeated author names, keeping first-seen order.
pub(crate) fn unique_authors(authors: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(authors.len());
    for author in authors {
        let author = author.trim().to_string();
        if !author.is_empty() && !seen.contains(&author) {
            seen.push(author);
        }
    }
    seen
}

/// Normalized book metadata as returned by a metadata provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_authors")]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default, deserialize_with = "deserialize_page_count")]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub isbn: Isbn,
    #[serde(default)]
    pub source: String,
    /// Derived on demand; never persisted.
    #[serde(skip)]
    pub embedding: Option<Embedding>,
}

impl BookRecord {
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

impl PartialEq for BookRecord {
    /// Compares metadata only; the cached embedding is not part of a record's identity.
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
            && self.authors == other.authors
            && self.description == other.description
            && self.categories == other.categories
            && self.published_date == other.published_date
            && self.publisher == other.publisher
            && self.page_count == other.page_count
            && self.isbn == other.isbn
            && self.source == other.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_isbn_canonicalization() {
        assert_eq!(Isbn::new("978-0-439-70818-0").as_str(), "9780439708180");
        assert_eq!(Isbn::new(" 0-7475-3269-x ").as_str(), "074753269X");
        assert_eq!(Isbn::new("ISBN 0747532699").as_str(), "0747532699");
        assert!(Isbn::new("abc-def").is_empty());
    }

    #[test]
    fn test_isbn_deserializes_canonical() {
        let isbn: Isbn = serde_json::from_value(json!("978 0 439 70818 0")).unwrap();
        assert_eq!(isbn, Isbn::new("9780439708180"));
        assert_eq!(serde_json::to_value(&isbn).unwrap(), json!("9780439708180"));
    }

    #[test]
    fn test_categories_accept_mixed_shapes() {
        let book: BookRecord = serde_json::from_value(json!({
            "title": "Dune",
            "categories": ["Fiction", {"name": "Science Fiction"}, {"url": "x"}, null]
        }))
        .unwrap();
        assert_eq!(
            book.categories,
            vec!["Fiction", "Science Fiction", "Unknown", "Unknown"]
        );
    }

    #[test]
    fn test_null_or_single_categories() {
        let book: BookRecord =
            serde_json::from_value(json!({"title": "A", "categories": null})).unwrap();
        assert!(book.categories.is_empty());

        let book: BookRecord =
            serde_json::from_value(json!({"title": "A", "categories": "Horror"})).unwrap();
        assert_eq!(book.categories, vec!["Horror"]);
    }

    #[test]
    fn test_authors_are_unique_and_ordered() {
        let book: BookRecord = serde_json::from_value(json!({
            "authors": ["Terry Pratchett", {"name": "Neil Gaiman"}, "Terry Pratchett", " "]
        }))
        .unwrap();
        assert_eq!(book.authors, vec!["Terry Pratchett", "Neil Gaiman"]);
    }

    #[test]
    fn test_page_count_shapes() {
        let book: BookRecord = serde_json::from_value(json!({"page_count": "312"})).unwrap();
        assert_eq!(book.page_count, Some(312));
        let book: BookRecord = serde_json::from_value(json!({"page_count": 0})).unwrap();
        assert_eq!(book.page_count, None);
        let book: BookRecord = serde_json::from_value(json!({"page_count": ""})).unwrap();
        assert_eq!(book.page_count, None);
    }

    #[test]
    fn test_embedding_is_not_serialized() {
        let book = BookRecord {
            title: "A".into(),
            embedding: Some(Embedding::from_raw(vec![1.0, 0.0]).unwrap()),
            ..Default::default()
        };
        let value = serde_json::to_value(&book).unwrap();
        assert!(value.get("embedding").is_none());
    }
}

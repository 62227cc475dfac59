//! External course catalog integration
//!
//! - [`client`]: one search request per (subject, number, term, campus filter)
//! - [`resolver`]: term/campus fallback and match ranking over the client

pub mod client;
pub mod resolver;

pub use client::{courses_from_body, CatalogClient};
pub use resolver::{CourseLookup, CourseResolver, LookupError};

use async_trait::async_trait;
use dars_common::models::{ResolvedCourse, Units, NOT_FOUND_TITLE};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Catalog client errors
///
/// The resolver treats every variant the same way ("no results this term"),
/// but they stay distinct for logging.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Expected JSON but got {0}: {1}")]
    ContentType(String, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One catalog search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Upper-cased subject
    pub subject: String,
    /// Catalog number as given (e.g. "2231H")
    pub number: String,
    pub term: u32,
    /// Restrict to the configured campus
    pub campus_filter: bool,
}

impl CatalogQuery {
    /// Free-text `q` parameter
    pub fn search_text(&self) -> String {
        format!("{} {}", self.subject, self.number)
    }
}

/// Course identifier; the catalog emits both strings and numbers
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CatalogId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogId::Text(s) => f.write_str(s),
            CatalogId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Text field the catalog sometimes sends as a number
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<CatalogId>::deserialize(deserializer)?.map(|v| v.to_string()))
}

/// Candidate course record returned by a catalog search
///
/// Every field is optional; the catalog fills them inconsistently.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCourse {
    #[serde(default, deserialize_with = "string_or_number")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub catalog_number: Option<String>,
    pub title: Option<String>,
    pub long_desc: Option<String>,
    pub max_units: Option<Units>,
    pub units: Option<Units>,
    pub min_units: Option<Units>,
    pub description: Option<String>,
    pub long_description: Option<String>,
    pub course_id: Option<CatalogId>,
    pub id: Option<CatalogId>,
}

impl CatalogCourse {
    /// Subject trimmed and upper-cased, empty when absent
    pub fn normalized_subject(&self) -> String {
        self.subject
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_uppercase()
    }

    pub fn catalog_number(&self) -> &str {
        self.catalog_number.as_deref().unwrap_or_default()
    }

    /// `courseId`, else `id`
    pub fn identifier(&self) -> Option<String> {
        self.course_id
            .as_ref()
            .or(self.id.as_ref())
            .map(|id| id.to_string())
    }

    /// Credit value: max units, else units, else min units, else 0
    pub fn credit_units(&self) -> Units {
        self.max_units
            .clone()
            .or_else(|| self.units.clone())
            .or_else(|| self.min_units.clone())
            .unwrap_or_default()
    }

    /// Convert a matched candidate, filling gaps from the query
    pub fn to_resolved(&self, fallback_subject: &str, fallback_number: &str) -> ResolvedCourse {
        let subject = match self.normalized_subject() {
            s if s.is_empty() => fallback_subject.to_string(),
            s => s,
        };

        ResolvedCourse {
            subject,
            class_number: self
                .catalog_number
                .clone()
                .unwrap_or_else(|| fallback_number.to_string()),
            title: self
                .title
                .clone()
                .or_else(|| self.long_desc.clone())
                .unwrap_or_else(|| NOT_FOUND_TITLE.to_string()),
            units: self.credit_units(),
            description: self
                .description
                .clone()
                .or_else(|| self.long_description.clone())
                .unwrap_or_default(),
            course_id: self.identifier(),
            not_found: false,
            status: None,
        }
    }
}

/// Catalog search seam
///
/// Implemented by [`CatalogClient`] over HTTP; tests substitute scripted catalogs.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Run one search; no retries
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogCourse>, CatalogError>;
}

//! Course resolver
//!
//! Turns a bare "SUBJECT NUMBER" reference into one catalog record. The catalog
//! covers terms and campuses unevenly, so each configured term is tried in
//! priority order:
//!
//! 1. Campus-filtered search. Accept an exact catalog-number match, else a
//!    core match (digits only, so `2231H` matches `2231`). Never an arbitrary hit.
//! 2. Otherwise the same search without the campus filter. Accept a core match,
//!    else the first candidate.
//! 3. Nothing in either pass: next term.
//!
//! A failed filtered search skips the term; a failed unfiltered search counts as
//! empty. When every term is exhausted the result is a not-found record.
//! Resolution itself never fails.

use super::{CatalogCourse, CatalogQuery, CatalogSearch};
use async_trait::async_trait;
use dars_common::ResolvedCourse;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure of a lookup below the resolver's own guarantees
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Course lookup seam used by the aggregator
#[async_trait]
pub trait CourseLookup: Send + Sync {
    async fn lookup(&self, subject: &str, number: &str) -> Result<ResolvedCourse, LookupError>;
}

/// Normalized form of one course reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCourse {
    /// Trimmed, upper-cased subject
    pub subject: String,
    /// Trimmed number as given
    pub number_raw: String,
    /// Digits of the number only
    pub number_core: String,
}

impl NormalizedCourse {
    pub fn new(subject: &str, number: &str) -> Self {
        let number_raw = number.trim().to_string();
        let number_core = digits_only(&number_raw);
        Self {
            subject: subject.trim().to_uppercase(),
            number_raw,
            number_core,
        }
    }

    fn query(&self, term: u32, campus_filter: bool) -> CatalogQuery {
        CatalogQuery {
            subject: self.subject.clone(),
            number: self.number_raw.clone(),
            term,
            campus_filter,
        }
    }

    fn is_exact_match(&self, candidate: &CatalogCourse) -> bool {
        candidate.normalized_subject() == self.subject
            && strip_whitespace(candidate.catalog_number()) == strip_whitespace(&self.number_raw)
    }

    fn is_core_match(&self, candidate: &CatalogCourse) -> bool {
        candidate.normalized_subject() == self.subject
            && digits_only(candidate.catalog_number()) == self.number_core
    }
}

fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Candidates a record can be built from; ones without an identifier never count
fn identified(candidates: &[CatalogCourse]) -> impl Iterator<Item = &CatalogCourse> {
    candidates.iter().filter(|c| c.identifier().is_some())
}

/// Pick from campus-filtered candidates: exact match, else core match
pub fn select_filtered<'a>(
    candidates: &'a [CatalogCourse],
    course: &NormalizedCourse,
) -> Option<&'a CatalogCourse> {
    identified(candidates)
        .find(|c| course.is_exact_match(c))
        .or_else(|| identified(candidates).find(|c| course.is_core_match(c)))
}

/// Pick from unfiltered candidates: core match, else the first candidate
pub fn select_unfiltered<'a>(
    candidates: &'a [CatalogCourse],
    course: &NormalizedCourse,
) -> Option<&'a CatalogCourse> {
    identified(candidates)
        .find(|c| course.is_core_match(c))
        .or_else(|| identified(candidates).next())
}

/// Course resolver over a catalog search backend
#[derive(Clone)]
pub struct CourseResolver {
    catalog: Arc<dyn CatalogSearch>,
    terms: Vec<u32>,
}

impl CourseResolver {
    /// Create a resolver querying `terms` in the given priority order
    pub fn new(catalog: Arc<dyn CatalogSearch>, terms: Vec<u32>) -> Self {
        Self { catalog, terms }
    }

    pub fn terms(&self) -> &[u32] {
        &self.terms
    }

    /// Resolve one course; every failure degrades to a not-found record
    pub async fn resolve(&self, subject: &str, number: &str) -> ResolvedCourse {
        let course = NormalizedCourse::new(subject, number);

        for &term in &self.terms {
            let filtered = match self.catalog.search(&course.query(term, true)).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(
                        subject = %course.subject,
                        number = %course.number_raw,
                        term = term,
                        error = %e,
                        "Catalog query failed, trying next term"
                    );
                    continue;
                }
            };

            if let Some(hit) = select_filtered(&filtered, &course) {
                return self.found(hit, &course, term, true);
            }

            let unfiltered = match self.catalog.search(&course.query(term, false)).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(
                        subject = %course.subject,
                        number = %course.number_raw,
                        term = term,
                        error = %e,
                        "Catalog query without campus filter failed"
                    );
                    Vec::new()
                }
            };

            if let Some(hit) = select_unfiltered(&unfiltered, &course) {
                return self.found(hit, &course, term, false);
            }

            debug!(
                subject = %course.subject,
                number = %course.number_raw,
                term = term,
                filtered = filtered.len(),
                "No catalog match in term"
            );
        }

        info!(
            subject = %course.subject,
            number = %course.number_raw,
            terms = self.terms.len(),
            "Course not found in any term"
        );
        ResolvedCourse::not_found(course.subject, course.number_raw)
    }

    fn found(
        &self,
        hit: &CatalogCourse,
        course: &NormalizedCourse,
        term: u32,
        campus_filter: bool,
    ) -> ResolvedCourse {
        let resolved = hit.to_resolved(&course.subject, &course.number_raw);
        info!(
            subject = %resolved.subject,
            number = %resolved.class_number,
            title = %resolved.title,
            term = term,
            campus_filter = campus_filter,
            "Resolved course from catalog"
        );
        resolved
    }
}

#[async_trait]
impl CourseLookup for CourseResolver {
    async fn lookup(&self, subject: &str, number: &str) -> Result<ResolvedCourse, LookupError> {
        Ok(self.resolve(subject, number).await)
    }
}

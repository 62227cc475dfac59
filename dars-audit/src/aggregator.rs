//! Requirement aggregator
//!
//! Resolves every course reference of one requirement and totals credits per
//! completion bucket. References are looked up in bucket order (completed,
//! incompleted, in progress) as a fold into a map keyed by reference, so the
//! result depends only on the input lists, never on lookup completion order.
//!
//! The map is handed back whole. If the cancellation token fires, the fold stops
//! at the next suspension point and no partial map escapes.

use crate::catalog::CourseLookup;
use dars_common::{CourseReference, CourseStatus, Error, Requirement, ResolvedCourse, Result};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bucket order used for lookups
const BUCKETS: [CourseStatus; 3] = [
    CourseStatus::Completed,
    CourseStatus::Incompleted,
    CourseStatus::InProgress,
];

/// Credit sums per completion bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTotals {
    pub completed: f64,
    pub incompleted: f64,
    pub in_progress: f64,
}

impl CreditTotals {
    pub fn get(&self, status: CourseStatus) -> f64 {
        match status {
            CourseStatus::Completed => self.completed,
            CourseStatus::Incompleted => self.incompleted,
            CourseStatus::InProgress => self.in_progress,
        }
    }
}

/// Resolved view of one requirement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementCourses {
    /// Reference string -> resolved record tagged with its bucket
    pub courses: BTreeMap<String, ResolvedCourse>,
    pub totals: CreditTotals,
}

impl RequirementCourses {
    pub fn get(&self, reference: &str) -> Option<&ResolvedCourse> {
        self.courses.get(reference)
    }

    /// "SUBJECT NUMBER: Title" for a reference, or the reference itself if unresolved
    pub fn display_label(&self, reference: &str) -> String {
        self.get(reference)
            .map(ResolvedCourse::display_label)
            .unwrap_or_else(|| reference.to_string())
    }

    /// Credits cell for a reference; "N/A" when unknown or zero
    pub fn credits_label(&self, reference: &str) -> String {
        self.get(reference)
            .map(ResolvedCourse::credits_label)
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Sum the credits of a bucket's references; references without an entry add 0
pub fn bucket_credits(references: &[String], courses: &BTreeMap<String, ResolvedCourse>) -> f64 {
    references
        .iter()
        .map(|r| courses.get(r).map(ResolvedCourse::credits).unwrap_or(0.0))
        .sum()
}

/// Requirement aggregator over a course lookup
#[derive(Clone)]
pub struct RequirementAggregator {
    lookup: Arc<dyn CourseLookup>,
    max_concurrent: usize,
}

impl RequirementAggregator {
    /// Strictly sequential aggregator
    pub fn new(lookup: Arc<dyn CourseLookup>) -> Self {
        Self::with_concurrency(lookup, 1)
    }

    /// Aggregator allowing up to `max_concurrent` lookups in flight
    pub fn with_concurrency(lookup: Arc<dyn CourseLookup>, max_concurrent: usize) -> Self {
        Self {
            lookup,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Resolve all course references of a requirement
    ///
    /// # Errors
    /// Returns `Error::Cancelled` if `cancel` fires before the map is complete.
    /// Lookup failures never surface; they become "Unavailable" entries.
    pub async fn resolve_all(
        &self,
        requirement: &Requirement,
        cancel: &CancellationToken,
    ) -> Result<RequirementCourses> {
        let classes = requirement.classes();
        let work: Vec<(String, CourseStatus)> = BUCKETS
            .iter()
            .flat_map(|&status| {
                classes
                    .bucket(status)
                    .iter()
                    .map(move |reference| (reference.clone(), status))
            })
            .collect();

        debug!(
            requirement_id = requirement.id(),
            references = work.len(),
            max_concurrent = self.max_concurrent,
            "Aggregating requirement courses"
        );

        if cancel.is_cancelled() {
            return Err(cancelled(requirement));
        }

        let lookups = work.into_iter().map(|(reference, status)| {
            let lookup = Arc::clone(&self.lookup);
            async move {
                let parts = CourseReference::parse(&reference);
                let outcome = lookup.lookup(&parts.subject, &parts.number).await;
                let record = match outcome {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(
                            reference = %reference,
                            error = %e,
                            "Course lookup failed, marking unavailable"
                        );
                        ResolvedCourse::unavailable(parts.subject, parts.number)
                    }
                };
                (reference, record.with_status(status))
            }
        });

        // `buffered` yields in input order, so later buckets win ties deterministically
        let mut results = stream::iter(lookups).buffered(self.max_concurrent);
        let mut courses = BTreeMap::new();

        while let Some((reference, record)) = results.next().await {
            if cancel.is_cancelled() {
                info!(
                    requirement_id = requirement.id(),
                    resolved = courses.len(),
                    "Aggregation cancelled, discarding partial results"
                );
                return Err(cancelled(requirement));
            }
            courses.insert(reference, record);
        }

        let totals = CreditTotals {
            completed: bucket_credits(&classes.completed, &courses),
            incompleted: bucket_credits(&classes.incompleted, &courses),
            in_progress: bucket_credits(&classes.in_progress, &courses),
        };

        info!(
            requirement_id = requirement.id(),
            courses = courses.len(),
            completed_credits = totals.completed,
            incompleted_credits = totals.incompleted,
            "Requirement aggregation complete"
        );

        Ok(RequirementCourses { courses, totals })
    }
}

fn cancelled(requirement: &Requirement) -> Error {
    Error::Cancelled(format!(
        "aggregation of requirement {} abandoned",
        requirement.id()
    ))
}

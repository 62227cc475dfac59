//! Degree audit data model
//!
//! Requirements are produced by the audit parser; resolved course records are
//! produced by the course resolver and tagged with a bucket by the aggregator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used for a course reference no catalog term could resolve
pub const NOT_FOUND_TITLE: &str = "Course not found";

/// Title used when the lookup itself failed at the transport layer
pub const UNAVAILABLE_TITLE: &str = "Unavailable";

/// Description paired with [`UNAVAILABLE_TITLE`]
pub const UNAVAILABLE_DESCRIPTION: &str = "Could not load course details.";

/// Completion bucket a course reference belongs to within one requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CourseStatus {
    Completed,
    Incompleted,
    InProgress,
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CourseStatus::Completed => "completed",
            CourseStatus::Incompleted => "incompleted",
            CourseStatus::InProgress => "inProgress",
        };
        f.write_str(s)
    }
}

/// Course-reference lists of one requirement, by completion state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementClasses {
    pub completed: Vec<String>,
    pub incompleted: Vec<String>,
    pub in_progress: Vec<String>,
}

impl RequirementClasses {
    /// References of one bucket, in document order
    pub fn bucket(&self, status: CourseStatus) -> &[String] {
        match status {
            CourseStatus::Completed => &self.completed,
            CourseStatus::Incompleted => &self.incompleted,
            CourseStatus::InProgress => &self.in_progress,
        }
    }

    /// Total number of references across all buckets
    pub fn len(&self) -> usize {
        self.completed.len() + self.incompleted.len() + self.in_progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One row of a completed-courses table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakenCourse {
    /// Term label as printed in the audit (e.g. "AU24")
    pub term: String,
    /// Course label after subject carryover
    pub course: String,
    /// Credit hours, 0 when the cell is missing or not numeric
    pub credit: f64,
    pub grade: String,
    pub in_progress: bool,
}

/// One degree-audit section grouping course references by completion state
///
/// Built once by the parser; `is_completed` is derived at construction and
/// the record exposes no mutators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    id: usize,
    title: String,
    #[serde(rename = "class")]
    classes: RequirementClasses,
    is_completed: bool,
    taken: Vec<TakenCourse>,
}

impl Requirement {
    pub fn new(
        id: usize,
        title: impl Into<String>,
        classes: RequirementClasses,
        taken: Vec<TakenCourse>,
    ) -> Self {
        let is_completed = classes.incompleted.is_empty() && classes.in_progress.is_empty();
        Self {
            id,
            title: title.into(),
            classes,
            is_completed,
            taken,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn classes(&self) -> &RequirementClasses {
        &self.classes
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Completed-table rows, including in-progress ones
    pub fn taken(&self) -> &[TakenCourse] {
        &self.taken
    }
}

/// Split parsed requirements into (incomplete, completed), preserving order
pub fn partition_by_completion(requirements: &[Requirement]) -> (Vec<&Requirement>, Vec<&Requirement>) {
    requirements.iter().partition(|r| !r.is_completed())
}

/// A "SUBJECT NUMBER" course reference split into its two tokens
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseReference {
    pub subject: String,
    pub number: String,
}

impl CourseReference {
    /// Split a reference on whitespace; absent tokens become empty strings
    pub fn parse(reference: &str) -> Self {
        let mut tokens = reference.split_whitespace();
        let subject = tokens.next().unwrap_or_default().to_string();
        let number = tokens.next().unwrap_or_default().to_string();
        Self { subject, number }
    }
}

impl fmt::Display for CourseReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.subject, self.number)
    }
}

/// Credit value as reported by the catalog
///
/// The catalog is inconsistent about whether credits are numbers or numeric
/// strings, so the reported form is kept and coerced on use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Units {
    Number(f64),
    Text(String),
}

impl Units {
    /// Credit hours as a number; non-numeric values count as 0
    pub fn credits(&self) -> f64 {
        match self {
            Units::Number(n) if n.is_finite() => *n,
            Units::Number(_) => 0.0,
            Units::Text(s) => parse_leading_number(s).unwrap_or(0.0),
        }
    }
}

impl Default for Units {
    fn default() -> Self {
        Units::Number(0.0)
    }
}

impl From<f64> for Units {
    fn from(n: f64) -> Self {
        Units::Number(n)
    }
}

impl From<&str> for Units {
    fn from(s: &str) -> Self {
        Units::Text(s.to_string())
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Number(n) => write!(f, "{}", n),
            Units::Text(s) => f.write_str(s),
        }
    }
}

/// Parse the numeric prefix of a string (`"3.0 hrs"` -> 3.0)
///
/// Leading whitespace is skipped. Returns `None` when no digits lead the string.
pub fn parse_leading_number(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when digits follow it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

/// Catalog metadata for one course reference, or an unresolved sentinel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCourse {
    pub subject: String,
    pub class_number: String,
    pub title: String,
    pub units: Units,
    pub description: String,
    #[serde(rename = "courseID")]
    pub course_id: Option<String>,
    pub not_found: bool,
    /// Bucket tag, set by the aggregator only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CourseStatus>,
}

impl ResolvedCourse {
    /// Record for a reference that no catalog term resolved
    pub fn not_found(subject: impl Into<String>, class_number: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            class_number: class_number.into(),
            title: NOT_FOUND_TITLE.to_string(),
            units: Units::default(),
            description: String::new(),
            course_id: None,
            not_found: true,
            status: None,
        }
    }

    /// Record for a reference whose lookup failed outright
    pub fn unavailable(subject: impl Into<String>, class_number: impl Into<String>) -> Self {
        Self {
            title: UNAVAILABLE_TITLE.to_string(),
            description: UNAVAILABLE_DESCRIPTION.to_string(),
            ..Self::not_found(subject, class_number)
        }
    }

    pub fn with_status(mut self, status: CourseStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Credit hours as a number
    pub fn credits(&self) -> f64 {
        self.units.credits()
    }

    /// "SUBJECT NUMBER: Title", as listed in course tables
    pub fn display_label(&self) -> String {
        format!("{} {}: {}", self.subject, self.class_number, self.title)
    }

    /// Credits cell text; zero credits render as "N/A"
    pub fn credits_label(&self) -> String {
        if self.credits() == 0.0 {
            "N/A".to_string()
        } else {
            self.units.to_string()
        }
    }
}

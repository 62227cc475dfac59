//! Degree audit parser
//!
//! Infers requirements and their course references from the audit's HTML.
//! The only reliable signals are class names and nesting:
//!
//! - `reqTitle` nodes name a requirement
//! - the closest `requirement` ancestor bounds its section
//! - `completedCourses` tables hold `takenCourse` rows (`ip` marks in-progress)
//!   with `term`, `course`, `credit` and `grade` cells
//! - nodes tagged both `course` and `draggable` are still-needed courses
//!
//! Structural absence never fails the parse; missing cells degrade to empty
//! strings or zero credits.

use crate::document::AuditDocument;
use dars_common::models::parse_leading_number;
use dars_common::{Requirement, RequirementClasses, Result, TakenCourse};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

/// Administrative and non-degree sections, matched case-insensitively against the full title
pub const EXCLUDED_TITLES: &[&str] = &[
    "current/ future term schedule",
    "computer science engineering required non-major coursework",
    "THEMATIC PATHWAYS - COMPLETE THE CITIZENSHIP FOR A DIVERSE AND JUST WORLD THEME AND ONE ADDITIONAL THEME",
    "TRANSFER CREDIT: COURSE WORK THAT APPEARS HERE WILL NOT APPLY TO ANY DEGREE REQUIREMENTS.",
    "GENERAL GRADUATION REQUIREMENTS (MINIMUM HOURS: 126)",
    "general education reflection",
    "BASIC MATH & SCIENCE - ABET REQUIREMENTS: 30 HR MIN",
    "THEMATIC PATHWAYS - COMPLETE THE CITIZENSHIP FOR A DIVERSEAND JUST WORLD THEME AND ONE ADDITIONAL THEME.",
];

/// True if a requirement title names an excluded section
pub fn is_excluded_title(title: &str) -> bool {
    let lowered = title.to_lowercase();
    EXCLUDED_TITLES.iter().any(|ex| ex.to_lowercase() == lowered)
}

/// A label made only of digits, e.g. the "2321" printed under "CSE 2231H"
fn is_numeric_label(label: &str) -> bool {
    !label.is_empty() && label.chars().all(|c| c.is_ascii_digit())
}

/// Subject carried from row to row within one requirement section
///
/// The audit sometimes prints only a catalog number for a course sharing the
/// subject of the row before it. The most recent two-token label sets the
/// subject; a purely numeric label borrows it. One value is threaded through
/// the completed-course scan and then the still-needed scan, in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectCarryover {
    last_subject: Option<String>,
}

impl SubjectCarryover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_subject(&self) -> Option<&str> {
        self.last_subject.as_deref()
    }

    /// Normalize one course label and advance the carried subject
    pub fn apply(&mut self, raw_label: &str) -> String {
        let tokens: Vec<&str> = raw_label.split_whitespace().collect();
        let label = tokens.join(" ");

        if is_numeric_label(&label) {
            return match &self.last_subject {
                Some(subject) => format!("{} {}", subject, label),
                None => label,
            };
        }

        if tokens.len() == 2 {
            self.last_subject = Some(tokens[0].to_string());
        }
        label
    }
}

/// Compiled class selectors used by the parser
#[derive(Debug, Clone)]
struct AuditSelectors {
    req_title: Selector,
    completed_courses: Selector,
    taken_course: Selector,
    term: Selector,
    course: Selector,
    credit: Selector,
    grade: Selector,
    draggable_course: Selector,
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static audit selector must parse")
}

impl AuditSelectors {
    fn new() -> Self {
        Self {
            req_title: selector(".reqTitle"),
            completed_courses: selector(".completedCourses"),
            taken_course: selector(".takenCourse"),
            term: selector(".term"),
            course: selector(".course"),
            credit: selector(".credit"),
            grade: selector(".grade"),
            draggable_course: selector(".course.draggable"),
        }
    }
}

fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn trimmed_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Closest element, starting at `element` itself, carrying the `requirement` class
fn enclosing_requirement<'a>(element: ElementRef<'a>) -> Option<ElementRef<'a>> {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .find(|el| has_class(el, "requirement"))
}

/// Degree audit parser
#[derive(Debug, Clone)]
pub struct AuditParser {
    selectors: AuditSelectors,
}

impl AuditParser {
    pub fn new() -> Self {
        Self {
            selectors: AuditSelectors::new(),
        }
    }

    /// Parse an uploaded audit document
    pub fn parse(&self, document: &AuditDocument) -> Vec<Requirement> {
        self.parse_html(document.html())
    }

    /// Decode and parse raw upload bytes
    ///
    /// # Errors
    /// Returns `Error::DocumentLoad` if the bytes are not valid UTF-8
    pub fn parse_bytes(&self, bytes: Vec<u8>) -> Result<Vec<Requirement>> {
        let document = AuditDocument::from_bytes(bytes)?;
        Ok(self.parse(&document))
    }

    /// Parse audit HTML into requirements, in document order with dense ids
    pub fn parse_html(&self, html: &str) -> Vec<Requirement> {
        let doc = Html::parse_document(html);
        let mut requirements = Vec::new();
        let mut excluded = 0usize;

        for title_el in doc.select(&self.selectors.req_title) {
            let title = trimmed_text(&title_el);
            if is_excluded_title(&title) {
                debug!(title = %title, "Skipping excluded audit section");
                excluded += 1;
                continue;
            }

            let scan = match enclosing_requirement(title_el) {
                Some(section) => self.scan_section(section),
                None => {
                    debug!(title = %title, "Requirement title has no enclosing section");
                    SectionScan::default()
                }
            };

            let requirement = Requirement::new(
                requirements.len(),
                title,
                scan.classes,
                scan.taken,
            );

            debug!(
                id = requirement.id(),
                title = %requirement.title(),
                completed = requirement.classes().completed.len(),
                incompleted = requirement.classes().incompleted.len(),
                in_progress = requirement.classes().in_progress.len(),
                "Parsed requirement"
            );

            requirements.push(requirement);
        }

        info!(
            requirements = requirements.len(),
            excluded = excluded,
            "Parsed degree audit"
        );

        requirements
    }

    fn scan_section(&self, section: ElementRef<'_>) -> SectionScan {
        let (taken, carryover) = self.scan_taken_courses(section, SubjectCarryover::new());
        let (incompleted, _) = self.scan_needed_courses(section, carryover);

        let mut classes = RequirementClasses {
            incompleted,
            ..RequirementClasses::default()
        };
        for row in &taken {
            if row.in_progress {
                classes.in_progress.push(row.course.clone());
            } else {
                classes.completed.push(row.course.clone());
            }
        }

        SectionScan { classes, taken }
    }

    /// Scan completed-course tables; returns the rows and the carried subject
    pub fn scan_taken_courses(
        &self,
        section: ElementRef<'_>,
        mut carryover: SubjectCarryover,
    ) -> (Vec<TakenCourse>, SubjectCarryover) {
        let sel = &self.selectors;
        let mut rows = Vec::new();

        for table in section.select(&sel.completed_courses) {
            for row in table.select(&sel.taken_course) {
                let cell = |s: &Selector| {
                    row.select(s)
                        .next()
                        .map(|el| trimmed_text(&el))
                        .unwrap_or_default()
                };

                let course = carryover.apply(&cell(&sel.course));
                rows.push(TakenCourse {
                    term: cell(&sel.term),
                    course,
                    credit: parse_leading_number(&cell(&sel.credit)).unwrap_or(0.0),
                    grade: cell(&sel.grade),
                    in_progress: has_class(&row, "ip"),
                });
            }
        }

        (rows, carryover)
    }

    /// Scan still-needed course nodes; returns references and the carried subject
    pub fn scan_needed_courses(
        &self,
        section: ElementRef<'_>,
        mut carryover: SubjectCarryover,
    ) -> (Vec<String>, SubjectCarryover) {
        let needed = section
            .select(&self.selectors.draggable_course)
            .map(|el| carryover.apply(&trimmed_text(&el)))
            .collect();
        (needed, carryover)
    }
}

impl Default for AuditParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct SectionScan {
    classes: RequirementClasses,
    taken: Vec<TakenCourse>,
}

//! Test helpers shared by dars-audit integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use dars_audit::catalog::{CatalogCourse, CatalogError, CatalogId, CatalogQuery, CatalogSearch};
use dars_audit::catalog::{CourseLookup, LookupError};
use dars_common::models::Units;
use dars_common::ResolvedCourse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Catalog candidate with an identifier derived from subject and number
pub fn course(subject: &str, number: &str, units: Units) -> CatalogCourse {
    CatalogCourse {
        subject: Some(subject.to_string()),
        catalog_number: Some(number.to_string()),
        title: Some(format!("{} {} title", subject, number)),
        units: Some(units),
        description: Some(format!("About {} {}", subject, number)),
        course_id: Some(CatalogId::Text(format!("{}-{}", subject, number))),
        ..Default::default()
    }
}

enum Scripted {
    Courses(Vec<CatalogCourse>),
    Fail,
}

/// In-memory catalog answering from a script keyed by (q, term, campus filter)
///
/// Unscripted queries return no candidates. Every query is recorded.
#[derive(Default)]
pub struct ScriptedCatalog {
    script: Mutex<HashMap<(String, u32, bool), Scripted>>,
    calls: Mutex<Vec<CatalogQuery>>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, q: &str, term: u32, campus_filter: bool, courses: Vec<CatalogCourse>) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert((q.to_string(), term, campus_filter), Scripted::Courses(courses));
        self
    }

    pub fn fail(self, q: &str, term: u32, campus_filter: bool) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert((q.to_string(), term, campus_filter), Scripted::Fail);
        self
    }

    pub fn calls(&self) -> Vec<CatalogQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSearch for ScriptedCatalog {
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogCourse>, CatalogError> {
        self.calls.lock().unwrap().push(query.clone());
        let key = (query.search_text(), query.term, query.campus_filter);
        match self.script.lock().unwrap().get(&key) {
            Some(Scripted::Courses(courses)) => Ok(courses.clone()),
            Some(Scripted::Fail) => Err(CatalogError::Api(503, "unavailable".to_string())),
            None => Ok(Vec::new()),
        }
    }
}

/// Lookup answering from a fixed table; unknown references are not found
#[derive(Default)]
pub struct TableLookup {
    records: HashMap<String, ResolvedCourse>,
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl TableLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, subject: &str, number: &str, units: Units) -> Self {
        let record = course(subject, number, units).to_resolved(subject, number);
        self.records.insert(format!("{} {}", subject, number), record);
        self
    }

    /// Make lookups of this reference fail at the transport layer
    pub fn failing(mut self, reference: &str) -> Self {
        self.failing.push(reference.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CourseLookup for TableLookup {
    async fn lookup(&self, subject: &str, number: &str) -> Result<ResolvedCourse, LookupError> {
        let key = format!("{} {}", subject, number);
        self.calls.lock().unwrap().push(key.clone());
        if self.failing.contains(&key) {
            return Err(LookupError::Transport(format!("connection reset for {}", key)));
        }
        Ok(self
            .records
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ResolvedCourse::not_found(subject, number)))
    }
}

/// Lookup that sleeps longer for lower catalog numbers, so completion order
/// differs from request order when lookups overlap
pub struct SlowLookup {
    pub inner: TableLookup,
}

#[async_trait]
impl CourseLookup for SlowLookup {
    async fn lookup(&self, subject: &str, number: &str) -> Result<ResolvedCourse, LookupError> {
        let n: u64 = number.chars().filter(char::is_ascii_digit).collect::<String>().parse().unwrap_or(0);
        let delay = 40u64.saturating_sub(n % 40);
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        self.inner.lookup(subject, number).await
    }
}

/// Lookup that signals when it starts and then waits for a release
pub struct GatedLookup {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[async_trait]
impl CourseLookup for GatedLookup {
    async fn lookup(&self, subject: &str, number: &str) -> Result<ResolvedCourse, LookupError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(ResolvedCourse::not_found(subject, number))
    }
}

pub const SAMPLE_AUDIT: &str = include_str!("../fixtures/sample_audit.html");

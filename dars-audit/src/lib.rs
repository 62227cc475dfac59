//! dars-audit library interface
//!
//! Degree audit parsing and course catalog resolution:
//! - [`parser`]: audit HTML -> requirements
//! - [`catalog`]: catalog client and course resolver
//! - [`aggregator`]: per-requirement course map and credit totals
//! - [`session`]: active-document context for front ends

pub mod aggregator;
pub mod catalog;
pub mod document;
pub mod parser;
pub mod session;

pub use aggregator::{CreditTotals, RequirementAggregator, RequirementCourses};
pub use catalog::{CatalogClient, CatalogSearch, CourseLookup, CourseResolver};
pub use document::AuditDocument;
pub use parser::AuditParser;
pub use session::AuditSession;

use dars_common::config::TomlConfig;
use std::sync::Arc;

/// Build a session wired to the HTTP catalog from configuration
pub fn build_session(config: &TomlConfig) -> dars_common::Result<AuditSession> {
    let client = CatalogClient::new(&config.catalog)
        .map_err(|e| dars_common::Error::Config(format!("Catalog client init failed: {}", e)))?;
    let resolver = CourseResolver::new(Arc::new(client), config.catalog.terms.clone());
    let aggregator = RequirementAggregator::with_concurrency(
        Arc::new(resolver),
        config.aggregation.max_concurrent_lookups,
    );
    Ok(AuditSession::new(AuditParser::new(), aggregator))
}

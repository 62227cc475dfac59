//! Audit session context
//!
//! Owns the currently active audit document and its parsed requirements.
//! Uploading a new document or resetting cancels every aggregation started
//! against the previous one, and a finished aggregation is only handed back if
//! its document is still the active one.

use crate::aggregator::{RequirementAggregator, RequirementCourses};
use crate::document::AuditDocument;
use crate::parser::AuditParser;
use dars_common::{Error, Requirement, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Document currently in use, with its parse and cancellation scope
struct ActiveAudit {
    document: Arc<AuditDocument>,
    requirements: Arc<Vec<Requirement>>,
    cancel: CancellationToken,
}

/// Audit session shared by every view of the active document
#[derive(Clone)]
pub struct AuditSession {
    parser: AuditParser,
    aggregator: RequirementAggregator,
    active: Arc<RwLock<Option<ActiveAudit>>>,
}

impl AuditSession {
    pub fn new(parser: AuditParser, aggregator: RequirementAggregator) -> Self {
        Self {
            parser,
            aggregator,
            active: Arc::new(RwLock::new(None)),
        }
    }

    /// Make `document` the active audit and return its requirements
    ///
    /// Aggregations running against the previous document are cancelled.
    pub async fn upload(&self, document: AuditDocument) -> Arc<Vec<Requirement>> {
        let requirements = Arc::new(self.parser.parse(&document));
        let document_id = document.id();

        let previous = self.active.write().await.replace(ActiveAudit {
            document: Arc::new(document),
            requirements: Arc::clone(&requirements),
            cancel: CancellationToken::new(),
        });

        if let Some(previous) = previous {
            previous.cancel.cancel();
            info!(
                replaced = %previous.document.id(),
                "Replaced active audit document"
            );
        }

        info!(
            document_id = %document_id,
            requirements = requirements.len(),
            "Audit document uploaded"
        );

        requirements
    }

    /// Clear the active audit, cancelling its aggregations
    pub async fn reset(&self) {
        if let Some(previous) = self.active.write().await.take() {
            previous.cancel.cancel();
            info!(document_id = %previous.document.id(), "Audit session reset");
        }
    }

    pub async fn active_document(&self) -> Option<Arc<AuditDocument>> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|a| Arc::clone(&a.document))
    }

    pub async fn requirements(&self) -> Option<Arc<Vec<Requirement>>> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|a| Arc::clone(&a.requirements))
    }

    /// Resolve the courses of one requirement of the active document
    ///
    /// # Errors
    /// - `Error::NotFound` if no document is active or the id is unknown
    /// - `Error::Cancelled` if the document changed before aggregation finished
    pub async fn resolve_requirement(&self, requirement_id: usize) -> Result<RequirementCourses> {
        let (document_id, requirement, cancel) = {
            let guard = self.active.read().await;
            let active = guard
                .as_ref()
                .ok_or_else(|| Error::NotFound("no audit document uploaded".to_string()))?;
            let requirement = active
                .requirements
                .iter()
                .find(|r| r.id() == requirement_id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("requirement {}", requirement_id)))?;
            (active.document.id(), requirement, active.cancel.child_token())
        };

        let courses = self.aggregator.resolve_all(&requirement, &cancel).await?;

        if !self.is_current(document_id).await {
            return Err(Error::Cancelled(format!(
                "document {} is no longer active",
                document_id
            )));
        }

        Ok(courses)
    }

    async fn is_current(&self, document_id: Uuid) -> bool {
        self.active
            .read()
            .await
            .as_ref()
            .is_some_and(|a| a.document.id() == document_id)
    }
}

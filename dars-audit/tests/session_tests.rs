//! Audit session lifecycle tests

mod helpers;

use dars_audit::{AuditDocument, AuditParser, AuditSession, RequirementAggregator};
use dars_common::models::Units;
use dars_common::Error;
use helpers::{GatedLookup, TableLookup, SAMPLE_AUDIT};
use std::sync::Arc;
use tokio::sync::Notify;

fn session_with(aggregator: RequirementAggregator) -> AuditSession {
    AuditSession::new(AuditParser::new(), aggregator)
}

fn table_session() -> AuditSession {
    let lookup = TableLookup::new()
        .with("MATH", "1151", Units::from(5.0))
        .with("MATH", "1172", Units::from(5.0))
        .with("STAT", "3470", Units::from(3.0));
    session_with(RequirementAggregator::new(Arc::new(lookup)))
}

#[tokio::test]
async fn test_upload_exposes_requirements() {
    let session = table_session();
    assert!(session.requirements().await.is_none());

    let document = AuditDocument::from_html(SAMPLE_AUDIT);
    let document_id = document.id();
    let requirements = session.upload(document).await;

    assert_eq!(requirements.len(), 3);
    assert_eq!(session.requirements().await.unwrap().len(), 3);
    assert_eq!(session.active_document().await.unwrap().id(), document_id);
}

#[tokio::test]
async fn test_resolve_requirement_of_active_document() {
    let session = table_session();
    session.upload(AuditDocument::from_html(SAMPLE_AUDIT)).await;

    let view = session.resolve_requirement(1).await.unwrap();
    assert_eq!(view.courses.len(), 3);
    assert_eq!(view.totals.completed, 13.0);
}

#[tokio::test]
async fn test_resolve_without_document_is_not_found() {
    let session = table_session();
    let err = session.resolve_requirement(0).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_resolve_unknown_requirement_is_not_found() {
    let session = table_session();
    session.upload(AuditDocument::from_html(SAMPLE_AUDIT)).await;

    let err = session.resolve_requirement(42).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_reset_clears_active_document() {
    let session = table_session();
    session.upload(AuditDocument::from_html(SAMPLE_AUDIT)).await;

    session.reset().await;

    assert!(session.active_document().await.is_none());
    assert!(session.requirements().await.is_none());
    assert!(matches!(
        session.resolve_requirement(0).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_replacing_document_cancels_running_aggregation() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let session = session_with(RequirementAggregator::new(Arc::new(GatedLookup {
        started: started.clone(),
        release: release.clone(),
    })));
    session.upload(AuditDocument::from_html(SAMPLE_AUDIT)).await;

    let running = {
        let session = session.clone();
        tokio::spawn(async move { session.resolve_requirement(0).await })
    };

    started.notified().await;
    let replacement = session
        .upload(AuditDocument::from_html(SAMPLE_AUDIT))
        .await;
    release.notify_one();

    let result = running.await.unwrap();
    assert!(matches!(result, Err(Error::Cancelled(_))));
    // The replacement is live and its requirements are intact
    assert_eq!(replacement.len(), 3);
    assert_eq!(session.requirements().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_reset_cancels_running_aggregation() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let session = session_with(RequirementAggregator::new(Arc::new(GatedLookup {
        started: started.clone(),
        release: release.clone(),
    })));
    session.upload(AuditDocument::from_html(SAMPLE_AUDIT)).await;

    let running = {
        let session = session.clone();
        tokio::spawn(async move { session.resolve_requirement(2).await })
    };

    started.notified().await;
    session.reset().await;
    release.notify_one();

    assert!(matches!(
        running.await.unwrap(),
        Err(Error::Cancelled(_))
    ));
}

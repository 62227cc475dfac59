//! Course resolver integration tests against a scripted catalog

mod helpers;

use dars_audit::catalog::{CatalogCourse, CourseLookup, CourseResolver};
use dars_common::models::{Units, NOT_FOUND_TITLE};
use helpers::{course, ScriptedCatalog};
use std::sync::Arc;

const TERMS: [u32; 4] = [1258, 1254, 1252, 1248];

fn resolver(catalog: &Arc<ScriptedCatalog>) -> CourseResolver {
    CourseResolver::new(catalog.clone(), TERMS.to_vec())
}

#[tokio::test]
async fn test_exact_match_wins_in_first_filtered_query() {
    let catalog = Arc::new(ScriptedCatalog::new().respond(
        "CSE 2231",
        1258,
        true,
        vec![
            course("CSE", "2231H", Units::from(4.0)),
            course("CSE", "2231", Units::from(3.0)),
        ],
    ));

    let record = resolver(&catalog).resolve("CSE", "2231").await;

    assert_eq!(record.class_number, "2231");
    assert_eq!(record.credits(), 3.0);
    assert!(!record.not_found);
    assert_eq!(catalog.calls().len(), 1);
}

#[tokio::test]
async fn test_honors_suffix_resolves_through_core_match() {
    let catalog = Arc::new(ScriptedCatalog::new().respond(
        "CSE 2231H",
        1258,
        true,
        vec![course("CSE", "2231", Units::from(4.0))],
    ));

    let record = resolver(&catalog).resolve("cse", "2231H").await;

    assert_eq!(record.subject, "CSE");
    assert_eq!(record.class_number, "2231");
    assert_eq!(record.course_id.as_deref(), Some("CSE-2231"));
}

#[tokio::test]
async fn test_unfiltered_pass_takes_first_candidate() {
    let catalog = Arc::new(
        ScriptedCatalog::new()
            .respond("CSE 2231", 1258, true, vec![course("ECE", "2231", Units::from(3.0))])
            .respond(
                "CSE 2231",
                1258,
                false,
                vec![
                    course("CSE", "5914", Units::from(2.0)),
                    course("CSE", "3341", Units::from(3.0)),
                ],
            ),
    );

    let record = resolver(&catalog).resolve("CSE", "2231").await;

    assert_eq!(record.class_number, "5914");
    let calls = catalog.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].campus_filter);
    assert!(!calls[1].campus_filter);
}

#[tokio::test]
async fn test_unfiltered_pass_prefers_core_match() {
    let catalog = Arc::new(ScriptedCatalog::new().respond(
        "MATH 1151",
        1258,
        false,
        vec![
            course("MATH", "1150", Units::from(4.0)),
            course("MATH", "1151H", Units::from(5.0)),
        ],
    ));

    let record = resolver(&catalog).resolve("MATH", "1151").await;
    assert_eq!(record.class_number, "1151H");
    assert_eq!(record.credits(), 5.0);
}

#[tokio::test]
async fn test_failed_filtered_query_skips_term() {
    let catalog = Arc::new(
        ScriptedCatalog::new()
            .fail("CSE 3901", 1258, true)
            .respond("CSE 3901", 1258, false, vec![course("CSE", "3901", Units::from(9.0))])
            .respond("CSE 3901", 1254, true, vec![course("CSE", "3901", Units::from(4.0))]),
    );

    let record = resolver(&catalog).resolve("CSE", "3901").await;

    assert_eq!(record.credits(), 4.0);
    let calls: Vec<(u32, bool)> = catalog
        .calls()
        .iter()
        .map(|q| (q.term, q.campus_filter))
        .collect();
    assert_eq!(calls, vec![(1258, true), (1254, true)]);
}

#[tokio::test]
async fn test_failed_unfiltered_query_counts_as_empty() {
    let catalog = Arc::new(
        ScriptedCatalog::new()
            .fail("CSE 3901", 1258, false)
            .respond("CSE 3901", 1252, false, vec![course("CSE", "3901", Units::from(4.0))]),
    );

    let record = resolver(&catalog).resolve("CSE", "3901").await;

    assert!(!record.not_found);
    let terms: Vec<u32> = catalog.calls().iter().map(|q| q.term).collect();
    assert_eq!(terms, vec![1258, 1258, 1254, 1254, 1252, 1252]);
}

#[tokio::test]
async fn test_exhausted_terms_give_not_found() {
    let catalog = Arc::new(ScriptedCatalog::new());

    let record = resolver(&catalog).resolve(" cse ", " 9999X ").await;

    assert!(record.not_found);
    assert_eq!(record.subject, "CSE");
    assert_eq!(record.class_number, "9999X");
    assert_eq!(record.title, NOT_FOUND_TITLE);
    assert_eq!(record.credits(), 0.0);
    assert!(record.course_id.is_none());
    assert_eq!(catalog.calls().len(), TERMS.len() * 2);
}

#[tokio::test]
async fn test_candidates_without_identifier_are_ignored() {
    let anonymous = CatalogCourse {
        course_id: None,
        ..course("CSE", "2221", Units::from(4.0))
    };
    let catalog = Arc::new(
        ScriptedCatalog::new().respond("CSE 2221", 1258, true, vec![anonymous.clone()]),
    );

    let record = resolver(&catalog).resolve("CSE", "2221").await;
    assert!(record.not_found);
    assert!(record.course_id.is_none());
    // Filtered and unfiltered query of every term
    assert_eq!(catalog.calls().len(), TERMS.len() * 2);
}

#[tokio::test]
async fn test_not_found_iff_no_course_id() {
    let catalog = Arc::new(
        ScriptedCatalog::new()
            .respond("CSE 2221", 1254, true, vec![course("CSE", "2221", Units::from(4.0))]),
    );
    let resolver = resolver(&catalog);

    for (subject, number) in [("CSE", "2221"), ("CSE", "3345"), ("PHYS", "1250")] {
        let record = resolver.resolve(subject, number).await;
        assert_eq!(
            record.not_found,
            record.course_id.is_none(),
            "{} {}",
            subject,
            number
        );
    }
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let catalog = Arc::new(
        ScriptedCatalog::new()
            .respond("STAT 3470", 1252, false, vec![course("STAT", "3470", Units::from("3"))]),
    );
    let resolver = resolver(&catalog);

    let first = resolver.resolve("STAT", "3470").await;
    let second = resolver.resolve("STAT", "3470").await;

    assert_eq!(first, second);
    assert_eq!(first.credits(), 3.0);
}

#[tokio::test]
async fn test_lookup_trait_never_errors() {
    let catalog = Arc::new(ScriptedCatalog::new().fail("CSE 2221", 1258, true));
    let resolver = resolver(&catalog);

    let record = resolver.lookup("CSE", "2221").await.unwrap();
    assert!(record.not_found);
}

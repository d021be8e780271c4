use std::num::NonZeroUsize;
use std::time::Duration;

use fixtures::{ProjectFixture, RecordingDiagnostics, SpyStore, aggregator, context, page_path};
use googletest::{
    assert_that,
    prelude::{empty, eq, len},
};
use itertools::Itertools;
use page_tree::store::InMemoryStore;
use page_tree::{AggregationError, AggregatorConfig};

mod fixtures;

#[tokio::test]
async fn home_page_comes_first_followed_by_other_pages_in_declared_order() {
    let store = InMemoryStore::new();
    ProjectFixture::default()
        .with_other_paths(["/about", "/blog", "/contact"])
        .setup(&store)
        .await;
    let aggregator = aggregator(store, RecordingDiagnostics::default());

    let pages = aggregator.aggregate(Some("p1"), &context()).await.unwrap();

    let paths = pages.iter().map(page_path).collect_vec();
    assert_eq!(paths, vec!["/", "/about", "/blog", "/contact"]);
}

#[tokio::test]
async fn a_build_with_only_a_home_page_yields_a_single_element() {
    let store = InMemoryStore::new();
    ProjectFixture::default()
        .with_other_paths(Vec::<String>::new())
        .setup(&store)
        .await;
    let aggregator = aggregator(store, RecordingDiagnostics::default());

    let pages = aggregator.aggregate(Some("p1"), &context()).await.unwrap();

    assert_that!(pages, len(eq(1)));
    assert_eq!(page_path(&pages[0]), "/");
}

#[tokio::test]
async fn canvas_data_is_requested_for_the_published_build_one_page_at_a_time() {
    let store = InMemoryStore::new();
    ProjectFixture::default().setup(&store).await;
    let spy = SpyStore::new(store);
    let tracker = spy.call_tracker();
    let aggregator = aggregator(spy, RecordingDiagnostics::default());

    aggregator.aggregate(Some("p1"), &context()).await.unwrap();

    assert_eq!(
        tracker.operation_log().await,
        vec![
            "load-build p1 prod",
            "load-project p1",
            "load-canvas prod /",
            "load-canvas prod /about",
        ]
    );
}

#[tokio::test]
async fn a_missing_project_id_is_rejected_without_touching_any_store() {
    let store = InMemoryStore::new();
    ProjectFixture::default().setup(&store).await;
    let spy = SpyStore::new(store);
    let tracker = spy.call_tracker();
    let diagnostics = RecordingDiagnostics::default();
    let aggregator = aggregator(spy, diagnostics.clone());

    for project_id in [None, Some("")] {
        let e = aggregator.aggregate(project_id, &context()).await.unwrap_err();
        assert!(matches!(e, AggregationError::MissingParameter));
        assert_eq!(e.status_code().as_u16(), 400);
        assert_eq!(e.to_string(), "Required project id");
    }

    tracker.assert_store_was_untouched().await;
    // Anticipated failures are not reported.
    assert_that!(diagnostics.reports(), empty());
}

#[tokio::test]
async fn an_unpublished_project_fails_before_the_project_store_is_queried() {
    let store = InMemoryStore::new();
    ProjectFixture {
        published: false,
        ..Default::default()
    }
    .setup(&store)
    .await;
    let spy = SpyStore::new(store);
    let tracker = spy.call_tracker();
    let aggregator = aggregator(spy, RecordingDiagnostics::default());

    let e = aggregator.aggregate(Some("p1"), &context()).await.unwrap_err();

    assert!(matches!(e, AggregationError::BuildNotFound { .. }));
    assert_eq!(e.status_code().as_u16(), 500);
    assert!(e.to_string().contains("p1"));
    tracker.assert_project_was_never_loaded().await;
}

#[tokio::test]
async fn a_build_without_a_project_record_is_reported_as_not_found() {
    let store = InMemoryStore::new();
    ProjectFixture {
        with_project_record: false,
        ..Default::default()
    }
    .setup(&store)
    .await;
    let spy = SpyStore::new(store);
    let tracker = spy.call_tracker();
    let aggregator = aggregator(spy, RecordingDiagnostics::default());

    let e = aggregator.aggregate(Some("p1"), &context()).await.unwrap_err();

    assert!(matches!(e, AggregationError::ProjectNotFound));
    assert_eq!(e.status_code().as_u16(), 404);
    assert_eq!(e.to_string(), "Project not found");
    // No canvas data is loaded for a project we couldn't resolve.
    let oplog = tracker.operation_log().await;
    assert!(oplog.iter().all(|op| !op.starts_with("load-canvas")));
}

#[tokio::test]
async fn a_single_failing_page_aborts_the_aggregation_and_is_reported() {
    let store = InMemoryStore::new();
    ProjectFixture::default()
        .with_other_paths(["/about", "/blog", "/contact"])
        .setup(&store)
        .await;
    let spy = SpyStore::new(store).fail_on("/blog");
    let tracker = spy.call_tracker();
    let diagnostics = RecordingDiagnostics::default();
    let aggregator = aggregator(spy, diagnostics.clone());

    let e = aggregator.aggregate(Some("p1"), &context()).await.unwrap_err();

    assert!(e.is_unexpected());
    assert_eq!(e.status_code().as_u16(), 500);
    assert_eq!(e.to_string(), "Canvas storage is unavailable");
    assert_eq!(diagnostics.reports(), vec!["Canvas storage is unavailable"]);
    // Pages after the failing one are never requested.
    let oplog = tracker.operation_log().await;
    assert!(!oplog.contains(&"load-canvas prod /contact".to_string()));
}

#[tokio::test]
async fn a_failing_build_store_stops_the_aggregation_and_is_reported_once() {
    let store = InMemoryStore::new();
    ProjectFixture::default().setup(&store).await;
    let spy = SpyStore::new(store).fail_build_loads();
    let tracker = spy.call_tracker();
    let diagnostics = RecordingDiagnostics::default();
    let aggregator = aggregator(spy, diagnostics.clone());

    let e = aggregator.aggregate(Some("p1"), &context()).await.unwrap_err();

    assert!(e.is_unexpected());
    assert_eq!(e.status_code().as_u16(), 500);
    assert_eq!(e.to_string(), "Build storage is unavailable");
    assert_eq!(diagnostics.reports(), vec!["Build storage is unavailable"]);
    assert_eq!(tracker.operation_log().await, vec!["load-build p1 prod"]);
}

#[tokio::test]
async fn a_failing_project_store_stops_the_aggregation_and_is_reported_once() {
    let store = InMemoryStore::new();
    ProjectFixture::default().setup(&store).await;
    let spy = SpyStore::new(store).fail_project_loads();
    let tracker = spy.call_tracker();
    let diagnostics = RecordingDiagnostics::default();
    let aggregator = aggregator(spy, diagnostics.clone());

    let e = aggregator.aggregate(Some("p1"), &context()).await.unwrap_err();

    assert!(e.is_unexpected());
    assert_eq!(e.status_code().as_u16(), 500);
    assert_eq!(e.to_string(), "Project storage is unavailable");
    assert_eq!(diagnostics.reports(), vec!["Project storage is unavailable"]);
    assert_eq!(
        tracker.operation_log().await,
        vec!["load-build p1 prod", "load-project p1"]
    );
}

#[tokio::test]
async fn repeated_aggregations_over_the_same_state_are_identical() {
    let store = InMemoryStore::new();
    ProjectFixture::default()
        .with_other_paths(["/about", "/blog"])
        .setup(&store)
        .await;
    let aggregator = aggregator(store, RecordingDiagnostics::default());

    let first = aggregator.aggregate(Some("p1"), &context()).await.unwrap();
    let second = aggregator.aggregate(Some("p1"), &context()).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn concurrent_loads_still_return_pages_in_declared_order() {
    let store = InMemoryStore::new();
    ProjectFixture::default()
        .with_other_paths(["/about", "/blog", "/contact"])
        .setup(&store)
        .await;
    // Earlier pages are slower, so they complete last.
    let spy = SpyStore::new(store).with_latencies([
        ("/", Duration::from_millis(60)),
        ("/about", Duration::from_millis(40)),
        ("/blog", Duration::from_millis(20)),
    ]);
    let aggregator = aggregator(spy, RecordingDiagnostics::default()).set_config(AggregatorConfig {
        canvas_fetch_concurrency: NonZeroUsize::new(4).unwrap(),
    });

    let pages = aggregator.aggregate(Some("p1"), &context()).await.unwrap();

    let paths = pages.iter().map(page_path).collect_vec();
    assert_eq!(paths, vec!["/", "/about", "/blog", "/contact"]);
}

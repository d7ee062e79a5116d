use std::sync::Arc;

use wiremock::MockServer;

use oauth_token_cache::{ManualClock, RefreshOutcome, TokenSnapshot};

use crate::common::{authorization, init_logging, mount_token, request_count, t0};

#[tokio::test]
async fn refresh_with_outdated_snapshot_skips_the_endpoint() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "abc", 600, 1).await;

    let auth = authorization(&server, &ManualClock::new(t0()));
    let outdated = auth.snapshot();
    assert_eq!(auth.refresh(&outdated).await, RefreshOutcome::Success);
    assert_eq!(request_count(&server).await, 1);

    let current = auth.snapshot();
    assert_eq!(auth.refresh(&outdated).await, RefreshOutcome::Success);
    assert_eq!(request_count(&server).await, 1);
    assert!(Arc::ptr_eq(&current, &auth.snapshot()));
}

#[tokio::test]
async fn equal_but_distinct_snapshot_counts_as_outdated() {
    init_logging();
    let server = MockServer::start().await;

    let auth = authorization(&server, &ManualClock::new(t0()));
    let lookalike = Arc::new(TokenSnapshot::empty());
    assert_eq!(*lookalike, *auth.snapshot());

    assert_eq!(auth.refresh(&lookalike).await, RefreshOutcome::Success);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn current_snapshot_is_refreshed_even_while_valid() {
    init_logging();
    let server = MockServer::start().await;
    mount_token(&server, "abc", 600, 1).await;
    mount_token(&server, "def", 600, 1).await;

    let auth = authorization(&server, &ManualClock::new(t0()));
    assert_eq!(auth.refresh(&auth.snapshot()).await, RefreshOutcome::Success);
    assert_eq!(auth.refresh(&auth.snapshot()).await, RefreshOutcome::Success);

    assert_eq!(auth.snapshot().access_token(), Some("def"));
    assert_eq!(request_count(&server).await, 2);
}

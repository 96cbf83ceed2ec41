mod support;

use std::time::Duration;

use fittrack_client::{ClientConfig, ConnectionResolver, FitTrackClient};
use fittrack_core::Platform;
use support::{MockBackend, dead_base_url};

fn resolver() -> ConnectionResolver {
    ConnectionResolver::new(Duration::from_millis(500))
}

#[tokio::test]
async fn probe_reflects_health_endpoint() {
    let srv = MockBackend::spawn().await;
    assert!(resolver().probe(&srv.base_url).await);
    assert!(resolver().probe(&format!("{}/", srv.base_url)).await);
    assert!(!resolver().probe(&dead_base_url().await).await);
}

#[tokio::test]
async fn finds_the_only_live_candidate() {
    let live = MockBackend::spawn().await;
    let candidates = vec![
        dead_base_url().await,
        live.base_url.clone(),
        dead_base_url().await,
    ];

    assert_eq!(
        resolver().find_working_connection(&candidates).await,
        Some(live.base_url.clone())
    );
}

#[tokio::test]
async fn no_live_candidate_yields_none() {
    let candidates = vec![dead_base_url().await, dead_base_url().await];
    assert_eq!(resolver().find_working_connection(&candidates).await, None);

    let none: Vec<String> = Vec::new();
    assert_eq!(resolver().find_working_connection(&none).await, None);
}

#[tokio::test]
async fn non_success_health_is_a_failed_probe() {
    let srv = MockBackend::spawn().await;
    // `/api/broken/health` does not exist: 404.
    assert!(!resolver().probe(&format!("{}/broken", srv.base_url)).await);
}

#[tokio::test]
async fn connect_switches_to_a_working_fallback() {
    let live = MockBackend::spawn().await;
    let dead = dead_base_url().await;

    let config = ClientConfig {
        platform: Platform::Native,
        base_url: Some(dead.clone()),
        fallback_urls: vec![dead_base_url().await, live.base_url.clone()],
        probe_timeout: Duration::from_millis(500),
        ..ClientConfig::default()
    };
    let client = FitTrackClient::connect(config).await.unwrap();

    assert_eq!(client.context().base_url().await, live.base_url);
}

#[tokio::test]
async fn connect_keeps_default_when_nothing_answers() {
    let dead = dead_base_url().await;
    let config = ClientConfig {
        platform: Platform::Native,
        base_url: Some(dead.clone()),
        fallback_urls: vec![dead_base_url().await],
        probe_timeout: Duration::from_millis(500),
        ..ClientConfig::default()
    };
    let client = FitTrackClient::connect(config).await.unwrap();

    assert_eq!(client.context().base_url().await, dead);
}

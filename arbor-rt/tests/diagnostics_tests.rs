//! Diagnostics Plane Integration Tests
//!
//! The read-only surface, driven through the axum router:
//!
//! 1. **Graph and deadlocks** - watch edges in the graph, watch-cycle
//!    reports over HTTP.
//! 2. **Tracing** - correlation queries returning traced deliveries.
//! 3. **Snapshots and metrics** - system snapshot shape, lookup, and
//!    `/metrics` exposition format.

#![allow(clippy::unwrap_used)]

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::util::ServiceExt;

// Layer 3: Internal module imports
use arbor_rt::diag::{router, sanitize_metric_name};
use arbor_rt::prelude::*;

struct Sink;

impl Behavior for Sink {
    fn name(&self) -> &str {
        "sink"
    }

    fn receive(&mut self, _ctx: &mut Context, _msg: &Message) -> Result<(), BehaviorError> {
        Ok(())
    }
}

fn quick_system() -> ActorSystem {
    let config = SystemConfig::builder()
        .with_heartbeat_interval(Duration::from_secs(3600))
        .build()
        .unwrap();
    let system = ActorSystem::new(config).unwrap();
    system.start().unwrap();
    system
}

async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

async fn get_json(router: &Router, uri: &str) -> Value {
    let (status, body) = get(router, uri).await;
    assert_eq!(status, StatusCode::OK, "GET {uri} -> {body}");
    serde_json::from_str(&body).unwrap()
}

// ============================================================================
// TEST GROUP 1: Graph and deadlock detection
// ============================================================================

#[tokio::test]
async fn test_watch_cycle_visible_in_graph_and_deadlocks() {
    let system = quick_system();
    let a1 = system
        .create_actor("cyc-1", "t", Box::new(Sink), ActorConfig::default())
        .unwrap();
    let a2 = system
        .create_actor("cyc-2", "t", Box::new(Sink), ActorConfig::default())
        .unwrap();
    system.watch(a1, a2).unwrap();
    system.watch(a2, a1).unwrap();
    let router = router(system.clone());

    let graph = get_json(&router, "/actors/graph").await;
    assert!(graph.get("generatedAt").is_some());
    let edges = graph["edges"].as_array().unwrap();
    let watching = edges
        .iter()
        .filter(|e| e["kind"] == "watching")
        .count();
    assert!(watching >= 2, "expected >= 2 watch edges, got {watching}");

    let reports = get_json(&router, "/actors/deadlocks?minCycle=2").await;
    let reports = reports.as_array().unwrap();
    assert!(!reports.is_empty());
    assert_eq!(reports[0]["kind"], "watch-cycle");
    assert!(reports[0]["size"].as_u64().unwrap() >= 2);

    let ids: Vec<u64> = reports[0]["actorIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap())
        .collect();
    assert!(ids.contains(&a1.as_u64()));
    assert!(ids.contains(&a2.as_u64()));

    system.stop().await.unwrap();
}

#[tokio::test]
async fn test_supervision_edges_in_graph() {
    let system = quick_system();
    let _actor = system
        .create_actor("supervised", "t", Box::new(Sink), ActorConfig::default())
        .unwrap();
    let router = router(system.clone());

    let graph = get_json(&router, "/actors/graph").await;
    let edges = graph["edges"].as_array().unwrap();
    assert!(edges.iter().any(|e| e["kind"] == "supervises"));

    system.stop().await.unwrap();
}

// ============================================================================
// TEST GROUP 2: Tracing and correlation
// ============================================================================

#[tokio::test]
async fn test_correlation_events_over_http() {
    let system = quick_system();
    system.enable_tracing(16);
    let a1 = system
        .create_actor("corr-1", "t", Box::new(Sink), ActorConfig::default())
        .unwrap();
    let a2 = system
        .create_actor("corr-2", "t", Box::new(Sink), ActorConfig::default())
        .unwrap();

    system
        .send_correlated(a1, a2, 1, Payload::from("x"), "C")
        .await
        .unwrap();

    let router = router(system.clone());
    let events = get_json(&router, "/actors/correlation?id=C&n=10").await;
    let events = events.as_array().unwrap();
    assert!(!events.is_empty(), "correlation query must be non-empty");
    assert_eq!(events[0]["sender"].as_u64().unwrap(), a1.as_u64());
    assert_eq!(events[0]["receiver"].as_u64().unwrap(), a2.as_u64());

    system.stop().await.unwrap();
}

#[tokio::test]
async fn test_recent_messages_endpoint() {
    let system = quick_system();
    system.enable_tracing(16);
    let a1 = system
        .create_actor("msg-1", "t", Box::new(Sink), ActorConfig::default())
        .unwrap();
    let a2 = system
        .create_actor("msg-2", "t", Box::new(Sink), ActorConfig::default())
        .unwrap();

    system.send(a1, a2, 7, Payload::from("traced")).await.unwrap();

    let router = router(system.clone());
    let events =
        get_json(&router, &format!("/actors/messages?id={}&n=10", a2.as_u64())).await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"].as_u64().unwrap(), 7);

    system.stop().await.unwrap();
}

// ============================================================================
// TEST GROUP 3: Snapshots, lookup, metrics
// ============================================================================

#[tokio::test]
async fn test_system_snapshot_shape() {
    let system = quick_system();
    system
        .create_actor("shape", "t", Box::new(Sink), ActorConfig::default())
        .unwrap();
    let router = router(system.clone());

    let snapshot = get_json(&router, "/actors").await;
    assert!(snapshot.get("time").is_some());
    assert_eq!(snapshot["actors"].as_array().unwrap().len(), 1);
    assert!(!snapshot["supervisors"].as_array().unwrap().is_empty());
    assert!(snapshot.get("schedulerQueue").is_some());
    assert!(snapshot["statistics"].get("total_created").is_some());

    system.stop().await.unwrap();
}

#[tokio::test]
async fn test_lookup_endpoint_roundtrip() {
    let system = quick_system();
    let id = system
        .create_actor("find-me", "t", Box::new(Sink), ActorConfig::default())
        .unwrap();
    let router = router(system.clone());

    let found = get_json(&router, "/actors/lookup?name=find-me").await;
    assert_eq!(found["id"].as_u64().unwrap(), id.as_u64());
    assert_eq!(found["name"], "find-me");

    let (status, _) = get(&router, "/actors/lookup?name=ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    system.stop().await.unwrap();
}

#[tokio::test]
async fn test_mailbox_endpoint_reports_stats() {
    let system = quick_system();
    let id = system
        .create_actor("mailboxed", "t", Box::new(Sink), ActorConfig::default())
        .unwrap();
    let router = router(system.clone());

    let view = get_json(&router, &format!("/actors/mailbox?id={}", id.as_u64())).await;
    assert_eq!(view["id"].as_u64().unwrap(), id.as_u64());
    assert!(view["stats"].get("enqueued").is_some());

    system.stop().await.unwrap();
}

#[tokio::test]
async fn test_metrics_exposition_format() {
    let system = quick_system();
    system
        .create_actor("metric actor", "t", Box::new(Sink), ActorConfig::default())
        .unwrap();
    let router = router(system.clone());

    let (status, body) = get(&router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("arbor_actors_active"));

    for line in body.lines() {
        let (name, value) = line.split_once(' ').unwrap();
        // Names carry only [A-Za-z0-9_:] after sanitization.
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':'));
        assert_eq!(name, sanitize_metric_name(name));
        assert!(value.parse::<f64>().is_ok());
    }
    // The actor name with a space was sanitized into the metric name.
    assert!(body.contains("arbor_mailbox_len_metric_actor"));

    system.stop().await.unwrap();
}

#[tokio::test]
async fn test_io_endpoints_with_window() {
    let system = quick_system();
    let router = router(system.clone());

    let summary = get_json(&router, "/actors/io").await;
    assert_eq!(summary["total"].as_u64().unwrap(), 0);

    let by_actor = get_json(&router, "/actors/io/actor").await;
    assert!(by_actor.as_array().unwrap().is_empty());

    let top = get_json(&router, "/actors/io/top?n=3").await;
    assert!(top.as_array().unwrap().is_empty());

    let (status, _) = get(&router, "/actors/io?until=garbage").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    system.stop().await.unwrap();
}

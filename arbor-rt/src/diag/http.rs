// Layer 1: Standard library imports
use std::collections::HashMap;
use std::net::SocketAddr;

// Layer 2: Third-party crate imports
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use super::metrics::render_metrics;
use crate::io::{IoEventKind, IoLogQuery};
use crate::system::ActorSystem;
use crate::util::ActorId;

const DEFAULT_EVENT_LIMIT: usize = 50;
const DEFAULT_TOP_LIMIT: usize = 10;

/// Build the diagnostics router over a system handle.
///
/// Every handler takes read locks only, copies what it needs, and
/// encodes the copy.
pub fn router(system: ActorSystem) -> Router {
    Router::new()
        .route("/actors", get(actors))
        .route("/actors/messages", get(messages))
        .route("/actors/graph", get(graph))
        .route("/actors/deadlocks", get(deadlocks))
        .route("/actors/correlation", get(correlation))
        .route("/actors/mailbox", get(mailbox))
        .route("/actors/io", get(io_summary))
        .route("/actors/io/actor", get(io_by_actor))
        .route("/actors/io/top", get(io_top))
        .route("/actors/lookup", get(lookup))
        .route("/metrics", get(metrics))
        .with_state(system)
}

/// Bind and serve the diagnostics plane.
pub async fn serve(system: ActorSystem, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(system)).await
}

#[derive(Debug, Deserialize)]
struct IdNParams {
    id: Option<u64>,
    n: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CorrelationParams {
    id: Option<String>,
    n: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct GraphParams {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct DeadlockParams {
    #[serde(rename = "minCycle")]
    min_cycle: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct WindowParams {
    since: Option<String>,
    until: Option<String>,
    n: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct LookupResult {
    id: ActorId,
    name: String,
}

#[derive(Debug, Serialize)]
struct MailboxView {
    id: ActorId,
    len: usize,
    stats: crate::mailbox::MailboxStatsSnapshot,
}

#[derive(Debug, Default, Serialize)]
struct IoSummary {
    total: u64,
    delivered: u64,
    dropped: u64,
    readable: u64,
    writable: u64,
    error: u64,
}

#[derive(Debug, Serialize)]
struct IoActorSummary {
    #[serde(rename = "actorId")]
    actor_id: ActorId,
    total: u64,
    delivered: u64,
    dropped: u64,
}

fn bad_request(msg: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, msg.into()).into_response()
}

fn not_found(msg: impl Into<String>) -> Response {
    (StatusCode::NOT_FOUND, msg.into()).into_response()
}

fn parse_window(params: &WindowParams) -> Result<IoLogQuery, String> {
    let parse = |value: &Option<String>, field: &str| -> Result<Option<DateTime<Utc>>, String> {
        match value {
            None => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|e| format!("invalid {field}: {e}")),
        }
    };
    Ok(IoLogQuery {
        since: parse(&params.since, "since")?,
        until: parse(&params.until, "until")?,
    })
}

async fn actors(State(system): State<ActorSystem>) -> Response {
    Json(system.snapshot()).into_response()
}

async fn messages(
    State(system): State<ActorSystem>,
    Query(params): Query<IdNParams>,
) -> Response {
    let Some(id) = params.id else {
        return bad_request("missing id");
    };
    let n = params.n.unwrap_or(DEFAULT_EVENT_LIMIT);
    Json(system.recent_messages(ActorId::from_raw(id), n)).into_response()
}

async fn graph(State(system): State<ActorSystem>, Query(params): Query<GraphParams>) -> Response {
    let mut graph = system.build_actor_graph();
    if let Some(limit) = params.limit {
        graph.nodes.truncate(limit);
        graph.edges.truncate(limit.saturating_mul(4));
    }
    Json(graph).into_response()
}

async fn deadlocks(
    State(system): State<ActorSystem>,
    Query(params): Query<DeadlockParams>,
) -> Response {
    let min_cycle = params.min_cycle.unwrap_or(1);
    let reports: Vec<_> = system
        .detect_potential_deadlocks()
        .into_iter()
        .filter(|r| r.size >= min_cycle)
        .collect();
    Json(reports).into_response()
}

async fn correlation(
    State(system): State<ActorSystem>,
    Query(params): Query<CorrelationParams>,
) -> Response {
    let Some(id) = params.id else {
        return bad_request("missing id");
    };
    let n = params.n.unwrap_or(DEFAULT_EVENT_LIMIT);
    Json(system.correlation_events(&id, n)).into_response()
}

async fn mailbox(State(system): State<ActorSystem>, Query(params): Query<IdNParams>) -> Response {
    let Some(raw) = params.id else {
        return bad_request("missing id");
    };
    let id = ActorId::from_raw(raw);
    match (system.mailbox_length(id), system.mailbox_stats(id)) {
        (Ok(len), Ok(stats)) => Json(MailboxView { id, len, stats }).into_response(),
        _ => not_found(format!("actor not found: {id}")),
    }
}

async fn io_summary(
    State(system): State<ActorSystem>,
    Query(params): Query<WindowParams>,
) -> Response {
    let window = match parse_window(&params) {
        Ok(w) => w,
        Err(e) => return bad_request(e),
    };

    let mut summary = IoSummary::default();
    for record in system.io_events(window) {
        summary.total += 1;
        if record.delivered {
            summary.delivered += 1;
        } else {
            summary.dropped += 1;
        }
        match record.kind {
            IoEventKind::Readable => summary.readable += 1,
            IoEventKind::Writable => summary.writable += 1,
            IoEventKind::Error => summary.error += 1,
        }
    }
    Json(summary).into_response()
}

fn aggregate_by_actor(system: &ActorSystem, window: IoLogQuery) -> Vec<IoActorSummary> {
    let mut by_actor: HashMap<ActorId, IoActorSummary> = HashMap::new();
    for record in system.io_events(window) {
        let entry = by_actor
            .entry(record.target)
            .or_insert_with(|| IoActorSummary {
                actor_id: record.target,
                total: 0,
                delivered: 0,
                dropped: 0,
            });
        entry.total += 1;
        if record.delivered {
            entry.delivered += 1;
        } else {
            entry.dropped += 1;
        }
    }
    let mut out: Vec<IoActorSummary> = by_actor.into_values().collect();
    out.sort_by_key(|s| s.actor_id);
    out
}

async fn io_by_actor(
    State(system): State<ActorSystem>,
    Query(params): Query<WindowParams>,
) -> Response {
    let window = match parse_window(&params) {
        Ok(w) => w,
        Err(e) => return bad_request(e),
    };
    Json(aggregate_by_actor(&system, window)).into_response()
}

async fn io_top(
    State(system): State<ActorSystem>,
    Query(params): Query<WindowParams>,
) -> Response {
    let window = match parse_window(&params) {
        Ok(w) => w,
        Err(e) => return bad_request(e),
    };
    let mut rows = aggregate_by_actor(&system, window);
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows.truncate(params.n.unwrap_or(DEFAULT_TOP_LIMIT));
    Json(rows).into_response()
}

async fn lookup(
    State(system): State<ActorSystem>,
    Query(params): Query<LookupParams>,
) -> Response {
    let Some(name) = params.name else {
        return bad_request("missing name");
    };
    match system.lookup(&name) {
        Some(id) => Json(LookupResult { id, name }).into_response(),
        None => not_found(format!("name not found: {name}")),
    }
}

async fn metrics(State(system): State<ActorSystem>) -> Response {
    if !system.config().enable_metrics {
        return not_found("metrics disabled");
    }
    render_metrics(&system).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::actor::{Behavior, BehaviorError, Context};
    use crate::message::Message;
    use crate::system::{ActorConfig, SystemConfig};
    use tower::util::ServiceExt;

    struct Sink;

    impl Behavior for Sink {
        fn name(&self) -> &str {
            "sink"
        }

        fn receive(&mut self, _ctx: &mut Context, _msg: &Message) -> Result<(), BehaviorError> {
            Ok(())
        }
    }

    async fn get_body(router: &Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn system() -> ActorSystem {
        let system = ActorSystem::new(SystemConfig::default()).unwrap();
        system.start().unwrap();
        system
    }

    #[tokio::test]
    async fn test_actors_snapshot_endpoint() {
        let system = system();
        system
            .create_actor("snap", "t", Box::new(Sink), ActorConfig::default())
            .unwrap();
        let router = router(system.clone());

        let (status, body) = get_body(&router, "/actors").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"actors\""));
        assert!(body.contains("snap"));
        assert!(body.contains("schedulerQueue"));

        system.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_lookup_endpoint() {
        let system = system();
        let id = system
            .create_actor("named", "t", Box::new(Sink), ActorConfig::default())
            .unwrap();
        let router = router(system.clone());

        let (status, body) = get_body(&router, "/actors/lookup?name=named").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(&format!("\"id\":{}", id.as_u64())));

        let (status, _) = get_body(&router, "/actors/lookup?name=ghost").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get_body(&router, "/actors/lookup").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        system.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_mailbox_endpoint() {
        let system = system();
        let id = system
            .create_actor("mb", "t", Box::new(Sink), ActorConfig::default())
            .unwrap();
        let router = router(system.clone());

        let (status, body) = get_body(&router, &format!("/actors/mailbox?id={}", id.as_u64())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"stats\""));

        let (status, _) = get_body(&router, "/actors/mailbox?id=424242").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        system.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let system = system();
        let router = router(system.clone());

        let (status, body) = get_body(&router, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("arbor_actors_active"));
        // One metric per line, name then float.
        for line in body.lines() {
            let mut parts = line.split(' ');
            assert!(parts.next().is_some());
            assert!(parts.next().unwrap().parse::<f64>().is_ok());
        }

        system.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_io_window_validation() {
        let system = system();
        let router = router(system.clone());

        let (status, _) = get_body(&router, "/actors/io?since=not-a-time").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            get_body(&router, "/actors/io?since=2026-01-01T00:00:00Z").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"total\":0"));

        system.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_deadlocks_endpoint() {
        let system = system();
        let a1 = system
            .create_actor("d1", "t", Box::new(Sink), ActorConfig::default())
            .unwrap();
        let a2 = system
            .create_actor("d2", "t", Box::new(Sink), ActorConfig::default())
            .unwrap();
        system.watch(a1, a2).unwrap();
        system.watch(a2, a1).unwrap();
        let router = router(system.clone());

        let (status, body) = get_body(&router, "/actors/deadlocks?minCycle=2").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("watch-cycle"));

        // A higher floor filters the 2-cycle out.
        let (_, body) = get_body(&router, "/actors/deadlocks?minCycle=3").await;
        assert_eq!(body, "[]");

        system.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_correlation_endpoint() {
        let system = system();
        system.enable_tracing(16);
        let a1 = system
            .create_actor("c1", "t", Box::new(Sink), ActorConfig::default())
            .unwrap();
        let router = router(system.clone());

        // No traced traffic yet.
        let (status, body) = get_body(&router, "/actors/correlation?id=C&n=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");

        let _ = a1;
        system.stop().await.unwrap();
    }
}

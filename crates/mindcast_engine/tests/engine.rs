use std::time::Duration;

use mindcast_engine::{
    ApiError, ApiSettings, EngineCommand, EngineEvent, EngineHandle, EngineSettings, TaskKind,
    TaskSpec, TaskStatus, TrackerEvent,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(server: &MockServer) -> EngineHandle {
    EngineHandle::new(EngineSettings {
        api: ApiSettings {
            base_url: server.uri(),
            ..ApiSettings::default()
        },
        stream_idle_timeout: Duration::from_secs(5),
    })
    .expect("engine")
}

fn next_event(engine: &EngineHandle) -> EngineEvent {
    engine
        .recv_timeout(Duration::from_secs(5))
        .expect("engine event")
}

#[tokio::test(flavor = "multi_thread")]
async fn news_command_reports_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/debug/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "items": [{"title": "Headline"}]
        })))
        .mount(&server)
        .await;

    let engine = engine(&server);
    engine.send(EngineCommand::FetchNews {
        topic: None,
        max_results: 10,
    });

    match next_event(&engine) {
        EngineEvent::NewsFetched(Ok(news)) => assert_eq!(news.items[0].title, "Headline"),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn started_task_streams_to_its_terminal_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/script/preview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "p1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            concat!(
                "data: {\"status\": \"running\", \"stage\": \"writing\", \"detail\": \"drafting\"}\n\n",
                "data: {\"status\": \"completed\", \"stage\": \"done\", \"detail\": \"\"}\n\n",
            ),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let engine = engine(&server);
    engine.send(EngineCommand::StartTask(TaskSpec::Preview {
        topic: "Rust".to_string(),
        selected_guests: vec!["Ada".to_string()],
    }));
    assert_eq!(
        next_event(&engine),
        EngineEvent::TaskStarted {
            kind: TaskKind::Preview,
            task_id: "p1".to_string(),
        }
    );

    engine.send(EngineCommand::Subscribe {
        task_id: "p1".to_string(),
    });
    let mut events = Vec::new();
    loop {
        let event = next_event(&engine);
        let terminal = matches!(event, EngineEvent::Task(TrackerEvent::Terminal { .. }));
        events.push(event);
        if terminal {
            break;
        }
    }
    assert_eq!(events.len(), 3);
    assert!(matches!(
        &events[2],
        EngineEvent::Task(TrackerEvent::Terminal { task_id, status: TaskStatus::Completed, .. })
            if task_id == "p1"
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn start_failure_is_reported_with_kind() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/episodes/ep1/retime"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Episode not found"})))
        .mount(&server)
        .await;

    let engine = engine(&server);
    engine.send(EngineCommand::StartTask(TaskSpec::Retime {
        episode_id: "ep1".to_string(),
        line_speeds: vec![1.0],
    }));
    assert_eq!(
        next_event(&engine),
        EngineEvent::TaskStartFailed {
            kind: TaskKind::Retime,
            error: ApiError::Validation {
                status: 404,
                detail: "Episode not found".to_string(),
            },
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_the_handle_waits_for_segment_cleanup() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/episodes/ep1/segments/cleanup"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server);
    engine.send(EngineCommand::CleanupSegments {
        episode_id: "ep1".to_string(),
    });
    engine.send(EngineCommand::CloseSubscription);
    tokio::task::spawn_blocking(move || drop(engine))
        .await
        .expect("engine shutdown");

    let received = server.received_requests().await.expect("recording enabled");
    let cleanups = received
        .iter()
        .filter(|request| request.url.path() == "/api/episodes/ep1/segments/cleanup")
        .count();
    assert_eq!(cleanups, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_cleanup_does_not_block_shutdown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/episodes/ep2/segments/cleanup"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server);
    engine.send(EngineCommand::CleanupSegments {
        episode_id: "ep2".to_string(),
    });
    tokio::task::spawn_blocking(move || drop(engine))
        .await
        .expect("engine shutdown");
}

#[test]
fn invalid_base_url_fails_fast() {
    let result = EngineHandle::new(EngineSettings {
        api: ApiSettings {
            base_url: "::nope".to_string(),
            ..ApiSettings::default()
        },
        ..EngineSettings::default()
    });
    assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
}

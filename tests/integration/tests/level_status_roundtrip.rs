use std::{collections::VecDeque, sync::Arc};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use httpmock::prelude::*;
use levelbot_core::{
    ChartEntry, Dispatcher, DispatcherCollaborators, DispatcherConfig, EventSource,
};
use levelbot_slack_runtime::{QuickChartRenderer, SlackApiClient};
use serde_json::{json, Value};

struct ScriptedEvents {
    batches: VecDeque<Vec<Value>>,
}

impl ScriptedEvents {
    fn new(batches: Vec<Vec<Value>>) -> Self {
        Self {
            batches: VecDeque::from(batches),
        }
    }
}

#[async_trait]
impl EventSource for ScriptedEvents {
    async fn next_batch(&mut self) -> Result<Vec<Value>> {
        self.batches
            .pop_front()
            .ok_or_else(|| anyhow!("scripted event stream disconnected"))
    }
}

fn dispatcher(server: &MockServer, batches: Vec<Vec<Value>>) -> Dispatcher {
    let slack = Arc::new(
        SlackApiClient::new(
            server.base_url(),
            "xapp-test".to_string(),
            "xoxb-test".to_string(),
            2_000,
            1,
            1,
        )
        .expect("slack client"),
    );
    let renderer = QuickChartRenderer::new(server.base_url(), 2_000).expect("renderer");
    Dispatcher::new(
        "UBOT",
        DispatcherCollaborators {
            events: Box::new(ScriptedEvents::new(batches)),
            directory: slack.clone(),
            chat: slack,
            renderer: Arc::new(renderer),
        },
        DispatcherConfig::default(),
    )
}

fn mock_upload_flow(server: &MockServer) -> [httpmock::Mock<'_>; 3] {
    let get_url = server.mock(|when, then| {
        when.method(POST).path("/files.getUploadURLExternal");
        then.status(200).json_body(json!({
            "ok": true,
            "upload_url": server.url("/upload/F1"),
            "file_id": "F1"
        }));
    });
    let raw_upload = server.mock(|when, then| {
        when.method(POST).path("/upload/F1").body("chart-png");
        then.status(200).body("OK");
    });
    let complete = server.mock(|when, then| {
        when.method(POST)
            .path("/files.completeUploadExternal")
            .body_includes("\"channel_id\":\"C1\"");
        then.status(200).json_body(json!({"ok": true}));
    });
    [get_url, raw_upload, complete]
}

#[tokio::test]
async fn integration_level_then_status_renders_and_uploads_chart() {
    let server = MockServer::start();
    let users_info = server.mock(|when, then| {
        when.method(GET).path("/users.info").query_param("user", "U1");
        then.status(200)
            .json_body(json!({"ok": true, "user": {"id": "U1", "name": "alice"}}));
    });
    let level_ack = server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .body_includes("\"channel\":\"C1\"")
            .body_includes("_<@alice>_, level 7 recorded.  Thanks!");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C1", "ts": "1.0"}));
    });
    let render = server.mock(|when, then| {
        when.method(POST)
            .path("/chart")
            .body_includes("\"labels\":[\"alice\"]")
            .body_includes("\"data\":[7]");
        then.status(200).body("chart-png");
    });
    let [get_url, raw_upload, complete] = mock_upload_flow(&server);

    let mut dispatcher = dispatcher(
        &server,
        vec![
            vec![json!({"text": "<@UBOT> level 7", "user": "U1", "channel": "C1"})],
            vec![json!({"text": "<@UBOT> status", "user": "U1", "channel": "C1"})],
        ],
    );

    let report = dispatcher.run_cycle().await.expect("level cycle");
    assert_eq!(report.commands_handled, 1);
    assert!(dispatcher.state().is_dirty());
    let profile = dispatcher.state().profiles().get("U1").expect("profile");
    assert_eq!(profile.display_name, "alice");
    assert_eq!(profile.level, Some(7));
    assert_eq!(level_ack.calls(), 1);

    let report = dispatcher.run_cycle().await.expect("status cycle");
    assert_eq!(report.charts_regenerated, 1);
    assert!(!dispatcher.state().is_dirty());
    let artifact = dispatcher.chart_cache().latest().expect("cached chart");
    assert_eq!(
        artifact.dataset().entries(),
        &[ChartEntry {
            name: "alice".to_string(),
            level: 7,
        }]
    );

    assert_eq!(users_info.calls(), 1);
    assert_eq!(render.calls(), 1);
    assert_eq!(get_url.calls(), 1);
    assert_eq!(raw_upload.calls(), 1);
    assert_eq!(complete.calls(), 1);
}

#[tokio::test]
async fn integration_repeated_status_reuses_chart_without_rendering() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/users.info").query_param("user", "U1");
        then.status(200)
            .json_body(json!({"ok": true, "user": {"id": "U1", "name": "alice"}}));
    });
    let render = server.mock(|when, then| {
        when.method(POST).path("/chart");
        then.status(200).body("chart-png");
    });
    let [_, raw_upload, complete] = mock_upload_flow(&server);

    let status = json!({"text": "<@UBOT> status", "user": "U1", "channel": "C1"});
    let mut dispatcher = dispatcher(&server, vec![vec![status.clone(), status]]);

    let report = dispatcher.run_cycle().await.expect("status cycle");
    assert_eq!(report.charts_regenerated, 1);
    assert_eq!(report.charts_reused, 1);
    assert_eq!(render.calls(), 1);
    assert_eq!(raw_upload.calls(), 2);
    assert_eq!(complete.calls(), 2);
}

#[tokio::test]
async fn integration_unknown_user_is_dropped_and_loop_continues() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/users.info").query_param("user", "U404");
        then.status(200)
            .json_body(json!({"ok": false, "error": "user_not_found"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/users.info").query_param("user", "U2");
        then.status(200)
            .json_body(json!({"ok": true, "user": {"id": "U2", "name": "bob"}}));
    });
    let help = server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .body_includes("Help is on the way!!!")
            .body_includes("Available Commands:");
        then.status(200)
            .json_body(json!({"ok": true, "channel": "C1", "ts": "2.0"}));
    });

    let mut dispatcher = dispatcher(
        &server,
        vec![vec![
            json!({"text": "<@UBOT> level 3", "user": "U404", "channel": "C1"}),
            json!({"text": "hello team", "user": "U2", "channel": "C1"}),
            json!({"text": "<@UBOT> help", "user": "U2", "channel": "C1"}),
        ]],
    );

    let report = dispatcher.run_cycle().await.expect("cycle");
    assert_eq!(report.discovered_events, 3);
    assert_eq!(report.resolution_failures, 1);
    assert_eq!(report.commands_handled, 1);
    assert_eq!(help.calls(), 1);
    assert!(dispatcher.state().profiles().get("U404").is_none());

    let error = dispatcher.run_cycle().await.unwrap_err();
    assert!(format!("{error:#}").contains("disconnected"));
}

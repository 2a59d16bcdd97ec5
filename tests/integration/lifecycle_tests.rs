/*!
 * Integration tests for the start lifecycle driven by the controller
 */

use serde_json::json;

use ploudos::{Controller, StartOutcome};
use crate::common::mock_transport::MockTransport;
use crate::common::{action_path, running_status, starting_status, status_path, test_client};

fn stopped_status(is_editor_mode: bool) -> serde_json::Value {
    json!({"status": "STOPPED", "isStarted": false, "isRunning": false, "isEditorMode": is_editor_mode})
}

#[tokio::test]
async fn test_ensure_running_withRunningServer_shouldSendNoActions() {
    let transport = MockTransport::new()
        .accepting_login()
        .respond(&status_path(), running_status());
    let tracker = transport.tracker();
    let mut controller = Controller::new(test_client(transport));
    controller.login().await.unwrap();

    let outcome = controller.ensure_running().await.unwrap();

    assert!(matches!(outcome, StartOutcome::AlreadyRunning(_)));
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.calls, vec!["/login/".to_string(), status_path()]);
}

#[tokio::test]
async fn test_ensure_running_withRestartableServer_shouldUseRestart() {
    let transport = MockTransport::new()
        .accepting_login()
        .respond(&action_path("start"), json!({"error": false}))
        .respond_times(&status_path(), stopped_status(false), 2)
        .respond(&status_path(), starting_status())
        .respond(&status_path(), running_status());
    let tracker = transport.tracker();
    let mut controller = Controller::new(test_client(transport));
    controller.login().await.unwrap();

    let outcome = controller.ensure_running().await.unwrap();

    assert!(matches!(outcome, StartOutcome::Restarted(_)));
    assert!(outcome.info().is_up());
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.count(&action_path("start")), 1);
    assert_eq!(tracker.count(&action_path("queue/1")), 0);
}

#[tokio::test]
async fn test_ensure_running_withEditorMode_shouldQueueThenAccept() {
    let transport = MockTransport::new()
        .accepting_login()
        .respond(&action_path("queue/1"), json!({"error": false}))
        .respond(&action_path("accept"), json!({"error": false}))
        .respond_times(&status_path(), stopped_status(true), 2)
        .respond(&status_path(), json!({"status": "QUEUED"}))
        .respond(&status_path(), json!({"status": "WAITING_FOR_ACCEPT"}))
        .respond(&status_path(), starting_status())
        .respond(&status_path(), running_status());
    let tracker = transport.tracker();
    let mut controller = Controller::new(test_client(transport));
    controller.login().await.unwrap();

    let outcome = controller.ensure_running().await.unwrap();

    assert!(matches!(outcome, StartOutcome::Accepted(_)));
    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.count(&action_path("queue/1")), 1);
    assert_eq!(tracker.count(&action_path("accept")), 1);
    assert_eq!(tracker.count(&action_path("start")), 0);
}

#[tokio::test]
async fn test_ensure_running_withQueueRace_shouldSkipAccept() {
    let transport = MockTransport::new()
        .accepting_login()
        .respond(&action_path("queue/1"), json!({"error": false}))
        .respond_times(&status_path(), stopped_status(true), 2)
        .respond(&status_path(), running_status());
    let tracker = transport.tracker();
    let mut controller = Controller::new(test_client(transport));
    controller.login().await.unwrap();

    let outcome = controller.ensure_running().await.unwrap();

    assert!(matches!(outcome, StartOutcome::StartedWithoutAccept(_)));
    assert_eq!(tracker.lock().unwrap().count(&action_path("accept")), 0);
}

#[tokio::test]
async fn test_ensure_running_withQueueError_shouldFail() {
    let transport = MockTransport::new()
        .accepting_login()
        .respond(&action_path("queue/1"), json!({"error": true, "msg": "full"}))
        .respond(&status_path(), stopped_status(true));
    let mut controller = Controller::new(test_client(transport));
    controller.login().await.unwrap();

    let error = controller.ensure_running().await.unwrap_err();

    assert!(error.to_string().contains("Queueing failed"));
    assert!(format!("{:#}", error).contains("full"));
}

#[tokio::test]
async fn test_controller_login_withRejectedCredentials_shouldFail() {
    let mut controller = Controller::new(test_client(MockTransport::new()));

    let error = controller.login().await.unwrap_err();

    assert!(error.to_string().contains("Login failed"));
}

#[test]
fn test_shutdown_shouldCloseTransport() {
    let transport = MockTransport::new().accepting_login();
    let tracker = transport.tracker();
    let mut controller = Controller::new(test_client(transport));

    tokio_test::block_on(async {
        controller.login().await.unwrap();
    });
    controller.shutdown();

    assert!(tracker.lock().unwrap().closed);
}

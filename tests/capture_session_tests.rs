// Integration tests for the speech capture session
//
// These tests drive a channel-backed recognizer to verify the restart
// bound, counter resets, stop cancellation, fatal error handling, and
// transcript emission order.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use voicechat::{
    CaptureSession, ChannelRecognizer, FixedMicrophone, MicrophoneHandle, MicrophoneSource,
    RecognitionResult, RecognizerConfig, RecognizerDriver, RecognizerEvent, SessionConfig,
    VoiceError,
};

/// Microphone whose permission prompt takes a while to resolve.
struct SlowMicrophone {
    delay: Duration,
}

#[async_trait::async_trait]
impl MicrophoneSource for SlowMicrophone {
    async fn acquire(&self) -> Result<MicrophoneHandle, VoiceError> {
        sleep(self.delay).await;
        Ok(MicrophoneHandle::new("slow"))
    }
}

const RECV_TIMEOUT: Duration = Duration::from_secs(1);

fn test_session(restart_delay: Duration) -> (CaptureSession, RecognizerDriver) {
    let recognizer = ChannelRecognizer::new(RecognizerConfig::default());
    let driver = recognizer.driver();
    let session = CaptureSession::new(
        SessionConfig {
            max_restart_attempts: 3,
            restart_delay,
            ..Default::default()
        },
        Box::new(recognizer),
        Box::new(FixedMicrophone::default()),
    );
    (session, driver)
}

/// Wait for the supervisor task to work through pending events/restarts.
async fn settle() {
    sleep(Duration::from_millis(150)).await;
}

#[tokio::test]
async fn test_restart_attempts_stay_within_bound() {
    let (session, driver) = test_session(Duration::from_millis(10));

    session.start().await.unwrap();
    assert_eq!(driver.start_calls(), 1);

    driver.fail_next_starts(10);
    driver.end_run().await;
    settle().await;

    // Initial start plus exactly three bounded restart attempts.
    assert_eq!(driver.start_calls(), 4);
    assert!(!session.desired_active());
    assert!(!session.is_listening());
    // Counter resets when the session gives up.
    assert_eq!(session.restart_attempts(), 0);
}

#[tokio::test]
async fn test_successful_restart_resets_counter() {
    let (session, driver) = test_session(Duration::from_millis(10));

    session.start().await.unwrap();
    driver.fail_next_starts(2);
    driver.end_run().await;
    settle().await;

    // Initial start, two failed restarts, one successful restart.
    assert_eq!(driver.start_calls(), 4);
    assert!(session.desired_active());
    assert!(session.is_listening());
    assert_eq!(session.restart_attempts(), 0);
}

#[tokio::test]
async fn test_stop_cancels_pending_restart() {
    let (session, driver) = test_session(Duration::from_millis(200));

    session.start().await.unwrap();
    driver.fail_next_starts(10);
    driver.end_run().await;

    // Land inside the first retry delay, then stop.
    sleep(Duration::from_millis(50)).await;
    session.stop().await;
    let calls_at_stop = driver.start_calls();

    sleep(Duration::from_millis(500)).await;
    assert_eq!(driver.start_calls(), calls_at_stop);
    assert!(!session.desired_active());
    assert!(!session.is_listening());
}

#[tokio::test]
async fn test_stop_during_inflight_start_wins() {
    let recognizer = ChannelRecognizer::new(RecognizerConfig::default());
    let driver = recognizer.driver();
    let session = Arc::new(CaptureSession::new(
        SessionConfig::default(),
        Box::new(recognizer),
        Box::new(SlowMicrophone {
            delay: Duration::from_millis(100),
        }),
    ));

    // Suspend start() on the permission prompt, then stop while it waits.
    let starter = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.start().await })
    };
    sleep(Duration::from_millis(20)).await;
    session.stop().await;
    assert_eq!(driver.start_calls(), 0);

    starter.await.unwrap().unwrap();

    // Teardown won: no recognizer start fired after stop() returned, and
    // nothing was left running.
    assert_eq!(driver.start_calls(), 0);
    assert!(!session.is_listening());
    assert!(!session.desired_active());
}

#[tokio::test]
async fn test_gives_up_immediately_after_last_failed_attempt() {
    let (session, driver) = test_session(Duration::from_millis(200));

    session.start().await.unwrap();
    driver.fail_next_starts(10);
    driver.end_run().await;

    // Failures land at roughly 0ms, 200ms, and 400ms; the third must give up
    // on the spot instead of waiting out another delay.
    sleep(Duration::from_millis(600)).await;
    assert_eq!(driver.start_calls(), 4);
    assert!(!session.desired_active());
    assert!(!session.is_listening());
    assert_eq!(session.restart_attempts(), 0);
}

#[tokio::test]
async fn test_not_allowed_error_disables_restart() {
    let (session, driver) = test_session(Duration::from_millis(10));

    session.start().await.unwrap();
    driver.push_error("not-allowed").await;
    driver.end_run().await;
    settle().await;

    assert!(!session.desired_active());
    assert!(!session.is_listening());
    // No restart attempt was made within the retry window.
    assert_eq!(driver.start_calls(), 1);
}

#[tokio::test]
async fn test_transient_error_still_restarts_on_end() {
    let (session, driver) = test_session(Duration::from_millis(10));

    session.start().await.unwrap();
    driver.push_error("no-speech").await;
    driver.end_run().await;
    settle().await;

    // The end callback restarted the recognizer.
    assert_eq!(driver.start_calls(), 2);
    assert!(session.is_listening());
}

#[tokio::test]
async fn test_permission_denied_aborts_start() {
    let recognizer = ChannelRecognizer::new(RecognizerConfig::default());
    let driver = recognizer.driver();
    let session = CaptureSession::new(
        SessionConfig::default(),
        Box::new(recognizer),
        Box::new(FixedMicrophone::denying()),
    );

    let err = session.start().await.unwrap_err();
    assert!(matches!(err, VoiceError::PermissionDenied));
    assert!(!session.desired_active());
    // The recognizer was never touched.
    assert_eq!(driver.start_calls(), 0);
}

#[tokio::test]
async fn test_initial_start_failure_returns_error() {
    let (session, driver) = test_session(Duration::from_millis(10));

    driver.fail_next_starts(1);
    let err = session.start().await.unwrap_err();
    assert!(matches!(err, VoiceError::RecognizerStart(_)));
    assert!(!session.desired_active());
    assert!(!session.is_listening());
}

#[tokio::test]
async fn test_start_is_noop_while_running() {
    let (session, driver) = test_session(Duration::from_millis(10));

    session.start().await.unwrap();
    session.start().await.unwrap();
    assert_eq!(driver.start_calls(), 1);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let (session, _driver) = test_session(Duration::from_millis(10));

    session.start().await.unwrap();
    session.stop().await;
    session.stop().await;
    assert!(!session.is_listening());
    assert!(!session.desired_active());
}

#[tokio::test]
async fn test_interim_and_final_emission_order() {
    let (session, driver) = test_session(Duration::from_millis(10));
    let mut events = session.subscribe();

    session.start().await.unwrap();
    driver.push_interim("hallo").await;
    driver.push_interim("hallo hoe").await;
    driver.push_final("hallo hoe gaat het").await;

    let first = timeout(RECV_TIMEOUT, events.recv()).await.unwrap().unwrap();
    assert!(!first.is_final);
    assert_eq!(first.transcript, "hallo");

    let second = timeout(RECV_TIMEOUT, events.recv()).await.unwrap().unwrap();
    assert!(!second.is_final);
    assert_eq!(second.transcript, "hallo hoe");

    let third = timeout(RECV_TIMEOUT, events.recv()).await.unwrap().unwrap();
    assert!(third.is_final);
    assert_eq!(third.transcript, "Hallo hoe gaat het.");
}

#[tokio::test]
async fn test_results_processed_from_start_index() {
    let (session, driver) = test_session(Duration::from_millis(10));
    let mut events = session.subscribe();

    session.start().await.unwrap();
    driver
        .push(RecognizerEvent::Results {
            start_index: 1,
            results: vec![
                RecognitionResult::finalized("al gezien"),
                RecognitionResult::finalized("nieuw"),
            ],
        })
        .await;

    let event = timeout(RECV_TIMEOUT, events.recv()).await.unwrap().unwrap();
    assert_eq!(event.transcript, "Nieuw.");

    // The entry before the start index is unchanged history; nothing else
    // may be emitted.
    assert!(timeout(Duration::from_millis(100), events.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn test_stats_snapshot() {
    let (session, driver) = test_session(Duration::from_millis(10));

    session.start().await.unwrap();
    driver.push_final("hallo").await;
    settle().await;

    let stats = session.stats();
    assert!(stats.desired_active);
    assert!(stats.listening);
    assert_eq!(stats.restart_attempts, 0);
    assert_eq!(stats.transcripts_emitted, 1);
}

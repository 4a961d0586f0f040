/*!
 * Integration tests for the fallback plan run by TranscriptService
 */

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use scriptripper::app_config::StrategyTimeouts;
use scriptripper::transcript::{
    AttemptSource, CaptionTrack, FallbackPlan, RetrievalOutcome, StrategyBudgets, StrategyKind, TranscriptAttempt,
    TranscriptService,
};
use scriptripper::VideoId;

use crate::common::mock_http::{StubBehavior, StubStrategy};

type CallLog = Arc<Mutex<Vec<&'static str>>>;

fn build_service(library: StubBehavior, proxy: StubBehavior, pipeline: StubBehavior) -> (TranscriptService, CallLog) {
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let service = TranscriptService::new(
        StubStrategy::new("library", library, calls.clone()),
        StubStrategy::new("proxy", proxy, calls.clone()),
        StubStrategy::new("pipeline", pipeline, calls.clone()),
        StrategyTimeouts::default(),
    );
    (service, calls)
}

fn sample_attempts() -> Vec<TranscriptAttempt> {
    let track = CaptionTrack::new("en");
    vec![
        TranscriptAttempt::new(&track, Some(403), "Forbidden", AttemptSource::Player),
        TranscriptAttempt::new(&track.clone().with_kind("asr"), Some(429), "Too Many Requests", AttemptSource::Timedtext),
    ]
}

#[tokio::test]
async fn test_retrieve_libraryFirst_shouldShortCircuit() {
    let (service, calls) = build_service(StubBehavior::Succeed("lib"), StubBehavior::Succeed("proxy"), StubBehavior::Succeed("pipe"));

    let outcome = service.retrieve(&VideoId::new("vid"), "en").await;

    match outcome {
        RetrievalOutcome::Found { result, attempts } => {
            assert_eq!(result.transcript, "lib");
            assert!(attempts.is_empty());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(*calls.lock(), vec!["library"]);
}

#[tokio::test]
async fn test_retrieve_pipelineSucceeds_shouldRunPrimaryInOrder() {
    let (service, calls) = build_service(StubBehavior::Empty, StubBehavior::Empty, StubBehavior::Succeed("pipe"));

    let outcome = service.retrieve(&VideoId::new("vid"), "en").await;

    assert!(matches!(outcome, RetrievalOutcome::Found { ref result, .. } if result.transcript == "pipe"));
    assert_eq!(*calls.lock(), vec!["library", "proxy", "pipeline"]);
}

#[tokio::test]
async fn test_retrieve_cleanEmpty_shouldRetryProxyOnlyThenUnavailable() {
    let (service, calls) = build_service(StubBehavior::Empty, StubBehavior::Empty, StubBehavior::Empty);

    let outcome = service.retrieve(&VideoId::new("vid"), "en").await;

    assert_eq!(outcome, RetrievalOutcome::Unavailable);
    assert_eq!(*calls.lock(), vec!["library", "proxy", "pipeline", "proxy"]);
}

#[tokio::test]
async fn test_retrieve_diagnosedFailure_shouldRetryLibraryAndProxyThenReportAttempts() {
    let (service, calls) = build_service(StubBehavior::Empty, StubBehavior::Empty, StubBehavior::Diagnose(sample_attempts()));

    let outcome = service.retrieve(&VideoId::new("vid"), "en").await;

    assert_eq!(outcome, RetrievalOutcome::Diagnosed { attempts: sample_attempts() });
    assert_eq!(*calls.lock(), vec!["library", "proxy", "pipeline", "library", "proxy"]);
}

#[tokio::test]
async fn test_retrieve_unexpectedFailure_shouldReportDetails() {
    let (service, calls) = build_service(StubBehavior::Empty, StubBehavior::Empty, StubBehavior::Explode("player blew up"));

    let outcome = service.retrieve(&VideoId::new("vid"), "en").await;

    assert_eq!(outcome, RetrievalOutcome::Failed { details: "player blew up".to_string() });
    assert_eq!(*calls.lock(), vec!["library", "proxy", "pipeline", "library", "proxy"]);
}

#[tokio::test]
async fn test_retrieve_customPlan_shouldFollowPlanData() {
    let (service, calls) = build_service(StubBehavior::Succeed("lib"), StubBehavior::Empty, StubBehavior::Diagnose(sample_attempts()));
    let service = service.with_plan(FallbackPlan {
        primary: vec![StrategyKind::Pipeline],
        after_diagnosed: vec![StrategyKind::Proxy, StrategyKind::Library],
        after_empty: Vec::new(),
        after_unexpected: Vec::new(),
    });

    let outcome = service.retrieve(&VideoId::new("vid"), "en").await;

    // A recovery success after diagnosis still carries the attempts
    match outcome {
        RetrievalOutcome::Found { result, attempts } => {
            assert_eq!(result.transcript, "lib");
            assert_eq!(attempts, sample_attempts());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(*calls.lock(), vec!["pipeline", "proxy", "library"]);
}

#[tokio::test]
async fn test_retrieve_pipelineTimeout_shouldBeTreatedAsUnexpected() {
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let service = TranscriptService::new(
        StubStrategy::new("library", StubBehavior::Empty, calls.clone()),
        StubStrategy::new("proxy", StubBehavior::Hang, calls.clone()),
        StubStrategy::new("pipeline", StubBehavior::Hang, calls.clone()),
        StrategyTimeouts::default(),
    )
    .with_budgets(StrategyBudgets {
        library: Duration::from_millis(50),
        proxy: Duration::from_millis(50),
        pipeline: Duration::from_millis(50),
    });

    let started = Instant::now();
    let outcome = service.retrieve(&VideoId::new("vid"), "en").await;

    match outcome {
        RetrievalOutcome::Failed { details } => {
            assert!(details.contains("timed out"));
            assert!(details.contains("50ms"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(*calls.lock(), vec!["library", "proxy", "pipeline", "library", "proxy"]);
    // Three hanging calls under 50ms budgets, far below the configured seconds
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_strategyBudgets_fromTimeouts_shouldUseConfiguredSeconds() {
    let budgets = StrategyBudgets::from(&StrategyTimeouts::default());
    assert_eq!(budgets.library, Duration::from_secs(20));
    assert_eq!(budgets.proxy, Duration::from_secs(20));
    assert_eq!(budgets.pipeline, Duration::from_secs(90));
}

//! Integration tests for the inference gateway's throttling, backoff and
//! failure notification, driven on a paused tokio clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;
use venue_common::{FailureKind, IncidentReport};
use venue_gateway::gateway::fallback;
use venue_gateway::test_util::ScriptedTransport;
use venue_gateway::transport::TransportError;
use venue_gateway::venue::seed_sections;
use venue_gateway::{GatewaySettings, InferenceGateway, PeopleCount};

fn gateway(transport: &Arc<ScriptedTransport>) -> Arc<InferenceGateway> {
    Arc::new(InferenceGateway::new(
        transport.clone(),
        GatewaySettings::default(),
    ))
}

fn quota() -> TransportError {
    TransportError::QuotaExhausted("429 Too Many Requests".to_string())
}

fn report() -> IncidentReport {
    IncidentReport {
        category: "medical".to_string(),
        location: "Gate 4".to_string(),
        description: "Fan collapsed near the turnstiles".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_calls_are_spaced_by_min_gap() {
    let transport = Arc::new(ScriptedTransport::new());
    for _ in 0..5 {
        transport.push_ok("1");
    }
    let gateway = gateway(&transport);

    let calls = (0..5).map(|_| {
        let gateway = gateway.clone();
        async move { gateway.count_people_in_image("img").await }
    });
    let counts = join_all(calls).await;
    assert!(counts.iter().all(|c| *c == PeopleCount::Counted(1)));

    let mut starts = transport.call_starts();
    starts.sort();
    assert_eq!(starts.len(), 5);
    for pair in starts.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(2500));
    }
}

#[tokio::test(start_paused = true)]
async fn test_spaced_across_operation_types() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_ok("All clear.");
    transport.push_ok("4");
    let gateway = gateway(&transport);
    let sections = seed_sections();

    let (insight, count) = tokio::join!(
        gateway.request_insight_text(&sections),
        gateway.count_people_in_image("img"),
    );
    assert_eq!(insight, "All clear.");
    assert_eq!(count, PeopleCount::Counted(4));

    let starts = transport.call_starts();
    assert!(starts[1] - starts[0] >= Duration::from_millis(2500));
}

#[tokio::test(start_paused = true)]
async fn test_degraded_mode_short_circuits_every_operation() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_err(quota());
    let gateway = gateway(&transport);
    let sections = seed_sections();

    assert_eq!(
        gateway.count_people_in_image("img").await,
        PeopleCount::QuotaExhausted
    );
    assert!(gateway.is_degraded());

    let tactical = gateway.request_tactical_response(&report(), &sections).await;
    assert_eq!(tactical, fallback::standby_tactical_response());
    assert_eq!(
        gateway.request_insight_text(&sections).await,
        fallback::INSIGHT_STANDBY
    );
    assert_eq!(
        gateway.request_density_map(&sections).await,
        fallback::synthetic_density_map(&sections)
    );
    assert_eq!(gateway.count_people_in_image("img").await.as_i64(), -2);

    // Only the call that hit the quota reached the transport.
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_quota_recovery_after_cooldown() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_err(quota());
    let gateway = gateway(&transport);
    let sections = seed_sections();

    assert_eq!(gateway.count_people_in_image("img").await.as_i64(), -2);
    assert_eq!(
        gateway.request_insight_text(&sections).await,
        fallback::INSIGHT_STANDBY
    );
    assert_eq!(transport.call_count(), 1);

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(!gateway.is_degraded());

    transport.push_ok("7");
    assert_eq!(
        gateway.count_people_in_image("img").await,
        PeopleCount::Counted(7)
    );
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_still_degraded_just_before_cooldown_ends() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_err(quota());
    let gateway = gateway(&transport);

    gateway.count_people_in_image("img").await;
    tokio::time::advance(Duration::from_secs(59)).await;
    assert!(gateway.is_degraded());
    assert_eq!(gateway.status().degraded_remaining_secs, Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_manual_reset_resumes_calls() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_err(quota());
    transport.push_ok("The concourse is calm.");
    let gateway = gateway(&transport);
    let sections = seed_sections();

    gateway.request_insight_text(&sections).await;
    assert!(gateway.is_degraded());

    gateway.reset_degraded_mode();
    assert!(!gateway.is_degraded());
    assert_eq!(
        gateway.request_insight_text(&sections).await,
        "The concourse is calm."
    );

    // Resetting when not degraded is a no-op.
    gateway.reset_degraded_mode();
    assert!(!gateway.is_degraded());
}

#[tokio::test(start_paused = true)]
async fn test_listeners_receive_classified_failures() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_err(TransportError::MissingCredential);
    transport.push_err(TransportError::Service {
        status: 500,
        message: "internal".to_string(),
    });
    transport.push_err(quota());
    let gateway = gateway(&transport);

    let seen: Arc<Mutex<Vec<(FailureKind, String)>>> = Arc::default();
    let sink = seen.clone();
    let subscription = gateway.subscribe_to_failures(move |kind, message| {
        sink.lock().unwrap().push((kind, message.to_string()));
    });

    assert_eq!(gateway.count_people_in_image("img").await.as_i64(), -1);
    assert!(!gateway.is_degraded());
    assert_eq!(gateway.count_people_in_image("img").await.as_i64(), -1);
    assert_eq!(gateway.count_people_in_image("img").await.as_i64(), -2);

    {
        let seen = seen.lock().unwrap();
        let kinds: Vec<_> = seen.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(
            kinds,
            vec![FailureKind::Key, FailureKind::Generic, FailureKind::Quota]
        );
        assert!(seen[0].1.contains("API key"));
        assert!(seen[2].1.contains("60s"));
    }

    // Short-circuited calls do not notify again.
    gateway.count_people_in_image("img").await;
    assert_eq!(seen.lock().unwrap().len(), 3);

    subscription.unsubscribe();
    subscription.unsubscribe();
    gateway.reset_degraded_mode();
    transport.push_err(quota());
    gateway.count_people_in_image("img").await;
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_listener_does_not_block_others() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_err(quota());
    let gateway = gateway(&transport);

    let _bad = gateway.subscribe_to_failures(|_, _| panic!("listener bug"));
    let seen = Arc::new(Mutex::new(0));
    let sink = seen.clone();
    let _good = gateway.subscribe_to_failures(move |_, _| *sink.lock().unwrap() += 1);

    assert_eq!(gateway.count_people_in_image("img").await.as_i64(), -2);
    assert_eq!(*seen.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_event_stream() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_err(quota());
    let gateway = gateway(&transport);
    let mut events = gateway.failure_events();

    gateway.count_people_in_image("img").await;
    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, FailureKind::Quota);
}

//! Request validation: every rejection happens before any I/O.

use uuid::Uuid;

use ghostwriter::persona::Caller;
use ghostwriter::pipeline::GenerateError;

use crate::mocks::{persona, request, Harness, MapExtractor, Reply, StaticSearch};

fn harness() -> Harness {
    Harness::new(
        StaticSearch::with_urls(&["https://a"]),
        MapExtractor::with_pages(&[("https://a", "Some page text about ownership.")]),
        Reply::Text("Article".to_owned()),
    )
}

fn assert_no_io(harness: &Harness) {
    assert_eq!(harness.search.calls(), 0);
    assert_eq!(harness.extractor.calls(), 0);
    assert_eq!(harness.backend.calls(), 0);
}

#[tokio::test]
async fn length_outside_bounds_is_rejected() {
    let harness = harness();
    let owner = Uuid::new_v4();

    for length in [100, 4095, 120_001] {
        let mut req = request(persona(owner, false), Caller::user(owner));
        req.target_length = length;
        match harness.orchestrator.generate(&req).await {
            Err(err @ GenerateError::InvalidLength { .. }) => assert_eq!(err.http_status(), 400),
            Ok(outcome) => panic!("length {length} should be rejected, got: {outcome:?}"),
            Err(other) => panic!("expected invalid length, got: {other}"),
        }
    }
    assert_no_io(&harness);
}

#[tokio::test]
async fn length_bounds_are_inclusive() {
    let harness = harness();
    assert!(harness.orchestrator.check_parameters(4096, "test-model").is_ok());
    assert!(harness.orchestrator.check_parameters(120_000, "test-model").is_ok());
}

#[tokio::test]
async fn unknown_model_is_rejected() {
    let harness = harness();
    let owner = Uuid::new_v4();
    let mut req = request(persona(owner, false), Caller::user(owner));
    req.model_id = "gpt-9".to_owned();

    match harness.orchestrator.generate(&req).await {
        Err(err @ GenerateError::ModelUnavailable { .. }) => {
            assert_eq!(err.http_status(), 404);
            assert!(err.to_string().contains("gpt-9"));
        }
        Ok(outcome) => panic!("unknown model should be rejected, got: {outcome:?}"),
        Err(other) => panic!("expected model unavailable, got: {other}"),
    }
    assert_no_io(&harness);
}

#[tokio::test]
async fn length_is_checked_before_model() {
    let harness = harness();
    match harness.orchestrator.check_parameters(10, "gpt-9") {
        Err(GenerateError::InvalidLength { length, min, max }) => {
            assert_eq!((length, min, max), (10, 4096, 120_000));
        }
        Ok(_) => panic!("request should be rejected"),
        Err(other) => panic!("expected invalid length first, got: {other}"),
    }
}

#[tokio::test]
async fn private_persona_of_another_user_is_denied() {
    let harness = harness();
    let owner = Uuid::new_v4();
    let stranger = Caller::user(Uuid::new_v4());

    match harness
        .orchestrator
        .generate(&request(persona(owner, false), stranger))
        .await
    {
        Err(err @ GenerateError::AccessDenied { .. }) => assert_eq!(err.http_status(), 403),
        Ok(outcome) => panic!("access should be denied, got: {outcome:?}"),
        Err(other) => panic!("expected access denied, got: {other}"),
    }
    assert_no_io(&harness);
}

#[tokio::test]
async fn superuser_and_global_personas_are_readable() {
    let harness = harness();
    let owner = Uuid::new_v4();
    let superuser = Caller {
        id: Uuid::new_v4(),
        is_superuser: true,
    };

    assert!(harness
        .orchestrator
        .generate(&request(persona(owner, false), superuser))
        .await
        .is_ok());
    assert!(harness
        .orchestrator
        .generate(&request(persona(owner, true), Caller::user(Uuid::new_v4())))
        .await
        .is_ok());
    assert_eq!(harness.backend.calls(), 2);
}

#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc)]
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::Semaphore;
use zapdrop::config::AdmissionPolicy;
use zapdrop::domain::payload::{MediaKind, Payload};
use zapdrop::error::AppError;
use zapdrop::services::delivery_service::DeliveryReport;

mod common;

use common::MockTransport;

fn batch(value: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

#[tokio::test]
async fn test_batch_is_delivered_in_order() {
    let transport = Arc::new(MockTransport::with_default_roster());
    let ingest = common::ingest_service(Arc::clone(&transport), common::get_test_config());

    let body = batch(&json!([
        {"recipient": "Family", "content": "1"},
        {"recipient": "Bob", "content": "2"},
        {"recipient": "Alice Liddell", "content": "3"},
        {"recipient": "Family", "content": "4"},
    ]));
    let report = ingest.ingest("json", &body).await.unwrap();

    assert_eq!(report, DeliveryReport { total: 4, sent: 4, unresolved: 0 });
    assert_eq!(transport.sent_handles(), vec!["900@g.test", "200@s.test", "100@s.test", "900@g.test"]);
    let bodies: Vec<_> = transport.sent().into_iter().filter_map(|(_, p)| p.caption().map(str::to_string)).collect();
    assert_eq!(bodies, vec!["1", "2", "3", "4"]);
}

#[tokio::test]
async fn test_roster_is_fetched_once_per_batch() {
    let transport = Arc::new(MockTransport::with_default_roster());
    let ingest = common::ingest_service(Arc::clone(&transport), common::get_test_config());

    let body = batch(&json!([
        {"recipient": "Alice", "content": "a"},
        {"recipient": "Bob", "content": "b"},
        {"recipient": "Nobody", "content": "c"},
    ]));
    ingest.ingest("json", &body).await.unwrap();
    assert_eq!(transport.contact_fetches.load(Ordering::SeqCst), 1);
    assert_eq!(transport.group_fetches.load(Ordering::SeqCst), 1);

    ingest.ingest("json", &body).await.unwrap();
    assert_eq!(transport.roster_fetches(), 2);
}

#[tokio::test]
async fn test_contact_wins_name_collision_with_group() {
    let transport = Arc::new(MockTransport::with_default_roster());
    let ingest = common::ingest_service(Arc::clone(&transport), common::get_test_config());

    ingest.ingest("json", br#"[{"recipient":"Ops","content":"page"}]"#).await.unwrap();

    assert_eq!(transport.sent_handles(), vec!["300@s.test"]);
}

#[tokio::test]
async fn test_recipient_names_are_case_sensitive() {
    let transport = Arc::new(MockTransport::with_default_roster());
    let ingest = common::ingest_service(Arc::clone(&transport), common::get_test_config());

    let report = ingest.ingest("json", br#"[{"recipient":"alice","content":"hi"}]"#).await.unwrap();

    assert_eq!(report, DeliveryReport { total: 1, sent: 0, unresolved: 1 });
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_audio_attachment_drops_caption() {
    let transport = Arc::new(MockTransport::with_default_roster());
    let ingest = common::ingest_service(Arc::clone(&transport), common::get_test_config());

    let body = batch(&json!([{"recipient": "Bob", "content": "listen", "attachment": common::b64(common::MP3)}]));
    ingest.ingest("json", &body).await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    match &sent[0].1 {
        Payload::Audio { mime, media } => {
            assert_eq!(mime, "audio/mpeg");
            assert_eq!(media.file_length, common::MP3.len() as u64);
        }
        other => panic!("expected audio, got {other:?}"),
    }
    assert_eq!(sent[0].1.caption(), None);
    assert_eq!(*transport.uploads.lock().unwrap(), vec![MediaKind::Audio]);
}

#[tokio::test]
async fn test_pdf_attachment_is_sent_as_document() {
    let transport = Arc::new(MockTransport::with_default_roster());
    let ingest = common::ingest_service(Arc::clone(&transport), common::get_test_config());

    let body = batch(&json!([{"recipient": "Family", "content": "minutes", "attachment": common::b64(common::PDF)}]));
    ingest.ingest("json", &body).await.unwrap();

    let sent = transport.sent();
    assert!(matches!(&sent[0].1, Payload::Document { mime, .. } if mime == "application/pdf"));
    assert_eq!(*transport.uploads.lock().unwrap(), vec![MediaKind::Document]);
}

#[tokio::test]
async fn test_attachment_decode_error_stops_batch() {
    let transport = Arc::new(MockTransport::with_default_roster());
    let ingest = common::ingest_service(Arc::clone(&transport), common::get_test_config());

    let body = batch(&json!([
        {"recipient": "Alice", "content": "first"},
        {"recipient": "Bob", "content": "broken", "attachment": "not*base64"},
        {"recipient": "Family", "content": "never"},
    ]));
    let err = ingest.ingest("json", &body).await.unwrap_err();

    assert!(matches!(err, AppError::Decode(_)), "unexpected error: {err:?}");
    assert_eq!(transport.sent_handles(), vec!["100@s.test"]);
}

#[tokio::test]
async fn test_attachment_with_line_breaks_is_accepted() {
    let transport = Arc::new(MockTransport::with_default_roster());
    let ingest = common::ingest_service(Arc::clone(&transport), common::get_test_config());

    let encoded = common::b64(common::PNG);
    let (head, tail) = encoded.split_at(8);
    let body = batch(&json!([{"recipient": "Alice", "content": "pic", "attachment": format!("{head}\r\n{tail}\n")}]));
    ingest.ingest("json", &body).await.unwrap();

    assert!(matches!(&transport.sent()[0].1, Payload::Image { caption, .. } if caption == "pic"));
}

#[tokio::test]
async fn test_admission_wait_queues_second_batch() {
    let gate = Arc::new(Semaphore::new(0));
    let transport = Arc::new(MockTransport::gated(Arc::clone(&gate)));
    let mut config = common::get_test_config();
    config.delivery.max_concurrent_batches = Some(1);
    config.delivery.admission_policy = AdmissionPolicy::Wait;
    let ingest = common::ingest_service(Arc::clone(&transport), config);

    let first = tokio::spawn({
        let ingest = ingest.clone();
        async move { ingest.ingest("json", br#"[{"recipient":"Alice","content":"first"}]"#).await }
    });
    common::wait_until(|| transport.roster_fetches() == 1).await;

    let second = tokio::spawn({
        let ingest = ingest.clone();
        async move { ingest.ingest("json", br#"[{"recipient":"Bob","content":"second"}]"#).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    // Still queued behind the first batch.
    assert_eq!(transport.roster_fetches(), 1);
    assert!(!second.is_finished());

    gate.add_permits(1);
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(transport.roster_fetches(), 2);
    assert_eq!(transport.sent_handles(), vec!["100@s.test", "200@s.test"]);
}

#[tokio::test]
async fn test_admission_reject_refuses_when_saturated() {
    let gate = Arc::new(Semaphore::new(0));
    let transport = Arc::new(MockTransport::gated(Arc::clone(&gate)));
    let mut config = common::get_test_config();
    config.delivery.max_concurrent_batches = Some(1);
    config.delivery.admission_policy = AdmissionPolicy::Reject;
    let ingest = common::ingest_service(Arc::clone(&transport), config);

    let first = tokio::spawn({
        let ingest = ingest.clone();
        async move { ingest.ingest("json", br#"[{"recipient":"Alice","content":"first"}]"#).await }
    });
    common::wait_until(|| transport.roster_fetches() == 1).await;

    let err = ingest.ingest("json", br#"[{"recipient":"Bob","content":"second"}]"#).await.unwrap_err();
    assert!(matches!(err, AppError::Busy));

    // Invalid batches are still rejected as invalid, not as busy.
    let err = ingest.ingest("json", br#"[{"recipient":"","content":"x"}]"#).await.unwrap_err();
    assert!(matches!(err, AppError::Validation));

    gate.add_permits(1);
    first.await.unwrap().unwrap();
    assert_eq!(transport.sent_handles(), vec!["100@s.test"]);

    // The slot is free again.
    ingest.ingest("json", br#"[{"recipient":"Bob","content":"third"}]"#).await.unwrap();
    assert_eq!(transport.sent_handles(), vec!["100@s.test", "200@s.test"]);
}

#[tokio::test]
async fn test_busy_maps_to_service_unavailable() {
    let gate = Arc::new(Semaphore::new(0));
    let transport = Arc::new(MockTransport::gated(Arc::clone(&gate)));
    let mut config = common::get_test_config();
    config.delivery.max_concurrent_batches = Some(1);
    config.delivery.admission_policy = AdmissionPolicy::Reject;
    let app = common::TestApp::spawn_with(Arc::clone(&transport), config).await;

    let first = tokio::spawn({
        let client = app.client.clone();
        let url = format!("{}/", app.server_url);
        async move {
            client
                .post(url)
                .header("Content-Type", "application/json")
                .body(r#"[{"recipient":"Alice","content":"first"}]"#)
                .send()
                .await
                .unwrap()
        }
    });
    common::wait_until(|| transport.roster_fetches() == 1).await;

    let resp = app.post_batch("application/json", r#"[{"recipient":"Bob","content":"second"}]"#).await;
    assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    gate.add_permits(1);
    assert_eq!(first.await.unwrap().status(), reqwest::StatusCode::CREATED);
}

#[tokio::test]
async fn test_oversized_admission_bound_fails_to_build() {
    let mut config = common::get_test_config();
    config.delivery.max_concurrent_batches = Some(Semaphore::MAX_PERMITS + 1);

    let result =
        zapdrop::AppBuilder::new(config).with_transport(Arc::new(MockTransport::with_default_roster())).build();

    assert!(result.is_err());
}

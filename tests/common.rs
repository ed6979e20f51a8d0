#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc, unreachable_pub)]

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use zapdrop::adapters::transport::{Transport, TransportError};
use zapdrop::config::{Config, RunMode};
use zapdrop::domain::payload::{MediaKind, Payload, UploadedMedia};
use zapdrop::domain::roster::{Contact, Group, Handle};
use zapdrop::services::ingest_service::IngestService;

pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R'];
pub const MP3: &[u8] = b"ID3\x03\x00\x00\x00\x00\x00\x21";
pub const PDF: &[u8] = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n";

pub fn b64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// In-memory transport that records every call.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub contacts: Mutex<Vec<Contact>>,
    pub groups: Mutex<Vec<Group>>,
    pub sent: Mutex<Vec<(Handle, Payload)>>,
    pub uploads: Mutex<Vec<MediaKind>>,
    pub contact_fetches: AtomicUsize,
    pub group_fetches: AtomicUsize,
    pub fail_roster: AtomicBool,
    pub fail_send_to: Mutex<Option<Handle>>,
    /// When set, every send waits for a permit; tests use it to hold a batch in flight.
    pub send_gate: Option<Arc<Semaphore>>,
}

impl MockTransport {
    /// Roster used by most tests: two contacts, one group, and a name shared by
    /// a contact and a group.
    pub fn with_default_roster() -> Self {
        let transport = Self::default();
        *transport.contacts.lock().unwrap() = vec![
            Contact::new("100@s.test", "Alice", "Alice Liddell"),
            Contact::new("200@s.test", "Bob", "Robert Paulson"),
            Contact::new("300@s.test", "Ops", "Ops Pager"),
        ];
        *transport.groups.lock().unwrap() = vec![Group::new("900@g.test", "Family"), Group::new("901@g.test", "Ops")];
        transport
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self { send_gate: Some(gate), ..Self::with_default_roster() }
    }

    pub fn sent(&self) -> Vec<(Handle, Payload)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_handles(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(handle, _)| handle.to_string()).collect()
    }

    pub fn roster_fetches(&self) -> usize {
        self.contact_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn list_contacts(&self) -> Result<Vec<Contact>, TransportError> {
        self.contact_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_roster.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected);
        }
        Ok(self.contacts.lock().unwrap().clone())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, TransportError> {
        self.group_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn upload(&self, data: Vec<u8>, kind: MediaKind) -> Result<UploadedMedia, TransportError> {
        self.uploads.lock().unwrap().push(kind);
        Ok(UploadedMedia {
            url: format!("https://media.test/{}", uuid::Uuid::new_v4()),
            direct_path: "/v/t62/abc".to_string(),
            media_key: vec![1; 32],
            file_enc_sha256: vec![2; 32],
            file_sha256: vec![3; 32],
            file_length: data.len() as u64,
        })
    }

    async fn send(&self, to: &Handle, payload: Payload) -> Result<(), TransportError> {
        if let Some(gate) = &self.send_gate {
            let _permit = gate.acquire().await.unwrap();
        }
        if self.fail_send_to.lock().unwrap().as_ref() == Some(to) {
            return Err(TransportError::Rejected(to.to_string()));
        }
        self.sent.lock().unwrap().push((to.clone(), payload));
        Ok(())
    }
}

pub fn get_test_config() -> Config {
    let mut config = Config { mode: RunMode::Http, ..Config::default() };
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config
}

pub fn ingest_service(transport: Arc<MockTransport>, config: Config) -> IngestService {
    zapdrop::telemetry::init_test_telemetry();
    zapdrop::AppBuilder::new(config).with_transport(transport).build().unwrap().ingest_service
}

/// Polls until `condition` holds, failing the test after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub struct TestApp {
    pub server_url: String,
    pub client: reqwest::Client,
    pub transport: Arc<MockTransport>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(MockTransport::with_default_roster()), get_test_config()).await
    }

    pub async fn spawn_with(transport: Arc<MockTransport>, config: Config) -> Self {
        let ingest = ingest_service(Arc::clone(&transport), config.clone());
        let router = zapdrop::api::app_router(&config, ingest);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { server_url: format!("http://{addr}"), client: reqwest::Client::new(), transport }
    }

    pub async fn post_batch(&self, content_type: &str, body: impl Into<reqwest::Body>) -> reqwest::Response {
        self.client
            .post(format!("{}/", self.server_url))
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .unwrap()
    }
}

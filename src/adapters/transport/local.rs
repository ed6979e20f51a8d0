use crate::adapters::transport::{Transport, TransportError};
use crate::config::TransportConfig;
use crate::domain::payload::{MediaKind, Payload, UploadedMedia};
use crate::domain::roster::{Contact, Group, Handle};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
struct RosterFile {
    #[serde(default)]
    contacts: Vec<Contact>,
    #[serde(default)]
    groups: Vec<Group>,
}

/// Transport backed by a roster file on disk.
///
/// Stands in for a real messaging network: uploads are hashed and given a local
/// locator, and sends are only logged. The roster file is re-read on every
/// fetch so edits apply to the next batch.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    roster_file: Option<PathBuf>,
    debug: bool,
}

impl LocalTransport {
    #[must_use]
    pub fn new(config: &TransportConfig) -> Self {
        if config.roster_file.is_none() {
            tracing::warn!("No roster file configured, every recipient will be unresolved");
        }
        Self { roster_file: config.roster_file.clone(), debug: config.transport_debug }
    }

    async fn load_roster(&self) -> Result<RosterFile, TransportError> {
        let Some(path) = &self.roster_file else {
            return Ok(RosterFile::default());
        };

        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading roster file {}", path.display()))?;
        let roster: RosterFile =
            serde_yaml::from_str(&raw).with_context(|| format!("parsing roster file {}", path.display()))?;

        if self.debug {
            tracing::debug!(
                contacts = roster.contacts.len(),
                groups = roster.groups.len(),
                path = %path.display(),
                "Loaded roster"
            );
        }
        Ok(roster)
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn list_contacts(&self) -> Result<Vec<Contact>, TransportError> {
        Ok(self.load_roster().await?.contacts)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, TransportError> {
        Ok(self.load_roster().await?.groups)
    }

    async fn upload(&self, data: Vec<u8>, kind: MediaKind) -> Result<UploadedMedia, TransportError> {
        let id = Uuid::new_v4();
        let media_key: [u8; 32] = rand::random();
        let file_sha256 = Sha256::digest(&data).to_vec();

        if self.debug {
            tracing::debug!(media_id = %id, kind = %kind, size = data.len(), "Stored attachment locally");
        }

        Ok(UploadedMedia {
            url: format!("local://media/{id}"),
            direct_path: format!("/{kind}/{id}"),
            media_key: media_key.to_vec(),
            // Nothing is encrypted locally, so both digests cover the same bytes.
            file_enc_sha256: file_sha256.clone(),
            file_sha256,
            file_length: data.len() as u64,
        })
    }

    async fn send(&self, to: &Handle, payload: Payload) -> Result<(), TransportError> {
        tracing::info!(
            to = %to,
            kind = payload.kind(),
            caption = payload.caption().unwrap_or_default(),
            "STUB: Handing message to the network"
        );
        Ok(())
    }
}

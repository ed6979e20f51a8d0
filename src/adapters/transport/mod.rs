use crate::domain::payload::{MediaKind, Payload, UploadedMedia};
use crate::domain::roster::{Contact, Group, Handle};
use async_trait::async_trait;
use thiserror::Error;

pub mod local;

pub use local::LocalTransport;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transport is not connected")]
    Disconnected,
    #[error("Recipient rejected the message: {0}")]
    Rejected(String),
    #[error("External service error: {0}")]
    Other(#[from] anyhow::Error),
}

/// The messaging network the pipeline delivers through.
///
/// One instance is shared by every concurrent batch, so implementations must be
/// safe to call from several tasks at once.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Lists known contacts in a stable order.
    ///
    /// # Errors
    /// Returns an error if the contact store cannot be read.
    async fn list_contacts(&self) -> Result<Vec<Contact>, TransportError>;

    /// Lists joined groups in a stable order.
    ///
    /// # Errors
    /// Returns an error if group membership cannot be fetched.
    async fn list_groups(&self) -> Result<Vec<Group>, TransportError>;

    /// Uploads attachment bytes and returns where and how they were stored.
    ///
    /// # Errors
    /// Returns an error if the media server refuses the upload.
    async fn upload(&self, data: Vec<u8>, kind: MediaKind) -> Result<UploadedMedia, TransportError>;

    /// Sends a built payload to a resolved handle.
    ///
    /// # Errors
    /// Returns an error if the message cannot be handed to the network.
    async fn send(&self, to: &Handle, payload: Payload) -> Result<(), TransportError>;
}

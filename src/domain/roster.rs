use serde::Deserialize;
use std::fmt;

/// Opaque transport address of a contact or a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Contact {
    pub handle: Handle,
    #[serde(default)]
    pub push_name: String,
    #[serde(default)]
    pub full_name: String,
}

impl Contact {
    #[must_use]
    pub fn new(handle: impl Into<String>, push_name: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self { handle: Handle::new(handle), push_name: push_name.into(), full_name: full_name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Group {
    pub handle: Handle,
    pub name: String,
}

impl Group {
    #[must_use]
    pub fn new(handle: impl Into<String>, name: impl Into<String>) -> Self {
        Self { handle: Handle::new(handle), name: name.into() }
    }
}

/// Contacts and groups as fetched from the transport for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterSnapshot {
    pub contacts: Vec<Contact>,
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRecipient {
    Found(Handle),
    NotFound,
}

impl ResolvedRecipient {
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    #[must_use]
    pub const fn handle(&self) -> Option<&Handle> {
        match self {
            Self::Found(handle) => Some(handle),
            Self::NotFound => None,
        }
    }
}

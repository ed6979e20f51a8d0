use crate::domain::roster::{Contact, Group, Handle, ResolvedRecipient};

/// Resolves a display name to a transport handle.
///
/// Groups are scanned first, then contacts, and every match overwrites the
/// previous one: the last match wins. A contact therefore beats a group with the
/// same name, and among contacts the later entry beats the earlier one. A contact
/// matches on either its push name or its full name.
#[must_use]
pub fn resolve(name: &str, contacts: &[Contact], groups: &[Group]) -> ResolvedRecipient {
    let mut found: Option<&Handle> = None;

    for group in groups {
        if group.name == name {
            found = Some(&group.handle);
        }
    }
    for contact in contacts {
        if contact.push_name == name || contact.full_name == name {
            found = Some(&contact.handle);
        }
    }

    found.map_or(ResolvedRecipient::NotFound, |handle| ResolvedRecipient::Found(handle.clone()))
}

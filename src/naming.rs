//! Deterministic object keys.
//!
//! `{folder}{identifier}-{millis}.{extension}`. Same inputs, same key; a
//! second write under that key replaces the first.

use crate::models::Purpose;
use std::fmt;

const AVATAR_FOLDER: &str = "avatars/";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(
        purpose: Purpose,
        identifier: Option<&str>,
        timestamp_millis: i64,
        extension: &str,
    ) -> Self {
        Self(format!(
            "{}{}-{}.{}",
            folder(purpose),
            slot_name(purpose, identifier),
            timestamp_millis,
            extension
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn folder(purpose: Purpose) -> &'static str {
    match purpose {
        Purpose::Logo => "",
        Purpose::StaffAvatar | Purpose::StudentAvatar => AVATAR_FOLDER,
    }
}

fn default_identifier(purpose: Purpose) -> &'static str {
    match purpose {
        Purpose::Logo => "school-logo",
        Purpose::StaffAvatar | Purpose::StudentAvatar => "avatar",
    }
}

/// Sanitized identifier, or the purpose's default when it is missing or blank.
/// Also names the logical slot that concurrent uploads are serialized on.
pub fn slot_name(purpose: Purpose, identifier: Option<&str>) -> String {
    match identifier.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
        None => default_identifier(purpose).to_string(),
    }
}

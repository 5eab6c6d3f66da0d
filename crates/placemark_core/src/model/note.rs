//! Private per-user place notes.
//!
//! # Responsibility
//! - Define the remote note record and its composite storage key.
//!
//! # Invariants
//! - At most one `PlaceNote` exists per `(place_id, uid)`; the pair is the
//!   storage key, so a second write for the same pair replaces the first.
//! - Encoded key segments never contain remote path metacharacters.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const KEY_SEPARATOR: char = '~';

// Remote key paths reject `.#$[]/`; `%` and the separator are escaped so
// encoding stays injective.
static KEY_SEGMENT_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.#$\[\]/%~]").expect("valid key escape regex"));

/// One record of the remote `placeNotes` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceNote {
    pub place_id: String,
    pub uid: String,
    pub note: String,
}

/// Composite `(place_id, uid)` key for note storage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteKey {
    place_id: String,
    uid: String,
}

impl NoteKey {
    pub fn new(place_id: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            uid: uid.into(),
        }
    }

    pub fn place_id(&self) -> &str {
        &self.place_id
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Returns the flat key used as the remote collection entry name.
    pub fn encoded(&self) -> String {
        format!(
            "{}{KEY_SEPARATOR}{}",
            encode_segment(&self.place_id),
            encode_segment(&self.uid)
        )
    }

    /// Builds the record stored under this key.
    pub fn record(&self, note: impl Into<String>) -> PlaceNote {
        PlaceNote {
            place_id: self.place_id.clone(),
            uid: self.uid.clone(),
            note: note.into(),
        }
    }
}

impl Display for NoteKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encoded())
    }
}

fn encode_segment(value: &str) -> String {
    KEY_SEGMENT_ESCAPE_RE
        .replace_all(value, |caps: &Captures<'_>| {
            let mut buf = [0u8; 4];
            caps[0]
                .chars()
                .next()
                .map(|c| {
                    c.encode_utf8(&mut buf)
                        .bytes()
                        .map(|b| format!("%{b:02X}"))
                        .collect::<String>()
                })
                .unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::NoteKey;

    #[test]
    fn encoded_key_escapes_path_metacharacters() {
        let key = NoteKey::new("a.b/c", "u#1");
        let encoded = key.encoded();
        assert_eq!(encoded, "a%2Eb%2Fc~u%231");
        for forbidden in ['.', '#', '$', '[', ']', '/'] {
            assert!(!encoded.contains(forbidden));
        }
    }

    #[test]
    fn separator_inside_segments_does_not_collide() {
        let left = NoteKey::new("a~b", "c");
        let right = NoteKey::new("a", "b~c");
        assert_ne!(left.encoded(), right.encoded());
    }

    #[test]
    fn plain_provider_ids_are_left_untouched() {
        let key = NoteKey::new("ChIJN1t_tDeuEmsRUsoyG83frY4", "anon-42");
        assert_eq!(key.encoded(), "ChIJN1t_tDeuEmsRUsoyG83frY4~anon-42");
    }
}

//! Non-fatal notes.
//!
//! Comparisons and pixel conversions report what they find through a caller
//! supplied callback rather than failing. The callback receives a
//! [`NoteType`] and a human-readable message:
//!
//! ```rust
//! use dcp_core::NoteType;
//!
//! let mut seen = Vec::new();
//! let mut note = |kind: NoteType, msg: String| seen.push((kind, msg));
//! note(NoteType::Note, "XYZ value 6901 out of range".into());
//! assert_eq!(seen.len(), 1);
//! ```

use std::fmt;

/// Severity of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteType {
    /// Progress information.
    Progress,
    /// A difference or problem that makes a comparison fail.
    Error,
    /// Informational; processing continued.
    Note,
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NoteType::Progress => "progress",
            NoteType::Error => "error",
            NoteType::Note => "note",
        };
        f.write_str(s)
    }
}

/// Note callback accepted by comparison and conversion functions.
pub type NoteHandler<'a> = &'a mut dyn FnMut(NoteType, String);

/// A note handler that drops everything.
pub fn ignore_notes(_: NoteType, _: String) {}

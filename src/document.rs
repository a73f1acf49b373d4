use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub type NoteId = String;

/// Title given to drawings saved without one
pub const DEFAULT_DRAWING_TITLE: &str = "Drawing";

/// One note of the on-disk document.
///
/// Fields written by older versions may be missing; they take their defaults
/// on load. Unknown fields are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub reminder: Option<Value>,
    #[serde(default, deserialize_with = "array_or_empty")]
    pub audio_files: Vec<Value>,
    #[serde(default)]
    pub drawing_path: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Anything but a JSON array becomes an empty list
fn array_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

impl Note {
    /// A new unpinned note whose only content is a drawing
    pub fn new_drawing(title: &str, drawing_path: PathBuf, now: DateTime<Utc>) -> Self {
        let title = if title.trim().is_empty() {
            DEFAULT_DRAWING_TITLE
        } else {
            title
        };
        Self {
            id: format!("note-{}", Uuid::new_v4()),
            title: title.to_owned(),
            content: String::new(),
            created_at: now,
            updated_at: now,
            is_pinned: false,
            reminder: None,
            audio_files: Vec::new(),
            drawing_path: Some(drawing_path),
            extra: BTreeMap::new(),
        }
    }

    pub fn has_drawing(&self) -> bool {
        self.drawing_path.is_some()
    }
}

/// The whole persisted document: live notes, trashed notes and reminders.
///
/// Only `notes` is edited by the drawing subsystem; the other sections are
/// written back exactly as they were read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotesDocument {
    pub notes: BTreeMap<NoteId, Note>,
    pub trash_notes: BTreeMap<NoteId, Note>,
    pub reminders: BTreeMap<String, Value>,
}

impl NotesDocument {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.get(id)
    }

    /// Points an existing note at a new drawing, or creates a drawing note
    /// when `target` is `None` or names no live note.
    pub fn attach_drawing(
        &mut self,
        target: Option<&str>,
        drawing_path: &Path,
        title: &str,
        now: DateTime<Utc>,
    ) -> Note {
        if let Some(note) = target.and_then(|id| self.notes.get_mut(id)) {
            note.drawing_path = Some(drawing_path.to_path_buf());
            note.updated_at = now;
            return note.clone();
        }
        let note = Note::new_drawing(title, drawing_path.to_path_buf(), now);
        self.notes.insert(note.id.clone(), note.clone());
        note
    }

    /// Notes that carry a drawing, most recently updated first
    pub fn drawing_notes(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.values().filter(|note| note.has_drawing()).collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let doc = NotesDocument::from_json(
            r#"{"notes": {"n1": {"id": "n1", "title": "t", "content": "c", "audioFiles": "oops"}}}"#,
        )
        .unwrap();
        let note = doc.note("n1").unwrap();
        assert!(note.audio_files.is_empty());
        assert!(note.reminder.is_none());
        assert!(note.drawing_path.is_none());
        assert!(!note.is_pinned);
        assert!(doc.trash_notes.is_empty());
    }

    #[test]
    fn unknown_sections_survive_a_round_trip() {
        let json = r#"{
            "notes": {"n1": {"id": "n1", "title": "t", "content": "", "color": "yellow"}},
            "trashNotes": {},
            "reminders": {"r1": {"id": "r1", "title": "call", "reminderTime": "2024-01-01T10:00:00.000Z"}}
        }"#;
        let doc = NotesDocument::from_json(json).unwrap();
        let again = NotesDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(doc, again);
        assert_eq!(again.note("n1").unwrap().extra["color"], "yellow");
        assert_eq!(again.reminders["r1"]["title"], "call");
    }

    #[test]
    fn attach_drawing_updates_or_creates() {
        let mut doc = NotesDocument::default();
        let now = Utc::now();
        let created = doc.attach_drawing(None, Path::new("/d/a.png"), "", now);
        assert_eq!(created.title, DEFAULT_DRAWING_TITLE);
        assert!(created.id.starts_with("note-"));

        let later = now + chrono::Duration::seconds(5);
        let updated = doc.attach_drawing(Some(&created.id), Path::new("/d/b.png"), "ignored", later);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.drawing_path.as_deref(), Some(Path::new("/d/b.png")));
        assert_eq!(updated.updated_at, later);
        assert_eq!(doc.notes.len(), 1);

        let missing = doc.attach_drawing(Some("gone"), Path::new("/d/c.png"), "Sketch", later);
        assert_ne!(missing.id, "gone");
        assert_eq!(doc.notes.len(), 2);
        assert_eq!(doc.drawing_notes().len(), 2);
    }
}

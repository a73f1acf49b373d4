use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt as _;
use futures::future::BoxFuture;
use parking_lot::Mutex;

use super::{DrawingStore, ImagePayload, PersistenceError, PersistenceResult};
use crate::document::{Note, NoteId, NotesDocument};

const NOTES_FILE: &str = "notes.json";
const DRAWINGS_DIR: &str = "drawings";

/// Note store backed by a single JSON document plus one PNG per drawing.
///
/// Cloning is cheap; clones share the same in-memory document.
#[derive(Debug, Clone)]
pub struct FileNoteStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    data_path: PathBuf,
    drawings_dir: PathBuf,
    document: Mutex<NotesDocument>,
}

impl FileNoteStore {
    /// Opens the store rooted at `dir`, creating the directory if needed.
    ///
    /// A missing notes file starts an empty document. A corrupt one is
    /// logged and also treated as empty.
    pub fn open(dir: impl AsRef<Path>) -> PersistenceResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let data_path = dir.join(NOTES_FILE);

        let document = match fs::read_to_string(&data_path) {
            Ok(json) => NotesDocument::from_json(&json).unwrap_or_else(|err| {
                log::error!("Failed to parse {}: {err}", data_path.display());
                NotesDocument::default()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => NotesDocument::default(),
            Err(err) => return Err(err.into()),
        };
        log::info!(
            "Opened note store at {} ({} notes)",
            dir.display(),
            document.notes.len()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                data_path,
                drawings_dir: dir.join(DRAWINGS_DIR),
                document: Mutex::new(document),
            }),
        })
    }

    pub fn data_path(&self) -> &Path {
        &self.inner.data_path
    }

    pub fn drawings_dir(&self) -> &Path {
        &self.inner.drawings_dir
    }

    pub fn note(&self, id: &str) -> Option<Note> {
        self.inner.document.lock().note(id).cloned()
    }

    /// Notes with a drawing attached, most recently updated first
    pub fn drawing_notes(&self) -> Vec<Note> {
        self.inner
            .document
            .lock()
            .drawing_notes()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Copy of the whole document as currently held in memory
    pub fn document(&self) -> NotesDocument {
        self.inner.document.lock().clone()
    }
}

impl Inner {
    fn save_drawing(&self, payload: ImagePayload, target: Option<NoteId>, title: &str) -> PersistenceResult<Note> {
        fs::create_dir_all(&self.drawings_dir)?;
        let now = Utc::now();
        let path = self.unused_drawing_path(now.timestamp_millis());
        fs::write(&path, payload.bytes())?;
        log::info!("Drawing written to {}", path.display());

        // the in-memory document only changes once the file is written
        let mut document = self.document.lock();
        let mut updated = document.clone();
        let note = updated.attach_drawing(target.as_deref(), &path, title, now);
        if let Err(err) = self.write_document(&updated) {
            if let Err(cleanup) = fs::remove_file(&path) {
                log::warn!("Failed to remove orphaned {}: {cleanup}", path.display());
            }
            return Err(err);
        }
        *document = updated;
        Ok(note)
    }

    fn unused_drawing_path(&self, millis: i64) -> PathBuf {
        let mut path = self.drawings_dir.join(format!("drawing-{millis}.png"));
        let mut n = 1;
        while path.exists() {
            path = self.drawings_dir.join(format!("drawing-{millis}-{n}.png"));
            n += 1;
        }
        path
    }

    fn write_document(&self, document: &NotesDocument) -> PersistenceResult<()> {
        let json = document.to_json()?;
        // write-then-rename so a failed write never truncates the old file
        let tmp = self.data_path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        if let Err(err) = fs::rename(&tmp, &self.data_path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }
}

fn load_image(path: &Path) -> PersistenceResult<ImagePayload> {
    match fs::read(path) {
        Ok(bytes) => Ok(ImagePayload::new(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(PersistenceError::NotFound(path.to_path_buf()))
        }
        Err(err) => Err(err.into()),
    }
}

impl DrawingStore for FileNoteStore {
    fn save_drawing(
        &self,
        payload: ImagePayload,
        target: Option<NoteId>,
        title: String,
    ) -> BoxFuture<'static, PersistenceResult<Note>> {
        let inner = Arc::clone(&self.inner);
        async move {
            inner.save_drawing(payload, target, &title).inspect_err(|err| {
                log::error!("Failed to save drawing: {err}");
            })
        }
        .boxed()
    }

    fn load_drawing_image(&self, reference: &Path) -> BoxFuture<'static, PersistenceResult<ImagePayload>> {
        let path = reference.to_path_buf();
        async move { load_image(&path) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn corrupt_notes_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(NOTES_FILE), "{ not json").unwrap();
        let store = FileNoteStore::open(dir.path()).unwrap();
        assert!(store.document().notes.is_empty());
    }

    #[test]
    fn drawing_paths_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNoteStore::open(dir.path()).unwrap();
        let payload = ImagePayload::new(vec![1, 2, 3]);
        let a = block_on(store.save_drawing(payload.clone(), None, String::new())).unwrap();
        let b = block_on(store.save_drawing(payload, None, String::new())).unwrap();
        assert_ne!(a.drawing_path, b.drawing_path);
    }

    fn png_count(store: &FileNoteStore) -> usize {
        fs::read_dir(store.drawings_dir())
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0)
    }

    #[test]
    fn failed_document_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNoteStore::open(dir.path()).unwrap();
        // a non-empty directory where notes.json belongs makes the rename fail
        fs::create_dir_all(store.data_path().join("blocker")).unwrap();

        let payload = ImagePayload::new(vec![1, 2, 3]);
        let err = block_on(store.save_drawing(payload.clone(), None, String::new())).unwrap_err();
        assert!(matches!(err, PersistenceError::Io(_)));
        assert!(store.document().notes.is_empty());
        assert_eq!(png_count(&store), 0);

        fs::remove_dir_all(store.data_path()).unwrap();
        let note = block_on(store.save_drawing(payload, None, String::new())).unwrap();

        let reopened = FileNoteStore::open(dir.path()).unwrap();
        assert_eq!(reopened.document().notes.len(), 1);
        assert!(reopened.note(&note.id).is_some());
        assert_eq!(png_count(&reopened), 1);
        assert!(!dir.path().join("notes.json.tmp").exists());
    }

    #[test]
    fn missing_image_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNoteStore::open(dir.path()).unwrap();
        let err = block_on(store.load_drawing_image(&dir.path().join("nope.png"))).unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound(_)));
    }
}

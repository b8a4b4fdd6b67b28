//! Raw note persistence.
//!
//! Each note is a UTF-8 file `<note_id>.txt` in the notes directory. The
//! Random-Indexing state is rebuilt from these files on startup.

use std::path::{Path, PathBuf};

const NOTE_EXTENSION: &str = "txt";

#[derive(Debug, thiserror::Error)]
pub enum NoteStoreError {
    #[error("io error: {0:?}")]
    IO(#[from] std::io::Error),

    #[error("invalid note id {0:?}")]
    InvalidId(String),

    #[error("note not found: {0}")]
    NotFound(String),
}

pub trait NoteStore: Send + Sync {
    fn write(&self, note_id: &str, text: &str) -> Result<(), NoteStoreError>;
    fn read(&self, note_id: &str) -> Result<String, NoteStoreError>;
    fn exists(&self, note_id: &str) -> bool;
    fn delete(&self, note_id: &str) -> Result<(), NoteStoreError>;
    /// Note ids sorted ascending.
    fn list(&self) -> Vec<String>;
}

/// Note ids become file names, so path separators and hidden names are refused.
pub fn validate_note_id(note_id: &str) -> Result<(), NoteStoreError> {
    let invalid = note_id.is_empty()
        || note_id.starts_with('.')
        || note_id.len() > 200
        || note_id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control());

    if invalid {
        return Err(NoteStoreError::InvalidId(note_id.to_string()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct LocalNoteStore {
    pub base_dir: PathBuf,
}

impl LocalNoteStore {
    pub fn new(notes_dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(notes_dir)?;
        Ok(LocalNoteStore {
            base_dir: notes_dir.to_path_buf(),
        })
    }

    fn note_path(&self, note_id: &str) -> PathBuf {
        self.base_dir.join(format!("{note_id}.{NOTE_EXTENSION}"))
    }
}

impl NoteStore for LocalNoteStore {
    fn exists(&self, note_id: &str) -> bool {
        validate_note_id(note_id).is_ok() && self.note_path(note_id).is_file()
    }

    fn read(&self, note_id: &str) -> Result<String, NoteStoreError> {
        validate_note_id(note_id)?;
        let path = self.note_path(note_id);

        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(NoteStoreError::NotFound(note_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, note_id: &str, text: &str) -> Result<(), NoteStoreError> {
        validate_note_id(note_id)?;

        let mut temp = tempfile::NamedTempFile::new_in(&self.base_dir)?;
        std::io::Write::write_all(&mut temp, text.as_bytes())?;
        temp.persist(self.note_path(note_id)).map_err(|e| e.error)?;

        Ok(())
    }

    fn delete(&self, note_id: &str) -> Result<(), NoteStoreError> {
        validate_note_id(note_id)?;

        match std::fs::remove_file(self.note_path(note_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(NoteStoreError::NotFound(note_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = std::fs::read_dir(&self.base_dir)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.is_file()
                            && path.extension().and_then(|e| e.to_str()) == Some(NOTE_EXTENSION)
                    })
                    .filter_map(|path| {
                        path.file_stem()
                            .and_then(|stem| stem.to_str())
                            .map(|s| s.to_string())
                    })
                    .filter(|id| validate_note_id(id).is_ok())
                    .collect()
            })
            .unwrap_or_default();

        ids.sort();
        ids
    }
}

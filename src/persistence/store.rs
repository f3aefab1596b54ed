use crate::entities::character::Character;
use crate::error::StoreError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Loads and saves characters by session id.
pub trait ProfileStore: Send + Sync {
    fn load_character(&self, session: &str) -> Result<Character, StoreError>;
    fn save_character(&self, session: &str, character: &Character) -> Result<(), StoreError>;
}

/// `<root>/profiles/<session>/character.json`, with the previous save kept as
/// `character.json#` and used when the primary file is missing or corrupt.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    root: PathBuf,
}

impl FileProfileStore {
    pub fn from_root(root: &Path) -> Self {
        Self {
            root: root.join("profiles"),
        }
    }

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn profile_dir(&self, session: &str) -> PathBuf {
        self.root.join(session)
    }

    fn character_path(&self, session: &str) -> PathBuf {
        self.profile_dir(session).join("character.json")
    }

    fn character_backup_path(&self, session: &str) -> PathBuf {
        self.profile_dir(session).join("character.json#")
    }

    fn load_from_backup(&self, session: &str) -> Result<Option<Character>, StoreError> {
        let backup_path = self.character_backup_path(session);
        let data = match fs::read_to_string(&backup_path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&data)?))
    }
}

impl ProfileStore for FileProfileStore {
    fn load_character(&self, session: &str) -> Result<Character, StoreError> {
        let path = self.character_path(session);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return self
                    .load_from_backup(session)?
                    .ok_or_else(|| StoreError::NotFound(session.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&data) {
            Ok(character) => Ok(character),
            Err(err) => match self.load_from_backup(session)? {
                Some(fallback) => {
                    log::warn!(
                        "profile parse failed for {}, using backup: {}",
                        path.display(),
                        err
                    );
                    Ok(fallback)
                }
                None => Err(err.into()),
            },
        }
    }

    fn save_character(&self, session: &str, character: &Character) -> Result<(), StoreError> {
        fs::create_dir_all(self.profile_dir(session))?;
        let path = self.character_path(session);
        let data = serde_json::to_string_pretty(character)?;
        if path.exists() {
            fs::copy(&path, self.character_backup_path(session))?;
        }
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

/// In-memory store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    characters: Mutex<HashMap<String, Character>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: &str, character: Character) {
        if let Ok(mut characters) = self.characters.lock() {
            characters.insert(session.to_string(), character);
        }
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load_character(&self, session: &str) -> Result<Character, StoreError> {
        let characters = self
            .characters
            .lock()
            .map_err(|_| StoreError::Io(std::io::Error::other("profile store lock poisoned")))?;
        characters
            .get(session)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(session.to_string()))
    }

    fn save_character(&self, session: &str, character: &Character) -> Result<(), StoreError> {
        let mut characters = self
            .characters
            .lock()
            .map_err(|_| StoreError::Io(std::io::Error::other("profile store lock poisoned")))?;
        characters.insert(session.to_string(), character.clone());
        Ok(())
    }
}

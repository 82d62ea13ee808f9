#![deny(warnings)]

//! Session store for camo progress.
//!
//! Owns the catalog, the progress tree and the storage it is saved to.
//! Startup restores (and if needed migrates) the saved tree; every mutation
//! goes through the store and is followed by a full snapshot write.

use camo_core::{migrate, Catalog, Game, MigrationReport, Mode, ProgressModel};
use persistence::{
    read_snapshot, write_snapshot, CodecError, PersistError, Storage, StorageError, SAVE_KEY,
};
use thiserror::Error;
use tracing::{info, warn};

mod query;

pub use query::{Count, Scope};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog has no games")]
    EmptyCatalog,
    #[error("game {0} declares no modes")]
    GameWithoutModes(String),
    #[error("saved progress is unreadable: {0}")]
    Decode(#[from] CodecError),
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
    #[error("saved progress has no entry for game {0}")]
    MissingGame(String),
    #[error("unknown game: {0}")]
    UnknownGame(String),
    #[error("unknown mode {mode} for game {game}")]
    UnknownMode { game: String, mode: String },
    #[error("index {index} out of range ({len} available)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("category {category} not found in game {game}")]
    CategoryNotFound { game: String, category: String },
    #[error("weapon {weapon} not found in category {category}")]
    WeaponNotFound { category: String, weapon: String },
    #[error("completion category {completion} not defined for mode {mode}")]
    CompletionCategoryNotFound { mode: String, completion: String },
    #[error("weapon {weapon} has no progress for mode {mode}")]
    ModeNotTracked { weapon: String, mode: String },
}

impl From<PersistError> for StoreError {
    fn from(e: PersistError) -> Self {
        match e {
            PersistError::Storage(e) => StoreError::Storage(e),
            PersistError::Codec(e) => StoreError::Decode(e),
        }
    }
}

/// How the session's progress tree came to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Startup {
    /// Nothing was saved yet; a fresh tree was built.
    FirstRun,
    /// The saved tree was current and used as-is.
    Restored,
    /// The saved tree was older than the catalog and got migrated.
    Migrated(MigrationReport),
    /// The saved tree was unusable and replaced with a fresh one.
    Reset { reason: String },
}

/// Key the unreadable blob is copied to before [`ProgressStore::open_or_reset`]
/// overwrites it.
pub fn backup_key(key: &str) -> String {
    format!("{key}-corrupt")
}

pub struct ProgressStore<S: Storage> {
    catalog: Catalog,
    model: ProgressModel,
    storage: S,
    key: String,
    startup: Startup,
    game_index: usize,
    mode_index: usize,
}

fn check_trackable(catalog: &Catalog) -> Result<(), StoreError> {
    if catalog.games.is_empty() {
        return Err(StoreError::EmptyCatalog);
    }
    if let Some(game) = catalog.games.iter().find(|g| g.modes.is_empty()) {
        return Err(StoreError::GameWithoutModes(game.id.clone()));
    }
    Ok(())
}

fn load<S: Storage>(
    catalog: &Catalog,
    storage: &S,
    key: &str,
) -> Result<(ProgressModel, Startup), StoreError> {
    let Some(mut model) = read_snapshot(storage, key)? else {
        info!(version = catalog.version, "first run, building fresh progress");
        return Ok((ProgressModel::from_catalog(catalog), Startup::FirstRun));
    };

    let startup = match migrate(&mut model, catalog) {
        Some(report) => {
            info!(
                from = report.from_version,
                to = report.to_version,
                games = report.games_added,
                categories = report.categories_added,
                weapons = report.weapons_added,
                flags = report.flags_added,
                "migrated saved progress"
            );
            Startup::Migrated(report)
        }
        None => {
            if model.version > catalog.version {
                warn!(
                    saved = model.version,
                    catalog = catalog.version,
                    "saved progress is newer than the catalog"
                );
            }
            Startup::Restored
        }
    };

    if let Some(game) = model.missing_games(catalog).first() {
        return Err(StoreError::MissingGame(game.to_string()));
    }
    Ok((model, startup))
}

impl<S: Storage> ProgressStore<S> {
    /// Restore or create progress under the default key.
    ///
    /// Unreadable saves are returned as errors; see [`Self::open_or_reset`].
    pub fn open(catalog: Catalog, storage: S) -> Result<Self, StoreError> {
        Self::open_with_key(catalog, storage, SAVE_KEY)
    }

    pub fn open_with_key(catalog: Catalog, storage: S, key: &str) -> Result<Self, StoreError> {
        check_trackable(&catalog)?;
        let (model, startup) = load(&catalog, &storage, key)?;
        Ok(Self::assemble(catalog, model, storage, key, startup))
    }

    /// Like [`Self::open`], but an unreadable or inconsistent save is copied
    /// to [`backup_key`] and replaced by a fresh tree.
    pub fn open_or_reset(catalog: Catalog, storage: S) -> Result<Self, StoreError> {
        Self::open_or_reset_with_key(catalog, storage, SAVE_KEY)
    }

    pub fn open_or_reset_with_key(
        catalog: Catalog,
        mut storage: S,
        key: &str,
    ) -> Result<Self, StoreError> {
        check_trackable(&catalog)?;
        let (model, startup) = match load(&catalog, &storage, key) {
            Ok(loaded) => loaded,
            Err(e @ (StoreError::Decode(_) | StoreError::MissingGame(_))) => {
                warn!(error = %e, "discarding saved progress");
                if let Some(raw) = storage.get(key)? {
                    storage.set(&backup_key(key), &raw)?;
                }
                (
                    ProgressModel::from_catalog(&catalog),
                    Startup::Reset {
                        reason: e.to_string(),
                    },
                )
            }
            Err(e) => return Err(e),
        };
        Ok(Self::assemble(catalog, model, storage, key, startup))
    }

    fn assemble(
        catalog: Catalog,
        model: ProgressModel,
        storage: S,
        key: &str,
        startup: Startup,
    ) -> Self {
        let mut store = Self {
            catalog,
            model,
            storage,
            key: key.to_string(),
            startup,
            game_index: 0,
            mode_index: 0,
        };
        if store.startup != Startup::Restored {
            store.persist();
        }
        store
    }

    pub fn startup(&self) -> &Startup {
        &self.startup
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn model(&self) -> &ProgressModel {
        &self.model
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn selected_game(&self) -> &Game {
        &self.catalog.games[self.game_index]
    }

    pub fn selected_mode(&self) -> &Mode {
        &self.selected_game().modes[self.mode_index]
    }

    /// Select a game by position. Changing the game resets the mode to the
    /// game's first mode.
    pub fn select_game_index(&mut self, index: usize) -> Result<(), StoreError> {
        let len = self.catalog.games.len();
        if index >= len {
            return Err(StoreError::IndexOutOfRange { index, len });
        }
        if index != self.game_index {
            self.game_index = index;
            self.mode_index = 0;
            info!(game = %self.selected_game().id, "game selected");
        }
        Ok(())
    }

    pub fn select_mode_index(&mut self, index: usize) -> Result<(), StoreError> {
        let len = self.selected_game().modes.len();
        if index >= len {
            return Err(StoreError::IndexOutOfRange { index, len });
        }
        self.mode_index = index;
        Ok(())
    }

    pub fn select_game(&mut self, game_id: &str) -> Result<(), StoreError> {
        let index = self
            .catalog
            .games
            .iter()
            .position(|g| g.id == game_id)
            .ok_or_else(|| StoreError::UnknownGame(game_id.to_string()))?;
        self.select_game_index(index)
    }

    pub fn select_mode(&mut self, mode_id: &str) -> Result<(), StoreError> {
        let game = self.selected_game();
        let index = game
            .modes
            .iter()
            .position(|m| m.id == mode_id)
            .ok_or_else(|| StoreError::UnknownMode {
                game: game.id.clone(),
                mode: mode_id.to_string(),
            })?;
        self.select_mode_index(index)
    }

    /// Write the current tree to storage.
    pub fn save(&mut self) -> Result<(), StoreError> {
        write_snapshot(&mut self.storage, &self.key, &self.model)?;
        Ok(())
    }

    /// Fire-and-forget save after a mutation. A failed write leaves the
    /// in-memory tree intact; only durability is lost.
    fn persist(&mut self) {
        if let Err(e) = self.save() {
            warn!(error = %e, key = %self.key, "failed to persist progress");
        }
    }
}

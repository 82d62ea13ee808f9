#![deny(warnings)]

//! Core domain models and invariants for the camo tracker.
//!
//! This crate defines the read-only catalog of games, modes and weapons, the
//! persisted progress tree built from it, and the additive migration that
//! brings an older progress tree up to date with a newer catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

mod map;
mod migrate;

pub use map::{OrderedMap, LEGACY_MAP_KIND, MAP_KIND};
pub use migrate::{migrate, reconcile, MigrationReport};

/// A named completion target within a mode, e.g. "gold".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionCategory {
    pub id: String,
    /// Display colour as understood by the frontend (e.g. "#d4af37").
    pub display_color: String,
}

/// A game mode with its own independent set of completion categories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mode {
    pub id: String,
    pub completion_categories: Vec<CompletionCategory>,
}

/// A weapon category, e.g. "assault_rifles".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub weapon_names: Vec<String>,
}

/// A game with its supported modes and weapon categories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub modes: Vec<Mode>,
    pub weapon_categories: Vec<Category>,
}

impl Game {
    pub fn mode(&self, id: &str) -> Option<&Mode> {
        self.modes.iter().find(|m| m.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.weapon_categories.iter().find(|c| c.id == id)
    }
}

/// Versioned catalog of everything that can be tracked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Bumped whenever games, categories, weapons or modes change.
    pub version: u32,
    pub games: Vec<Game>,
}

impl Catalog {
    pub fn game(&self, id: &str) -> Option<&Game> {
        self.games.iter().find(|g| g.id == id)
    }
}

/// Validation errors for catalog invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// An id or weapon name is blank.
    #[error("{0} id must not be empty")]
    EmptyId(&'static str),
    /// Two siblings share the same id.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyId(kind));
        }
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate a single game: unique modes, categories, weapons and camos.
pub fn validate_game(game: &Game) -> Result<(), ValidationError> {
    check_unique("mode", game.modes.iter().map(|m| m.id.as_str()))?;
    for mode in &game.modes {
        check_unique(
            "completion category",
            mode.completion_categories.iter().map(|c| c.id.as_str()),
        )?;
    }
    check_unique(
        "weapon category",
        game.weapon_categories.iter().map(|c| c.id.as_str()),
    )?;
    for category in &game.weapon_categories {
        check_unique("weapon", category.weapon_names.iter().map(String::as_str))?;
    }
    Ok(())
}

/// Validate the whole catalog, including game id uniqueness.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), ValidationError> {
    check_unique("game", catalog.games.iter().map(|g| g.id.as_str()))?;
    for game in &catalog.games {
        validate_game(game)?;
    }
    Ok(())
}

/// Completion flags for one mode, keyed by completion category id.
pub type ModeProgress = OrderedMap<bool>;

/// Weapons of one game, keyed by weapon category id.
pub type GameProgress = OrderedMap<Vec<Weapon>>;

/// Progress of a single weapon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weapon {
    pub name: String,
    #[serde(alias = "maxLvl")]
    pub max_level_reached: bool,
    /// Per-mode flags, keyed by mode id.
    pub progress: OrderedMap<ModeProgress>,
}

impl Weapon {
    /// A weapon with every flag of every given mode cleared.
    pub fn new(name: impl Into<String>, modes: &[Mode]) -> Self {
        Self {
            name: name.into(),
            max_level_reached: false,
            progress: modes
                .iter()
                .map(|m| (m.id.clone(), fresh_mode_progress(m)))
                .collect(),
        }
    }

    pub fn mode(&self, mode_id: &str) -> Option<&ModeProgress> {
        self.progress.get(mode_id)
    }

    /// True iff max level is reached and every completion category the
    /// catalog currently declares for `mode` is set. Stored flags for camos
    /// no longer in the catalog are ignored; missing flags count as unset.
    pub fn is_complete_in(&self, mode: &Mode) -> bool {
        if !self.max_level_reached {
            return false;
        }
        let Some(flags) = self.progress.get(&mode.id) else {
            return false;
        };
        mode.completion_categories
            .iter()
            .all(|c| flags.get(&c.id).copied().unwrap_or(false))
    }
}

pub(crate) fn fresh_mode_progress(mode: &Mode) -> ModeProgress {
    mode.completion_categories
        .iter()
        .map(|c| (c.id.clone(), false))
        .collect()
}

pub(crate) fn fresh_category(category: &Category, modes: &[Mode]) -> Vec<Weapon> {
    category
        .weapon_names
        .iter()
        .map(|name| Weapon::new(name.clone(), modes))
        .collect()
}

pub(crate) fn fresh_game(game: &Game) -> GameProgress {
    game.weapon_categories
        .iter()
        .map(|c| (c.id.clone(), fresh_category(c, &game.modes)))
        .collect()
}

/// Persisted progress root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressModel {
    /// Catalog version this tree was last reconciled against.
    pub version: u32,
    /// Keyed by game id.
    pub progress: OrderedMap<GameProgress>,
}

impl ProgressModel {
    /// Fresh tree for `catalog` with every flag cleared.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            version: catalog.version,
            progress: catalog
                .games
                .iter()
                .map(|g| (g.id.clone(), fresh_game(g)))
                .collect(),
        }
    }

    pub fn game(&self, game_id: &str) -> Option<&GameProgress> {
        self.progress.get(game_id)
    }

    pub fn game_mut(&mut self, game_id: &str) -> Option<&mut GameProgress> {
        self.progress.get_mut(game_id)
    }

    /// Catalog games with no entry in this tree.
    pub fn missing_games<'a>(&self, catalog: &'a Catalog) -> Vec<&'a str> {
        catalog
            .games
            .iter()
            .filter(|g| !self.progress.contains_key(&g.id))
            .map(|g| g.id.as_str())
            .collect()
    }
}

/// Catalog fixtures and proptest strategies shared with downstream crates'
/// tests (enable the `testing` feature).
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::*;
    use proptest::prelude::*;

    pub fn camo(id: &str) -> CompletionCategory {
        CompletionCategory {
            id: id.to_string(),
            display_color: "#d4af37".to_string(),
        }
    }

    /// One game "G", mode "multiplayer" with camo "gold", "primary" = [Rifle].
    pub fn rifle_catalog(version: u32, weapons: &[&str]) -> Catalog {
        Catalog {
            version,
            games: vec![Game {
                id: "G".to_string(),
                modes: vec![Mode {
                    id: "multiplayer".to_string(),
                    completion_categories: vec![camo("gold")],
                }],
                weapon_categories: vec![Category {
                    id: "primary".to_string(),
                    weapon_names: weapons.iter().map(|w| w.to_string()).collect(),
                }],
            }],
        }
    }

    fn arb_ids(max: usize) -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set("[a-z]{1,6}", 1..=max).prop_map(|s| s.into_iter().collect())
    }

    fn arb_modes() -> impl Strategy<Value = Vec<Mode>> {
        arb_ids(3)
            .prop_flat_map(|ids| {
                let n = ids.len();
                (Just(ids), prop::collection::vec(arb_ids(4), n))
            })
            .prop_map(|(ids, camos)| {
                ids.into_iter()
                    .zip(camos)
                    .map(|(id, camos)| Mode {
                        id,
                        completion_categories: camos.iter().map(|c| camo(c)).collect(),
                    })
                    .collect()
            })
    }

    fn arb_categories() -> impl Strategy<Value = Vec<Category>> {
        arb_ids(3)
            .prop_flat_map(|ids| {
                let n = ids.len();
                (Just(ids), prop::collection::vec(arb_ids(5), n))
            })
            .prop_map(|(ids, weapons)| {
                ids.into_iter()
                    .zip(weapons)
                    .map(|(id, weapon_names)| Category { id, weapon_names })
                    .collect()
            })
    }

    pub fn arb_catalog() -> impl Strategy<Value = Catalog> {
        arb_ids(3)
            .prop_flat_map(|ids| {
                let n = ids.len();
                (
                    Just(ids),
                    prop::collection::vec((arb_modes(), arb_categories()), n),
                    1u32..5,
                )
            })
            .prop_map(|(ids, bodies, version)| Catalog {
                version,
                games: ids
                    .into_iter()
                    .zip(bodies)
                    .map(|(id, (modes, weapon_categories))| Game {
                        id,
                        modes,
                        weapon_categories,
                    })
                    .collect(),
            })
    }

    /// A progress tree built from one catalog, reconciled against a second
    /// one, with arbitrary flags set. Covers irregular shapes such as stale
    /// camos and games the later catalog no longer lists.
    pub fn arb_progress_model() -> impl Strategy<Value = ProgressModel> {
        (
            arb_catalog(),
            arb_catalog(),
            prop::collection::vec(any::<bool>(), 1..128),
        )
            .prop_map(|(first, later, bits)| {
                let mut model = ProgressModel::from_catalog(&first);
                reconcile(&mut model, &later);
                let mut bits = bits.into_iter().cycle();
                for game in model.progress.values_mut() {
                    for weapons in game.values_mut() {
                        for w in weapons.iter_mut() {
                            w.max_level_reached = bits.next().unwrap_or(false);
                            for flags in w.progress.values_mut() {
                                for done in flags.values_mut() {
                                    *done = bits.next().unwrap_or(false);
                                }
                            }
                        }
                    }
                }
                model
            })
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fresh_rifle_has_gold_cleared() {
        let model = ProgressModel::from_catalog(&rifle_catalog(1, &["Rifle"]));
        assert_eq!(model.version, 1);
        let rifle = &model.game("G").unwrap().get("primary").unwrap()[0];
        assert_eq!(rifle.name, "Rifle");
        assert!(!rifle.max_level_reached);
        assert_eq!(rifle.mode("multiplayer").unwrap().get("gold"), Some(&false));
    }

    #[test]
    fn weapon_completion_needs_max_level_and_all_flags() {
        let catalog = rifle_catalog(1, &["Rifle"]);
        let mp = &catalog.games[0].modes[0];
        let mut w = Weapon::new("Rifle", &catalog.games[0].modes);
        assert!(!w.is_complete_in(mp));
        w.progress
            .get_mut("multiplayer")
            .unwrap()
            .insert("gold", true);
        assert!(!w.is_complete_in(mp));
        w.max_level_reached = true;
        assert!(w.is_complete_in(mp));
        let zombies = Mode {
            id: "zombies".to_string(),
            completion_categories: vec![camo("gold")],
        };
        assert!(!w.is_complete_in(&zombies));
    }

    #[test]
    fn completion_ignores_camos_dropped_from_catalog() {
        let mut w = Weapon::new(
            "Rifle",
            &[Mode {
                id: "multiplayer".to_string(),
                completion_categories: vec![camo("gold"), camo("legacy")],
            }],
        );
        w.max_level_reached = true;
        w.progress
            .get_mut("multiplayer")
            .unwrap()
            .insert("gold", true);
        let current = rifle_catalog(2, &["Rifle"]);
        assert!(w.is_complete_in(&current.games[0].modes[0]));

        let mut grown = current.games[0].modes[0].clone();
        grown.completion_categories.push(camo("diamond"));
        assert!(!w.is_complete_in(&grown));
    }

    #[test]
    fn validation_rejects_duplicates() {
        let mut catalog = rifle_catalog(1, &["Rifle", "Rifle"]);
        assert_eq!(
            validate_catalog(&catalog),
            Err(ValidationError::DuplicateId {
                kind: "weapon",
                id: "Rifle".to_string()
            })
        );
        catalog.games[0].weapon_categories[0].weapon_names = vec!["Rifle".into()];
        validate_catalog(&catalog).unwrap();
        catalog.games.push(catalog.games[0].clone());
        assert!(matches!(
            validate_catalog(&catalog),
            Err(ValidationError::DuplicateId { kind: "game", .. })
        ));
    }

    #[test]
    fn validation_rejects_blank_ids() {
        let mut catalog = rifle_catalog(1, &["Rifle"]);
        catalog.games[0].modes[0].id = "  ".into();
        assert_eq!(
            validate_catalog(&catalog),
            Err(ValidationError::EmptyId("mode"))
        );
    }

    #[test]
    fn catalog_reads_camel_case_document() {
        let text = r##"{
            "version": 3,
            "games": [{
                "id": "G",
                "modes": [{
                    "id": "mp",
                    "completionCategories": [{ "id": "gold", "displayColor": "#fc0" }]
                }],
                "weaponCategories": [{ "id": "primary", "weaponNames": ["Rifle"] }]
            }]
        }"##;
        let catalog: Catalog = serde_json::from_str(text).unwrap();
        assert_eq!(catalog.version, 3);
        assert_eq!(
            catalog.games[0].mode("mp").unwrap().completion_categories[0].display_color,
            "#fc0"
        );
        assert!(catalog.games[0].category("primary").is_some());
    }

    proptest! {
        #[test]
        fn construct_covers_catalog_exactly(catalog in arb_catalog()) {
            validate_catalog(&catalog).unwrap();
            let model = ProgressModel::from_catalog(&catalog);
            let games: Vec<&str> = model.progress.keys().collect();
            let expected: Vec<&str> = catalog.games.iter().map(|g| g.id.as_str()).collect();
            prop_assert_eq!(games, expected);
            for game in &catalog.games {
                let progress = model.game(&game.id).unwrap();
                let cats: Vec<&str> = progress.keys().collect();
                let expected: Vec<&str> =
                    game.weapon_categories.iter().map(|c| c.id.as_str()).collect();
                prop_assert_eq!(cats, expected);
                for category in &game.weapon_categories {
                    let weapons = progress.get(&category.id).unwrap();
                    let names: Vec<&String> = weapons.iter().map(|w| &w.name).collect();
                    prop_assert_eq!(names, category.weapon_names.iter().collect::<Vec<_>>());
                    for w in weapons {
                        prop_assert!(!w.max_level_reached);
                        prop_assert_eq!(w.progress.len(), game.modes.len());
                        for mode in &game.modes {
                            let flags = w.mode(&mode.id).unwrap();
                            prop_assert_eq!(flags.len(), mode.completion_categories.len());
                            prop_assert!(flags.values().all(|f| !*f));
                        }
                    }
                }
            }
        }
    }
}

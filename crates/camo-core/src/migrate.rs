//! Additive migration of a stored progress tree against a newer catalog.
//!
//! Nothing is ever removed: games, categories, weapons, modes and camos that
//! disappeared from the catalog stay in the tree untouched.

use crate::{fresh_category, fresh_game, fresh_mode_progress, Catalog, ProgressModel, Weapon};
use tracing::debug;

/// What a reconciliation pass appended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub games_added: usize,
    pub categories_added: usize,
    pub weapons_added: usize,
    /// Mode or completion-category entries added to existing weapons.
    pub flags_added: usize,
}

impl MigrationReport {
    /// True when the pass changed nothing but possibly the version.
    pub fn is_structurally_empty(&self) -> bool {
        self.games_added == 0
            && self.categories_added == 0
            && self.weapons_added == 0
            && self.flags_added == 0
    }
}

/// Migrate `model` if it was built against an older catalog version.
///
/// Returns `None` when the model is already current (or newer).
pub fn migrate(model: &mut ProgressModel, catalog: &Catalog) -> Option<MigrationReport> {
    if model.version >= catalog.version {
        return None;
    }
    Some(reconcile(model, catalog))
}

/// Append everything `catalog` declares that `model` lacks, then stamp the
/// model with the catalog version. Idempotent.
pub fn reconcile(model: &mut ProgressModel, catalog: &Catalog) -> MigrationReport {
    let mut report = MigrationReport {
        from_version: model.version,
        to_version: model.version.max(catalog.version),
        ..MigrationReport::default()
    };

    for game in &catalog.games {
        let Some(stored) = model.progress.get_mut(&game.id) else {
            debug!(game = %game.id, "adding game");
            model.progress.insert(game.id.clone(), fresh_game(game));
            report.games_added += 1;
            continue;
        };

        for category in &game.weapon_categories {
            let Some(weapons) = stored.get_mut(&category.id) else {
                debug!(game = %game.id, category = %category.id, "adding category");
                stored.insert(category.id.clone(), fresh_category(category, &game.modes));
                report.categories_added += 1;
                continue;
            };

            for weapon in weapons.iter_mut() {
                for mode in &game.modes {
                    let flags = weapon.progress.get_or_insert_with(&mode.id, || {
                        report.flags_added += 1;
                        fresh_mode_progress(mode)
                    });
                    for camo in &mode.completion_categories {
                        if !flags.contains_key(&camo.id) {
                            flags.insert(camo.id.clone(), false);
                            report.flags_added += 1;
                        }
                    }
                }
            }

            for name in &category.weapon_names {
                if !weapons.iter().any(|w| &w.name == name) {
                    debug!(
                        game = %game.id,
                        category = %category.id,
                        weapon = %name,
                        "adding weapon"
                    );
                    weapons.push(Weapon::new(name.clone(), &game.modes));
                    report.weapons_added += 1;
                }
            }
        }
    }

    model.version = report.to_version;
    report
}

//! Read-only views over the selected game and mode, plus the toggles.

use crate::{ProgressStore, StoreError};
use camo_core::{CompletionCategory, GameProgress, Weapon};
use persistence::Storage;
use tracing::debug;

/// Which weapons a count covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Every weapon of the selected game.
    All,
    /// Weapons of one category of the selected game.
    Category(&'a str),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Count {
    pub total: usize,
    pub completed: usize,
}

impl Count {
    fn tally<'w>(
        weapons: impl IntoIterator<Item = &'w Weapon>,
        done: impl Fn(&Weapon) -> bool,
    ) -> Self {
        let mut count = Count::default();
        for w in weapons {
            count.total += 1;
            if done(w) {
                count.completed += 1;
            }
        }
        count
    }

    /// Completion ratio in percent; 0 for an empty scope.
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f32 * 100.0 / self.total as f32
    }
}

impl<S: Storage> ProgressStore<S> {
    fn game_progress(&self) -> Result<&GameProgress, StoreError> {
        let game_id = &self.selected_game().id;
        self.model
            .game(game_id)
            .ok_or_else(|| StoreError::MissingGame(game_id.clone()))
    }

    /// Completion categories of the selected mode, in catalog order.
    pub fn completion_categories(&self) -> &[CompletionCategory] {
        &self.selected_mode().completion_categories
    }

    /// Category ids of the selected game, in stored order.
    pub fn category_ids(&self) -> Result<Vec<&str>, StoreError> {
        Ok(self.game_progress()?.keys().collect())
    }

    pub fn weapons_of_category(&self, category_id: &str) -> Result<&[Weapon], StoreError> {
        self.game_progress()?
            .get(category_id)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::CategoryNotFound {
                game: self.selected_game().id.clone(),
                category: category_id.to_string(),
            })
    }

    /// Every weapon of the selected game, category by category.
    pub fn all_weapons(&self) -> Result<Vec<&Weapon>, StoreError> {
        Ok(self.game_progress()?.values().flatten().collect())
    }

    fn scoped(&self, scope: Scope<'_>) -> Result<Vec<&Weapon>, StoreError> {
        match scope {
            Scope::All => self.all_weapons(),
            Scope::Category(id) => Ok(self.weapons_of_category(id)?.iter().collect()),
        }
    }

    pub fn weapon(&self, category_id: &str, weapon_name: &str) -> Result<&Weapon, StoreError> {
        self.weapons_of_category(category_id)?
            .iter()
            .find(|w| w.name == weapon_name)
            .ok_or_else(|| StoreError::WeaponNotFound {
                category: category_id.to_string(),
                weapon: weapon_name.to_string(),
            })
    }

    fn check_completion(&self, completion_id: &str) -> Result<(), StoreError> {
        if self
            .completion_categories()
            .iter()
            .any(|c| c.id == completion_id)
        {
            Ok(())
        } else {
            Err(StoreError::CompletionCategoryNotFound {
                mode: self.selected_mode().id.clone(),
                completion: completion_id.to_string(),
            })
        }
    }

    /// Weapons in `scope` with `completion_id` done under the selected mode.
    pub fn completion_count(
        &self,
        scope: Scope<'_>,
        completion_id: &str,
    ) -> Result<Count, StoreError> {
        self.check_completion(completion_id)?;
        let mode_id = &self.selected_mode().id;
        Ok(Count::tally(self.scoped(scope)?, |w| {
            w.mode(mode_id)
                .and_then(|flags| flags.get(completion_id))
                .copied()
                .unwrap_or(false)
        }))
    }

    pub fn max_level_count(&self, scope: Scope<'_>) -> Result<Count, StoreError> {
        Ok(Count::tally(self.scoped(scope)?, |w| w.max_level_reached))
    }

    /// Max level reached and every completion category of the selected mode
    /// set. Flags left over from camos the catalog dropped do not count.
    pub fn weapon_fully_completed(&self, weapon: &Weapon) -> bool {
        weapon.is_complete_in(self.selected_mode())
    }

    pub fn weapon_fully_completed_by_name(
        &self,
        category_id: &str,
        weapon_name: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.weapon_fully_completed(self.weapon(category_id, weapon_name)?))
    }

    pub fn fully_completed_count(&self, scope: Scope<'_>) -> Result<Count, StoreError> {
        Ok(Count::tally(self.scoped(scope)?, |w| self.weapon_fully_completed(w)))
    }

    pub fn total_fully_completed_count(&self) -> Result<Count, StoreError> {
        self.fully_completed_count(Scope::All)
    }

    /// Display colour of a completion category of the selected mode.
    pub fn completion_color(&self, completion_id: &str) -> Result<&str, StoreError> {
        self.completion_categories()
            .iter()
            .find(|c| c.id == completion_id)
            .map(|c| c.display_color.as_str())
            .ok_or_else(|| StoreError::CompletionCategoryNotFound {
                mode: self.selected_mode().id.clone(),
                completion: completion_id.to_string(),
            })
    }

    fn weapon_mut(
        &mut self,
        category_id: &str,
        weapon_name: &str,
    ) -> Result<&mut Weapon, StoreError> {
        let game_id = self.catalog.games[self.game_index].id.as_str();
        let weapons = self
            .model
            .game_mut(game_id)
            .ok_or_else(|| StoreError::MissingGame(game_id.to_string()))?
            .get_mut(category_id)
            .ok_or_else(|| StoreError::CategoryNotFound {
                game: game_id.to_string(),
                category: category_id.to_string(),
            })?;
        weapons
            .iter_mut()
            .find(|w| w.name == weapon_name)
            .ok_or_else(|| StoreError::WeaponNotFound {
                category: category_id.to_string(),
                weapon: weapon_name.to_string(),
            })
    }

    /// Flip one completion flag under the selected mode and save.
    /// Returns the new value.
    pub fn toggle_completion_flag(
        &mut self,
        category_id: &str,
        weapon_name: &str,
        completion_id: &str,
    ) -> Result<bool, StoreError> {
        self.check_completion(completion_id)?;
        let mode_id = self.selected_mode().id.clone();
        let weapon = self.weapon_mut(category_id, weapon_name)?;
        let flag = weapon
            .progress
            .get_mut(&mode_id)
            .ok_or_else(|| StoreError::ModeNotTracked {
                weapon: weapon_name.to_string(),
                mode: mode_id.clone(),
            })?
            .get_mut(completion_id)
            .ok_or_else(|| StoreError::CompletionCategoryNotFound {
                mode: mode_id.clone(),
                completion: completion_id.to_string(),
            })?;
        *flag = !*flag;
        let value = *flag;
        debug!(
            category = category_id,
            weapon = weapon_name,
            mode = %mode_id,
            completion = completion_id,
            value,
            "completion toggled"
        );
        self.persist();
        Ok(value)
    }

    /// Flip the max-level flag and save. Returns the new value.
    pub fn toggle_max_level(
        &mut self,
        category_id: &str,
        weapon_name: &str,
    ) -> Result<bool, StoreError> {
        let weapon = self.weapon_mut(category_id, weapon_name)?;
        weapon.max_level_reached = !weapon.max_level_reached;
        let value = weapon.max_level_reached;
        debug!(category = category_id, weapon = weapon_name, value, "max level toggled");
        self.persist();
        Ok(value)
    }
}

//! JSON configuration documents and the swappable configuration handle.
//!
//! Every option in a document is parsed on its own. An option that fails to
//! parse keeps its previous value and produces a warning, so one typo never
//! throws away a whole configuration. A document that is unreadable or not a
//! JSON object is an error and the caller keeps what it had.

use super::TreasureConfig;
use crate::{TroveError, TroveResult};
use log::{info, warn};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Result of merging a document over a previous configuration.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    /// The merged and normalized configuration
    pub config: TreasureConfig,
    /// One line per option that was ignored or kept at its previous value
    pub warnings: Vec<String>,
}

macro_rules! merge_options {
    ($document:expr, $config:expr, $warnings:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $document.remove(stringify!($field)) {
                match serde_json::from_value(value) {
                    Ok(parsed) => $config.$field = parsed,
                    Err(e) => {
                        warn!(
                            "Could not parse option {}: {}, keeping {:?}",
                            stringify!($field),
                            e,
                            $config.$field
                        );
                        $warnings.push(format!("{}: {}", stringify!($field), e));
                    }
                }
            }
        )*
    };
}

/// Merges a JSON document over `previous`.
///
/// # Examples
///
/// ```
/// use trove::{load_from_str, TreasureConfig};
///
/// let load = load_from_str(r#"{"base_money": 500, "lock_chance": "often"}"#, &TreasureConfig::new()).unwrap();
/// assert_eq!(load.config.base_money, 500);
/// assert_eq!(load.config.lock_chance, 100.0);
/// assert_eq!(load.warnings.len(), 1);
/// ```
pub fn load_from_str(text: &str, previous: &TreasureConfig) -> TroveResult<ConfigLoad> {
    let document: Value = serde_json::from_str(text)?;
    let Value::Object(mut document) = document else {
        return Err(TroveError::InvalidConfig(
            "configuration document must be a JSON object".to_string(),
        ));
    };

    let mut config = previous.clone();
    let mut warnings = Vec::new();
    merge_document(&mut document, &mut config, &mut warnings);

    for key in document.keys() {
        warn!("Ignoring unknown option {}", key);
        warnings.push(format!("{}: unknown option", key));
    }

    Ok(ConfigLoad {
        config: config.normalized(),
        warnings,
    })
}

/// Reads and merges a JSON configuration file over `previous`.
pub fn load_from_path(path: impl AsRef<Path>, previous: &TreasureConfig) -> TroveResult<ConfigLoad> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let load = load_from_str(&text, previous)?;
    info!(
        "Loaded configuration from {} with {} warnings",
        path.display(),
        load.warnings.len()
    );
    Ok(load)
}

fn merge_document(document: &mut Map<String, Value>, config: &mut TreasureConfig, warnings: &mut Vec<String>) {
    merge_options!(document, config, warnings, [
        marker_template,
        creation_tries,
        border_padding_divisor,
        min_treasure_distance,
        max_treasure_distance,
        max_height_diff,
        base_difficulty,
        min_difficulty,
        digging_chance,
        mining_chance,
        surface_mining_chance,
        fishing_chance,
        hunting_chance,
        unique_chance,
        champion_bonus_chance,
        map_drops,
        wear_markers,
        wear_multiplier,
        rare_window,
        fantastic_odds,
        supreme_odds,
        rare_odds,
        chest_template,
        lock_template,
        lock_chance,
        lock_multiplier,
        base_money,
        money_multiplier,
        base_karma,
        karma_multiplier,
        karma_container_template,
        karma_liquid_template,
        base_metal_weight,
        metal_multiplier,
        discount_multiplier,
        metals,
        discounted_metals,
        base_sleep_powder,
        sleep_powder_multiplier,
        sleep_powder_template,
        statue_chance,
        statue_multiplier,
        statue_template,
        statue_variants,
        rare_chance,
        rare_multiplier,
        rare_items,
        unfinished_rares,
        very_rare_chance,
        very_rare_multiplier,
        very_rares,
        extremely_rare_chance,
        extremely_rare_multiplier,
        extremely_rares,
        unfinished_chance,
        unfinished_multiplier,
        unfinished_items,
        kingdom_items,
        unfinished_kingdoms,
        unfinished_template,
        unfinished_weight,
        kingdom_affiliated_rares,
        min_rare_templates,
        tier_rewards,
        reward_groups,
        spawn_groups,
        tier_spawns,
        wood_materials,
    ]);
}

/// Shared, atomically replaceable configuration.
///
/// Readers take one [`Arc`] snapshot per operation and never observe a
/// half-applied reload.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<TreasureConfig>>>,
}

impl ConfigHandle {
    /// Wraps a configuration, clamping out-of-range options first.
    pub fn new(config: TreasureConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config.normalized()))),
        }
    }

    /// The configuration in effect right now.
    pub fn snapshot(&self) -> Arc<TreasureConfig> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swaps in a new configuration, clamped like a loaded one.
    pub fn replace(&self, config: TreasureConfig) {
        let config = Arc::new(config.normalized());
        match self.current.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    /// Reloads from a file, merging over the current snapshot.
    ///
    /// On error the current configuration stays in effect.
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> TroveResult<Vec<String>> {
        let previous = self.snapshot();
        match load_from_path(path, &previous) {
            Ok(load) => {
                self.replace(load.config);
                Ok(load.warnings)
            }
            Err(e) => {
                warn!("Configuration reload failed, keeping current options: {}", e);
                Err(e)
            }
        }
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(TreasureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_other_options() {
        let previous = TreasureConfig::new();
        let load = load_from_str(r#"{"rare_window": 50, "metals": [44]}"#, &previous).unwrap();
        assert_eq!(load.config.rare_window, 50);
        assert_eq!(load.config.metals, vec![44]);
        assert_eq!(load.config.base_money, previous.base_money);
        assert!(load.warnings.is_empty());
    }

    #[test]
    fn test_bad_option_keeps_previous_value() {
        let previous = TreasureConfig {
            mining_chance: 77,
            ..TreasureConfig::new()
        };
        let load = load_from_str(r#"{"mining_chance": "lots", "digging_chance": 5}"#, &previous).unwrap();
        assert_eq!(load.config.mining_chance, 77);
        assert_eq!(load.config.digging_chance, 5);
        assert_eq!(load.warnings.len(), 1);
        assert!(load.warnings[0].starts_with("mining_chance"));
    }

    #[test]
    fn test_handle_clamps_direct_configs() {
        let handle = ConfigHandle::new(TreasureConfig {
            creation_tries: 0,
            lock_chance: 400.0,
            ..TreasureConfig::new()
        });
        assert_eq!(handle.snapshot().creation_tries, 1);
        assert_eq!(handle.snapshot().lock_chance, 100.0);

        handle.replace(TreasureConfig {
            min_treasure_distance: 90,
            max_treasure_distance: 10,
            border_padding_divisor: 1,
            ..TreasureConfig::new()
        });
        let current = handle.snapshot();
        assert_eq!(current.min_treasure_distance, 10);
        assert_eq!(current.max_treasure_distance, 90);
        assert_eq!(current.border_padding_divisor, 3);
    }

    #[test]
    fn test_unknown_option_is_reported() {
        let load = load_from_str(r#"{"dragon_mode": true}"#, &TreasureConfig::new()).unwrap();
        assert_eq!(load.warnings, vec!["dragon_mode: unknown option".to_string()]);
    }

    #[test]
    fn test_loaded_values_are_normalized() {
        let load = load_from_str(r#"{"base_difficulty": 1.0, "creation_tries": 50000}"#, &TreasureConfig::new()).unwrap();
        assert_eq!(load.config.base_difficulty, 4.0);
        assert_eq!(load.config.creation_tries, 1000);
    }

    #[test]
    fn test_non_object_document_is_an_error() {
        assert!(matches!(
            load_from_str("[1, 2, 3]", &TreasureConfig::new()),
            Err(TroveError::InvalidConfig(_))
        ));
        assert!(matches!(
            load_from_str("{ not json", &TreasureConfig::new()),
            Err(TroveError::Serde(_))
        ));
    }

    #[test]
    fn test_handle_snapshots_are_stable() {
        let handle = ConfigHandle::default();
        let before = handle.snapshot();
        handle.replace(TreasureConfig {
            base_money: 1,
            ..TreasureConfig::new()
        });
        assert_eq!(before.base_money, 10000);
        assert_eq!(handle.snapshot().base_money, 1);
    }
}

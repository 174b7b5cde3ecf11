//! Marker quality, damage and rarity.

use crate::constants::{MAX_MARKER_QUALITY, MIN_QUALITY};
use crate::utils::one_in;
use crate::{Rarity, SkillCheck, SkillId, TreasureConfig};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Skill ids the engine knows by number.
pub mod skills {
    use crate::SkillId;

    pub const MINING: SkillId = 1008;
    pub const DIGGING: SkillId = 1009;
    pub const FIGHTING: SkillId = 1023;
    pub const PICKAXE: SkillId = 10009;
    pub const FISHING: SkillId = 10033;
}

/// The tool used for the triggering action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub quality: f64,
    pub rarity: Rarity,
}

/// What a marker's quality is judged on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EvaluationContext {
    /// A skill use, such as digging or fishing
    Activity {
        skill: SkillId,
        knowledge: f64,
        tool: Option<ToolInfo>,
        /// Rarity the host already rolled for the actor
        actor_rarity: Option<Rarity>,
    },
    /// A creature kill
    Death {
        /// Fighting knowledge of every player-controlled attacker
        attacker_knowledge: Vec<f64>,
        unique_victim: bool,
    },
    /// Staff-made markers, no skill involved
    Unskilled,
}

/// Skill id and knowledge packed into one integer: id in the high 16 bits,
/// knowledge × 100 in the low 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillNote(pub u32);

impl SkillNote {
    /// # Examples
    ///
    /// ```
    /// use trove::SkillNote;
    ///
    /// let note = SkillNote::encode(1009, 45.5);
    /// assert_eq!(note.skill(), 1009);
    /// assert_eq!(note.knowledge(), 45.5);
    /// ```
    pub fn encode(skill: SkillId, knowledge: f64) -> Self {
        let knowledge = (knowledge * 100.0).round().clamp(0.0, u16::MAX as f64) as u32;
        Self((skill as u32) << 16 | knowledge)
    }

    pub fn skill(self) -> SkillId {
        (self.0 >> 16) as SkillId
    }

    pub fn knowledge(self) -> f64 {
        (self.0 & 0xFFFF) as f64 / 100.0
    }
}

/// Outcome of a quality evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// In [1, 99]
    pub quality: f64,
    /// Half of a failed skill check's shortfall, never negative
    pub damage: f64,
    pub rarity: Rarity,
    pub skill_note: Option<SkillNote>,
}

/// Rarity window model: a rare window opens `1 in window` times; inside it
/// nested draws go from fantastic down to rare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RarityRoller {
    pub window: i32,
    pub fantastic: i32,
    pub supreme: i32,
    pub rare: i32,
}

impl RarityRoller {
    pub fn new(config: &TreasureConfig) -> Self {
        Self {
            window: config.rare_window,
            fantastic: config.fantastic_odds,
            supreme: config.supreme_odds,
            rare: config.rare_odds,
        }
    }

    /// Rolls a rarity, never below `guaranteed`.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R, guaranteed: Rarity) -> Rarity {
        let drawn = if one_in(rng, self.window) {
            if one_in(rng, self.fantastic) {
                Rarity::Fantastic
            } else if one_in(rng, self.supreme) {
                Rarity::Supreme
            } else if one_in(rng, self.rare) {
                Rarity::Rare
            } else {
                Rarity::None
            }
        } else {
            Rarity::None
        };
        drawn.max(guaranteed)
    }

    /// Like [`roll`](Self::roll) with a numeric minimum; values outside 0..=3
    /// are pulled into range with a warning.
    pub fn roll_level<R: Rng + ?Sized>(&self, rng: &mut R, guaranteed: i32) -> Rarity {
        let level = guaranteed.clamp(0, 3);
        if level != guaranteed {
            warn!("Guaranteed rarity {} is out of range, using {}", guaranteed, level);
        }
        self.roll(rng, Rarity::from_level(level as u8))
    }
}

/// Turns a trigger into marker quality, damage and rarity.
#[derive(Debug, Clone, Copy)]
pub struct QualityEvaluator {
    base_difficulty: f64,
    min_difficulty: f64,
    rarity: RarityRoller,
}

impl QualityEvaluator {
    pub fn new(config: &TreasureConfig) -> Self {
        Self {
            base_difficulty: config.base_difficulty,
            min_difficulty: config.min_difficulty,
            rarity: RarityRoller::new(config),
        }
    }

    /// Skill check difficulty for an activity.
    ///
    /// Knowledge and tool quality each shave a tenth off, tool rarity five
    /// points per level.
    pub fn activity_difficulty(&self, knowledge: f64, tool: Option<ToolInfo>) -> f64 {
        let mut difficulty = self.base_difficulty - knowledge / 10.0;
        if let Some(tool) = tool {
            difficulty -= tool.quality / 10.0 + tool.rarity.level() as f64 * 5.0;
        }
        difficulty.max(self.min_difficulty)
    }

    /// Skill check difficulty for a kill.
    ///
    /// The reducible part of the base difficulty is scaled by the attackers'
    /// average fighting knowledge, which then shaves off a tenth like any
    /// other skill.
    pub fn death_difficulty(&self, average_knowledge: f64) -> f64 {
        let scaled = (self.base_difficulty - self.min_difficulty) * average_knowledge / 100.0;
        (scaled - average_knowledge / 10.0).max(self.min_difficulty)
    }

    pub fn evaluate<S, R>(&self, skill: &mut S, context: &EvaluationContext, rng: &mut R) -> Evaluation
    where
        S: SkillCheck + ?Sized,
        R: Rng + ?Sized,
    {
        let (result, rarity, skill_note) = match context {
            EvaluationContext::Activity {
                skill: skill_id,
                knowledge,
                tool,
                actor_rarity,
            } => {
                let difficulty = self.activity_difficulty(*knowledge, *tool);
                let result = skill.skill_check(difficulty, *knowledge);
                debug!(
                    "Skill {} at {:.2} against difficulty {:.2} gave {:.2}",
                    skill_id, knowledge, difficulty, result
                );
                let rarity = match actor_rarity {
                    Some(rarity) => *rarity,
                    None => self.rarity.roll(rng, Rarity::None),
                };
                (result, rarity, Some(SkillNote::encode(*skill_id, *knowledge)))
            }
            EvaluationContext::Death {
                attacker_knowledge,
                unique_victim,
            } => {
                let rarity = self.rarity.roll(rng, Rarity::None);
                if attacker_knowledge.is_empty() {
                    let low = if *unique_victim { 90.0 } else { 0.0 };
                    (rng.gen_range(low..=100.0), rarity, None)
                } else {
                    let average =
                        attacker_knowledge.iter().sum::<f64>() / attacker_knowledge.len() as f64;
                    let difficulty = self.death_difficulty(average);
                    let result = skill.skill_check(difficulty, average);
                    debug!(
                        "{} attackers averaging {:.2} against difficulty {:.2} gave {:.2}",
                        attacker_knowledge.len(),
                        average,
                        difficulty,
                        result
                    );
                    (result, rarity, Some(SkillNote::encode(skills::FIGHTING, average)))
                }
            }
            EvaluationContext::Unskilled => (
                rng.gen_range(0.0..=100.0),
                self.rarity.roll(rng, Rarity::None),
                None,
            ),
        };

        let (quality, damage) = quality_and_damage(result);
        Evaluation {
            quality,
            damage,
            rarity,
            skill_note,
        }
    }
}

/// Splits a skill result into stored quality and damage.
///
/// # Examples
///
/// ```
/// use trove::quality_and_damage;
///
/// assert_eq!(quality_and_damage(55.0), (55.0, 0.0));
/// assert_eq!(quality_and_damage(-30.0), (1.0, 15.0));
/// assert_eq!(quality_and_damage(140.0), (99.0, 0.0));
/// ```
pub fn quality_and_damage(result: f64) -> (f64, f64) {
    if result.is_nan() {
        return (MIN_QUALITY, 0.0);
    }
    if result < MIN_QUALITY {
        (MIN_QUALITY, (-result / 2.0).max(0.0))
    } else {
        (result.min(MAX_MARKER_QUALITY), 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::create_rng;
    use crate::GridWorld;

    fn evaluator() -> QualityEvaluator {
        QualityEvaluator::new(&TreasureConfig::new())
    }

    #[test]
    fn test_activity_difficulty_reductions() {
        let evaluator = evaluator();
        assert_eq!(evaluator.activity_difficulty(0.0, None), 30.0);
        assert_eq!(evaluator.activity_difficulty(50.0, None), 25.0);
        let tool = ToolInfo {
            quality: 40.0,
            rarity: Rarity::Rare,
        };
        assert_eq!(evaluator.activity_difficulty(50.0, Some(tool)), 16.0);
        assert_eq!(evaluator.activity_difficulty(100.0, Some(tool)), 11.0);
        assert_eq!(evaluator.activity_difficulty(200.0, Some(tool)), 4.0);
    }

    #[test]
    fn test_death_difficulty_scales_with_attackers() {
        let evaluator = evaluator();
        // (30 - 4) * 0.5 = 13, less a tenth of the knowledge.
        assert_eq!(evaluator.death_difficulty(50.0), 8.0);
        assert_eq!(evaluator.death_difficulty(100.0), 16.0);
        assert_eq!(evaluator.death_difficulty(0.0), 4.0);
        assert_eq!(evaluator.death_difficulty(20.0), 4.0);
    }

    #[test]
    fn test_failed_check_becomes_damage() {
        let mut world = GridWorld::flat(8, 0, 1);
        world.set_fixed_skill(Some(-40.0));
        let mut rng = create_rng(3);
        let context = EvaluationContext::Activity {
            skill: skills::DIGGING,
            knowledge: 20.0,
            tool: None,
            actor_rarity: Some(Rarity::None),
        };
        let evaluation = evaluator().evaluate(&mut world, &context, &mut rng);
        assert_eq!(evaluation.quality, 1.0);
        assert_eq!(evaluation.damage, 20.0);
        assert_eq!(evaluation.skill_note, Some(SkillNote::encode(skills::DIGGING, 20.0)));
    }

    #[test]
    fn test_actor_rarity_wins() {
        let mut world = GridWorld::flat(8, 0, 1);
        world.set_fixed_skill(Some(70.0));
        let mut rng = create_rng(3);
        let context = EvaluationContext::Activity {
            skill: skills::FISHING,
            knowledge: 60.0,
            tool: None,
            actor_rarity: Some(Rarity::Supreme),
        };
        let evaluation = evaluator().evaluate(&mut world, &context, &mut rng);
        assert_eq!(evaluation.rarity, Rarity::Supreme);
        assert_eq!(evaluation.quality, 70.0);
    }

    #[test]
    fn test_unique_kill_without_players_is_high_quality() {
        let mut world = GridWorld::flat(8, 0, 1);
        let mut rng = create_rng(9);
        let context = EvaluationContext::Death {
            attacker_knowledge: Vec::new(),
            unique_victim: true,
        };
        for _ in 0..200 {
            let evaluation = evaluator().evaluate(&mut world, &context, &mut rng);
            assert!((90.0..=99.0).contains(&evaluation.quality));
            assert_eq!(evaluation.skill_note, None);
        }
    }

    #[test]
    fn test_guaranteed_rarity_is_a_floor() {
        let roller = RarityRoller::new(&TreasureConfig::new());
        let mut rng = create_rng(1);
        for level in 0..=3u8 {
            for _ in 0..100 {
                assert!(roller.roll(&mut rng, Rarity::from_level(level)).level() >= level);
            }
        }
        assert_eq!(roller.roll_level(&mut rng, 12), Rarity::Fantastic);
        assert!(roller.roll_level(&mut rng, -4) >= Rarity::None);
    }

    #[test]
    fn test_always_open_window_reaches_rare() {
        let roller = RarityRoller {
            window: 1,
            fantastic: 0,
            supreme: 0,
            rare: 1,
        };
        let mut rng = create_rng(1);
        assert_eq!(roller.roll(&mut rng, Rarity::None), Rarity::Rare);
    }
}

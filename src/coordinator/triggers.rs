//! World events that may produce a treasure marker.

use super::TreasureMarker;
use crate::quality::skills;
use crate::utils::one_in;
use crate::{
    CreatureKind, EvaluationContext, ItemHandle, Position, Rarity, SkillId, ToolInfo,
    TreasureConfig,
};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Activities that can turn up a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activity {
    Digging,
    Mining,
    SurfaceMining,
    Fishing,
}

impl Activity {
    /// Skill the marker's quality is checked against. Surface mining is
    /// judged as mining.
    pub fn skill(self) -> SkillId {
        match self {
            Activity::Digging => skills::DIGGING,
            Activity::Mining | Activity::SurfaceMining => skills::MINING,
            Activity::Fishing => skills::FISHING,
        }
    }

    /// "1 in N" marker chance for this activity.
    pub fn chance(self, config: &TreasureConfig) -> i32 {
        match self {
            Activity::Digging => config.digging_chance,
            Activity::Mining => config.mining_chance,
            Activity::SurfaceMining => config.surface_mining_chance,
            Activity::Fishing => config.fishing_chance,
        }
    }
}

/// Where a marker came from. Metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerOrigin {
    Activity(Activity),
    Death(CreatureKind),
    Staff,
}

/// A player performing an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub actor_position: Position,
    /// The actor's knowledge in the activity's skill
    pub knowledge: f64,
    pub tool: Option<ToolInfo>,
    /// Rarity the host rolled for this action, if it rolls its own
    pub actor_rarity: Option<Rarity>,
    /// Inventory the marker goes to
    pub inventory: Option<ItemHandle>,
}

/// Who controls an attacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Controller {
    Player,
    /// A creature dominated by a player
    DominatedByPlayer,
    Wild,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attacker {
    pub controller: Controller,
    /// Fighting knowledge; only players' counts towards marker quality
    pub fighting_knowledge: f64,
}

/// A creature dying with attackers around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathEvent {
    pub victim: CreatureKind,
    pub position: Position,
    pub unique: bool,
    pub champion: bool,
    pub attackers: Vec<Attacker>,
    /// Container holding the victim's remains
    pub remains: Option<ItemHandle>,
}

impl DeathEvent {
    pub fn has_player_attacker(&self) -> bool {
        self.attackers
            .iter()
            .any(|attacker| attacker.controller != Controller::Wild)
    }

    pub fn player_knowledge(&self) -> Vec<f64> {
        self.attackers
            .iter()
            .filter(|attacker| attacker.controller == Controller::Player)
            .map(|attacker| attacker.fighting_knowledge)
            .collect()
    }
}

/// Anything that may create a marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Trigger {
    Activity(Activity, ActivityEvent),
    Death(DeathEvent),
    /// A staff member asking for a marker
    Staff {
        position: Position,
        destination: Option<ItemHandle>,
    },
}

impl Trigger {
    /// Where distances to the treasure are measured from.
    pub fn origin(&self) -> Position {
        match self {
            Trigger::Activity(_, event) => event.actor_position,
            Trigger::Death(event) => event.position,
            Trigger::Staff { position, .. } => *position,
        }
    }

    /// Container the new marker is delivered into.
    pub fn destination(&self) -> Option<ItemHandle> {
        match self {
            Trigger::Activity(_, event) => event.inventory,
            Trigger::Death(event) => event.remains,
            Trigger::Staff { destination, .. } => *destination,
        }
    }

    pub fn marker_origin(&self) -> MarkerOrigin {
        match self {
            Trigger::Activity(activity, _) => MarkerOrigin::Activity(*activity),
            Trigger::Death(event) => MarkerOrigin::Death(event.victim),
            Trigger::Staff { .. } => MarkerOrigin::Staff,
        }
    }

    /// How the marker's quality is judged.
    pub fn evaluation_context(&self) -> EvaluationContext {
        match self {
            Trigger::Activity(activity, event) => EvaluationContext::Activity {
                skill: activity.skill(),
                knowledge: event.knowledge,
                tool: event.tool,
                actor_rarity: event.actor_rarity,
            },
            Trigger::Death(event) => EvaluationContext::Death {
                attacker_knowledge: event.player_knowledge(),
                unique_victim: event.unique,
            },
            Trigger::Staff { .. } => EvaluationContext::Unskilled,
        }
    }
}

/// Rolls whether an unprivileged trigger yields a marker.
pub fn is_eligible<R: Rng + ?Sized>(config: &TreasureConfig, trigger: &Trigger, rng: &mut R) -> bool {
    match trigger {
        Trigger::Activity(activity, _) => one_in(rng, activity.chance(config)),
        Trigger::Death(event) => {
            if event.unique {
                return one_in(rng, config.unique_chance);
            }
            if config.hunting_chance <= 0 {
                return false;
            }
            if !event.has_player_attacker() {
                debug!("Creature {} died without player attackers", event.victim);
                return false;
            }
            if !config.map_drops.contains(&event.victim) {
                return false;
            }
            (event.champion && one_in(rng, config.champion_bonus_chance))
                || one_in(rng, config.hunting_chance)
        }
        Trigger::Staff { .. } => {
            warn!("Staff marker requested without privileges");
            false
        }
    }
}

/// Entry points for hosts wiring world events to the engine.
pub trait TreasureHooks {
    fn on_dig(&mut self, event: &ActivityEvent) -> Option<TreasureMarker>;

    fn on_mine(&mut self, event: &ActivityEvent) -> Option<TreasureMarker>;

    fn on_surface_mine(&mut self, event: &ActivityEvent) -> Option<TreasureMarker>;

    fn on_fish(&mut self, event: &ActivityEvent) -> Option<TreasureMarker>;

    fn on_creature_death(&mut self, event: &DeathEvent) -> Option<TreasureMarker>;
}

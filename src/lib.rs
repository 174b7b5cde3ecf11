//! # Trove
//!
//! Procedural treasure hunting for persistent simulated worlds.
//!
//! ## Architecture Overview
//!
//! Trove hides treasure markers somewhere in a host world and, when a marker is
//! redeemed, materializes a reward chest and the creatures guarding it. The host
//! world stays external: everything Trove needs from it goes through the small
//! collaborator traits in [`world`].
//!
//! - **Configuration**: an immutable [`TreasureConfig`] snapshot, swapped as a
//!   whole through [`ConfigHandle`] on reload
//! - **Location search**: rejection sampling of a dry, flat, unclaimed tile
//! - **Quality evaluation**: skill checks and rarity windows for new markers
//! - **Reward engine**: independent per-category trials that fill a chest
//! - **Guard allocation**: a weight budget partitioned into creature spawns
//! - **Coordinator**: the entry point hosts call from their world events
//!
//! All randomness flows through an injected `StdRng`, so every operation is
//! reproducible from a seed.

pub mod config;
pub mod coordinator;
pub mod generation;
pub mod world;

pub use config::*;
pub use coordinator::*;
pub use generation::*;
pub use world::*;

/// Core error type for the Trove engine.
#[derive(thiserror::Error, Debug)]
pub enum TroveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration document is unusable as a whole
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Item template is not known to the catalog
    #[error("Unknown item template {0}")]
    UnknownTemplate(TemplateId),

    /// Item template id read from a table is not a valid id
    #[error("Invalid template id {id} in {source_list}")]
    InvalidTemplate {
        id: TemplateId,
        source_list: &'static str,
    },

    /// A host collaborator refused or failed an operation
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Trove codebase.
pub type TroveResult<T> = Result<T, TroveError>;

/// Version information for the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine-wide constants that are not configurable.
pub mod constants {
    /// Highest reward/spawn tier
    pub const MAX_TIER: usize = 9;

    /// Number of tiers (0 through 9)
    pub const TIER_COUNT: usize = MAX_TIER + 1;

    /// Lowest storable quality
    pub const MIN_QUALITY: f64 = 1.0;

    /// Highest storable quality
    pub const MAX_QUALITY: f64 = 100.0;

    /// Highest quality a freshly evaluated marker may have
    pub const MAX_MARKER_QUALITY: f64 = 99.0;

    /// Damage at which an item falls apart
    pub const MAX_DAMAGE: f64 = 100.0;

    /// Guardians never spawn older than this, whatever their species allows
    pub const MAX_GUARD_AGE: u32 = 48;
}

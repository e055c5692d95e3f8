//! Typed model of the save snapshot emitted by the external reader.
//!
//! The reader serializes with PascalCase keys. Every section is defaulted:
//! an empty or partially-written save decodes to an empty snapshot instead
//! of failing.

use serde::Deserialize;

/// One decoded save snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Snapshot {
    #[serde(default)]
    pub trainer: Option<Trainer>,

    #[serde(default)]
    pub pokedex: Option<PokedexProgress>,

    #[serde(default)]
    pub party: Vec<TeamMember>,

    /// Most recently caught species, when the save records one.
    #[serde(default)]
    pub last: Option<TeamMember>,
}

impl Snapshot {
    /// True when the reader produced no usable sections at all.
    pub fn is_empty(&self) -> bool {
        self.trainer.is_none() && self.pokedex.is_none() && self.party.is_empty()
    }
}

/// Trainer card data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Trainer {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "TID", default)]
    pub tid: u32,

    #[serde(rename = "SID", default)]
    pub sid: u32,

    #[serde(default)]
    pub money: u32,

    #[serde(default)]
    pub play_time: String,

    #[serde(default)]
    pub game_version: String,

    #[serde(default)]
    pub generation: u32,
}

/// Pokedex completion counters plus the per-species seen/caught sets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PokedexProgress {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub seen: u32,

    #[serde(default)]
    pub caught: u32,

    #[serde(default)]
    pub max_species: u32,

    #[serde(default)]
    pub seen_percent: f64,

    #[serde(default)]
    pub caught_percent: f64,

    #[serde(default)]
    pub seen_species: Vec<u32>,

    #[serde(default)]
    pub caught_species: Vec<u32>,
}

/// Registration state of one species in the Pokedex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexStatus {
    Caught,
    Seen,
    Unseen,
}

impl PokedexProgress {
    /// Caught wins over seen when a species appears in both sets.
    pub fn status_for(&self, species_id: u32) -> DexStatus {
        if self.caught_species.contains(&species_id) {
            DexStatus::Caught
        } else if self.seen_species.contains(&species_id) {
            DexStatus::Seen
        } else {
            DexStatus::Unseen
        }
    }
}

/// One party member (or the last-caught slot).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeamMember {
    #[serde(default)]
    pub species_id: u32,

    #[serde(default)]
    pub nickname: String,

    #[serde(default)]
    pub level: Option<u32>,

    /// The reader writes -1 when friendship is not tracked for the slot.
    #[serde(default)]
    friendship: Option<i32>,

    #[serde(default)]
    pub met_date: String,

    #[serde(rename = "OT", default)]
    pub ot: String,

    #[serde(default)]
    pub is_egg: bool,
}

impl TeamMember {
    /// Friendship value with the reader's -1 sentinel mapped to `None`.
    pub fn friendship(&self) -> Option<u32> {
        match self.friendship {
            Some(value) if value >= 0 => Some(value as u32),
            _ => None,
        }
    }
}

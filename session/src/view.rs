//! Presentation-ready views assembled from a snapshot plus remote data.
//!
//! Everything here is already resolved and degraded; a presenter can
//! render fields as-is without touching the API or the save model.

use pokehud_api::EvolutionCandidate;

/// One fully assembled team view, rebuilt on every reload.
#[derive(Debug, Clone, Default)]
pub struct TeamView {
    pub trainer: Option<TrainerCard>,
    pub pokedex: Option<DexProgress>,
    pub members: Vec<MemberView>,
    pub last_caught: Option<MemberView>,
}

#[derive(Debug, Clone, Default)]
pub struct TrainerCard {
    pub name: String,
    pub tid: u32,
    pub sid: u32,
    pub money: u32,
    pub play_time: String,
    pub game_version: String,
}

#[derive(Debug, Clone, Default)]
pub struct DexProgress {
    pub seen: u32,
    pub caught: u32,
    pub max_species: u32,
    pub seen_percent: f64,
    pub caught_percent: f64,
}

/// One rendered party slot.
#[derive(Debug, Clone)]
pub struct MemberView {
    pub species_id: u32,
    pub nickname: String,
    pub species_name: String,
    pub level: Option<u32>,
    pub friendship: Option<u32>,
    pub is_egg: bool,

    /// Best-effort sprite; empty when the lookup failed.
    pub sprite_url: String,
    pub evolution: EvolutionView,
}

impl MemberView {
    /// Nickname when it differs from the species name, otherwise the
    /// species name alone.
    pub fn title(&self) -> String {
        if self.nickname.is_empty() || self.nickname.eq_ignore_ascii_case(&self.species_name) {
            self.species_name.clone()
        } else {
            format!("{} ({})", self.nickname, self.species_name)
        }
    }
}

/// Evolution outlook for one member.
#[derive(Debug, Clone, Default)]
pub enum EvolutionView {
    Next(Vec<EvolutionCandidate>),

    #[default]
    Terminal,

    /// Resolution failed on this reload; the rest of the view still renders.
    Unavailable,
}

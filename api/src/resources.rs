//! Typed models for the remote data API payloads.
//!
//! Every field that can be absent in practice is defaulted: a missing field
//! degrades to a fallback display value at this boundary instead of failing
//! the whole decode.

use std::collections::HashMap;

use serde::Deserialize;

/// A `{name, url}` reference to another resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub url: String,
}

impl NamedRef {
    /// Numeric identifier parsed from the trailing path segment of the URL.
    pub fn trailing_id(&self) -> Option<u32> {
        trailing_id(&self.url)
    }

    /// Human-readable name: hyphens become spaces, words are title-cased.
    pub fn display_name(&self) -> String {
        title_case(&self.name)
    }
}

pub(crate) fn trailing_id(url: &str) -> Option<u32> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

/// Hyphen-stripped title casing for API identifiers
/// (`"fire-stone"` -> `"Fire Stone"`).
pub fn title_case(raw: &str) -> String {
    raw.split(['-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// A pokemon record: display data, typing, stats, abilities and moves.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pokemon {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub sprites: Sprites,

    #[serde(default)]
    pub types: Vec<TypeSlot>,

    #[serde(default)]
    pub stats: Vec<StatSlot>,

    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,

    #[serde(default)]
    pub moves: Vec<MoveEntry>,

    /// Height in decimeters.
    #[serde(default)]
    pub height: u32,

    /// Weight in hectograms.
    #[serde(default)]
    pub weight: u32,
}

impl Pokemon {
    pub fn display_name(&self) -> String {
        title_case(&self.name)
    }

    /// Front sprite URL, preferring the default art over the female
    /// variant; empty when neither exists.
    pub fn sprite_url(&self) -> &str {
        self.sprites
            .front_default
            .as_deref()
            .or(self.sprites.front_female.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,

    #[serde(default)]
    pub front_female: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type", default)]
    pub kind: NamedRef,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatSlot {
    #[serde(default)]
    pub base_stat: u32,

    #[serde(default)]
    pub stat: NamedRef,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AbilitySlot {
    #[serde(default)]
    pub ability: NamedRef,

    #[serde(default)]
    pub is_hidden: bool,
}

/// A learnable move with its per-version learn data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoveEntry {
    #[serde(rename = "move", default)]
    pub move_ref: NamedRef,

    #[serde(default)]
    pub version_group_details: Vec<VersionGroupDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionGroupDetail {
    #[serde(default)]
    pub level_learned_at: u32,

    #[serde(default)]
    pub move_learn_method: NamedRef,

    #[serde(default)]
    pub version_group: NamedRef,
}

/// A species record: chain reference plus localized descriptive text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Species {
    #[serde(default)]
    pub name: String,

    /// Reference to the evolution chain document. Absent means the species
    /// has no chain at all, a legitimate terminal state.
    #[serde(default)]
    pub evolution_chain: Option<UrlRef>,

    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorText>,

    #[serde(default)]
    pub genera: Vec<Genus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlRef {
    #[serde(default)]
    pub url: String,
}

impl UrlRef {
    pub fn trailing_id(&self) -> Option<u32> {
        trailing_id(&self.url)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlavorText {
    #[serde(default)]
    pub flavor_text: String,

    #[serde(default)]
    pub language: NamedRef,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Genus {
    #[serde(default)]
    pub genus: String,

    #[serde(default)]
    pub language: NamedRef,
}

/// The raw evolution chain document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainDoc {
    #[serde(default)]
    pub chain: RawChainNode,
}

/// One raw node of the evolution tree.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChainNode {
    #[serde(default)]
    pub species: NamedRef,

    #[serde(default)]
    pub evolution_details: Vec<EvolutionDetail>,

    #[serde(default)]
    pub evolves_to: Vec<RawChainNode>,
}

/// One way a species can evolve. The API fills only the fields relevant to
/// the trigger; everything else stays at its default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EvolutionDetail {
    #[serde(default)]
    pub min_level: Option<u32>,

    #[serde(default)]
    pub item: Option<NamedRef>,

    #[serde(default)]
    pub held_item: Option<NamedRef>,

    #[serde(default)]
    pub trigger: Option<NamedRef>,

    #[serde(default)]
    pub min_happiness: Option<u32>,

    #[serde(default)]
    pub min_affection: Option<u32>,

    #[serde(default)]
    pub min_beauty: Option<u32>,

    #[serde(default)]
    pub time_of_day: String,

    #[serde(default)]
    pub known_move: Option<NamedRef>,

    #[serde(default)]
    pub known_move_type: Option<NamedRef>,

    #[serde(default)]
    pub location: Option<NamedRef>,

    #[serde(default)]
    pub trade_species: Option<NamedRef>,
}

/// A type record: the damage relations used for the weakness chart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeRecord {
    #[serde(default)]
    pub damage_relations: DamageRelations,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DamageRelations {
    #[serde(default)]
    pub double_damage_from: Vec<NamedRef>,

    #[serde(default)]
    pub half_damage_from: Vec<NamedRef>,

    #[serde(default)]
    pub no_damage_from: Vec<NamedRef>,
}

/// One page of the species listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeciesPage {
    #[serde(default)]
    pub results: Vec<NamedRef>,
}

/// Id -> display name lookup built from the species listing.
#[derive(Debug, Clone, Default)]
pub struct SpeciesNameIndex {
    names: HashMap<u32, String>,
}

impl SpeciesNameIndex {
    /// Entries without a parseable id in their URL are dropped.
    pub fn from_page(page: &SpeciesPage) -> Self {
        let mut names = HashMap::new();
        for entry in &page.results {
            if let Some(id) = entry.trailing_id() {
                names.insert(id, entry.display_name());
            }
        }
        Self { names }
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Display name with a stable fallback for unknown ids.
    pub fn display_name(&self, id: u32) -> String {
        self.name(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Species {id}"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

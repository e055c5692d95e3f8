//! Pokedex entry assembly.
//!
//! Everything the detail view renders for one species, resolved and
//! degraded at this boundary so presentation never touches raw payloads.

use std::collections::{BTreeMap, HashSet};

use crate::ApiError;
use crate::client::RemoteSource;
use crate::resources::title_case;
use crate::store::DexStore;

/// Version groups whose learnsets are surfaced (Gen 7, matching the save).
const VERSION_GROUPS: [&str; 2] = ["ultra-sun-ultra-moon", "sun-moon"];

fn stat_label(name: &str) -> String {
    match name {
        "hp" => "HP".to_string(),
        "attack" => "Attack".to_string(),
        "defense" => "Defense".to_string(),
        "special-attack" => "Sp. Atk".to_string(),
        "special-defense" => "Sp. Def".to_string(),
        "speed" => "Speed".to_string(),
        other => title_case(other),
    }
}

/// Fully-resolved display bundle for one species.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PokedexEntry {
    pub name: String,
    pub genus: String,
    pub flavor_text: String,
    pub sprite_url: String,
    pub types: Vec<String>,
    pub height_m: f64,
    pub weight_kg: f64,
    pub stats: Vec<(String, u32)>,
    pub abilities: Vec<String>,
    pub weaknesses: Vec<String>,
    pub resistances: Vec<String>,
    pub immunities: Vec<String>,
    pub level_up_moves: Vec<(u32, String)>,
    pub machine_moves: Vec<String>,
    pub egg_moves: Vec<String>,
    pub tutor_moves: Vec<String>,
}

impl<S: RemoteSource> DexStore<S> {
    /// Build the full Pokedex entry for `species_id`.
    ///
    /// Flavor text and genus prefer `language`, falling back to the first
    /// entry of each list. Type-chart lookups are best effort: a failed
    /// type fetch degrades to a partial chart, never an error.
    pub async fn pokedex_entry(
        &mut self,
        species_id: u32,
        language: &str,
    ) -> Result<PokedexEntry, ApiError> {
        let pokemon = self.pokemon(species_id).await?;
        let species = self.species(species_id).await?;

        let type_names: Vec<String> = pokemon
            .types
            .iter()
            .filter(|slot| !slot.kind.name.is_empty())
            .map(|slot| slot.kind.name.clone())
            .collect();

        // Aggregate damage multipliers across the pokemon's own types;
        // BTreeMap keeps the chart ordering deterministic.
        let mut multipliers: BTreeMap<String, f64> = BTreeMap::new();
        for name in &type_names {
            let record = match self.type_record(name).await {
                Ok(record) => record,
                Err(error) => {
                    tracing::warn!(
                        type_name = %name,
                        error = %error,
                        "type record lookup failed, damage chart will be partial"
                    );
                    continue;
                }
            };
            let relations = &record.damage_relations;
            for attacker in &relations.double_damage_from {
                *multipliers.entry(attacker.name.clone()).or_insert(1.0) *= 2.0;
            }
            for attacker in &relations.half_damage_from {
                *multipliers.entry(attacker.name.clone()).or_insert(1.0) *= 0.5;
            }
            for attacker in &relations.no_damage_from {
                *multipliers.entry(attacker.name.clone()).or_insert(1.0) *= 0.0;
            }
        }
        let weaknesses = classify(&multipliers, |m| m > 1.0);
        let resistances = classify(&multipliers, |m| m > 0.0 && m < 1.0);
        let immunities = classify(&multipliers, |m| m == 0.0);

        let stats = pokemon
            .stats
            .iter()
            .map(|slot| (stat_label(&slot.stat.name), slot.base_stat))
            .collect();

        let abilities = pokemon
            .abilities
            .iter()
            .filter(|slot| !slot.ability.name.is_empty())
            .map(|slot| {
                let name = slot.ability.display_name();
                if slot.is_hidden {
                    format!("{name} (hidden)")
                } else {
                    name
                }
            })
            .collect();

        // Bucket learnable moves by method, keeping the first matching
        // version group entry per move.
        let mut level_up_moves = Vec::new();
        let mut machine_moves = Vec::new();
        let mut egg_moves = Vec::new();
        let mut tutor_moves = Vec::new();
        for entry in &pokemon.moves {
            let name = entry.move_ref.display_name();
            for detail in &entry.version_group_details {
                if !VERSION_GROUPS.contains(&detail.version_group.name.as_str()) {
                    continue;
                }
                match detail.move_learn_method.name.as_str() {
                    "level-up" => level_up_moves.push((detail.level_learned_at, name.clone())),
                    "machine" => machine_moves.push(name.clone()),
                    "egg" => egg_moves.push(name.clone()),
                    "tutor" => tutor_moves.push(name.clone()),
                    _ => {}
                }
                break;
            }
        }
        level_up_moves.sort_by_key(|(level, _)| *level);
        dedup_preserving_order(&mut machine_moves);
        dedup_preserving_order(&mut egg_moves);
        dedup_preserving_order(&mut tutor_moves);

        let flavor_text = species
            .flavor_text_entries
            .iter()
            .find(|entry| entry.language.name == language)
            .or_else(|| species.flavor_text_entries.first())
            .map(|entry| flatten_soft_breaks(&entry.flavor_text))
            .unwrap_or_default();
        let genus = species
            .genera
            .iter()
            .find(|entry| entry.language.name == language)
            .or_else(|| species.genera.first())
            .map(|entry| entry.genus.clone())
            .unwrap_or_default();

        Ok(PokedexEntry {
            name: pokemon.display_name(),
            genus,
            flavor_text,
            sprite_url: pokemon.sprite_url().to_string(),
            types: type_names.iter().map(|t| title_case(t)).collect(),
            height_m: f64::from(pokemon.height) / 10.0,
            weight_kg: f64::from(pokemon.weight) / 10.0,
            stats,
            abilities,
            weaknesses,
            resistances,
            immunities,
            level_up_moves,
            machine_moves,
            egg_moves,
            tutor_moves,
        })
    }
}

fn classify(multipliers: &BTreeMap<String, f64>, pred: fn(f64) -> bool) -> Vec<String> {
    multipliers
        .iter()
        .filter(|(_, multiplier)| pred(**multiplier))
        .map(|(name, _)| title_case(name))
        .collect()
}

/// Remove duplicates, keeping first occurrences.
fn dedup_preserving_order(moves: &mut Vec<String>) {
    let mut seen = HashSet::new();
    moves.retain(|name| seen.insert(name.clone()));
}

/// Flavor text embeds newlines and form feeds as soft line breaks.
fn flatten_soft_breaks(raw: &str) -> String {
    raw.replace(['\n', '\u{c}'], " ")
}

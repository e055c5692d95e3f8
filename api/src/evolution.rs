//! Evolution chain resolution.
//!
//! Locates a species in its (arbitrarily branching) evolution tree and
//! normalizes the heterogeneous trigger conditions of each reachable next
//! stage into stable display strings.

use std::sync::Arc;

use thiserror::Error;

use crate::ApiError;
use crate::client::RemoteSource;
use crate::resources::{EvolutionDetail, NamedRef, RawChainNode, title_case};
use crate::store::DexStore;

/// Where a species sits in its evolution line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evolution {
    /// The species can still evolve into these stages.
    Next(Vec<EvolutionCandidate>),

    /// Final stage, or the species has no chain at all.
    Terminal,
}

/// One reachable next stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvolutionCandidate {
    pub id: u32,
    pub display_name: String,
    pub min_level: Option<u32>,

    /// Normalized trigger condition, e.g. `"Level 16 (at night)"`.
    pub condition: String,

    /// Best-effort sprite; empty when the lookup failed.
    pub sprite_url: String,
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("species id must be a positive integer")]
    InvalidSpecies,

    #[error("species record has a malformed evolution chain url: {0:?}")]
    MalformedChainUrl(String),

    #[error("species {0} not present in its evolution chain")]
    NodeNotFound(u32),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A normalized, immutable evolution tree node.
///
/// Built in one pass over the raw chain document so the search never
/// re-derives identifiers from URL strings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainNode {
    /// Trailing numeric segment of the species URL; `None` when the URL
    /// does not carry one.
    pub species_id: Option<u32>,
    pub name: String,
    pub details: Vec<EvolutionDetail>,
    pub children: Vec<ChainNode>,
}

impl ChainNode {
    pub fn from_raw(raw: &RawChainNode) -> Self {
        Self {
            species_id: raw.species.trailing_id(),
            name: raw.species.name.clone(),
            details: raw.evolution_details.clone(),
            children: raw.evolves_to.iter().map(Self::from_raw).collect(),
        }
    }

    /// Pre-order depth-first search: the node itself, then children left
    /// to right. First match wins; terminates at any depth.
    pub fn find(&self, species_id: u32) -> Option<&ChainNode> {
        if self.species_id == Some(species_id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(species_id))
    }
}

impl<S: RemoteSource> DexStore<S> {
    /// Resolve the reachable next evolution stages of `species_id`.
    ///
    /// Successful outcomes (including [`Evolution::Terminal`]) are cached
    /// under the species id; errors are not, so a later call retries the
    /// whole lookup.
    pub async fn resolve_next(&mut self, species_id: u32) -> Result<Evolution, ResolveError> {
        if species_id == 0 {
            return Err(ResolveError::InvalidSpecies);
        }
        if let Some(cached) = self.evolutions.get(&species_id) {
            return Ok(cached.clone());
        }

        let species = self.species(species_id).await?;
        let Some(chain_ref) = species
            .evolution_chain
            .as_ref()
            .filter(|r| !r.url.is_empty())
        else {
            // No chain at all is a stable terminal state, not an error.
            let result = Evolution::Terminal;
            self.evolutions.insert(species_id, result.clone());
            return Ok(result);
        };
        let chain_id = chain_ref
            .trailing_id()
            .ok_or_else(|| ResolveError::MalformedChainUrl(chain_ref.url.clone()))?;

        let root = self.fetch_chain(chain_id).await?;
        let Some(node) = root.find(species_id) else {
            // Likely a transient data inconsistency; neither the result
            // nor the chain is cached, so the next call re-fetches.
            tracing::warn!(species_id, chain_id, "species missing from its evolution chain");
            return Err(ResolveError::NodeNotFound(species_id));
        };
        self.chains.insert(chain_id, Arc::clone(&root));

        let mut next = Vec::new();
        for child in &node.children {
            let Some(id) = child.species_id else {
                tracing::warn!(
                    parent = species_id,
                    child = %child.name,
                    "skipping evolution child without a numeric species url"
                );
                continue;
            };
            let display_name = if child.name.is_empty() {
                format!("Species {id}")
            } else {
                title_case(&child.name)
            };
            let first = child.details.first();
            let condition = format_condition(first);
            let min_level = first.and_then(|d| d.min_level);

            // Sprite lookup is best effort; a failure yields an empty
            // sprite, never an overall error.
            let sprite_url = match self.pokemon(id).await {
                Ok(pokemon) => pokemon.sprite_url().to_string(),
                Err(error) => {
                    tracing::warn!(id, error = %error, "sprite lookup failed");
                    String::new()
                }
            };

            next.push(EvolutionCandidate {
                id,
                display_name,
                min_level,
                condition,
                sprite_url,
            });
        }

        let result = if next.is_empty() {
            Evolution::Terminal
        } else {
            Evolution::Next(next)
        };
        self.evolutions.insert(species_id, result.clone());
        Ok(result)
    }
}

fn named(reference: &Option<NamedRef>) -> Option<&NamedRef> {
    reference.as_ref().filter(|r| !r.name.is_empty())
}

/// Normalize an evolution detail into a display condition.
///
/// Priority order: level, item, trade, friendship/affection/beauty, known
/// move, location, raw trigger. A node may list several trigger methods;
/// callers surface only the first detail entry, and this function only the
/// first applicable rule. Embedded names are hyphen-stripped and
/// title-cased.
pub fn format_condition(details: Option<&EvolutionDetail>) -> String {
    let Some(details) = details else {
        return "Special condition".to_string();
    };

    if let Some(level) = details.min_level {
        let mut qualifiers = Vec::new();
        if !details.time_of_day.is_empty() {
            qualifiers.push(format!("at {}", details.time_of_day));
        }
        if let Some(known_move) = named(&details.known_move) {
            qualifiers.push(format!("knows {}", known_move.display_name()));
        }
        if let Some(location) = named(&details.location) {
            qualifiers.push(format!("at {}", location.display_name()));
        }
        return if qualifiers.is_empty() {
            format!("Level {level}")
        } else {
            format!("Level {level} ({})", qualifiers.join(", "))
        };
    }

    if let Some(item) = named(&details.item) {
        return format!("Use {}", item.display_name());
    }

    if named(&details.trigger).is_some_and(|t| t.name == "trade") {
        if let Some(held) = named(&details.held_item) {
            return format!("Trade holding {}", held.display_name());
        }
        if let Some(species) = named(&details.trade_species) {
            return format!("Trade for {}", species.display_name());
        }
        return "Trade".to_string();
    }

    if let Some(n) = details.min_happiness {
        return format!("Friendship {n}+");
    }
    if let Some(n) = details.min_affection {
        return format!("Affection {n}+");
    }
    if let Some(n) = details.min_beauty {
        return format!("Beauty {n}+");
    }

    if let Some(known_move) = named(&details.known_move) {
        return format!("Knows {}", known_move.display_name());
    }
    if let Some(move_type) = named(&details.known_move_type) {
        return format!("Knows a {}-type move", move_type.display_name());
    }
    if let Some(location) = named(&details.location) {
        return format!("Level up at {}", location.display_name());
    }

    match named(&details.trigger) {
        Some(trigger) => trigger.display_name(),
        None => "Special condition".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::POKEAPI_BASE;
    use crate::testing::FakeSource;

    fn detail(value: serde_json::Value) -> EvolutionDetail {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_condition_level_with_qualifiers() {
        assert_eq!(format_condition(Some(&detail(json!({"min_level": 16})))), "Level 16");
        assert_eq!(
            format_condition(Some(&detail(json!({"min_level": 16, "time_of_day": "night"})))),
            "Level 16 (at night)"
        );
        assert_eq!(
            format_condition(Some(&detail(json!({
                "min_level": 16,
                "time_of_day": "night",
                "known_move": {"name": "bite", "url": ""}
            })))),
            "Level 16 (at night, knows Bite)"
        );
        assert_eq!(
            format_condition(Some(&detail(json!({
                "min_level": 20,
                "location": {"name": "eterna-forest", "url": ""}
            })))),
            "Level 20 (at Eterna Forest)"
        );
    }

    #[test]
    fn test_condition_item_beats_trade() {
        assert_eq!(
            format_condition(Some(&detail(json!({"item": {"name": "fire-stone", "url": ""}})))),
            "Use Fire Stone"
        );
        // Item wins even when a trade trigger is also present.
        assert_eq!(
            format_condition(Some(&detail(json!({
                "item": {"name": "water-stone", "url": ""},
                "trigger": {"name": "trade", "url": ""}
            })))),
            "Use Water Stone"
        );
    }

    #[test]
    fn test_condition_trade_variants() {
        assert_eq!(
            format_condition(Some(&detail(json!({"trigger": {"name": "trade", "url": ""}})))),
            "Trade"
        );
        assert_eq!(
            format_condition(Some(&detail(json!({
                "trigger": {"name": "trade", "url": ""},
                "held_item": {"name": "metal-coat", "url": ""}
            })))),
            "Trade holding Metal Coat"
        );
        assert_eq!(
            format_condition(Some(&detail(json!({
                "trigger": {"name": "trade", "url": ""},
                "trade_species": {"name": "shelmet", "url": ""}
            })))),
            "Trade for Shelmet"
        );
    }

    #[test]
    fn test_condition_thresholds_in_order() {
        assert_eq!(
            format_condition(Some(&detail(json!({"min_happiness": 220})))),
            "Friendship 220+"
        );
        assert_eq!(
            format_condition(Some(&detail(json!({"min_happiness": 160, "min_beauty": 171})))),
            "Friendship 160+"
        );
        assert_eq!(
            format_condition(Some(&detail(json!({"min_affection": 2})))),
            "Affection 2+"
        );
        assert_eq!(
            format_condition(Some(&detail(json!({"min_beauty": 171})))),
            "Beauty 171+"
        );
    }

    #[test]
    fn test_condition_move_location_and_fallbacks() {
        assert_eq!(
            format_condition(Some(&detail(json!({"known_move": {"name": "mimic", "url": ""}})))),
            "Knows Mimic"
        );
        assert_eq!(
            format_condition(Some(&detail(json!({"known_move_type": {"name": "fairy", "url": ""}})))),
            "Knows a Fairy-type move"
        );
        assert_eq!(
            format_condition(Some(&detail(json!({"location": {"name": "mt-coronet", "url": ""}})))),
            "Level up at Mt Coronet"
        );
        assert_eq!(
            format_condition(Some(&detail(json!({"trigger": {"name": "shed", "url": ""}})))),
            "Shed"
        );
        assert_eq!(format_condition(Some(&detail(json!({})))), "Special condition");
        assert_eq!(format_condition(None), "Special condition");
    }

    fn species_url(id: u32) -> String {
        format!("{POKEAPI_BASE}/pokemon-species/{id}")
    }

    fn chain_url(id: u32) -> String {
        format!("{POKEAPI_BASE}/evolution-chain/{id}")
    }

    fn pokemon_url(id: u32) -> String {
        format!("{POKEAPI_BASE}/pokemon/{id}")
    }

    fn species_json(id: u32, chain: u32) -> serde_json::Value {
        json!({
            "name": format!("species-{id}"),
            "evolution_chain": {"url": format!("https://pokeapi.co/api/v2/evolution-chain/{chain}/")}
        })
    }

    /// Weedle line: 13 -> 14 -> 15, level triggers.
    fn three_stage_chain() -> serde_json::Value {
        json!({
            "chain": {
                "species": {"name": "weedle", "url": "https://pokeapi.co/api/v2/pokemon-species/13/"},
                "evolution_details": [],
                "evolves_to": [{
                    "species": {"name": "kakuna", "url": "https://pokeapi.co/api/v2/pokemon-species/14/"},
                    "evolution_details": [{"min_level": 7}],
                    "evolves_to": [{
                        "species": {"name": "beedrill", "url": "https://pokeapi.co/api/v2/pokemon-species/15/"},
                        "evolution_details": [{"min_level": 10}],
                        "evolves_to": []
                    }]
                }]
            }
        })
    }

    #[test]
    fn test_chain_find_is_preorder() {
        let doc: crate::resources::ChainDoc =
            serde_json::from_value(three_stage_chain()).unwrap();
        let root = ChainNode::from_raw(&doc.chain);

        assert_eq!(root.find(13).map(|n| n.name.as_str()), Some("weedle"));
        assert_eq!(root.find(15).map(|n| n.name.as_str()), Some("beedrill"));
        assert_eq!(root.find(99), None);

        // Depth-two node still has its own child list.
        let kakuna = root.find(14).unwrap();
        assert_eq!(kakuna.children.len(), 1);
        assert_eq!(kakuna.children[0].species_id, Some(15));
    }

    #[tokio::test]
    async fn test_resolve_mid_chain_species() {
        let mut source = FakeSource::new();
        source.insert(species_url(14), species_json(14, 6));
        source.insert(chain_url(6), three_stage_chain());
        source.insert(
            pokemon_url(15),
            json!({"name": "beedrill", "sprites": {"front_default": "beedrill.png"}}),
        );
        let mut store = DexStore::new(source);

        let result = store.resolve_next(14).await.unwrap();
        let Evolution::Next(candidates) = result else {
            panic!("expected Next");
        };
        assert_eq!(candidates.len(), 1);
        let beedrill = &candidates[0];
        assert_eq!(beedrill.id, 15);
        assert_eq!(beedrill.display_name, "Beedrill");
        assert_eq!(beedrill.min_level, Some(10));
        assert_eq!(beedrill.condition, "Level 10");
        assert_eq!(beedrill.sprite_url, "beedrill.png");
    }

    #[tokio::test]
    async fn test_resolve_branching_chain_keeps_child_order() {
        // Eevee-style branch: two stones, left-to-right order preserved.
        let mut source = FakeSource::new();
        source.insert(species_url(133), species_json(133, 67));
        source.insert(
            chain_url(67),
            json!({
                "chain": {
                    "species": {"name": "eevee", "url": "https://pokeapi.co/api/v2/pokemon-species/133/"},
                    "evolution_details": [],
                    "evolves_to": [
                        {
                            "species": {"name": "vaporeon", "url": "https://pokeapi.co/api/v2/pokemon-species/134/"},
                            "evolution_details": [{"item": {"name": "water-stone", "url": ""}}],
                            "evolves_to": []
                        },
                        {
                            "species": {"name": "jolteon", "url": "https://pokeapi.co/api/v2/pokemon-species/135/"},
                            "evolution_details": [{"item": {"name": "thunder-stone", "url": ""}}],
                            "evolves_to": []
                        }
                    ]
                }
            }),
        );
        let mut store = DexStore::new(source);

        let Evolution::Next(candidates) = store.resolve_next(133).await.unwrap() else {
            panic!("expected Next");
        };
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].display_name, "Vaporeon");
        assert_eq!(candidates[0].condition, "Use Water Stone");
        assert_eq!(candidates[1].display_name, "Jolteon");
        assert_eq!(candidates[1].condition, "Use Thunder Stone");
        // Sprite lookups failed (no pokemon payloads) but resolution
        // still succeeded with empty sprites.
        assert_eq!(candidates[0].sprite_url, "");
    }

    #[tokio::test]
    async fn test_terminal_species_cached() {
        let mut source = FakeSource::new();
        source.insert(species_url(15), species_json(15, 6));
        source.insert(chain_url(6), three_stage_chain());
        let mut store = DexStore::new(source);

        assert_eq!(store.resolve_next(15).await.unwrap(), Evolution::Terminal);
        let after_first = store.source.calls();

        // Second call is served from cache with zero network access.
        assert_eq!(store.resolve_next(15).await.unwrap(), Evolution::Terminal);
        assert_eq!(store.source.calls(), after_first);
    }

    #[tokio::test]
    async fn test_missing_chain_reference_is_terminal() {
        let mut source = FakeSource::new();
        source.insert(species_url(772), json!({"name": "type-null"}));
        let mut store = DexStore::new(source);

        assert_eq!(store.resolve_next(772).await.unwrap(), Evolution::Terminal);
        assert_eq!(store.evolutions.len(), 1);
    }

    #[tokio::test]
    async fn test_node_not_found_is_not_cached() {
        let mut source = FakeSource::new();
        // Species 99 points at a chain that does not contain it.
        source.insert(species_url(99), species_json(99, 6));
        source.insert(chain_url(6), three_stage_chain());
        let mut store = DexStore::new(source);

        let err = store.resolve_next(99).await.unwrap_err();
        assert!(matches!(err, ResolveError::NodeNotFound(99)));
        assert!(store.evolutions.is_empty());
        assert!(store.chains.is_empty());

        // A subsequent call re-fetches the chain document.
        let calls_before = store.source.calls_to(&chain_url(6));
        let err = store.resolve_next(99).await.unwrap_err();
        assert!(matches!(err, ResolveError::NodeNotFound(99)));
        assert_eq!(store.source.calls_to(&chain_url(6)), calls_before + 1);
    }

    #[tokio::test]
    async fn test_invalid_species_makes_no_network_call() {
        let mut store = DexStore::new(FakeSource::new());
        let err = store.resolve_next(0).await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidSpecies));
        assert_eq!(store.source.calls(), 0);
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let mut source = FakeSource::new();
        source.insert(species_url(14), species_json(14, 6));
        source.insert(chain_url(6), three_stage_chain());
        let mut store = DexStore::new(source);

        let first = store.resolve_next(14).await.unwrap();
        let calls = store.source.calls();
        let second = store.resolve_next(14).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.source.calls(), calls);
    }
}

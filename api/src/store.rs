//! Get-or-fetch store over the remote API, one typed cache per entity kind.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ApiError;
use crate::cache::{EntityKind, ResultCache};
use crate::client::RemoteSource;
use crate::evolution::{ChainNode, Evolution};
use crate::resources::{ChainDoc, Pokemon, Species, SpeciesNameIndex, SpeciesPage, TypeRecord};

/// Public base URL of the data API.
pub const POKEAPI_BASE: &str = "https://pokeapi.co/api/v2";

/// Owns the remote source and every per-kind result cache.
///
/// All lookups take `&mut self`: the store lives on the single consumer
/// task, which serializes fetches and makes duplicate in-flight requests
/// impossible without locks. A cache hit performs no I/O; a miss fetches,
/// decodes, and inserts only on success, so a failed fetch stays retryable.
pub struct DexStore<S> {
    pub(crate) source: S,
    base_url: String,
    pub(crate) pokemon: ResultCache<u32, Arc<Pokemon>>,
    pub(crate) species: ResultCache<u32, Arc<Species>>,
    pub(crate) chains: ResultCache<u32, Arc<ChainNode>>,
    pub(crate) types: ResultCache<String, Arc<TypeRecord>>,
    pub(crate) name_indexes: ResultCache<u32, Arc<SpeciesNameIndex>>,
    pub(crate) evolutions: ResultCache<u32, Evolution>,
}

impl<S: RemoteSource> DexStore<S> {
    pub fn new(source: S) -> Self {
        Self::with_base_url(source, POKEAPI_BASE)
    }

    pub fn with_base_url(source: S, base_url: impl Into<String>) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            pokemon: ResultCache::new(EntityKind::Pokemon),
            species: ResultCache::new(EntityKind::Species),
            chains: ResultCache::new(EntityKind::Chain),
            types: ResultCache::new(EntityKind::TypeRelations),
            name_indexes: ResultCache::new(EntityKind::SpeciesNameIndex),
            evolutions: ResultCache::new(EntityKind::Evolution),
        }
    }

    /// Fetch and decode one document, no caching.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        url: &str,
    ) -> Result<T, ApiError> {
        tracing::debug!(kind = %kind, url, "cache miss, fetching");
        let value: Value = self.source.get_value(url).await?;
        serde_json::from_value(value).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Pokemon record by id.
    pub async fn pokemon(&mut self, id: u32) -> Result<Arc<Pokemon>, ApiError> {
        if let Some(hit) = self.pokemon.get(&id) {
            return Ok(Arc::clone(hit));
        }
        let url = format!("{}/pokemon/{id}", self.base_url);
        let decoded = Arc::new(self.fetch::<Pokemon>(EntityKind::Pokemon, &url).await?);
        self.pokemon.insert(id, Arc::clone(&decoded));
        Ok(decoded)
    }

    /// Species record by id.
    pub async fn species(&mut self, id: u32) -> Result<Arc<Species>, ApiError> {
        if let Some(hit) = self.species.get(&id) {
            return Ok(Arc::clone(hit));
        }
        let url = format!("{}/pokemon-species/{id}", self.base_url);
        let decoded = Arc::new(self.fetch::<Species>(EntityKind::Species, &url).await?);
        self.species.insert(id, Arc::clone(&decoded));
        Ok(decoded)
    }

    /// Evolution chain by chain id, normalized into an immutable tree in a
    /// single pass over the raw document. Not cached here: the resolver
    /// caches a chain only once it has proven consistent, so an
    /// inconsistent document gets re-fetched on the next resolution.
    pub(crate) async fn fetch_chain(&mut self, id: u32) -> Result<Arc<ChainNode>, ApiError> {
        if let Some(hit) = self.chains.get(&id) {
            return Ok(Arc::clone(hit));
        }
        let url = format!("{}/evolution-chain/{id}", self.base_url);
        let doc = self.fetch::<ChainDoc>(EntityKind::Chain, &url).await?;
        Ok(Arc::new(ChainNode::from_raw(&doc.chain)))
    }

    /// Type record (damage relations) by type name.
    pub async fn type_record(&mut self, name: &str) -> Result<Arc<TypeRecord>, ApiError> {
        if let Some(hit) = self.types.get(&name.to_string()) {
            return Ok(Arc::clone(hit));
        }
        let url = format!("{}/type/{name}", self.base_url);
        let decoded = Arc::new(self.fetch::<TypeRecord>(EntityKind::TypeRelations, &url).await?);
        self.types.insert(name.to_string(), Arc::clone(&decoded));
        Ok(decoded)
    }

    /// Id -> name index over the first `limit` species, built from one
    /// paged listing fetch and cached per requested limit.
    pub async fn species_names(&mut self, limit: u32) -> Result<Arc<SpeciesNameIndex>, ApiError> {
        if let Some(hit) = self.name_indexes.get(&limit) {
            return Ok(Arc::clone(hit));
        }
        let url = format!("{}/pokemon-species?limit={limit}", self.base_url);
        let page = self
            .fetch::<SpeciesPage>(EntityKind::SpeciesNameIndex, &url)
            .await?;
        let index = Arc::new(SpeciesNameIndex::from_page(&page));
        self.name_indexes.insert(limit, Arc::clone(&index));
        Ok(index)
    }
}

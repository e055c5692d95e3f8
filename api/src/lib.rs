use thiserror::Error;

pub mod cache;
pub mod client;
pub mod evolution;
pub mod pokedex;
pub mod resources;
pub mod store;

pub use cache::{EntityKind, ResultCache};
pub use client::{ApiClient, RemoteSource, RetryPolicy};
pub use evolution::{ChainNode, Evolution, EvolutionCandidate, ResolveError, format_condition};
pub use pokedex::PokedexEntry;
pub use resources::{NamedRef, Pokemon, Species, SpeciesNameIndex, TypeRecord};
pub use store::{DexStore, POKEAPI_BASE};

/// Errors from the remote data API.
///
/// `Exhausted` is the only variant a caller of [`RemoteSource::get_value`]
/// sees through [`ApiClient`]; the others describe a single failed attempt
/// and survive as its `cause`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("giving up on {url} after {attempts} attempts: {cause}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        cause: Box<ApiError>,
    },
}

impl ApiError {
    /// HTTP status of the failed attempt, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            ApiError::Exhausted { cause, .. } => cause.status_code(),
            ApiError::Decode { .. } => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use serde_json::Value;

    use crate::ApiError;
    use crate::client::RemoteSource;

    /// In-memory stand-in for the remote API.
    ///
    /// Serves canned payloads keyed by URL, records every call, and can be
    /// told to fail the next N calls before serving again.
    #[derive(Default)]
    pub struct FakeSource {
        responses: HashMap<String, Value>,
        calls: RefCell<Vec<String>>,
        fail_next: RefCell<u32>,
    }

    impl FakeSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, url: impl Into<String>, value: Value) {
            self.responses.insert(url.into(), value);
        }

        pub fn fail_next(&self, count: u32) {
            *self.fail_next.borrow_mut() = count;
        }

        pub fn calls(&self) -> usize {
            self.calls.borrow().len()
        }

        pub fn calls_to(&self, url: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == url).count()
        }
    }

    impl RemoteSource for FakeSource {
        async fn get_value(&self, url: &str) -> Result<Value, ApiError> {
            self.calls.borrow_mut().push(url.to_string());
            {
                let mut fail = self.fail_next.borrow_mut();
                if *fail > 0 {
                    *fail -= 1;
                    return Err(ApiError::Status {
                        url: url.to_string(),
                        status: 503,
                    });
                }
            }
            match self.responses.get(url) {
                Some(value) => Ok(value.clone()),
                None => Err(ApiError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }
}

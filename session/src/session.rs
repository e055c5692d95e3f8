//! Live session: reacts to reload tokens by re-reading the save and
//! assembling a fresh [`TeamView`].

use std::sync::Arc;

use pokehud_api::{ApiError, DexStore, Evolution, PokedexEntry, RemoteSource, SpeciesNameIndex};
use pokehud_save::snapshot::TeamMember;
use pokehud_save::watcher::WatchStatus;
use pokehud_save::{SnapshotError, SnapshotReader};
use tokio::sync::{mpsc, watch};

use crate::view::{DexProgress, EvolutionView, MemberView, TeamView, TrainerCard};

/// Renders session output. Implementations stay synchronous; anything slow
/// belongs outside the session loop.
pub trait Presenter {
    fn show_team(&mut self, view: &TeamView);
    fn show_status(&mut self, status: &WatchStatus);

    /// A reload failed; the previously shown team is still the latest
    /// good one.
    fn show_reload_error(&mut self, error: &SnapshotError);
}

/// Owns the reader and the data store for one watched save.
pub struct Session<S> {
    reader: SnapshotReader,
    dex: DexStore<S>,
    language: String,
}

impl<S: RemoteSource> Session<S> {
    pub fn new(reader: SnapshotReader, dex: DexStore<S>) -> Self {
        Self {
            reader,
            dex,
            language: "en".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Re-read the save and assemble a fresh view.
    ///
    /// A failed snapshot read is an error; failed remote lookups are not.
    /// Each member degrades independently, so one bad species never blanks
    /// the rest of the team.
    pub async fn reload(&mut self) -> Result<TeamView, SnapshotError> {
        let snapshot = self.reader.snapshot().await?;

        let trainer = snapshot.trainer.as_ref().map(|t| TrainerCard {
            name: t.name.clone(),
            tid: t.tid,
            sid: t.sid,
            money: t.money,
            play_time: t.play_time.clone(),
            game_version: t.game_version.clone(),
        });
        let pokedex = snapshot.pokedex.as_ref().map(|d| DexProgress {
            seen: d.seen,
            caught: d.caught,
            max_species: d.max_species,
            seen_percent: d.seen_percent,
            caught_percent: d.caught_percent,
        });

        let mut members = Vec::with_capacity(snapshot.party.len());
        for member in &snapshot.party {
            members.push(self.member_view(member).await);
        }
        let last_caught = match &snapshot.last {
            Some(last) => Some(self.member_view(last).await),
            None => None,
        };

        Ok(TeamView {
            trainer,
            pokedex,
            members,
            last_caught,
        })
    }

    async fn member_view(&mut self, member: &TeamMember) -> MemberView {
        let (species_name, sprite_url) = match self.dex.pokemon(member.species_id).await {
            Ok(pokemon) => (pokemon.display_name(), pokemon.sprite_url().to_string()),
            Err(error) => {
                tracing::warn!(
                    species_id = member.species_id,
                    error = %error,
                    "species lookup failed, using fallback name"
                );
                (format!("Species {}", member.species_id), String::new())
            }
        };

        let evolution = match self.dex.resolve_next(member.species_id).await {
            Ok(Evolution::Next(candidates)) => EvolutionView::Next(candidates),
            Ok(Evolution::Terminal) => EvolutionView::Terminal,
            Err(error) => {
                tracing::warn!(
                    species_id = member.species_id,
                    error = %error,
                    "evolution resolution failed"
                );
                EvolutionView::Unavailable
            }
        };

        MemberView {
            species_id: member.species_id,
            nickname: member.nickname.clone(),
            species_name,
            level: member.level,
            friendship: member.friendship(),
            is_egg: member.is_egg,
            sprite_url,
            evolution,
        }
    }

    /// Full Pokedex entry for a species, in the session language.
    pub async fn pokedex_entry(&mut self, species_id: u32) -> Result<PokedexEntry, ApiError> {
        let language = self.language.clone();
        self.dex.pokedex_entry(species_id, &language).await
    }

    /// Id -> name index over the first `limit` species.
    pub async fn species_names(&mut self, limit: u32) -> Result<Arc<SpeciesNameIndex>, ApiError> {
        self.dex.species_names(limit).await
    }

    /// Drive the session until the watcher's channels close.
    ///
    /// Reloads on every token; the watcher's first poll emits one, which
    /// is what produces the initial view. A failed reload is reported and
    /// the loop keeps going.
    pub async fn run<P: Presenter>(
        &mut self,
        mut reloads: mpsc::Receiver<()>,
        mut status: watch::Receiver<WatchStatus>,
        presenter: &mut P,
    ) {
        let mut reloads_open = true;
        let mut status_open = true;
        while reloads_open || status_open {
            tokio::select! {
                token = reloads.recv(), if reloads_open => {
                    match token {
                        Some(()) => self.reload_into(presenter).await,
                        None => reloads_open = false,
                    }
                }
                changed = status.changed(), if status_open => {
                    match changed {
                        Ok(()) => {
                            let current = status.borrow_and_update().clone();
                            presenter.show_status(&current);
                        }
                        Err(_) => status_open = false,
                    }
                }
            }
        }
        tracing::info!("watcher stopped, ending session");
    }

    async fn reload_into<P: Presenter>(&mut self, presenter: &mut P) {
        match self.reload().await {
            Ok(view) => presenter.show_team(&view),
            Err(error) => {
                tracing::warn!(error = %error, "reload failed, keeping previous view");
                presenter.show_reload_error(&error);
            }
        }
    }
}

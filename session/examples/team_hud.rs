//! Console Team HUD Example
//!
//! Watches a save file and prints the trainer card, Pokedex progress and
//! party with next-evolution hints on every save.
//!
//! Usage: team_hud <reader-project-dir> <save-file>

use anyhow::{Context, Result};
use pokehud_api::{ApiClient, DexStore};
use pokehud_save::watcher::WatchStatus;
use pokehud_save::{SaveWatcher, SnapshotError, SnapshotReader};
use pokehud_session::{EvolutionView, Presenter, Session, TeamView};

struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn show_team(&mut self, view: &TeamView) {
        println!("----------------------------------------");
        if let Some(trainer) = &view.trainer {
            println!(
                "{}  (TID {} / SID {})  ${}  {}",
                trainer.name, trainer.tid, trainer.sid, trainer.money, trainer.play_time
            );
        }
        if let Some(dex) = &view.pokedex {
            println!(
                "Pokedex: {} seen ({:.1}%), {} caught ({:.1}%)",
                dex.seen, dex.seen_percent, dex.caught, dex.caught_percent
            );
        }
        for member in &view.members {
            let level = member
                .level
                .map(|l| format!("Lv. {l}"))
                .unwrap_or_default();
            println!("  {} {}", member.title(), level);
            match &member.evolution {
                EvolutionView::Next(candidates) => {
                    for candidate in candidates {
                        println!(
                            "    -> {} ({})",
                            candidate.display_name, candidate.condition
                        );
                    }
                }
                EvolutionView::Terminal => println!("    final form"),
                EvolutionView::Unavailable => println!("    evolution data unavailable"),
            }
        }
        if let Some(last) = &view.last_caught {
            println!("Last caught: {}", last.title());
        }
    }

    fn show_status(&mut self, status: &WatchStatus) {
        match status {
            WatchStatus::Watching => println!("[watching save]"),
            WatchStatus::FileNotFound => println!("[save file not found]"),
            WatchStatus::Error(message) => println!("[watch error: {message}]"),
        }
    }

    fn show_reload_error(&mut self, error: &SnapshotError) {
        println!("[reload failed: {error}]");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let reader_project = args.next().context("missing reader project dir argument")?;
    let save_path = args.next().context("missing save file argument")?;

    let reader = SnapshotReader::dotnet(&reader_project, &save_path);
    let mut session = Session::new(reader, DexStore::new(ApiClient::new()));

    let (handle, reloads, status) = SaveWatcher::new(&save_path).spawn();
    let mut presenter = ConsolePresenter;
    session.run(reloads, status, &mut presenter).await;
    handle.stop().await;
    Ok(())
}

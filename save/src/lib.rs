pub mod reader;
pub mod snapshot;
pub mod watcher;

pub use reader::{SnapshotError, SnapshotReader};
pub use snapshot::{DexStatus, PokedexProgress, Snapshot, TeamMember, Trainer};
pub use watcher::{SaveWatcher, WatchConfig, WatchStatus, WatcherHandle};

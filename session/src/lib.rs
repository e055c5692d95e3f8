pub mod session;
pub mod view;

pub use session::{Presenter, Session};
pub use view::{DexProgress, EvolutionView, MemberView, TeamView, TrainerCard};

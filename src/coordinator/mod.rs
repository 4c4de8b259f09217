//! 播放协调：状态机、副作用、命令映射与 actor

mod actor;
mod commands;
mod effects;
mod machine;
mod snapshot;

pub use actor::{FOCUS_CLIENT_NAME, PlayerService, spawn_player};
pub use commands::{CommandSurface, dispatch};
pub use effects::{CoreEffect, CoreEffects, run_effects};
pub use machine::{Coordinator, CoordinatorConfig};
pub use snapshot::{PlaybackAction, PlaybackSnapshot, PlaybackState};

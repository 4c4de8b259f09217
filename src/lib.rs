//! 单曲目播放协调：播放队列、音频焦点仲裁与播放状态机。
//!
//! 入口是 [`coordinator::spawn_player`]：它把控制命令、焦点变化和 renderer 回调
//! 串行化到一个 actor 里，并把状态快照推送给调用方。

pub mod catalog;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod focus;
pub mod logging;
pub mod messages;
pub mod queue;
pub mod renderer;
pub mod settings;

pub use coordinator::{CommandSurface, PlaybackSnapshot, PlaybackState, PlayerService, spawn_player};
pub use error::{AppError, PlaybackError};

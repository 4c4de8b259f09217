//! 统一错误处理模块
//!
//! 每个关注点一个结构化错误类型；播放相关的失败在 Coordinator 边界被吸收，
//! 转换为 ERROR 状态与错误信息，不会向上传播为致命错误。

mod app;
mod catalog;
mod playback;
mod queue;
mod renderer;
mod settings;

pub use app::AppError;
pub use catalog::CatalogError;
pub use playback::PlaybackError;
pub use queue::QueueError;
pub use renderer::RendererError;
pub use settings::SettingsError;

//! 应用通用错误

use super::{CatalogError, PlaybackError, RendererError, SettingsError};

/// 应用通用错误类型（二进制入口使用）
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 设置错误
    #[error("设置错误: {0}")]
    Settings(#[from] SettingsError),

    /// 曲库错误
    #[error("曲库错误: {0}")]
    Catalog(#[from] CatalogError),

    /// 播放错误
    #[error("播放错误: {0}")]
    Playback(#[from] PlaybackError),

    /// 音频输出错误
    #[error("音频输出错误: {0}")]
    Renderer(#[from] RendererError),

    /// 其他错误
    #[error("{0}")]
    Other(String),
}

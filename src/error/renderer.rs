//! 音频输出设备（renderer）相关错误

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    /// 音源定位为空或无法识别
    #[error("无效的音源: {0:?}")]
    InvalidSource(String),

    /// 打开音频文件失败
    #[error("打开音频文件失败({path}): {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解码音频失败
    #[error("解码音频失败({path}): {message}")]
    Decode { path: PathBuf, message: String },

    /// 音频输出流创建失败
    #[error("创建音频输出流失败: {0}")]
    OutputStream(String),

    /// Seek 失败
    #[error("Seek 失败: {0}")]
    Seek(String),

    /// 输出设备线程已退出
    #[error("音频输出设备已关闭")]
    DeviceGone,
}

impl RendererError {
    /// 回调里上报的错误码（与 `RendererEvent::Error::code` 对应）
    pub fn code(&self) -> i32 {
        match self {
            RendererError::InvalidSource(_) => 1,
            RendererError::OpenFile { .. } => 2,
            RendererError::Decode { .. } => 3,
            RendererError::OutputStream(_) => 4,
            RendererError::Seek(_) => 5,
            RendererError::DeviceGone => 6,
        }
    }
}

//! 播放协调相关错误

use super::{QueueError, RendererError};
use crate::renderer::InstanceId;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// 系统拒绝了音频焦点请求
    #[error("Audio focus denied")]
    FocusDenied,

    /// 音源无法打开/准备
    #[error("音源加载失败: {0}")]
    RendererLoad(#[source] RendererError),

    /// 播放过程中的解码/设备错误
    #[error("播放错误 {code}: {message}")]
    RendererRuntime { code: i32, message: String },

    /// 已销毁的 renderer 实例的回调（只记录日志，永远不上报）
    #[error("过期的 renderer 事件: instance={0}")]
    StaleEvent(InstanceId),

    /// Coordinator 已关闭，命令无法送达
    #[error("播放服务已关闭")]
    CoordinatorClosed,

    /// 队列构建失败
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl PlaybackError {
    /// 交给 state sink 的错误信息
    pub fn user_message(&self) -> String {
        match self {
            PlaybackError::RendererRuntime { code, message } => {
                format!("MediaPlayer error {code} ({message})")
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_denied_message() {
        assert_eq!(PlaybackError::FocusDenied.user_message(), "Audio focus denied");
    }

    #[test]
    fn test_runtime_message() {
        let err = PlaybackError::RendererRuntime {
            code: 100,
            message: "device lost".to_owned(),
        };
        assert_eq!(err.user_message(), "MediaPlayer error 100 (device lost)");
    }

    #[test]
    fn test_queue_error_is_transparent() {
        let err = PlaybackError::from(QueueError::UnknownCategory("x".to_owned()));
        assert_eq!(err.to_string(), "不支持的分类类型: x");
    }
}

use std::sync::Arc;

use crate::coordinator::PlaybackSnapshot;
use crate::domain::{MediaId, TrackMetadata};
use crate::queue::QueueEntry;

/// 前台通知（foreground presentation）需要的信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSignal {
    PlaybackStarted,
    PlaybackStopped,
    /// 快照状态为 PLAYING / PAUSED 时发出
    NotificationRequired,
}

/// 推送给 session/UI 的事件
#[derive(Debug, Clone)]
pub enum SessionEvent {
    PlaybackState(Box<PlaybackSnapshot>),
    QueueUpdated {
        title: String,
        entries: Vec<QueueEntry>,
    },
    MetadataChanged(Arc<TrackMetadata>),
    /// 曲库里查不到当前条目的元数据
    MetadataError(MediaId),
    Notification(NotificationSignal),
}

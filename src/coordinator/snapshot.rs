use serde::Serialize;

use crate::focus::FocusState;
use crate::queue::QueueId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackState {
    Idle,
    Stopped,
    Buffering,
    Playing,
    Paused,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackAction {
    Play,
    PlayFromId,
    PlayFromSearch,
    SkipToPrevious,
    SkipToNext,
    Pause,
}

impl PlaybackAction {
    /// 任何状态下都可用的命令
    pub const ALWAYS: [PlaybackAction; 5] = [
        PlaybackAction::Play,
        PlaybackAction::PlayFromId,
        PlaybackAction::PlayFromSearch,
        PlaybackAction::SkipToPrevious,
        PlaybackAction::SkipToNext,
    ];

    /// PAUSE 只取决于 renderer 是否真的在出声，与逻辑状态无关
    pub fn available(renderer_playing: bool) -> Vec<PlaybackAction> {
        let mut actions = Self::ALWAYS.to_vec();
        if renderer_playing {
            actions.push(PlaybackAction::Pause);
        }
        actions
    }
}

/// 每次状态迁移后推送给 state sink 的快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub position_ms: u64,
    pub actions: Vec<PlaybackAction>,
    pub active_queue_id: Option<QueueId>,
    pub error_message: Option<String>,
    /// 以下两项供诊断/测试观察
    pub focus: FocusState,
    pub resume_on_focus_regain: bool,
}

impl PlaybackSnapshot {
    pub fn can(&self, action: PlaybackAction) -> bool {
        self.actions.contains(&action)
    }

    /// 带错误信息的快照对外一律呈现为 ERROR
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.state = PlaybackState::Error;
        self.error_message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_offered_only_while_rendering() {
        let idle = PlaybackAction::available(false);
        assert_eq!(idle.len(), 5);
        assert!(!idle.contains(&PlaybackAction::Pause));

        let playing = PlaybackAction::available(true);
        assert!(playing.contains(&PlaybackAction::Pause));
        assert!(playing.contains(&PlaybackAction::PlayFromSearch));
    }

    #[test]
    fn test_with_error_overrides_state() {
        let snap = PlaybackSnapshot {
            state: PlaybackState::Stopped,
            position_ms: 0,
            actions: PlaybackAction::available(false),
            active_queue_id: Some(QueueId(2)),
            error_message: None,
            focus: FocusState::None,
            resume_on_focus_regain: false,
        }
        .with_error("Cannot skip");
        assert_eq!(snap.state, PlaybackState::Error);
        assert_eq!(snap.error_message.as_deref(), Some("Cannot skip"));
        assert!(!snap.can(PlaybackAction::Pause));
    }

    #[test]
    fn test_snapshot_serializes_screaming_states() {
        let json = serde_json::to_string(&PlaybackState::Buffering).unwrap();
        assert_eq!(json, "\"BUFFERING\"");
    }
}

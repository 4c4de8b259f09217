use std::sync::Arc;
use tokio::sync::mpsc;

use super::PlaybackSnapshot;
use crate::domain::{MediaId, TrackMetadata};
use crate::messages::{NotificationSignal, SessionEvent};
use crate::queue::PlayQueue;

/// reducer 产出的副作用；状态迁移完成后统一派发
#[derive(Default)]
pub struct CoreEffects {
    pub(super) actions: Vec<CoreEffect>,
}

#[derive(Debug)]
pub enum CoreEffect {
    EmitState(Box<PlaybackSnapshot>),
    EmitQueue {
        title: String,
        entries: Vec<crate::queue::QueueEntry>,
    },
    EmitMetadata(Arc<TrackMetadata>),
    EmitMetadataError(MediaId),
    Notify(NotificationSignal),
}

impl CoreEffects {
    pub fn emit_state(&mut self, snapshot: PlaybackSnapshot) {
        self.actions.push(CoreEffect::EmitState(Box::new(snapshot)));
    }

    pub fn emit_queue(&mut self, queue: &PlayQueue) {
        self.actions.push(CoreEffect::EmitQueue {
            title: queue.title().to_owned(),
            entries: queue.entries().to_vec(),
        });
    }

    pub fn emit_metadata(&mut self, track: Arc<TrackMetadata>) {
        self.actions.push(CoreEffect::EmitMetadata(track));
    }

    pub fn emit_metadata_error(&mut self, media_id: MediaId) {
        self.actions.push(CoreEffect::EmitMetadataError(media_id));
    }

    pub fn notify(&mut self, signal: NotificationSignal) {
        self.actions.push(CoreEffect::Notify(signal));
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[CoreEffect] {
        &self.actions
    }

    /// 最近一次推送的快照
    pub fn last_state(&self) -> Option<&PlaybackSnapshot> {
        self.actions.iter().rev().find_map(|a| match a {
            CoreEffect::EmitState(s) => Some(s.as_ref()),
            _ => None,
        })
    }
}

impl CoreEffect {
    fn into_event(self) -> SessionEvent {
        match self {
            CoreEffect::EmitState(snapshot) => SessionEvent::PlaybackState(snapshot),
            CoreEffect::EmitQueue { title, entries } => SessionEvent::QueueUpdated { title, entries },
            CoreEffect::EmitMetadata(track) => SessionEvent::MetadataChanged(track),
            CoreEffect::EmitMetadataError(media_id) => SessionEvent::MetadataError(media_id),
            CoreEffect::Notify(signal) => SessionEvent::Notification(signal),
        }
    }
}

pub async fn run_effects(effects: CoreEffects, tx_evt: &mpsc::Sender<SessionEvent>) {
    for effect in effects.actions {
        if let Err(e) = tx_evt.send(effect.into_event()).await {
            tracing::debug!(err = %e, "state sink 已关闭，丢弃事件");
            break;
        }
    }
}

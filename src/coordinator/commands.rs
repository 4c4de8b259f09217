use tokio::sync::mpsc;

use super::{Coordinator, CoreEffects};
use crate::domain::MediaId;
use crate::error::PlaybackError;
use crate::messages::{Extras, TransportCommand};
use crate::queue::QueueId;

/// 传输命令到 Coordinator 操作的一一映射；返回 true 表示 actor 应退出
pub fn dispatch(cmd: TransportCommand, coordinator: &mut Coordinator, effects: &mut CoreEffects) -> bool {
    tracing::debug!(?cmd, "收到传输命令");
    match cmd {
        TransportCommand::Play => coordinator.play(effects),
        TransportCommand::PlayFromId { media_id, extras } => {
            if !extras.is_empty() {
                tracing::trace!(?extras, "play_from_id extras");
            }
            coordinator.play_from_id(&media_id, effects);
        }
        TransportCommand::PlayFromSearch { query, extras } => {
            if !extras.is_empty() {
                tracing::trace!(?extras, "play_from_search extras");
            }
            coordinator.play_from_search(&query, effects);
        }
        TransportCommand::SkipToQueueItem(queue_id) => coordinator.skip_to_queue_item(queue_id, effects),
        TransportCommand::Pause => coordinator.pause(effects),
        TransportCommand::SkipNext => coordinator.skip(1, effects),
        TransportCommand::SkipPrevious => coordinator.skip(-1, effects),
        TransportCommand::Stop => coordinator.stop(effects),
        TransportCommand::SeekTo(position_ms) => coordinator.seek_to(position_ms, effects),
        TransportCommand::Shutdown => {
            coordinator.shutdown(effects);
            return true;
        }
    }
    false
}

/// 命令入口，可 clone 给多个控制端
#[derive(Debug, Clone)]
pub struct CommandSurface {
    tx: mpsc::Sender<TransportCommand>,
}

impl CommandSurface {
    pub(super) fn new(tx: mpsc::Sender<TransportCommand>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, cmd: TransportCommand) -> Result<(), PlaybackError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| PlaybackError::CoordinatorClosed)
    }

    pub async fn play(&self) -> Result<(), PlaybackError> {
        self.send(TransportCommand::Play).await
    }

    pub async fn play_from_id(&self, media_id: MediaId, extras: Extras) -> Result<(), PlaybackError> {
        self.send(TransportCommand::PlayFromId { media_id, extras }).await
    }

    pub async fn play_from_search(
        &self,
        query: impl Into<String>,
        extras: Extras,
    ) -> Result<(), PlaybackError> {
        self.send(TransportCommand::PlayFromSearch {
            query: query.into(),
            extras,
        })
        .await
    }

    pub async fn skip_to_queue_item(&self, queue_id: QueueId) -> Result<(), PlaybackError> {
        self.send(TransportCommand::SkipToQueueItem(queue_id)).await
    }

    pub async fn pause(&self) -> Result<(), PlaybackError> {
        self.send(TransportCommand::Pause).await
    }

    pub async fn skip_next(&self) -> Result<(), PlaybackError> {
        self.send(TransportCommand::SkipNext).await
    }

    pub async fn skip_previous(&self) -> Result<(), PlaybackError> {
        self.send(TransportCommand::SkipPrevious).await
    }

    pub async fn stop(&self) -> Result<(), PlaybackError> {
        self.send(TransportCommand::Stop).await
    }

    pub async fn seek_to(&self, position_ms: u64) -> Result<(), PlaybackError> {
        self.send(TransportCommand::SeekTo(position_ms)).await
    }
}

use std::collections::BTreeMap;

use crate::domain::MediaId;
use crate::queue::QueueId;

/// 控制端附带的额外参数，原样记录，不影响播放
pub type Extras = BTreeMap<String, String>;

/// 控制端（会话协议 / REPL）下发的传输命令
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCommand {
    Play,
    PlayFromId { media_id: MediaId, extras: Extras },
    PlayFromSearch { query: String, extras: Extras },
    SkipToQueueItem(QueueId),
    Pause,
    SkipNext,
    SkipPrevious,
    Stop,
    SeekTo(u64),
    /// 停止播放并退出 actor
    Shutdown,
}

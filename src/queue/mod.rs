mod builder;
mod play_queue;

pub use builder::{queue_from_media_id, queue_from_search, random_queue};
pub use play_queue::{PlayQueue, QueueEntry, QueueId};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::domain::{CategoryType, MediaId, TrackMetadata};
use crate::error::QueueError;

/// 队列内唯一、单调分配的 id；同一队列生命周期内不会复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueId(pub u64);

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub queue_id: QueueId,
    /// 带分类层次的 media id，控制端据此判断队列来自哪个浏览列表
    pub media_id: MediaId,
    pub track: Arc<TrackMetadata>,
}

/// 有序播放队列 + 当前位置游标
///
/// 只会被整体重建（选择新的分类/搜索结果）或移动游标，播放过程中不做局部插入删除。
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    title: String,
    entries: Vec<QueueEntry>,
    current: Option<usize>,
}

impl PlayQueue {
    /// 按迭代顺序从 0 开始分配 queue id；没有任何曲目时返回 `EmptyCategory`
    pub fn build(
        category_type: &CategoryType,
        category_value: &str,
        tracks: impl IntoIterator<Item = Arc<TrackMetadata>>,
    ) -> Result<Self, QueueError> {
        let entries: Vec<QueueEntry> = tracks
            .into_iter()
            .zip(0u64..)
            .map(|(track, n)| QueueEntry {
                queue_id: QueueId(n),
                media_id: MediaId::for_track(&track.id, category_type, category_value),
                track,
            })
            .collect();
        if entries.is_empty() {
            return Err(QueueError::EmptyCategory {
                category_type: category_type.to_string(),
                category_value: category_value.to_owned(),
            });
        }
        tracing::debug!(
            category_type = %category_type,
            category_value,
            len = entries.len(),
            "播放队列已构建"
        );
        Ok(Self {
            title: category_value.to_owned(),
            entries,
            current: Some(0),
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current.filter(|&i| i < self.entries.len())
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.current_index().and_then(|i| self.entries.get(i))
    }

    pub fn is_index_playable(&self, index: isize) -> bool {
        usize::try_from(index).is_ok_and(|i| i < self.entries.len())
    }

    pub fn set_current_index(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.current = Some(index);
        true
    }

    /// 游标移动 `delta`；不回绕，目标不可播放时返回 false 且游标不变
    pub fn skip(&mut self, delta: isize) -> bool {
        let from = self
            .current_index()
            .and_then(|i| isize::try_from(i).ok())
            .unwrap_or(-1);
        let target = from.saturating_add(delta);
        if !self.is_index_playable(target) {
            return false;
        }
        self.current = usize::try_from(target).ok();
        true
    }

    pub fn seek_to_id(&mut self, queue_id: QueueId) -> bool {
        match self.index_of_queue_id(queue_id) {
            Some(idx) => self.set_current_index(idx),
            None => false,
        }
    }

    pub fn seek_to_media(&mut self, media_id: &MediaId) -> bool {
        match self.index_of_media(media_id) {
            Some(idx) => self.set_current_index(idx),
            None => false,
        }
    }

    pub fn index_of_media(&self, media_id: &MediaId) -> Option<usize> {
        self.entries.iter().position(|e| &e.media_id == media_id)
    }

    pub fn index_of_queue_id(&self, queue_id: QueueId) -> Option<usize> {
        self.entries.iter().position(|e| e.queue_id == queue_id)
    }

    /// `media_id` 是否与当前曲目属于同一浏览分类（可直接复用队列）
    pub fn is_same_category(&self, media_id: &MediaId) -> bool {
        self.current()
            .is_some_and(|e| e.media_id.is_same_category(media_id))
    }
}

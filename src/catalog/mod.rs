//! 曲库（catalog）协作者接口
//!
//! 播放核心只通过 [`Catalog`] 读取曲目：按 id 查询元数据，或按浏览分类惰性遍历。

mod memory;

use std::sync::Arc;

use crate::domain::{CategoryType, TrackMetadata};
use crate::error::QueueError;

pub use memory::MemoryCatalog;

pub type TrackIter<'a> = Box<dyn Iterator<Item = Arc<TrackMetadata>> + Send + 'a>;

pub trait Catalog: Send + Sync {
    fn lookup(&self, track_id: &str) -> Option<Arc<TrackMetadata>>;

    /// 按分类遍历曲目；`Search` 分类的 value 即查询词
    fn iterate_by_category(
        &self,
        category_type: &CategoryType,
        category_value: &str,
    ) -> Result<TrackIter<'_>, QueueError>;

    fn all_tracks(&self) -> Vec<Arc<TrackMetadata>>;

    /// 某一分类类型下的全部取值（去重、保持首次出现顺序）
    fn categories(&self, category_type: &CategoryType) -> Vec<String>;
}

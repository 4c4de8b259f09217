use serde::{Deserialize, Serialize};

/// 曲目元数据，由 catalog 持有；队列只保存只读引用（`Arc<TrackMetadata>`）
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub id: String,
    pub title: String,
    pub album: String,
    pub artist: String,
    #[serde(default)]
    pub genre: String,
    /// 音源定位（本地路径或 `file://` URL）
    pub source: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub total_track_count: Option<u32>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl TrackMetadata {
    pub fn display_title(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.artist, self.title)
        }
    }
}

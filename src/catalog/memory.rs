use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::{Catalog, TrackIter};
use crate::domain::{CategoryType, TrackMetadata};
use crate::error::{CatalogError, QueueError};

/// 曲库文件格式：`{"music": [ ... ]}`
#[derive(Debug, Deserialize)]
struct CatalogFile {
    music: Vec<CatalogTrackDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogTrackDto {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    album: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    genre: String,
    source: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    track_number: Option<u32>,
    #[serde(default)]
    total_track_count: Option<u32>,
    /// 毫秒
    #[serde(default)]
    duration: Option<u64>,
}

/// 内存曲库，保持文件中的曲目顺序
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tracks: Vec<Arc<TrackMetadata>>,
    by_id: HashMap<String, usize>,
}

impl MemoryCatalog {
    pub fn new(tracks: Vec<TrackMetadata>) -> Self {
        let tracks: Vec<Arc<TrackMetadata>> = tracks.into_iter().map(Arc::new).collect();
        let mut by_id = HashMap::with_capacity(tracks.len());
        for (idx, t) in tracks.iter().enumerate() {
            if by_id.insert(t.id.clone(), idx).is_some() {
                tracing::warn!(track_id = %t.id, "曲库中存在重复的曲目 id，后者覆盖前者");
            }
        }
        Self { tracks, by_id }
    }

    /// 解析 JSON 曲库；相对路径的 `source` 以 `base_dir` 为基准
    pub fn from_json_str(json: &str, base_dir: Option<&Path>) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let tracks = file
            .music
            .into_iter()
            .enumerate()
            .map(|(idx, dto)| {
                let source = match base_dir {
                    Some(dir) if !dto.source.contains("://") && Path::new(&dto.source).is_relative() => {
                        dir.join(&dto.source).to_string_lossy().into_owned()
                    }
                    _ => dto.source,
                };
                TrackMetadata {
                    id: dto.id.unwrap_or_else(|| (idx + 1).to_string()),
                    title: dto.title,
                    album: dto.album,
                    artist: dto.artist,
                    genre: dto.genre,
                    source,
                    image: dto.image,
                    track_number: dto.track_number,
                    total_track_count: dto.total_track_count,
                    duration_ms: dto.duration,
                }
            })
            .collect();
        Ok(Self::new(tracks))
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&json, path.parent())?;
        tracing::info!(path = %path.display(), tracks = catalog.len(), "曲库已加载");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

fn matches_query(track: &TrackMetadata, query: &str) -> bool {
    [&track.title, &track.artist, &track.album, &track.genre]
        .iter()
        .any(|field| field.to_lowercase().contains(query))
}

impl Catalog for MemoryCatalog {
    fn lookup(&self, track_id: &str) -> Option<Arc<TrackMetadata>> {
        self.by_id
            .get(track_id)
            .and_then(|&idx| self.tracks.get(idx))
            .cloned()
    }

    fn iterate_by_category(
        &self,
        category_type: &CategoryType,
        category_value: &str,
    ) -> Result<TrackIter<'_>, QueueError> {
        let value = category_value.to_owned();
        let tracks = self.tracks.iter();
        match category_type {
            CategoryType::Album => Ok(Box::new(tracks.filter(move |t| t.album == value).cloned())),
            CategoryType::Genre => Ok(Box::new(tracks.filter(move |t| t.genre == value).cloned())),
            CategoryType::Artist => {
                Ok(Box::new(tracks.filter(move |t| t.artist == value).cloned()))
            }
            CategoryType::Search => {
                let query = value.trim().to_lowercase();
                Ok(Box::new(
                    tracks
                        .filter(move |t| !query.is_empty() && matches_query(t, &query))
                        .cloned(),
                ))
            }
            other => Err(QueueError::UnknownCategory(other.to_string())),
        }
    }

    fn all_tracks(&self) -> Vec<Arc<TrackMetadata>> {
        self.tracks.clone()
    }

    fn categories(&self, category_type: &CategoryType) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for t in &self.tracks {
            let value = match category_type {
                CategoryType::Album => &t.album,
                CategoryType::Genre => &t.genre,
                CategoryType::Artist => &t.artist,
                _ => return Vec::new(),
            };
            if !value.is_empty() && !out.contains(value) {
                out.push(value.clone());
            }
        }
        out
    }
}

//! 从曲库构建播放队列

use rand::seq::SliceRandom;

use super::PlayQueue;
use crate::catalog::Catalog;
use crate::domain::{CategoryType, MediaId};
use crate::error::QueueError;

const RANDOM_CATEGORY_VALUE: &str = "shuffle";

/// 由带层次的 media id 构建队列；若 id 带有曲目，游标定位到该曲目（不存在则为 0）
pub fn queue_from_media_id(
    media_id: &MediaId,
    catalog: &dyn Catalog,
) -> Result<PlayQueue, QueueError> {
    let (category_type, category_value) = media_id.category()?;
    tracing::debug!(%media_id, "为 media id 创建播放队列");
    let tracks = catalog.iterate_by_category(&category_type, category_value)?;
    let mut queue = PlayQueue::build(&category_type, category_value, tracks)?
        .with_title(queue_title(&category_type, category_value));
    if media_id.track_id().is_some() && !queue.seek_to_media(media_id) {
        tracing::debug!(%media_id, "请求的曲目不在新队列中，从头开始");
    }
    Ok(queue)
}

pub fn queue_from_search(query: &str, catalog: &dyn Catalog) -> Result<PlayQueue, QueueError> {
    let category_type = CategoryType::Search;
    let tracks = catalog.iterate_by_category(&category_type, query)?;
    Ok(PlayQueue::build(&category_type, query, tracks)?.with_title(queue_title(&category_type, query)))
}

/// 从整个曲库随机挑选至多 `size` 首
pub fn random_queue(catalog: &dyn Catalog, size: usize) -> Result<PlayQueue, QueueError> {
    let all = catalog.all_tracks();
    let picked: Vec<_> = all
        .choose_multiple(&mut rand::thread_rng(), size)
        .cloned()
        .collect();
    Ok(
        PlayQueue::build(&CategoryType::Random, RANDOM_CATEGORY_VALUE, picked)?
            .with_title(queue_title(&CategoryType::Random, RANDOM_CATEGORY_VALUE)),
    )
}

fn queue_title(category_type: &CategoryType, category_value: &str) -> String {
    match category_type {
        CategoryType::Search => format!("Search results for \"{category_value}\""),
        CategoryType::Random => "Random music".to_owned(),
        _ => category_value.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::domain::TrackMetadata;

    fn catalog() -> MemoryCatalog {
        let mk = |id: &str, album: &str| TrackMetadata {
            id: id.to_owned(),
            title: format!("Song {id}"),
            album: album.to_owned(),
            artist: "Band".to_owned(),
            source: format!("/m/{id}.mp3"),
            ..Default::default()
        };
        MemoryCatalog::new(vec![mk("1", "A"), mk("2", "A"), mk("3", "B"), mk("4", "A")])
    }

    #[test]
    fn test_queue_from_media_id_positions_cursor() {
        let c = catalog();
        let id: MediaId = "__BY_ALBUM__/A|4".parse().unwrap();
        let q = queue_from_media_id(&id, &c).unwrap();
        assert_eq!(q.len(), 3);
        assert_eq!(q.title(), "A");
        assert_eq!(q.current().unwrap().track.id, "4");
        assert_eq!(q.current().unwrap().queue_id.0, 2);
    }

    #[test]
    fn test_queue_from_media_id_missing_track_starts_at_zero() {
        let c = catalog();
        let id: MediaId = "__BY_ALBUM__/A|3".parse().unwrap();
        let q = queue_from_media_id(&id, &c).unwrap();
        assert_eq!(q.current_index(), Some(0));
    }

    #[test]
    fn test_queue_from_media_id_errors() {
        let c = catalog();
        let bad: MediaId = "__BY_ALBUM__|1".parse().unwrap();
        assert!(matches!(
            queue_from_media_id(&bad, &c),
            Err(QueueError::InvalidMediaId(_))
        ));
        let empty: MediaId = "__BY_ALBUM__/Z|1".parse().unwrap();
        assert!(matches!(
            queue_from_media_id(&empty, &c),
            Err(QueueError::EmptyCategory { .. })
        ));
    }

    #[test]
    fn test_search_and_random_queues() {
        let c = catalog();
        let q = queue_from_search("song 3", &c).unwrap();
        assert_eq!(q.len(), 1);
        assert_eq!(q.title(), "Search results for \"song 3\"");

        let r = random_queue(&c, 10).unwrap();
        assert_eq!(r.len(), 4);
        assert_eq!(r.title(), "Random music");
        let r = random_queue(&c, 2).unwrap();
        assert_eq!(r.len(), 2);

        assert!(random_queue(&MemoryCatalog::default(), 10).is_err());
    }
}

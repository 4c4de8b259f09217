use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QueueError;

const CATEGORY_SEPARATOR: char = '/';
const LEAF_SEPARATOR: char = '|';

/// Browsing category a queue was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Album,
    Genre,
    Artist,
    Search,
    Random,
    /// Forward-compatible/custom categories.
    Other(String),
}

impl CategoryType {
    pub fn as_str(&self) -> &str {
        match self {
            CategoryType::Album => "__BY_ALBUM__",
            CategoryType::Genre => "__BY_GENRE__",
            CategoryType::Artist => "__BY_ARTIST__",
            CategoryType::Search => "__BY_SEARCH__",
            CategoryType::Random => "__RANDOM__",
            CategoryType::Other(v) => v,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "__BY_ALBUM__" | "album" => CategoryType::Album,
            "__BY_GENRE__" | "genre" => CategoryType::Genre,
            "__BY_ARTIST__" | "artist" => CategoryType::Artist,
            "__BY_SEARCH__" | "search" => CategoryType::Search,
            "__RANDOM__" | "random" => CategoryType::Random,
            other => CategoryType::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hierarchy-aware media id: `<category path>|<track id>`.
///
/// The category path is joined with `/` (e.g. `__BY_ALBUM__/Kind of Blue`), so a
/// controller can tell which browsing list a queue entry was generated from.
/// Either part may be absent: a bare category (`__BY_GENRE__/Jazz`) is browsable,
/// a bare track id (`|42`) is a plain catalog reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaId {
    hierarchy: Vec<String>,
    track_id: Option<String>,
}

impl MediaId {
    pub fn new(track_id: Option<&str>, categories: &[&str]) -> Self {
        Self {
            hierarchy: categories.iter().map(|c| (*c).to_owned()).collect(),
            track_id: track_id.map(str::to_owned),
        }
    }

    pub fn for_track(track_id: &str, category_type: &CategoryType, category_value: &str) -> Self {
        Self::new(Some(track_id), &[category_type.as_str(), category_value])
    }

    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    pub fn track_id(&self) -> Option<&str> {
        self.track_id.as_deref()
    }

    /// `(category_type, category_value)`；只有两级层次的 id 才能用来构建队列
    pub fn category(&self) -> Result<(CategoryType, &str), QueueError> {
        match self.hierarchy.as_slice() {
            [ty, value] => Ok((CategoryType::parse(ty), value.as_str())),
            _ => Err(QueueError::InvalidMediaId(self.to_string())),
        }
    }

    pub fn is_same_category(&self, other: &MediaId) -> bool {
        self.hierarchy == other.hierarchy
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, category) in self.hierarchy.iter().enumerate() {
            if i > 0 {
                write!(f, "{CATEGORY_SEPARATOR}")?;
            }
            f.write_str(category)?;
        }
        if let Some(track_id) = &self.track_id {
            write!(f, "{LEAF_SEPARATOR}{track_id}")?;
        }
        Ok(())
    }
}

impl FromStr for MediaId {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, track_id) = match s.split_once(LEAF_SEPARATOR) {
            Some((path, leaf)) => (path, Some(leaf)),
            None => (s, None),
        };
        if track_id.is_some_and(|id| id.is_empty() || id.contains(LEAF_SEPARATOR)) {
            return Err(QueueError::InvalidMediaId(s.to_owned()));
        }
        let hierarchy: Vec<String> = if path.is_empty() {
            Vec::new()
        } else {
            path.split(CATEGORY_SEPARATOR).map(str::to_owned).collect()
        };
        if hierarchy.iter().any(String::is_empty) || (hierarchy.is_empty() && track_id.is_none())
        {
            return Err(QueueError::InvalidMediaId(s.to_owned()));
        }
        Ok(Self {
            hierarchy,
            track_id: track_id.map(str::to_owned),
        })
    }
}

impl TryFrom<String> for MediaId {
    type Error = QueueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MediaId> for String {
    fn from(value: MediaId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_id_format_and_parse() {
        let id = MediaId::for_track("42", &CategoryType::Album, "Kind of Blue");
        assert_eq!(id.to_string(), "__BY_ALBUM__/Kind of Blue|42");

        let back: MediaId = "__BY_ALBUM__/Kind of Blue|42".parse().unwrap();
        assert_eq!(back, id);
        assert_eq!(back.track_id(), Some("42"));
        let (ty, value) = back.category().unwrap();
        assert_eq!(ty, CategoryType::Album);
        assert_eq!(value, "Kind of Blue");
    }

    #[test]
    fn test_browsable_and_bare_ids() {
        let category: MediaId = "__BY_GENRE__/Jazz".parse().unwrap();
        assert_eq!(category.track_id(), None);
        assert_eq!(category.hierarchy().len(), 2);

        let bare: MediaId = "|7".parse().unwrap();
        assert!(bare.hierarchy().is_empty());
        assert!(matches!(
            bare.category(),
            Err(QueueError::InvalidMediaId(_))
        ));
    }

    #[test]
    fn test_invalid_media_ids() {
        for bad in ["", "|", "a//b|1", "__BY_ALBUM__/x|", "a|b|c"] {
            assert!(bad.parse::<MediaId>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_same_category() {
        let a = MediaId::for_track("1", &CategoryType::Genre, "Rock");
        let b = MediaId::for_track("2", &CategoryType::Genre, "Rock");
        let c = MediaId::for_track("1", &CategoryType::Genre, "Pop");
        assert!(a.is_same_category(&b));
        assert!(!a.is_same_category(&c));
    }

    #[test]
    fn test_media_id_serde_as_string() {
        let id = MediaId::for_track("3", &CategoryType::Search, "blue");
        let s = serde_json::to_string(&id).unwrap();
        assert_eq!(s, "\"__BY_SEARCH__/blue|3\"");
        let back: MediaId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, id);
    }
}

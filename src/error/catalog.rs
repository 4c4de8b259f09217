//! 曲库加载相关错误

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// 读取曲库文件失败
    #[error("读取曲库文件失败({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 曲库 JSON 解析失败
    #[error("曲库 JSON 解析失败: {0}")]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = CatalogError::Io {
            path: PathBuf::from("/tmp/music.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/music.json"));
        assert!(msg.contains("missing"));
    }
}

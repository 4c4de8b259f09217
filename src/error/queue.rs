//! 播放队列相关错误

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// 分类下没有任何曲目，无法构建队列
    #[error("分类为空，无法构建播放队列: {category_type}/{category_value}")]
    EmptyCategory {
        category_type: String,
        category_value: String,
    },

    /// media id 格式错误，或层次结构不是 `<type>/<value>`
    #[error("无效的 media id: {0:?}")]
    InvalidMediaId(String),

    /// 曲库不支持的分类类型
    #[error("不支持的分类类型: {0}")]
    UnknownCategory(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_category_display() {
        let err = QueueError::EmptyCategory {
            category_type: "__BY_ALBUM__".to_owned(),
            category_value: "Nothing".to_owned(),
        };
        assert!(err.to_string().contains("__BY_ALBUM__/Nothing"));
    }
}

//! 设置文件相关错误

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// 写入 settings.json 失败
    #[error("保存设置失败({path}): {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// settings.json 不是合法 JSON
    #[error("设置文件格式错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 取值超出范围
    #[error("设置值无效: {0}")]
    InvalidValue(String),
}

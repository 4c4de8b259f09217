use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "queue-player",
    version,
    about = "本地曲库播放器：播放队列 + 音频焦点 + 播放状态机"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// 覆盖数据目录（默认走系统 data_local_dir）
    #[arg(long, env = "QUEUE_PLAYER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// 覆盖日志目录（默认 `{data_dir}/logs`）
    #[arg(long, env = "QUEUE_PLAYER_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// 覆盖日志过滤（等价于设置 RUST_LOG）
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    /// 曲库文件（默认 `{data_dir}/music.json`）
    #[arg(long, env = "QUEUE_PLAYER_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// 不打开音频设备，使用静音后端
    #[arg(long, env = "QUEUE_PLAYER_NO_AUDIO")]
    pub no_audio: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 交互式控制台（默认）
    Repl,

    /// 播放一个分类直到队列结束
    Play {
        /// album / artist / genre / search
        category_type: String,

        category_value: String,
    },

    /// 列出曲库中的分类
    Catalog,
}

pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("dev", "queue-player", "queue-player")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("queue-player"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_subcommand() {
        let cli = Cli::try_parse_from(["queue-player", "--no-audio", "play", "album", "Blue"]).unwrap();
        assert!(cli.no_audio);
        match cli.command {
            Some(Command::Play {
                category_type,
                category_value,
            }) => {
                assert_eq!(category_type, "album");
                assert_eq!(category_value, "Blue");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["queue-player", "--catalog", "/tmp/music.json"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.catalog, Some(PathBuf::from("/tmp/music.json")));
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "queue-player.log";
const DEFAULT_FILTER: &str = "info,symphonia=warn";

/// 持有 non_blocking writer，drop 时刷盘
pub struct LogGuard(#[allow(dead_code)] Option<WorkerGuard>);

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub dir: Option<PathBuf>,
    pub filter: Option<String>,
}

/// 日志目录：显式配置优先，其次 `{data_dir}/logs`，都不可写时落到临时目录
pub fn resolve_log_dir(data_dir: &Path, dir: Option<PathBuf>) -> PathBuf {
    let log_dir = dir.unwrap_or_else(|| data_dir.join("logs"));
    match fs::create_dir_all(&log_dir) {
        Ok(()) => log_dir,
        Err(_) => std::env::temp_dir().join("queue-player-logs"),
    }
}

fn build_filter(filter: Option<String>) -> EnvFilter {
    match filter {
        Some(s) if !s.trim().is_empty() => EnvFilter::new(s),
        _ => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    }
}

pub fn init(data_dir: &Path, cfg: LogConfig) -> LogGuard {
    let log_dir = resolve_log_dir(data_dir, cfg.dir);
    let _ = fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer);

    let subscriber = tracing_subscriber::registry()
        .with(build_filter(cfg.filter))
        .with(file_layer);

    let _ = subscriber.try_init();
    tracing::info!(log_dir = %log_dir.display(), "tracing 已初始化");

    LogGuard(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_dir_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = resolve_log_dir(dir.path(), None);
        assert_eq!(log_dir, dir.path().join("logs"));
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_explicit_log_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("custom");
        assert_eq!(resolve_log_dir(dir.path(), Some(custom.clone())), custom);
    }

    #[test]
    fn test_init_writes_into_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let guard = init(
            dir.path(),
            LogConfig {
                dir: None,
                filter: Some("debug".to_owned()),
            },
        );
        drop(guard);
        assert!(dir.path().join("logs").is_dir());
    }
}

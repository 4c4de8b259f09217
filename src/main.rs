mod cli;
mod repl;

use clap::Parser;
use std::sync::Arc;

use cli::{Cli, Command};
use queue_player::catalog::{Catalog, MemoryCatalog};
use queue_player::domain::CategoryType;
use queue_player::error::AppError;
use queue_player::focus::FocusHub;
use queue_player::renderer::{AudioBackend, open_factory};
use queue_player::{logging, settings, spawn_player};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(cli::default_data_dir);

    let _log_guard = logging::init(
        &data_dir,
        logging::LogConfig {
            dir: cli.log_dir.clone(),
            filter: cli.log_filter.clone(),
        },
    );
    tracing::info!(data_dir = %data_dir.display(), "queue-player 启动");

    let player_settings = settings::load_settings(&data_dir);

    let catalog_path = cli
        .catalog
        .clone()
        .unwrap_or_else(|| data_dir.join("music.json"));
    let catalog = if catalog_path.exists() {
        MemoryCatalog::load(&catalog_path)?
    } else {
        tracing::warn!(path = %catalog_path.display(), "曲库文件不存在，使用空曲库");
        MemoryCatalog::new(Vec::new())
    };

    let command = cli.command.unwrap_or(Command::Repl);
    if let Command::Catalog = command {
        for ty in [CategoryType::Album, CategoryType::Artist, CategoryType::Genre] {
            println!("{ty}:");
            for value in catalog.categories(&ty) {
                println!("  {value}");
            }
        }
        return Ok(());
    }

    let backend = if cli.no_audio {
        AudioBackend::Null
    } else {
        AudioBackend::Real
    };
    let factory = match open_factory(backend, player_settings.null_track_ms) {
        Ok(f) => f,
        Err(e) if backend == AudioBackend::Real => {
            tracing::warn!(err = %e, "音频设备不可用，回退到静音后端");
            open_factory(AudioBackend::Null, player_settings.null_track_ms)?
        }
        Err(e) => return Err(e.into()),
    };

    let hub = FocusHub::new();
    let service = spawn_player(Arc::new(catalog), factory, &hub, &player_settings);

    match command {
        Command::Play {
            category_type,
            category_value,
        } => repl::play_to_end(service, &category_type, &category_value).await,
        Command::Repl | Command::Catalog => repl::run(service, hub).await,
    }
}

use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use chat_narrow::application::{LoadNarrowUseCase, MessageListDataCache};
use chat_narrow::domain::Filter;
use chat_narrow::infrastructure::{AppConfig, CliArgs, ConfigStore, RealmSnapshot};
use chat_narrow::presentation::{render_filter, render_messages};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = ConfigStore::resolve(args.config.as_deref())?.load()?;
    config.merge_with_args(args);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = chat_narrow::VERSION, "Starting {}", chat_narrow::NAME);

    let mut realm = RealmSnapshot::load(&args.snapshot).await?.into_realm()?;
    realm.apply_settings(&config.realm.to_settings());

    let filter = Filter::parse(&args.query_text(), realm.context().clone());
    print!("{}", render_filter(&filter));
    if args.describe {
        return Ok(());
    }

    let cache = Arc::new(MessageListDataCache::new(config.cache.capacity));
    let use_case = LoadNarrowUseCase::new(Arc::new(realm.message_source()), cache)
        .with_window(config.fetch.num_before, config.fetch.num_after);

    let mld = use_case.execute(filter, args.anchor).await?;
    print!("{}", render_messages(&mld.read()));

    Ok(())
}

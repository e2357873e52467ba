use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod catalog;
mod cli;
mod config;
mod extract;
mod recommender;
mod semantic;
#[cfg(test)]
mod tests;
mod web;

use app::{App, RecommendRequest};
use config::Config;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    let mut config = Config::load().context("failed to load config")?;

    match args.command {
        cli::Command::Daemon { listen } => {
            if let Some(listen) = listen {
                config.server.listen = listen;
            }
            let addr = config.listen_addr()?;

            // the catalog must be embedded before the listener binds
            let app = App::init(&config)?;
            web::start_daemon(app, addr)
        }

        cli::Command::Recommend {
            query,
            url,
            threshold,
            limit,
        } => {
            let app = App::init(&config)?;
            let response = app.recommend(RecommendRequest {
                query,
                url,
                threshold,
                limit,
            })?;

            if response.results.is_empty() {
                log::info!("no assessment scored above the threshold");
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }

        cli::Command::Catalog {} => {
            let items = catalog::resolve(config.catalog_path.as_deref())?;
            catalog::validate(&items)?;
            println!("{}", serde_json::to_string_pretty(&items)?);
            Ok(())
        }
    }
}

// Module declarations
mod cli;
mod config;
mod util;
mod error;
mod normalize;
mod source;
mod catalog;
mod resolver;
mod server;

// Crate-root re-exports so modules can `use crate::{...}` each other's items directly.
#[allow(unused_imports)]
pub(crate) use cli::*;
#[allow(unused_imports)]
pub(crate) use config::*;
#[allow(unused_imports)]
pub(crate) use util::*;
#[allow(unused_imports)]
pub(crate) use error::*;
#[allow(unused_imports)]
pub(crate) use normalize::*;
#[allow(unused_imports)]
pub(crate) use source::*;
#[allow(unused_imports)]
pub(crate) use catalog::*;
#[allow(unused_imports)]
pub(crate) use resolver::*;
#[allow(unused_imports)]
pub(crate) use server::*;

use std::sync::Arc;

use clap::Parser;
use env_logger::Env;
use log::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            bind,
            port,
            workers,
            cache,
            static_dir,
        } => {
            let config = AppConfig::from_env(cache)?;
            let source = pokeapi_source(&config);
            let (catalog, origin) = load_catalog(&config.cache_file, source.as_ref())?;
            info!(
                "catalog ready: {} species ({})",
                catalog.len(),
                match origin {
                    CatalogOrigin::Snapshot => "snapshot",
                    CatalogOrigin::Remote => "remote",
                }
            );
            let state = AppState {
                catalog: Arc::new(catalog),
                source,
                sprite_template: config.sprite_template,
                static_dir,
            };
            run_server(&bind, port, workers, state)
        }

        Command::Lookup {
            name,
            direction,
            cache,
        } => {
            let config = AppConfig::from_env(cache)?;
            let source = pokeapi_source(&config);
            let (catalog, _) = load_catalog(&config.cache_file, source.as_ref())?;
            let directions = match direction {
                Some(d) => vec![d],
                None => vec![Direction::Predecessor, Direction::Successor],
            };

            let results = directions
                .into_iter()
                .map(|direction| {
                    resolve_neighbor(
                        &name,
                        direction,
                        &catalog,
                        source.as_ref(),
                        config.sprite_template.as_deref(),
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;
            let merged = merge_results(&results);
            println!("{}", serde_json::to_string_pretty(&merged)?);
            Ok(())
        }

        Command::Refresh { cache } => {
            let config = AppConfig::from_env(cache)?;
            let source = pokeapi_source(&config);
            let catalog = fetch_catalog(source.as_ref())?;
            catalog.save(&config.cache_file)?;
            println!(
                "Wrote {} species to {}",
                catalog.len(),
                config.cache_file.display()
            );
            Ok(())
        }
    }
}

fn pokeapi_source(config: &AppConfig) -> Arc<dyn SpeciesSource> {
    Arc::new(PokeApiSource::new(
        &config.api_base,
        config.species_limit,
        config.http_timeout_ms,
    ))
}

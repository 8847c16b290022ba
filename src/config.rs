use std::path::PathBuf;

use crate::{DEFAULT_SPRITE_TEMPLATE, env_bool, env_optional, env_u64};

pub(crate) const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";
pub(crate) const DEFAULT_CACHE_FILE: &str = "pokemon_cache.json";
pub(crate) const DEFAULT_SPECIES_LIMIT: u64 = 20_000;
pub(crate) const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Settings shared by every subcommand. CLI flags win over environment variables.
#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    pub(crate) api_base: String,
    pub(crate) cache_file: PathBuf,
    pub(crate) species_limit: u32,
    pub(crate) http_timeout_ms: u64,
    pub(crate) sprite_template: Option<String>,
}

impl AppConfig {
    pub(crate) fn from_env(cache_override: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let cache_file = cache_override
            .or_else(|| env_optional("POKEDEX_CACHE_FILE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));
        let species_limit = u32::try_from(env_u64("POKEDEX_SPECIES_LIMIT", DEFAULT_SPECIES_LIMIT)?)
            .map_err(|_| "POKEDEX_SPECIES_LIMIT out of range")?;
        let sprite_template = if env_bool("POKEDEX_SPRITES", true) {
            Some(
                env_optional("POKEDEX_SPRITE_TEMPLATE")
                    .unwrap_or_else(|| DEFAULT_SPRITE_TEMPLATE.to_string()),
            )
        } else {
            None
        };
        Ok(Self {
            api_base: env_optional("POKEDEX_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            cache_file,
            species_limit,
            http_timeout_ms: env_u64("POKEDEX_HTTP_TIMEOUT_MS", DEFAULT_HTTP_TIMEOUT_MS)?,
            sprite_template,
        })
    }
}

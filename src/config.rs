use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::ThemeMode;
use crate::error::SearchError;

pub const DEFAULT_CONFIG_FILE: &str = "poke-search.json";
pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const DEFAULT_PLACEHOLDER: &str = "Enter pokemon name here";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub evolution_chain_url: Option<String>,
    #[serde(default)]
    pub pokemon_url: Option<String>,
    #[serde(default)]
    pub page_limit: Option<usize>,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub theme: Option<ThemeMode>,
    #[serde(default)]
    pub placeholder: Option<String>,
}

/// Base URLs of the three resource families. Each ends with `/` so an id
/// can be appended directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub species: String,
    pub evolution_chain: String,
    pub pokemon: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            species: "https://pokeapi.co/api/v2/pokemon-species/".to_string(),
            evolution_chain: "https://pokeapi.co/api/v2/evolution-chain/".to_string(),
            pokemon: "https://pokeapi.co/api/v2/pokemon/".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub endpoints: Endpoints,
    pub page_limit: usize,
    pub cache_dir: Option<Utf8PathBuf>,
    pub theme: ThemeMode,
    pub placeholder: String,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            endpoints: Endpoints::default(),
            page_limit: DEFAULT_PAGE_LIMIT,
            cache_dir: None,
            theme: ThemeMode::Light,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, SearchError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| SearchError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| SearchError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, SearchError> {
        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            species: with_trailing_slash(config.api_url.unwrap_or(defaults.species)),
            evolution_chain: with_trailing_slash(
                config
                    .evolution_chain_url
                    .unwrap_or(defaults.evolution_chain),
            ),
            pokemon: with_trailing_slash(config.pokemon_url.unwrap_or(defaults.pokemon)),
        };

        let page_limit = match config.page_limit {
            Some(0) => {
                return Err(SearchError::ConfigParse(
                    "page_limit must be at least 1".to_string(),
                ));
            }
            Some(limit) => limit,
            None => DEFAULT_PAGE_LIMIT,
        };

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            endpoints,
            page_limit,
            cache_dir: config.cache_dir.map(Utf8PathBuf::from),
            theme: config.theme.unwrap_or_default(),
            placeholder: config
                .placeholder
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string()),
        })
    }
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_config_resolves_to_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.page_limit, 20);
        assert_eq!(resolved.endpoints, Endpoints::default());
        assert_eq!(resolved.theme, ThemeMode::Light);
        assert!(resolved.cache_dir.is_none());
    }

    #[test]
    fn zero_page_limit_is_rejected() {
        let config = Config {
            page_limit: Some(0),
            ..Config::default()
        };
        assert_matches!(
            ConfigLoader::resolve_config(config),
            Err(SearchError::ConfigParse(_))
        );
    }
}

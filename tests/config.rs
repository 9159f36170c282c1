use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use poke_search::config::{Config, ConfigLoader, Endpoints};
use poke_search::domain::ThemeMode;
use poke_search::error::SearchError;

#[test]
fn resolve_overrides_and_normalizes_urls() {
    let config = Config {
        schema_version: Some(1),
        api_url: Some("http://localhost:8080/api/v2/pokemon-species".to_string()),
        evolution_chain_url: None,
        pokemon_url: Some("http://localhost:8080/api/v2/pokemon".to_string()),
        page_limit: Some(5),
        cache_dir: Some("/tmp/poke-cache".to_string()),
        theme: Some(ThemeMode::Dark),
        placeholder: Some("Who's that?".to_string()),
    };

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(
        resolved.endpoints.species,
        "http://localhost:8080/api/v2/pokemon-species/"
    );
    assert_eq!(
        resolved.endpoints.evolution_chain,
        Endpoints::default().evolution_chain
    );
    assert_eq!(resolved.endpoints.pokemon, "http://localhost:8080/api/v2/pokemon/");
    assert_eq!(resolved.page_limit, 5);
    assert_eq!(
        resolved.cache_dir,
        Some(Utf8PathBuf::from("/tmp/poke-cache"))
    );
    assert_eq!(resolved.theme, ThemeMode::Dark);
    assert_eq!(resolved.placeholder, "Who's that?");
}

#[test]
fn resolve_reads_json_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("poke-search.json");
    fs::write(&path, r#"{ "page_limit": 3, "theme": "dark" }"#).unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.page_limit, 3);
    assert_eq!(resolved.theme, ThemeMode::Dark);
    assert_eq!(resolved.placeholder, "Enter pokemon name here");
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");

    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(SearchError::ConfigRead(_))
    );
}

#[test]
fn malformed_file_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("poke-search.json");
    fs::write(&path, "{ page_limit: ").unwrap();

    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(SearchError::ConfigParse(_))
    );
}

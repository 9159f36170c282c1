use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Endpoints;
use crate::domain::EntityId;
use crate::error::SearchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesPage {
    #[serde(default)]
    pub count: Option<u64>,
    pub results: Vec<NamedResource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub name: String,
    pub image_url: Option<String>,
}

pub trait CatalogClient: Send + Sync {
    fn fetch_species(&self, url: &str) -> Result<Value, SearchError>;
    fn fetch_evolution_chain(&self, chain_id: &str) -> Result<Value, SearchError>;
    fn fetch_pokemon(&self, id: &EntityId) -> Result<Value, SearchError>;
    fn fetch_species_page(&self, api_url: &str, limit: usize) -> Result<Value, SearchError>;
}

#[derive(Clone)]
pub struct PokeApiHttpClient {
    client: Client,
    endpoints: Endpoints,
}

impl PokeApiHttpClient {
    pub fn new(endpoints: Endpoints) -> Result<Self, SearchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("poke-search/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| SearchError::Http(err.to_string()))?,
        );
        // Requests are never cut short; a hung request keeps its batch waiting.
        let client = Client::builder()
            .default_headers(headers)
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| SearchError::Http(err.to_string()))?;
        Ok(Self { client, endpoints })
    }

    pub fn evolution_chain_url(&self, chain_id: &str) -> String {
        format!("{}{chain_id}", self.endpoints.evolution_chain)
    }

    pub fn pokemon_url(&self, id: &EntityId) -> String {
        format!("{}{}", self.endpoints.pokemon, id.as_str())
    }

    fn handle_status(
        url: &str,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, SearchError> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(SearchError::NotFound {
            url: url.to_string(),
            status: response.status().as_u16(),
        })
    }

    fn read_json(url: &str, request: reqwest::blocking::RequestBuilder) -> Result<Value, SearchError> {
        tracing::debug!(url, "pokeapi request");
        let response = request
            .send()
            .map_err(|err| SearchError::Http(err.to_string()))?;
        let response = Self::handle_status(url, response)?;
        response
            .json()
            .map_err(|err| SearchError::Parse(format!("{url}: {err}")))
    }
}

impl CatalogClient for PokeApiHttpClient {
    fn fetch_species(&self, url: &str) -> Result<Value, SearchError> {
        Self::read_json(url, self.client.get(url))
    }

    fn fetch_evolution_chain(&self, chain_id: &str) -> Result<Value, SearchError> {
        let url = self.evolution_chain_url(chain_id);
        Self::read_json(&url, self.client.get(&url))
    }

    fn fetch_pokemon(&self, id: &EntityId) -> Result<Value, SearchError> {
        let url = self.pokemon_url(id);
        Self::read_json(&url, self.client.get(&url))
    }

    fn fetch_species_page(&self, api_url: &str, limit: usize) -> Result<Value, SearchError> {
        Self::read_json(api_url, self.client.get(api_url).query(&[("limit", limit)]))
    }
}

/// Pulls the numeric chain id out of `evolution_chain.url` of a species
/// record, e.g. `.../evolution-chain/67/` gives `67`.
pub fn evolution_chain_id(species: &Value) -> Result<String, SearchError> {
    let url = species
        .get("evolution_chain")
        .and_then(|value| value.get("url"))
        .and_then(|value| value.as_str())
        .ok_or_else(|| {
            SearchError::Parse("species record has no evolution_chain.url".to_string())
        })?;
    let pattern = Regex::new(r"/evolution-chain/(\d+)/?$")
        .map_err(|err| SearchError::Parse(err.to_string()))?;
    pattern
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
        .ok_or_else(|| SearchError::Parse(format!("unrecognised evolution chain url: {url}")))
}

pub fn extract_display(pokemon: &Value) -> Result<DisplayInfo, SearchError> {
    let name = pokemon
        .get("name")
        .and_then(|value| value.as_str())
        .ok_or_else(|| SearchError::Parse("pokemon record has no name".to_string()))?
        .to_string();
    let image_url = pokemon
        .get("sprites")
        .and_then(|value| value.get("front_default"))
        .and_then(|value| value.as_str())
        .map(|value| value.to_string());
    Ok(DisplayInfo { name, image_url })
}

pub fn parse_species_page(page: &Value) -> Result<SpeciesPage, SearchError> {
    SpeciesPage::deserialize(page).map_err(|err| SearchError::Parse(format!("species page: {err}")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn chain_id_with_and_without_slash() {
        let species = json!({ "evolution_chain": { "url": "https://pokeapi.co/api/v2/evolution-chain/67/" } });
        assert_eq!(evolution_chain_id(&species).unwrap(), "67");

        let species = json!({ "evolution_chain": { "url": "https://pokeapi.co/api/v2/evolution-chain/1" } });
        assert_eq!(evolution_chain_id(&species).unwrap(), "1");
    }

    #[test]
    fn chain_id_missing() {
        let species = json!({ "name": "bulbasaur" });
        assert_matches!(evolution_chain_id(&species), Err(SearchError::Parse(_)));
    }

    #[test]
    fn display_without_sprite() {
        let pokemon = json!({ "name": "missingno", "sprites": { "front_default": null } });
        let info = extract_display(&pokemon).unwrap();
        assert_eq!(info.name, "missingno");
        assert_eq!(info.image_url, None);
    }

    #[test]
    fn urls_append_ids() {
        let client = PokeApiHttpClient::new(Endpoints::default()).unwrap();
        let id: EntityId = "25".parse().unwrap();
        assert_eq!(
            client.pokemon_url(&id),
            "https://pokeapi.co/api/v2/pokemon/25"
        );
        assert_eq!(
            client.evolution_chain_url("10"),
            "https://pokeapi.co/api/v2/evolution-chain/10"
        );
    }
}

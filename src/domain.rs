use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeMode::Light => write!(f, "Light"),
            ThemeMode::Dark => write!(f, "Dark"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Takes the trailing non-empty path segment, so both
    /// `.../pokemon-species/7/` and `.../pokemon-species/7` give `7`.
    pub fn from_url(url: &str) -> Result<Self, SearchError> {
        let parsed = Url::parse(url).map_err(|_| SearchError::InvalidEntityId(url.to_string()))?;
        let segment = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
            .ok_or_else(|| SearchError::InvalidEntityId(url.to_string()))?;
        segment.parse()
    }

    pub fn from_identifier(value: &str) -> Result<Self, SearchError> {
        let trimmed = value.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::from_url(trimmed)
        } else {
            trimmed.parse()
        }
    }

    pub fn cache_key(&self) -> String {
        format!("entity_{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = SearchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        let is_valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-');
        if !is_valid {
            return Err(SearchError::InvalidEntityId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    DefaultList,
    Name(String),
}

impl SearchQuery {
    pub fn label(&self) -> &str {
        match self {
            SearchQuery::DefaultList => "",
            SearchQuery::Name(name) => name,
        }
    }
}

impl FromStr for SearchQuery {
    type Err = SearchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            return Ok(SearchQuery::DefaultList);
        }
        if !value.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(SearchError::InvalidInput(value.to_string()));
        }
        Ok(SearchQuery::Name(value.to_ascii_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEntity {
    id: String,
    name: String,
    forms_amount: usize,
    forms_names: String,
    image_url: Option<String>,
}

impl NormalizedEntity {
    /// `forms` is the pre-order list of species names in the evolution chain
    /// and always holds at least the chain root.
    pub fn new(id: &EntityId, name: String, forms: &[String], image_url: Option<String>) -> Self {
        Self {
            id: id.as_str().to_string(),
            name,
            forms_amount: forms.len(),
            forms_names: forms.join(", "),
            image_url,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn forms_amount(&self) -> usize {
        self.forms_amount
    }

    pub fn forms_names(&self) -> &str {
        &self.forms_names
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn entity_id_from_url_with_trailing_slash() {
        let id = EntityId::from_url("https://pokeapi.co/api/v2/pokemon-species/7/").unwrap();
        assert_eq!(id.as_str(), "7");
        assert_eq!(id.cache_key(), "entity_7");
    }

    #[test]
    fn entity_id_from_url_without_trailing_slash() {
        let id = EntityId::from_url("https://pokeapi.co/api/v2/pokemon-species/pikachu").unwrap();
        assert_eq!(id.as_str(), "pikachu");
    }

    #[test]
    fn entity_id_rejects_path_tricks() {
        let err = "../etc".parse::<EntityId>().unwrap_err();
        assert_matches!(err, SearchError::InvalidEntityId(_));
    }

    #[test]
    fn query_parsing() {
        assert_eq!("".parse::<SearchQuery>().unwrap(), SearchQuery::DefaultList);
        assert_eq!(
            "Pikachu".parse::<SearchQuery>().unwrap(),
            SearchQuery::Name("pikachu".to_string())
        );
        assert_matches!(
            "123abc".parse::<SearchQuery>(),
            Err(SearchError::InvalidInput(_))
        );
        assert_matches!(
            "mr mime".parse::<SearchQuery>(),
            Err(SearchError::InvalidInput(_))
        );
    }

    #[test]
    fn entity_joins_forms() {
        let id: EntityId = "1".parse().unwrap();
        let forms = vec![
            "bulbasaur".to_string(),
            "ivysaur".to_string(),
            "venusaur".to_string(),
        ];
        let entity = NormalizedEntity::new(&id, "bulbasaur".to_string(), &forms, None);
        assert_eq!(entity.forms_amount(), 3);
        assert_eq!(entity.forms_names(), "bulbasaur, ivysaur, venusaur");
    }
}

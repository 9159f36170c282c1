use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::cache::{Cache, SPECIES_LIST_KEY};
use crate::chain::{flatten, parse_chain};
use crate::config::ResolvedConfig;
use crate::domain::{EntityId, NormalizedEntity, SearchQuery};
use crate::error::SearchError;
use crate::pokeapi::{
    CatalogClient, SpeciesPage, evolution_chain_id, extract_display, parse_species_page,
};
use crate::store::EntityStore;

#[derive(Debug, Clone, Serialize)]
pub struct FetchFailure {
    pub target: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub entities: Vec<NormalizedEntity>,
    pub failures: Vec<FetchFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub entities: Vec<NormalizedEntity>,
    pub failures: Vec<FetchFailure>,
}

impl SearchOutcome {
    pub fn apply_to(&self, store: &mut EntityStore) {
        for entity in &self.entities {
            store.upsert(entity.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearResult {
    pub cleared: bool,
    pub removed_entries: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            elapsed: None,
        }
    }

    pub fn alert(message: impl std::fmt::Display) -> Self {
        Self::new(format!("alert: {message}"))
    }
}

pub trait ProgressSink: Send + Sync {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: CatalogClient> {
    cache: Cache,
    client: C,
    api_url: String,
    page_limit: usize,
}

impl<C: CatalogClient> App<C> {
    pub fn new(cache: Cache, client: C, config: &ResolvedConfig) -> Self {
        Self {
            cache,
            client,
            api_url: config.endpoints.species.clone(),
            page_limit: config.page_limit,
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn fetch_entity(
        &self,
        identifier: &str,
        sink: &dyn ProgressSink,
    ) -> Result<NormalizedEntity, SearchError> {
        let id = EntityId::from_identifier(identifier)?;
        let key = id.cache_key();
        sink.event(ProgressEvent::new(format!("phase=Resolve; entity {id}")));

        if let Some(entity) = self.cached_entity(&key)? {
            tracing::debug!(%id, "cache hit");
            sink.event(ProgressEvent::new(format!("phase=Cache; hit {key}")));
            return Ok(entity);
        }
        tracing::debug!(%id, "cache miss");

        let species_url = if is_url(identifier) {
            identifier.trim().to_string()
        } else {
            format!("{}{}", self.api_url, id.as_str())
        };

        sink.event(ProgressEvent::new(format!("phase=Fetch; species {id}")));
        sink.event(ProgressEvent::new("pokeapi.request"));
        let start = Instant::now();
        let species = self.client.fetch_species(&species_url)?;
        let chain_id = evolution_chain_id(&species)?;
        sink.event(ProgressEvent::new("pokeapi.request"));
        let chain_resource = self.client.fetch_evolution_chain(&chain_id)?;
        sink.event(ProgressEvent::new("pokeapi.request"));
        let pokemon = self.client.fetch_pokemon(&id)?;
        let elapsed = start.elapsed();
        sink.event(ProgressEvent {
            message: format!("pokeapi.response latency_ms={}", elapsed.as_millis()),
            elapsed: Some(elapsed),
        });

        sink.event(ProgressEvent::new(format!(
            "phase=Normalize; chain {chain_id} for {id}"
        )));
        let chain = parse_chain(&chain_resource)?;
        let forms = flatten(&chain);
        let display = extract_display(&pokemon)?;
        let entity = NormalizedEntity::new(&id, display.name, &forms, display.image_url);

        let blob = serde_json::to_string(&entity)
            .map_err(|err| SearchError::Parse(err.to_string()))?;
        self.cache.set(&key, &blob)?;
        sink.event(ProgressEvent::new(format!("phase=Store; cached {key}")));

        Ok(entity)
    }

    /// Loads the default page of species and fetches every member at once.
    /// Results keep the page order; failed members are reported and skipped.
    pub fn fetch_default_list(
        &self,
        api_url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<BatchResult, SearchError> {
        let page = self.species_page(api_url, sink)?;
        let urls = page
            .results
            .into_iter()
            .map(|member| member.url)
            .collect::<Vec<_>>();
        sink.event(ProgressEvent::new(format!(
            "phase=Fetch; {} entities",
            urls.len()
        )));

        let results = thread::scope(|scope| {
            let handles = urls
                .iter()
                .map(|url| (url, scope.spawn(move || self.fetch_entity(url, sink))))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|(url, handle)| {
                    let result = handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                    (url.clone(), result)
                })
                .collect::<Vec<_>>()
        });

        let mut entities = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (url, result) in results {
            match result {
                Ok(entity) => entities.push(entity),
                Err(err) => failures.push(self.report_failure(url, err, sink)),
            }
        }

        Ok(BatchResult { entities, failures })
    }

    pub fn search(
        &self,
        query: &SearchQuery,
        sink: &dyn ProgressSink,
    ) -> Result<SearchOutcome, SearchError> {
        match query {
            SearchQuery::DefaultList => {
                let batch = self.fetch_default_list(&self.api_url, sink)?;
                Ok(SearchOutcome {
                    query: query.label().to_string(),
                    entities: batch.entities,
                    failures: batch.failures,
                })
            }
            SearchQuery::Name(name) => {
                let url = format!("{}{name}", self.api_url);
                let (entities, failures) = match self.fetch_entity(&url, sink) {
                    Ok(entity) => (vec![entity], Vec::new()),
                    Err(err) => (Vec::new(), vec![self.report_failure(name.clone(), err, sink)]),
                };
                Ok(SearchOutcome {
                    query: query.label().to_string(),
                    entities,
                    failures,
                })
            }
        }
    }

    pub fn submit(
        &self,
        input: &str,
        store: &mut EntityStore,
        sink: &dyn ProgressSink,
    ) -> Result<SearchOutcome, SearchError> {
        let query = match input.parse::<SearchQuery>() {
            Ok(query) => query,
            Err(err) => {
                sink.event(ProgressEvent::alert(&err));
                return Err(err);
            }
        };
        let outcome = self.search(&query, sink)?;
        outcome.apply_to(store);
        sink.event(ProgressEvent::new(format!(
            "phase=Done; {} shown, {} failed",
            outcome.entities.len(),
            outcome.failures.len()
        )));
        Ok(outcome)
    }

    pub fn clear_all(
        &self,
        store: &mut EntityStore,
        sink: &dyn ProgressSink,
    ) -> Result<ClearResult, SearchError> {
        sink.event(ProgressEvent::new("phase=Store; clearing cache"));
        let removed_entries = self.cache.entry_count()?;
        self.cache.clear()?;
        store.reset();
        Ok(ClearResult {
            cleared: true,
            removed_entries,
        })
    }

    fn cached_entity(&self, key: &str) -> Result<Option<NormalizedEntity>, SearchError> {
        let Some(raw) = self.cache.get(key)? else {
            return Ok(None);
        };
        let entity: Option<NormalizedEntity> = serde_json::from_str(&raw)
            .map_err(|err| SearchError::Parse(format!("cached {key}: {err}")))?;
        if entity.is_none() {
            tracing::warn!(key, "ignoring null cache entry");
        }
        Ok(entity)
    }

    fn species_page(
        &self,
        api_url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<SpeciesPage, SearchError> {
        if let Some(raw) = self.cache.get(SPECIES_LIST_KEY)? {
            let value: Value = serde_json::from_str(&raw)
                .map_err(|err| SearchError::Parse(format!("cached {SPECIES_LIST_KEY}: {err}")))?;
            if value.is_null() {
                tracing::warn!(key = SPECIES_LIST_KEY, "ignoring null cache entry");
            } else {
                sink.event(ProgressEvent::new(format!(
                    "phase=Cache; hit {SPECIES_LIST_KEY}"
                )));
                return parse_species_page(&value);
            }
        }

        sink.event(ProgressEvent::new(format!(
            "phase=Fetch; species page limit={}",
            self.page_limit
        )));
        sink.event(ProgressEvent::new("pokeapi.request"));
        let value = self.client.fetch_species_page(api_url, self.page_limit)?;
        let page = parse_species_page(&value)?;
        let raw = serde_json::to_string(&value)
            .map_err(|err| SearchError::Parse(err.to_string()))?;
        self.cache.set(SPECIES_LIST_KEY, &raw)?;
        Ok(page)
    }

    fn report_failure(
        &self,
        target: String,
        err: SearchError,
        sink: &dyn ProgressSink,
    ) -> FetchFailure {
        tracing::warn!(%target, error = %err, "skipping entity");
        sink.event(ProgressEvent::alert(format!("{target}: {err}")));
        FetchFailure {
            target,
            message: err.to_string(),
        }
    }
}

fn is_url(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.starts_with("http://") || trimmed.starts_with("https://")
}

use std::time::{Duration, Instant};

use crate::assembler::{query_item, Assembler};
use crate::backend::{BackendError, CommandBackend, SearchBackend, SearchOptions};
use crate::cache_store::{CacheStore, FileStore, StoreError};
use crate::config::{validate, Config, ConfigError};
use crate::contract::{
    DisplayItem, HandoffVariables, Invocation, Mode, Outcome, ScriptFilterOutput,
    RERUN_INTERVAL_SECS,
};
use crate::debounce::{typing_output, Session};
use crate::favicon::{FaviconCache, HttpIconFetcher, IconFetcher};
use crate::instant_answer::{preview_path, write_preview, InstantAnswer};
use crate::keyword_cache::{KeywordCache, KeywordCacheError, KeywordSet};
use crate::keyword_sources::{KeywordSources, PreferencesDirSources};
use crate::response_cache::ResponseCache;
use crate::selection::SelectionStore;
use crate::suppression::{self, SuppressionRules, Verdict};

#[derive(Debug)]
pub enum ServiceError {
    Config(ConfigError),
    Store(StoreError),
    Backend(BackendError),
    Keywords(KeywordCacheError),
    Encode(serde_json::Error),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Store(error) => write!(f, "store error: {error}"),
            Self::Backend(error) => write!(f, "backend error: {error}"),
            Self::Keywords(error) => write!(f, "keyword cache error: {error}"),
            Self::Encode(error) => write!(f, "encode error: {error}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ConfigError> for ServiceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<BackendError> for ServiceError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

impl From<KeywordCacheError> for ServiceError {
    fn from(value: KeywordCacheError) -> Self {
        Self::Keywords(value)
    }
}

pub struct CoreService {
    config: Config,
    store: Box<dyn CacheStore>,
    backend: Box<dyn SearchBackend>,
    fetcher: Box<dyn IconFetcher>,
    sources: Box<dyn KeywordSources>,
}

impl CoreService {
    /// Production wiring: file caches, ddgr command, HTTP favicons, host preferences.
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        validate(&config)?;
        let store = FileStore::open(&config.cache_dir)?;
        let backend = CommandBackend::new(&config.backend_command)
            .ok_or_else(|| ConfigError::Invalid("backend_command is required".into()))?;
        let sources = PreferencesDirSources::new(&config.preferences_dir, &config.workflow_uid);
        Ok(Self {
            config,
            store: Box::new(store),
            backend: Box::new(backend),
            fetcher: Box::new(HttpIconFetcher::new()),
            sources: Box::new(sources),
        })
    }

    pub fn with_parts(
        config: Config,
        store: Box<dyn CacheStore>,
        backend: Box<dyn SearchBackend>,
        fetcher: Box<dyn IconFetcher>,
        sources: Box<dyn KeywordSources>,
    ) -> Result<Self, ServiceError> {
        validate(&config)?;
        Ok(Self {
            config,
            store,
            backend,
            fetcher,
            sources,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self, invocation: &Invocation) -> Result<Outcome, ServiceError> {
        let started = Instant::now();
        let query = invocation.query();
        let mut mode = invocation.mode;

        if !mode.bypasses_suppression() {
            if let Verdict::Suppress(reason) = self.check_suppression(&query)? {
                crate::logging::info(&format!("Ignored ({reason})"));
                return Ok(Outcome::Suppressed(reason));
            }
        }

        let placeholder = query_item(&query, &self.config.search_site);
        let mut session = Session::resume(&query, &invocation.handoff);
        if session.is_typing() {
            return Ok(Outcome::Output(typing_output(
                &session,
                placeholder,
                &invocation.handoff,
            )));
        }

        let opts = SearchOptions::from_config(&self.config);
        let lookup =
            ResponseCache::new(&*self.store).lookup_or_fetch(&query, &*self.backend, &opts)?;
        if lookup.is_hit() {
            mode = Mode::Rerun;
        }
        session.settle();
        let cached = lookup.into_response();

        let selection = SelectionStore::new(&*self.store).load()?;
        let skip_buffering = mode.skips_buffering();
        let favicons =
            FaviconCache::new(&*self.store, &*self.fetcher, self.config.use_favicons);
        let assembler = Assembler {
            selection: &selection,
            marker: &self.config.multi_select_icon,
            fallback_icon: &self.config.fallback_icon,
        };

        let mut favicon_time = Duration::ZERO;
        let results: Vec<DisplayItem> = cached
            .response
            .results
            .iter()
            .map(|item| {
                let icon = favicons.resolve(item.domain(), skip_buffering);
                favicon_time += icon.elapsed;
                assembler.result_item(item, &icon.path)
            })
            .collect();

        let instant_answer = cached.response.instant_answer();
        let preview = instant_answer.map(|raw| self.preview_for(raw, skip_buffering));
        let leading =
            assembler.decorate_query_item(placeholder, instant_answer, preview.as_deref());

        let old_results = serde_json::to_string(&results).map_err(ServiceError::Encode)?;
        let mut items = Vec::with_capacity(results.len() + 1);
        items.push(leading);
        items.extend(results);

        let favicons_eligible = self.config.use_favicons && !skip_buffering;
        log_timing(
            session.key(),
            mode,
            started.elapsed(),
            favicons_eligible.then_some(favicon_time),
        );

        Ok(Outcome::Output(ScriptFilterOutput {
            // Keeps rerunning so selection toggles show up without new input.
            rerun: Some(RERUN_INTERVAL_SECS),
            skip_knowledge: true,
            variables: HandoffVariables {
                old_results,
                old_query: query,
            },
            items,
        }))
    }

    fn check_suppression(&self, query: &str) -> Result<Verdict, ServiceError> {
        let rules = SuppressionRules {
            minimum_query_length: self.config.minimum_query_length,
            ignore_words: self.config.ignore_extra_words.clone(),
            check_host_keywords: self.config.ignore_host_keywords,
        };
        let verdict = suppression::evaluate(query, &rules, || {
            KeywordCache::new(&*self.store, &*self.sources).load()
        })?;
        Ok(verdict)
    }

    fn preview_for(&self, raw: &str, skip_buffering: bool) -> String {
        if skip_buffering {
            return preview_path(&*self.store);
        }
        match write_preview(&*self.store, &InstantAnswer::parse(raw)) {
            Ok(path) => path,
            Err(error) => {
                crate::logging::warn(&format!("failed to write instant answer preview: {error}"));
                preview_path(&*self.store)
            }
        }
    }

    pub fn rebuild_keywords(&self) -> Result<KeywordSet, ServiceError> {
        Ok(KeywordCache::new(&*self.store, &*self.sources).rebuild()?)
    }

    /// Flips `url` in the selection buffer; returns whether it is now selected.
    pub fn toggle_selection(&self, url: &str) -> Result<bool, ServiceError> {
        Ok(SelectionStore::new(&*self.store).toggle(url)?)
    }
}

fn log_timing(query: &str, mode: Mode, total: Duration, favicons: Option<Duration>) {
    let mut time = format!("{}s", total.as_secs_f64());
    if let Some(favicons) = favicons {
        time.push_str(&format!(", favicons: {}s", favicons.as_secs_f64()));
    }
    let line = match mode {
        Mode::Default => format!("Total: {time}, \"{query}\""),
        // Indented so reruns stand out from real searches.
        Mode::Rerun => format!("____{time}"),
        other => format!("Total: {time}, \"{query}\" ({other})"),
    };
    crate::logging::info(&line);
}

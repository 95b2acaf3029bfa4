use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::time::Instant;

use crate::cache_store::{CacheStore, StoreError};
use crate::keyword_sources::{KeywordSources, SourceError};

pub const KEYWORD_CACHE_KEY: &str = "host_keywords.json";
/// Trigger word owned by this package itself.
pub const OWN_RESERVED_KEYWORD: &str = "today";

#[derive(Debug)]
pub enum KeywordCacheError {
    Store(StoreError),
    Source(SourceError),
    Encode(serde_json::Error),
}

impl Display for KeywordCacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(error) => write!(f, "keyword cache store error: {error}"),
            Self::Source(error) => write!(f, "keyword source error: {error}"),
            Self::Encode(error) => write!(f, "keyword cache encode error: {error}"),
        }
    }
}

impl std::error::Error for KeywordCacheError {}

impl From<StoreError> for KeywordCacheError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<SourceError> for KeywordCacheError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

/// Unique, lowercase, letter-initial first words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    words: Vec<String>,
}

impl KeywordSet {
    /// Keeps the first space-delimited word of every candidate, lower-cased,
    /// when it starts with a letter; first occurrence wins.
    pub fn from_candidates<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut words = Vec::new();
        for candidate in candidates {
            let lowered = candidate.as_ref().to_lowercase();
            let Some(first) = lowered.split(' ').next() else {
                continue;
            };
            if !first.starts_with(|c: char| c.is_ascii_lowercase()) {
                continue;
            }
            if seen.insert(first.to_string()) {
                words.push(first.to_string());
            }
        }
        Self { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

pub struct KeywordCache<'a, S: CacheStore + ?Sized, K: KeywordSources + ?Sized> {
    store: &'a S,
    sources: &'a K,
}

impl<'a, S: CacheStore + ?Sized, K: KeywordSources + ?Sized> KeywordCache<'a, S, K> {
    pub fn new(store: &'a S, sources: &'a K) -> Self {
        Self { store, sources }
    }

    /// Missing, or older than the most recent configuration change.
    pub fn is_stale(&self) -> bool {
        let Some(created) = self.store.created_at(KEYWORD_CACHE_KEY) else {
            return true;
        };
        self.sources
            .latest_modification()
            .is_some_and(|modified| modified > created)
    }

    /// Returns the cached set, rebuilding it first when stale or unreadable.
    pub fn load(&self) -> Result<KeywordSet, KeywordCacheError> {
        if self.is_stale() {
            return self.rebuild();
        }

        match self.read_cached()? {
            Some(set) => Ok(set),
            None => {
                crate::logging::warn("keyword cache unreadable; rebuilding");
                self.rebuild()
            }
        }
    }

    fn read_cached(&self) -> Result<Option<KeywordSet>, KeywordCacheError> {
        let Some(raw) = self.store.read(KEYWORD_CACHE_KEY)? else {
            return Ok(None);
        };
        Ok(serde_json::from_slice::<Vec<String>>(&raw)
            .ok()
            .map(KeywordSet::from_candidates))
    }

    pub fn rebuild(&self) -> Result<KeywordSet, KeywordCacheError> {
        crate::logging::info("Refreshing keyword cache…");
        let started = Instant::now();

        let mut candidates: Vec<String> = self
            .sources
            .package_keywords()?
            .iter()
            .flat_map(|declaration| declaration.resolve())
            .collect();
        candidates.extend(self.sources.builtin_searches()?);
        candidates.extend(self.sources.user_searches()?);
        candidates.push(OWN_RESERVED_KEYWORD.to_string());

        let set = KeywordSet::from_candidates(&candidates);
        let encoded = serde_json::to_vec(set.words()).map_err(KeywordCacheError::Encode)?;
        self.store.write(KEYWORD_CACHE_KEY, &encoded)?;

        crate::logging::info(&format!(
            "Rebuilt keyword cache ({} keywords) in {:.3}s",
            set.len(),
            started.elapsed().as_secs_f64()
        ));
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::KeywordSet;

    #[test]
    fn keeps_first_word_lowercased_and_letter_initial() {
        let set = KeywordSet::from_candidates(["Gh issues", "1password", "gh", "  lead", "yt"]);
        assert_eq!(set.words(), ["gh", "yt"]);
    }
}

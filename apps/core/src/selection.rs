use std::collections::BTreeSet;

use crate::cache_store::{CacheStore, StoreError};

pub const SELECTION_BUFFER_KEY: &str = "multiSelectBuffer.txt";

/// URLs the user marked for a multi-URL action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    urls: BTreeSet<String>,
}

impl SelectionSet {
    pub fn parse(raw: &str) -> Self {
        Self {
            urls: raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_selected(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    fn encode(&self) -> String {
        self.urls.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

pub struct SelectionStore<'a, S: CacheStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CacheStore + ?Sized> SelectionStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// A missing buffer is an empty selection.
    pub fn load(&self) -> Result<SelectionSet, StoreError> {
        Ok(self
            .store
            .read_string(SELECTION_BUFFER_KEY)?
            .map(|raw| SelectionSet::parse(&raw))
            .unwrap_or_default())
    }

    /// Flips membership of `url`; returns whether it is selected afterwards.
    pub fn toggle(&self, url: &str) -> Result<bool, StoreError> {
        let url = url.trim();
        let mut set = self.load()?;
        let selected = if set.urls.remove(url) {
            false
        } else if url.is_empty() {
            return Ok(false);
        } else {
            set.urls.insert(url.to_string());
            true
        };
        self.store
            .write(SELECTION_BUFFER_KEY, set.encode().as_bytes())?;
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::SelectionSet;

    #[test]
    fn parses_newline_delimited_urls() {
        let set = SelectionSet::parse("https://a.example/\n\nhttps://b.example/\r\n");
        assert_eq!(set.len(), 2);
        assert!(set.is_selected("https://b.example/"));
        assert!(!set.is_selected(""));
    }
}

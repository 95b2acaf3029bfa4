use std::fmt::{Display, Formatter};
use std::io::Read;
use std::time::{Duration, Instant};

use crate::cache_store::CacheStore;

const FAVICON_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_ICON_BYTES: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Status(u16),
    Transport(String),
    Io(String),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "http status {code}"),
            Self::Transport(error) => write!(f, "transport error: {error}"),
            Self::Io(error) => write!(f, "io error: {error}"),
        }
    }
}

impl std::error::Error for FetchError {}

pub trait IconFetcher {
    /// Icon bytes for the domain; any non-2xx answer is an error.
    fn fetch(&self, domain: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpIconFetcher {
    agent: ureq::Agent,
}

impl Default for HttpIconFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpIconFetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(FAVICON_TIMEOUT)
            .redirects(5)
            .build();
        Self { agent }
    }

    pub fn icon_url(domain: &str) -> String {
        format!("https://{domain}/favicon.ico")
    }
}

impl IconFetcher for HttpIconFetcher {
    fn fetch(&self, domain: &str) -> Result<Vec<u8>, FetchError> {
        let response = match self.agent.get(&Self::icon_url(domain)).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(FetchError::Status(code)),
            Err(ureq::Error::Transport(error)) => {
                return Err(FetchError::Transport(error.to_string()))
            }
        };
        // ureq only surfaces >= 400 as errors; anything else that is not 2xx is a failure too.
        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status(status));
        }

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_ICON_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| FetchError::Io(e.to_string()))?;
        Ok(bytes)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedIcon {
    /// Empty when no icon is available for this invocation.
    pub path: String,
    pub elapsed: Duration,
}

/// One icon file per domain, created once and never revalidated.
pub struct FaviconCache<'a, S: CacheStore + ?Sized, F: IconFetcher + ?Sized> {
    store: &'a S,
    fetcher: &'a F,
    enabled: bool,
}

impl<'a, S: CacheStore + ?Sized, F: IconFetcher + ?Sized> FaviconCache<'a, S, F> {
    pub fn new(store: &'a S, fetcher: &'a F, enabled: bool) -> Self {
        Self {
            store,
            fetcher,
            enabled,
        }
    }

    pub fn key_for(domain: &str) -> String {
        format!("{domain}.ico")
    }

    /// Existing files win unconditionally. Otherwise fetch when enabled and
    /// not marked unnecessary; failures leave no trace, so the next
    /// invocation tries again.
    pub fn resolve(&self, domain: &str, skip_fetch: bool) -> ResolvedIcon {
        let started = Instant::now();
        let key = Self::key_for(domain);
        let path = if domain.is_empty() {
            String::new()
        } else if self.store.contains(&key) {
            self.store.locate(&key).to_string_lossy().into_owned()
        } else if self.enabled && !skip_fetch {
            self.fetch_into_store(domain, &key)
        } else {
            String::new()
        };

        ResolvedIcon {
            path,
            elapsed: started.elapsed(),
        }
    }

    fn fetch_into_store(&self, domain: &str, key: &str) -> String {
        let bytes = match self.fetcher.fetch(domain) {
            Ok(bytes) => bytes,
            Err(error) => {
                crate::logging::info(&format!("favicon unavailable for {domain}: {error}"));
                return String::new();
            }
        };
        match self.store.write(key, &bytes) {
            Ok(()) => self.store.locate(key).to_string_lossy().into_owned(),
            Err(error) => {
                crate::logging::warn(&format!("failed to cache favicon for {domain}: {error}"));
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HttpIconFetcher;

    #[test]
    fn icon_url_targets_site_root() {
        assert_eq!(
            HttpIconFetcher::icon_url("w.example"),
            "https://w.example/favicon.ico"
        );
    }
}

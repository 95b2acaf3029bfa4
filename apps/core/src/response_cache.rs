use crate::backend::{SearchBackend, SearchOptions};
use crate::cache_store::CacheStore;
use crate::core_service::ServiceError;
use crate::model::CachedResponse;

pub const RESPONSE_CACHE_KEY: &str = "responseCache.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(CachedResponse),
    Fetched(CachedResponse),
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn into_response(self) -> CachedResponse {
        match self {
            Self::Hit(response) | Self::Fetched(response) => response,
        }
    }
}

/// Single slot keyed by exact query text.
pub struct ResponseCache<'a, S: CacheStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CacheStore + ?Sized> ResponseCache<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The stored record, if it is readable. A record for another query is
    /// still returned; validity is checked by the caller.
    pub fn peek(&self) -> Option<CachedResponse> {
        let raw = self.store.read(RESPONSE_CACHE_KEY).ok()??;
        serde_json::from_slice::<CachedResponse>(&raw).ok()
    }

    pub fn lookup_or_fetch<B: SearchBackend + ?Sized>(
        &self,
        query: &str,
        backend: &B,
        opts: &SearchOptions,
    ) -> Result<Lookup, ServiceError> {
        if let Some(cached) = self.peek().filter(|cached| cached.is_valid_for(query)) {
            return Ok(Lookup::Hit(cached));
        }

        let response = backend.search(query, opts)?;
        let tagged = CachedResponse::new(query, response);
        let encoded = serde_json::to_vec(&tagged).map_err(ServiceError::Encode)?;
        self.store.write(RESPONSE_CACHE_KEY, &encoded)?;
        Ok(Lookup::Fetched(tagged))
    }
}

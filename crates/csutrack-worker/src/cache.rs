// SPDX-FileCopyrightText: 2026 CSU Tracker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named cache generations.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use csutrack_core::CsuError;
use reqwest::Url;
use tokio::sync::RwLock;

use crate::request::FetchResponse;

/// Storage for cached responses, grouped into named generations.
#[async_trait]
pub trait CacheStorage: Send + Sync + 'static {
    /// Names of every existing generation.
    async fn keys(&self) -> Result<Vec<String>, CsuError>;

    /// Deletes a generation. Returns false if it did not exist.
    async fn delete(&self, generation: &str) -> Result<bool, CsuError>;

    /// Stores `response` under `url`, creating the generation if needed.
    async fn put(&self, generation: &str, url: &str, response: FetchResponse)
    -> Result<(), CsuError>;

    async fn lookup(&self, generation: &str, url: &str) -> Result<Option<FetchResponse>, CsuError>;
}

/// Normalized cache key: the absolute URL without its fragment.
pub fn cache_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// In-process [`CacheStorage`].
#[derive(Default)]
pub struct MemoryCacheStorage {
    generations: RwLock<BTreeMap<String, HashMap<String, FetchResponse>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a generation, for tests and status output.
    pub async fn len(&self, generation: &str) -> usize {
        self.generations
            .read()
            .await
            .get(generation)
            .map_or(0, HashMap::len)
    }

    /// Creates an empty generation, as a previous deployment would have.
    pub async fn create(&self, generation: &str) {
        self.generations
            .write()
            .await
            .entry(generation.to_string())
            .or_default();
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn keys(&self) -> Result<Vec<String>, CsuError> {
        Ok(self.generations.read().await.keys().cloned().collect())
    }

    async fn delete(&self, generation: &str) -> Result<bool, CsuError> {
        Ok(self.generations.write().await.remove(generation).is_some())
    }

    async fn put(
        &self,
        generation: &str,
        url: &str,
        response: FetchResponse,
    ) -> Result<(), CsuError> {
        self.generations
            .write()
            .await
            .entry(generation.to_string())
            .or_default()
            .insert(cache_key(url), response);
        Ok(())
    }

    async fn lookup(&self, generation: &str, url: &str) -> Result<Option<FetchResponse>, CsuError> {
        Ok(self
            .generations
            .read()
            .await
            .get(generation)
            .and_then(|entries| entries.get(&cache_key(url)))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generations_are_isolated() {
        let cache = MemoryCacheStorage::new();
        let url = "https://a.test/static/app.css";
        cache
            .put("v1", url, FetchResponse::ok(url, "old"))
            .await
            .unwrap();
        cache
            .put("v2", url, FetchResponse::ok(url, "new"))
            .await
            .unwrap();

        assert_eq!(cache.lookup("v1", url).await.unwrap().unwrap().body, b"old");
        assert!(cache.delete("v1").await.unwrap());
        assert!(!cache.delete("v1").await.unwrap());
        assert!(cache.lookup("v1", url).await.unwrap().is_none());
        assert_eq!(cache.keys().await.unwrap(), vec!["v2"]);
    }

    #[test]
    fn fragments_do_not_split_entries() {
        assert_eq!(
            cache_key("https://a.test/static/icons.svg#home"),
            cache_key("https://a.test/static/icons.svg")
        );
    }
}

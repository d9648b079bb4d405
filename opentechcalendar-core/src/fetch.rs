//! Fetching source documents over HTTP, with an optional on-disk cache.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::ImportConfig;
use crate::error::{ImportError, ImportResult};

#[derive(Clone, Debug)]
struct ResponseCache {
    dir: PathBuf,
    /// `None` keeps entries forever.
    expiry: Option<Duration>,
}

/// Longest slug prefix kept in a cache file name.
const SLUG_PREFIX_LEN: usize = 80;

impl ResponseCache {
    /// Readable slug prefix plus a hash of the exact URL, so distinct URLs
    /// never share an entry and names stay well under filesystem limits.
    fn path_for(&self, url: &str) -> PathBuf {
        let slug: String = slug::slugify(url).chars().take(SLUG_PREFIX_LEN).collect();

        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());

        self.dir.join(format!("{}-{:x}.cache", slug, hasher.finalize()))
    }

    async fn get(&self, url: &str) -> Option<String> {
        let path = self.path_for(url);
        let metadata = tokio::fs::metadata(&path).await.ok()?;

        if let Some(expiry) = self.expiry {
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| SystemTime::now().duration_since(modified).ok())?;
            if age > expiry {
                return None;
            }
        }

        tokio::fs::read_to_string(&path).await.ok()
    }

    async fn put(&self, url: &str, body: &str) -> ImportResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(url), body).await?;
        Ok(())
    }
}

/// Downloads source documents, identifying itself with a User-Agent.
#[derive(Clone, Debug)]
pub struct Fetcher {
    http: reqwest::Client,
    cache: Option<ResponseCache>,
}

impl Fetcher {
    pub fn new(user_agent: &str) -> ImportResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ImportError::Config(format!("Could not build HTTP client: {e}")))?;

        Ok(Fetcher { http, cache: None })
    }

    pub fn with_cache(mut self, dir: PathBuf, expiry: Option<Duration>) -> Self {
        self.cache = Some(ResponseCache { dir, expiry });
        self
    }

    pub fn from_config(config: &ImportConfig) -> ImportResult<Self> {
        let fetcher = Self::new(&config.user_agent)?;
        Ok(match &config.request_cache_directory {
            Some(dir) => fetcher.with_cache(dir.clone(), config.request_cache_expiry),
            None => fetcher,
        })
    }

    /// Fetch `url` as text. Error statuses are failures; nothing is retried.
    pub async fn fetch(&self, url: &str) -> ImportResult<String> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url).await {
                debug!(url, "Using cached response");
                return Ok(body);
            }
        }

        let fetch_error = |e: reqwest::Error| ImportError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let body = self
            .http
            .get(url)
            .send()
            .await
            .map_err(fetch_error)?
            .error_for_status()
            .map_err(fetch_error)?
            .text()
            .await
            .map_err(fetch_error)?;

        if let Some(cache) = &self.cache
            && let Err(error) = cache.put(url, &body).await
        {
            warn!(url, %error, "Could not cache response");
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cal.ics"))
            .and(header("user-agent", "test-agent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("BEGIN:VCALENDAR"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new("test-agent/1.0").unwrap();
        let body = fetcher.fetch(&format!("{}/cal.ics", server.uri())).await.unwrap();

        assert_eq!(body, "BEGIN:VCALENDAR");
    }

    #[tokio::test]
    async fn test_error_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new("test-agent/1.0").unwrap();
        let result = fetcher.fetch(&format!("{}/missing", server.uri())).await;

        assert!(matches!(result, Err(ImportError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_cached_response_is_reused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("payload"))
            .expect(1)
            .mount(&server)
            .await;
        let cache_dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new("test-agent/1.0")
            .unwrap()
            .with_cache(cache_dir.path().to_path_buf(), None);
        let url = format!("{}/page", server.uri());

        assert_eq!(fetcher.fetch(&url).await.unwrap(), "payload");
        assert_eq!(fetcher.fetch(&url).await.unwrap(), "payload");
    }

    #[tokio::test]
    async fn test_expired_cache_entry_is_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
            .expect(1)
            .mount(&server)
            .await;
        let cache_dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new("test-agent/1.0")
            .unwrap()
            .with_cache(cache_dir.path().to_path_buf(), Some(Duration::ZERO));
        let url = format!("{}/page", server.uri());
        std::fs::write(fetcher.cache.as_ref().unwrap().path_for(&url), "stale").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(fetcher.fetch(&url).await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_unwritable_cache_still_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("payload"))
            .mount(&server)
            .await;
        let tmp = tempfile::tempdir().unwrap();
        let not_a_dir = tmp.path().join("cache");
        std::fs::write(&not_a_dir, "").unwrap();
        let fetcher = Fetcher::new("test-agent/1.0")
            .unwrap()
            .with_cache(not_a_dir, None);

        let body = fetcher.fetch(&format!("{}/page", server.uri())).await.unwrap();

        assert_eq!(body, "payload");
    }

    #[tokio::test]
    async fn test_urls_with_same_slug_are_cached_separately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cal"))
            .respond_with(ResponseTemplate::new(200).set_body_string("by query"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cal/id/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("by path"))
            .expect(1)
            .mount(&server)
            .await;
        let cache_dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new("test-agent/1.0")
            .unwrap()
            .with_cache(cache_dir.path().to_path_buf(), None);
        let by_query = format!("{}/cal?id=1", server.uri());
        let by_path = format!("{}/cal/id/1", server.uri());

        assert_eq!(fetcher.fetch(&by_query).await.unwrap(), "by query");
        assert_eq!(fetcher.fetch(&by_path).await.unwrap(), "by path");
        assert_eq!(fetcher.fetch(&by_query).await.unwrap(), "by query");
    }

    #[test]
    fn test_cache_file_names_stay_short() {
        let cache = ResponseCache {
            dir: PathBuf::from("/cache"),
            expiry: None,
        };
        let url = format!("https://example.org/feed?{}", "segment=long&".repeat(100));

        let path = cache.path_for(&url);
        let name = path.file_name().unwrap().to_str().unwrap();

        assert!(name.len() < 255);
        assert!(name.starts_with("https-example-org-feed"));
    }
}

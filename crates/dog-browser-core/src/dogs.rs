// SPDX-License-Identifier: AGPL-3.0
// Dog Browser Core - Dog API client
//
// Thin wrapper over the public dog image API. Every endpoint answers
// `{"message": ..., "status": "success"}`; anything else is an error.

use crate::cache::ResponseCache;
use crate::types::{AppError, AppSettings, MAX_IMAGE_COUNT};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const SUCCESS: &str = "success";

/// Response envelope shared by all endpoints
#[derive(Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: serde_json::Value,
}

/// Client for the dog image API
pub struct Dogs {
    http_client: Client,
    base: Url,
    cache: Option<ResponseCache>,
}

impl Dogs {
    /// Create a client for the API rooted at `base`
    pub fn new(base: &str) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(base, http_client)
    }

    /// Create a client from settings, including the response cache when enabled
    pub async fn from_settings(settings: &AppSettings) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| AppError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        let dogs = Self::with_client(&settings.api_base_url, http_client)?;
        if !settings.cache_enabled {
            return Ok(dogs);
        }

        let max_age = Duration::from_secs(settings.cache_max_age_secs);
        let cache = match &settings.cache_dir {
            Some(dir) => ResponseCache::open(dir, settings.cache_max_bytes, max_age).await?,
            None => ResponseCache::new(settings.cache_max_bytes, max_age).await?,
        };
        Ok(dogs.with_cache(cache))
    }

    fn with_client(base: &str, http_client: Client) -> Result<Self, AppError> {
        let base = Url::parse(base)
            .map_err(|e| AppError::InvalidConfig(format!("Invalid API base URL {}: {}", base, e)))?;
        if base.cannot_be_a_base() {
            return Err(AppError::InvalidConfig(format!(
                "API base URL cannot have paths: {}",
                base
            )));
        }

        Ok(Self {
            http_client,
            base,
            cache: None,
        })
    }

    /// Keep successful breed listings in `cache`
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// All breeds, with sub-breeds flattened to `breed-subbreed`
    pub async fn breeds(&self) -> Result<Vec<String>, AppError> {
        let url = self.breeds_url();

        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url.as_str()).await {
                tracing::debug!("GET {} served from cache", url);
                return parse_breeds(&body);
            }
        }

        let body = self.fetch(url.clone(), "Failed to fetch breeds").await?;
        let breeds = parse_breeds(&body)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url.as_str(), &body).await {
                tracing::warn!("Failed to cache breeds: {}", e);
            }
        }

        Ok(breeds)
    }

    /// Random image URLs, for one breed or across all breeds.
    ///
    /// `count` is capped at 50 and defaults to 50.
    pub async fn images(
        &self,
        breed: Option<&str>,
        count: Option<u32>,
    ) -> Result<Vec<String>, AppError> {
        let url = self.images_url(breed, count);
        let body = self.fetch(url, "Failed to fetch images").await?;
        parse_images(&body)
    }

    pub(crate) fn breeds_url(&self) -> Url {
        self.endpoint(["breeds", "list", "all"])
    }

    pub(crate) fn images_url(&self, breed: Option<&str>, count: Option<u32>) -> Url {
        let count = count.unwrap_or(MAX_IMAGE_COUNT).clamp(1, MAX_IMAGE_COUNT).to_string();

        match breed {
            None => self.endpoint(["breeds", "image", "random", count.as_str()]),
            Some(breed) => {
                let mut segments = vec!["breed"];
                segments.extend(breed.split('-').filter(|s| !s.is_empty()));
                segments.extend(["images", "random", count.as_str()]);
                self.endpoint(segments)
            }
        }
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        // Checked in the constructor
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn fetch(&self, url: Url, context: &'static str) -> Result<String, AppError> {
        let response = self.http_client.get(url.clone()).send().await?;
        let status = response.status();
        tracing::debug!("GET {} -> {}", url, status);

        if !status.is_success() {
            let detail = response
                .text()
                .await
                .ok()
                .and_then(|body| serde_json::from_str::<Envelope>(&body).ok())
                .and_then(|envelope| envelope.message.as_str().map(str::to_string));

            return Err(AppError::Http {
                context,
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response.text().await?)
    }
}

fn parse_envelope(body: &str) -> Result<serde_json::Value, AppError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| AppError::Serialization(format!("Failed to parse response: {}", e)))?;

    if envelope.status != SUCCESS {
        return Err(AppError::ApiStatus(envelope.status));
    }
    Ok(envelope.message)
}

/// Flatten `{"hound": ["afghan", "basset"], "pug": []}` into
/// `["hound-afghan", "hound-basset", "pug"]`
fn parse_breeds(body: &str) -> Result<Vec<String>, AppError> {
    let message = parse_envelope(body)?;
    let breeds: BTreeMap<String, Vec<String>> = serde_json::from_value(message)
        .map_err(|e| AppError::Serialization(format!("Failed to parse breeds: {}", e)))?;

    let mut flattened = Vec::new();
    for (breed, sub_breeds) in breeds {
        if sub_breeds.is_empty() {
            flattened.push(breed);
        } else {
            flattened.extend(sub_breeds.iter().map(|sub| format!("{}-{}", breed, sub)));
        }
    }
    Ok(flattened)
}

fn parse_images(body: &str) -> Result<Vec<String>, AppError> {
    let message = parse_envelope(body)?;
    serde_json::from_value(message)
        .map_err(|e| AppError::Serialization(format!("Failed to parse images: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{images_body, temp_dir, MockApi};

    const BREEDS: &str = r#"
{
  "message": {
    "affenpinscher": [],
    "gaddi": [],
    "hound": [
      "afghan",
      "basset",
      "ibizan",
      "plott",
      "walker"
    ],
    "weimaraner": []
  },
  "status": "success"
}"#;

    #[test]
    fn test_image_paths() {
        let dogs = Dogs::new("https://dog.ceo/api").unwrap();

        assert_eq!(
            dogs.breeds_url().as_str(),
            "https://dog.ceo/api/breeds/list/all"
        );
        assert_eq!(
            dogs.images_url(None, None).path(),
            "/api/breeds/image/random/50"
        );
        assert_eq!(
            dogs.images_url(None, Some(5)).path(),
            "/api/breeds/image/random/5"
        );
        assert_eq!(
            dogs.images_url(Some("hound"), None).path(),
            "/api/breed/hound/images/random/50"
        );
        assert_eq!(
            dogs.images_url(Some("hound-afghan"), Some(3)).path(),
            "/api/breed/hound/afghan/images/random/3"
        );
    }

    #[test]
    fn test_image_count_is_clamped() {
        let dogs = Dogs::new("https://dog.ceo/api/").unwrap();
        assert_eq!(
            dogs.images_url(None, Some(500)).path(),
            "/api/breeds/image/random/50"
        );
        assert_eq!(
            dogs.images_url(None, Some(0)).path(),
            "/api/breeds/image/random/1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            Dogs::new("not a url"),
            Err(AppError::InvalidConfig(_))
        ));
        assert!(matches!(
            Dogs::new("mailto:dogs@example.com"),
            Err(AppError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_parse_breeds_flattens_sub_breeds() {
        assert_eq!(
            parse_breeds(BREEDS).unwrap(),
            vec![
                "affenpinscher",
                "gaddi",
                "hound-afghan",
                "hound-basset",
                "hound-ibizan",
                "hound-plott",
                "hound-walker",
                "weimaraner",
            ]
        );
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let body = r#"{"message":["a.jpg"],"status":"success","code":200}"#;
        assert_eq!(parse_images(body).unwrap(), vec!["a.jpg"]);
    }

    #[tokio::test]
    async fn test_get_all_breeds_with_success() {
        let api = MockApi::start(&[("/breeds/list/all", 200, BREEDS)]).await;
        let dogs = Dogs::new(&api.base_url).unwrap();

        let breeds = dogs.breeds().await.unwrap();
        assert_eq!(breeds.len(), 8);
        assert_eq!(breeds[2], "hound-afghan");
    }

    #[tokio::test]
    async fn test_get_all_breeds_with_fail() {
        let body = BREEDS.replace("\"success\"", "\"fail\"");
        let api = MockApi::start(&[("/breeds/list/all", 200, body.as_str())]).await;
        let dogs = Dogs::new(&api.base_url).unwrap();

        let err = dogs.breeds().await.unwrap_err();
        assert_eq!(err.to_string(), "status is not success: fail");
    }

    #[tokio::test]
    async fn test_breeded_five_images() {
        let body = images_body(&["test.jpg", "test2.jpg", "test3.jpg", "test4.jpg", "test5.jpg"]);
        let api = MockApi::start(&[("/breed/hound/images/random/5", 200, body.as_str())]).await;
        let dogs = Dogs::new(&api.base_url).unwrap();

        assert_eq!(
            dogs.images(Some("hound"), Some(5)).await.unwrap(),
            vec!["test.jpg", "test2.jpg", "test3.jpg", "test4.jpg", "test5.jpg"]
        );
    }

    #[tokio::test]
    async fn test_sub_breed_images() {
        let body = images_body(&["afghan.jpg"]);
        let api = MockApi::start(&[("/breed/hound/afghan/images/random/50", 200, body.as_str())]).await;
        let dogs = Dogs::new(&api.base_url).unwrap();

        assert_eq!(
            dogs.images(Some("hound-afghan"), None).await.unwrap(),
            vec!["afghan.jpg"]
        );
    }

    #[tokio::test]
    async fn test_random_five_images() {
        let body = images_body(&["test.jpg", "test2.jpg", "test3.jpg", "test4.jpg", "test5.jpg"]);
        let api = MockApi::start(&[("/breeds/image/random/5", 200, body.as_str())]).await;
        let dogs = Dogs::new(&api.base_url).unwrap();

        assert_eq!(dogs.images(None, Some(5)).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_images_with_fail() {
        let body = images_body(&["test.jpg"]).replace("\"success\"", "\"fail\"");
        let api = MockApi::start(&[("/breeds/image/random/5", 200, body.as_str())]).await;
        let dogs = Dogs::new(&api.base_url).unwrap();

        let err = dogs.images(None, Some(5)).await.unwrap_err();
        assert!(matches!(err, AppError::ApiStatus(_)));
        assert_eq!(err.to_string(), "status is not success: fail");
    }

    #[tokio::test]
    async fn test_http_failure_carries_status_and_detail() {
        let body = r#"{"status":"error","message":"Breed not found (main breed does not exist)","code":404}"#;
        let api = MockApi::start(&[("/breed/cat/images/random/50", 404, body)]).await;
        let dogs = Dogs::new(&api.base_url).unwrap();

        let err = dogs.images(Some("cat"), None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch images: 404 (Breed not found (main breed does not exist))"
        );
    }

    #[tokio::test]
    async fn test_http_failure_without_json_body() {
        let api = MockApi::start(&[]).await;
        let dogs = Dogs::new(&api.base_url).unwrap();

        let err = dogs.breeds().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch breeds: 404");
    }

    #[tokio::test]
    async fn test_breeds_are_served_from_cache() {
        let api = MockApi::start(&[("/breeds/list/all", 200, BREEDS)]).await;
        let cache = ResponseCache::open(temp_dir(), 1024 * 1024, Duration::from_secs(60))
            .await
            .unwrap();
        let dogs = Dogs::new(&api.base_url).unwrap().with_cache(cache);

        let first = dogs.breeds().await.unwrap();
        let second = dogs.breeds().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(api.hits(), 1);
    }

    #[tokio::test]
    async fn test_random_images_are_never_cached() {
        let body = images_body(&["a.jpg"]);
        let api = MockApi::start(&[("/breeds/image/random/1", 200, body.as_str())]).await;
        let cache = ResponseCache::open(temp_dir(), 1024 * 1024, Duration::from_secs(60))
            .await
            .unwrap();
        let dogs = Dogs::new(&api.base_url).unwrap().with_cache(cache);

        dogs.images(None, Some(1)).await.unwrap();
        dogs.images(None, Some(1)).await.unwrap();
        assert_eq!(api.hits(), 2);
    }

    fn settings_for(api: &MockApi, cache_enabled: bool) -> AppSettings {
        AppSettings {
            api_base_url: api.base_url.clone(),
            cache_enabled,
            cache_dir: Some(temp_dir()),
            ..AppSettings::default()
        }
    }

    #[tokio::test]
    async fn test_from_settings_with_cache() {
        let api = MockApi::start(&[("/breeds/list/all", 200, BREEDS)]).await;
        let settings = settings_for(&api, true);
        let dogs = Dogs::from_settings(&settings).await.unwrap();

        dogs.breeds().await.unwrap();
        dogs.breeds().await.unwrap();
        assert_eq!(api.hits(), 1);
        assert_eq!(std::fs::read_dir(settings.cache_dir.unwrap()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_from_settings_without_cache() {
        let api = MockApi::start(&[("/breeds/list/all", 200, BREEDS)]).await;
        let settings = settings_for(&api, false);
        let dogs = Dogs::from_settings(&settings).await.unwrap();

        dogs.breeds().await.unwrap();
        dogs.breeds().await.unwrap();
        assert_eq!(api.hits(), 2);
        assert_eq!(std::fs::read_dir(settings.cache_dir.unwrap()).unwrap().count(), 0);
    }
}

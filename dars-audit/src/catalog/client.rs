//! Course catalog HTTP client
//!
//! Issues one class-search request per call. Retries and term fallback belong
//! to the resolver; this layer only classifies failures.
//!
//! Request shape:
//! `GET {base_url}?q=SUBJECT+NUMBER&client={client}[&campus={campus}]&term={term}`

use super::{CatalogCourse, CatalogError, CatalogQuery, CatalogSearch};
use async_trait::async_trait;
use dars_common::config::CatalogConfig;
use reqwest::header;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

const USER_AGENT: &str = concat!("dars-audit/", env!("CARGO_PKG_VERSION"));

/// Longest response excerpt carried in an error
const ERROR_SNIPPET_CHARS: usize = 200;

/// Spaces consecutive requests by a minimum interval
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait if necessary to honor the interval
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("Rate limiting: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

fn snippet(text: &str) -> String {
    let mut out: String = text.chars().take(ERROR_SNIPPET_CHARS).collect();
    if text.chars().count() > ERROR_SNIPPET_CHARS {
        out.push('…');
    }
    out
}

/// Extract candidate courses from a search response body
///
/// Candidates live under `data.courses`, else `data.classes`. Items may wrap the
/// record in a `course` envelope. Null or malformed items, and items with no
/// identifier, are dropped.
pub fn courses_from_body(body: &Value) -> Vec<CatalogCourse> {
    let data = body.get("data");
    let raw = data
        .and_then(|d| d.get("courses"))
        .and_then(Value::as_array)
        .or_else(|| data.and_then(|d| d.get("classes")).and_then(Value::as_array));

    let Some(items) = raw else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| match item.get("course") {
            Some(inner) if !inner.is_null() => inner,
            _ => item,
        })
        .filter(|item| !item.is_null())
        .filter_map(|item| match serde_json::from_value::<CatalogCourse>(item.clone()) {
            Ok(course) => Some(course),
            Err(e) => {
                debug!(error = %e, "Dropping malformed catalog item");
                None
            }
        })
        .filter(|course| course.identifier().is_some())
        .collect()
}

/// Course catalog API client
#[derive(Clone)]
pub struct CatalogClient {
    http_client: reqwest::Client,
    base_url: String,
    client_name: String,
    campus: String,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let rate_limiter = (config.min_request_interval_ms > 0).then(|| {
            Arc::new(RateLimiter::new(Duration::from_millis(
                config.min_request_interval_ms,
            )))
        });

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            client_name: config.client.clone(),
            campus: config.campus.clone(),
            rate_limiter,
        })
    }

    /// Query parameters in request order
    fn query_params(&self, query: &CatalogQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.search_text()),
            ("client", self.client_name.clone()),
        ];
        if query.campus_filter {
            params.push(("campus", self.campus.clone()));
        }
        params.push(("term", query.term.to_string()));
        params
    }
}

#[async_trait]
impl CatalogSearch for CatalogClient {
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogCourse>, CatalogError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.wait().await;
        }

        debug!(
            term = query.term,
            q = %query.search_text(),
            campus_filter = query.campus_filter,
            "Querying course catalog"
        );

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(status.as_u16(), snippet(&error_text)));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("application/json") {
            let text = response.text().await.unwrap_or_default();
            return Err(CatalogError::ContentType(content_type, snippet(&text)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        let courses = courses_from_body(&body);

        debug!(
            term = query.term,
            q = %query.search_text(),
            campus_filter = query.campus_filter,
            results = courses.len(),
            "Catalog query complete"
        );

        Ok(courses)
    }
}

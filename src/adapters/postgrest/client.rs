//! PostgREST HTTP Client - Rate-limited REST Client
//!
//! Wraps reqwest with bounded concurrency, request-rate limiting,
//! retries and authentication for every table the bottle store touches.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::auth::PostgrestAuth;
use crate::config::StoreConfig;

/// Configuration for the PostgREST client.
#[derive(Debug, Clone)]
pub struct PostgrestClientConfig {
  /// REST root, e.g. `https://project.example.co/rest/v1`.
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
  /// Request rate ceiling.
  pub requests_per_second: NonZeroU32,
}

impl PostgrestClientConfig {
  pub fn from_store(store: &StoreConfig) -> Self {
    Self {
      base_url: store.base_url.trim_end_matches('/').to_string(),
      timeout: Duration::from_millis(store.timeout_ms),
      max_concurrent: store.max_concurrent.max(1),
      max_retries: store.max_retries,
      retry_base_delay: Duration::from_millis(store.retry_base_delay_ms),
      requests_per_second: NonZeroU32::new(store.requests_per_second).unwrap_or(NonZeroU32::MIN),
    }
  }
}

/// A write hit a unique constraint (HTTP 409).
///
/// Returned inside `anyhow::Error`; callers that race on inserts check
/// for it with `err.is::<RowConflict>()` and re-read.
#[derive(Debug, thiserror::Error)]
#[error("row conflict on {table}: {body}")]
pub struct RowConflict {
  pub table: String,
  pub body: String,
}

/// Rate-limited HTTP client for a PostgREST endpoint.
pub struct PostgrestClient {
  /// Underlying HTTP client.
  http: Client,
  /// Credentials.
  auth: Arc<PostgrestAuth>,
  /// Client configuration.
  config: PostgrestClientConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
  /// Request-rate limiter shared by all calls.
  limiter: DefaultDirectRateLimiter,
}

impl PostgrestClient {
  /// Create a new client.
  pub fn new(auth: Arc<PostgrestAuth>, config: PostgrestClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(config.max_concurrent)
      .build()
      .context("Failed to build HTTP client")?;

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
    let limiter = RateLimiter::direct(Quota::per_second(config.requests_per_second));

    Ok(Self {
      http,
      auth,
      config,
      semaphore,
      limiter,
    })
  }

  fn url(&self, table: &str) -> String {
    format!("{}/{}", self.config.base_url, table)
  }

  /// `GET /table?query` decoded as rows.
  pub async fn select<T: DeserializeOwned>(
    &self,
    table: &str,
    query: &[(&str, String)],
  ) -> Result<Vec<T>> {
    let request = self.http.get(self.url(table)).query(query);
    let response = self.execute_with_retry(request, "GET", table).await?;
    response
      .json()
      .await
      .with_context(|| format!("Failed to decode rows from {table}"))
  }

  /// `POST /table` returning the inserted row.
  ///
  /// A unique-constraint violation surfaces as `RowConflict`.
  pub async fn insert<B, T>(&self, table: &str, body: &B) -> Result<T>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let request = self
      .http
      .post(self.url(table))
      .header("Prefer", "return=representation")
      .json(body);
    let response = self.execute_with_retry(request, "POST", table).await?;
    let mut rows: Vec<T> = response
      .json()
      .await
      .with_context(|| format!("Failed to decode inserted row from {table}"))?;
    rows
      .pop()
      .with_context(|| format!("Insert into {table} returned no row"))
  }

  /// `POST /table` without reading anything back.
  pub async fn insert_minimal<B: Serialize + ?Sized>(&self, table: &str, body: &B) -> Result<()> {
    let request = self
      .http
      .post(self.url(table))
      .header("Prefer", "return=minimal")
      .json(body);
    self.execute_with_retry(request, "POST", table).await?;
    Ok(())
  }

  /// `PATCH /table?filters` returning the updated rows.
  ///
  /// An empty result means the filters matched nothing; conditional
  /// updates use that to detect a lost race.
  pub async fn update<B, T>(&self, table: &str, filters: &[(&str, String)], body: &B) -> Result<Vec<T>>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let request = self
      .http
      .patch(self.url(table))
      .query(filters)
      .header("Prefer", "return=representation")
      .json(body);
    let response = self.execute_with_retry(request, "PATCH", table).await?;
    response
      .json()
      .await
      .with_context(|| format!("Failed to decode updated rows from {table}"))
  }

  /// Exact row count for `filters`, read from `Content-Range`.
  pub async fn count(&self, table: &str, filters: &[(&str, String)]) -> Result<u64> {
    let mut query: Vec<(&str, String)> = vec![("select", "id".to_string()), ("limit", "0".to_string())];
    query.extend(filters.iter().cloned());

    let request = self
      .http
      .get(self.url(table))
      .query(&query)
      .header("Prefer", "count=exact");
    let response = self.execute_with_retry(request, "GET", table).await?;

    response
      .headers()
      .get("content-range")
      .and_then(|v| v.to_str().ok())
      .and_then(content_range_total)
      .with_context(|| format!("Missing row count for {table}"))
  }

  /// Execute request with authentication, rate limiting, and retries.
  async fn execute_with_retry(
    &self,
    request: RequestBuilder,
    method: &str,
    table: &str,
  ) -> Result<Response> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .context("Semaphore closed")?;

    let mut last_error = None;

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = backoff_delay(self.config.retry_base_delay, attempt);
        debug!(attempt, delay_ms = delay.as_millis(), method, table, "Retrying request");
        sleep(delay).await;
      }

      self.limiter.until_ready().await;

      let req = self
        .auth
        .apply(request.try_clone().context("Failed to clone request")?);

      match req.send().await {
        Ok(response) => match response.status() {
          status if status.is_success() => return Ok(response),
          StatusCode::CONFLICT => {
            let body = response.text().await.unwrap_or_default();
            return Err(RowConflict {
              table: table.to_string(),
              body,
            }
            .into());
          }
          StatusCode::TOO_MANY_REQUESTS => {
            warn!(method, table, "Rate limited by backend, backing off");
            last_error = Some(anyhow::anyhow!("Rate limited"));
            continue;
          }
          status if status.is_server_error() => {
            warn!(status = %status, method, table, "Server error, retrying");
            last_error = Some(anyhow::anyhow!("Server error: {status}"));
            continue;
          }
          status => {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("{method} {table} failed with {status}: {body}"));
          }
        },
        Err(e) => {
          warn!(error = %e, attempt, method, table, "Request failed");
          last_error = Some(e.into());
          continue;
        }
      }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Max retries exceeded")))
  }

  /// Check if the backend is reachable.
  pub async fn health_check(&self) -> bool {
    self
      .select::<serde_json::Value>("bottles", &[("select", "id".to_string()), ("limit", "1".to_string())])
      .await
      .is_ok()
  }
}

/// Exponential backoff: base, 2x base, 4x base, ...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
  base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

/// Total from a `Content-Range` value such as `0-24/3573` or `*/0`.
fn content_range_total(value: &str) -> Option<u64> {
  value.rsplit_once('/')?.1.trim().parse().ok()
}

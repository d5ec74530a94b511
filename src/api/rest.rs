use crate::config::{Config, PreferReturn};
use crate::error::{IsRetryable, SeedError};
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const REST_PREFIX: &str = "rest/v1/";

/// One PostgREST query parameter, e.g. `code=eq.teaser` or `limit=1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    column: String,
    value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl AsRef<str>) -> Self {
        Self {
            column: column.into(),
            value: format!("eq.{}", value.as_ref()),
        }
    }

    pub fn limit(n: usize) -> Self {
        Self {
            column: "limit".to_string(),
            value: n.to_string(),
        }
    }

    pub fn select(columns: impl Into<String>) -> Self {
        Self {
            column: "select".to_string(),
            value: columns.into(),
        }
    }

    pub fn order(column: impl AsRef<str>, desc: bool) -> Self {
        let dir = if desc { "desc" } else { "asc" };
        Self {
            column: "order".to_string(),
            value: format!("{}.{dir}", column.as_ref()),
        }
    }

    pub fn to_pair(&self) -> (String, String) {
        (self.column.clone(), self.value.clone())
    }
}

/// Client for the `/rest/v1/` endpoints, carrying the static auth headers.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    prefer: PreferReturn,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    retry_policy: ExponentialBuilder,
}

impl RestClient {
    pub fn new(cfg: &Config) -> Result<Self, SeedError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("refseed/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.timeout_secs));
        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        let http = builder.default_headers(default_headers(cfg)?).build()?;

        let limiter = Quota::with_period(cfg.request_delay())
            .map(|quota| Arc::new(RateLimiter::direct(quota)));

        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(cfg.retry.min_delay_ms))
            .with_max_delay(Duration::from_millis(cfg.retry.max_delay_ms))
            .with_max_times(cfg.retry.max_times)
            .with_jitter();

        Ok(Self {
            http,
            base: cfg.rest_url.join(REST_PREFIX)?,
            prefer: cfg.prefer,
            limiter,
            retry_policy,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn table_url(&self, table: &str, filters: &[Filter]) -> Result<Url, SeedError> {
        let mut url = self.base.join(table)?;
        if !filters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for f in filters {
                pairs.append_pair(&f.column, &f.value);
            }
        }
        Ok(url)
    }

    /// `GET /rest/v1/`: succeeds when the API answers 200.
    pub async fn ping(&self) -> Result<(), SeedError> {
        let (status, body) = self.execute(Method::GET, self.base.clone(), None).await?;
        expect_status(status, body, &[StatusCode::OK]).map(drop)
    }

    /// `GET /rest/v1/{table}?limit=1`: succeeds when the table is readable.
    pub async fn check_table(&self, table: &str) -> Result<(), SeedError> {
        let url = self.table_url(table, &[Filter::limit(1)])?;
        let (status, body) = self.execute(Method::GET, url, None).await?;
        expect_status(status, body, &[StatusCode::OK]).map(drop)
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter],
    ) -> Result<Vec<T>, SeedError> {
        let url = self.table_url(table, filters)?;
        let (status, body) = self.execute(Method::GET, url, None).await?;
        let body = expect_status(status, body, &[StatusCode::OK])?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST /rest/v1/{table}`; 200 and 201 count as success.
    ///
    /// Returns the created rows under `return=representation`, otherwise an
    /// empty list.
    pub async fn insert<B: Serialize>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<Vec<Value>, SeedError> {
        let url = self.table_url(table, &[])?;
        let payload = serde_json::to_value(body)?;
        let (status, body) = self.execute(Method::POST, url, Some(&payload)).await?;
        let body = expect_status(status, body, &[StatusCode::OK, StatusCode::CREATED])?;
        Ok(self.representation(table, &body))
    }

    /// `PATCH /rest/v1/{table}?{filters}`; 200 and 204 count as success.
    pub async fn update<B: Serialize>(
        &self,
        table: &str,
        filters: &[Filter],
        body: &B,
    ) -> Result<Vec<Value>, SeedError> {
        let url = self.table_url(table, filters)?;
        let payload = serde_json::to_value(body)?;
        let (status, body) = self.execute(Method::PATCH, url, Some(&payload)).await?;
        let body = expect_status(status, body, &[StatusCode::OK, StatusCode::NO_CONTENT])?;
        Ok(self.representation(table, &body))
    }

    fn representation(&self, table: &str, body: &str) -> Vec<Value> {
        if self.prefer != PreferReturn::Representation || body.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(rows)) => {
                debug!(table, count = rows.len(), "server returned representation");
                rows
            }
            Ok(row) => {
                debug!(table, %row, "server returned a single row");
                vec![row]
            }
            Err(e) => {
                debug!(table, error = %e, "unparseable representation body");
                Vec::new()
            }
        }
    }

    /// Throttle, send, and retry transient failures. Returns status and body
    /// of the final attempt; non-transient statuses are left to the caller.
    /// POST is only replayed when the connection was never established.
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<(StatusCode, String), SeedError> {
        (|| async {
            if let Some(limiter) = self.limiter.as_ref() {
                limiter.until_ready().await;
            }
            let mut req = self.http.request(method.clone(), url.clone());
            if let Some(payload) = body {
                req = req.json(payload);
            }
            let resp = req.send().await?;
            let status = resp.status();
            let text = resp.text().await?;
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                return Err(SeedError::UnexpectedStatus { status, body: text });
            }
            Ok((status, text))
        })
        .retry(self.retry_policy.clone())
        .when(|e: &SeedError| should_retry(&method, e))
        .notify(|err, dur: Duration| {
            warn!(%method, url = %url, error = %err, "retrying request after {:?}", dur);
        })
        .await
    }
}

/// Reads and PATCH are idempotent. A POST may already have been stored when
/// it timed out or got a 5xx, so it is replayed only on connect failures.
fn should_retry(method: &Method, err: &SeedError) -> bool {
    if *method == Method::POST {
        matches!(err, SeedError::Reqwest(e) if e.is_connect())
    } else {
        err.is_retryable()
    }
}

fn default_headers(cfg: &Config) -> Result<HeaderMap, SeedError> {
    let invalid = |what: &str| SeedError::InvalidConfig(format!("{what} is not a valid header"));

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("apikey"),
        HeaderValue::from_str(&cfg.service_key).map_err(|_| invalid("service_key"))?,
    );
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cfg.service_key))
            .map_err(|_| invalid("service_key"))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("prefer"),
        HeaderValue::from_static(cfg.prefer.header_value()),
    );
    Ok(headers)
}

fn expect_status(
    status: StatusCode,
    body: String,
    accepted: &[StatusCode],
) -> Result<String, SeedError> {
    if accepted.contains(&status) {
        Ok(body)
    } else {
        Err(SeedError::UnexpectedStatus { status, body })
    }
}

use crate::config::Config;
use crate::controller::PageSource;
use crate::errors::GatewayError;
use crate::models::{
    Business, Checkin, HealthStatus, PageRequest, Record, Review, Tip, User,
};
use crate::query::{
    BusinessQuery, CheckinQuery, Endpoint, ListQuery, ReviewQuery, TipQuery, UserQuery,
};
use crate::retry::RetryPolicy;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Client for the Yelp dataset REST backend.
///
/// Every method is a read. Transient failures are retried according to the
/// configured [`RetryPolicy`]; everything else is returned to the caller as is.
#[derive(Clone)]
pub struct YelpGatewayClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    retry: RetryPolicy,
}

impl YelpGatewayClient {
    /// Creates a new `YelpGatewayClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - Resolved configuration (base URL, timeout, retry policy).
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = Url::parse(&config.api_base_url)
            .with_context(|| format!("Invalid API base URL: {}", config.api_base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot be used as a base: {}", base_url);
        }

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout(),
            retry: RetryPolicy::new(config.max_retries, config.retry_delay()),
        })
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the request URL. Segments are percent-encoded; `skip` is left out when zero.
    pub fn url_for(&self, endpoint: &Endpoint, page: Option<PageRequest>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for segment in endpoint.segments() {
                segments.push(segment);
            }
        }
        if let Some(page) = page {
            url.query_pairs_mut().extend_pairs(page.query_pairs());
        }
        url
    }

    async fn get_once(&self, url: &Url) -> Result<Value, GatewayError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Backend returned {} for {}: {}", status, url, body);
            return Err(GatewayError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let value = serde_json::from_str(&body)?;
        Ok(value)
    }

    async fn get_value(&self, url: Url) -> Result<Value, GatewayError> {
        tracing::debug!("GET {}", url);
        let label = format!("GET {}", url.path());
        self.retry.run(&label, || self.get_once(&url)).await
    }

    /// Fetches one page of any list query.
    pub async fn fetch_list<Q: ListQuery>(
        &self,
        query: &Q,
        page: Option<PageRequest>,
    ) -> Result<Vec<Q::Record>, GatewayError> {
        let url = self.url_for(&query.endpoint(), page);
        tracing::info!("Fetching {} (page: {:?})", query.describe(), page);

        let value = self.get_value(url).await?;
        let records = decode_list::<Q::Record>(value)?;

        tracing::info!("Received {} records for {}", records.len(), query.describe());
        Ok(records)
    }

    async fn fetch_one<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, GatewayError> {
        let url = self.url_for(&endpoint, None);
        let value = self.get_value(url).await?;
        if !value.is_object() {
            return Err(GatewayError::MalformedResponse(format!(
                "expected a JSON object from {}, got {}",
                endpoint.display_path(),
                json_type_name(&value)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    // ============ Businesses ============

    pub async fn list_businesses(
        &self,
        page: Option<PageRequest>,
    ) -> Result<Vec<Business>, GatewayError> {
        self.fetch_list(&BusinessQuery::All, page).await
    }

    pub async fn list_businesses_by_city(
        &self,
        city: &str,
        page: Option<PageRequest>,
    ) -> Result<Vec<Business>, GatewayError> {
        self.fetch_list(&BusinessQuery::City(city.to_string()), page)
            .await
    }

    pub async fn list_businesses_by_state(
        &self,
        state: &str,
        page: Option<PageRequest>,
    ) -> Result<Vec<Business>, GatewayError> {
        self.fetch_list(&BusinessQuery::State(state.to_string()), page)
            .await
    }

    pub async fn list_businesses_by_name(
        &self,
        name: &str,
        page: Option<PageRequest>,
    ) -> Result<Vec<Business>, GatewayError> {
        self.fetch_list(&BusinessQuery::Name(name.to_string()), page)
            .await
    }

    pub async fn list_businesses_by_min_stars(
        &self,
        min_stars: f64,
        page: Option<PageRequest>,
    ) -> Result<Vec<Business>, GatewayError> {
        self.fetch_list(&BusinessQuery::MinStars(min_stars), page)
            .await
    }

    pub async fn get_business(&self, business_id: &str) -> Result<Business, GatewayError> {
        self.fetch_one(Endpoint::keyed("businesses", business_id))
            .await
    }

    // ============ Reviews ============

    pub async fn list_reviews(
        &self,
        page: Option<PageRequest>,
    ) -> Result<Vec<Review>, GatewayError> {
        self.fetch_list(&ReviewQuery::All, page).await
    }

    pub async fn list_reviews_by_business(
        &self,
        business_id: &str,
        page: Option<PageRequest>,
    ) -> Result<Vec<Review>, GatewayError> {
        self.fetch_list(&ReviewQuery::Business(business_id.to_string()), page)
            .await
    }

    pub async fn list_reviews_by_user(
        &self,
        user_id: &str,
        page: Option<PageRequest>,
    ) -> Result<Vec<Review>, GatewayError> {
        self.fetch_list(&ReviewQuery::User(user_id.to_string()), page)
            .await
    }

    pub async fn get_review(&self, review_id: &str) -> Result<Review, GatewayError> {
        self.fetch_one(Endpoint::keyed("reviews", review_id)).await
    }

    // ============ Users ============

    pub async fn list_users(&self, page: Option<PageRequest>) -> Result<Vec<User>, GatewayError> {
        self.fetch_list(&UserQuery::All, page).await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, GatewayError> {
        self.fetch_one(Endpoint::keyed("users", user_id)).await
    }

    // ============ Tips ============

    pub async fn list_tips(&self, page: Option<PageRequest>) -> Result<Vec<Tip>, GatewayError> {
        self.fetch_list(&TipQuery::All, page).await
    }

    pub async fn list_tips_by_business(
        &self,
        business_id: &str,
        page: Option<PageRequest>,
    ) -> Result<Vec<Tip>, GatewayError> {
        self.fetch_list(&TipQuery::Business(business_id.to_string()), page)
            .await
    }

    pub async fn list_tips_by_user(
        &self,
        user_id: &str,
        page: Option<PageRequest>,
    ) -> Result<Vec<Tip>, GatewayError> {
        self.fetch_list(&TipQuery::User(user_id.to_string()), page)
            .await
    }

    // ============ Check-ins ============

    pub async fn list_checkins(
        &self,
        page: Option<PageRequest>,
    ) -> Result<Vec<Checkin>, GatewayError> {
        self.fetch_list(&CheckinQuery::All, page).await
    }

    pub async fn list_checkins_by_business(
        &self,
        business_id: &str,
        page: Option<PageRequest>,
    ) -> Result<Vec<Checkin>, GatewayError> {
        self.fetch_list(&CheckinQuery::Business(business_id.to_string()), page)
            .await
    }

    // ============ Health ============

    pub async fn health_check(&self) -> Result<HealthStatus, GatewayError> {
        self.fetch_one(Endpoint::root("health")).await
    }

    /// Connectivity probe: health, then a small page of businesses and reviews.
    pub async fn probe(&self) -> Result<ProbeReport, GatewayError> {
        let health = self.health_check().await?;
        tracing::info!("API health: {}", health.status);

        let sample = Some(PageRequest::first(PROBE_SAMPLE_SIZE));
        let businesses = self.list_businesses(sample).await?;
        let reviews = self.list_reviews(sample).await?;

        Ok(ProbeReport {
            health: health.status,
            business_count: businesses.len(),
            review_count: reviews.len(),
        })
    }
}

const PROBE_SAMPLE_SIZE: u32 = 5;

/// Outcome of [`YelpGatewayClient::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub health: String,
    pub business_count: usize,
    pub review_count: usize,
}

impl<Q: ListQuery> PageSource<Q> for YelpGatewayClient {
    async fn fetch_page(
        &self,
        query: &Q,
        page: PageRequest,
    ) -> Result<Vec<Q::Record>, GatewayError> {
        self.fetch_list(query, Some(page)).await
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decodes a list response, rejecting anything that is not a JSON array of valid records.
pub fn decode_list<R: Record>(value: Value) -> Result<Vec<R>, GatewayError> {
    if !value.is_array() {
        return Err(GatewayError::MalformedResponse(format!(
            "expected a JSON array, got {}",
            json_type_name(&value)
        )));
    }

    let records: Vec<R> = serde_json::from_value(value)?;
    for (index, record) in records.iter().enumerate() {
        record.validate().map_err(|reason| {
            GatewayError::MalformedResponse(format!("record {}: {}", index, reason))
        })?;
    }
    Ok(records)
}

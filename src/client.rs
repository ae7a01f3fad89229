//! HTTP client for the itinerary service

use crate::{TransportError, TripError, TripForm, TripRequest, TripResponse};
use reqwest::Client;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const GENERATE_TRIP_PATH: &str = "/api/generate-trip";

/// Base URL of the itinerary service
pub const API_URL_ENV: &str = "TRIP_PLANNER_API_URL";
/// Optional whole-request timeout in seconds
pub const TIMEOUT_ENV: &str = "TRIP_PLANNER_TIMEOUT_SECS";

/// Where and how to reach the itinerary service
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for unset
    /// or unparseable values
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(API_URL_ENV)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = lookup(TIMEOUT_ENV).and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(0) => None,
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(_) => {
                warn!(value = %raw, "Ignoring unparseable {}", TIMEOUT_ENV);
                None
            }
        });

        Self { base_url, timeout }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Full URL of the generate-trip endpoint
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), GENERATE_TRIP_PATH)
    }
}

/// Client for submitting trip forms.
///
/// At most one request is outstanding per client. An in-flight request is
/// aborted by [`TripClient::cancel`] or by dropping the future returned from
/// [`TripClient::submit`]; either way the slot is freed for the next submit.
pub struct TripClient {
    http_client: Client,
    endpoint: String,
    /// Cancel token of the outstanding request; `Some` while busy
    in_flight: Mutex<Option<CancellationToken>>,
}

impl TripClient {
    /// Create a new trip client
    pub fn new(config: ClientConfig) -> Result<Self, TripError> {
        debug!(base_url = %config.base_url, "Creating new trip client");
        let mut builder = Client::builder().user_agent(concat!("trip-planner/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint(),
            in_flight: Mutex::new(None),
        })
    }

    pub fn from_env() -> Result<Self, TripError> {
        Self::new(ClientConfig::from_env())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether a request is currently outstanding
    pub fn is_busy(&self) -> bool {
        lock_slot(&self.in_flight).is_some()
    }

    /// Abort the outstanding request, if any. The client stays usable.
    pub fn cancel(&self) {
        if let Some(token) = lock_slot(&self.in_flight).as_ref() {
            info!("Cancelling in-flight trip request");
            token.cancel();
        }
    }

    /// Validate `form` and send it.
    ///
    /// Validation failures never reach the network.
    #[instrument(level = "info", skip(self, form), fields(destination = %form.destination.trim()))]
    pub async fn submit(&self, form: &TripForm) -> Result<TripResponse, TripError> {
        let request = form.validate().map_err(|e| {
            warn!(error = %e, "Trip form rejected");
            e
        })?;
        self.send(request).await
    }

    /// Send an already-normalized request
    pub async fn send(&self, request: TripRequest) -> Result<TripResponse, TripError> {
        let guard = InFlightGuard::acquire(&self.in_flight).ok_or_else(|| {
            warn!("Trip request already in flight, rejecting submission");
            TripError::Busy
        })?;

        let outcome = tokio::select! {
            biased;
            _ = guard.token.cancelled() => {
                warn!("Trip request cancelled before completion");
                Err(TransportError::Cancelled)
            }
            result = self.post(&request) => result,
        };

        drop(guard);
        outcome.map_err(TripError::from)
    }

    async fn post(&self, request: &TripRequest) -> Result<TripResponse, TransportError> {
        info!(
            endpoint = %self.endpoint,
            dates = %request.dates,
            budget = ?request.budget,
            "Making HTTP request to itinerary service"
        );

        let start_time = Instant::now();
        let response = self.http_client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();

        info!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "HTTP request completed"
        );

        if !status.is_success() {
            error!(status = %status, "Itinerary service returned an error status");
            return Err(TransportError::Status(status));
        }

        let body = response.text().await?;
        debug!(body_length = body.len(), "Received response body");

        let result = TripResponse::from_json(&body);
        match &result {
            Ok(TripResponse::Itinerary { text, days_inferred }) => {
                info!(itinerary_length = text.len(), days_inferred = ?days_inferred, "Itinerary received");
            }
            Ok(TripResponse::Error { message }) => {
                warn!(message = %message, "Itinerary service reported an error");
            }
            Ok(TripResponse::Download { url }) => {
                info!(url = %url, "Itinerary service returned a download link");
            }
            Err(e) => {
                error!(error = %e, "Failed to decode itinerary response");
            }
        }

        result
    }
}

fn lock_slot(slot: &Mutex<Option<CancellationToken>>) -> MutexGuard<'_, Option<CancellationToken>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds the single in-flight slot until dropped.
///
/// Claiming the slot and registering the cancel token happen under one lock,
/// so `cancel()` reaches every request that `is_busy()` reports.
struct InFlightGuard<'a> {
    slot: &'a Mutex<Option<CancellationToken>>,
    token: CancellationToken,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(slot: &'a Mutex<Option<CancellationToken>>) -> Option<Self> {
        let mut current = lock_slot(slot);
        if current.is_some() {
            return None;
        }
        let token = CancellationToken::new();
        *current = Some(token.clone());
        Some(Self { slot, token })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock_slot(self.slot).take();
    }
}

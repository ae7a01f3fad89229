//! # Trip Planner Library
//!
//! A typed client for an AI itinerary generator. Trip parameters are collected
//! into a [`TripForm`], validated locally, and sent as a single JSON POST to the
//! `/api/generate-trip` endpoint. The reply is decoded into a [`TripResponse`].

pub mod client;
pub mod dates;
pub mod form;
pub mod view;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types for convenience
pub use client::{ClientConfig, TripClient};
pub use dates::DateSelection;
pub use form::TripForm;
pub use view::PlannerView;

/// Message shown for every transport failure; details only go to the logs
pub const TRANSPORT_ERROR_MESSAGE: &str = "No se pudo conectar con el servidor.";

/// Errors for a single trip submission
#[derive(Error, Debug)]
pub enum TripError {
    #[error("Invalid trip form: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("A trip request is already in flight")]
    Busy,
}

impl From<reqwest::Error> for TripError {
    fn from(err: reqwest::Error) -> Self {
        TripError::Transport(TransportError::Http(err))
    }
}

impl TripError {
    /// Text to show the traveller
    pub fn user_message(&self) -> &'static str {
        match self {
            TripError::Validation(e) => e.user_message(),
            TripError::Transport(_) => TRANSPORT_ERROR_MESSAGE,
            TripError::Busy => "Ya hay una solicitud en curso.",
        }
    }
}

/// Form problems caught before anything is sent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Destination must not be blank")]
    EmptyDestination,

    #[error("Both start and end dates must be selected")]
    MissingDates,

    #[error("Start date {from} is after end date {to}")]
    InvertedRange { from: NaiveDate, to: NaiveDate },

    #[error("Flexible trips must last between 1 and 30 days, got {0}")]
    FlexibleDaysOutOfRange(u32),

    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    #[error("Budget must be a non-negative number, got {0:?}")]
    InvalidBudget(String),

    #[error("Unrecognized dates: {0}")]
    InvalidDates(String),
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::EmptyDestination => "Introduce un destino.",
            ValidationError::MissingDates
            | ValidationError::InvertedRange { .. }
            | ValidationError::InvalidDates(_) => "Selecciona una fecha válida o activa fechas flexibles.",
            ValidationError::FlexibleDaysOutOfRange(_) => "El número de días debe estar entre 1 y 30.",
            ValidationError::InvalidMonth(_) => "Selecciona un mes válido.",
            ValidationError::InvalidBudget(_) => "El presupuesto debe ser un número mayor o igual que cero.",
        }
    }
}

/// Failures between sending the request and decoding the reply
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Server responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    #[error("Request cancelled")]
    Cancelled,
}

/// Normalized request body for `/api/generate-trip`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    pub dates: String,
    pub budget: Option<f64>,
}

/// Decoded reply from the itinerary service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TripResponse {
    /// Generated itinerary text, to be shown verbatim
    Itinerary {
        text: String,
        days_inferred: Option<u64>,
    },
    /// Error reported by the service in a well-formed body
    Error { message: String },
    /// Older servers render a PDF and return its location instead of text
    Download { url: String },
}

/// Wire shape before the exactly-one-field check
#[derive(Debug, Deserialize)]
struct RawTripResponse {
    itinerary: Option<String>,
    error: Option<String>,
    download_url: Option<String>,
    days_inferred: Option<serde_json::Value>,
}

impl TryFrom<RawTripResponse> for TripResponse {
    type Error = TransportError;

    fn try_from(raw: RawTripResponse) -> Result<Self, TransportError> {
        // Non-numeric day counts are dropped rather than failing the whole reply
        let days_inferred = raw.days_inferred.as_ref().and_then(serde_json::Value::as_u64);

        match (raw.itinerary, raw.error, raw.download_url) {
            (Some(text), None, None) => Ok(TripResponse::Itinerary { text, days_inferred }),
            (None, Some(message), None) => Ok(TripResponse::Error { message }),
            (None, None, Some(url)) => Ok(TripResponse::Download { url }),
            (None, None, None) => Err(TransportError::MalformedBody(
                "expected one of itinerary, error or download_url".to_string(),
            )),
            _ => Err(TransportError::MalformedBody(
                "more than one of itinerary, error and download_url is set".to_string(),
            )),
        }
    }
}

impl TripResponse {
    /// Decode a response body
    pub fn from_json(body: &str) -> Result<Self, TransportError> {
        let raw: RawTripResponse =
            serde_json::from_str(body).map_err(|e| TransportError::MalformedBody(e.to_string()))?;
        raw.try_into()
    }

    pub fn itinerary(&self) -> Option<&str> {
        match self {
            TripResponse::Itinerary { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Main public API function: build a client from the environment and submit once
pub async fn generate_trip(form: &TripForm) -> Result<TripResponse, TripError> {
    let client = TripClient::from_env()?;
    client.submit(form).await
}

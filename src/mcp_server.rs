// src/mcp_server.rs

use rmcp::{
    ServerHandler, ServiceExt,
    model::{ServerCapabilities, ServerInfo},
    schemars, tool,
    transport::stdio,
};
use trip_planner::dates::{parse_iso_date, DEFAULT_FLEX_DAYS};
use trip_planner::{DateSelection, TripClient, TripError, TripForm, TripResponse, ValidationError};
use serde::Deserialize;
use anyhow::Result;
use tracing::{info, warn, error, debug};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use std::path::PathBuf;

/// Trip planning MCP server
#[derive(Default, Clone)]
pub struct TripServer;

impl TripServer {
    pub fn new() -> Self {
        Self
    }

    /// Initialize logging to file; stdout carries the MCP transport
    fn init_logging() -> Result<()> {
        let log_dir = PathBuf::from("logs");
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&log_dir, "trip-planner-mcp.log");

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"))
            .add_directive("trip_planner=debug".parse()?);

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
            )
            .init();

        info!("Logging initialized - logs will be written to logs/trip-planner-mcp.log.*");
        Ok(())
    }
}

/// Trip dates in one of three mutually exclusive shapes
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct DateParams {
    #[schemars(description = "First day of the trip in YYYY-MM-DD format - use with to_date")]
    pub from_date: Option<String>,
    #[schemars(description = "Last day of the trip in YYYY-MM-DD format - use with from_date")]
    pub to_date: Option<String>,
    #[schemars(description = "Month for flexible dates (1-12) - use with year and days")]
    pub month: Option<u32>,
    #[schemars(description = "Year for flexible dates")]
    pub year: Option<i32>,
    #[schemars(description = "Number of days for flexible dates, 1-30 (default: 14)")]
    pub days: Option<u32>,
    #[schemars(description = "Dates text as the service expects it, e.g. '2025-06-01 a 2025-06-10' or '10 dias en junio 2025'")]
    pub dates: Option<String>,
}

/// Itinerary generation parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct TripParams {
    #[schemars(description = "Destination city or country (e.g., Tokio, París)")]
    pub destination: String,
    #[serde(flatten)]
    pub dates: DateParams,
    #[schemars(description = "Total budget in euros (optional, non-negative)")]
    pub budget: Option<f64>,
}

#[tool(tool_box)]
impl TripServer {
    /// Generate an itinerary for a trip
    #[tool(description = "Generate an AI travel itinerary. Specify dates either as from_date/to_date, as month/year/days for flexible dates, or as a raw dates string - only one mode.")]
    async fn generate_trip(
        &self,
        #[tool(aggr)] params: TripParams,
    ) -> String {
        info!(
            destination = %params.destination,
            from_date = params.dates.from_date.as_deref(),
            to_date = params.dates.to_date.as_deref(),
            month = params.dates.month,
            days = params.dates.days,
            budget = params.budget,
            "Trip generation request received"
        );

        let dates = match build_date_selection(&params.dates) {
            Ok(dates) => dates,
            Err(e) => {
                warn!("Invalid trip dates: {}", e);
                return error_json(&e.to_string());
            }
        };

        let mut form = TripForm::new(params.destination, dates);
        form.budget = params.budget.map(|b| b.to_string());

        let client = match TripClient::from_env() {
            Ok(client) => client,
            Err(e) => {
                error!("Error creating trip client: {}", e);
                return error_json(&format!("Error creating trip client: {}", e));
            }
        };

        match client.submit(&form).await {
            Ok(response) => {
                debug!("Trip generation completed");
                format_trip_response_json(response)
            }
            Err(TripError::Validation(e)) => {
                warn!("Trip form rejected: {}", e);
                error_json(&e.to_string())
            }
            Err(e) => {
                error!("Trip generation failed: {}", e);
                error_json(&format!("Trip generation failed: {}", e))
            }
        }
    }

    /// Show the dates field a selection would send
    #[tool(description = "Compose the dates string the itinerary service expects, without generating an itinerary.")]
    async fn compose_dates(
        &self,
        #[tool(aggr)] params: DateParams,
    ) -> String {
        match build_date_selection(&params).and_then(|d| d.compose()) {
            Ok(dates) => serde_json::json!({ "dates": dates }).to_string(),
            Err(e) => {
                warn!("Could not compose dates: {}", e);
                error_json(&e.to_string())
            }
        }
    }
}

fn build_date_selection(params: &DateParams) -> Result<DateSelection, ValidationError> {
    let flexible_extras = params.year.is_some() || params.days.is_some();
    match (&params.dates, &params.from_date, &params.to_date, params.month, flexible_extras) {
        (Some(dates), None, None, None, false) => dates.parse(),
        (None, Some(from), Some(to), None, false) => {
            Ok(DateSelection::range(parse_iso_date(from)?, parse_iso_date(to)?))
        }
        (None, None, None, Some(month), _) => {
            let year = params
                .year
                .ok_or_else(|| ValidationError::InvalidDates("year is required with month".to_string()))?;
            DateSelection::flexible_calendar_month(month, year, params.days.unwrap_or(DEFAULT_FLEX_DAYS))
        }
        (None, None, None, None, true) => Err(ValidationError::InvalidDates(
            "month is required with year/days".to_string(),
        )),
        (None, Some(_), None, None, false) | (None, None, Some(_), None, false) => Err(ValidationError::MissingDates),
        (None, None, None, None, false) => Err(ValidationError::InvalidDates(
            "Must specify from_date/to_date, month/year/days, or dates".to_string(),
        )),
        _ => Err(ValidationError::InvalidDates(
            "Cannot mix date modes - choose one of from_date/to_date, month/year/days, or dates".to_string(),
        )),
    }
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

fn format_trip_response_json(response: TripResponse) -> String {
    match response {
        TripResponse::Itinerary { text, days_inferred } => serde_json::json!({
            "itinerary": text,
            "days_inferred": days_inferred,
        })
        .to_string(),
        TripResponse::Error { message } => error_json(&message),
        TripResponse::Download { url } => serde_json::json!({
            "download_url": url,
            "message": "The itinerary service returned a downloadable PDF"
        })
        .to_string(),
    }
}

#[tool(tool_box)]
impl ServerHandler for TripServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("A trip planning server. generate_trip sends a destination, dates and optional budget to the itinerary service and returns the itinerary text as JSON; compose_dates previews the dates string.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = TripServer::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting MCP Trip Server");

    let server = TripServer::new();
    let transport = stdio();

    let service = server.serve(transport).await?;
    info!("MCP service started, waiting for requests");

    service.waiting().await?;

    info!("MCP service shutting down");
    Ok(())
}

//! CLI interface for trip-planner

use anyhow::Result;
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use std::fs;
use tracing_subscriber::EnvFilter;
use trip_planner::dates::{parse_iso_date, DEFAULT_FLEX_DAYS};
use trip_planner::{ClientConfig, DateSelection, PlannerView, TripClient, TripForm, ValidationError};

#[derive(Parser)]
#[command(name = "trip-planner")]
#[command(about = "Generate AI travel itineraries from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Date flags shared by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct DateArgs {
    /// First day of the trip (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,
    /// Last day of the trip (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,
    /// Use flexible dates: a number of days within a month
    #[arg(long)]
    flexible: bool,
    /// Month for flexible dates (1-12, defaults to the current month)
    #[arg(long, requires = "flexible")]
    month: Option<u32>,
    /// Year for flexible dates (defaults to the current year)
    #[arg(long, requires = "flexible")]
    year: Option<i32>,
    /// Number of days for flexible dates (1-30)
    #[arg(long, default_value_t = DEFAULT_FLEX_DAYS, requires = "flexible")]
    days: u32,
    /// Dates exactly as the service expects them, e.g. "10 dias en junio 2025"
    #[arg(long, conflicts_with_all = ["from", "to", "flexible"])]
    dates: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate an itinerary for a trip
    Plan {
        /// Destination city or country
        #[arg(short, long)]
        destination: String,
        #[command(flatten)]
        date_args: DateArgs,
        /// Total budget in euros
        #[arg(short, long)]
        budget: Option<String>,
        /// Base URL of the itinerary service (overrides TRIP_PLANNER_API_URL)
        #[arg(long)]
        api_url: Option<String>,
        /// Output file for the itinerary text
        #[arg(short, long)]
        output: Option<String>,
        /// Print the decoded response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the dates field a selection would send, without contacting the service
    Dates {
        #[command(flatten)]
        date_args: DateArgs,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn date_selection(args: &DateArgs) -> Result<DateSelection, ValidationError> {
    if let Some(dates) = &args.dates {
        return dates.parse();
    }

    if args.flexible {
        let today = Local::now().date_naive();
        let month = args.month.unwrap_or_else(|| today.month());
        let year = args.year.unwrap_or_else(|| today.year());
        return DateSelection::flexible_calendar_month(month, year, args.days);
    }

    let from = args.from.as_deref().map(parse_iso_date).transpose()?;
    let to = args.to.as_deref().map(parse_iso_date).transpose()?;
    Ok(DateSelection::Range { from, to })
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            destination,
            date_args,
            budget,
            api_url,
            output,
            json,
        } => {
            let dates = match date_selection(&date_args) {
                Ok(dates) => dates,
                Err(e) => {
                    eprintln!("{} ({})", e.user_message(), e);
                    std::process::exit(2);
                }
            };

            let mut form = TripForm::new(destination, dates);
            form.budget = budget;

            let mut config = ClientConfig::from_env();
            if let Some(api_url) = api_url {
                config.base_url = api_url;
            }
            let client = TripClient::new(config)?;

            eprintln!("Generando itinerario...");
            let mut view = PlannerView::new();
            let outcome = client.submit(&form).await;

            if json {
                match &outcome {
                    Ok(response) => println!("{}", serde_json::to_string_pretty(response)?),
                    Err(e) => println!("{}", serde_json::json!({ "error": e.user_message() })),
                }
            }

            view.apply(outcome);

            if let Some(itinerary) = &view.itinerary {
                if let Some(output_file) = output {
                    fs::write(&output_file, itinerary)?;
                    eprintln!("Itinerario guardado en {}", output_file);
                } else if !json {
                    println!("{}", itinerary);
                }
                if let Some(days) = view.days_inferred {
                    eprintln!("Días detectados por el servicio: {}", days);
                }
            } else if let Some(url) = &view.download_url {
                if !json {
                    println!("{}", url);
                }
            } else if let Some(message) = &view.error {
                eprintln!("Error: {}", message);
                std::process::exit(1);
            }
        }
        Commands::Dates { date_args } => match date_selection(&date_args).and_then(|d| d.compose()) {
            Ok(dates) => println!("{}", dates),
            Err(e) => {
                eprintln!("{} ({})", e.user_message(), e);
                std::process::exit(2);
            }
        },
    }

    Ok(())
}

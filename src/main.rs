use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;

use chrono::Utc;
use overhead::config::Config;
use overhead::elements::{parse_tle_response, TleError};
use overhead::geometry::ObserverLocation;
use overhead::predict::PassFilter;
use overhead::services::Services;

#[derive(Parser)]
#[command(name = "overhead")]
#[command(about = "Satellite pass prediction and viewing conditions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Print predicted passes for one satellite
    Passes {
        #[arg(long)]
        norad_id: u32,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        #[arg(long)]
        days: Option<f64>,
        #[arg(long)]
        min_elevation: Option<f64>,
        #[arg(long)]
        max_results: Option<usize>,
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Print the merged satellite catalog
    Catalog {
        #[arg(long)]
        search: Option<String>,
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Check a two- or three-line element file
    ValidateTle { file: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(config.as_deref()).await,
        Commands::Passes {
            norad_id,
            lat,
            lon,
            days,
            min_elevation,
            max_results,
            config,
        } => {
            let filter = PassFilter {
                min_elevation_deg: min_elevation,
                max_results,
            };
            passes(config.as_deref(), norad_id, lat.zip(lon), days, filter).await
        }
        Commands::Catalog { search, config } => catalog(config.as_deref(), search.as_deref()).await,
        Commands::ValidateTle { file } => validate_tle(&file),
    }
}

fn load_config(path: Option<&str>) -> Option<Config> {
    let Some(path) = path else {
        return Some(Config::default());
    };
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            None
        }
    }
}

fn load_services(path: Option<&str>) -> Option<Services> {
    let config = load_config(path)?;
    match Services::from_config(config) {
        Ok(services) => Some(services),
        Err(e) => {
            eprintln!("Error creating HTTP client: {}", e);
            None
        }
    }
}

async fn serve(path: Option<&str>) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };
    match overhead::web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn passes(
    path: Option<&str>,
    norad_id: u32,
    coordinates: Option<(f64, f64)>,
    days: Option<f64>,
    mut filter: PassFilter,
) -> ExitCode {
    let Some(services) = load_services(path) else {
        return ExitCode::FAILURE;
    };

    let observer = match coordinates {
        Some((lat, lon)) => ObserverLocation::new(lat, lon),
        None => match services.default_observer() {
            Some(observer) => observer,
            None => {
                eprintln!("No valid station in config; pass --lat and --lon");
                return ExitCode::FAILURE;
            }
        },
    };
    let prediction = &services.config.prediction;
    let days = days.unwrap_or(prediction.default_days);
    filter.min_elevation_deg = filter.min_elevation_deg.or(Some(prediction.min_elevation));

    let report = match services
        .passes(norad_id, observer, Utc::now(), days, filter)
        .await
    {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Prediction failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(warning) = &report.warning {
        eprintln!("Warning: {}", warning);
    }
    if let Some(age) = report.elements_age_days {
        println!("{} ({}), elements {:.1} days old", report.name, norad_id, age);
    }
    println!("{} passes", report.passes.len());
    for pass in &report.passes {
        println!(
            "  {}  {:>5.1}°  {:>4}s  az {:>5.1}° -> {:>5.1}°{}",
            pass.start_time.format("%Y-%m-%d %H:%M:%S"),
            pass.max_elevation_deg,
            pass.duration_seconds,
            pass.start_azimuth_deg,
            pass.end_azimuth_deg,
            if pass.is_visible { "  visible" } else { "" }
        );
    }
    ExitCode::SUCCESS
}

async fn catalog(path: Option<&str>, search: Option<&str>) -> ExitCode {
    let Some(services) = load_services(path) else {
        return ExitCode::FAILURE;
    };

    let build = services.catalog.build(false).await;
    if let Some(error) = &build.error {
        eprintln!("Warning: {}", error);
    }
    if build.satellites.is_empty() {
        return ExitCode::FAILURE;
    }

    let satellites = overhead::catalog::search_satellites(&build.satellites, search.unwrap_or(""));
    for sat in &satellites {
        println!(
            "{:>6}  {:<24} {:<9} {}",
            sat.norad_id,
            sat.name,
            sat.category.to_string(),
            sat.downlink.as_deref().unwrap_or("-")
        );
    }
    println!("{} satellites", satellites.len());
    ExitCode::SUCCESS
}

fn validate_tle(path: &str) -> ExitCode {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match parse_tle_response(&content, Utc::now()) {
        Ok(elements) => {
            println!("Elements are valid: {}", elements.display_name());
            if let Some(epoch) = elements.epoch() {
                println!("  epoch {}", epoch);
            }
            ExitCode::SUCCESS
        }
        Err(e @ TleError::Checksum { .. }) => {
            eprintln!("Checksum error: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Parse error: {}", e);
            ExitCode::FAILURE
        }
    }
}

mod config;
mod db;
mod error;
mod feed;
mod geo;
mod ingest;
mod models;
#[cfg(test)]
mod tests;

use config::Config;
use db::Repository;
use error::Result;
use ingest::{ingest, SourceSet};
use models::{GeoLevel, SeriesMode, SeriesPoint};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load()?;

    let repository = Repository::new(&config.db_path).await?;

    match args.get(1).map(String::as_str) {
        // Full ingestion run over every configured source, in order
        None => {
            for source in &config.sources {
                let set = SourceSet::load(
                    source.variant,
                    &source.confirmed,
                    &source.deaths,
                    source.recovered.as_deref(),
                )?;
                let summary = ingest(&repository, &set, source.merge_policy).await?;
                println!(
                    "{}: {} facts from {} rows ({} already tracked)",
                    source.confirmed,
                    summary.facts_written,
                    summary.rows_read,
                    summary.facts_skipped
                );
            }
        }

        Some("--cleanup-boroughs") => {
            let removed = repository.cleanup_boroughs(config.borough_policy).await?;
            println!("Removed {} borough-level facts", removed);
        }

        Some("--list-countries") => {
            for country in repository.list_countries().await? {
                println!("{}\t{}", country.id, country.name);
            }
        }

        Some("--list-subdivisions") => {
            let country = parse_id(args.get(2))?;
            for subdivision in repository.list_subdivisions(country).await? {
                println!("{}\t{}", subdivision.id, subdivision.name);
            }
        }

        Some("--list-counties") => {
            let subdivision = parse_id(args.get(2))?;
            for county in repository.list_counties(subdivision).await? {
                println!("{}\t{}", county.id, county.name);
            }
        }

        Some("--series") => {
            let mode = args
                .last()
                .and_then(|arg| SeriesMode::from_arg(arg))
                .ok_or_else(|| {
                    anyhow::anyhow!("expected a mode: raw, rolling-average or derivative")
                })?;

            let points = match args.get(2).map(String::as_str) {
                Some("world") => repository.world_series(mode).await?,
                Some(level) => {
                    let level = GeoLevel::from_arg(level).ok_or_else(|| {
                        anyhow::anyhow!("expected a level: world, country, subdivision or county")
                    })?;
                    let geography = parse_id(args.get(3))?;
                    repository.series(level, geography, mode).await?
                }
                None => return Err(anyhow::anyhow!("expected a level and geography id").into()),
            };

            for point in points {
                print_point(&point);
            }
        }

        Some(other) => {
            eprintln!("Unknown flag {other:?}");
            eprintln!(
                "Usage: covid-charts [--cleanup-boroughs | --list-countries | \
                 --list-subdivisions <id> | --list-counties <id> | \
                 --series <world|country|subdivision|county> [id] <raw|rolling-average|derivative>]"
            );
            std::process::exit(2);
        }
    }

    Ok(())
}

fn parse_id(arg: Option<&String>) -> Result<i64> {
    arg.and_then(|arg| arg.parse().ok())
        .ok_or_else(|| anyhow::anyhow!("expected a numeric geography id").into())
}

fn print_point(point: &SeriesPoint) {
    let cell = |value: Option<i64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    println!(
        "{}\t{}\t{}\t{}",
        point.day,
        cell(point.positive_cases),
        cell(point.deaths),
        cell(point.recovered)
    );
}

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Use library instead of local modules
use tract_choropleth::{persist, prepare_job, provider_from_config, ColorScheme, MapConfig};

/// Built-in categorical color schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scheme {
    /// Opportunity ranks 1-3 (green, yellow, red)
    Opportunity,
    /// Dominant race/ethnicity group codes
    DominantRace,
}

impl Scheme {
    fn color_scheme(self) -> ColorScheme {
        match self {
            Scheme::Opportunity => ColorScheme::opportunity_rankings(),
            Scheme::DominantRace => ColorScheme::dominant_race(),
        }
    }
}

/// Census tract choropleth maps from per-tract health metrics
#[derive(Debug, Parser)]
#[command(name = "tract-choropleth")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file (built-in Detroit + Austin jobs when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for generated maps
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Read tract boundaries from a local GeoJSON file instead of TIGERweb
    #[arg(long)]
    geojson: Option<PathBuf>,

    /// Metric name to map (exact match)
    #[arg(long)]
    metric: Option<String>,

    /// Treat the metric as categories colored by a built-in scheme
    #[arg(long, value_enum)]
    scheme: Option<Scheme>,

    /// Only run the job with this label
    #[arg(long)]
    job: Option<String>,

    /// Preview each map in the terminal before saving it
    #[arg(long)]
    display: bool,
}

impl Cli {
    fn config(&self) -> Result<MapConfig> {
        let mut config = match &self.config {
            Some(path) => MapConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => MapConfig::default(),
        };

        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(path) = &self.geojson {
            config.provider.geojson_path = Some(path.clone());
        }
        if let Some(metric) = &self.metric {
            config.metric.name = metric.clone();
        }
        if let Some(scheme) = self.scheme {
            config.metric.categories = Some(scheme.color_scheme());
        }
        if let Some(label) = &self.job {
            let job = config
                .find_job(label)
                .cloned()
                .with_context(|| format!("No job labelled {:?} in config", label))?;
            config.jobs = vec![job];
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;

    println!("🗺️  Tract Choropleth - {}", config.metric.display_name());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let provider = provider_from_config(&config).context("Failed to set up boundary provider")?;

    for job in &config.jobs {
        println!(
            "\n📍 {} (state {}, county {})",
            job.label, job.state_fips, job.county_fips
        );

        let prepared = prepare_job(provider.as_ref(), &config, job)
            .with_context(|| format!("Failed to prepare map for {}", job.label))?;
        println!("✓ {}", prepared.report.summary());
        println!("✓ Coverage: {:.1}%", prepared.report.coverage() * 100.0);

        if cli.display {
            show(&prepared.figure)?;
        }

        let path = persist(&prepared, &config)
            .with_context(|| format!("Failed to write map for {}", job.label))?;
        println!("💾 Saved {}", path.display());
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ {} map(s) written", config.jobs.len());

    Ok(())
}

#[cfg(feature = "tui")]
fn show(figure: &tract_choropleth::Figure) -> Result<()> {
    tract_choropleth::ui::preview(figure)
}

#[cfg(not(feature = "tui"))]
fn show(_figure: &tract_choropleth::Figure) -> Result<()> {
    eprintln!("❌ Terminal preview not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    Ok(())
}

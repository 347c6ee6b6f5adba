// 🚚 Pipeline
// fetch → filter → read → join → build, then persist

use crate::config::{MapConfig, MapJob};
use crate::error::{MapError, Result};
use crate::figure::{build_figure, Figure, FigureSpec};
use crate::join::{merge_with, write_unmatched, write_unplotted, JoinReport, JoinedRecord};
use crate::metrics::MetricReader;
use crate::render::render_png;
use crate::tracts::{filter_county, get_tracts, BoundaryProvider, GeoJsonFileProvider, TigerWebProvider};
use std::path::PathBuf;
use std::time::Duration;

/// Everything produced for one job before anything is written
#[derive(Debug, Clone)]
pub struct PreparedMap {
    pub job: MapJob,
    pub joined: Vec<JoinedRecord>,
    pub report: JoinReport,
    pub figure: Figure,
    pub output: PathBuf,
}

/// Provider selected by the config: a local GeoJSON file or TIGERweb
pub fn provider_from_config(config: &MapConfig) -> Result<Box<dyn BoundaryProvider>> {
    let settings = &config.provider;
    match &settings.geojson_path {
        Some(path) => Ok(Box::new(GeoJsonFileProvider::new(path, settings.fields()))),
        None => Ok(Box::new(
            TigerWebProvider::new(
                &settings.base_url,
                config.year,
                settings.layer,
                settings.fields(),
                Duration::from_secs(settings.timeout_secs),
            )?
            .with_page_size(settings.page_size),
        )),
    }
}

/// Run every data step for one job and build its figure
pub fn prepare_job(
    provider: &dyn BoundaryProvider,
    config: &MapConfig,
    job: &MapJob,
) -> Result<PreparedMap> {
    let span = tracing::info_span!("job", label = %job.label);
    let _guard = span.enter();

    let state_tracts = get_tracts(provider, &job.state_fips)?;
    let tracts = filter_county(&state_tracts, &job.county_fips)?;
    if tracts.is_empty() {
        tracing::warn!(county = %job.county_fips, "no tracts left after county filter");
    }

    let mut reader = MetricReader::new(config.metric.layout.clone());
    if config.metric.categories.is_some() {
        reader = reader.with_categories();
    }
    let metrics = reader.read(&job.metric_path, &config.metric.name)?;

    let joined = merge_with(&tracts, &metrics, config.duplicate_policy)?;
    let report = JoinReport::new(&tracts, &metrics, &joined);
    tracing::info!(summary = %report.summary(), "join complete");
    if !report.unmatched_tracts.is_empty() {
        tracing::warn!(count = report.unmatched_tracts.len(), "tracts without a metric row");
    }
    if report.orphan_metrics > 0 {
        tracing::debug!(count = report.orphan_metrics, "metric rows outside the county");
    }

    let spec = match &config.metric.categories {
        Some(scheme) => FigureSpec::categorical(
            &job.label,
            config.metric.display_name(),
            config.year,
            config.style.clone(),
            scheme.clone(),
        ),
        None => FigureSpec::new(
            &job.label,
            config.metric.display_name(),
            config.year,
            config.style.clone(),
        ),
    };
    let figure = build_figure(&joined, &spec);

    Ok(PreparedMap {
        job: job.clone(),
        joined,
        report,
        figure,
        output: config.output_for(job),
    })
}

/// Write the PNG (and the unmatched QA file when enabled). Returns the PNG path.
pub fn persist(prepared: &PreparedMap, config: &MapConfig) -> Result<PathBuf> {
    render_png(&prepared.figure, &prepared.output)?;

    if config.write_unmatched {
        let path = unmatched_path(&prepared.output)?;
        let written = match &config.metric.categories {
            Some(scheme) => write_unplotted(&path, &prepared.joined, |r| {
                scheme.class_for(r.category.as_deref()).is_some()
            })?,
            None => write_unmatched(&path, &prepared.joined)?,
        };
        if written > 0 {
            tracing::info!(path = %path.display(), rows = written, "unmatched tracts written");
        }
    }

    Ok(prepared.output.clone())
}

/// `maps/Detroit_children_in_poverty.png` → `maps/Detroit_children_in_poverty_unmatched.csv`
pub fn unmatched_path(output: &std::path::Path) -> Result<PathBuf> {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MapError::Config(format!("output path {} has no file name", output.display())))?;
    Ok(output.with_file_name(format!("{}_unmatched.csv", stem)))
}

// ============================================================================
// TESTS
// ============================================================================

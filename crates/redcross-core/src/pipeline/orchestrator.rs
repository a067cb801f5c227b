use tracing::info;

use crate::align::FrameAligner;
use crate::ccf::CrossCorrelator;
use crate::ephemeris::PlanetEphemeris;
use crate::error::{RedcrossError, Result};
use crate::kpv::{KpvMapper, PeakQuery};
use crate::spectrum::{SpectralSeries, Template};

use super::config::AnalysisConfig;
use super::types::{DetectionOutput, NoOpReporter, PipelineStage, ProgressReporter};

/// Run the full detection: optional alignment, CCF, Kp-Vsys map and peak report.
pub fn run_detection(
    orders: &[SpectralSeries],
    template: &Template,
    ephemeris: &dyn PlanetEphemeris,
    config: &AnalysisConfig,
) -> Result<DetectionOutput> {
    run_detection_reported(orders, template, ephemeris, config, &NoOpReporter)
}

/// Run the full detection with a progress reporter.
pub fn run_detection_reported(
    orders: &[SpectralSeries],
    template: &Template,
    ephemeris: &dyn PlanetEphemeris,
    config: &AnalysisConfig,
    reporter: &dyn ProgressReporter,
) -> Result<DetectionOutput> {
    if orders.is_empty() {
        return Err(RedcrossError::EmptySequence);
    }
    info!(
        orders = orders.len(),
        frames = orders[0].n_obs(),
        noise = %config.ccf.noise,
        interpolation = %config.ccf.interpolation,
        "Starting detection"
    );

    let (aligned, alignment) = match &config.align {
        Some(align_config) => {
            reporter.begin_stage(PipelineStage::Alignment, Some(orders.len()));
            let aligner = FrameAligner::new(align_config.clone())?;
            let mut corrected = Vec::with_capacity(orders.len());
            let mut results = Vec::with_capacity(orders.len());
            for (o, series) in orders.iter().enumerate() {
                let (series, result) = aligner.align(series)?;
                corrected.push(series);
                results.push(result);
                reporter.advance(o + 1);
            }
            reporter.finish_stage();
            (Some(corrected), Some(results))
        }
        None => (None, None),
    };
    let series = aligned.as_deref().unwrap_or(orders);

    reporter.begin_stage(PipelineStage::CrossCorrelation, Some(series.len()));
    let correlator = CrossCorrelator::new(config.ccf.clone())?;
    let ccf = correlator.run(series, template)?;
    reporter.advance(series.len());
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::KpVsys, None);
    let mapper = KpvMapper::new(&ccf, ephemeris, &config.kpv)?;
    let mut kpv = mapper.run(config.kpv.ignore_eclipse)?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::PeakAnalysis, None);
    kpv.locate_peak(PeakQuery::Auto)?;
    let report = kpv.fit_peak()?;
    reporter.finish_stage();

    info!(
        vrest = report.peak.vrest,
        kp = report.peak.kp,
        snr = report.peak.snr,
        "Detection complete"
    );
    Ok(DetectionOutput {
        alignment,
        ccf,
        kpv,
        report,
    })
}

use log::{debug, info};
use serde::{Deserialize, Serialize};
use shared::raw_hal::{
    ButtonState, RawConfig, RawDriver, RawError, RawSample, SourceCategory, SourceId, NUM_BUTTONS,
};

use crate::{
    arbitrator::ChangeArbitrator,
    button::ButtonTracker,
    encoder::{MessageEncoder, RawFrame},
    normalizer::Normalizer,
    source_state::{SourceState, SourceTable},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStats {
    pub ticks: u64,
    pub reports: u64,
    pub deferred: u64,
    pub frames_with_reports: u64,
}

/// Sensor to message pipeline, run once per sampling tick.
pub struct RawMode {
    normalizer: Normalizer,
    buttons: [ButtonTracker; NUM_BUTTONS],
    sources: SourceTable,
    arbitrator: ChangeArbitrator,
    encoder: MessageEncoder,
    last_timestamp_ms: Option<u64>,
    stats: RawStats,
}

impl RawMode {
    pub fn new(config: RawConfig) -> Result<Self, RawError> {
        config.validate()?;

        let raw_mode = Self {
            normalizer: Normalizer::new(config.scale)?,
            buttons: core::array::from_fn(|_| ButtonTracker::new(config.timing)),
            sources: SourceTable::new(),
            arbitrator: ChangeArbitrator::new(config.weights, config.report_budget)?,
            encoder: MessageEncoder::new(config.emit_activity_mask),
            last_timestamp_ms: None,
            stats: RawStats::default(),
        };

        info!(
            "Raw mode started: budget {} debounce {} ms long press {} ms, scale {:?}, weights {:?}",
            raw_mode.arbitrator.budget(),
            config.timing.debounce_ms,
            config.timing.long_press_ms,
            config.scale,
            config.weights,
        );

        Ok(raw_mode)
    }

    /// Runs one tick: normalize, track buttons, arbitrate and encode.
    pub fn update(&mut self, timestamp_ms: u64, sample: &RawSample) -> RawFrame {
        let dt_ms = self.elapsed_ms(timestamp_ms);

        self.ingest(dt_ms, sample);

        let arbitration = self.arbitrator.select(&self.sources);
        if arbitration.deferred() > 0 {
            debug!(
                "{} of {} changed sources deferred at {} ms",
                arbitration.deferred(),
                arbitration.eligible,
                timestamp_ms
            );
        }

        let reports = self.arbitrator.commit(&mut self.sources, &arbitration.selected);

        self.stats.ticks += 1;
        self.stats.reports += reports.len() as u64;
        self.stats.deferred += arbitration.deferred() as u64;
        if !reports.is_empty() {
            self.stats.frames_with_reports += 1;
        }

        self.encoder.encode_batch(&reports)
    }

    pub fn update_from_driver(&mut self, driver: &mut dyn RawDriver) -> RawFrame {
        let sample = driver.sample();
        let timestamp_ms = driver.timestamp_ms();

        self.update(timestamp_ms, &sample)
    }

    pub fn stats(&self) -> &RawStats {
        &self.stats
    }

    pub fn source_state(&self, source: SourceId) -> &SourceState {
        self.sources.get(source)
    }

    pub fn button_state(&self, button: usize) -> Option<ButtonState> {
        self.buttons.get(button).map(|tracker| tracker.state())
    }

    fn elapsed_ms(&mut self, timestamp_ms: u64) -> u32 {
        let dt_ms = self
            .last_timestamp_ms
            .map_or(0, |last| timestamp_ms.saturating_sub(last));
        self.last_timestamp_ms = Some(timestamp_ms);

        u32::try_from(dt_ms).unwrap_or(u32::MAX)
    }

    fn ingest(&mut self, dt_ms: u32, sample: &RawSample) {
        for source in SourceId::all() {
            if source.category() == SourceCategory::Button {
                let button = source.band_offset();
                let status = self.buttons[button].update(sample.buttons[button], dt_ms);
                self.sources.get_mut(source).push_button(status);
            } else if let Some(value) = self.normalizer.normalize(source, sample) {
                self.sources.get_mut(source).set_value(value);
            }
        }
    }
}

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;
use shared::raw_hal::{RawDriver, RawSample, NUM_BUTTONS, NUM_IMU, NUM_TONEHOLES};

// Wider than any raw reading; keeps the sampling range finite
const MAX_NOISE_AMPLITUDE: f32 = 1.0e9;

/// One line of a sample script. Missing readings keep their previous value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScriptEntry {
    pub t_ms: u64,
    pub pressure: Option<i32>,
    pub toneholes: Option<[u16; NUM_TONEHOLES]>,
    pub buttons: Option<[bool; NUM_BUTTONS]>,
    pub imu: Option<[f32; NUM_IMU]>,
}

struct Noise {
    amplitude: f32,
    rng: StdRng,
}

/// Plays back a script as if it were the sampling hardware.
pub struct ScriptDriver {
    samples: Vec<(u64, RawSample)>,
    position: usize,
    noise: Option<Noise>,
}

impl RawDriver for ScriptDriver {
    fn timestamp_ms(&self) -> u64 {
        self.last_timestamp_ms()
    }

    fn sample(&mut self) -> RawSample {
        let index = self.position.min(self.samples.len().saturating_sub(1));
        self.position += 1;

        let mut sample = self.samples.get(index).map(|(_, sample)| *sample).unwrap_or_default();
        if let Some(noise) = &mut self.noise {
            noise.apply(&mut sample);
        }

        sample
    }
}

impl ScriptDriver {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;

        Self::parse(&contents).with_context(|| format!("Failed to parse script {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut samples = Vec::new();
        let mut sample = RawSample::default();

        for (line_number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let entry: ScriptEntry = serde_json::from_str(line)
                .with_context(|| format!("Bad sample on line {}", line_number + 1))?;

            if let Some(pressure) = entry.pressure {
                sample.pressure = pressure;
            }
            if let Some(toneholes) = entry.toneholes {
                sample.toneholes = toneholes;
            }
            if let Some(buttons) = entry.buttons {
                sample.buttons = buttons;
            }
            if let Some(imu) = entry.imu {
                sample.imu = imu;
            }

            samples.push((entry.t_ms, sample));
        }

        Ok(Self {
            samples,
            position: 0,
            noise: None,
        })
    }

    /// Overlays uniform noise in `-amplitude..=amplitude` on continuous
    /// readings.
    pub fn set_noise(&mut self, amplitude: f32, seed: u64) -> Result<()> {
        ensure!(
            (0.0..=MAX_NOISE_AMPLITUDE).contains(&amplitude),
            "Noise amplitude must be between 0 and {:e}, got {}",
            MAX_NOISE_AMPLITUDE,
            amplitude
        );

        self.noise = Some(Noise {
            amplitude,
            rng: StdRng::seed_from_u64(seed),
        });

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.position < self.samples.len()
    }

    /// Timestamp of the most recently returned sample.
    pub fn last_timestamp_ms(&self) -> u64 {
        self.position
            .checked_sub(1)
            .and_then(|index| self.samples.get(index))
            .or_else(|| self.samples.last())
            .map_or(0, |(timestamp_ms, _)| *timestamp_ms)
    }
}

impl Noise {
    fn apply(&mut self, sample: &mut RawSample) {
        let amplitude = self.amplitude;

        sample.pressure = sample
            .pressure
            .saturating_add(self.rng.gen_range(-amplitude..=amplitude) as i32);

        for hole in sample.toneholes.iter_mut() {
            let noisy = *hole as f32 + self.rng.gen_range(-amplitude..=amplitude);
            // Float to int casts saturate at 0 and u16::MAX
            *hole = noisy as u16;
        }

        for axis in sample.imu.iter_mut() {
            *axis += self.rng.gen_range(-amplitude..=amplitude);
        }
    }
}

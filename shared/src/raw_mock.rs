use crate::raw_hal::{ImuAxis, RawDriver, RawSample, NUM_BUTTONS, NUM_TONEHOLES};

/// Sampling driver with a manually stepped clock. Every call to
/// `sample()` advances the clock by `tick_ms`.
pub struct RawDriverMock {
    timestamp_ms: u64,
    tick_ms: u64,
    sample: RawSample,
}

impl RawDriver for RawDriverMock {
    fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    fn sample(&mut self) -> RawSample {
        self.timestamp_ms += self.tick_ms;
        self.sample
    }
}

impl RawDriverMock {
    pub fn new(tick_ms: u64) -> Self {
        Self {
            timestamp_ms: 0,
            tick_ms,
            sample: RawSample::default(),
        }
    }

    pub fn set_pressure(&mut self, raw: i32) {
        self.sample.pressure = raw;
    }

    pub fn set_tonehole(&mut self, hole: usize, raw: u16) {
        if hole < NUM_TONEHOLES {
            self.sample.toneholes[hole] = raw;
        }
    }

    pub fn set_button(&mut self, button: usize, pressed: bool) {
        if button < NUM_BUTTONS {
            self.sample.buttons[button] = pressed;
        }
    }

    pub fn set_imu(&mut self, axis: ImuAxis, raw: f32) {
        self.sample.imu[axis.index()] = raw;
    }

    pub fn set_sample(&mut self, sample: RawSample) {
        self.sample = sample;
    }

    pub fn current_sample(&self) -> &RawSample {
        &self.sample
    }
}

use shared::raw_hal::{
    ImuAxis, NormalizedValue, RawError, RawSample, ScaleConfig, SourceCategory, SourceId,
    RAW_MAX_VALUE,
};

const MAX_NORMALIZED: i32 = RAW_MAX_VALUE - 1;

/// Scales raw readings into the signed normalized domain. Out-of-range
/// results saturate at +/-(RAW_MAX_VALUE - 1) instead of wrapping.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    scale: ScaleConfig,
}

impl Normalizer {
    pub fn new(scale: ScaleConfig) -> Result<Self, RawError> {
        scale.validate()?;

        Ok(Self { scale })
    }

    pub fn pressure(&self, raw: i32) -> NormalizedValue {
        saturate(raw / self.scale.pressure as i32)
    }

    pub fn tonehole(&self, raw: u16) -> NormalizedValue {
        saturate(raw as i32 / self.scale.tonehole as i32)
    }

    pub fn imu(&self, axis: ImuAxis, raw: f32) -> NormalizedValue {
        let divisor = match axis.category() {
            SourceCategory::Accel => self.scale.accel,
            _ => self.scale.gyro,
        };

        // Float to int casts saturate and send NaN to 0
        saturate((raw / divisor as f32) as i32)
    }

    /// Normalized reading of `source` from `sample`, or `None` for buttons.
    pub fn normalize(&self, source: SourceId, sample: &RawSample) -> Option<NormalizedValue> {
        match source.category() {
            SourceCategory::Pressure => Some(self.pressure(sample.pressure)),
            SourceCategory::Tonehole => Some(self.tonehole(sample.toneholes[source.band_offset()])),
            SourceCategory::Accel | SourceCategory::Gyro => {
                let axis = source.imu_axis()?;
                Some(self.imu(axis, sample.imu[axis.index()]))
            }
            SourceCategory::Button => None,
        }
    }
}

fn saturate(value: i32) -> NormalizedValue {
    value.clamp(-MAX_NORMALIZED, MAX_NORMALIZED) as NormalizedValue
}

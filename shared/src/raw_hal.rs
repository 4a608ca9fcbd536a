use core::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{EnumCount as EnumCountMacro, EnumIter};

pub const NUM_PRESSURE: usize = 1;
pub const NUM_TONEHOLES: usize = 9;
pub const NUM_BUTTONS: usize = 3;
pub const NUM_IMU: usize = 6;

// First index of each source band
pub const SI_PRESSURE: u8 = 0;
pub const SI_TONEHOLE: u8 = 1;
pub const SI_BUTTON: u8 = 10;
pub const SI_IMU: u8 = 13;
pub const SI_END: u8 = 19;

pub const SOURCE_COUNT: usize = SI_END as usize;

/// Width of the activity mask, and therefore the hard limit on sources.
pub const RAW_MASK_BITS: usize = 31;

/// Normalized values live in -RAW_MAX_VALUE..RAW_MAX_VALUE, exclusive.
pub const RAW_MAX_VALUE: i32 = 1 << 13;

pub type NormalizedValue = i16;

const _: () = {
    assert!((SI_TONEHOLE - SI_PRESSURE) as usize == NUM_PRESSURE);
    assert!((SI_BUTTON - SI_TONEHOLE) as usize == NUM_TONEHOLES);
    assert!((SI_IMU - SI_BUTTON) as usize == NUM_BUTTONS);
    assert!((SI_END - SI_IMU) as usize == NUM_IMU);
    assert!(SOURCE_COUNT <= RAW_MASK_BITS);
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumCountMacro, EnumIter, Hash)]
pub enum SourceCategory {
    Pressure,
    Tonehole,
    Button,
    Accel,
    Gyro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumCountMacro, EnumIter, Hash)]
pub enum ImuAxis {
    AccelX,
    AccelY,
    AccelZ,
    Roll,
    Pitch,
    Yaw,
}

impl ImuAxis {
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn category(&self) -> SourceCategory {
        match self {
            ImuAxis::AccelX | ImuAxis::AccelY | ImuAxis::AccelZ => SourceCategory::Accel,
            ImuAxis::Roll | ImuAxis::Pitch | ImuAxis::Yaw => SourceCategory::Gyro,
        }
    }
}

/// Index of one of the raw sources. Bands are contiguous and fixed:
/// pressure 0, toneholes 1..=9, buttons 10..=12, IMU axes 13..=18.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct SourceId(u8);

impl SourceId {
    pub const PRESSURE: SourceId = SourceId(SI_PRESSURE);

    pub const fn new(index: u8) -> Option<Self> {
        if index < SI_END {
            Some(Self(index))
        } else {
            None
        }
    }

    pub fn tonehole(hole: usize) -> Option<Self> {
        (hole < NUM_TONEHOLES).then(|| Self(SI_TONEHOLE + hole as u8))
    }

    pub fn button(button: usize) -> Option<Self> {
        (button < NUM_BUTTONS).then(|| Self(SI_BUTTON + button as u8))
    }

    pub fn imu(axis: ImuAxis) -> Self {
        Self(SI_IMU + axis as u8)
    }

    pub fn all() -> impl Iterator<Item = SourceId> {
        (0..SI_END).map(SourceId)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn raw(&self) -> u8 {
        self.0
    }

    pub fn category(&self) -> SourceCategory {
        match self.0 {
            SI_PRESSURE => SourceCategory::Pressure,
            i if i < SI_BUTTON => SourceCategory::Tonehole,
            i if i < SI_IMU => SourceCategory::Button,
            _ => self.imu_axis().map_or(SourceCategory::Gyro, |axis| axis.category()),
        }
    }

    /// Offset of this source inside its band.
    pub fn band_offset(&self) -> usize {
        let start = match self.category() {
            SourceCategory::Pressure => SI_PRESSURE,
            SourceCategory::Tonehole => SI_TONEHOLE,
            SourceCategory::Button => SI_BUTTON,
            SourceCategory::Accel | SourceCategory::Gyro => SI_IMU,
        };

        (self.0 - start) as usize
    }

    pub fn imu_axis(&self) -> Option<ImuAxis> {
        use strum::IntoEnumIterator;

        if self.0 < SI_IMU {
            return None;
        }

        ImuAxis::iter().nth((self.0 - SI_IMU) as usize)
    }
}

impl TryFrom<u8> for SourceId {
    type Error = RawError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        SourceId::new(index).ok_or(RawError::InvalidSourceId(index))
    }
}

impl From<SourceId> for u8 {
    fn from(source: SourceId) -> Self {
        source.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category() {
            SourceCategory::Pressure => write!(f, "pressure"),
            SourceCategory::Tonehole => write!(f, "tonehole{}", self.band_offset()),
            SourceCategory::Button => write!(f, "button{}", self.band_offset()),
            SourceCategory::Accel | SourceCategory::Gyro => match self.imu_axis() {
                Some(axis) => write!(f, "{:?}", axis),
                None => write!(f, "source{}", self.0),
            },
        }
    }
}

// Bit positions of the packed button status
pub const RAW_BUTTON_PRESSED: u8 = 0;
pub const RAW_BUTTON_TOGGLE_ON: u8 = 1;
pub const RAW_BUTTON_TOGGLE_OFF: u8 = 2;
pub const RAW_BUTTON_LONG_PRESS: u8 = 3;

/// Button status as reported on the wire. `pressed` is a level that holds
/// while the button is down; the other three are edge pulses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ButtonStatus {
    pub pressed: bool,
    pub toggle_on: bool,
    pub toggle_off: bool,
    pub long_press: bool,
}

impl ButtonStatus {
    pub fn edge_count(&self) -> u32 {
        self.toggle_on as u32 + self.toggle_off as u32 + self.long_press as u32
    }

    pub fn has_edges(&self) -> bool {
        self.edge_count() > 0
    }

    pub fn clear_edges(&mut self) {
        self.toggle_on = false;
        self.toggle_off = false;
        self.long_press = false;
    }

    /// Takes the level from `newer` and accumulates its pulses.
    pub fn latch(&mut self, newer: ButtonStatus) {
        self.pressed = newer.pressed;
        self.toggle_on |= newer.toggle_on;
        self.toggle_off |= newer.toggle_off;
        self.long_press |= newer.long_press;
    }

    pub fn to_bits(&self) -> u8 {
        (self.pressed as u8) << RAW_BUTTON_PRESSED
            | (self.toggle_on as u8) << RAW_BUTTON_TOGGLE_ON
            | (self.toggle_off as u8) << RAW_BUTTON_TOGGLE_OFF
            | (self.long_press as u8) << RAW_BUTTON_LONG_PRESS
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            pressed: bits & (1 << RAW_BUTTON_PRESSED) != 0,
            toggle_on: bits & (1 << RAW_BUTTON_TOGGLE_ON) != 0,
            toggle_off: bits & (1 << RAW_BUTTON_TOGGLE_OFF) != 0,
            long_press: bits & (1 << RAW_BUTTON_LONG_PRESS) != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonState {
    Released,
    Pressed,
    PressedLong,
}

/// One reading of every source, as delivered by the sampling driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub pressure: i32,
    pub toneholes: [u16; NUM_TONEHOLES],
    pub buttons: [bool; NUM_BUTTONS],
    pub imu: [f32; NUM_IMU],
}

pub trait RawDriver {
    fn timestamp_ms(&self) -> u64;
    fn sample(&mut self) -> RawSample;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLayout {
    pub pressure: u8,
    pub toneholes: u8,
    pub buttons: u8,
    pub imu_axes: u8,
}

impl SourceLayout {
    pub const fn default() -> Self {
        Self {
            pressure: NUM_PRESSURE as u8,
            toneholes: NUM_TONEHOLES as u8,
            buttons: NUM_BUTTONS as u8,
            imu_axes: NUM_IMU as u8,
        }
    }

    pub fn source_count(&self) -> usize {
        self.pressure as usize + self.toneholes as usize + self.buttons as usize + self.imu_axes as usize
    }

    pub fn validate(&self) -> Result<(), RawError> {
        let count = self.source_count();
        if count > RAW_MASK_BITS {
            return Err(RawError::SourceIdOverflow { count });
        }

        if *self != Self::default() {
            return Err(RawError::UnsupportedLayout);
        }

        Ok(())
    }
}

/// Divisors that bring each category into the normalized range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleConfig {
    pub pressure: u16,
    pub tonehole: u16,
    pub accel: u16,
    pub gyro: u16,
}

impl ScaleConfig {
    pub const fn default() -> Self {
        Self {
            pressure: 1024,
            tonehole: 512,
            accel: 256,
            gyro: 180,
        }
    }

    pub fn divisor(&self, category: SourceCategory) -> Option<u16> {
        match category {
            SourceCategory::Pressure => Some(self.pressure),
            SourceCategory::Tonehole => Some(self.tonehole),
            SourceCategory::Accel => Some(self.accel),
            SourceCategory::Gyro => Some(self.gyro),
            SourceCategory::Button => None,
        }
    }

    pub fn validate(&self) -> Result<(), RawError> {
        use strum::IntoEnumIterator;

        for category in SourceCategory::iter() {
            if self.divisor(category) == Some(0) {
                return Err(RawError::ZeroDivisor(category));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityWeights {
    pub pressure: u16,
    pub tonehole: u16,
    pub button: u16,
    pub accel: u16,
    pub gyro: u16,
}

impl PriorityWeights {
    pub const fn default() -> Self {
        Self {
            pressure: 1,
            tonehole: 1,
            button: 1000,
            accel: 1,
            gyro: 1,
        }
    }

    pub fn weight(&self, category: SourceCategory) -> u32 {
        let weight = match category {
            SourceCategory::Pressure => self.pressure,
            SourceCategory::Tonehole => self.tonehole,
            SourceCategory::Button => self.button,
            SourceCategory::Accel => self.accel,
            SourceCategory::Gyro => self.gyro,
        };

        weight as u32
    }
}

/// Largest change a continuous source can make between two reports.
pub const MAX_CONTINUOUS_DELTA: u32 = 2 * (RAW_MAX_VALUE as u32 - 1);

/// Delta charged for one pending button pulse. With the default button
/// weight a single pulse outranks a full-span continuous swing.
pub const BUTTON_PULSE_DELTA: u32 =
    MAX_CONTINUOUS_DELTA / PriorityWeights::default().button as u32 + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonTiming {
    pub debounce_ms: u32,
    pub long_press_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfig {
    pub layout: SourceLayout,
    pub scale: ScaleConfig,
    pub weights: PriorityWeights,
    pub timing: ButtonTiming,
    pub report_budget: u8,
    pub emit_activity_mask: bool,
}

impl RawConfig {
    pub const fn new(report_budget: u8, timing: ButtonTiming) -> Self {
        Self {
            layout: SourceLayout::default(),
            scale: ScaleConfig::default(),
            weights: PriorityWeights::default(),
            timing,
            report_budget,
            emit_activity_mask: true,
        }
    }

    pub fn validate(&self) -> Result<(), RawError> {
        self.layout.validate()?;
        self.scale.validate()?;

        if self.report_budget == 0 {
            return Err(RawError::ZeroReportBudget);
        }

        Ok(())
    }

    /// Report budget clamped to the number of sources.
    pub fn effective_budget(&self) -> usize {
        (self.report_budget as usize).min(SOURCE_COUNT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerdesError {
    Unknown,
    PacketTooLong,
    PostcardImplementation,
    SerdeError,
    UnexpectedEnd,
    BadVar,
    BadEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawError {
    SourceIdOverflow { count: usize },
    UnsupportedLayout,
    ZeroDivisor(SourceCategory),
    ZeroReportBudget,
    InvalidSourceId(u8),
    Serialization(SerdesError),
}

impl fmt::Display for RawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawError::SourceIdOverflow { count } => write!(
                f,
                "layout declares {} sources but the activity mask holds {}",
                count, RAW_MASK_BITS
            ),
            RawError::UnsupportedLayout => write!(
                f,
                "layout must be {} pressure, {} toneholes, {} buttons, {} IMU axes",
                NUM_PRESSURE, NUM_TONEHOLES, NUM_BUTTONS, NUM_IMU
            ),
            RawError::ZeroDivisor(category) => write!(f, "{:?} divisor is zero", category),
            RawError::ZeroReportBudget => write!(f, "report budget must be at least 1"),
            RawError::InvalidSourceId(id) => write!(f, "source id {} out of range", id),
            RawError::Serialization(err) => write!(f, "serialization failed: {:?}", err),
        }
    }
}

impl From<SerdesError> for RawError {
    fn from(err: SerdesError) -> Self {
        RawError::Serialization(err)
    }
}

use heapless::Vec;
use serde::{Deserialize, Serialize};
use shared::raw_hal::{
    ButtonStatus, NormalizedValue, RawError, SourceCategory, SourceId, RAW_MASK_BITS,
    SOURCE_COUNT,
};

use crate::source_state::SourceValue;

// Packed message word:
// bits 0..5:   source id
// bits 5..19:  payload, 14 bit two's complement value or 4 bit button status
// bits 19..32: zero
pub const SOURCE_BITS: u32 = 5;
pub const PAYLOAD_BITS: u32 = 14;

const SOURCE_MASK: u32 = (1 << SOURCE_BITS) - 1;
const PAYLOAD_MASK: u32 = (1 << PAYLOAD_BITS) - 1;
const BUTTON_MASK: u32 = 0xF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawPayload {
    Value(NormalizedValue),
    Button(ButtonStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub source: SourceId,
    pub payload: RawPayload,
}

impl RawMessage {
    pub fn to_word(&self) -> u32 {
        let payload = match self.payload {
            RawPayload::Value(value) => value as i32 as u32 & PAYLOAD_MASK,
            RawPayload::Button(status) => status.to_bits() as u32,
        };

        self.source.raw() as u32 | payload << SOURCE_BITS
    }

    /// Unpacks a word. The payload kind follows from the source's band.
    pub fn from_word(word: u32) -> Result<Self, RawError> {
        let id = (word & SOURCE_MASK) as u8;
        let source = SourceId::new(id).ok_or(RawError::InvalidSourceId(id))?;
        let payload = (word >> SOURCE_BITS) & PAYLOAD_MASK;

        let payload = match source.category() {
            SourceCategory::Button => {
                RawPayload::Button(ButtonStatus::from_bits((payload & BUTTON_MASK) as u8))
            }
            // Sign extend from 14 bits
            _ => RawPayload::Value((((payload << 18) as i32) >> 18) as NormalizedValue),
        };

        Ok(Self { source, payload })
    }
}

/// Bit i is set when source i was reported in the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMask(u32);

impl ActivityMask {
    pub fn set(&mut self, source: SourceId) {
        self.0 |= 1 << source.index();
    }

    pub fn contains(&self, source: SourceId) -> bool {
        self.0 & (1 << source.index()) != 0
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits & ((1 << RAW_MASK_BITS) - 1))
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFrame {
    pub mask: Option<ActivityMask>,
    pub words: Vec<u32, SOURCE_COUNT>,
}

impl RawFrame {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn messages(&self) -> Result<Vec<RawMessage, SOURCE_COUNT>, RawError> {
        let mut messages = Vec::new();

        for word in &self.words {
            let message = RawMessage::from_word(*word)?;
            if messages.push(message).is_err() {
                break;
            }
        }

        Ok(messages)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MessageEncoder {
    emit_activity_mask: bool,
}

impl MessageEncoder {
    pub fn new(emit_activity_mask: bool) -> Self {
        Self { emit_activity_mask }
    }

    pub fn encode(&self, source: SourceId, value: SourceValue) -> RawMessage {
        let payload = match value {
            SourceValue::Value(value) => RawPayload::Value(value),
            SourceValue::Button(status) => RawPayload::Button(status),
        };

        RawMessage { source, payload }
    }

    /// Packs one tick's reports. Ticks without reports give an empty frame
    /// with no mask.
    pub fn encode_batch(&self, reports: &[(SourceId, SourceValue)]) -> RawFrame {
        let mut frame = RawFrame::default();
        let mut mask = ActivityMask::default();

        for (source, value) in reports {
            mask.set(*source);
            if frame.words.push(self.encode(*source, *value).to_word()).is_err() {
                break;
            }
        }

        if self.emit_activity_mask && !frame.is_empty() {
            frame.mask = Some(mask);
        }

        frame
    }
}

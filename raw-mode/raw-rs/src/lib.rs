#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod arbitrator;
pub mod button;
pub mod button_fsm;
pub mod encoder;
pub mod normalizer;
pub mod raw_mode;
pub mod serdes;
pub mod source_state;

pub use arbitrator::ChangeArbitrator;
pub use button::ButtonTracker;
pub use encoder::{ActivityMask, MessageEncoder, RawFrame, RawMessage, RawPayload};
pub use normalizer::Normalizer;
pub use raw_mode::{RawMode, RawStats};
pub use source_state::{SourceState, SourceTable, SourceValue};

use log::trace;
use shared::ControllerState;

use crate::button::ButtonContext;

use super::{released::Released, ButtonFsm};

pub struct PressedLong;

impl ControllerState<ButtonFsm, ButtonContext> for PressedLong {
    fn update(&mut self, button: &mut ButtonContext, dt_ms: u32) -> Option<ButtonFsm> {
        if !button.level {
            return Some(Released::new());
        }

        button.hold_ms = button.hold_ms.saturating_add(dt_ms);

        None
    }

    fn enter_state(&mut self, button: &mut ButtonContext) {
        trace!("button long press after {} ms", button.hold_ms);

        // Pulses once per hold; the state is only left on release
        button.status.long_press = true;
    }

    fn exit_state(&mut self, _button: &mut ButtonContext) {
        // Nothing
    }
}

impl PressedLong {
    pub fn new() -> ButtonFsm {
        ButtonFsm::PressedLong(Self)
    }
}

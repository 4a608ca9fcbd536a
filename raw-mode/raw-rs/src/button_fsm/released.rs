use log::trace;
use shared::ControllerState;

use crate::button::ButtonContext;

use super::{pressed::Pressed, ButtonFsm};

pub struct Released;

impl ControllerState<ButtonFsm, ButtonContext> for Released {
    fn update(&mut self, button: &mut ButtonContext, _dt_ms: u32) -> Option<ButtonFsm> {
        if button.level {
            return Some(Pressed::new());
        }

        None
    }

    fn enter_state(&mut self, button: &mut ButtonContext) {
        // Only a real release produces a pulse, not the initial state
        if button.status.pressed {
            trace!("button released after {} ms", button.hold_ms);
            button.status.toggle_off = true;
        }

        button.status.pressed = false;
        button.status.long_press = false;
        button.hold_ms = 0;
    }

    fn exit_state(&mut self, _button: &mut ButtonContext) {
        // Nothing
    }
}

impl Released {
    pub fn new() -> ButtonFsm {
        ButtonFsm::Released(Self)
    }
}

use log::trace;
use shared::ControllerState;

use crate::button::ButtonContext;

use super::{pressed_long::PressedLong, released::Released, ButtonFsm};

pub struct Pressed;

impl ControllerState<ButtonFsm, ButtonContext> for Pressed {
    fn update(&mut self, button: &mut ButtonContext, dt_ms: u32) -> Option<ButtonFsm> {
        if !button.level {
            return Some(Released::new());
        }

        button.hold_ms = button.hold_ms.saturating_add(dt_ms);

        if button.hold_ms >= button.timing.long_press_ms {
            return Some(PressedLong::new());
        }

        None
    }

    fn enter_state(&mut self, button: &mut ButtonContext) {
        trace!("button pressed");

        button.status.pressed = true;
        button.status.toggle_on = true;
        button.status.toggle_off = false;
        button.hold_ms = 0;
    }

    fn exit_state(&mut self, _button: &mut ButtonContext) {
        // Nothing
    }
}

impl Pressed {
    pub fn new() -> ButtonFsm {
        ButtonFsm::Pressed(Self)
    }
}

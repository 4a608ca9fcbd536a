use shared::{raw_hal::ButtonState, ControllerFsm, ControllerState};

use crate::button::ButtonContext;

pub mod pressed;
pub mod pressed_long;
pub mod released;

pub enum ButtonFsm {
    Released(released::Released),
    Pressed(pressed::Pressed),
    PressedLong(pressed_long::PressedLong),
}

impl ControllerFsm<ButtonFsm, ButtonContext, ButtonState> for ButtonFsm {
    fn to_controller_state(&mut self) -> &mut dyn ControllerState<ButtonFsm, ButtonContext> {
        match self {
            ButtonFsm::Released(state) => state,
            ButtonFsm::Pressed(state) => state,
            ButtonFsm::PressedLong(state) => state,
        }
    }

    fn hal_state(&self) -> ButtonState {
        match self {
            ButtonFsm::Released(_) => ButtonState::Released,
            ButtonFsm::Pressed(_) => ButtonState::Pressed,
            ButtonFsm::PressedLong(_) => ButtonState::PressedLong,
        }
    }
}

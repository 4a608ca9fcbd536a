use shared::{
    raw_hal::{ButtonState, ButtonStatus, ButtonTiming},
    ControllerEntity,
};

use crate::button_fsm::{released::Released, ButtonFsm};

/// State the button FSM reads and writes.
pub struct ButtonContext {
    /// Debounced physical level.
    pub level: bool,
    pub status: ButtonStatus,
    pub hold_ms: u32,
    pub timing: ButtonTiming,
}

/// Debounces one physical button and runs it through the
/// Released -> Pressed -> PressedLong state machine.
pub struct ButtonTracker {
    context: ButtonContext,
    fsm: ControllerEntity<ButtonFsm, ButtonContext, ButtonState>,
    raw_level: bool,
    stable_ms: u32,
}

impl ButtonTracker {
    pub fn new(timing: ButtonTiming) -> Self {
        let mut context = ButtonContext {
            level: false,
            status: ButtonStatus::default(),
            hold_ms: 0,
            timing,
        };

        let fsm = ControllerEntity::new(&mut context, Released::new());

        Self {
            context,
            fsm,
            raw_level: false,
            stable_ms: 0,
        }
    }

    /// Feeds one raw sample taken `dt_ms` after the previous one and returns
    /// the status for this tick. Edge flags only survive a single tick.
    pub fn update(&mut self, raw_pressed: bool, dt_ms: u32) -> ButtonStatus {
        self.debounce(raw_pressed, dt_ms);

        self.context.status.clear_edges();
        self.fsm.update(&mut self.context, dt_ms);

        self.context.status
    }

    pub fn state(&self) -> ButtonState {
        self.fsm.hal_state()
    }

    fn debounce(&mut self, raw_pressed: bool, dt_ms: u32) {
        if raw_pressed != self.raw_level {
            self.raw_level = raw_pressed;
            self.stable_ms = 0;
        } else {
            self.stable_ms = self.stable_ms.saturating_add(dt_ms);
        }

        if self.stable_ms >= self.context.timing.debounce_ms {
            self.context.level = self.raw_level;
        }
    }
}

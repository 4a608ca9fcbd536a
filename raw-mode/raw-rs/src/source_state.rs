use heapless::Deque;
use serde::{Deserialize, Serialize};
use shared::raw_hal::{
    ButtonStatus, NormalizedValue, SourceCategory, SourceId, BUTTON_PULSE_DELTA, SOURCE_COUNT,
};

/// Unreported pulse statuses held per button.
pub const BUTTON_QUEUE_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceValue {
    Value(NormalizedValue),
    Button(ButtonStatus),
}

impl SourceValue {
    pub fn neutral(source: SourceId) -> Self {
        match source.category() {
            SourceCategory::Button => SourceValue::Button(ButtonStatus::default()),
            _ => SourceValue::Value(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceState {
    /// Latest value. For buttons, the debounced level without pulses.
    pub current: SourceValue,
    pub last_reported: SourceValue,
    pub dirty: bool,
    pending: Deque<ButtonStatus, BUTTON_QUEUE_DEPTH>,
}

impl SourceState {
    pub fn new(source: SourceId) -> Self {
        let neutral = SourceValue::neutral(source);

        Self {
            current: neutral,
            last_reported: neutral,
            dirty: false,
            pending: Deque::new(),
        }
    }

    pub fn set_value(&mut self, value: NormalizedValue) {
        self.current = SourceValue::Value(value);
        self.dirty = self.current != self.last_reported;
    }

    /// Records this tick's button status. Statuses carrying a pulse queue up
    /// and are reported one per report, oldest first.
    pub fn push_button(&mut self, status: ButtonStatus) {
        if status.has_edges() {
            if let Err(status) = self.pending.push_back(status) {
                // Queue full, fold into the newest entry
                if let Some(newest) = self.pending.back_mut() {
                    newest.latch(status);
                }
            }
        }

        self.current = SourceValue::Button(ButtonStatus {
            pressed: status.pressed,
            ..Default::default()
        });
        self.dirty = !self.pending.is_empty();
    }

    pub fn pending_pulses(&self) -> usize {
        self.pending.len()
    }

    /// Difference between the current and the last reported value. Buttons
    /// are charged `BUTTON_PULSE_DELTA` per pulse of their oldest unreported
    /// status.
    pub fn delta(&self) -> u32 {
        match (self.current, self.last_reported) {
            (SourceValue::Value(current), SourceValue::Value(last)) => {
                (current as i32 - last as i32).unsigned_abs()
            }
            (SourceValue::Button(_), _) => self
                .pending
                .front()
                .map_or(0, |status| status.edge_count() * BUTTON_PULSE_DELTA),
            _ => 0,
        }
    }

    /// Records the value going out as reported and returns it. A button
    /// gives up its oldest queued status.
    pub fn mark_reported(&mut self) -> SourceValue {
        let reported = match self.current {
            SourceValue::Button(level) => {
                SourceValue::Button(self.pending.pop_front().unwrap_or(level))
            }
            value => value,
        };

        self.last_reported = reported;
        self.dirty = !self.pending.is_empty();

        reported
    }
}

/// Per-source state, indexed by `SourceId`.
#[derive(Debug, Clone)]
pub struct SourceTable {
    states: [SourceState; SOURCE_COUNT],
}

impl SourceTable {
    pub fn new() -> Self {
        let mut states: [SourceState; SOURCE_COUNT] =
            core::array::from_fn(|_| SourceState::new(SourceId::PRESSURE));
        for source in SourceId::all() {
            states[source.index()] = SourceState::new(source);
        }

        Self { states }
    }

    pub fn get(&self, source: SourceId) -> &SourceState {
        &self.states[source.index()]
    }

    pub fn get_mut(&mut self, source: SourceId) -> &mut SourceState {
        &mut self.states[source.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, &SourceState)> {
        SourceId::all().zip(self.states.iter())
    }

    pub fn dirty_count(&self) -> usize {
        self.states.iter().filter(|state| state.dirty).count()
    }
}

impl Default for SourceTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press() -> ButtonStatus {
        ButtonStatus {
            pressed: true,
            toggle_on: true,
            ..Default::default()
        }
    }

    fn release() -> ButtonStatus {
        ButtonStatus {
            toggle_off: true,
            ..Default::default()
        }
    }

    fn held() -> ButtonStatus {
        ButtonStatus {
            pressed: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_state_is_neutral() {
        let table = SourceTable::new();

        assert_eq!(table.get(SourceId::PRESSURE).current, SourceValue::Value(0));
        assert_eq!(
            table.get(SourceId::button(2).unwrap()).current,
            SourceValue::Button(ButtonStatus::default())
        );
        assert_eq!(table.dirty_count(), 0);
        assert_eq!(table.iter().count(), SOURCE_COUNT);
    }

    #[test]
    fn test_value_dirty_tracks_last_reported() {
        let mut state = SourceState::new(SourceId::PRESSURE);

        state.set_value(5);
        assert!(state.dirty);
        assert_eq!(state.delta(), 5);

        assert_eq!(state.mark_reported(), SourceValue::Value(5));
        assert!(!state.dirty);
        assert_eq!(state.delta(), 0);

        state.set_value(-3);
        assert_eq!(state.delta(), 8);

        // Returning to the reported value before a report is not a change
        state.set_value(5);
        assert!(!state.dirty);
    }

    #[test]
    fn test_button_pulse_held_until_reported() {
        let mut state = SourceState::new(SourceId::button(0).unwrap());

        state.push_button(press());
        state.push_button(held());

        assert!(state.dirty);
        assert_eq!(state.delta(), BUTTON_PULSE_DELTA);
        assert_eq!(state.mark_reported(), SourceValue::Button(press()));

        // Level persists but no pulse remains
        assert_eq!(state.delta(), 0);
        assert!(!state.dirty);
        assert_eq!(state.current, SourceValue::Button(held()));

        state.push_button(held());
        assert!(!state.dirty);
    }

    #[test]
    fn test_deferred_presses_report_in_order() {
        let mut state = SourceState::new(SourceId::button(1).unwrap());

        for status in [press(), held(), release(), press(), held(), release()] {
            state.push_button(status);
        }
        assert_eq!(state.pending_pulses(), 4);

        let mut reported = Vec::new();
        while state.dirty {
            reported.push(state.mark_reported());
        }

        assert_eq!(
            reported,
            [press(), release(), press(), release()].map(SourceValue::Button)
        );
        assert_eq!(state.current, SourceValue::Button(ButtonStatus::default()));
    }

    #[test]
    fn test_full_queue_folds_into_newest() {
        let mut state = SourceState::new(SourceId::button(2).unwrap());

        for _ in 0..BUTTON_QUEUE_DEPTH / 2 {
            state.push_button(press());
            state.push_button(release());
        }
        state.push_button(press());

        assert_eq!(state.pending_pulses(), BUTTON_QUEUE_DEPTH);

        let mut last = None;
        while state.dirty {
            last = Some(state.mark_reported());
        }
        assert_eq!(
            last,
            Some(SourceValue::Button(ButtonStatus {
                pressed: true,
                toggle_on: true,
                toggle_off: true,
                long_press: false,
            }))
        );
    }
}

use heapless::Vec;
use log::debug;
use shared::raw_hal::{PriorityWeights, RawError, SourceId, SOURCE_COUNT};

use crate::source_state::{SourceState, SourceTable, SourceValue};

pub type Selection = Vec<SourceId, SOURCE_COUNT>;
pub type Reports = Vec<(SourceId, SourceValue), SOURCE_COUNT>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arbitration {
    /// Sources to report this tick, in rank order.
    pub selected: Selection,
    pub eligible: usize,
}

impl Arbitration {
    /// Eligible sources pushed to a later tick by the report budget.
    pub fn deferred(&self) -> usize {
        self.eligible - self.selected.len()
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    weighted: u32,
    source: SourceId,
}

/// Chooses which changed sources are reported in a tick.
#[derive(Debug, Clone, Copy)]
pub struct ChangeArbitrator {
    weights: PriorityWeights,
    budget: usize,
}

impl ChangeArbitrator {
    pub fn new(weights: PriorityWeights, report_budget: u8) -> Result<Self, RawError> {
        if report_budget == 0 {
            return Err(RawError::ZeroReportBudget);
        }

        Ok(Self {
            weights,
            budget: (report_budget as usize).min(SOURCE_COUNT),
        })
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn weighted_delta(&self, source: SourceId, state: &SourceState) -> u32 {
        state
            .delta()
            .saturating_mul(self.weights.weight(source.category()))
    }

    /// Ranks every eligible source by weighted delta, ties to the lower id,
    /// and keeps at most `budget` of them. Does not touch state.
    pub fn select(&self, table: &SourceTable) -> Arbitration {
        let mut candidates: Vec<Candidate, SOURCE_COUNT> = Vec::new();

        for (source, state) in table.iter() {
            let weighted = self.weighted_delta(source, state);
            if weighted == 0 {
                continue;
            }

            if candidates.push(Candidate { weighted, source }).is_err() {
                break;
            }
        }

        candidates.sort_unstable_by(|a, b| {
            b.weighted
                .cmp(&a.weighted)
                .then(a.source.cmp(&b.source))
        });

        let selected = candidates
            .iter()
            .take(self.budget)
            .map(|candidate| candidate.source)
            .collect();

        Arbitration {
            selected,
            eligible: candidates.len(),
        }
    }

    /// Marks the selected sources as reported and returns their values.
    /// Everything else keeps its dirty flag for the next tick, as do buttons
    /// with more pulses queued.
    pub fn commit(&self, table: &mut SourceTable, selection: &Selection) -> Reports {
        let mut reports = Reports::new();

        for source in selection {
            let state = table.get_mut(*source);
            let value = state.mark_reported();
            debug!(
                "reporting {} = {:?}, {} pulses left",
                source,
                value,
                state.pending_pulses()
            );

            if reports.push((*source, value)).is_err() {
                break;
            }
        }

        reports
    }
}

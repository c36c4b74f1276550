use encodex_core::{ResponseKey, TrialDescriptor, TrialResult, TrialState};
use std::time::Duration;

pub struct Trial {
    /// 1-based position in the session
    pub index: usize,
    pub descriptor: TrialDescriptor,
    pub durations: TrialDurations,
    pub timestamps: TrialTimestamps,
    pub response: Option<ResponseKey>,
    pub state: TrialState,
    /// Set once the stimulus frame has actually reached the display
    pub presented: bool,
}

#[derive(Debug, Clone)]
pub struct TrialDurations {
    pub fixation: Duration,
    pub response_timeout: Option<Duration>,
    pub feedback: Duration,
}

#[derive(Debug, Clone)]
pub struct TrialTimestamps {
    pub fixation_start: u64,
    pub stimulus_start: Option<u64>,
    pub response: Option<u64>,
    pub feedback_start: Option<u64>,
}

impl Trial {
    pub fn new(
        index: usize,
        descriptor: TrialDescriptor,
        durations: TrialDurations,
        now: u64,
    ) -> Self {
        Self {
            index,
            descriptor,
            durations,
            timestamps: TrialTimestamps {
                fixation_start: now,
                stimulus_start: None,
                response: None,
                feedback_start: None,
            },
            response: None,
            state: TrialState::Fixation,
            presented: false,
        }
    }

    /// Latency from stimulus onset to the accepted key
    pub fn reaction_time(&self) -> Option<Duration> {
        let onset = self.timestamps.stimulus_start?;
        let response = self.timestamps.response?;
        Some(Duration::from_nanos(response.saturating_sub(onset)))
    }

    /// When the current state ends on its own, if it ever does
    pub fn deadline(&self) -> Option<u64> {
        match self.state {
            TrialState::Fixation => {
                Some(
                    self.timestamps
                        .fixation_start
                        .saturating_add(nanos(self.durations.fixation)),
                )
            }
            TrialState::Stimulus => {
                let onset = self.timestamps.stimulus_start?;
                self.durations
                    .response_timeout
                    .map(|timeout| onset.saturating_add(nanos(timeout)))
            }
            TrialState::Feedback => self
                .timestamps
                .feedback_start
                .map(|start| start.saturating_add(nanos(self.durations.feedback))),
            TrialState::Complete => None,
        }
    }

    pub fn result(&self) -> TrialResult {
        let answer = self.response.zip(self.reaction_time());
        TrialResult::new(self.index, &self.descriptor, answer)
    }
}

/// Saturates instead of wrapping for durations past ~584 years.
pub(crate) fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encodex_core::Category;

    fn durations() -> TrialDurations {
        TrialDurations {
            fixation: Duration::from_secs(1),
            response_timeout: None,
            feedback: Duration::from_millis(1500),
        }
    }

    #[test]
    fn deadlines_follow_the_state() {
        let mut trial = Trial::new(1, TrialDescriptor::new("a.jpg", "none"), durations(), 500);
        assert_eq!(trial.deadline(), Some(1_000_000_500));

        trial.state = TrialState::Stimulus;
        trial.timestamps.stimulus_start = Some(2_000_000_000);
        assert_eq!(trial.deadline(), None);

        trial.durations.response_timeout = Some(Duration::from_secs(3));
        assert_eq!(trial.deadline(), Some(5_000_000_000));

        trial.state = TrialState::Feedback;
        trial.timestamps.feedback_start = Some(6_000_000_000);
        assert_eq!(trial.deadline(), Some(7_500_000_000));
    }

    #[test]
    fn result_uses_onset_relative_latency() {
        let mut trial = Trial::new(4, TrialDescriptor::new("b.jpg", "25%"), durations(), 0);
        trial.timestamps.stimulus_start = Some(1_000_000_000);
        trial.timestamps.response = Some(1_420_000_000);
        trial.response = Some(ResponseKey::One);

        assert_eq!(trial.reaction_time(), Some(Duration::from_millis(420)));
        let result = trial.result();
        assert_eq!(result.trial, 4);
        assert_eq!(result.rt, Some(0.42));
        assert_eq!(result.category, Category::Indoor);
    }

    #[test]
    fn huge_durations_saturate_instead_of_overflowing() {
        let huge = TrialDurations {
            fixation: Duration::from_millis(u64::MAX),
            response_timeout: Some(Duration::from_millis(u64::MAX)),
            feedback: Duration::from_millis(u64::MAX),
        };
        assert_eq!(nanos(Duration::from_millis(u64::MAX)), u64::MAX);

        let mut trial = Trial::new(1, TrialDescriptor::new("a.jpg", "none"), huge, 5);
        assert_eq!(trial.deadline(), Some(u64::MAX));

        trial.state = TrialState::Stimulus;
        trial.timestamps.stimulus_start = Some(10);
        assert_eq!(trial.deadline(), Some(u64::MAX));

        trial.state = TrialState::Feedback;
        trial.timestamps.feedback_start = Some(20);
        assert_eq!(trial.deadline(), Some(u64::MAX));
    }
}

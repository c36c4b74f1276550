use super::config::StudyConfig;
use super::trial::{Trial, TrialDurations, nanos};
use anyhow::{Context, Result};
use encodex_core::{
    KeyPress, Phase, ResponseKey, ResultSink, Screen, StudyPhase, TrialDescriptor, TrialResult,
    TrialState,
};
use encodex_timing::{AbortToken, Timer};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum StudyEvent {
    PhaseEntered(StudyPhase),
    TrialStarted(usize),
    StimulusOnset(usize),
    ResponseRecorded {
        trial: usize,
        key: ResponseKey,
        rt: Duration,
    },
    ResponseTimedOut(usize),
    TrialRecorded(usize),
    Finished,
    Aborted,
}

/// Drives a whole session: instruction screens, the trial loop and the farewell screen.
///
/// Time only moves forward through [`update`](Self::update); keys arrive through
/// [`handle_key`](Self::handle_key). Both check the abort token first.
pub struct StudyStateMachine<T, S>
where
    T: Timer,
    S: ResultSink,
{
    pub phase: StudyPhase,
    pub timer: T,
    pub config: StudyConfig,
    trials: Vec<TrialDescriptor>,
    current: Option<Trial>,
    trial_number: usize,
    results: Vec<TrialResult>,
    sink: S,
    abort: AbortToken,
    phase_start: u64,
}

impl<T, S> StudyStateMachine<T, S>
where
    T: Timer,
    S: ResultSink,
{
    pub fn new(
        config: StudyConfig,
        trials: Vec<TrialDescriptor>,
        timer: T,
        sink: S,
        abort: AbortToken,
    ) -> Self {
        let phase_start = timer.now();
        Self {
            phase: StudyPhase::default(),
            timer,
            config,
            results: Vec::with_capacity(trials.len()),
            trials,
            current: None,
            trial_number: 0,
            sink,
            abort,
            phase_start,
        }
    }

    /// Applies every time-driven transition that is due.
    pub fn update(&mut self) -> Result<Vec<StudyEvent>> {
        let mut events = Vec::new();
        if self.check_abort(&mut events) {
            return Ok(events);
        }

        match self.phase {
            phase if phase.is_trials() => self.update_trial(&mut events)?,
            phase if phase.is_farewell() => {
                if self.timer.elapsed(self.phase_start) >= self.config.farewell() {
                    self.advance_phase(&mut events);
                }
            }
            _ => {}
        }

        Ok(events)
    }

    pub fn handle_key(&mut self, key: KeyPress) -> Result<Vec<StudyEvent>> {
        let mut events = Vec::new();
        if self.check_abort(&mut events) {
            return Ok(events);
        }

        if self.phase.advances_on_key() {
            self.advance_phase(&mut events);
            return Ok(events);
        }

        if !self.phase.is_trials() {
            return Ok(events);
        }

        let now = self.timer.now();
        if let Some(trial) = &mut self.current {
            match trial.state {
                TrialState::Stimulus => {
                    if let Some(response) = ResponseKey::from_key(key) {
                        trial.response = Some(response);
                        trial.timestamps.response = Some(now);
                        trial.timestamps.feedback_start = Some(now);
                        trial.state = TrialState::Feedback;

                        let rt = trial.reaction_time().unwrap_or_default();
                        log::info!(
                            "Trial {}: response {} after {:.3} s",
                            trial.index,
                            response,
                            rt.as_secs_f64()
                        );
                        events.push(StudyEvent::ResponseRecorded {
                            trial: trial.index,
                            key: response,
                            rt,
                        });
                    }
                }
                // Keys outside the response window never reach a trial.
                _ => log::debug!("Discarding {:?} during {:?}", key, trial.state),
            }
        }

        Ok(events)
    }

    fn check_abort(&mut self, events: &mut Vec<StudyEvent>) -> bool {
        if self.phase == StudyPhase::Aborted {
            return true;
        }
        if !self.abort.is_cancelled() || self.phase.is_terminal() {
            return false;
        }

        if let Some(trial) = self.current.take() {
            log::warn!("Abort during trial {}, the trial is not recorded", trial.index);
        }
        log::warn!(
            "Session aborted after {} of {} trials",
            self.results.len(),
            self.trials.len()
        );
        self.phase = StudyPhase::Aborted;
        events.push(StudyEvent::Aborted);
        true
    }

    fn advance_phase(&mut self, events: &mut Vec<StudyEvent>) {
        let Some(next) = self.phase.next() else {
            return;
        };
        self.phase = next;
        self.phase_start = self.timer.now();
        log::debug!("Entering {:?}", next);
        events.push(StudyEvent::PhaseEntered(next));

        if next.is_trials() {
            self.trial_number = 0;
            self.start_next_trial(events);
        } else if next.is_terminal() {
            events.push(StudyEvent::Finished);
        }
    }

    fn start_next_trial(&mut self, events: &mut Vec<StudyEvent>) {
        let Some(descriptor) = self.trials.get(self.trial_number).cloned() else {
            self.current = None;
            self.advance_phase(events);
            return;
        };

        let index = self.trial_number + 1;
        let durations = TrialDurations {
            fixation: self.config.isi(),
            response_timeout: self.config.response_timeout(),
            feedback: self.config.feedback(),
        };
        log::debug!(
            "Trial {}/{} started: {} ({})",
            index,
            self.trials.len(),
            descriptor.image,
            descriptor.degradation
        );
        self.current = Some(Trial::new(index, descriptor, durations, self.timer.now()));
        events.push(StudyEvent::TrialStarted(index));
    }

    fn update_trial(&mut self, events: &mut Vec<StudyEvent>) -> Result<()> {
        let now = self.timer.now();
        let Some(trial) = &mut self.current else {
            return Ok(());
        };
        let due = trial.deadline().is_some_and(|deadline| now >= deadline);
        if !due {
            return Ok(());
        }

        match trial.state {
            TrialState::Fixation => {
                trial.state = TrialState::Stimulus;
                trial.timestamps.stimulus_start = Some(now);
                log::debug!("Trial {}: stimulus onset at {} ns", trial.index, now);
                events.push(StudyEvent::StimulusOnset(trial.index));
            }
            TrialState::Stimulus => {
                trial.state = TrialState::Feedback;
                trial.timestamps.feedback_start = Some(now);
                log::info!("Trial {}: no response", trial.index);
                events.push(StudyEvent::ResponseTimedOut(trial.index));
            }
            TrialState::Feedback => {
                trial.state = TrialState::Complete;
                self.complete_current_trial(events)?;
            }
            TrialState::Complete => {}
        }
        Ok(())
    }

    /// Records the finished trial in memory and on disk, then moves on.
    fn complete_current_trial(&mut self, events: &mut Vec<StudyEvent>) -> Result<()> {
        if let Some(trial) = self.current.take() {
            let result = trial.result();
            self.results.push(result.clone());
            self.sink
                .append(&result)
                .with_context(|| format!("failed to persist trial {}", result.trial))?;
            events.push(StudyEvent::TrialRecorded(result.trial));
        }
        self.trial_number += 1;
        self.start_next_trial(events);
        Ok(())
    }

    /// Re-anchors stimulus onset to the moment its first frame was presented, so
    /// reaction times and the response timeout start when the image is visible.
    /// Returns `false` when there is nothing to anchor.
    pub fn mark_presented(&mut self) -> bool {
        let now = self.timer.now();
        let Some(trial) = &mut self.current else {
            return false;
        };
        if trial.state != TrialState::Stimulus || trial.presented || trial.response.is_some() {
            return false;
        }
        trial.presented = true;
        if let Some(onset) = trial.timestamps.stimulus_start {
            log::debug!(
                "Trial {}: stimulus presented {:.3} ms after onset",
                trial.index,
                Duration::from_nanos(now.saturating_sub(onset)).as_secs_f64() * 1e3
            );
        }
        trial.timestamps.stimulus_start = Some(now);
        true
    }

    /// The next timestamp at which [`update`](Self::update) has work to do
    pub fn next_deadline(&self) -> Option<u64> {
        if self.phase == StudyPhase::Aborted {
            return None;
        }
        match self.phase {
            phase if phase.is_trials() => self.current.as_ref().and_then(Trial::deadline),
            phase if phase.is_farewell() => Some(
                self.phase_start
                    .saturating_add(nanos(self.config.farewell())),
            ),
            _ => None,
        }
    }

    pub fn screen(&self) -> Screen<'_> {
        let text = &self.config.text;
        match self.phase {
            StudyPhase::Welcome => Screen::Text(&text.welcome),
            StudyPhase::Instructions => Screen::Text(&text.instructions),
            StudyPhase::TaskInstructions => Screen::Text(&text.task),
            StudyPhase::Trials => match &self.current {
                Some(trial) => match trial.state {
                    TrialState::Fixation => Screen::Fixation,
                    TrialState::Stimulus => Screen::Image(trial.index - 1),
                    TrialState::Feedback => Screen::Text(match trial.response {
                        Some(ResponseKey::One) => &text.indoor_feedback,
                        Some(ResponseKey::Two) => &text.outdoor_feedback,
                        None => &text.no_response_feedback,
                    }),
                    TrialState::Complete => Screen::Blank,
                },
                None => Screen::Blank,
            },
            StudyPhase::Farewell => Screen::Text(&text.farewell),
            StudyPhase::Finished | StudyPhase::Aborted => Screen::Blank,
        }
    }

    pub fn current_trial_state(&self) -> Option<TrialState> {
        self.current.as_ref().map(|trial| trial.state)
    }

    /// (current trial, total) while trials are running
    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        self.current
            .as_ref()
            .map(|trial| (trial.index, self.trials.len()))
    }

    pub fn trials(&self) -> &[TrialDescriptor] {
        &self.trials
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_done(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn was_aborted(&self) -> bool {
        self.phase == StudyPhase::Aborted
    }
}

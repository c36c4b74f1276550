use crate::response::{Category, ResponseKey};
use crate::stimulus::TrialDescriptor;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-trial presentation states, visited strictly in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Fixation,
    Stimulus,
    Feedback,
    Complete,
}

/// Recorded result per trial, one CSV row in the session output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: usize,
    pub image: String,
    #[serde(rename = "degredation")]
    pub degradation: String,
    pub response: Option<String>,
    /// Reaction time in seconds from stimulus onset
    pub rt: Option<f64>,
    #[serde(rename = "indoor/outdoor")]
    pub category: Category,
}

impl TrialResult {
    pub fn new(
        trial: usize,
        descriptor: &TrialDescriptor,
        response: Option<(ResponseKey, Duration)>,
    ) -> Self {
        let (response, rt) = match response {
            Some((key, latency)) => (Some(key.label().to_string()), Some(latency.as_secs_f64())),
            None => (None, None),
        };
        let category = Category::from_response(response.as_deref());
        Self {
            trial,
            image: descriptor.image.clone(),
            degradation: descriptor.degradation.clone(),
            response,
            rt,
            category,
        }
    }

    pub fn responded(&self) -> bool {
        self.response.is_some()
    }
}

/// Destination for completed trials, written once per trial in order
pub trait ResultSink {
    fn append(&mut self, result: &TrialResult) -> std::io::Result<()>;
}

impl ResultSink for Vec<TrialResult> {
    fn append(&mut self, result: &TrialResult) -> std::io::Result<()> {
        self.push(result.clone());
        Ok(())
    }
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn append(&mut self, result: &TrialResult) -> std::io::Result<()> {
        (**self).append(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answered_trial_carries_rt_and_category() {
        let desc = TrialDescriptor::new("kettle.jpg", "none");
        let result = TrialResult::new(
            3,
            &desc,
            Some((ResponseKey::Two, Duration::from_millis(1100))),
        );
        assert_eq!(result.trial, 3);
        assert_eq!(result.response.as_deref(), Some("2"));
        assert_eq!(result.rt, Some(1.1));
        assert_eq!(result.category, Category::Outdoor);
        assert!(result.responded());
    }

    #[test]
    fn unanswered_trial_is_na() {
        let desc = TrialDescriptor::new("tent.jpg", "blur");
        let result = TrialResult::new(2, &desc, None);
        assert_eq!(result.response, None);
        assert_eq!(result.rt, None);
        assert_eq!(result.category, Category::NotAvailable);
        assert_eq!(result.degradation, "blur");
    }

    #[test]
    fn vec_sink_keeps_order() {
        let desc = TrialDescriptor::new("a.jpg", "none");
        let mut sink: Vec<TrialResult> = Vec::new();
        for i in 1..=3 {
            ResultSink::append(&mut sink, &TrialResult::new(i, &desc, None)).unwrap();
        }
        let indices: Vec<usize> = sink.iter().map(|r| r.trial).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}

use encodex_core::{Category, TrialResult};
use std::fmt;

/// End-of-session overview, logged at teardown
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub trials: usize,
    pub responded: usize,
    pub indoor: usize,
    pub outdoor: usize,
    pub no_response: usize,
    pub mean_rt_s: Option<f64>,
    pub min_rt_s: Option<f64>,
    pub max_rt_s: Option<f64>,
}

impl SessionSummary {
    pub fn from_results(results: &[TrialResult]) -> Self {
        let rts: Vec<f64> = results.iter().filter_map(|r| r.rt).collect();
        let count = |category: Category| {
            results
                .iter()
                .filter(|r| r.category == category)
                .count()
        };
        let mean_rt_s = if rts.is_empty() {
            None
        } else {
            Some(rts.iter().sum::<f64>() / rts.len() as f64)
        };

        Self {
            trials: results.len(),
            responded: results.iter().filter(|r| r.responded()).count(),
            indoor: count(Category::Indoor),
            outdoor: count(Category::Outdoor),
            no_response: count(Category::NotAvailable),
            mean_rt_s,
            min_rt_s: rts.iter().cloned().reduce(f64::min),
            max_rt_s: rts.iter().cloned().reduce(f64::max),
        }
    }

    pub fn response_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.responded as f64 / self.trials as f64 * 100.0
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trials: {}, response rate: {:.1}% (indoor {}, outdoor {}, NA {})",
            self.trials,
            self.response_rate(),
            self.indoor,
            self.outdoor,
            self.no_response
        )?;
        if let (Some(mean), Some(min), Some(max)) = (self.mean_rt_s, self.min_rt_s, self.max_rt_s) {
            write!(
                f,
                "; RT mean {:.3} s, min {:.3} s, max {:.3} s",
                mean, min, max
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encodex_core::{ResponseKey, TrialDescriptor};
    use std::time::Duration;

    #[test]
    fn counts_categories_and_rt() {
        let desc = TrialDescriptor::new("x.jpg", "none");
        let results = vec![
            TrialResult::new(1, &desc, Some((ResponseKey::One, Duration::from_millis(500)))),
            TrialResult::new(2, &desc, None),
            TrialResult::new(3, &desc, Some((ResponseKey::Two, Duration::from_millis(1500)))),
        ];
        let summary = SessionSummary::from_results(&results);
        assert_eq!(summary.trials, 3);
        assert_eq!(summary.responded, 2);
        assert_eq!((summary.indoor, summary.outdoor, summary.no_response), (1, 1, 1));
        assert_eq!(summary.mean_rt_s, Some(1.0));
        assert_eq!(summary.min_rt_s, Some(0.5));
        assert_eq!(summary.max_rt_s, Some(1.5));
        assert!(summary.to_string().contains("response rate: 66.7%"));
    }

    #[test]
    fn empty_session() {
        let summary = SessionSummary::from_results(&[]);
        assert_eq!(summary.response_rate(), 0.0);
        assert_eq!(summary.mean_rt_s, None);
        assert_eq!(
            summary.to_string(),
            "Trials: 0, response rate: 0.0% (indoor 0, outdoor 0, NA 0)"
        );
    }
}

/// Tells whether the user stepped away based on the time since the last input.
pub struct AfkEvaluator {
    threshold_ms: u32,
}

impl AfkEvaluator {
    pub fn from_seconds(threshold_s: u32) -> Self {
        Self {
            threshold_ms: threshold_s * 1000,
        }
    }

    pub fn is_afk(&self, idle_time: u32) -> bool {
        self.threshold_ms <= idle_time
    }
}

#[cfg(test)]
mod tests {
    use super::AfkEvaluator;

    #[test]
    fn test_afk_threshold() {
        let evaluator = AfkEvaluator::from_seconds(120);
        assert!(!evaluator.is_afk(0));
        assert!(!evaluator.is_afk(119_999));
        assert!(evaluator.is_afk(120_000));
    }
}

use std::collections::HashMap;

use crate::llm::ProviderId;

/// Per-provider success/failure counters for one orchestrator
#[derive(Debug, Default, Clone)]
pub struct Metrics {
    success_counts: HashMap<ProviderId, u64>,
    failure_counts: HashMap<ProviderId, u64>,
    failovers: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, provider: ProviderId) {
        *self.success_counts.entry(provider).or_insert(0) += 1;
    }

    pub fn record_failure(&mut self, provider: ProviderId) {
        *self.failure_counts.entry(provider).or_insert(0) += 1;
    }

    pub fn record_failover(&mut self) {
        self.failovers += 1;
    }

    pub fn get_success_count(&self, provider: ProviderId) -> u64 {
        *self.success_counts.get(&provider).unwrap_or(&0)
    }

    pub fn get_failure_count(&self, provider: ProviderId) -> u64 {
        *self.failure_counts.get(&provider).unwrap_or(&0)
    }

    pub fn get_failover_count(&self) -> u64 {
        self.failovers
    }

    pub fn get_success_rate(&self, provider: ProviderId) -> f32 {
        let success = self.get_success_count(provider) as f32;
        let total = success + self.get_failure_count(provider) as f32;

        if total == 0.0 {
            0.0
        } else {
            success / total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let mut metrics = Metrics::new();
        assert_eq!(metrics.get_success_rate(ProviderId::Gemini), 0.0);

        metrics.record_success(ProviderId::Gemini);
        metrics.record_success(ProviderId::Gemini);
        metrics.record_success(ProviderId::Gemini);
        metrics.record_failure(ProviderId::Gemini);

        assert_eq!(metrics.get_success_rate(ProviderId::Gemini), 0.75);
        assert_eq!(metrics.get_failure_count(ProviderId::OpenRouter), 0);
    }
}

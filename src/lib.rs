pub mod advisor;
pub mod config;
pub mod extract;
pub mod llm;
pub mod orchestrator;
pub mod settings;

#[cfg(test)]
mod testing;

pub use advisor::{AdvisorError, InvestmentAdvisor};
pub use config::ProviderConfig;
pub use extract::{extract_json, extract_json_as, parse_prediction, ParseError};
pub use llm::{
    CompletionAdapter, FailureKind, GenerationFailure, GenerationRequest, GenerationResult,
    ProviderId,
};
pub use orchestrator::FailoverOrchestrator;
pub use settings::{FileSettingsStore, SettingsSource, UserSettings};

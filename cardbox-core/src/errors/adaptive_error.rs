/// Adaptive mode-selection errors.
#[derive(Debug, thiserror::Error)]
pub enum AdaptiveError {
    #[error("no candidate execution modes supplied")]
    NoCandidateModes,

    #[error("telemetry request failed: {reason}")]
    TelemetryFailed { reason: String },
}

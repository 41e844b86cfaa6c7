/// Input and invariant validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("scope key has an empty {field}")]
    EmptyScopeField { field: &'static str },

    #[error("malformed scope key: {input}")]
    MalformedScope { input: String },

    #[error("bitmap value {value} out of range (must be < 2^31)")]
    BitmapOutOfRange { value: u64 },

    #[error("card {card_id} has a divergent tag projection: {reason}")]
    DivergentProjection { card_id: String, reason: String },

    #[error("content key must be 32 bytes, got {len}")]
    InvalidContentKey { len: usize },
}

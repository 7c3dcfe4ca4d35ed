use thiserror::Error;

/// Top-level error type for the ambler locomotion stack.
#[derive(Debug, Error)]
pub enum AmblerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Gait switch error: {0}")]
    Switch(#[from] SwitchError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Unknown gait: {0}")]
    UnknownGait(String),

    #[error("Swing order {0:?} is not a permutation of the four legs")]
    InvalidSwingOrder([usize; 4]),

    #[error("Curve needs at least two knots with strictly increasing abscissae")]
    InvalidCurve,
}

/// Runtime gait-switching errors.
///
/// These reject the request without mutating switcher state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    #[error("A gait transition is already in progress")]
    AlreadyTransiting,

    #[error("No transition configured from {from} to {to}")]
    TransitionNotFound { from: String, to: String },

    #[error("Unknown gait: {0}")]
    UnknownGait(String),
}

//! Application error type.
//!
//! Every fallible operation in the crate returns `AppError`. The `kind` tells
//! callers which class of failure happened; the exit code is what the binary
//! reports to the shell.

/// Failure classes surfaced by the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad smoothing parameters, malformed input data or bad config values.
    InvalidConfiguration,
    /// A seed value lies outside its declared bound range.
    InvalidSeedParameters,
    /// The optimizer exhausted its budget (or diverged) without a solution.
    FitDidNotConverge,
    /// Ill-conditioned linear algebra or non-finite intermediate values.
    Numerical,
    /// File not found, unreadable or unwritable.
    Io,
}

impl ErrorKind {
    fn exit_code(self) -> u8 {
        match self {
            ErrorKind::InvalidConfiguration | ErrorKind::Io => 2,
            ErrorKind::InvalidSeedParameters => 3,
            ErrorKind::FitDidNotConverge | ErrorKind::Numerical => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            exit_code: kind.exit_code(),
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfiguration, message)
    }

    pub fn invalid_seed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSeedParameters, message)
    }

    pub fn not_converged(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FitDidNotConverge, message)
    }

    pub fn numerical(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Numerical, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

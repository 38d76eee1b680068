//! Decode errors for inbound device messages.

/// Why an inbound message was dropped.
#[derive(Debug)]
pub enum DecodeError {
    /// Buffer is shorter than the fixed command header.
    TooShort { len: usize, min: usize },
    UnknownKind(u8),
    UnknownViewState(i32),
    /// Declared frame or command length exceeds the accepted maximum.
    Oversized(usize),
    Bincode(bincode::error::DecodeError),
    Json(serde_json::Error),
}

impl From<bincode::error::DecodeError> for DecodeError {
    fn from(e: bincode::error::DecodeError) -> Self {
        Self::Bincode(e)
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { len, min } => {
                write!(f, "message too short: {} bytes (need {})", len, min)
            }
            Self::UnknownKind(kind) => write!(f, "unknown command kind {}", kind),
            Self::UnknownViewState(state) => write!(f, "unknown view state {}", state),
            Self::Oversized(len) => write!(f, "message too large: {} bytes", len),
            Self::Bincode(e) => write!(f, "binary decode error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {}

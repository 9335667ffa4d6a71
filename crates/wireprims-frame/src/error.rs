/// Errors that can occur while decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A decoder's value was requested before it reported completion.
    #[error("decoder value requested before completion")]
    NotReady,

    /// An integer decoder was configured with an unsupported width.
    #[error("unsupported integer width {0} (expected 1..=8 bytes)")]
    InvalidWidth(usize),

    /// The frame payload does not match the layout its header declares.
    #[error("malformed {frame_type} frame: {reason}")]
    Malformed {
        frame_type: &'static str,
        reason: String,
    },

    /// The declared payload length exceeds the configured maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: u32, max: u32 },

    /// The stream did not open with the client connection preface.
    #[error("invalid connection preface")]
    InvalidPreface,

    /// An I/O error occurred while reading frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    pub(crate) fn malformed(frame_type: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            frame_type,
            reason: reason.into(),
        }
    }

    /// Returns true for errors caused by the peer's bytes rather than by
    /// misuse of the decoder API or the underlying stream.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::Malformed { .. } | Self::FrameTooLarge { .. } | Self::InvalidPreface
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;

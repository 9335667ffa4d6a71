//! Incremental decoding of HTTP/2-style binary frames.
//!
//! Every frame is a 9-byte header followed by a typed payload:
//! - 24-bit big-endian payload length
//! - 8-bit type and 8-bit flags
//! - 31-bit stream identifier (the reserved top bit is dropped)
//!
//! Bytes may arrive split at any position. The decoders keep their place
//! between calls and hand back a frame only once it is complete.

pub mod body;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod header;
pub mod partial;
pub mod reader;

#[cfg(feature = "async")]
pub use codec::FrameCodec;
pub use codec::{FrameConfig, DEFAULT_MAX_FRAME_SIZE};
pub use decoder::FrameDecoder;
pub use error::{FrameError, Result};
pub use frame::{
    flags, ContinuationFrame, DataFrame, ErrorCode, Frame, FrameType, GoAwayFrame, HeadersFrame,
    PingFrame, PriorityFrame, PushPromiseFrame, RstStreamFrame, Setting, SettingsFrame,
    StreamDependency, UnknownFrame, WindowUpdateFrame,
};
pub use header::{FrameHeader, HeaderDecoder, HEADER_SIZE, MAX_FRAME_LENGTH, STREAM_ID_MASK};
pub use partial::{BytesDecoder, IntDecoder, PartialDecode, SkipDecoder};
pub use reader::{FrameReader, CONNECTION_PREFACE};

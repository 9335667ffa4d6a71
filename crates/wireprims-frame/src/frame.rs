//! Decoded frame values.
//!
//! A [`Frame`] only exists once every byte of its payload has been consumed.
//! Partially decoded frames live inside the body decoders and are never
//! exposed.

use std::fmt;

use bytes::Bytes;

use crate::header::{FrameHeader, HEADER_SIZE};

/// Flag bits with a fixed meaning for at least one frame type.
pub mod flags {
    /// DATA, HEADERS: last frame the endpoint sends on the stream.
    pub const END_STREAM: u8 = 0x01;
    /// SETTINGS, PING: acknowledgement.
    pub const ACK: u8 = 0x01;
    /// HEADERS, PUSH_PROMISE, CONTINUATION: header block is complete.
    pub const END_HEADERS: u8 = 0x04;
    /// DATA, HEADERS, PUSH_PROMISE: payload carries a pad length and padding.
    pub const PADDED: u8 = 0x08;
    /// HEADERS: payload carries a stream dependency and weight.
    pub const PRIORITY: u8 = 0x20;
}

/// Frame type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Data,
    Headers,
    Priority,
    RstStream,
    Settings,
    PushPromise,
    Ping,
    GoAway,
    WindowUpdate,
    Continuation,
    /// Any code without a defined layout. Decoded as an opaque payload.
    Unknown(u8),
}

impl FrameType {
    /// The wire code.
    pub fn code(self) -> u8 {
        match self {
            FrameType::Data => 0x0,
            FrameType::Headers => 0x1,
            FrameType::Priority => 0x2,
            FrameType::RstStream => 0x3,
            FrameType::Settings => 0x4,
            FrameType::PushPromise => 0x5,
            FrameType::Ping => 0x6,
            FrameType::GoAway => 0x7,
            FrameType::WindowUpdate => 0x8,
            FrameType::Continuation => 0x9,
            FrameType::Unknown(code) => code,
        }
    }

    /// Protocol name, e.g. `"WINDOW_UPDATE"`.
    pub fn name(self) -> &'static str {
        match self {
            FrameType::Data => "DATA",
            FrameType::Headers => "HEADERS",
            FrameType::Priority => "PRIORITY",
            FrameType::RstStream => "RST_STREAM",
            FrameType::Settings => "SETTINGS",
            FrameType::PushPromise => "PUSH_PROMISE",
            FrameType::Ping => "PING",
            FrameType::GoAway => "GOAWAY",
            FrameType::WindowUpdate => "WINDOW_UPDATE",
            FrameType::Continuation => "CONTINUATION",
            FrameType::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<u8> for FrameType {
    fn from(code: u8) -> Self {
        match code {
            0x0 => FrameType::Data,
            0x1 => FrameType::Headers,
            0x2 => FrameType::Priority,
            0x3 => FrameType::RstStream,
            0x4 => FrameType::Settings,
            0x5 => FrameType::PushPromise,
            0x6 => FrameType::Ping,
            0x7 => FrameType::GoAway,
            0x8 => FrameType::WindowUpdate,
            0x9 => FrameType::Continuation,
            other => FrameType::Unknown(other),
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameType::Unknown(code) => write!(f, "UNKNOWN(0x{code:02x})"),
            known => f.write_str(known.name()),
        }
    }
}

/// Stream dependency carried by PRIORITY frames and prioritized HEADERS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDependency {
    /// Stream this one depends on (31 bits).
    pub dependency: u32,
    /// Whether the dependency is exclusive (the reserved top bit on the wire).
    pub exclusive: bool,
    /// Weight in 1..=256. The wire byte holds `weight - 1`.
    pub weight: u16,
}

impl StreamDependency {
    pub(crate) fn from_wire(field: u32, weight: u8) -> Self {
        Self {
            dependency: field & crate::header::STREAM_ID_MASK,
            exclusive: field & !crate::header::STREAM_ID_MASK != 0,
            weight: u16::from(weight) + 1,
        }
    }
}

/// A single SETTINGS entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setting {
    pub identifier: u16,
    pub value: u32,
}

impl Setting {
    /// Split a 48-bit entry: identifier in bits 32-47, value in bits 0-31.
    pub(crate) fn from_entry(entry: u64) -> Self {
        Self {
            identifier: (entry >> 32) as u16,
            value: entry as u32,
        }
    }

    /// Registered name of the identifier, if any.
    pub fn name(&self) -> Option<&'static str> {
        Some(match self.identifier {
            0x1 => "HEADER_TABLE_SIZE",
            0x2 => "ENABLE_PUSH",
            0x3 => "MAX_CONCURRENT_STREAMS",
            0x4 => "INITIAL_WINDOW_SIZE",
            0x5 => "MAX_FRAME_SIZE",
            0x6 => "MAX_HEADER_LIST_SIZE",
            0x8 => "ENABLE_CONNECT_PROTOCOL",
            _ => return None,
        })
    }
}

/// 32-bit error code from RST_STREAM and GOAWAY frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    /// Registered name of the code, if any.
    pub fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0x0 => "NO_ERROR",
            0x1 => "PROTOCOL_ERROR",
            0x2 => "INTERNAL_ERROR",
            0x3 => "FLOW_CONTROL_ERROR",
            0x4 => "SETTINGS_TIMEOUT",
            0x5 => "STREAM_CLOSED",
            0x6 => "FRAME_SIZE_ERROR",
            0x7 => "REFUSED_STREAM",
            0x8 => "CANCEL",
            0x9 => "COMPRESSION_ERROR",
            0xa => "CONNECT_ERROR",
            0xb => "ENHANCE_YOUR_CALM",
            0xc => "INADEQUATE_SECURITY",
            0xd => "HTTP_1_1_REQUIRED",
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:x}", self.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    pub header: FrameHeader,
    /// Present when the PADDED flag is set.
    pub pad_length: Option<u8>,
    pub data: Bytes,
}

impl DataFrame {
    pub fn end_stream(&self) -> bool {
        self.header.has_flag(flags::END_STREAM)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadersFrame {
    pub header: FrameHeader,
    pub pad_length: Option<u8>,
    /// Present when the PRIORITY flag is set.
    pub priority: Option<StreamDependency>,
    /// Opaque (HPACK-encoded) header block fragment.
    pub header_block: Bytes,
}

impl HeadersFrame {
    pub fn end_stream(&self) -> bool {
        self.header.has_flag(flags::END_STREAM)
    }

    pub fn end_headers(&self) -> bool {
        self.header.has_flag(flags::END_HEADERS)
    }

    pub fn has_priority(&self) -> bool {
        self.header.has_flag(flags::PRIORITY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityFrame {
    pub header: FrameHeader,
    pub priority: StreamDependency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RstStreamFrame {
    pub header: FrameHeader,
    pub error_code: ErrorCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsFrame {
    pub header: FrameHeader,
    pub settings: Vec<Setting>,
}

impl SettingsFrame {
    pub fn is_ack(&self) -> bool {
        self.header.has_flag(flags::ACK)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPromiseFrame {
    pub header: FrameHeader,
    pub pad_length: Option<u8>,
    /// Reserved stream (31 bits).
    pub promised_stream_id: u32,
    pub header_block: Bytes,
}

impl PushPromiseFrame {
    pub fn end_headers(&self) -> bool {
        self.header.has_flag(flags::END_HEADERS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingFrame {
    pub header: FrameHeader,
    pub opaque_data: [u8; 8],
}

impl PingFrame {
    pub fn is_ack(&self) -> bool {
        self.header.has_flag(flags::ACK)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoAwayFrame {
    pub header: FrameHeader,
    /// Highest stream the sender may have processed (31 bits).
    pub last_stream_id: u32,
    pub error_code: ErrorCode,
    /// Whatever trailed the fixed fields. Diagnostic only.
    pub debug_data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowUpdateFrame {
    pub header: FrameHeader,
    /// Window size increment (31 bits).
    pub increment: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationFrame {
    pub header: FrameHeader,
    pub header_block: Bytes,
}

impl ContinuationFrame {
    pub fn end_headers(&self) -> bool {
        self.header.has_flag(flags::END_HEADERS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFrame {
    pub header: FrameHeader,
    pub payload: Bytes,
}

/// A completely decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(DataFrame),
    Headers(HeadersFrame),
    Priority(PriorityFrame),
    RstStream(RstStreamFrame),
    Settings(SettingsFrame),
    PushPromise(PushPromiseFrame),
    Ping(PingFrame),
    GoAway(GoAwayFrame),
    WindowUpdate(WindowUpdateFrame),
    Continuation(ContinuationFrame),
    Unknown(UnknownFrame),
}

impl Frame {
    /// The header this frame was decoded from.
    pub fn header(&self) -> &FrameHeader {
        match self {
            Frame::Data(f) => &f.header,
            Frame::Headers(f) => &f.header,
            Frame::Priority(f) => &f.header,
            Frame::RstStream(f) => &f.header,
            Frame::Settings(f) => &f.header,
            Frame::PushPromise(f) => &f.header,
            Frame::Ping(f) => &f.header,
            Frame::GoAway(f) => &f.header,
            Frame::WindowUpdate(f) => &f.header,
            Frame::Continuation(f) => &f.header,
            Frame::Unknown(f) => &f.header,
        }
    }

    pub fn frame_type(&self) -> FrameType {
        self.header().kind()
    }

    pub fn stream_id(&self) -> u32 {
        self.header().stream_id
    }

    pub fn flags(&self) -> u8 {
        self.header().flags
    }

    /// Bytes this frame occupied on the wire: the header plus the declared
    /// payload, except that PING always carries at least its eight opaque bytes.
    pub fn wire_size(&self) -> usize {
        let length = self.header().length as usize;
        match self {
            Frame::Ping(_) => HEADER_SIZE + length.max(8),
            _ => HEADER_SIZE + length,
        }
    }

    /// The opaque byte run the frame carries, if any: DATA payload, header
    /// block fragments, GOAWAY debug data or an unknown frame's payload.
    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            Frame::Data(f) => Some(&f.data),
            Frame::Headers(f) => Some(&f.header_block),
            Frame::PushPromise(f) => Some(&f.header_block),
            Frame::Continuation(f) => Some(&f.header_block),
            Frame::GoAway(f) => Some(&f.debug_data),
            Frame::Unknown(f) => Some(&f.payload),
            Frame::Priority(_)
            | Frame::RstStream(_)
            | Frame::Settings(_)
            | Frame::Ping(_)
            | Frame::WindowUpdate(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_type_codes_roundtrip_through_from() {
        for code in 0..=u8::MAX {
            assert_eq!(FrameType::from(code).code(), code);
        }
        assert_eq!(FrameType::from(0x4), FrameType::Settings);
        assert_eq!(FrameType::from(0xFF), FrameType::Unknown(0xFF));
    }

    #[test]
    fn frame_type_display() {
        assert_eq!(FrameType::WindowUpdate.to_string(), "WINDOW_UPDATE");
        assert_eq!(FrameType::Unknown(0xa).to_string(), "UNKNOWN(0x0a)");
    }

    #[test]
    fn stream_dependency_splits_exclusive_bit() {
        let dep = StreamDependency::from_wire(0x8000_0003, 15);
        assert_eq!(dep.dependency, 3);
        assert!(dep.exclusive);
        assert_eq!(dep.weight, 16);

        let max = StreamDependency::from_wire(0x7FFF_FFFF, 255);
        assert!(!max.exclusive);
        assert_eq!(max.weight, 256);
    }

    #[test]
    fn setting_entry_split() {
        let setting = Setting::from_entry(0x0004_0000_FFFF);
        assert_eq!(setting.identifier, 4);
        assert_eq!(setting.value, 0xFFFF);
        assert_eq!(setting.name(), Some("INITIAL_WINDOW_SIZE"));
        assert_eq!(Setting::from_entry(0x00FF_0000_0000).name(), None);
    }

    #[test]
    fn error_code_display() {
        assert_eq!(ErrorCode(0x8).to_string(), "CANCEL");
        assert_eq!(ErrorCode(0x1234).to_string(), "0x1234");
    }
}

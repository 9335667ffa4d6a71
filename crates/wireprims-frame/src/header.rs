use bytes::Buf;

use crate::error::{FrameError, Result};
use crate::frame::FrameType;
use crate::partial::{IntDecoder, PartialDecode};

/// Frame header: length (3) + type (1) + flags (1) + stream id (4) = 9 bytes.
pub const HEADER_SIZE: usize = 9;

/// Low 31 bits of a stream identifier field; the top bit is reserved.
pub const STREAM_ID_MASK: u32 = 0x7FFF_FFFF;

/// Largest length a 24-bit length field can carry.
pub const MAX_FRAME_LENGTH: u32 = 0x00FF_FFFF;

/// The fixed 9-byte frame header.
///
/// Wire format:
/// ```text
/// ┌──────────────────────────────┬──────────┬──────────┬───┬───────────────────┐
/// │ Length (24, BE)              │ Type (8) │ Flags (8)│ R │ Stream Id (31, BE)│
/// └──────────────────────────────┴──────────┴──────────┴───┴───────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameHeader {
    /// Payload length in bytes (24 bits).
    pub length: u32,
    /// Raw type code.
    pub frame_type: u8,
    /// Type-dependent flag bits.
    pub flags: u8,
    /// Stream identifier with the reserved bit removed.
    pub stream_id: u32,
}

impl FrameHeader {
    pub fn new(length: u32, frame_type: u8, flags: u8, stream_id: u32) -> Self {
        Self {
            length: length & MAX_FRAME_LENGTH,
            frame_type,
            flags,
            stream_id: stream_id & STREAM_ID_MASK,
        }
    }

    /// The type code interpreted as a [`FrameType`].
    pub fn kind(&self) -> FrameType {
        FrameType::from(self.frame_type)
    }

    /// Whether every bit in `flag` is set.
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag == flag
    }

    pub fn payload_len(&self) -> usize {
        self.length as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Length,
    TypeAndFlags,
    StreamId,
    Done,
}

/// Resumable decoder for [`FrameHeader`].
///
/// Drains `Length (3) → Type+Flags (2) → Stream Id (4)` from the cursor,
/// moving on to the next field within the same call as soon as one completes.
#[derive(Debug, Clone)]
pub struct HeaderDecoder {
    field: Field,
    int: IntDecoder,
    header: FrameHeader,
}

impl Default for HeaderDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderDecoder {
    pub fn new() -> Self {
        Self {
            field: Field::Length,
            int: IntDecoder::u24(),
            header: FrameHeader::default(),
        }
    }

    /// True before the first header byte has been consumed.
    pub fn is_idle(&self) -> bool {
        self.field == Field::Length && self.int.consumed() == 0
    }
}

impl PartialDecode for HeaderDecoder {
    type Output = FrameHeader;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        while self.field != Field::Done {
            if !self.int.consume(src)? {
                return Ok(false);
            }
            let value = self.int.value()?;
            match self.field {
                Field::Length => {
                    self.header.length = value as u32;
                    self.field = Field::TypeAndFlags;
                    self.int = IntDecoder::u16();
                }
                Field::TypeAndFlags => {
                    self.header.frame_type = (value >> 8) as u8;
                    self.header.flags = value as u8;
                    self.field = Field::StreamId;
                    self.int = IntDecoder::u32();
                }
                Field::StreamId => {
                    self.header.stream_id = value as u32 & STREAM_ID_MASK;
                    self.field = Field::Done;
                }
                Field::Done => {}
            }
        }
        Ok(true)
    }

    fn is_complete(&self) -> bool {
        self.field == Field::Done
    }

    fn value(&mut self) -> Result<FrameHeader> {
        if !self.is_complete() {
            return Err(FrameError::NotReady);
        }
        Ok(self.header)
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIRE: [u8; 9] = [0x00, 0x01, 0x02, 0x04, 0x01, 0x80, 0x00, 0x00, 0x05];

    #[test]
    fn decodes_all_fields() {
        let mut dec = HeaderDecoder::new();
        let mut src: &[u8] = &WIRE;

        assert!(dec.consume(&mut src).unwrap());
        let header = dec.value().unwrap();

        assert_eq!(header.length, 0x0102);
        assert_eq!(header.frame_type, 0x04);
        assert_eq!(header.kind(), FrameType::Settings);
        assert_eq!(header.flags, 0x01);
        assert_eq!(header.stream_id, 5);
        assert!(src.is_empty());
    }

    #[test]
    fn reserved_bit_is_masked() {
        let mut dec = HeaderDecoder::new();
        let mut src: &[u8] = &[0, 0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF];
        dec.consume(&mut src).unwrap();

        assert_eq!(dec.value().unwrap().stream_id, 0x7FFF_FFFF);
    }

    #[test]
    fn every_split_point_yields_same_header() {
        let mut expected = HeaderDecoder::new();
        expected.consume(&mut &WIRE[..]).unwrap();
        let expected = expected.value().unwrap();

        for split in 0..=WIRE.len() {
            let mut dec = HeaderDecoder::new();
            let mut first = &WIRE[..split];
            let mut second = &WIRE[split..];

            let done = dec.consume(&mut first).unwrap();
            assert_eq!(done, split == WIRE.len());
            assert!(first.is_empty());

            assert!(dec.consume(&mut second).unwrap());
            assert_eq!(dec.value().unwrap(), expected);
        }
    }

    #[test]
    fn does_not_read_past_header() {
        let mut dec = HeaderDecoder::new();
        let mut wire = WIRE.to_vec();
        wire.extend_from_slice(&[0xAA, 0xBB]);
        let mut src = &wire[..];

        assert!(dec.consume(&mut src).unwrap());
        assert_eq!(src, &[0xAA, 0xBB]);
    }

    #[test]
    fn value_before_completion_fails() {
        let mut dec = HeaderDecoder::new();
        let mut src: &[u8] = &WIRE[..4];
        dec.consume(&mut src).unwrap();

        assert!(matches!(dec.value(), Err(FrameError::NotReady)));
        assert!(!dec.is_idle());
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut dec = HeaderDecoder::new();
        dec.consume(&mut &WIRE[..]).unwrap();
        dec.reset();

        assert!(dec.is_idle());
        assert!(!dec.is_complete());
        assert!(dec.consume(&mut &WIRE[..]).unwrap());
    }

    #[test]
    fn new_masks_fields() {
        let header = FrameHeader::new(0x0100_0001, 0x0, 0x0, 0x8000_0001);
        assert_eq!(header.length, 1);
        assert_eq!(header.stream_id, 1);
    }
}

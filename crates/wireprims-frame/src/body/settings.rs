use bytes::Buf;

use super::{prime, primed, take_frame};
use crate::error::{FrameError, Result};
use crate::frame::{Frame, Setting, SettingsFrame};
use crate::header::FrameHeader;
use crate::partial::{IntDecoder, PartialDecode};

const NAME: &str = "SETTINGS";

/// Identifier (2) + value (4).
const ENTRY_LEN: usize = 6;

/// `(Identifier (16) Value (32))*`
///
/// Each entry is read as one 48-bit integer and split afterwards. A length
/// that is not a whole number of entries is rejected up front rather than
/// leaving the stream misaligned.
#[derive(Debug)]
pub struct SettingsDecoder {
    header: FrameHeader,
    count: usize,
    entry: IntDecoder,
    settings: Vec<Setting>,
    done: bool,
    frame: Option<Frame>,
}

impl SettingsDecoder {
    pub fn new(header: FrameHeader) -> Result<Self> {
        if header.payload_len() % ENTRY_LEN != 0 {
            return Err(FrameError::malformed(
                NAME,
                format!("length {} is not a multiple of {ENTRY_LEN}", header.length),
            ));
        }
        primed(Self::initial(header))
    }

    fn initial(header: FrameHeader) -> Self {
        let count = header.payload_len() / ENTRY_LEN;
        Self {
            header,
            count,
            entry: IntDecoder::u48(),
            settings: Vec::with_capacity(count),
            done: false,
            frame: None,
        }
    }
}

impl PartialDecode for SettingsDecoder {
    type Output = Frame;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        if self.done {
            return Ok(true);
        }
        while self.settings.len() < self.count {
            if !self.entry.consume(src)? {
                return Ok(false);
            }
            self.settings.push(Setting::from_entry(self.entry.value()?));
            self.entry.reset();
        }
        self.frame = Some(Frame::Settings(SettingsFrame {
            header: self.header,
            settings: std::mem::take(&mut self.settings),
        }));
        self.done = true;
        Ok(true)
    }

    fn is_complete(&self) -> bool {
        self.done
    }

    fn value(&mut self) -> Result<Frame> {
        take_frame(&mut self.frame)
    }

    fn reset(&mut self) {
        *self = Self::initial(self.header);
        // The header passed validation in `new`; an empty cursor cannot fail.
        let _ = prime(self);
    }
}

//! Per-type payload decoders.
//!
//! Each decoder is built from an already decoded [`FrameHeader`], checks that
//! the declared length can hold the type's fixed fields, and then walks its
//! own field states over payload bytes only. Decoders whose payload needs no
//! bytes at all are complete as soon as they are constructed.

use bytes::Buf;

use crate::error::{FrameError, Result};
use crate::frame::{Frame, FrameType};
use crate::header::FrameHeader;
use crate::partial::PartialDecode;

mod continuation;
mod data;
mod goaway;
mod headers;
mod ping;
mod priority;
mod push_promise;
mod rst_stream;
mod settings;
mod unknown;
mod window_update;

pub use continuation::ContinuationDecoder;
pub use data::DataDecoder;
pub use goaway::GoAwayDecoder;
pub use headers::HeadersDecoder;
pub use ping::PingDecoder;
pub use priority::PriorityDecoder;
pub use push_promise::PushPromiseDecoder;
pub use rst_stream::RstStreamDecoder;
pub use settings::SettingsDecoder;
pub use unknown::UnknownDecoder;
pub use window_update::WindowUpdateDecoder;

/// Payload decoder for any frame type.
#[derive(Debug)]
pub enum BodyDecoder {
    Data(DataDecoder),
    Headers(HeadersDecoder),
    Priority(PriorityDecoder),
    RstStream(RstStreamDecoder),
    Settings(SettingsDecoder),
    PushPromise(PushPromiseDecoder),
    Ping(PingDecoder),
    GoAway(GoAwayDecoder),
    WindowUpdate(WindowUpdateDecoder),
    Continuation(ContinuationDecoder),
    Unknown(UnknownDecoder),
}

impl BodyDecoder {
    /// Select and construct the decoder for `header.frame_type`.
    ///
    /// Unrecognized codes get the [`UnknownDecoder`], which never fails.
    pub fn for_header(header: FrameHeader) -> Result<Self> {
        Ok(match header.kind() {
            FrameType::Data => Self::Data(DataDecoder::new(header)?),
            FrameType::Headers => Self::Headers(HeadersDecoder::new(header)?),
            FrameType::Priority => Self::Priority(PriorityDecoder::new(header)?),
            FrameType::RstStream => Self::RstStream(RstStreamDecoder::new(header)?),
            FrameType::Settings => Self::Settings(SettingsDecoder::new(header)?),
            FrameType::PushPromise => Self::PushPromise(PushPromiseDecoder::new(header)?),
            FrameType::Ping => Self::Ping(PingDecoder::new(header)?),
            FrameType::GoAway => Self::GoAway(GoAwayDecoder::new(header)?),
            FrameType::WindowUpdate => Self::WindowUpdate(WindowUpdateDecoder::new(header)?),
            FrameType::Continuation => Self::Continuation(ContinuationDecoder::new(header)?),
            FrameType::Unknown(_) => Self::Unknown(UnknownDecoder::new(header)?),
        })
    }
}

macro_rules! each_decoder {
    ($self:expr, $dec:ident => $body:expr) => {
        match $self {
            BodyDecoder::Data($dec) => $body,
            BodyDecoder::Headers($dec) => $body,
            BodyDecoder::Priority($dec) => $body,
            BodyDecoder::RstStream($dec) => $body,
            BodyDecoder::Settings($dec) => $body,
            BodyDecoder::PushPromise($dec) => $body,
            BodyDecoder::Ping($dec) => $body,
            BodyDecoder::GoAway($dec) => $body,
            BodyDecoder::WindowUpdate($dec) => $body,
            BodyDecoder::Continuation($dec) => $body,
            BodyDecoder::Unknown($dec) => $body,
        }
    };
}

impl PartialDecode for BodyDecoder {
    type Output = Frame;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        each_decoder!(self, dec => dec.consume(src))
    }

    fn is_complete(&self) -> bool {
        each_decoder!(self, dec => dec.is_complete())
    }

    /// Hands the finished frame over; a second call fails with `NotReady`.
    fn value(&mut self) -> Result<Frame> {
        each_decoder!(self, dec => dec.value())
    }

    fn reset(&mut self) {
        each_decoder!(self, dec => dec.reset())
    }
}

/// Run a decoder over an empty cursor so that frames whose payload needs no
/// bytes finish without waiting for input. Both construction and `reset` go
/// through here, so a zero-length frame is complete in either case.
fn prime<D: PartialDecode>(decoder: &mut D) -> Result<()> {
    let mut empty: &[u8] = &[];
    decoder.consume(&mut empty).map(drop)
}

fn primed<D: PartialDecode>(mut decoder: D) -> Result<D> {
    prime(&mut decoder)?;
    Ok(decoder)
}

/// Reject a header whose length cannot hold `fixed` bytes of mandatory fields.
fn require_len(header: &FrameHeader, fixed: usize, frame_type: &'static str) -> Result<()> {
    if header.payload_len() < fixed {
        return Err(FrameError::malformed(
            frame_type,
            format!(
                "length {} shorter than {fixed} bytes of fixed fields",
                header.length
            ),
        ));
    }
    Ok(())
}

/// Bytes left for content once `pad_length` bytes of padding are set aside
/// from the `available` bytes that follow the fixed fields.
fn unpadded_len(available: usize, pad_length: u8, frame_type: &'static str) -> Result<usize> {
    available.checked_sub(usize::from(pad_length)).ok_or_else(|| {
        FrameError::malformed(
            frame_type,
            format!("pad length {pad_length} exceeds {available} remaining payload bytes"),
        )
    })
}

/// Take the finished frame out of a decoder's slot.
fn take_frame(slot: &mut Option<Frame>) -> Result<Frame> {
    slot.take().ok_or(FrameError::NotReady)
}

//! Incremental HTTP/2-style frame decoding.
//!
//! # Crate Structure
//!
//! - [`frame`]: resumable frame decoders, frame values and stream readers

/// Re-export frame types.
pub mod frame {
    pub use wireprims_frame::*;
}

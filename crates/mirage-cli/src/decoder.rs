//! Stand-in [`Decoder`] for a demo with no real HEVC hardware session.
//!
//! The hardware decoder is an external collaborator the core specifies a
//! contract for but never implements (§4.6 "Contract toward the decoder
//! (C0, external)"). This crate has no such hardware to drive, so
//! [`NullDecoder`] accepts every frame without decoding it, letting the
//! rest of the stack (reassembly, decode queue, resize/freeze state) run
//! for real while the pixel path is a no-op.

use mirage_core::{error::CoreError, Decoder};
use mirage_proto::header::ContentRect;

/// A [`Decoder`] that accepts every frame without producing pixels.
#[derive(Debug, Default)]
pub struct NullDecoder {
    frames_submitted: u64,
}

impl NullDecoder {
    /// Number of frames submitted so far, for diagnostics.
    #[must_use]
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }
}

impl Decoder for NullDecoder {
    fn start_decoding(&mut self) {}

    fn decode_frame(
        &mut self,
        _bytes: &[u8],
        _presentation_time_ns: u64,
        _is_keyframe: bool,
        _content_rect: ContentRect,
    ) -> Result<(), CoreError> {
        self.frames_submitted += 1;
        Ok(())
    }

    fn reset_for_new_session(&mut self) {
        self.frames_submitted = 0;
    }

    fn dimension_changed(&self) -> Option<(u32, u32)> {
        None
    }
}

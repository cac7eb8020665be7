//! Multi-frame GIF decode engine.
//!
//! Supports GIF87a and GIF89a streams with animation metadata.
//!
//! ## Features
//!
//! - Streaming, record-oriented pull parser with incremental LZW
//! - Interlaced image reconstruction
//! - Transparency and disposal metadata with GIF89a carry-over semantics
//! - Bounded frame storage with cyclic playback
//!
//! The decoder fills an [`fbview_core::FrameStore`] that the presentation
//! layer reads through deep copies; see [`GifDecoder`] for the entry points.

mod decoder;
mod reader;

pub use decoder::{GifDecoder, LoadedGif};
pub use reader::{Extension, GifReader, ImageDescriptor, RecordType, ScreenDescriptor};

use fbview_core::{Error, Result};

/// GIF87a file signature.
pub const GIF87A_SIGNATURE: &[u8; 6] = b"GIF87a";
/// GIF89a file signature.
pub const GIF89A_SIGNATURE: &[u8; 6] = b"GIF89a";

/// Extension introducer byte.
pub const EXTENSION_INTRODUCER: u8 = 0x21;
/// Image separator byte.
pub const IMAGE_SEPARATOR: u8 = 0x2C;
/// File trailer byte.
pub const TRAILER: u8 = 0x3B;

/// Graphic control extension label.
pub const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
/// Comment extension label.
pub const COMMENT_LABEL: u8 = 0xFE;
/// Application extension label.
pub const APPLICATION_LABEL: u8 = 0xFF;
/// Plain text extension label.
pub const PLAIN_TEXT_LABEL: u8 = 0x01;

/// LZW minimum code size validation.
const MIN_LZW_CODE_SIZE: u8 = 2;
const MAX_LZW_CODE_SIZE: u8 = 11;

/// Interlace pass layout: `(start_row, row_stride)` for each of the four
/// passes.
pub const INTERLACE_PASSES: [(u32, u32); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Animation metadata carried by a graphic control extension (label 0xF9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicControl {
    /// Disposal method (0..=7), passed through unmodeled.
    pub disposal: u8,
    /// User-input flag.
    pub user_input: bool,
    /// Transparent color index, when the transparency bit is set.
    pub transparent: Option<u8>,
    /// Frame delay in centiseconds, little-endian in the stream.
    pub delay_cs: u16,
}

impl GraphicControl {
    /// Parse the 4-byte graphic control payload.
    ///
    /// Layout: byte 0 holds the bitflags (bit 0 transparency enabled,
    /// bit 1 user input, bits 2-4 disposal method), bytes 1-2 the delay in
    /// hundredths of a second (little-endian), byte 3 the transparent
    /// color index.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::format(format!(
                "graphic control extension too short: {} bytes",
                data.len()
            )));
        }
        let flags = data[0];
        Ok(Self {
            disposal: (flags >> 2) & 0x07,
            user_input: (flags & 0x02) != 0,
            transparent: if (flags & 0x01) != 0 {
                Some(data[3])
            } else {
                None
            },
            delay_cs: u16::from_le_bytes([data[1], data[2]]),
        })
    }
}

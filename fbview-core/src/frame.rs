//! Decoded frame and frame store abstractions.
//!
//! A [`FrameStore`] is the sole long-lived owner of the frames decoded from
//! an animated source. It is populated once by a decoder and afterwards only
//! read through deep copies, so the presentation layer can mutate its working
//! buffers freely without ever touching stored animation data.

use crate::error::{Error, Result};

/// Maximum number of frames kept per animated source.
pub const MAX_FRAMES: usize = 64;

/// Allocate a zeroed pixel buffer, reporting allocation failure as an error
/// instead of aborting.
pub fn alloc_buffer(len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Memory { needed: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// One fully decoded still image extracted from an animated stream.
///
/// `rgb` is sized to the caller's bounding box, with rows packed at the
/// frame's own width (stride `width * 3`). `alpha`, when present, mirrors
/// that layout at one byte per pixel.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Packed RGB pixel data.
    pub rgb: Vec<u8>,
    /// Optional alpha plane (0 = transparent, 255 = opaque).
    pub alpha: Option<Vec<u8>>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame delay in centiseconds (1/100th second).
    pub delay_cs: u16,
    /// Raw disposal method (0..=7), stored and passed through.
    pub disposal: u8,
    /// Whether the stream asked to wait for user input on this frame.
    pub user_input: bool,
}

/// An independent deep copy of a stored frame, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCopy {
    /// Packed RGB pixel data.
    pub rgb: Vec<u8>,
    /// Optional alpha plane.
    pub alpha: Option<Vec<u8>>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

/// Bounded, append-only collection of decoded frames with a cyclic playback
/// cursor.
///
/// Invariants: `0 <= len <= MAX_FRAMES`; once the store is non-empty the
/// cursor stays in `[0, len)` and advancing wraps modulo `len`.
#[derive(Debug, Default)]
pub struct FrameStore {
    frames: Vec<Frame>,
    index: usize,
}

impl FrameStore {
    /// Create an empty frame store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame, rejecting it once the store is at capacity.
    ///
    /// Returns `true` when the frame was stored.
    pub fn push(&mut self, frame: Frame) -> bool {
        if self.frames.len() >= MAX_FRAMES {
            return false;
        }
        self.frames.push(frame);
        true
    }

    /// Number of stored frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check whether the store holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Check whether the store is at capacity.
    pub fn is_full(&self) -> bool {
        self.frames.len() >= MAX_FRAMES
    }

    /// Whether the source has more than one frame to cycle through.
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// Current cursor position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The frame the cursor currently points at.
    pub fn current(&self) -> Option<&Frame> {
        self.frames.get(self.index)
    }

    /// Display delay of the current frame in milliseconds.
    pub fn current_delay_ms(&self) -> u64 {
        self.current().map_or(0, |f| u64::from(f.delay_cs) * 10)
    }

    /// Advance the cursor by one, wrapping modulo the frame count, and
    /// return a fresh deep copy of the frame it lands on.
    ///
    /// A copy-out allocation failure aborts only this call; the stored
    /// frames and the cursor position are left untouched.
    pub fn next(&mut self, want_alpha: bool) -> Result<FrameCopy> {
        if self.frames.is_empty() {
            return Err(Error::format("no frames loaded"));
        }
        let next_index = (self.index + 1) % self.frames.len();
        let copy = Self::copy_out(&self.frames[next_index], want_alpha)?;
        self.index = next_index;
        Ok(copy)
    }

    /// Deep copy of the first frame without moving the cursor.
    ///
    /// This is the load-time copy-out: the first successfully decoded frame
    /// is handed to the caller as soon as the stream is loaded.
    pub fn first_copy(&self, want_alpha: bool) -> Result<FrameCopy> {
        let frame = self
            .frames
            .first()
            .ok_or_else(|| Error::format("no frames loaded"))?;
        Self::copy_out(frame, want_alpha)
    }

    /// Free all stored frames and reset the cursor.
    pub fn unload(&mut self) {
        self.frames.clear();
        self.index = 0;
    }

    fn copy_out(frame: &Frame, want_alpha: bool) -> Result<FrameCopy> {
        let mut rgb = alloc_buffer(frame.rgb.len())?;
        rgb.copy_from_slice(&frame.rgb);

        let alpha = match (&frame.alpha, want_alpha) {
            (Some(src), true) => {
                let mut dst = alloc_buffer(src.len())?;
                dst.copy_from_slice(src);
                Some(dst)
            }
            _ => None,
        };

        Ok(FrameCopy {
            rgb,
            alpha,
            width: frame.width,
            height: frame.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> Frame {
        Frame {
            rgb: vec![tag; 12],
            alpha: Some(vec![tag; 4]),
            width: 2,
            height: 2,
            delay_cs: 10,
            disposal: 0,
            user_input: false,
        }
    }

    #[test]
    fn test_empty_store() {
        let mut store = FrameStore::new();
        assert!(store.is_empty());
        assert!(!store.is_animated());
        assert!(store.next(false).is_err());
        assert!(store.first_copy(false).is_err());
        assert_eq!(store.current_delay_ms(), 0);
    }

    #[test]
    fn test_cyclic_advance() {
        let mut store = FrameStore::new();
        for tag in 0..3 {
            assert!(store.push(frame(tag)));
        }

        // Cursor starts on frame 0; three advances cycle 1, 2, 0.
        for expected in [1u8, 2, 0] {
            let copy = store.next(false).unwrap();
            assert_eq!(copy.rgb[0], expected);
        }
        assert_eq!(store.index(), 0);
    }

    #[test]
    fn test_copies_are_independent() {
        let mut store = FrameStore::new();
        store.push(frame(7));
        store.push(frame(9));

        let mut copy = store.next(true).unwrap();
        copy.rgb.fill(0);
        copy.alpha.as_mut().unwrap().fill(0);

        let again = store.first_copy(true).unwrap();
        assert_eq!(again.rgb[0], 7);
        // A second advance wraps back to the mutated copy's source frame.
        store.next(true).unwrap();
        let fresh = store.next(true).unwrap();
        assert_eq!(fresh.rgb[0], 9);
        assert_eq!(fresh.alpha.unwrap()[0], 9);
    }

    #[test]
    fn test_want_alpha_gates_copy() {
        let mut store = FrameStore::new();
        store.push(frame(1));
        store.push(frame(2));

        let copy = store.next(false).unwrap();
        assert!(copy.alpha.is_none());
        let copy = store.next(true).unwrap();
        assert!(copy.alpha.is_some());
    }

    #[test]
    fn test_capacity_clamp() {
        let mut store = FrameStore::new();
        for tag in 0..(MAX_FRAMES + 8) {
            let stored = store.push(frame(tag as u8));
            assert_eq!(stored, tag < MAX_FRAMES);
        }
        assert_eq!(store.len(), MAX_FRAMES);
        assert!(store.is_full());
    }

    #[test]
    fn test_unload() {
        let mut store = FrameStore::new();
        store.push(frame(1));
        store.next(false).unwrap();
        store.unload();
        assert!(store.is_empty());
        assert_eq!(store.index(), 0);
        assert!(store.next(false).is_err());
    }

    #[test]
    fn test_current_delay() {
        let mut store = FrameStore::new();
        let mut f = frame(1);
        f.delay_cs = 25;
        store.push(f);
        assert_eq!(store.current_delay_ms(), 250);
    }
}

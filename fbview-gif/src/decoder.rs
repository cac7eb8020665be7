//! Record-driven GIF decode engine.
//!
//! Walks the record stream, maintaining the persistent graphic-control
//! state, and fills a [`FrameStore`] with frames sized to the caller's
//! bounding box. The first successfully decoded frame is copied out to the
//! caller as soon as the load completes.

use std::io::BufRead;
use std::path::Path;

use fbview_core::{alloc_buffer, Error, Frame, FrameCopy, FrameStore, Result};
use tracing::{debug, warn};

use crate::reader::{GifReader, ImageDescriptor, RecordType};
use crate::{GraphicControl, GRAPHIC_CONTROL_LABEL, INTERLACE_PASSES};

/// Result of a successful load: the frame store plus the load-time copy of
/// the first frame.
#[derive(Debug)]
pub struct LoadedGif {
    /// Deep copy of frame 0, handed to the caller immediately.
    pub first: FrameCopy,
    /// The populated store; sole long-lived owner of the animation data.
    pub store: FrameStore,
}

/// Graphic-control state that applies to the next image descriptor.
///
/// GIF89a semantics: the state persists unchanged across descriptors until
/// a new control record arrives. The transparent index, once enabled, is
/// never cleared, and the user-input flag latches on; disposal and delay
/// are overwritten by every control record. Timing-dependent playback
/// relies on this carry-over.
#[derive(Debug, Default, Clone, Copy)]
struct ControlState {
    transparent: Option<u8>,
    user_input: bool,
    disposal: u8,
    delay_cs: u16,
}

impl ControlState {
    fn merge(&mut self, gc: GraphicControl) {
        if let Some(index) = gc.transparent {
            self.transparent = Some(index);
        }
        if gc.user_input {
            self.user_input = true;
        }
        self.disposal = gc.disposal;
        self.delay_cs = gc.delay_cs;
    }
}

/// GIF decoder configured with the caller's bounding box.
///
/// The bounding box is the maximum width/height the caller will allocate
/// for any frame of the file; every frame buffer is pre-sized to it.
#[derive(Debug, Clone, Copy)]
pub struct GifDecoder {
    bound_w: u32,
    bound_h: u32,
    want_alpha: bool,
}

impl GifDecoder {
    /// Create a decoder for the given bounding box.
    ///
    /// `want_alpha` gates alpha copy-out only; transparency metadata is
    /// always decoded and stored.
    pub fn new(bound_w: u32, bound_h: u32, want_alpha: bool) -> Self {
        Self {
            bound_w,
            bound_h,
            want_alpha,
        }
    }

    /// Check a header prefix for the GIF magic bytes.
    pub fn probe(header: &[u8]) -> bool {
        header.len() >= 3 && &header[..3] == b"GIF"
    }

    /// Declared size of the first image in the file.
    ///
    /// Partial parse: header plus the records up to the first image
    /// descriptor; no pixel data is materialized.
    pub fn dimensions(path: impl AsRef<Path>) -> Result<(u32, u32)> {
        Self::dimensions_from_reader(GifReader::open(path)?)
    }

    /// [`Self::dimensions`] over an already-open stream.
    pub fn dimensions_from<R: BufRead>(r: R) -> Result<(u32, u32)> {
        Self::dimensions_from_reader(GifReader::new(r)?)
    }

    fn dimensions_from_reader<R: BufRead>(mut reader: GifReader<R>) -> Result<(u32, u32)> {
        loop {
            match reader.next_record_type()? {
                RecordType::Image => {
                    let desc = reader.read_image_descriptor()?;
                    return Ok((u32::from(desc.width), u32::from(desc.height)));
                }
                RecordType::Extension => {
                    reader.read_extension()?;
                }
                RecordType::Trailer => {
                    return Err(Error::format("no image descriptor in stream"));
                }
            }
        }
    }

    /// Parse the whole file, fill a frame store, and copy the first frame
    /// out.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<LoadedGif> {
        self.run(GifReader::open(path)?)
    }

    /// [`Self::load_path`] over an already-open stream.
    pub fn load<R: BufRead>(&self, r: R) -> Result<LoadedGif> {
        self.run(GifReader::new(r)?)
    }

    fn run<R: BufRead>(&self, mut reader: GifReader<R>) -> Result<LoadedGif> {
        let mut store = FrameStore::new();
        let mut control = ControlState::default();

        loop {
            match reader.next_record_type()? {
                RecordType::Trailer => break,
                RecordType::Extension => {
                    let ext = reader.read_extension()?;
                    if ext.label == GRAPHIC_CONTROL_LABEL {
                        control.merge(GraphicControl::parse(&ext.data)?);
                    }
                }
                RecordType::Image => {
                    let desc = reader.read_image_descriptor()?;

                    if store.is_full() {
                        // Parse-but-discard keeps the record cursor valid.
                        debug!(
                            stored = store.len(),
                            "frame store at capacity, discarding descriptor"
                        );
                        reader.finish_image()?;
                        continue;
                    }
                    if desc.width == 0 || desc.height == 0 {
                        warn!(
                            width = desc.width,
                            height = desc.height,
                            "zero-dimension frame, skipping"
                        );
                        reader.finish_image()?;
                        continue;
                    }
                    if u32::from(desc.width) > self.bound_w
                        || u32::from(desc.height) > self.bound_h
                    {
                        warn!(
                            width = desc.width,
                            height = desc.height,
                            bound_w = self.bound_w,
                            bound_h = self.bound_h,
                            "frame exceeds bounding box, skipping"
                        );
                        reader.finish_image()?;
                        continue;
                    }

                    let frame = self.decode_frame(&mut reader, &desc, &control)?;
                    reader.finish_image()?;
                    store.push(frame);
                }
            }
        }

        if store.is_empty() {
            return Err(Error::format("no frames found"));
        }
        let first = store.first_copy(self.want_alpha)?;
        Ok(LoadedGif { first, store })
    }

    fn decode_frame<R: BufRead>(
        &self,
        reader: &mut GifReader<R>,
        desc: &ImageDescriptor,
        control: &ControlState,
    ) -> Result<Frame> {
        let palette = desc
            .local_palette
            .clone()
            .or_else(|| reader.screen().global_palette.clone())
            .ok_or_else(|| Error::format("no color table"))?;

        let width = usize::from(desc.width);
        let height = usize::from(desc.height);
        let bound_px = self.bound_w as usize * self.bound_h as usize;

        // Buffers are sized to the bounding box; rows are packed at the
        // frame's own stride.
        let mut rgb = alloc_buffer(bound_px * 3)?;
        let mut alpha = match control.transparent {
            Some(_) => Some(alloc_buffer(bound_px)?),
            None => None,
        };
        let mut line = alloc_buffer(width)?;

        let decode_row = |reader: &mut GifReader<R>,
                          line: &mut [u8],
                          rgb: &mut [u8],
                          alpha: Option<&mut Vec<u8>>,
                          row: usize|
         -> Result<()> {
            reader.read_scanline(line)?;
            expand_row(line, &palette, &mut rgb[row * width * 3..(row + 1) * width * 3])?;
            if let (Some(plane), Some(transparent)) = (alpha, control.transparent) {
                let out = &mut plane[row * width..(row + 1) * width];
                for (dst, &index) in out.iter_mut().zip(line.iter()) {
                    *dst = if index == transparent { 0x00 } else { 0xFF };
                }
            }
            Ok(())
        };

        if !desc.interlaced {
            for row in 0..height {
                decode_row(reader, &mut line, &mut rgb, alpha.as_mut(), row)?;
            }
        } else {
            for (start, step) in INTERLACE_PASSES {
                let mut row = start as usize;
                while row < height {
                    decode_row(reader, &mut line, &mut rgb, alpha.as_mut(), row)?;
                    row += step as usize;
                }
            }
        }

        Ok(Frame {
            rgb,
            alpha,
            width: desc.width.into(),
            height: desc.height.into(),
            delay_cs: control.delay_cs,
            disposal: control.disposal,
            user_input: control.user_input,
        })
    }
}

/// Expand one scanline of color indices into packed RGB through the active
/// color table.
fn expand_row(indices: &[u8], palette: &[[u8; 3]], rgb_row: &mut [u8]) -> Result<()> {
    for (out, &index) in rgb_row.chunks_exact_mut(3).zip(indices.iter()) {
        let color = palette.get(usize::from(index)).ok_or_else(|| {
            Error::format(format!("color index {index} outside table"))
        })?;
        out.copy_from_slice(color);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testgif::GifBuilder;
    use std::io::Cursor;

    fn load(bytes: Vec<u8>, bound_w: u32, bound_h: u32, want_alpha: bool) -> Result<LoadedGif> {
        GifDecoder::new(bound_w, bound_h, want_alpha).load(Cursor::new(bytes))
    }

    /// Row-major pixel value at (x, y) for a frame copy with the given
    /// frame width (rows packed at the frame's own stride).
    fn px(copy: &FrameCopy, width: usize, x: usize, y: usize) -> [u8; 3] {
        let at = (y * width + x) * 3;
        [copy.rgb[at], copy.rgb[at + 1], copy.rgb[at + 2]]
    }

    #[test]
    fn test_single_frame_load() {
        let bytes = GifBuilder::new(2, 2).image(2, 2, &[1, 2, 3, 4]).finish();
        let loaded = load(bytes, 2, 2, false).unwrap();

        assert_eq!(loaded.store.len(), 1);
        assert!(!loaded.store.is_animated());
        assert_eq!(loaded.first.rgb.len(), 2 * 2 * 3);
        assert_eq!(px(&loaded.first, 2, 0, 0), [1, 1, 1]);
        assert_eq!(px(&loaded.first, 2, 1, 1), [4, 4, 4]);
        assert!(loaded.first.alpha.is_none());
    }

    #[test]
    fn test_three_frame_scenario() {
        // Three frames with delays 10, 20, 30 centiseconds and no
        // transparency: load returns frame 0 immediately, then successive
        // advances return frames 1, 2, 0 as independent deep copies.
        let bytes = GifBuilder::new(2, 1)
            .graphic_control(0, false, None, 10)
            .image(2, 1, &[10, 10])
            .graphic_control(0, false, None, 20)
            .image(2, 1, &[20, 20])
            .graphic_control(0, false, None, 30)
            .image(2, 1, &[30, 30])
            .finish();
        let loaded = load(bytes, 2, 1, false).unwrap();
        let mut store = loaded.store;

        assert_eq!(store.len(), 3);
        assert_eq!(loaded.first.rgb[0], 10);
        assert_eq!(store.current_delay_ms(), 100);

        let mut seen = Vec::new();
        for _ in 0..3 {
            let mut copy = store.next(false).unwrap();
            seen.push((copy.rgb[0], store.current_delay_ms()));
            copy.rgb.fill(0); // must not affect the store
        }
        assert_eq!(seen, vec![(20, 200), (30, 300), (10, 100)]);

        let again = store.next(false).unwrap();
        assert_eq!(again.rgb[0], 20);
    }

    #[test]
    fn test_control_carry_over() {
        // One control record, three descriptors: delay, disposal and
        // user-input apply to every following frame until a new control
        // record arrives.
        let bytes = GifBuilder::new(1, 1)
            .graphic_control(2, true, None, 7)
            .image(1, 1, &[1])
            .image(1, 1, &[2])
            .graphic_control(1, false, None, 9)
            .image(1, 1, &[3])
            .finish();
        let loaded = load(bytes, 1, 1, false).unwrap();
        let mut store = loaded.store;

        let delays: Vec<u64> = (0..3)
            .map(|_| {
                store.next(false).unwrap();
                store.current_delay_ms()
            })
            .collect();
        // Cursor order after load is 1, 2, 0.
        assert_eq!(delays, vec![70, 90, 70]);

        store.next(false).unwrap(); // frame 1
        let frame = store.current().unwrap();
        assert_eq!(frame.disposal, 2);
        assert!(frame.user_input);
        store.next(false).unwrap(); // frame 2
        let frame = store.current().unwrap();
        assert_eq!(frame.disposal, 1);
        // The user-input flag latches on once set.
        assert!(frame.user_input);
    }

    #[test]
    fn test_alpha_synthesis() {
        let bytes = GifBuilder::new(2, 2)
            .graphic_control(0, false, Some(3), 0)
            .image(2, 2, &[3, 1, 3, 2])
            .finish();
        let loaded = load(bytes, 2, 2, true).unwrap();

        let alpha = loaded.first.alpha.as_ref().unwrap();
        assert_eq!(&alpha[..4], &[0x00, 0xFF, 0x00, 0xFF]);
    }

    #[test]
    fn test_alpha_absent_without_control() {
        let bytes = GifBuilder::new(2, 1).image(2, 1, &[0, 1]).finish();
        let loaded = load(bytes, 2, 1, true).unwrap();
        assert!(loaded.first.alpha.is_none());
    }

    #[test]
    fn test_alpha_stored_even_when_not_requested() {
        let bytes = GifBuilder::new(1, 1)
            .graphic_control(0, false, Some(0), 0)
            .image(1, 1, &[0])
            .image(1, 1, &[1])
            .finish();
        let loaded = load(bytes, 1, 1, false).unwrap();
        let mut store = loaded.store;

        // The load-time copy honored want_alpha = false...
        assert!(loaded.first.alpha.is_none());
        // ...but the stored plane exists and can be copied out later.
        let copy = store.next(true).unwrap();
        assert_eq!(copy.alpha.unwrap(), vec![0xFF]);
    }

    #[test]
    fn test_interlaced_matches_sequential() {
        // 2x8 logical image where row r is filled with value r.
        let width = 2usize;
        let height = 8usize;
        let mut sequential = Vec::new();
        for row in 0..height {
            sequential.extend(std::iter::repeat(row as u8).take(width));
        }
        // Transmission order for the four passes: rows 0, 4, 2, 6, 1, 3, 5, 7.
        let mut interlaced = Vec::new();
        for row in [0u8, 4, 2, 6, 1, 3, 5, 7] {
            interlaced.extend(std::iter::repeat(row).take(width));
        }

        let plain = GifBuilder::new(2, 8).image(2, 8, &sequential).finish();
        let woven = GifBuilder::new(2, 8)
            .image_at(0, 0, 2, 8, true, &interlaced)
            .finish();

        let a = load(plain, 2, 8, false).unwrap();
        let b = load(woven, 2, 8, false).unwrap();
        assert_eq!(a.first.rgb, b.first.rgb);
    }

    #[test]
    fn test_oversized_frame_skipped() {
        // Second frame declares 4x1 against a 2x1 bounding box; it must be
        // skipped without aborting the rest of the stream.
        let bytes = GifBuilder::new(2, 1)
            .image(2, 1, &[1, 1])
            .image(4, 1, &[9, 9, 9, 9])
            .image(2, 1, &[2, 2])
            .finish();
        let loaded = load(bytes, 2, 1, false).unwrap();

        assert_eq!(loaded.store.len(), 2);
        let mut store = loaded.store;
        assert_eq!(store.next(false).unwrap().rgb[0], 2);
        assert_eq!(store.next(false).unwrap().rgb[0], 1);
    }

    #[test]
    fn test_zero_dimension_frame_skipped() {
        let bytes = GifBuilder::new(2, 1)
            .image(0, 1, &[])
            .image(2, 1, &[1, 1])
            .finish();
        let loaded = load(bytes, 2, 1, false).unwrap();

        assert_eq!(loaded.store.len(), 1);
        assert_eq!(loaded.first.rgb[0], 1);
    }

    #[test]
    fn test_only_zero_dimension_frames_is_format_error() {
        let bytes = GifBuilder::new(1, 1).image(1, 0, &[]).finish();
        let err = load(bytes, 1, 1, false).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_capacity_clamp() {
        let mut builder = GifBuilder::new(1, 1);
        for i in 0..70u8 {
            builder = builder.image(1, 1, &[i % 100]);
        }
        let loaded = load(builder.finish(), 1, 1, false).unwrap();

        assert_eq!(loaded.store.len(), fbview_core::MAX_FRAMES);
        // Cyclic playback length is exactly the capacity.
        let mut store = loaded.store;
        for _ in 0..fbview_core::MAX_FRAMES {
            store.next(false).unwrap();
        }
        assert_eq!(store.index(), 0);
    }

    #[test]
    fn test_dimensions_partial_parse() {
        let bytes = GifBuilder::new(11, 13)
            .graphic_control(0, false, None, 1)
            .image(6, 5, &[0; 30])
            .finish();
        let (w, h) = GifDecoder::dimensions_from(Cursor::new(bytes)).unwrap();
        assert_eq!((w, h), (6, 5));
    }

    #[test]
    fn test_dimensions_without_image() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"GIF89a");
        bytes.extend_from_slice(&[1, 0, 1, 0, 0x00, 0, 0]); // no global table
        bytes.push(0x3B);
        let err = GifDecoder::dimensions_from(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_empty_stream_is_format_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"GIF89a");
        bytes.extend_from_slice(&[1, 0, 1, 0, 0x00, 0, 0]);
        bytes.push(0x3B);
        let err = load(bytes, 1, 1, false).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_truncated_stream_aborts_load() {
        let mut bytes = GifBuilder::new(2, 2)
            .image(2, 2, &[0, 1, 2, 3])
            .image(2, 2, &[4, 5, 6, 7])
            .finish();
        bytes.truncate(bytes.len() - 20);
        let err = load(bytes, 2, 2, false).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_buffers_sized_to_bounding_box() {
        let bytes = GifBuilder::new(2, 2)
            .graphic_control(0, false, Some(0), 0)
            .image(2, 2, &[0, 1, 2, 3])
            .finish();
        let loaded = load(bytes, 5, 4, true).unwrap();

        assert_eq!(loaded.first.rgb.len(), 5 * 4 * 3);
        assert_eq!(loaded.first.alpha.unwrap().len(), 5 * 4);
        assert_eq!(loaded.first.width, 2);
        assert_eq!(loaded.first.height, 2);
    }
}

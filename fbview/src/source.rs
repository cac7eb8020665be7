//! Format identification and dispatch over pluggable image sources.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use fbview_core::{Error, FrameStore, Result};
use fbview_gif::GifDecoder;
use tracing::debug;

/// A fully decoded image, plus its animation when the format carries one.
#[derive(Debug)]
pub struct LoadedImage {
    /// Width of the first frame in pixels.
    pub width: u32,
    /// Height of the first frame in pixels.
    pub height: u32,
    /// Packed RGB pixels of the first frame, 3 bytes/pixel.
    pub rgb: Vec<u8>,
    /// Alpha plane of the first frame, 1 byte/pixel, when requested and
    /// present in the file.
    pub alpha: Option<Vec<u8>>,
    /// Remaining frames for animated formats. `None` for still formats;
    /// a single-frame store still counts as non-animated playback.
    pub animation: Option<FrameStore>,
}

/// A decoder for one image format.
pub trait ImageSource {
    /// Read the image dimensions without decoding pixel data.
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)>;

    /// Decode the file into buffers sized `bound_w` x `bound_h`.
    fn load(
        &self,
        path: &Path,
        want_alpha: bool,
        bound_w: u32,
        bound_h: u32,
    ) -> Result<LoadedImage>;
}

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// CompuServe GIF, 87a or 89a.
    Gif,
}

/// Identify the format of a file by its magic bytes.
///
/// Returns `None` when no known decoder claims the file.
pub fn identify(path: &Path) -> Result<Option<SourceFormat>> {
    let mut header = [0u8; 8];
    let mut file = File::open(path).map_err(|e| Error::file(e.to_string()))?;
    let n = file
        .read(&mut header)
        .map_err(|e| Error::file(e.to_string()))?;
    if GifDecoder::probe(&header[..n]) {
        return Ok(Some(SourceFormat::Gif));
    }
    Ok(None)
}

/// The decoder for a given format.
pub fn source_for(format: SourceFormat) -> Box<dyn ImageSource> {
    match format {
        SourceFormat::Gif => Box::new(GifSource),
    }
}

/// Identify and fully decode one file.
///
/// The decode bounding box is the image's own reported size, so buffers
/// come out exactly first-frame sized.
pub fn open_image(path: &Path, want_alpha: bool) -> Result<LoadedImage> {
    let format = identify(path)?
        .ok_or_else(|| Error::file(format!("{}: unknown image format", path.display())))?;
    debug!(path = %path.display(), ?format, "opening image");
    let source = source_for(format);
    let (width, height) = source.dimensions(path)?;
    source.load(path, want_alpha, width, height)
}

struct GifSource;

impl ImageSource for GifSource {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        GifDecoder::dimensions(path)
    }

    fn load(
        &self,
        path: &Path,
        want_alpha: bool,
        bound_w: u32,
        bound_h: u32,
    ) -> Result<LoadedImage> {
        let loaded = GifDecoder::new(bound_w, bound_h, want_alpha).load_path(path)?;
        Ok(LoadedImage {
            width: loaded.first.width,
            height: loaded.first.height,
            rgb: loaded.first.rgb,
            alpha: loaded.first.alpha,
            animation: Some(loaded.store),
        })
    }
}

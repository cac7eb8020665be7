//! Record-oriented GIF pull parser.
//!
//! [`GifReader`] exposes the stream as a sequence of records: the caller
//! asks for the next record type, then reads an image descriptor plus its
//! scanlines, or an extension block. Image data is decompressed through a
//! streaming LZW decoder that consumes sub-blocks incrementally, so the
//! record cursor stays valid whether the caller materializes the pixels or
//! drains them with [`GifReader::finish_image`].

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use fbview_core::{Error, Result};

use crate::{
    EXTENSION_INTRODUCER, GIF87A_SIGNATURE, GIF89A_SIGNATURE, IMAGE_SEPARATOR,
    MAX_LZW_CODE_SIZE, MIN_LZW_CODE_SIZE, TRAILER,
};

/// Maximum LZW table size (12-bit codes).
const LZW_TABLE_LIMIT: usize = 4096;

/// GIF logical screen descriptor plus the global color table.
#[derive(Debug, Clone)]
pub struct ScreenDescriptor {
    /// Canvas width.
    pub width: u16,
    /// Canvas height.
    pub height: u16,
    /// Background color index.
    pub background: u8,
    /// Pixel aspect ratio byte.
    pub aspect_ratio: u8,
    /// Global color table, if present.
    pub global_palette: Option<Vec<[u8; 3]>>,
}

/// Record kinds a GIF stream is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// Image descriptor record (0x2C).
    Image,
    /// Extension record (0x21).
    Extension,
    /// Stream trailer (0x3B).
    Trailer,
}

/// Per-image descriptor record.
#[derive(Debug, Clone)]
pub struct ImageDescriptor {
    /// Left placement on the logical screen.
    pub left: u16,
    /// Top placement on the logical screen.
    pub top: u16,
    /// Image width.
    pub width: u16,
    /// Image height.
    pub height: u16,
    /// Whether scanlines arrive in four-pass interlaced order.
    pub interlaced: bool,
    /// Local color table, if present.
    pub local_palette: Option<Vec<[u8; 3]>>,
}

/// An extension record: label plus the first sub-block payload.
#[derive(Debug, Clone)]
pub struct Extension {
    /// Extension label byte.
    pub label: u8,
    /// First sub-block data (continuation blocks are drained).
    pub data: Vec<u8>,
}

/// Streaming LZW decoder state for the image currently being read.
#[derive(Debug)]
struct Lzw {
    min_code_size: u8,
    code_size: u8,
    clear_code: u16,
    eoi_code: u16,
    table: Vec<Vec<u8>>,
    prev: Option<u16>,
    bit_buf: u32,
    bit_count: u8,
    block_remaining: u8,
    blocks_done: bool,
    finished: bool,
    pending: Vec<u8>,
    pending_pos: usize,
}

impl Lzw {
    fn new(min_code_size: u8) -> Self {
        let clear_code = 1u16 << min_code_size;
        let mut lzw = Self {
            min_code_size,
            code_size: min_code_size + 1,
            clear_code,
            eoi_code: clear_code + 1,
            table: Vec::with_capacity(LZW_TABLE_LIMIT),
            prev: None,
            bit_buf: 0,
            bit_count: 0,
            block_remaining: 0,
            blocks_done: false,
            finished: false,
            pending: Vec::new(),
            pending_pos: 0,
        };
        lzw.reset_table();
        lzw
    }

    fn reset_table(&mut self) {
        self.table.clear();
        for i in 0..=self.eoi_code {
            if i < self.clear_code {
                self.table.push(vec![i as u8]);
            } else {
                self.table.push(Vec::new());
            }
        }
        self.code_size = self.min_code_size + 1;
        self.prev = None;
    }
}

/// Pull parser over a GIF byte stream.
#[derive(Debug)]
pub struct GifReader<R> {
    r: R,
    screen: ScreenDescriptor,
    lzw: Option<Lzw>,
}

impl GifReader<BufReader<File>> {
    /// Open a GIF file and validate its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::file(format!("{}: {e}", path.display())))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: BufRead> GifReader<R> {
    /// Wrap an in-memory or already-open stream, validating the signature
    /// and reading the logical screen descriptor.
    pub fn new(mut r: R) -> Result<Self> {
        let mut signature = [0u8; 6];
        r.read_exact(&mut signature)
            .map_err(|e| Error::file(format!("cannot identify stream: {e}")))?;
        if &signature != GIF87A_SIGNATURE && &signature != GIF89A_SIGNATURE {
            return Err(Error::file("not a GIF stream"));
        }

        let width = r.read_u16::<LittleEndian>().map_err(stream_err)?;
        let height = r.read_u16::<LittleEndian>().map_err(stream_err)?;
        let flags = r.read_u8().map_err(stream_err)?;
        let background = r.read_u8().map_err(stream_err)?;
        let aspect_ratio = r.read_u8().map_err(stream_err)?;

        let global_palette = if flags & 0x80 != 0 {
            Some(read_palette(&mut r, flags & 0x07)?)
        } else {
            None
        };

        Ok(Self {
            r,
            screen: ScreenDescriptor {
                width,
                height,
                background,
                aspect_ratio,
                global_palette,
            },
            lzw: None,
        })
    }

    /// The logical screen descriptor parsed from the header.
    pub fn screen(&self) -> &ScreenDescriptor {
        &self.screen
    }

    /// Read the introducer of the next record.
    pub fn next_record_type(&mut self) -> Result<RecordType> {
        match self.r.read_u8().map_err(stream_err)? {
            IMAGE_SEPARATOR => Ok(RecordType::Image),
            EXTENSION_INTRODUCER => Ok(RecordType::Extension),
            TRAILER => Ok(RecordType::Trailer),
            byte => Err(Error::format(format!(
                "unknown record introducer 0x{byte:02X}"
            ))),
        }
    }

    /// Read an image descriptor record and arm the LZW decoder for its
    /// pixel data.
    pub fn read_image_descriptor(&mut self) -> Result<ImageDescriptor> {
        let left = self.r.read_u16::<LittleEndian>().map_err(stream_err)?;
        let top = self.r.read_u16::<LittleEndian>().map_err(stream_err)?;
        let width = self.r.read_u16::<LittleEndian>().map_err(stream_err)?;
        let height = self.r.read_u16::<LittleEndian>().map_err(stream_err)?;
        let flags = self.r.read_u8().map_err(stream_err)?;

        let local_palette = if flags & 0x80 != 0 {
            Some(read_palette(&mut self.r, flags & 0x07)?)
        } else {
            None
        };

        let min_code_size = self.r.read_u8().map_err(stream_err)?;
        if !(MIN_LZW_CODE_SIZE..=MAX_LZW_CODE_SIZE).contains(&min_code_size) {
            return Err(Error::format(format!(
                "invalid LZW minimum code size: {min_code_size}"
            )));
        }
        self.lzw = Some(Lzw::new(min_code_size));

        Ok(ImageDescriptor {
            left,
            top,
            width,
            height,
            interlaced: flags & 0x40 != 0,
            local_palette,
        })
    }

    /// Decode the next scanline's worth of color indices into `row`.
    pub fn read_scanline(&mut self, row: &mut [u8]) -> Result<()> {
        let lzw = self
            .lzw
            .as_mut()
            .ok_or_else(|| Error::format("no image data armed"))?;

        let mut filled = 0;
        while filled < row.len() {
            if lzw.pending_pos < lzw.pending.len() {
                let n = (row.len() - filled).min(lzw.pending.len() - lzw.pending_pos);
                row[filled..filled + n]
                    .copy_from_slice(&lzw.pending[lzw.pending_pos..lzw.pending_pos + n]);
                lzw.pending_pos += n;
                filled += n;
                if lzw.pending_pos == lzw.pending.len() {
                    lzw.pending.clear();
                    lzw.pending_pos = 0;
                }
                continue;
            }
            if !pump(&mut self.r, lzw)? {
                return Err(Error::format("truncated image data"));
            }
        }
        Ok(())
    }

    /// Drain whatever remains of the current image's data sub-blocks so the
    /// record cursor lands on the next record.
    ///
    /// Used both after a fully decoded image (to consume the EOI padding
    /// and block terminator) and on the parse-but-discard paths.
    pub fn finish_image(&mut self) -> Result<()> {
        if let Some(lzw) = self.lzw.take() {
            if !lzw.blocks_done {
                skip_bytes(&mut self.r, u64::from(lzw.block_remaining))?;
                skip_sub_blocks(&mut self.r)?;
            }
        }
        Ok(())
    }

    /// Read an extension record: the label and its first sub-block payload.
    /// Continuation sub-blocks are drained.
    pub fn read_extension(&mut self) -> Result<Extension> {
        let label = self.r.read_u8().map_err(stream_err)?;
        let size = self.r.read_u8().map_err(stream_err)?;
        let mut data = vec![0u8; size as usize];
        self.r.read_exact(&mut data).map_err(stream_err)?;
        if size != 0 {
            skip_sub_blocks(&mut self.r)?;
        }
        Ok(Extension { label, data })
    }
}

/// Map a mid-stream I/O failure to a format error: a truncated record
/// stream is a structure error, not a file-access one.
fn stream_err(e: io::Error) -> Error {
    Error::format(format!("unexpected end of stream: {e}"))
}

fn read_palette<R: BufRead>(r: &mut R, size_field: u8) -> Result<Vec<[u8; 3]>> {
    let entries = 1usize << (size_field + 1);
    let mut raw = vec![0u8; entries * 3];
    r.read_exact(&mut raw).map_err(stream_err)?;
    Ok(raw.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

fn skip_bytes<R: BufRead>(r: &mut R, n: u64) -> Result<()> {
    let copied = io::copy(&mut r.take(n), &mut io::sink()).map_err(stream_err)?;
    if copied != n {
        return Err(Error::format("unexpected end of stream"));
    }
    Ok(())
}

/// Skip data sub-blocks up to and including the zero-length terminator.
fn skip_sub_blocks<R: BufRead>(r: &mut R) -> Result<()> {
    loop {
        let size = r.read_u8().map_err(stream_err)?;
        if size == 0 {
            return Ok(());
        }
        skip_bytes(r, u64::from(size))?;
    }
}

/// Fetch the next data byte from the image sub-block chain, crossing block
/// boundaries as needed. `None` once the terminator has been consumed.
fn next_data_byte<R: BufRead>(r: &mut R, lzw: &mut Lzw) -> Result<Option<u8>> {
    if lzw.blocks_done {
        return Ok(None);
    }
    if lzw.block_remaining == 0 {
        let size = r.read_u8().map_err(stream_err)?;
        if size == 0 {
            lzw.blocks_done = true;
            return Ok(None);
        }
        lzw.block_remaining = size;
    }
    lzw.block_remaining -= 1;
    Ok(Some(r.read_u8().map_err(stream_err)?))
}

/// Decode one LZW code, appending its expansion to the pending buffer.
///
/// Returns `false` when the code stream is exhausted (EOI or end of data).
fn pump<R: BufRead>(r: &mut R, lzw: &mut Lzw) -> Result<bool> {
    if lzw.finished {
        return Ok(false);
    }
    loop {
        while lzw.bit_count < lzw.code_size {
            match next_data_byte(r, lzw)? {
                Some(byte) => {
                    lzw.bit_buf |= u32::from(byte) << lzw.bit_count;
                    lzw.bit_count += 8;
                }
                None => return Ok(false),
            }
        }

        let mask = (1u32 << lzw.code_size) - 1;
        let code = (lzw.bit_buf & mask) as u16;
        lzw.bit_buf >>= lzw.code_size;
        lzw.bit_count -= lzw.code_size;

        if code == lzw.clear_code {
            lzw.reset_table();
            continue;
        }
        if code == lzw.eoi_code {
            lzw.finished = true;
            return Ok(false);
        }

        let entry = if (code as usize) < lzw.table.len() {
            lzw.table[code as usize].clone()
        } else if code as usize == lzw.table.len() {
            // KwKwK: the code being defined by this very step.
            match lzw.prev {
                Some(prev) => {
                    let mut entry = lzw.table[prev as usize].clone();
                    entry.push(entry[0]);
                    entry
                }
                None => return Err(Error::format("invalid LZW code")),
            }
        } else {
            return Err(Error::format(format!(
                "LZW code {} out of range (table size {})",
                code,
                lzw.table.len()
            )));
        };

        if let Some(prev) = lzw.prev {
            if lzw.table.len() < LZW_TABLE_LIMIT {
                let mut new_entry = lzw.table[prev as usize].clone();
                new_entry.push(entry[0]);
                lzw.table.push(new_entry);
                if lzw.table.len() == (1usize << lzw.code_size) && lzw.code_size < 12 {
                    lzw.code_size += 1;
                }
            }
        }

        lzw.prev = Some(code);
        lzw.pending.extend_from_slice(&entry);
        return Ok(true);
    }
}

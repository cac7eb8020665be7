//! Collaborator contracts consumed by the presentation loop.
//!
//! The geometric transform kernels, the physical blit routine and the
//! wall clock all live outside this crate; the loop only sees these
//! traits.

use std::time::{Duration, Instant};

/// Pure geometric buffer transforms.
///
/// All methods allocate and return a new buffer; the input is never
/// modified. RGB buffers are packed 3 bytes/pixel, alpha planes 1
/// byte/pixel.
pub trait Transforms {
    /// Rotate by `turns` clockwise quarter-turns (1..=3). Width and height
    /// swap on odd turn counts.
    fn rotate(&self, rgb: &[u8], width: u32, height: u32, turns: u8) -> Vec<u8>;

    /// Alpha-plane variant of [`Transforms::rotate`].
    fn alpha_rotate(&self, plane: &[u8], width: u32, height: u32, turns: u8) -> Vec<u8>;

    /// Nearest-neighbor resize.
    fn resize(&self, rgb: &[u8], width: u32, height: u32, new_w: u32, new_h: u32) -> Vec<u8>;

    /// Box-filter (color averaging) resize.
    fn color_average_resize(
        &self,
        rgb: &[u8],
        width: u32,
        height: u32,
        new_w: u32,
        new_h: u32,
    ) -> Vec<u8>;

    /// Alpha-plane variant of [`Transforms::resize`].
    fn alpha_resize(&self, plane: &[u8], width: u32, height: u32, new_w: u32, new_h: u32)
        -> Vec<u8>;
}

/// The physical display surface.
pub trait Screen {
    /// Current screen resolution, queried once per displayed file.
    fn resolution(&self) -> (u32, u32);

    /// Render the image to the physical surface.
    ///
    /// `x_pan`/`y_pan` select the visible window of oversized content;
    /// `x_off`/`y_off` are the letterboxing offsets for undersized
    /// content. `saved` is the caller-owned backing store the blit routine
    /// may allocate or update for alpha compositing; `new_image` signals
    /// the start of a new image generation.
    #[allow(clippy::too_many_arguments)]
    fn display(
        &mut self,
        rgb: &[u8],
        alpha: Option<&[u8]>,
        width: u32,
        height: u32,
        x_pan: u32,
        y_pan: u32,
        x_off: u32,
        y_off: u32,
        saved: &mut Option<Vec<u8>>,
        new_image: bool,
    );
}

/// Monotonic time source for playback timing.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::default();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}

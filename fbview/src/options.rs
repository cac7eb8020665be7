//! Viewer configuration.

use crate::transform::StretchMode;
use std::time::Duration;

/// Options for a [`crate::Player`], populated by the surrounding CLI layer.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    /// Request alpha planes from the decoders and composite with them.
    pub use_alpha: bool,
    /// Initial fit-to-screen mode.
    pub stretch: StretchMode,
    /// Initially enlarge images smaller than the screen.
    pub enlarge: bool,
    /// Ignore the image aspect while resizing.
    pub ignore_aspect: bool,
    /// Slideshow delay in tenths of a second; 0 disables the slideshow.
    pub slideshow_delay: u32,
    /// Pan step divisor: each pan key moves `dimension / pan_stepping`.
    pub pan_stepping: u32,
    /// Bounded input wait per loop iteration.
    pub poll_timeout: Duration,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            use_alpha: false,
            stretch: StretchMode::Off,
            enlarge: false,
            ignore_aspect: false,
            slideshow_delay: 0,
            pan_stepping: 20,
            poll_timeout: Duration::from_millis(1),
        }
    }
}

//! Interactive presentation loop.
//!
//! One [`Player::present`] call owns the screen for one file: it applies
//! the transform pipeline, displays, then alternates between bounded input
//! polls and timer checks (slideshow first, then animation) until a key
//! decides the verdict. Single-threaded throughout.

use std::time::Duration;

use fbview_core::Result;
use tracing::debug;

use crate::options::PlayerOptions;
use crate::screen::{Clock, Screen, Transforms};
use crate::source::LoadedImage;
use crate::state::ImageState;
use crate::transform::{self, TransformState};

/// Decoded input event delivered by the surrounding terminal layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Stop the viewer.
    Quit,
    /// Advance to the next file.
    Next,
    /// Go back to the previous file.
    Previous,
    /// Redisplay the current buffers.
    Redraw,
    /// Pan the visible window left.
    PanLeft,
    /// Pan the visible window right.
    PanRight,
    /// Pan the visible window up.
    PanUp,
    /// Pan the visible window down.
    PanDown,
    /// Toggle fit-to-screen.
    ToggleFit,
    /// Toggle the fit resize quality.
    ToggleQuality,
    /// Toggle enlarging of undersized images.
    ToggleEnlarge,
    /// Toggle aspect-preserving scaling.
    ToggleAspect,
    /// Drop all scaling transforms.
    ResetTransforms,
    /// Rotate a quarter-turn counterclockwise.
    RotateLeft,
    /// Rotate a quarter-turn clockwise.
    RotateRight,
}

/// How a presentation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Advance to the next file.
    Next,
    /// Go back to the previous file.
    Previous,
    /// Stop the viewer.
    Quit,
}

impl Verdict {
    /// Signed step through the file list: 1, -1, or 0 for quit.
    pub fn step(&self) -> isize {
        match self {
            Verdict::Next => 1,
            Verdict::Previous => -1,
            Verdict::Quit => 0,
        }
    }
}

/// Source of decoded key events.
pub trait InputSource {
    /// Wait up to `timeout` for a key. `None` on timeout.
    fn poll(&mut self, timeout: Duration) -> Option<Key>;
}

/// The presentation loop and its per-session state.
///
/// Holds the transform toggles across files, so rotation and fit settings
/// carry over from one [`Player::present`] call to the next.
pub struct Player<'a> {
    options: PlayerOptions,
    transform: TransformState,
    screen: &'a mut dyn Screen,
    transforms: &'a dyn Transforms,
    input: &'a mut dyn InputSource,
    clock: &'a dyn Clock,
}

impl<'a> Player<'a> {
    /// Create a player; initial transform toggles come from the options.
    pub fn new(
        options: PlayerOptions,
        screen: &'a mut dyn Screen,
        transforms: &'a dyn Transforms,
        input: &'a mut dyn InputSource,
        clock: &'a dyn Clock,
    ) -> Self {
        let transform = TransformState {
            stretch: options.stretch,
            enlarge: options.enlarge,
            ignore_aspect: options.ignore_aspect,
            rotation: 0,
        };
        Self {
            options,
            transform,
            screen,
            transforms,
            input,
            clock,
        }
    }

    /// Present one decoded image until a key or the slideshow timer decides
    /// how to proceed.
    pub fn present(&mut self, image: LoadedImage) -> Result<Verdict> {
        let (screen_w, screen_h) = self.screen.resolution();

        // Untransformed base buffers. Transforms always restart from these,
        // so rotation is absolute rather than cumulative.
        let mut base_rgb = image.rgb;
        let mut base_alpha = image.alpha;
        let mut base_w = image.width;
        let mut base_h = image.height;
        let mut store = image.animation;

        let mut state = ImageState::new(base_w, base_h);
        let mut x_pan = 0u32;
        let mut y_pan = 0u32;
        let mut retransform = true;
        let mut refresh = false;

        let started = self.clock.now();
        let mut last_draw = started;

        loop {
            if retransform {
                self.restage(
                    &mut state,
                    &base_rgb,
                    base_alpha.as_deref(),
                    base_w,
                    base_h,
                    (screen_w, screen_h),
                );
                x_pan = 0;
                y_pan = 0;
                refresh = true;
            }

            if refresh {
                let x_off = letterbox_offset(state.width, screen_w);
                let y_off = letterbox_offset(state.height, screen_h);
                let new_image = retransform;
                if new_image {
                    state.saved = None;
                }
                let mut saved = state.saved.take();
                if let Some(rgb) = state.rgb.active() {
                    let alpha = if self.options.use_alpha {
                        state.alpha.active()
                    } else {
                        None
                    };
                    self.screen.display(
                        rgb,
                        alpha,
                        state.width,
                        state.height,
                        x_pan,
                        y_pan,
                        x_off,
                        y_off,
                        &mut saved,
                        new_image,
                    );
                }
                state.saved = saved;
                state.commit();
                retransform = false;
                refresh = false;
                last_draw = self.clock.now();
            }

            match self.input.poll(self.options.poll_timeout) {
                Some(Key::Quit) => return Ok(Verdict::Quit),
                Some(Key::Next) => return Ok(Verdict::Next),
                Some(Key::Previous) => return Ok(Verdict::Previous),
                Some(Key::Redraw) => refresh = true,
                Some(Key::PanLeft) => {
                    if x_pan > 0 {
                        x_pan = x_pan.saturating_sub(pan_step(state.width, &self.options));
                        refresh = true;
                    }
                }
                Some(Key::PanRight) => {
                    if state.width > screen_w {
                        let max = state.width - screen_w;
                        if x_pan < max {
                            x_pan = (x_pan + pan_step(state.width, &self.options)).min(max);
                            refresh = true;
                        }
                    }
                }
                Some(Key::PanUp) => {
                    if y_pan > 0 {
                        y_pan = y_pan.saturating_sub(pan_step(state.height, &self.options));
                        refresh = true;
                    }
                }
                Some(Key::PanDown) => {
                    if state.height > screen_h {
                        let max = state.height - screen_h;
                        if y_pan < max {
                            y_pan = (y_pan + pan_step(state.height, &self.options)).min(max);
                            refresh = true;
                        }
                    }
                }
                Some(Key::ToggleFit) => {
                    self.transform.toggle_fit();
                    retransform = true;
                }
                Some(Key::ToggleQuality) => {
                    self.transform.toggle_quality();
                    retransform = true;
                }
                Some(Key::ToggleEnlarge) => {
                    self.transform.toggle_enlarge();
                    retransform = true;
                }
                Some(Key::ToggleAspect) => {
                    self.transform.toggle_aspect();
                    retransform = true;
                }
                Some(Key::ResetTransforms) => {
                    self.transform.reset();
                    retransform = true;
                }
                Some(Key::RotateLeft) => {
                    self.transform.rotate_left();
                    retransform = true;
                }
                Some(Key::RotateRight) => {
                    self.transform.rotate_right();
                    retransform = true;
                }
                None => {
                    let now = self.clock.now();

                    if self.options.slideshow_delay > 0 {
                        let delay =
                            Duration::from_millis(u64::from(self.options.slideshow_delay) * 100);
                        if now.saturating_sub(started) >= delay {
                            debug!("slideshow delay elapsed");
                            return Ok(Verdict::Next);
                        }
                    }

                    if let Some(frames) = store.as_mut() {
                        let delay_ms = frames.current_delay_ms();
                        if frames.is_animated()
                            && delay_ms > 0
                            && now.saturating_sub(last_draw) >= Duration::from_millis(delay_ms)
                        {
                            let copy = frames.next(self.options.use_alpha)?;
                            base_rgb = copy.rgb;
                            if copy.alpha.is_some() {
                                base_alpha = copy.alpha;
                            }
                            base_w = copy.width;
                            base_h = copy.height;
                            // Same pipeline as a retransform, but pan and
                            // the display backing store stay intact.
                            self.restage(
                                &mut state,
                                &base_rgb,
                                base_alpha.as_deref(),
                                base_w,
                                base_h,
                                (screen_w, screen_h),
                            );
                            refresh = true;
                        }
                    }
                }
            }
        }
    }

    fn restage(
        &self,
        state: &mut ImageState,
        rgb: &[u8],
        alpha: Option<&[u8]>,
        width: u32,
        height: u32,
        screen: (u32, u32),
    ) {
        state.width = width;
        state.height = height;
        state.rgb.stage(rgb.to_vec());
        if let Some(plane) = alpha {
            state.alpha.stage(plane.to_vec());
        }
        transform::apply(state, &self.transform, screen, self.transforms);
    }
}

fn letterbox_offset(content: u32, screen: u32) -> u32 {
    if content < screen {
        (screen - content) / 2
    } else {
        0
    }
}

fn pan_step(dimension: u32, options: &PlayerOptions) -> u32 {
    (dimension / options.pan_stepping.max(1)).max(1)
}

//! Transform state and resizing policy.
//!
//! The policy functions decide target sizes with the same integer
//! arithmetic the display path uses, so a fit target never exceeds the
//! screen and an enlarge target always meets it on one axis.

use crate::screen::Transforms;
use crate::state::ImageState;

/// Fit-to-screen mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StretchMode {
    /// No fitting.
    #[default]
    Off,
    /// Shrink oversized images with the nearest-neighbor kernel.
    Fit,
    /// Shrink oversized images with the box-filter kernel.
    FitColorAveraged,
}

impl StretchMode {
    /// Whether fitting is enabled at all.
    pub fn is_on(&self) -> bool {
        !matches!(self, StretchMode::Off)
    }
}

/// User-controlled transform toggles. Mutated only by key handling; any
/// change forces pipeline reapplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformState {
    /// Fit-to-screen mode.
    pub stretch: StretchMode,
    /// Enlarge images smaller than the screen.
    pub enlarge: bool,
    /// Clamp each axis independently instead of preserving aspect.
    pub ignore_aspect: bool,
    /// Clockwise quarter-turns, 0..=3.
    pub rotation: u8,
}

impl TransformState {
    /// Toggle fitting on or off, keeping the quality choice sticky.
    pub fn toggle_fit(&mut self) {
        self.stretch = match self.stretch {
            StretchMode::Off => StretchMode::Fit,
            _ => StretchMode::Off,
        };
    }

    /// Toggle the resize quality while fitting is enabled.
    pub fn toggle_quality(&mut self) {
        self.stretch = match self.stretch {
            StretchMode::Off => StretchMode::Off,
            StretchMode::Fit => StretchMode::FitColorAveraged,
            StretchMode::FitColorAveraged => StretchMode::Fit,
        };
    }

    /// Toggle enlarging.
    pub fn toggle_enlarge(&mut self) {
        self.enlarge = !self.enlarge;
    }

    /// Toggle aspect handling.
    pub fn toggle_aspect(&mut self) {
        self.ignore_aspect = !self.ignore_aspect;
    }

    /// Rotate one quarter-turn counterclockwise.
    pub fn rotate_left(&mut self) {
        self.rotation = (self.rotation + 3) & 3;
    }

    /// Rotate one quarter-turn clockwise.
    pub fn rotate_right(&mut self) {
        self.rotation = (self.rotation + 1) & 3;
    }

    /// Disable all scaling transforms. Rotation is left as set.
    pub fn reset(&mut self) {
        self.stretch = StretchMode::Off;
        self.enlarge = false;
        self.ignore_aspect = false;
    }
}

/// Target size for fitting an oversized image within the screen.
///
/// `None` when the image already fits. With `ignore_aspect` each axis is
/// clamped independently; otherwise the aspect-preserving target that
/// keeps both axes within bounds is chosen. Targets never drop below one
/// pixel on either axis, and zero-dimension inputs yield `None`.
pub fn fit_target(
    width: u32,
    height: u32,
    screen_w: u32,
    screen_h: u32,
    ignore_aspect: bool,
) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    if width <= screen_w && height <= screen_h {
        return None;
    }
    if ignore_aspect {
        return Some((width.min(screen_w), height.min(screen_h)));
    }
    let scaled_h = (u64::from(height) * u64::from(screen_w) / u64::from(width)).max(1) as u32;
    if scaled_h <= screen_h {
        Some((screen_w, scaled_h))
    } else {
        let scaled_w = (u64::from(width) * u64::from(screen_h) / u64::from(height)).max(1) as u32;
        Some((scaled_w, screen_h))
    }
}

/// Target size for enlarging an undersized image toward the screen.
///
/// Only activates when the image is smaller than the screen on at least
/// one axis and (without `ignore_aspect`) not larger on the other. `None`
/// when no valid target exists.
pub fn enlarge_target(
    width: u32,
    height: u32,
    screen_w: u32,
    screen_h: u32,
    ignore_aspect: bool,
) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    if (width > screen_w || height > screen_h) && !ignore_aspect {
        return None;
    }
    if width >= screen_w && height >= screen_h {
        return None;
    }
    if ignore_aspect {
        return Some((width.max(screen_w), height.max(screen_h)));
    }
    let scaled_h = (u64::from(height) * u64::from(screen_w) / u64::from(width)).max(1) as u32;
    if scaled_h <= screen_h {
        return Some((screen_w, scaled_h));
    }
    let scaled_w = (u64::from(width) * u64::from(screen_h) / u64::from(height)).max(1) as u32;
    if scaled_w <= screen_w {
        return Some((scaled_w, screen_h));
    }
    None
}

/// Apply the active transform set to the staged image, in fixed order:
/// rotate, then fit-to-screen, then enlarge. Every step reads the active
/// buffers and stages its output; nothing is committed here.
pub fn apply(
    state: &mut ImageState,
    transform: &TransformState,
    screen: (u32, u32),
    ops: &dyn Transforms,
) {
    let (screen_w, screen_h) = screen;

    if transform.rotation != 0 {
        let (w, h) = (state.width, state.height);
        let turns = transform.rotation;
        let rotated = state.rgb.active().map(|b| ops.rotate(b, w, h, turns));
        let rotated_alpha = state.alpha.active().map(|b| ops.alpha_rotate(b, w, h, turns));
        if let Some(buf) = rotated {
            state.rgb.stage(buf);
        }
        if let Some(buf) = rotated_alpha {
            state.alpha.stage(buf);
        }
        if turns & 1 == 1 {
            std::mem::swap(&mut state.width, &mut state.height);
        }
    }

    if transform.stretch.is_on() {
        if let Some((new_w, new_h)) = fit_target(
            state.width,
            state.height,
            screen_w,
            screen_h,
            transform.ignore_aspect,
        ) {
            resize_into(state, new_w, new_h, transform.stretch, ops);
        }
    }

    if transform.enlarge {
        if let Some((new_w, new_h)) = enlarge_target(
            state.width,
            state.height,
            screen_w,
            screen_h,
            transform.ignore_aspect,
        ) {
            resize_into(state, new_w, new_h, StretchMode::Fit, ops);
        }
    }
}

fn resize_into(
    state: &mut ImageState,
    new_w: u32,
    new_h: u32,
    mode: StretchMode,
    ops: &dyn Transforms,
) {
    let (w, h) = (state.width, state.height);
    let resized = state.rgb.active().map(|b| match mode {
        StretchMode::FitColorAveraged => ops.color_average_resize(b, w, h, new_w, new_h),
        _ => ops.resize(b, w, h, new_w, new_h),
    });
    let resized_alpha = state
        .alpha
        .active()
        .map(|b| ops.alpha_resize(b, w, h, new_w, new_h));
    if let Some(buf) = resized {
        state.rgb.stage(buf);
    }
    if let Some(buf) = resized_alpha {
        state.alpha.stage(buf);
    }
    state.width = new_w;
    state.height = new_h;
}

//! # fbview
//!
//! Core of an interactive framebuffer image viewer.
//!
//! This crate ties the decode engines to a single-threaded presentation
//! loop:
//! - Format dispatch over pluggable image sources ([`source`])
//! - Committed/pending buffer ownership ([`state`])
//! - Geometric transform state and policy ([`transform`])
//! - Collaborator contracts for transforms, display and input ([`screen`])
//! - The interactive playback loop itself ([`player`])
//!
//! The physical blit routine, the transform kernels, terminal setup and
//! CLI parsing live outside this crate, behind the [`screen`] traits.
//!
//! ## Example
//!
//! ```no_run
//! use fbview::prelude::*;
//! # struct Fb; struct Kb;
//! # impl fbview::Screen for Fb {
//! #     fn resolution(&self) -> (u32, u32) { (640, 480) }
//! #     fn display(&mut self, _: &[u8], _: Option<&[u8]>, _: u32, _: u32,
//! #                _: u32, _: u32, _: u32, _: u32, _: &mut Option<Vec<u8>>, _: bool) {}
//! # }
//! # impl fbview::Transforms for Fb {
//! #     fn rotate(&self, b: &[u8], _: u32, _: u32, _: u8) -> Vec<u8> { b.to_vec() }
//! #     fn alpha_rotate(&self, b: &[u8], _: u32, _: u32, _: u8) -> Vec<u8> { b.to_vec() }
//! #     fn resize(&self, b: &[u8], _: u32, _: u32, _: u32, _: u32) -> Vec<u8> { b.to_vec() }
//! #     fn color_average_resize(&self, b: &[u8], _: u32, _: u32, _: u32, _: u32) -> Vec<u8> { b.to_vec() }
//! #     fn alpha_resize(&self, b: &[u8], _: u32, _: u32, _: u32, _: u32) -> Vec<u8> { b.to_vec() }
//! # }
//! # impl fbview::InputSource for Kb {
//! #     fn poll(&mut self, _: std::time::Duration) -> Option<fbview::Key> { None }
//! # }
//! # let (mut fb, transforms, mut kb) = (Fb, Fb, Kb);
//! let options = PlayerOptions::default();
//! let clock = SystemClock::default();
//! let image = fbview::open_image("photo.gif".as_ref(), options.use_alpha)?;
//! let mut player = Player::new(options, &mut fb, &transforms, &mut kb, &clock);
//! match player.present(image)? {
//!     Verdict::Next | Verdict::Previous => { /* advance the file list */ }
//!     Verdict::Quit => { /* tear down */ }
//! }
//! # Ok::<(), fbview::Error>(())
//! ```

pub mod options;
pub mod player;
pub mod prelude;
pub mod screen;
pub mod source;
pub mod state;
pub mod transform;

pub use fbview_core::{Error, Frame, FrameCopy, FrameStore, Result, MAX_FRAMES};

pub use options::PlayerOptions;
pub use player::{InputSource, Key, Player, Verdict};
pub use screen::{Clock, Screen, SystemClock, Transforms};
pub use source::{identify, open_image, source_for, ImageSource, LoadedImage, SourceFormat};
pub use state::{ImageState, Slot};
pub use transform::{StretchMode, TransformState};

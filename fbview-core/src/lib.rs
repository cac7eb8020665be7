//! # fbview Core
//!
//! Core types for the fbview framebuffer image viewer.
//!
//! This crate provides the building blocks shared by the decoders and the
//! presentation layer:
//! - Error handling types
//! - Decoded frame and frame store abstractions

pub mod error;
pub mod frame;

pub use error::{Error, Result};
pub use frame::{alloc_buffer, Frame, FrameCopy, FrameStore, MAX_FRAMES};

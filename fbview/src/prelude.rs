//! Convenient single-import surface for viewer frontends.

pub use crate::options::PlayerOptions;
pub use crate::player::{InputSource, Key, Player, Verdict};
pub use crate::screen::{Clock, Screen, SystemClock, Transforms};
pub use crate::source::{identify, open_image, LoadedImage, SourceFormat};
pub use crate::transform::StretchMode;
pub use fbview_core::{Error, Result};

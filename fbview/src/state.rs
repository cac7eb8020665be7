//! Buffer ownership state for the displayed image.
//!
//! Every buffer pair (committed/pending rgb, committed/pending alpha)
//! follows a strict single-owner discipline: a pending buffer takes
//! rendering priority, and [`Slot::commit`] promotes it while releasing the
//! old committed buffer in the same step, so there is never a window with
//! two owners nor with zero owners.

/// Two-slot ownership type for a committed/pending buffer pair.
#[derive(Debug, Default)]
pub struct Slot {
    committed: Option<Vec<u8>>,
    pending: Option<Vec<u8>>,
}

impl Slot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a pending buffer, replacing any pending buffer already
    /// staged. The committed buffer is untouched until [`Slot::commit`].
    pub fn stage(&mut self, buf: Vec<u8>) {
        self.pending = Some(buf);
    }

    /// The buffer rendering should use: pending when present, committed
    /// otherwise.
    pub fn active(&self) -> Option<&[u8]> {
        self.pending.as_deref().or(self.committed.as_deref())
    }

    /// Whether a pending buffer is staged.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Promote the pending buffer to committed, releasing the previous
    /// committed buffer. No-op when nothing is staged.
    pub fn commit(&mut self) {
        if self.pending.is_some() {
            self.committed = self.pending.take();
        }
    }

    /// Release both buffers.
    pub fn clear(&mut self) {
        self.committed = None;
        self.pending = None;
    }
}

/// Transient working state for one displayed file.
#[derive(Debug)]
pub struct ImageState {
    /// Current (possibly transformed) content width.
    pub width: u32,
    /// Current (possibly transformed) content height.
    pub height: u32,
    /// Committed/pending RGB buffers.
    pub rgb: Slot,
    /// Committed/pending alpha buffers. A frame staged without alpha
    /// leaves the committed alpha in place.
    pub alpha: Slot,
    /// Display backing store: snapshot of previously rendered pixels used
    /// for alpha compositing. Owned here, written by the display
    /// collaborator, dropped when a new image generation is shown.
    pub saved: Option<Vec<u8>>,
}

impl ImageState {
    /// Create a state with empty slots at the given content size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgb: Slot::new(),
            alpha: Slot::new(),
            saved: None,
        }
    }

    /// Promote both buffer pairs after a redraw.
    pub fn commit(&mut self) {
        self.rgb.commit();
        self.alpha.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_takes_priority() {
        let mut slot = Slot::new();
        assert!(slot.active().is_none());

        slot.stage(vec![1]);
        assert_eq!(slot.active(), Some(&[1u8][..]));

        slot.commit();
        assert_eq!(slot.active(), Some(&[1u8][..]));
        assert!(!slot.has_pending());

        slot.stage(vec![2]);
        assert_eq!(slot.active(), Some(&[2u8][..]));
        slot.commit();
        assert_eq!(slot.active(), Some(&[2u8][..]));
    }

    #[test]
    fn test_commit_without_pending_keeps_committed() {
        let mut slot = Slot::new();
        slot.stage(vec![7]);
        slot.commit();
        slot.commit();
        assert_eq!(slot.active(), Some(&[7u8][..]));
    }

    #[test]
    fn test_restage_before_commit_replaces_pending() {
        let mut slot = Slot::new();
        slot.stage(vec![1]);
        slot.stage(vec![2]);
        slot.commit();
        assert_eq!(slot.active(), Some(&[2u8][..]));
    }

    #[test]
    fn test_state_commit_promotes_both() {
        let mut state = ImageState::new(4, 4);
        state.rgb.stage(vec![1; 48]);
        state.alpha.stage(vec![255; 16]);
        state.commit();
        assert!(!state.rgb.has_pending());
        assert!(!state.alpha.has_pending());
        assert!(state.rgb.active().is_some());
        assert!(state.alpha.active().is_some());
    }

    #[test]
    fn test_frame_without_alpha_keeps_committed_alpha() {
        let mut state = ImageState::new(2, 2);
        state.rgb.stage(vec![1; 12]);
        state.alpha.stage(vec![0xFF; 4]);
        state.commit();

        // Next frame arrives without an alpha plane.
        state.rgb.stage(vec![2; 12]);
        state.commit();
        assert_eq!(state.alpha.active(), Some(&[0xFF; 4][..]));
    }
}

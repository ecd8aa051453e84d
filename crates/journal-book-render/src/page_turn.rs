//! Page-flip and cover animation state.

use log::debug;

/// Direction of a page flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlipDirection {
    Forward,
    Backward,
}

/// Whether a flip is in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnState {
    #[default]
    Idle,
    Turning(FlipDirection),
}

/// Cover animations the book asks the host to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoverAnimation {
    /// Jump straight to open; answered with [`AnimationCue::CoverSettled`].
    SnapOpen,
    /// Jump straight to closed; answered with [`AnimationCue::CoverSettled`].
    SnapClosed,
    Open,
    Close,
    /// Close, then answer with [`AnimationCue::CoverClosed`] so the book hides.
    CloseThenHide,
}

/// Host animation callbacks delivered back to the book.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationCue {
    /// A snap animation finished; `opened` tells which state it reached.
    CoverSettled { opened: bool },
    /// The close-then-hide animation finished.
    CoverClosed,
    /// The flipping page has started to uncover the page underneath.
    FlipBegin(FlipDirection),
    /// The flipping page came to rest.
    FlipStop(FlipDirection),
}

/// Host animation playback.
pub trait Animator {
    fn play_cover(&mut self, animation: CoverAnimation);
    fn play_flip(&mut self, direction: FlipDirection);
}

/// Serializes page flips: at most one runs at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageTurnController {
    state: TurnState,
}

impl PageTurnController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_turning(&self) -> bool {
        self.state != TurnState::Idle
    }

    /// Start a flip. Returns `false` without animating if one is running.
    pub fn begin(&mut self, direction: FlipDirection, animator: &mut dyn Animator) -> bool {
        if self.is_turning() {
            debug!("ignoring {:?} flip while turning", direction);
            return false;
        }
        self.state = TurnState::Turning(direction);
        animator.play_flip(direction);
        true
    }

    /// Whether a begin cue for `direction` belongs to the running flip.
    pub fn accepts(&self, direction: FlipDirection) -> bool {
        self.state == TurnState::Turning(direction)
    }

    /// Complete the running flip. Stale stop cues return `false`.
    pub fn finish(&mut self, direction: FlipDirection) -> bool {
        if !self.accepts(direction) {
            return false;
        }
        self.state = TurnState::Idle;
        true
    }

    /// Abandon the running flip; returns whether one was running.
    pub fn kill(&mut self) -> bool {
        let was_turning = self.is_turning();
        self.state = TurnState::Idle;
        was_turning
    }
}

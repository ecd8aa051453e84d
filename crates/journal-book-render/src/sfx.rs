//! Per-frame special effects: glowing images and fading checkboxes.
//!
//! Each visible side subscribes while it shows at least one animating
//! image. Ticks alternate between subscribed sides so a spread with effects
//! on both pages splits the frame budget.

use core::ops::Range;

use journal_book::{Chunk, ChunkSequence, ImageEffect};
use log::trace;

use crate::links::PageSide;

/// Set of sides wanting per-frame updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SfxSides(u8);

impl SfxSides {
    pub const NONE: Self = Self(0);
    pub const LEFT: Self = Self(0b01);
    pub const RIGHT: Self = Self(0b10);
    pub const BOTH: Self = Self(0b11);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, side: PageSide) -> bool {
        self.0 & Self::from(side).0 != 0
    }

    pub fn with(self, side: PageSide) -> Self {
        Self(self.0 | Self::from(side).0)
    }

    pub fn without(self, side: PageSide) -> Self {
        Self(self.0 & !Self::from(side).0)
    }
}

impl From<PageSide> for SfxSides {
    fn from(value: PageSide) -> Self {
        match value {
            PageSide::Left => Self::LEFT,
            PageSide::Right => Self::RIGHT,
        }
    }
}

/// Host frame-tick subscription.
pub trait FrameClock {
    /// Start delivering ticks to the book.
    fn subscribe_ticks(&mut self);
    /// Stop delivering ticks.
    fn unsubscribe_ticks(&mut self);
}

/// Tick-driven effect scheduler for one GUI.
#[derive(Clone, Debug, Default)]
pub struct SfxDriver {
    sides: SfxSides,
    base_time: f32,
    reset_pending: bool,
    flip: bool,
}

impl SfxDriver {
    pub fn new() -> Self {
        Self {
            reset_pending: true,
            ..Self::default()
        }
    }

    pub fn sides(&self) -> SfxSides {
        self.sides
    }

    /// Replace the subscribed set; the clock only hears about transitions
    /// between empty and non-empty.
    pub fn register(&mut self, sides: SfxSides, clock: &mut dyn FrameClock) {
        if sides == self.sides {
            return;
        }
        let was_empty = self.sides.is_empty();
        self.sides = sides;
        if was_empty && !sides.is_empty() {
            trace!("sfx ticks subscribed for {:?}", sides);
            clock.subscribe_ticks();
        } else if !was_empty && sides.is_empty() {
            trace!("sfx ticks unsubscribed");
            clock.unsubscribe_ticks();
        }
    }

    pub fn add_side(&mut self, side: PageSide, clock: &mut dyn FrameClock) {
        self.register(self.sides.with(side), clock);
    }

    pub fn remove_side(&mut self, side: PageSide, clock: &mut dyn FrameClock) {
        self.register(self.sides.without(side), clock);
    }

    /// Restart effect timing on the next tick.
    pub fn request_reset(&mut self) {
        self.reset_pending = true;
    }

    /// Pick the side to animate at `now`, alternating between ticks.
    ///
    /// Returns the side and the seconds elapsed since the last reset, or
    /// `None` when this tick's turn belongs to an unsubscribed side.
    pub fn next_side(&mut self, now: f32) -> Option<(PageSide, f32)> {
        if self.reset_pending {
            self.base_time = now;
            self.reset_pending = false;
        }
        self.flip = !self.flip;
        let side = if self.flip && self.sides.contains(PageSide::Left) {
            PageSide::Left
        } else if !self.flip && self.sides.contains(PageSide::Right) {
            PageSide::Right
        } else {
            return None;
        };
        Some((side, now - self.base_time))
    }
}

/// Advance the effects of `chunks[range]` by one frame.
///
/// Glowing images take their opacity from the elapsed time; checkboxes step
/// their tint toward the target color. Returns whether any effect still
/// wants further frames.
pub fn animate_range(
    chunks: &mut ChunkSequence,
    range: Range<usize>,
    elapsed: f32,
    fade_step: f32,
) -> bool {
    let mut still_want = false;
    for index in range {
        let Some(Chunk::Image(image)) = chunks.get_mut(index) else {
            continue;
        };
        match &mut image.effect {
            ImageEffect::None => {}
            ImageEffect::Glow(glow) => {
                image.opacity = glow.opacity_at(elapsed);
                still_want = true;
            }
            ImageEffect::Checkbox(check) => {
                let target = check.target();
                if check.current_color.step_toward(target, fade_step) {
                    still_want = true;
                }
            }
        }
    }
    still_want
}

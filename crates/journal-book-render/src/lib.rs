//! Pagination, page turning and interaction for `journal-book`.
//!
//! The [`Paginator`] lays compiled chunks out onto fixed-size pages through a
//! [`RenderSurface`]. [`JournalBook`] presents a book through a named
//! [`BookGui`] from a [`BookGuiRegistry`]: opening and closing the cover,
//! flipping spreads, resolving clicks to links and checkboxes, and driving
//! per-frame effects.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod book;
mod config;
mod edit_chain;
mod error;
mod gui;
mod layout;
mod links;
mod movies;
mod page_turn;
mod recording;
mod sfx;
mod surface;

pub use book::{BookEvent, JournalBook, Notifier, PageCursor, PagePoint};
pub use config::{BookConfig, LayoutConfig, MOVIE_CACHE_CAPACITY};
pub use edit_chain::{ChainOrder, EditChain, EditSlot, EditWidget};
pub use error::{BookError, ConfigError};
pub use gui::{
    BookDialog, BookGui, BookGuiRegistry, BookId, CoverLayers, PageSlot, PageSurfaces, DEFAULT_GUI,
};
pub use layout::{BookScale, MovieBinding, PageRender, Paginator, RenderTarget};
pub use links::{LinkRect, LinkRegistry, PageSide, VisibleLink};
pub use movies::{LoadedMovie, MovieCache, MovieHost, MovieKey, MovieLayer};
pub use page_turn::{
    AnimationCue, Animator, CoverAnimation, FlipDirection, PageTurnController, TurnState,
};
pub use recording::{FixedMetrics, RecordingSurface, SurfaceCommand};
pub use sfx::{animate_range, FrameClock, SfxDriver, SfxSides};
pub use surface::{
    opacity_byte, wrap_text, CompositeMode, CompositeOptions, GlyphMetrics, Justify,
    RenderSurface, WrapBox, WrappedLine, WrappedSize, WrappedText,
};

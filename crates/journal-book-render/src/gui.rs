//! Book GUIs: page surfaces, dialog chrome and the registry books share.
//!
//! A GUI is shared by every book that names it, but presents one book at a
//! time. It owns the per-presentation state (turn state, effect ticks,
//! open/closed cover) so that switching books resets it.

use std::collections::BTreeMap;

use journal_book::{CoverDecal, ImageHandle, Rgba};
use log::{debug, warn};

use crate::edit_chain::EditChain;
use crate::error::BookError;
use crate::links::PageSide;
use crate::movies::MovieHost;
use crate::page_turn::{Animator, PageTurnController};
use crate::sfx::{FrameClock, SfxDriver};
use crate::surface::RenderSurface;

/// GUI every book falls back to; it cannot be unloaded.
pub const DEFAULT_GUI: &str = "BkBook";

/// The four page surfaces of a book GUI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageSlot {
    Left,
    Right,
    /// Front of the flipping page (shows the old right page going forward).
    TurnFront,
    /// Back of the flipping page (shows the new left page going forward).
    TurnBack,
}

impl PageSlot {
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::TurnFront, Self::TurnBack];

    /// GUI control tag of the page map.
    pub fn tag(self) -> u32 {
        match self {
            Self::Left => 101,
            Self::Right => 102,
            Self::TurnFront => 103,
            Self::TurnBack => 104,
        }
    }

    /// Spread side whose links this slot's render replaces.
    pub fn link_side(self) -> PageSide {
        match self {
            Self::Left | Self::TurnBack => PageSide::Left,
            Self::Right | Self::TurnFront => PageSide::Right,
        }
    }

    /// Resting side shown by this slot; turn pages have none.
    pub fn display_side(self) -> Option<PageSide> {
        match self {
            Self::Left => Some(PageSide::Left),
            Self::Right => Some(PageSide::Right),
            Self::TurnFront | Self::TurnBack => None,
        }
    }

    pub fn of_side(side: PageSide) -> Self {
        match side {
            PageSide::Left => Self::Left,
            PageSide::Right => Self::Right,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
            Self::TurnFront => 2,
            Self::TurnBack => 3,
        }
    }
}

/// Surfaces indexed by [`PageSlot`].
#[derive(Clone, Debug)]
pub struct PageSurfaces<S> {
    slots: [S; 4],
}

impl<S: RenderSurface> PageSurfaces<S> {
    pub fn new(left: S, right: S, turn_front: S, turn_back: S) -> Self {
        Self {
            slots: [left, right, turn_front, turn_back],
        }
    }

    /// Four surfaces built by `make`.
    pub fn from_fn(mut make: impl FnMut(PageSlot) -> S) -> Self {
        Self {
            slots: PageSlot::ALL.map(&mut make),
        }
    }

    pub fn get(&self, slot: PageSlot) -> &S {
        &self.slots[slot.index()]
    }

    pub fn get_mut(&mut self, slot: PageSlot) -> &mut S {
        &mut self.slots[slot.index()]
    }

    /// Copy `from`'s pixels onto `to`.
    pub fn copy(&mut self, from: PageSlot, to: PageSlot) {
        let (src, dst) = (from.index(), to.index());
        if src == dst {
            return;
        }
        if src < dst {
            let (head, tail) = self.slots.split_at_mut(dst);
            tail[0].copy_from(&head[src]);
        } else {
            let (head, tail) = self.slots.split_at_mut(src);
            head[dst].copy_from(&tail[0]);
        }
    }

    /// Blank every surface.
    pub fn purge(&mut self) {
        for surface in &mut self.slots {
            surface.clear(Rgba::TRANSPARENT);
            surface.flush();
        }
    }
}

/// Cover artwork composed when a book is shown.
#[derive(Clone, Copy, Debug)]
pub struct CoverLayers<'a> {
    pub base: Option<&'a ImageHandle>,
    pub tint: Option<Rgba>,
    /// Tint applied beneath the decals rather than over them.
    pub tint_first: bool,
    pub decals: &'a [CoverDecal],
}

/// Host dialog chrome around the page surfaces.
pub trait BookDialog {
    fn set_visible(&mut self, visible: bool);
    /// Show the flipping-page object.
    fn set_turn_page_visible(&mut self, visible: bool);
    /// Show the page-corner hint of `side`.
    fn set_corner_visible(&mut self, side: PageSide, visible: bool);
    fn set_book_size(&mut self, width_scale: f32, height_scale: f32);
    fn set_cover(&mut self, _cover: &CoverLayers<'_>) {}
    /// Whether clicks go to the closed cover rather than the pages.
    fn set_cover_enabled(&mut self, _enabled: bool) {}
    fn play_turn_sound(&mut self) {}
}

/// Identity of a book, used to check which book a GUI currently presents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookId(pub u32);

pub struct BookGui<S> {
    pub(crate) surfaces: PageSurfaces<S>,
    pub(crate) edit: Option<EditChain>,
    pub(crate) dialog: Box<dyn BookDialog>,
    pub(crate) animator: Box<dyn Animator>,
    pub(crate) clock: Box<dyn FrameClock>,
    pub(crate) movies: Option<Box<dyn MovieHost>>,
    pub(crate) turn: PageTurnController,
    pub(crate) sfx: SfxDriver,
    pub(crate) currently_open: bool,
    pub(crate) started_open: bool,
    pub(crate) current_book: Option<BookId>,
}

impl<S: RenderSurface> BookGui<S> {
    pub fn new(
        surfaces: PageSurfaces<S>,
        dialog: Box<dyn BookDialog>,
        animator: Box<dyn Animator>,
        clock: Box<dyn FrameClock>,
    ) -> Self {
        Self {
            surfaces,
            edit: None,
            dialog,
            animator,
            clock,
            movies: None,
            turn: PageTurnController::new(),
            sfx: SfxDriver::new(),
            currently_open: false,
            started_open: false,
            current_book: None,
        }
    }

    /// Attach the four edit widgets, making the GUI editable.
    pub fn with_edit_chain(mut self, chain: EditChain) -> Self {
        self.edit = Some(chain);
        self
    }

    pub fn with_movie_host(mut self, host: Box<dyn MovieHost>) -> Self {
        self.movies = Some(host);
        self
    }

    /// Whether the GUI carries the full set of edit widgets.
    pub fn is_editable(&self) -> bool {
        self.edit.is_some()
    }

    pub fn surfaces(&self) -> &PageSurfaces<S> {
        &self.surfaces
    }

    pub fn surface(&self, slot: PageSlot) -> &S {
        self.surfaces.get(slot)
    }

    pub fn edit_chain(&self) -> Option<&EditChain> {
        self.edit.as_ref()
    }

    pub fn turn(&self) -> &PageTurnController {
        &self.turn
    }

    pub fn is_turning(&self) -> bool {
        self.turn.is_turning()
    }

    pub fn sfx(&self) -> &SfxDriver {
        &self.sfx
    }

    pub fn is_open(&self) -> bool {
        self.currently_open
    }

    pub fn current_book(&self) -> Option<BookId> {
        self.current_book
    }

    pub(crate) fn presents(&self, book: BookId) -> bool {
        self.current_book == Some(book)
    }

    /// Set the resting page-corner hints.
    pub(crate) fn set_corners(&mut self, left: Option<bool>, right: Option<bool>) {
        if let Some(visible) = left {
            self.dialog.set_corner_visible(PageSide::Left, visible);
        }
        if let Some(visible) = right {
            self.dialog.set_corner_visible(PageSide::Right, visible);
        }
    }
}

impl<S> core::fmt::Debug for BookGui<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BookGui")
            .field("editable", &self.edit.is_some())
            .field("turn", &self.turn)
            .field("currently_open", &self.currently_open)
            .field("current_book", &self.current_book)
            .finish_non_exhaustive()
    }
}

/// Named book GUIs.
///
/// Passed explicitly to every book operation that touches presentation.
pub struct BookGuiRegistry<S> {
    guis: BTreeMap<String, BookGui<S>>,
}

impl<S: RenderSurface> Default for BookGuiRegistry<S> {
    fn default() -> Self {
        Self {
            guis: BTreeMap::new(),
        }
    }
}

impl<S: RenderSurface> BookGuiRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the default GUI.
    pub fn init(&mut self, default_gui: BookGui<S>) {
        self.guis.insert(DEFAULT_GUI.to_string(), default_gui);
    }

    /// Register `gui` under `name`, replacing any previous one.
    pub fn load_gui(&mut self, name: &str, gui: BookGui<S>) {
        if self.guis.insert(name.to_string(), gui).is_some() {
            debug!("replaced book GUI '{}'", name);
        }
    }

    pub fn unload_gui(&mut self, name: &str) -> Result<(), BookError> {
        if name == DEFAULT_GUI {
            return Err(BookError::DefaultGuiPinned);
        }
        self.guis
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BookError::UnknownGui(name.to_string()))
    }

    /// Drop every GUI except the default one.
    pub fn unload_all(&mut self) {
        self.guis.retain(|name, _| name == DEFAULT_GUI);
    }

    /// Drop every GUI, the default included.
    pub fn shutdown(&mut self) {
        self.guis.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.guis.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&BookGui<S>> {
        self.guis.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut BookGui<S>> {
        self.guis.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.guis.keys().map(String::as_str)
    }

    /// Name to use for a book asking for `name`: itself when registered,
    /// the default otherwise.
    pub fn resolve(&self, name: &str) -> Result<String, BookError> {
        if self.contains(name) {
            return Ok(name.to_string());
        }
        if self.contains(DEFAULT_GUI) {
            warn!("book GUI '{}' not loaded; using '{}'", name, DEFAULT_GUI);
            return Ok(DEFAULT_GUI.to_string());
        }
        Err(BookError::UnknownGui(name.to_string()))
    }
}

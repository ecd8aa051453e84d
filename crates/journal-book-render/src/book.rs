//! A journal book: compiled content plus its presentation through a GUI.
//!
//! Every operation that touches presentation takes the [`BookGuiRegistry`]
//! explicitly; the book only remembers the name of the GUI it uses.

use journal_book::{
    BookSettings, Chunk, ChunkSequence, CoverDecal, ImageEffect, ImageLookup, MarkupCompiler,
};
use log::{debug, warn};

use crate::config::BookConfig;
use crate::edit_chain::{ChainOrder, EditSlot};
use crate::error::BookError;
use crate::gui::{BookGui, BookGuiRegistry, BookId, CoverLayers, PageSlot};
use crate::layout::{BookScale, MovieBinding, PageRender, Paginator, RenderTarget};
use crate::links::{LinkRegistry, PageSide};
use crate::movies::{LoadedMovie, MovieCache};
use crate::page_turn::{AnimationCue, CoverAnimation, FlipDirection};
use crate::sfx::{animate_range, SfxSides};
use crate::surface::RenderSurface;

/// Notifications sent to the book's owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookEvent {
    /// A linked image was clicked, or a checkbox became checked.
    ImageLink(u32),
    Show,
    Hide,
    NextPage,
    PreviousPage,
    /// A checkbox became unchecked.
    CheckUnchecked(u32),
    Close,
}

impl BookEvent {
    /// Numeric event type understood by script handlers.
    pub fn code(self) -> u8 {
        match self {
            Self::ImageLink(_) => 0,
            Self::Show => 1,
            Self::Hide => 2,
            Self::NextPage => 3,
            Self::PreviousPage => 4,
            Self::CheckUnchecked(_) => 5,
            Self::Close => 6,
        }
    }

    /// Link event id carried by the notification, if any.
    pub fn link_id(self) -> Option<u32> {
        match self {
            Self::ImageLink(id) | Self::CheckUnchecked(id) => Some(id),
            _ => None,
        }
    }
}

/// Receiver of [`BookEvent`]s.
pub trait Notifier {
    fn notify(&mut self, event: BookEvent);
}

impl<F: FnMut(BookEvent)> Notifier for F {
    fn notify(&mut self, event: BookEvent) {
        self(event)
    }
}

/// Pointer cursor a host shows over a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageCursor {
    /// Over a link or checkbox.
    Hand,
    /// Dragging while pressed on a link.
    Pressed,
    TurnLeft,
    TurnRight,
    Idle,
}

/// Click position normalized to a page surface, `(0, 0)` top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

pub struct JournalBook {
    id: BookId,
    source: String,
    images: Box<dyn ImageLookup>,
    config: BookConfig,
    gui_name: String,

    chunks: ChunkSequence,
    settings: BookSettings,
    paginator: Paginator,
    links: LinkRegistry,
    movies: MovieCache,

    current_page: usize,
    allow_turning: bool,
    showing: bool,
    editing: bool,
    want_editing: bool,

    notifier: Option<Box<dyn Notifier>>,
}

impl JournalBook {
    /// Compile `source` and bind the book to the GUI named in `config`
    /// (or the default GUI when that one is not loaded).
    pub fn new<S: RenderSurface>(
        id: BookId,
        source: impl Into<String>,
        images: Box<dyn ImageLookup>,
        config: BookConfig,
        guis: &mut BookGuiRegistry<S>,
    ) -> Result<Self, BookError> {
        let gui_name = guis.resolve(&config.gui)?;
        let mut book = Self {
            id,
            source: source.into(),
            images,
            paginator: Paginator::new(config.layout.clone()),
            allow_turning: config.allow_page_turning,
            config,
            gui_name: String::new(),
            chunks: ChunkSequence::new(),
            settings: BookSettings::default(),
            links: LinkRegistry::new(),
            movies: MovieCache::new(),
            current_page: 0,
            showing: false,
            editing: false,
            want_editing: false,
            notifier: None,
        };
        book.bind_gui(gui_name, guis);
        Ok(book)
    }

    /// [`JournalBook::new`] with a [`BookConfig`] read from JSON.
    pub fn from_config_json<S: RenderSurface>(
        id: BookId,
        source: impl Into<String>,
        images: Box<dyn ImageLookup>,
        config_json: &str,
        guis: &mut BookGuiRegistry<S>,
    ) -> Result<Self, BookError> {
        let config = BookConfig::from_json_str(config_json)?;
        Self::new(id, source, images, config, guis)
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn chunks(&self) -> &ChunkSequence {
        &self.chunks
    }

    pub fn settings(&self) -> &BookSettings {
        &self.settings
    }

    pub fn links(&self) -> &LinkRegistry {
        &self.links
    }

    pub fn page_starts(&self) -> &[usize] {
        self.paginator.page_starts()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn gui_name(&self) -> &str {
        &self.gui_name
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn page_turning_allowed(&self) -> bool {
        self.allow_turning
    }

    /// Loaded movie with the given source ordinal.
    pub fn movie(&self, movie_index: u8) -> Option<&LoadedMovie> {
        self.movies.by_index(movie_index)
    }

    fn notify(&mut self, event: BookEvent) {
        debug!("book {:?} notifies {:?}", self.id, event);
        if let Some(notifier) = self.notifier.as_mut() {
            notifier.notify(event);
        }
    }

    // ---------------------------------------------------------------
    // Content

    /// Replace the source and recompile.
    pub fn set_source<S: RenderSurface>(&mut self, source: impl Into<String>, guis: &mut BookGuiRegistry<S>) {
        self.source = source.into();
        self.recompile(guis);
    }

    /// Switch to another GUI, falling back to the default when `name` is
    /// not loaded, then recompile.
    pub fn set_gui<S: RenderSurface>(&mut self, name: &str, guis: &mut BookGuiRegistry<S>) -> Result<(), BookError> {
        let resolved = guis.resolve(name)?;
        self.bind_gui(resolved, guis);
        Ok(())
    }

    fn bind_gui<S: RenderSurface>(&mut self, name: String, guis: &mut BookGuiRegistry<S>) {
        self.gui_name = name;
        self.set_editable(self.want_editing, guis);
        self.recompile(guis);
    }

    /// Recompile the source, discarding all pagination, links and movies.
    pub fn recompile<S: RenderSurface>(&mut self, guis: &mut BookGuiRegistry<S>) {
        let mut gui = guis.get_mut(&self.gui_name);
        if let Some(host) = gui.as_mut().and_then(|g| g.movies.as_deref_mut()) {
            self.movies.release_all(host);
        }

        let mut compiler = MarkupCompiler::new(self.images.as_ref())
            .with_default_margins(self.config.layout.default_margins());
        if let Some(hint) = self.config.location_hint.as_deref() {
            compiler = compiler.with_location_hint(hint);
        }
        if let Some(chain) = gui.as_mut().and_then(|g| g.edit.as_mut()) {
            compiler = compiler.with_edit_sink(chain);
        }
        let compiled = compiler.compile(&self.source);

        self.chunks = compiled.chunks;
        self.settings = compiled.settings;
        self.paginator.reset();
        self.paginator.set_book_scale(BookScale {
            width: self.settings.width_scale,
            height: self.settings.height_scale,
        });
        self.links.clear();
        if self.editing {
            self.paginator.fix_last_page(0);
        }
        if self.settings.editable {
            self.set_editable(true, guis);
        }
    }

    /// Rescale the book; affects no-resize objects and the dialog size.
    ///
    /// Like `<book width= height=>`, the stored scales are `1 - width` and
    /// `1 - height`.
    pub fn set_book_size<S: RenderSurface>(&mut self, width: f32, height: f32, guis: &mut BookGuiRegistry<S>) {
        let (width, height) = (1.0 - width, 1.0 - height);
        self.settings.width_scale = width;
        self.settings.height_scale = height;
        self.paginator.set_book_scale(BookScale { width, height });
        if let Some(gui) = guis.get_mut(&self.gui_name) {
            if gui.presents(self.id) {
                gui.dialog.set_book_size(width, height);
            }
        }
    }

    /// Enter or leave editing mode. On a GUI without edit widgets the wish
    /// is remembered and applied when the book moves to an editable GUI.
    pub fn set_editable<S: RenderSurface>(&mut self, editable: bool, guis: &mut BookGuiRegistry<S>) {
        let Some(chain) = guis.get_mut(&self.gui_name).and_then(|g| g.edit.as_mut()) else {
            self.want_editing = editable;
            return;
        };
        chain.set_enabled(editable);
        if editable {
            chain.show_resting();
        } else {
            chain.hide_all();
        }
        self.editing = editable;
        if editable {
            self.paginator.fix_last_page(0);
        }
    }

    /// Text of the editable buffer, when editing.
    pub fn editable_text<S: RenderSurface>(&self, guis: &BookGuiRegistry<S>) -> Option<String> {
        if !self.editing {
            return None;
        }
        guis.get(&self.gui_name)
            .and_then(|g| g.edit.as_ref())
            .map(|chain| chain.widget(EditSlot::Left).buffer())
    }

    pub fn set_editable_text<S: RenderSurface>(&mut self, text: &str, guis: &mut BookGuiRegistry<S>) {
        if !self.editing {
            return;
        }
        if let Some(chain) = guis.get_mut(&self.gui_name).and_then(|g| g.edit.as_mut()) {
            let left = chain.widget_mut(EditSlot::Left);
            left.set_buffer(text);
            left.set_cursor(0);
            left.force_update();
        }
    }

    /// Paginate the whole book without drawing.
    pub fn force_cache_calculations<S: RenderSurface>(&mut self, guis: &mut BookGuiRegistry<S>) {
        self.recalc(None, guis);
    }

    /// Last page index, paginating the whole book first if needed.
    pub fn last_page<S: RenderSurface>(&mut self, guis: &mut BookGuiRegistry<S>) -> Option<usize> {
        self.force_cache_calculations(guis);
        self.paginator.last_page()
    }

    fn recalc<S: RenderSurface>(&mut self, up_to: Option<usize>, guis: &mut BookGuiRegistry<S>) {
        if self.editing {
            return;
        }
        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        let BookGui {
            surfaces, movies, ..
        } = gui;
        let mut target = RenderTarget {
            surface: surfaces.get_mut(PageSlot::TurnBack),
            slot: PageSlot::TurnBack,
            suppress_draw: true,
            movies: movies.as_deref_mut().map(|host| MovieBinding {
                cache: &mut self.movies,
                host,
            }),
        };
        self.paginator.recalc(up_to, &mut self.chunks, &mut target);
    }

    // ---------------------------------------------------------------
    // Rendering

    fn render_into<S: RenderSurface>(&mut self, gui: &mut BookGui<S>, page: usize, slot: PageSlot) -> PageRender {
        if self.editing {
            return PageRender::default();
        }
        let BookGui {
            surfaces,
            movies,
            sfx,
            clock,
            ..
        } = gui;
        let mut target = RenderTarget {
            surface: surfaces.get_mut(slot),
            slot,
            suppress_draw: false,
            movies: movies.as_deref_mut().map(|host| MovieBinding {
                cache: &mut self.movies,
                host,
            }),
        };
        let render = self.paginator.render_page(page, &mut self.chunks, &mut target);
        self.links.replace_side(slot.link_side(), render.links.iter().copied());

        if let Some(side) = slot.display_side() {
            let sides = if render.needs_sfx {
                sfx.sides().with(side)
            } else {
                sfx.sides().without(side)
            };
            sfx.register(sides, clock.as_mut());
        }
        render
    }

    fn render_spread<S: RenderSurface>(&mut self, gui: &mut BookGui<S>) {
        self.links.clear();
        let page = self.current_page;
        self.render_into(gui, page, PageSlot::Left);
        self.render_into(gui, page + 1, PageSlot::Right);
    }

    fn move_movie_layers<S: RenderSurface>(gui: &mut BookGui<S>, from: PageSlot, to: PageSlot) {
        if let Some(host) = gui.movies.as_deref_mut() {
            host.move_layers(from, to);
        }
    }

    /// Refresh the page-corner hints; `side` limits the update to one side.
    /// Whether a turn toward the left and right is currently possible.
    fn turn_affordances<S: RenderSurface>(&self, gui: &BookGui<S>) -> (bool, bool) {
        match (self.editing, gui.edit.as_ref()) {
            (true, Some(chain)) => (
                !chain.widget(EditSlot::Left).showing_beginning(),
                !chain.widget(EditSlot::Right).showing_end(),
            ),
            _ => (
                self.current_page >= 2,
                self.paginator.last_page().is_none_or(|last| self.current_page + 2 <= last),
            ),
        }
    }

    fn update_corners<S: RenderSurface>(&self, gui: &mut BookGui<S>, side: Option<PageSide>) {
        if !self.allow_turning || !self.showing {
            gui.set_corners(Some(false), Some(false));
            return;
        }
        let (left, right) = self.turn_affordances(gui);
        match side {
            Some(PageSide::Left) => gui.set_corners(Some(left), None),
            Some(PageSide::Right) => gui.set_corners(None, Some(right)),
            None => gui.set_corners(Some(left), Some(right)),
        }
    }

    // ---------------------------------------------------------------
    // Lifecycle

    /// Present the book on its GUI, on the cover or already open.
    ///
    /// Completion arrives as [`AnimationCue::CoverSettled`].
    pub fn show<S: RenderSurface>(&mut self, start_open: bool, guis: &mut BookGuiRegistry<S>) {
        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        if gui.turn.kill() {
            debug!("show interrupted a page flip");
        }
        gui.current_book = Some(self.id);
        gui.started_open = start_open;
        gui.dialog.set_book_size(self.settings.width_scale, self.settings.height_scale);
        gui.dialog.set_cover(&CoverLayers {
            base: self.settings.cover.as_ref(),
            tint: self.settings.cover_tint,
            tint_first: self.settings.tint_first,
            decals: &self.settings.cover_decals,
        });
        if let Some(host) = gui.movies.as_deref_mut() {
            for decal in &self.settings.cover_decals {
                if let CoverDecal::Movie(movie) = decal {
                    if self.movies.get_or_open(movie, host).is_some() {
                        host.place_on_cover(movie);
                    }
                }
            }
        }
        gui.dialog.set_turn_page_visible(false);
        Self::trigger_cover(gui, !start_open, true);
    }

    /// [`show`](Self::show) the way the book's config asks.
    pub fn show_configured<S: RenderSurface>(&mut self, guis: &mut BookGuiRegistry<S>) {
        self.show(self.config.start_open, guis);
    }

    fn trigger_cover<S: RenderSurface>(gui: &mut BookGui<S>, close: bool, immediate: bool) {
        gui.currently_open = !close;
        gui.dialog.set_cover_enabled(close);
        let animation = match (close, immediate) {
            (true, true) => CoverAnimation::SnapClosed,
            (false, true) => CoverAnimation::SnapOpen,
            (true, false) => CoverAnimation::CloseThenHide,
            (false, false) => CoverAnimation::Open,
        };
        gui.animator.play_cover(animation);
    }

    fn finish_show<S: RenderSurface>(&mut self, opened: bool, gui: &mut BookGui<S>) {
        gui.dialog.set_visible(true);
        self.showing = true;
        if opened {
            self.current_page = 0;
            self.render_spread(gui);
        }
        self.update_corners(gui, None);
        self.notify(BookEvent::Show);
    }

    /// Take the book off screen and release what it loaded.
    pub fn hide<S: RenderSurface>(&mut self, guis: &mut BookGuiRegistry<S>) {
        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        if !gui.presents(self.id) {
            return;
        }
        gui.turn.kill();
        gui.dialog.set_visible(false);
        gui.dialog.set_turn_page_visible(false);
        gui.current_book = None;
        self.showing = false;
        gui.sfx.register(SfxSides::NONE, gui.clock.as_mut());
        self.notify(BookEvent::Hide);

        gui.surfaces.purge();
        if let Some(host) = gui.movies.as_deref_mut() {
            self.movies.release_all(host);
        }
        self.links.clear();
    }

    /// Open the cover at `start_page` (silently; no notification).
    pub fn open<S: RenderSurface>(&mut self, start_page: usize, guis: &mut BookGuiRegistry<S>) {
        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        if gui.currently_open {
            return;
        }
        gui.animator.play_cover(CoverAnimation::Open);
        gui.currently_open = true;
        gui.dialog.set_cover_enabled(false);
        self.current_page = start_page;
        self.render_spread(gui);
        self.update_corners(gui, None);
    }

    /// Close the cover; books shown already open cannot be closed.
    pub fn close<S: RenderSurface>(&mut self, guis: &mut BookGuiRegistry<S>) {
        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        self.close_on(gui);
    }

    fn close_on<S: RenderSurface>(&mut self, gui: &mut BookGui<S>) {
        if gui.started_open || !gui.currently_open {
            return;
        }
        self.notify(BookEvent::Close);
        gui.animator.play_cover(CoverAnimation::Close);
        gui.currently_open = false;
        gui.dialog.set_cover_enabled(true);
    }

    /// Close the cover, then hide once it has closed
    /// ([`AnimationCue::CoverClosed`]). Hides at once if it cannot close.
    pub fn close_and_hide<S: RenderSurface>(&mut self, guis: &mut BookGuiRegistry<S>) {
        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        if !gui.started_open && gui.currently_open {
            if gui.turn.kill() {
                gui.dialog.set_turn_page_visible(false);
            }
            self.notify(BookEvent::Close);
            Self::trigger_cover(gui, true, false);
        } else {
            self.hide(guis);
        }
    }

    /// Jump to the spread holding `page`.
    ///
    /// Pages past the end render blank; they can be left backward.
    pub fn go_to_page<S: RenderSurface>(&mut self, page: usize, guis: &mut BookGuiRegistry<S>) {
        self.recalc(Some(page), guis);
        self.current_page = page & !1;
        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        if gui.presents(self.id) && gui.currently_open && self.showing {
            gui.turn.kill();
            self.render_spread(gui);
            self.update_corners(gui, None);
        }
    }

    pub fn set_page_turning_allowed<S: RenderSurface>(&mut self, allow: bool, guis: &mut BookGuiRegistry<S>) {
        self.allow_turning = allow;
        if let Some(gui) = guis.get_mut(&self.gui_name) {
            self.update_corners(gui, None);
        }
    }

    // ---------------------------------------------------------------
    // Navigation

    /// Flip forward one spread.
    pub fn next_page<S: RenderSurface>(&mut self, guis: &mut BookGuiRegistry<S>) {
        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        if gui.turn.is_turning() || !self.allow_turning || !self.showing {
            return;
        }

        let edit_has_more = self.editing
            && gui
                .edit
                .as_ref()
                .is_some_and(|chain| !chain.widget(EditSlot::Right).showing_end());
        if edit_has_more {
            self.current_page += 2;
            if let Some(chain) = gui.edit.as_mut() {
                chain.set_order(ChainOrder::Turning);
            }
        } else if self.paginator.last_page().is_none_or(|last| self.current_page + 2 <= last) {
            self.current_page += 2;
            self.links.clear();
            gui.surfaces.copy(PageSlot::Right, PageSlot::TurnFront);
            Self::move_movie_layers(gui, PageSlot::Right, PageSlot::TurnFront);
            let page = self.current_page;
            self.render_into(gui, page, PageSlot::TurnBack);
        } else {
            return;
        }

        gui.turn.begin(FlipDirection::Forward, gui.animator.as_mut());
        gui.dialog.play_turn_sound();
        self.notify(BookEvent::NextPage);
    }

    /// Flip back one spread, or close the cover from the first spread.
    pub fn previous_page<S: RenderSurface>(&mut self, guis: &mut BookGuiRegistry<S>) {
        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        if gui.turn.is_turning() || !self.allow_turning {
            return;
        }

        if self.editing && gui.edit.is_some() {
            let at_beginning = gui
                .edit
                .as_ref()
                .is_some_and(|chain| chain.widget(EditSlot::Left).showing_beginning());
            if at_beginning {
                self.close_on(gui);
                return;
            }
            if self.current_page >= 2 {
                self.current_page -= 2;
            }
            if let Some(chain) = gui.edit.as_mut() {
                let left = chain.widget_mut(EditSlot::Left);
                let start = left.first_visible_line() - (left.visible_line_count() - 1) * 2;
                left.set_global_start_line(start);
                chain.set_order(ChainOrder::Turning);
            }
        } else if self.current_page > 1 {
            self.current_page -= 2;
            self.links.clear();
            gui.surfaces.copy(PageSlot::Left, PageSlot::TurnBack);
            Self::move_movie_layers(gui, PageSlot::Left, PageSlot::TurnBack);
            let page = self.current_page + 1;
            self.render_into(gui, page, PageSlot::TurnFront);
        } else {
            self.close_on(gui);
            return;
        }

        gui.turn.begin(FlipDirection::Backward, gui.animator.as_mut());
        gui.dialog.play_turn_sound();
        self.notify(BookEvent::PreviousPage);
    }

    /// Deliver a host animation callback.
    pub fn handle_cue<S: RenderSurface>(&mut self, cue: AnimationCue, guis: &mut BookGuiRegistry<S>) {
        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        if !gui.presents(self.id) {
            debug!("book {:?} ignores {:?}; not presented", self.id, cue);
            return;
        }
        match cue {
            AnimationCue::CoverSettled { opened } => self.finish_show(opened, gui),
            AnimationCue::CoverClosed => self.hide(guis),
            AnimationCue::FlipBegin(direction) => {
                if gui.turn.accepts(direction) {
                    self.fill_uncovering_page(direction, gui);
                }
            }
            AnimationCue::FlipStop(direction) => {
                if gui.turn.finish(direction) {
                    self.finish_flip(direction, gui);
                } else {
                    warn!("stale {:?} flip stop ignored", direction);
                }
            }
        }
    }

    /// The flipping page starts to uncover the page underneath it.
    fn fill_uncovering_page<S: RenderSurface>(&mut self, direction: FlipDirection, gui: &mut BookGui<S>) {
        if gui.currently_open {
            gui.dialog.set_turn_page_visible(true);
        }
        let side = match direction {
            FlipDirection::Forward => PageSide::Right,
            FlipDirection::Backward => PageSide::Left,
        };
        if self.editing {
            if let Some(chain) = gui.edit.as_mut() {
                let (shown, underneath) = match direction {
                    FlipDirection::Forward => (EditSlot::TurnBack, EditSlot::Right),
                    FlipDirection::Backward => (EditSlot::TurnFront, EditSlot::Left),
                };
                for slot in [EditSlot::TurnFront, EditSlot::TurnBack, shown, underneath] {
                    let widget = chain.widget_mut(slot);
                    widget.set_visible(true);
                    widget.force_update();
                }
            }
        } else {
            let page = self.current_page + side.page_offset();
            self.render_into(gui, page, PageSlot::of_side(side));
        }
        self.update_corners(gui, Some(side));
    }

    fn finish_flip<S: RenderSurface>(&mut self, direction: FlipDirection, gui: &mut BookGui<S>) {
        if self.editing {
            if let Some(chain) = gui.edit.as_mut() {
                chain.set_order(ChainOrder::Resting);
                if direction == FlipDirection::Forward {
                    let line = chain.widget(EditSlot::Right).last_visible_line();
                    chain.widget_mut(EditSlot::Left).set_global_start_line(line);
                }
                chain.show_resting();
            }
        } else {
            match direction {
                FlipDirection::Backward => {
                    gui.surfaces.copy(PageSlot::TurnFront, PageSlot::Right);
                    let page = self.current_page;
                    self.render_into(gui, page, PageSlot::Left);
                    Self::move_movie_layers(gui, PageSlot::TurnFront, PageSlot::Right);
                }
                FlipDirection::Forward => {
                    gui.surfaces.copy(PageSlot::TurnBack, PageSlot::Left);
                    Self::move_movie_layers(gui, PageSlot::TurnBack, PageSlot::Left);
                    let page = self.current_page + 1;
                    self.render_into(gui, page, PageSlot::Right);
                }
            }
        }
        gui.dialog.set_turn_page_visible(false);
        self.update_corners(gui, None);
        gui.sfx.request_reset();
    }

    // ---------------------------------------------------------------
    // Input

    /// Chunk index of the link under `point` on `side`.
    pub fn find_visible_link<S: RenderSurface>(
        &self,
        side: PageSide,
        point: PagePoint,
        guis: &BookGuiRegistry<S>,
    ) -> Option<usize> {
        let gui = guis.get(&self.gui_name)?;
        let surface = gui.surface(PageSlot::of_side(side));
        let mut x = point.x * surface.width() as f32;
        let y = point.y * surface.height() as f32;
        if side == PageSide::Right {
            x += gui.surface(PageSlot::Left).width() as f32;
        }
        self.links.find(x as i32, y as i32).map(|link| link.chunk_index)
    }

    /// Cursor to show while the pointer rests (or drags, when `pressed`)
    /// over `point` on `side`.
    pub fn hover_cursor<S: RenderSurface>(
        &self,
        side: PageSide,
        point: PagePoint,
        pressed: bool,
        guis: &BookGuiRegistry<S>,
    ) -> PageCursor {
        let Some(gui) = guis.get(&self.gui_name) else {
            return PageCursor::Idle;
        };
        if !gui.presents(self.id) {
            return PageCursor::Idle;
        }
        let over_link = self.find_visible_link(side, point, guis).is_some();
        if pressed {
            return if over_link { PageCursor::Pressed } else { PageCursor::Idle };
        }
        if over_link {
            return PageCursor::Hand;
        }
        if !self.allow_turning || !self.showing {
            return PageCursor::Idle;
        }
        let (left, right) = self.turn_affordances(gui);
        match side {
            PageSide::Left if left => PageCursor::TurnLeft,
            PageSide::Right if right => PageCursor::TurnRight,
            _ => PageCursor::Idle,
        }
    }

    /// Handle a click on one page: links and checkboxes first, otherwise
    /// turn toward the clicked side.
    pub fn handle_click<S: RenderSurface>(&mut self, side: PageSide, point: PagePoint, guis: &mut BookGuiRegistry<S>) {
        let Some(gui) = guis.get(&self.gui_name) else {
            return;
        };
        if gui.is_turning() {
            return;
        }
        if let Some(index) = self.find_visible_link(side, point, guis) {
            let checkbox = self.chunks.get(index).and_then(Chunk::as_image).is_some_and(|img| img.is_checkbox());
            if checkbox {
                self.toggle_checkbox(index, side, guis);
            } else if let Some(event) = self.chunks.get(index).and_then(Chunk::link) {
                self.notify(BookEvent::ImageLink(event));
            }
            return;
        }
        match side {
            PageSide::Left => self.previous_page(guis),
            PageSide::Right => self.next_page(guis),
        }
    }

    fn toggle_checkbox<S: RenderSurface>(&mut self, index: usize, side: PageSide, guis: &mut BookGuiRegistry<S>) {
        let Some(image) = self.chunks.get_mut(index).and_then(Chunk::as_image_mut) else {
            return;
        };
        let event = image.link.unwrap_or_default();
        let ImageEffect::Checkbox(check) = &mut image.effect else {
            return;
        };
        let checked = check.toggle();

        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        let page = self.current_page + side.page_offset();
        self.render_into(gui, page, PageSlot::of_side(side));
        self.notify(if checked {
            BookEvent::ImageLink(event)
        } else {
            BookEvent::CheckUnchecked(event)
        });
        gui.sfx.add_side(side, gui.clock.as_mut());
    }

    /// Advance per-frame effects; call on every subscribed frame tick with
    /// the host time in seconds.
    pub fn tick<S: RenderSurface>(&mut self, now: f32, guis: &mut BookGuiRegistry<S>) {
        let Some(gui) = guis.get_mut(&self.gui_name) else {
            return;
        };
        if gui.sfx.sides().is_empty() || gui.turn.is_turning() || !gui.currently_open || !gui.presents(self.id) {
            return;
        }
        let Some((side, elapsed)) = gui.sfx.next_side(now) else {
            return;
        };
        let page = self.current_page + side.page_offset();
        let starts = self.paginator.page_starts();
        if starts.len() <= page + 1 {
            return;
        }
        let range = starts[page]..starts[page + 1];
        let still_want = animate_range(&mut self.chunks, range, elapsed, self.config.layout.checkbox_fade_step);

        self.render_into(gui, page, PageSlot::of_side(side));
        if !still_want {
            gui.sfx.remove_side(side, gui.clock.as_mut());
        }
    }
}

impl core::fmt::Debug for JournalBook {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JournalBook")
            .field("id", &self.id)
            .field("gui", &self.gui_name)
            .field("chunks", &self.chunks.len())
            .field("current_page", &self.current_page)
            .field("showing", &self.showing)
            .field("editing", &self.editing)
            .finish_non_exhaustive()
    }
}

//! Four linked edit widgets used when a book is editable.
//!
//! Text flows from one widget into the next. At rest the visible spread is
//! `Left -> Right` and the turn pages are a separate `TurnFront -> TurnBack`
//! pair; during a flip the chain becomes `Left -> TurnFront -> TurnBack ->
//! Right` so text stays continuous across the flipping page.

use journal_book::{EditStyleSink, FontStyle, PageMargins, Rgba};

/// Edit widget positions; tags mirror the GUI control ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditSlot {
    Left,
    Right,
    TurnFront,
    TurnBack,
}

impl EditSlot {
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::TurnFront, Self::TurnBack];

    /// GUI control tag of the widget.
    pub fn tag(self) -> u32 {
        match self {
            Self::Left => 120,
            Self::Right => 121,
            Self::TurnFront => 122,
            Self::TurnBack => 123,
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

/// Host multi-line edit control.
pub trait EditWidget: EditStyleSink {
    fn set_enabled(&mut self, enabled: bool);
    fn set_visible(&mut self, visible: bool);
    /// Full text of the chained buffer.
    fn buffer(&self) -> String;
    fn set_buffer(&mut self, text: &str);
    fn set_cursor(&mut self, position: usize);
    fn first_visible_line(&self) -> i32;
    fn last_visible_line(&self) -> i32;
    fn visible_line_count(&self) -> i32;
    /// Scroll the chain so this widget starts at `line` of the buffer.
    fn set_global_start_line(&mut self, line: i32);
    fn showing_beginning(&self) -> bool;
    fn showing_end(&self) -> bool;
    fn set_next(&mut self, next: Option<EditSlot>);
    fn set_prev(&mut self, prev: Option<EditSlot>);
    fn force_update(&mut self) {}
}

/// How the four widgets are linked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChainOrder {
    /// `Left -> Right` and `TurnFront -> TurnBack`.
    #[default]
    Resting,
    /// `Left -> TurnFront -> TurnBack -> Right`.
    Turning,
}

impl ChainOrder {
    /// `(widget, prev, next)` for every widget.
    pub fn links(self) -> [(EditSlot, Option<EditSlot>, Option<EditSlot>); 4] {
        use EditSlot::*;
        match self {
            Self::Resting => [
                (Left, None, Some(Right)),
                (Right, Some(Left), None),
                (TurnFront, None, Some(TurnBack)),
                (TurnBack, Some(TurnFront), None),
            ],
            Self::Turning => [
                (Left, None, Some(TurnFront)),
                (TurnFront, Some(Left), Some(TurnBack)),
                (TurnBack, Some(TurnFront), Some(Right)),
                (Right, Some(TurnBack), None),
            ],
        }
    }
}

pub struct EditChain {
    widgets: [Box<dyn EditWidget>; 4],
    order: ChainOrder,
}

impl EditChain {
    pub fn new(
        left: Box<dyn EditWidget>,
        right: Box<dyn EditWidget>,
        turn_front: Box<dyn EditWidget>,
        turn_back: Box<dyn EditWidget>,
    ) -> Self {
        let mut chain = Self {
            widgets: [left, right, turn_front, turn_back],
            order: ChainOrder::Resting,
        };
        chain.apply_order();
        chain
    }

    pub fn order(&self) -> ChainOrder {
        self.order
    }

    /// Relink every widget at once.
    pub fn set_order(&mut self, order: ChainOrder) {
        self.order = order;
        self.apply_order();
    }

    fn apply_order(&mut self) {
        for (slot, prev, next) in self.order.links() {
            let widget = &mut self.widgets[slot.index()];
            widget.set_prev(prev);
            widget.set_next(next);
        }
    }

    pub fn widget(&self, slot: EditSlot) -> &dyn EditWidget {
        self.widgets[slot.index()].as_ref()
    }

    pub fn widget_mut(&mut self, slot: EditSlot) -> &mut dyn EditWidget {
        self.widgets[slot.index()].as_mut()
    }

    /// Enable (or disable) editing on every widget.
    pub fn set_enabled(&mut self, enabled: bool) {
        for widget in &mut self.widgets {
            widget.set_enabled(enabled);
        }
    }

    /// Show only the resting spread.
    pub fn show_resting(&mut self) {
        for slot in EditSlot::ALL {
            let visible = matches!(slot, EditSlot::Left | EditSlot::Right);
            let widget = self.widget_mut(slot);
            widget.set_visible(visible);
            widget.force_update();
        }
    }

    pub fn hide_all(&mut self) {
        for widget in &mut self.widgets {
            widget.set_visible(false);
        }
    }

    fn each(&mut self, mut f: impl FnMut(&mut dyn EditWidget)) {
        for widget in &mut self.widgets {
            f(widget.as_mut());
        }
    }
}

impl core::fmt::Debug for EditChain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EditChain").field("order", &self.order).finish_non_exhaustive()
    }
}

impl EditStyleSink for EditChain {
    fn set_font_style(&mut self, style: FontStyle) {
        self.each(|w| w.set_font_style(style));
    }

    fn set_font_face(&mut self, face: &str) {
        self.each(|w| w.set_font_face(face));
    }

    fn set_font_size(&mut self, size: u16) {
        self.each(|w| w.set_font_size(size));
    }

    fn set_font_color(&mut self, color: Rgba) {
        self.each(|w| w.set_font_color(color));
    }

    fn set_margins(&mut self, margins: PageMargins) {
        self.each(|w| w.set_margins(margins));
    }
}

//! Text styling vocabulary shared by the compiler, the layout engine and
//! editable-text widgets.

use crate::color::Rgba;

/// Horizontal placement of a paragraph or flowing object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Parse an `align=` attribute value, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("left") {
            Some(Self::Left)
        } else if value.eq_ignore_ascii_case("center") {
            Some(Self::Center)
        } else if value.eq_ignore_ascii_case("right") {
            Some(Self::Right)
        } else {
            None
        }
    }
}

/// Font weight/slant selection from `<font style=..>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    /// `b`, `i` and `bi` select their variants; anything else is regular.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("b") {
            Self::Bold
        } else if value.eq_ignore_ascii_case("i") {
            Self::Italic
        } else if value.eq_ignore_ascii_case("bi") {
            Self::BoldItalic
        } else {
            Self::Regular
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }
}

/// Fully resolved font state at some point of the chunk sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct FontProps {
    pub face: String,
    pub size: u16,
    pub style: FontStyle,
    pub color: Rgba,
    pub line_spacing: i16,
}

impl Default for FontProps {
    fn default() -> Self {
        Self {
            face: "Arial".to_string(),
            size: 24,
            style: FontStyle::Regular,
            color: Rgba::BLACK,
            line_spacing: 0,
        }
    }
}

/// Page margins in canvas units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageMargins {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl PageMargins {
    pub const fn uniform(value: i32) -> Self {
        Self {
            top: value,
            left: value,
            bottom: value,
            right: value,
        }
    }
}

impl Default for PageMargins {
    fn default() -> Self {
        Self::uniform(16)
    }
}

/// Receiver for live style updates pushed while compiling an editable book.
///
/// Implemented by the editable-text widget chain; every method defaults to a
/// no-op so sinks only override what they track.
pub trait EditStyleSink {
    fn set_font_style(&mut self, _style: FontStyle) {}
    fn set_font_face(&mut self, _face: &str) {}
    fn set_font_size(&mut self, _size: u16) {}
    fn set_font_color(&mut self, _color: Rgba) {}
    fn set_margins(&mut self, _margins: PageMargins) {}
}

/// Sink that discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEditStyle;

impl EditStyleSink for NoEditStyle {}

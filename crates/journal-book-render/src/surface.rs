//! Drawing surface boundary and the shared greedy word-wrap routine.
//!
//! The paginator drives a [`RenderSurface`] for text measurement, text
//! drawing and image compositing. Backends supply glyph metrics through
//! [`GlyphMetrics`] and reuse [`wrap_text`] so measurement and drawing agree.

use journal_book::{Alignment, FontStyle, ImageAsset, Rgba};
use smallvec::SmallVec;

/// Horizontal justification of wrapped text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Justify {
    #[default]
    Left,
    Center,
    Right,
}

impl From<Alignment> for Justify {
    fn from(value: Alignment) -> Self {
        match value {
            Alignment::Left => Self::Left,
            Alignment::Center => Self::Center,
            Alignment::Right => Self::Right,
        }
    }
}

/// Result of measuring wrapped text inside a box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WrappedSize {
    /// Characters (not bytes) that fit inside the box.
    pub fitted_chars: usize,
    /// Pen x after the last fitted character, relative to the box left.
    pub last_x: i32,
    /// Baseline of the line holding the pen, relative to the box top.
    pub last_y: i32,
    /// Distance between consecutive line tops, spacing included.
    pub line_advance: i32,
}

/// How image pixels are combined with the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositeMode {
    /// Ignore source alpha; only the opacity applies.
    #[default]
    ForceOpaque,
    /// Blend using source alpha.
    CopySrcAlpha,
    /// Source alpha masks the copy; used for translucent and glowing images.
    MaskSrcAlpha,
    /// Blend and keep the result's alpha; used for tinted checkboxes.
    BlendWriteAlpha,
    /// Plain alpha blending.
    Blend,
}

/// Per-draw compositing parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeOptions {
    pub mode: CompositeMode,
    pub opacity: u8,
    /// Multiplied into source color channels.
    pub tint: Option<Rgba>,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            mode: CompositeMode::ForceOpaque,
            opacity: u8::MAX,
            tint: None,
        }
    }
}

/// Convert a `[0, 1]` opacity into a byte.
pub fn opacity_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Glyph metrics for the currently selected font.
pub trait GlyphMetrics {
    /// Horizontal advance of `ch`.
    fn advance(&self, ch: char) -> i32;
    /// Height of one line without extra spacing.
    fn line_height(&self) -> i32;
    /// Distance from line top to baseline.
    fn ascent(&self) -> i32;
}

/// Box and paragraph settings for [`wrap_text`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrapBox {
    pub max_width: i32,
    pub max_height: i32,
    /// Extra offset applied to the first line only.
    pub first_line_indent: i32,
    pub line_spacing: i32,
    pub justify: Justify,
}

/// One laid-out line of a wrapped paragraph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrappedLine {
    /// Character range `[start, end)` of the line, excluding any newline.
    pub start: usize,
    pub end: usize,
    /// Left edge of the ink, relative to the box.
    pub x: i32,
    /// Line top, relative to the box.
    pub top: i32,
    /// Ink width, trailing whitespace excluded.
    pub width: i32,
}

/// Wrapped paragraph: visible lines plus the pen state after them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WrappedText {
    pub lines: SmallVec<[WrappedLine; 8]>,
    pub size: WrappedSize,
}

/// Greedy word wrap of `chars` into `bounds`.
///
/// Lines break after the last space that fits, or mid-word when a single
/// word is wider than the line. `'\n'` forces a break. Wrapping stops at the
/// first line that would cross `max_height`; everything before it counts as
/// fitted.
pub fn wrap_text(chars: &[char], bounds: WrapBox, metrics: &dyn GlyphMetrics) -> WrappedText {
    let line_height = metrics.line_height().max(1);
    let ascent = metrics.ascent();
    let line_advance = (line_height + bounds.line_spacing).max(1);

    let mut lines = SmallVec::new();
    let mut idx = 0;
    let mut top = 0;
    let mut indent = bounds.first_line_indent.max(0);
    let mut last_x = indent;
    let mut last_top = 0;

    while idx < chars.len() {
        if top + line_height > bounds.max_height {
            break;
        }
        let avail = bounds.max_width - indent;

        let mut end = idx;
        let mut advance = 0;
        let mut last_break = None;
        while end < chars.len() {
            let ch = chars[end];
            if ch == '\n' {
                break;
            }
            let w = metrics.advance(ch);
            if advance + w > avail && !ch.is_whitespace() {
                break;
            }
            advance += w;
            end += 1;
            if ch == ' ' {
                last_break = Some(end);
            }
        }

        let forced = end < chars.len() && chars[end] == '\n';
        let (line_end, next) = if forced {
            (end, end + 1)
        } else if end >= chars.len() {
            (end, end)
        } else if let Some(brk) = last_break {
            (brk, brk)
        } else if end > idx {
            (end, end)
        } else if indent > 0 {
            // Nothing fits beside the indent; retry on a fresh line.
            indent = 0;
            top += line_advance;
            last_x = 0;
            last_top = top;
            continue;
        } else {
            (idx + 1, idx + 1)
        };

        let full: i32 = chars[idx..line_end].iter().map(|ch| metrics.advance(*ch)).sum();
        let trailing: i32 = chars[idx..line_end]
            .iter()
            .rev()
            .take_while(|ch| ch.is_whitespace())
            .map(|ch| metrics.advance(*ch))
            .sum();
        let ink = full - trailing;
        let x = match bounds.justify {
            Justify::Left => indent,
            Justify::Center => indent + (avail - ink) / 2,
            Justify::Right => bounds.max_width - ink,
        };
        lines.push(WrappedLine {
            start: idx,
            end: line_end,
            x,
            top,
            width: ink,
        });

        last_x = indent + full;
        last_top = top;
        idx = next;
        indent = 0;

        if forced {
            top += line_advance;
            last_x = 0;
            last_top = top;
        } else if idx < chars.len() {
            top += line_advance;
        }
    }

    WrappedText {
        lines,
        size: WrappedSize {
            fitted_chars: idx,
            last_x,
            last_y: last_top + ascent,
            line_advance,
        },
    }
}

/// Target the paginator draws a page into.
///
/// Coordinates are canvas units with the origin at the top-left corner.
pub trait RenderSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn set_font(&mut self, face: &str, size: u16, style: FontStyle);
    fn set_text_color(&mut self, color: Rgba);
    fn set_line_spacing(&mut self, spacing: i16);
    fn set_justify(&mut self, justify: Justify);
    /// Offset of the first wrapped line of the next measured/drawn string.
    fn set_first_line_indent(&mut self, indent: i32);
    /// Ascent of the current font.
    fn font_ascent(&self) -> i32;

    /// Measure `text` wrapped into a `max_width` by `max_height` box.
    fn calc_wrapped_size(&self, text: &str, max_width: i32, max_height: i32) -> WrappedSize;
    /// Draw `text` wrapped into the box whose top-left is `(x, y)`.
    fn draw_wrapped_string(&mut self, x: i32, y: i32, text: &str, max_width: i32, max_height: i32);

    /// Composite `image`, scaled to `size`, with its top-left at `(x, y)`.
    fn composite(
        &mut self,
        image: &dyn ImageAsset,
        x: i32,
        y: i32,
        size: (u32, u32),
        options: &CompositeOptions,
    );

    fn clear(&mut self, color: Rgba);
    /// Commit pending drawing.
    fn flush(&mut self);

    /// Replace this surface's content with `other`'s.
    fn copy_from(&mut self, other: &Self)
    where
        Self: Sized;
}

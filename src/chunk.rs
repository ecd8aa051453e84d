//! Compiled book content: one [`Chunk`] per markup unit, kept in an ordered
//! [`ChunkSequence`].

use core::ops::Index;

use crate::color::Rgba;
use crate::image::ImageHandle;
use crate::style::{Alignment, FontProps, FontStyle, PageMargins};

/// Where a visual object goes on the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Flows with the text cursor, aligned within the column.
    Flow(Alignment),
    /// Drawn at an absolute canvas position, outside the text flow.
    Floating { x: i32, y: i32 },
}

impl Placement {
    pub fn is_floating(self) -> bool {
        matches!(self, Self::Floating { .. })
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::Flow(Alignment::Left)
    }
}

/// How image pixels combine with the page underneath.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageBlend {
    #[default]
    Opaque,
    Alpha,
}

/// Triangle-wave opacity animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowEffect {
    /// Seconds per half wave.
    pub period: f32,
    pub min_opacity: f32,
    pub max_opacity: f32,
}

impl GlowEffect {
    /// Opacity `elapsed` seconds into the animation.
    ///
    /// Even half-periods fall from max to min, odd ones rise back.
    pub fn opacity_at(&self, elapsed: f32) -> f32 {
        if self.period <= 0.0 {
            return self.max_opacity;
        }
        let mut odd = false;
        let mut delta = elapsed.max(0.0);
        while delta > self.period {
            odd = !odd;
            delta -= self.period;
        }
        if odd {
            delta = self.period - delta;
        }
        self.max_opacity - (self.max_opacity - self.min_opacity) * (delta / self.period)
    }
}

/// Toggleable image tinted toward its on/off color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CheckboxEffect {
    pub on_color: Rgba,
    pub off_color: Rgba,
    pub checked: bool,
    /// Tint currently applied; fades toward [`target`](Self::target).
    pub current_color: Rgba,
}

impl CheckboxEffect {
    pub fn new(on_color: Rgba, off_color: Rgba, checked: bool) -> Self {
        let current_color = if checked { on_color } else { off_color };
        Self {
            on_color,
            off_color,
            checked,
            current_color,
        }
    }

    pub fn target(&self) -> Rgba {
        if self.checked {
            self.on_color
        } else {
            self.off_color
        }
    }

    /// Flip the checked state, returning the new value.
    pub fn toggle(&mut self) -> bool {
        self.checked = !self.checked;
        self.checked
    }

    pub fn is_settled(&self) -> bool {
        self.current_color == self.target()
    }
}

/// Per-frame effect attached to an image.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ImageEffect {
    #[default]
    None,
    Glow(GlowEffect),
    Checkbox(CheckboxEffect),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub alignment: Alignment,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, alignment: Alignment) -> Self {
        Self {
            text: text.into(),
            alignment,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ImageChunk {
    pub image: ImageHandle,
    pub placement: Placement,
    pub blend: ImageBlend,
    /// Event id delivered when the image is clicked.
    pub link: Option<u32>,
    /// Counter-scale against book size so the image keeps its pixel size.
    pub no_resize: bool,
    pub translucent: bool,
    pub opacity: f32,
    pub effect: ImageEffect,
}

impl ImageChunk {
    pub fn new(image: ImageHandle) -> Self {
        Self {
            image,
            placement: Placement::default(),
            blend: ImageBlend::Opaque,
            link: None,
            no_resize: false,
            translucent: false,
            opacity: 1.0,
            effect: ImageEffect::None,
        }
    }

    pub fn is_checkbox(&self) -> bool {
        matches!(self.effect, ImageEffect::Checkbox(_))
    }

    /// Whether the image has a link rectangle (clickable or toggleable).
    pub fn is_linkable(&self) -> bool {
        self.link.is_some()
    }

    /// Whether per-frame effects still have work to do for this image.
    pub fn needs_sfx(&self) -> bool {
        match &self.effect {
            ImageEffect::None => false,
            ImageEffect::Glow(_) => true,
            ImageEffect::Checkbox(check) => !check.is_settled(),
        }
    }
}

impl PartialEq for ImageChunk {
    fn eq(&self, other: &Self) -> bool {
        std::sync::Arc::ptr_eq(&self.image, &other.image)
            && self.placement == other.placement
            && self.blend == other.blend
            && self.link == other.link
            && self.no_resize == other.no_resize
            && self.translucent == other.translucent
            && self.opacity == other.opacity
            && self.effect == other.effect
    }
}

/// Font change; each property is optional and resolved by backward scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontChange {
    pub face: Option<String>,
    pub size: Option<u16>,
    pub style: Option<FontStyle>,
    pub color: Option<Rgba>,
    pub line_spacing: Option<i16>,
}

/// Margin change; unspecified sides keep their previous value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarginChange {
    pub top: Option<i32>,
    pub left: Option<i32>,
    pub bottom: Option<i32>,
    pub right: Option<i32>,
}

impl MarginChange {
    /// Overlay the specified sides onto `base`.
    pub fn apply(&self, base: PageMargins) -> PageMargins {
        PageMargins {
            top: self.top.unwrap_or(base.top),
            left: self.left.unwrap_or(base.left),
            bottom: self.bottom.unwrap_or(base.bottom),
            right: self.right.unwrap_or(base.right),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DecalChunk {
    pub image: ImageHandle,
    pub placement: Placement,
    pub no_resize: bool,
    /// Tint with the cover color.
    pub tint: bool,
}

impl PartialEq for DecalChunk {
    fn eq(&self, other: &Self) -> bool {
        std::sync::Arc::ptr_eq(&self.image, &other.image)
            && self.placement == other.placement
            && self.no_resize == other.no_resize
            && self.tint == other.tint
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MovieChunk {
    /// Movie asset name.
    pub name: String,
    /// Ordinal among all movie tags of the source; pairs with `name` as the
    /// cache key.
    pub movie_index: u8,
    pub placement: Placement,
    pub link: Option<u32>,
    pub no_resize: bool,
    pub on_cover: bool,
    pub looping: bool,
}

impl MovieChunk {
    pub fn new(name: impl Into<String>, movie_index: u8) -> Self {
        Self {
            name: name.into(),
            movie_index,
            placement: Placement::default(),
            link: None,
            no_resize: false,
            on_cover: false,
            looping: true,
        }
    }
}

/// Discriminant of a [`Chunk`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    Paragraph,
    Image,
    PageBreak,
    FontChange,
    Margin,
    Decal,
    Movie,
    Editable,
}

/// One unit of compiled content.
#[derive(Clone, Debug, PartialEq)]
pub enum Chunk {
    Paragraph(Paragraph),
    Image(ImageChunk),
    PageBreak,
    FontChange(FontChange),
    Margin(MarginChange),
    Decal(DecalChunk),
    Movie(MovieChunk),
    /// Marks the book as editable; occupies no space.
    Editable,
}

impl Chunk {
    pub fn kind(&self) -> ChunkKind {
        match self {
            Self::Paragraph(_) => ChunkKind::Paragraph,
            Self::Image(_) => ChunkKind::Image,
            Self::PageBreak => ChunkKind::PageBreak,
            Self::FontChange(_) => ChunkKind::FontChange,
            Self::Margin(_) => ChunkKind::Margin,
            Self::Decal(_) => ChunkKind::Decal,
            Self::Movie(_) => ChunkKind::Movie,
            Self::Editable => ChunkKind::Editable,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Self::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageChunk> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageChunk> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Event id delivered when this chunk's link rectangle is clicked.
    pub fn link(&self) -> Option<u32> {
        match self {
            Self::Image(image) => image.link,
            Self::Movie(movie) => movie.link,
            _ => None,
        }
    }
}

/// Ordered, growable chunk storage.
///
/// Only the compiler appends; only the paginator inserts (when splitting an
/// overflowing paragraph).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkSequence {
    chunks: Vec<Chunk>,
}

impl ChunkSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Chunk> {
        self.chunks.get_mut(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    pub fn as_slice(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn push(&mut self, chunk: Chunk) {
        self.chunks.push(chunk);
    }

    /// Alignment of the most recent paragraph, or left if there is none.
    pub fn last_paragraph_alignment(&self) -> Alignment {
        self.chunks
            .iter()
            .rev()
            .find_map(Chunk::as_paragraph)
            .map(|paragraph| paragraph.alignment)
            .unwrap_or_default()
    }

    /// Split the paragraph at `index` after its first `at_char` characters.
    ///
    /// The remainder becomes a new paragraph with the same alignment,
    /// inserted immediately after. Returns `false` (and changes nothing) if
    /// `index` is not a paragraph or `at_char` is not strictly inside it.
    pub fn split_paragraph(&mut self, index: usize, at_char: usize) -> bool {
        let Some(Chunk::Paragraph(paragraph)) = self.chunks.get_mut(index) else {
            return false;
        };
        if at_char == 0 {
            return false;
        }
        let Some((byte, _)) = paragraph.text.char_indices().nth(at_char) else {
            return false;
        };
        let remainder = paragraph.text.split_off(byte);
        let alignment = paragraph.alignment;
        self.chunks.insert(
            index + 1,
            Chunk::Paragraph(Paragraph::new(remainder, alignment)),
        );
        true
    }

    /// Resolve font properties in effect at `index`.
    ///
    /// Walks backward from `index` (inclusive); the most recent font change
    /// wins per property, independently. Properties never set fall back to
    /// `defaults`. An out-of-range index or empty sequence yields `defaults`.
    pub fn font_props_at(&self, index: usize, defaults: &FontProps) -> FontProps {
        let mut face = None;
        let mut size = None;
        let mut style = None;
        let mut color = None;
        let mut line_spacing = None;

        if index < self.chunks.len() {
            for chunk in self.chunks[..=index].iter().rev() {
                if let Chunk::FontChange(change) = chunk {
                    if face.is_none() {
                        face = change.face.as_deref().filter(|f| !f.is_empty());
                    }
                    if size.is_none() {
                        size = change.size.filter(|s| *s > 0);
                    }
                    style = style.or(change.style);
                    color = color.or(change.color);
                    line_spacing = line_spacing.or(change.line_spacing);
                }
                if face.is_some()
                    && size.is_some()
                    && style.is_some()
                    && color.is_some()
                    && line_spacing.is_some()
                {
                    break;
                }
            }
        }

        FontProps {
            face: face.map_or_else(|| defaults.face.clone(), str::to_string),
            size: size.unwrap_or(defaults.size),
            style: style.unwrap_or(defaults.style),
            color: color.unwrap_or(defaults.color),
            line_spacing: line_spacing.unwrap_or(defaults.line_spacing),
        }
    }

    /// Resolve page margins in effect at `index`, per side, by backward scan.
    pub fn margins_at(&self, index: usize, defaults: PageMargins) -> PageMargins {
        let mut resolved = MarginChange::default();
        let end = index.saturating_add(1).min(self.chunks.len());
        for chunk in self.chunks[..end].iter().rev() {
            if let Chunk::Margin(change) = chunk {
                resolved.top = resolved.top.or(change.top);
                resolved.left = resolved.left.or(change.left);
                resolved.bottom = resolved.bottom.or(change.bottom);
                resolved.right = resolved.right.or(change.right);
                if resolved.top.is_some()
                    && resolved.left.is_some()
                    && resolved.bottom.is_some()
                    && resolved.right.is_some()
                {
                    break;
                }
            }
        }
        resolved.apply(defaults)
    }
}

impl Index<usize> for ChunkSequence {
    type Output = Chunk;

    fn index(&self, index: usize) -> &Chunk {
        &self.chunks[index]
    }
}

impl From<Vec<Chunk>> for ChunkSequence {
    fn from(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }
}

impl<'a> IntoIterator for &'a ChunkSequence {
    type Item = &'a Chunk;
    type IntoIter = core::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn par(text: &str, alignment: Alignment) -> Chunk {
        Chunk::Paragraph(Paragraph::new(text, alignment))
    }

    fn font(change: FontChange) -> Chunk {
        Chunk::FontChange(change)
    }

    #[test]
    fn split_then_concat_reproduces_text() {
        let original = "Die Reise beginnt hier, am Ufer.";
        for k in 1..original.chars().count() {
            let mut seq = ChunkSequence::from(vec![par(original, Alignment::Right)]);
            assert!(seq.split_paragraph(0, k));
            let first = seq[0].as_paragraph().map(|p| p.text.clone()).unwrap_or_default();
            let second = seq[1].as_paragraph().map(|p| p.text.clone()).unwrap_or_default();
            assert_eq!(first.chars().count(), k);
            assert_eq!(format!("{first}{second}"), original);
            assert_eq!(seq[1].as_paragraph().map(|p| p.alignment), Some(Alignment::Right));
        }
    }

    #[test]
    fn split_handles_multibyte_text() {
        let mut seq = ChunkSequence::from(vec![par("über€", Alignment::Left)]);
        assert!(seq.split_paragraph(0, 1));
        assert_eq!(seq[0].as_paragraph().map(|p| p.text.as_str()), Some("ü"));
        assert_eq!(seq[1].as_paragraph().map(|p| p.text.as_str()), Some("ber€"));
    }

    #[test]
    fn split_rejects_edges_and_non_paragraphs() {
        let mut seq = ChunkSequence::from(vec![par("abc", Alignment::Left), Chunk::PageBreak]);
        assert!(!seq.split_paragraph(0, 0));
        assert!(!seq.split_paragraph(0, 3));
        assert!(!seq.split_paragraph(1, 1));
        assert!(!seq.split_paragraph(9, 1));
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn font_props_resolve_per_property_most_recent_first() {
        let seq = ChunkSequence::from(vec![
            font(FontChange {
                face: Some("Sharper".into()),
                size: Some(18),
                color: Some(Rgba::WHITE),
                ..FontChange::default()
            }),
            par("a", Alignment::Left),
            font(FontChange {
                size: Some(12),
                style: Some(FontStyle::Italic),
                ..FontChange::default()
            }),
            par("b", Alignment::Left),
        ]);
        let defaults = FontProps::default();

        let at_end = seq.font_props_at(3, &defaults);
        assert_eq!(at_end.face, "Sharper");
        assert_eq!(at_end.size, 12);
        assert_eq!(at_end.style, FontStyle::Italic);
        assert_eq!(at_end.color, Rgba::WHITE);
        assert_eq!(at_end.line_spacing, 0);

        let at_start = seq.font_props_at(1, &defaults);
        assert_eq!(at_start.size, 18);
        assert_eq!(at_start.style, FontStyle::Regular);
    }

    #[test]
    fn font_props_fall_back_to_defaults_when_empty() {
        let seq = ChunkSequence::new();
        assert_eq!(seq.font_props_at(0, &FontProps::default()), FontProps::default());
        assert_eq!(seq.font_props_at(7, &FontProps::default()).face, "Arial");
    }

    #[test]
    fn margins_resolve_per_side() {
        let seq = ChunkSequence::from(vec![
            Chunk::Margin(MarginChange {
                top: Some(40),
                left: Some(30),
                ..MarginChange::default()
            }),
            par("x", Alignment::Left),
            Chunk::Margin(MarginChange {
                left: Some(10),
                ..MarginChange::default()
            }),
        ]);
        let m = seq.margins_at(2, PageMargins::default());
        assert_eq!(m, PageMargins { top: 40, left: 10, bottom: 16, right: 16 });
        let early = seq.margins_at(1, PageMargins::default());
        assert_eq!(early.left, 30);
    }

    #[test]
    fn glow_is_a_triangle_wave() {
        let glow = GlowEffect {
            period: 2.0,
            min_opacity: 0.0,
            max_opacity: 1.0,
        };
        assert_eq!(glow.opacity_at(0.0), 1.0);
        assert_eq!(glow.opacity_at(1.0), 0.5);
        assert_eq!(glow.opacity_at(2.0), 0.0);
        assert_eq!(glow.opacity_at(3.0), 0.5);
        assert_eq!(glow.opacity_at(4.0), 1.0);
    }

    #[test]
    fn last_alignment_defaults_left() {
        let mut seq = ChunkSequence::new();
        assert_eq!(seq.last_paragraph_alignment(), Alignment::Left);
        seq.push(par("x", Alignment::Center));
        seq.push(Chunk::PageBreak);
        assert_eq!(seq.last_paragraph_alignment(), Alignment::Center);
    }
}

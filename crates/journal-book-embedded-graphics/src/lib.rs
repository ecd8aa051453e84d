//! embedded-graphics page surfaces for `journal-book-render`.
//!
//! [`EgSurface`] implements [`RenderSurface`] over an ARGB [`PageCanvas`]:
//! text goes through embedded-graphics mono fonts, images are composited in
//! software with nearest-neighbour scaling.

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

use core::convert::Infallible;
use std::borrow::Cow;

use embedded_graphics::{
    mono_font::{
        ascii::{
            FONT_10X20, FONT_6X13_BOLD, FONT_6X13_ITALIC, FONT_6X9, FONT_7X13_ITALIC, FONT_7X14,
            FONT_7X14_BOLD, FONT_8X13, FONT_8X13_BOLD, FONT_8X13_ITALIC, FONT_9X18, FONT_9X18_BOLD,
        },
        MonoFont, MonoTextStyle,
    },
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text},
};
use journal_book::{FontStyle, ImageAsset, ImageHandle, Rgba};
use journal_book_render::{
    wrap_text, CompositeMode, CompositeOptions, GlyphMetrics, Justify, PageSurfaces, RenderSurface, WrapBox,
    WrappedSize,
};
use log::{debug, trace};

// ---------------------------------------------------------------------------
// Fonts

/// Mono font size classes; requested point sizes snap down to one of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
    Xl,
}

impl SizeBucket {
    pub fn for_size(size: u16) -> Self {
        if size >= 24 {
            Self::Xl
        } else if size >= 20 {
            Self::Large
        } else if size >= 16 {
            Self::Medium
        } else {
            Self::Small
        }
    }
}

/// Mono font used for `size` and `style`.
///
/// Bold italic falls back to bold; the largest bucket has no italic and
/// uses the regular 9x18 face.
pub fn mono_font_for(size: u16, style: FontStyle) -> &'static MonoFont<'static> {
    match (SizeBucket::for_size(size), style) {
        (SizeBucket::Small, FontStyle::Regular) => &FONT_6X9,
        (SizeBucket::Small, FontStyle::Italic) => &FONT_6X13_ITALIC,
        (SizeBucket::Small, FontStyle::Bold | FontStyle::BoldItalic) => &FONT_6X13_BOLD,
        (SizeBucket::Medium, FontStyle::Regular) => &FONT_7X14,
        (SizeBucket::Medium, FontStyle::Italic) => &FONT_7X13_ITALIC,
        (SizeBucket::Medium, FontStyle::Bold | FontStyle::BoldItalic) => &FONT_7X14_BOLD,
        (SizeBucket::Large, FontStyle::Regular) => &FONT_8X13,
        (SizeBucket::Large, FontStyle::Italic) => &FONT_8X13_ITALIC,
        (SizeBucket::Large, FontStyle::Bold | FontStyle::BoldItalic) => &FONT_8X13_BOLD,
        (SizeBucket::Xl, FontStyle::Regular) => &FONT_10X20,
        (SizeBucket::Xl, FontStyle::Italic) => &FONT_9X18,
        (SizeBucket::Xl, FontStyle::Bold | FontStyle::BoldItalic) => &FONT_9X18_BOLD,
    }
}

/// [`GlyphMetrics`] of a mono font: every glyph has the same advance.
#[derive(Clone, Copy)]
pub struct MonoMetrics {
    font: &'static MonoFont<'static>,
}

impl MonoMetrics {
    pub fn new(size: u16, style: FontStyle) -> Self {
        Self {
            font: mono_font_for(size, style),
        }
    }

    pub fn font(&self) -> &'static MonoFont<'static> {
        self.font
    }
}

impl core::fmt::Debug for MonoMetrics {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MonoMetrics")
            .field("character_size", &self.font.character_size)
            .field("baseline", &self.font.baseline)
            .finish()
    }
}

impl GlyphMetrics for MonoMetrics {
    fn advance(&self, _ch: char) -> i32 {
        (self.font.character_size.width + self.font.character_spacing) as i32
    }

    fn line_height(&self) -> i32 {
        self.font.character_size.height as i32
    }

    fn ascent(&self) -> i32 {
        self.font.baseline as i32
    }
}

/// Map typographic characters the ASCII mono fonts lack onto look-alikes.
///
/// The mapping is one char to one char so measured and drawn widths agree.
fn normalize_for_mono(text: &str) -> Cow<'_, str> {
    let mapped = |ch: char| match ch {
        '\u{00A0}' => Some(' '),
        '\u{2010}'..='\u{2015}' => Some('-'),
        '\u{2018}' | '\u{2019}' | '\u{201B}' => Some('\''),
        '\u{201C}' | '\u{201D}' | '\u{201F}' => Some('"'),
        '\u{2022}' => Some('*'),
        _ => None,
    };
    if !text.chars().any(|ch| mapped(ch).is_some()) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.chars().map(|ch| mapped(ch).unwrap_or(ch)).collect())
}

// ---------------------------------------------------------------------------
// Canvas

/// Owned ARGB framebuffer for one page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PageCanvas {
    /// Fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed `0xAARRGGBB` pixels, row-major.
    pub fn argb(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        self.index(x, y).map(|index| Rgba::from_argb32(self.pixels[index]))
    }

    pub fn fill(&mut self, color: Rgba) {
        self.pixels.fill(color.to_argb32());
    }

    /// Number of pixels equal to `color` once packed.
    pub fn count_color(&self, color: Rgba) -> usize {
        let packed = color.to_argb32();
        self.pixels.iter().filter(|&&p| p == packed).count()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl OriginDimensions for PageCanvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for PageCanvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(index) = self.index(point.x, point.y) {
                self.pixels[index] = 0xff00_0000
                    | (u32::from(color.r()) << 16)
                    | (u32::from(color.g()) << 8)
                    | u32::from(color.b());
            }
        }
        Ok(())
    }
}

fn to_rgb888(color: Rgba) -> Rgb888 {
    let packed = color.to_argb32();
    Rgb888::new((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
}

/// Mix `src` over `dst` with coverage `alpha`.
///
/// With `write_alpha` the result takes `alpha` as its own alpha instead of
/// accumulating over the destination.
fn blend(dst: Rgba, src: Rgba, alpha: f32, write_alpha: bool) -> Rgba {
    let mix = |d: f32, s: f32| d + (s - d) * alpha;
    Rgba::new(
        mix(dst.r, src.r),
        mix(dst.g, src.g),
        mix(dst.b, src.b),
        if write_alpha {
            alpha
        } else {
            alpha + dst.a * (1.0 - alpha)
        },
    )
}

// ---------------------------------------------------------------------------
// Surface

/// [`RenderSurface`] drawing into a [`PageCanvas`].
#[derive(Clone)]
pub struct EgSurface {
    canvas: PageCanvas,
    face: String,
    size: u16,
    style: FontStyle,
    color: Rgba,
    line_spacing: i16,
    justify: Justify,
    first_line_indent: i32,
    flushes: usize,
}

impl EgSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: PageCanvas::new(width, height),
            face: "Arial".to_string(),
            size: 24,
            style: FontStyle::Regular,
            color: Rgba::BLACK,
            line_spacing: 0,
            justify: Justify::Left,
            first_line_indent: 0,
            flushes: 0,
        }
    }

    pub fn canvas(&self) -> &PageCanvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut PageCanvas {
        &mut self.canvas
    }

    /// Requested face; mono fonts render every face alike.
    pub fn face(&self) -> &str {
        &self.face
    }

    pub fn metrics(&self) -> MonoMetrics {
        MonoMetrics::new(self.size, self.style)
    }

    /// Number of [`RenderSurface::flush`] calls so far.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    fn wrap_box(&self, max_width: i32, max_height: i32) -> WrapBox {
        WrapBox {
            max_width,
            max_height,
            first_line_indent: self.first_line_indent,
            line_spacing: i32::from(self.line_spacing),
            justify: self.justify,
        }
    }
}

impl core::fmt::Debug for EgSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EgSurface")
            .field("width", &self.canvas.width)
            .field("height", &self.canvas.height)
            .field("face", &self.face)
            .field("size", &self.size)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

impl RenderSurface for EgSurface {
    fn width(&self) -> u32 {
        self.canvas.width
    }

    fn height(&self) -> u32 {
        self.canvas.height
    }

    fn set_font(&mut self, face: &str, size: u16, style: FontStyle) {
        if face != self.face {
            debug!("font face '{}' rendered with the built-in mono font", face);
            self.face = face.to_string();
        }
        self.size = size;
        self.style = style;
    }

    fn set_text_color(&mut self, color: Rgba) {
        self.color = color;
    }

    fn set_line_spacing(&mut self, spacing: i16) {
        self.line_spacing = spacing;
    }

    fn set_justify(&mut self, justify: Justify) {
        self.justify = justify;
    }

    fn set_first_line_indent(&mut self, indent: i32) {
        self.first_line_indent = indent;
    }

    fn font_ascent(&self) -> i32 {
        self.metrics().ascent()
    }

    fn calc_wrapped_size(&self, text: &str, max_width: i32, max_height: i32) -> WrappedSize {
        let chars: Vec<char> = text.chars().collect();
        wrap_text(&chars, self.wrap_box(max_width, max_height), &self.metrics()).size
    }

    fn draw_wrapped_string(&mut self, x: i32, y: i32, text: &str, max_width: i32, max_height: i32) {
        let text = normalize_for_mono(text);
        let chars: Vec<char> = text.chars().collect();
        let metrics = self.metrics();
        let wrapped = wrap_text(&chars, self.wrap_box(max_width, max_height), &metrics);
        let style = MonoTextStyle::new(metrics.font(), to_rgb888(self.color));

        for line in &wrapped.lines {
            let run: String = chars[line.start..line.end].iter().collect();
            let origin = Point::new(x + line.x, y + line.top);
            let Ok(_) = Text::with_baseline(run.trim_end(), origin, style, Baseline::Top).draw(&mut self.canvas);
        }
    }

    fn composite(
        &mut self,
        image: &dyn ImageAsset,
        x: i32,
        y: i32,
        size: (u32, u32),
        options: &CompositeOptions,
    ) {
        let (width, height) = size;
        let (src_w, src_h) = (image.width(), image.height());
        if width == 0 || height == 0 || src_w == 0 || src_h == 0 {
            return;
        }
        let opacity = f32::from(options.opacity) / 255.0;
        let write_alpha = matches!(options.mode, CompositeMode::MaskSrcAlpha | CompositeMode::BlendWriteAlpha);

        for dy in 0..height {
            let sy = (u64::from(dy) * u64::from(src_h) / u64::from(height)) as u32;
            for dx in 0..width {
                let Some(index) = self.canvas.index(x + dx as i32, y + dy as i32) else {
                    continue;
                };
                let sx = (u64::from(dx) * u64::from(src_w) / u64::from(width)) as u32;
                let Some(mut src) = image.pixel(sx, sy) else {
                    continue;
                };
                if let Some(tint) = options.tint {
                    src.r *= tint.r;
                    src.g *= tint.g;
                    src.b *= tint.b;
                }
                let alpha = match options.mode {
                    CompositeMode::ForceOpaque => opacity,
                    _ if src.a <= 0.0 => continue,
                    _ => src.a * opacity,
                };
                let dst = Rgba::from_argb32(self.canvas.pixels[index]);
                self.canvas.pixels[index] = blend(dst, src, alpha, write_alpha).to_argb32();
            }
        }
    }

    fn clear(&mut self, color: Rgba) {
        self.canvas.fill(color);
    }

    fn flush(&mut self) {
        self.flushes += 1;
        trace!("surface flush #{}", self.flushes);
    }

    fn copy_from(&mut self, other: &Self) {
        self.canvas.clone_from(&other.canvas);
    }
}

/// The four page surfaces of a book GUI, all `width` by `height`.
pub fn page_surfaces(width: u32, height: u32) -> PageSurfaces<EgSurface> {
    PageSurfaces::from_fn(|_| EgSurface::new(width, height))
}

// ---------------------------------------------------------------------------
// Bitmaps

/// Error returned when building a [`Bitmap`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BitmapError {
    InvalidDimensions,
    PixelCountMismatch { expected: usize, actual: usize },
    Decode(String),
}

impl core::fmt::Display for BitmapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidDimensions => write!(f, "bitmap dimensions must be non-zero"),
            Self::PixelCountMismatch { expected, actual } => {
                write!(f, "bitmap expects {} pixels, got {}", expected, actual)
            }
            Self::Decode(msg) => write!(f, "bitmap decode error: {}", msg),
        }
    }
}

impl std::error::Error for BitmapError {}

/// Decoded ARGB image usable as a book image asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    name: String,
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Bitmap {
    /// Build from row-major `0xAARRGGBB` pixels.
    pub fn from_argb32(
        name: impl Into<String>,
        width: u32,
        height: u32,
        pixels: Vec<u32>,
    ) -> Result<Self, BitmapError> {
        if width == 0 || height == 0 {
            return Err(BitmapError::InvalidDimensions);
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(BitmapError::PixelCountMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            width,
            height,
            pixels,
        })
    }

    /// Decode an encoded PNG, JPEG, GIF or WebP image.
    #[cfg(not(target_os = "espidf"))]
    pub fn decode(name: impl Into<String>, bytes: &[u8]) -> Result<Self, BitmapError> {
        let rgba = image::load_from_memory(bytes)
            .map_err(|err| BitmapError::Decode(err.to_string()))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = rgba
            .pixels()
            .map(|px| {
                let [r, g, b, a] = px.0;
                u32::from_be_bytes([a, r, g, b])
            })
            .collect();
        Self::from_argb32(name, width, height, pixels)
    }

    /// Snapshot a rendered page, e.g. to reuse it as a cover layer.
    pub fn from_canvas(name: impl Into<String>, canvas: &PageCanvas) -> Self {
        Self {
            name: name.into(),
            width: canvas.width,
            height: canvas.height,
            pixels: canvas.pixels.clone(),
        }
    }

    pub fn handle(self) -> ImageHandle {
        std::sync::Arc::new(self)
    }
}

impl ImageAsset for Bitmap {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .map(|&argb| Rgba::from_argb32(argb))
    }
}

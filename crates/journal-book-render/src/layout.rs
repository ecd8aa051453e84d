//! Lazy pagination of a chunk sequence onto fixed-size pages.
//!
//! Page `p` covers chunks `[page_starts[p], page_starts[p + 1])`. Starts are
//! discovered by rendering pages in order; rendering page `p` first makes
//! sure every earlier page has been laid out. Paragraphs that overflow the
//! column are split in place, so the chunk sequence grows as pages are
//! discovered.

use journal_book::{
    Alignment, Chunk, ChunkSequence, FontProps, ImageAsset, ImageBlend, ImageChunk, ImageEffect,
    MovieChunk, Placement, Rgba,
};
use log::{debug, trace, warn};
use smallvec::SmallVec;

use crate::config::LayoutConfig;
use crate::gui::PageSlot;
use crate::links::{LinkRect, PageSide, VisibleLink};
use crate::movies::{MovieCache, MovieHost};
use crate::surface::{opacity_byte, CompositeMode, CompositeOptions, Justify, RenderSurface};

/// Movie cache and host used while laying out movie chunks.
pub struct MovieBinding<'a> {
    pub cache: &'a mut MovieCache,
    pub host: &'a mut dyn MovieHost,
}

/// Where and how a page is rendered.
pub struct RenderTarget<'a> {
    pub surface: &'a mut dyn RenderSurface,
    pub slot: PageSlot,
    /// Lay out (and discover page starts) without touching the surface.
    pub suppress_draw: bool,
    pub movies: Option<MovieBinding<'a>>,
}

/// Outcome of rendering one page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageRender {
    /// Whether the page exists (is not past the known end).
    pub rendered: bool,
    /// Links drawn on this page, in spread coordinates.
    pub links: SmallVec<[VisibleLink; 4]>,
    /// At least one drawn image still has per-frame effects to run.
    pub needs_sfx: bool,
}

/// Book-size scale factors used to counter-scale no-resize objects.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BookScale {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug)]
pub struct Paginator {
    config: LayoutConfig,
    page_starts: Vec<usize>,
    last_page: Option<usize>,
    scale: BookScale,
}

impl Paginator {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            page_starts: vec![0],
            last_page: None,
            scale: BookScale::default(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Known page starts; always begins with `0`.
    pub fn page_starts(&self) -> &[usize] {
        &self.page_starts
    }

    /// Last page index, once the end of the content has been reached.
    pub fn last_page(&self) -> Option<usize> {
        self.last_page
    }

    /// Forget every discovered page.
    pub fn reset(&mut self) {
        self.page_starts.clear();
        self.page_starts.push(0);
        self.last_page = None;
    }

    /// Pin the last page (editing mode shows a single spread).
    pub fn fix_last_page(&mut self, page: usize) {
        self.last_page = Some(page);
    }

    pub fn set_book_scale(&mut self, scale: BookScale) {
        self.scale = scale;
    }

    /// Whether `page` may exist: not past the known end.
    pub fn page_may_exist(&self, page: usize) -> bool {
        self.last_page.is_none_or(|last| page <= last)
    }

    /// Lay out pages without drawing until `up_to` (or the end when `None`)
    /// has a known start.
    pub fn recalc(&mut self, up_to: Option<usize>, chunks: &mut ChunkSequence, target: &mut RenderTarget<'_>) {
        let up_to = up_to.unwrap_or(usize::MAX);
        let mut page = self.page_starts.len().saturating_sub(1);
        while page < up_to && self.page_may_exist(page) {
            self.layout_page(page, chunks, target, true);
            page += 1;
        }
    }

    /// Render `page` into `target`, discovering earlier pages first.
    pub fn render_page(&mut self, page: usize, chunks: &mut ChunkSequence, target: &mut RenderTarget<'_>) -> PageRender {
        self.recalc(Some(page), chunks, target);
        let suppress = target.suppress_draw;
        self.layout_page(page, chunks, target, suppress)
    }

    fn layout_page(
        &mut self,
        page: usize,
        chunks: &mut ChunkSequence,
        target: &mut RenderTarget<'_>,
        suppress: bool,
    ) -> PageRender {
        let mut out = PageRender::default();
        if !suppress {
            target.surface.clear(Rgba::TRANSPARENT);
            if let Some(movies) = target.movies.as_mut() {
                movies.host.detach_all(target.slot);
            }
        }

        if self.page_may_exist(page) && page < self.page_starts.len() {
            out.rendered = true;
            self.layout_chunks(page, chunks, target, suppress, &mut out);
        }

        if !suppress {
            target.surface.flush();
        }
        out
    }

    fn layout_chunks(
        &mut self,
        page: usize,
        chunks: &mut ChunkSequence,
        target: &mut RenderTarget<'_>,
        suppress: bool,
        out: &mut PageRender,
    ) {
        let cw = self.config.canvas_width;
        let ch = self.config.canvas_height;
        let start = self.page_starts[page];
        let mut margins = chunks.margins_at(start, self.config.default_margins());
        let font = chunks.font_props_at(start, &self.config.default_font());
        apply_font(target.surface, &font);

        let mut x = margins.left;
        let mut y = margins.top;
        let mut justify: Option<Justify> = None;
        // Top of the next line while a left-aligned paragraph left its last
        // line partially filled.
        let mut open_line: Option<i32> = None;
        let mut idx = start;

        while y < ch - margins.top - margins.bottom && idx < chunks.len() {
            if self.page_starts.len() > page + 1 && idx == self.page_starts[page + 1] {
                break;
            }

            match &chunks[idx] {
                Chunk::Paragraph(paragraph) => {
                    let next_justify = Justify::from(paragraph.alignment);
                    if justify != Some(next_justify) {
                        if let Some(next_top) = open_line.take() {
                            y = next_top;
                        }
                        x = margins.left;
                        justify = Some(next_justify);
                    }
                    target.surface.set_justify(next_justify);
                    target.surface.set_first_line_indent(x - margins.left);

                    let width = cw - margins.left - margins.right;
                    let height = ch - margins.bottom - y;
                    let size = target.surface.calc_wrapped_size(&paragraph.text, width, height);

                    if size.fitted_chars == 0 {
                        y += ch;
                        if idx > start {
                            break;
                        }
                        idx += 1;
                        continue;
                    }

                    let total = paragraph.text.chars().count();
                    if !suppress {
                        let fitted: String = paragraph.text.chars().take(size.fitted_chars).collect();
                        target.surface.draw_wrapped_string(margins.left, y, &fitted, width, height);
                    }

                    if size.fitted_chars < total {
                        if chunks.split_paragraph(idx, size.fitted_chars) {
                            debug!("page {} splits chunk {} after {} chars", page, idx, size.fitted_chars);
                        }
                        self.page_starts.truncate(page + 1);
                        y += ch;
                        idx += 1;
                        break;
                    }

                    let pen_top = y + size.last_y - target.surface.font_ascent();
                    if size.last_x == 0 {
                        x = margins.left;
                        y = pen_top;
                        open_line = None;
                    } else if next_justify == Justify::Left {
                        x = margins.left + size.last_x;
                        y = pen_top;
                        open_line = Some(pen_top + size.line_advance);
                    } else {
                        x = margins.left;
                        y = pen_top + size.line_advance;
                        open_line = None;
                    }
                }

                Chunk::Image(image) => {
                    if image.needs_sfx() {
                        out.needs_sfx = true;
                    }
                    let (w, h) = (image.image.width() as i32, image.image.height() as i32);
                    let pos = match image.placement {
                        Placement::Floating { x: fx, y: fy } => (fx, fy),
                        Placement::Flow(alignment) => {
                            if let Some(next_top) = open_line.take() {
                                y = next_top;
                                x = margins.left;
                            }
                            if y + h >= ch - margins.bottom && idx > start {
                                y += h;
                                break;
                            }
                            let fx = flow_x(alignment, w, cw, margins.left, margins.right);
                            let pos = (fx, y);
                            y += h;
                            x = margins.left;
                            pos
                        }
                    };
                    let options = image_options(image);
                    let drawn = self.draw_object(target, &*image.image, pos, image.no_resize, &options, suppress);
                    if image.is_linkable() {
                        out.links.push(VisibleLink {
                            chunk_index: idx,
                            side: target.slot.link_side(),
                            rect: drawn,
                        });
                    }
                }

                Chunk::Decal(decal) => {
                    let (w, h) = (decal.image.width() as i32, decal.image.height() as i32);
                    let pos = match decal.placement {
                        Placement::Floating { x: fx, y: fy } => (fx, fy),
                        Placement::Flow(alignment) => {
                            if let Some(next_top) = open_line.take() {
                                y = next_top;
                            }
                            if y + h >= ch - margins.bottom && idx > start {
                                y += h;
                                break;
                            }
                            let pos = (flow_x(alignment, w, cw, margins.left, margins.right), y);
                            y += h;
                            x = margins.left;
                            pos
                        }
                    };
                    let options = CompositeOptions {
                        mode: CompositeMode::CopySrcAlpha,
                        ..CompositeOptions::default()
                    };
                    self.draw_object(target, &*decal.image, pos, decal.no_resize, &options, suppress);
                }

                Chunk::PageBreak => {
                    let redundant = idx == start && idx > 0 && !matches!(chunks[idx - 1], Chunk::PageBreak);
                    if !redundant {
                        y = ch - margins.top - margins.bottom;
                        x = margins.left;
                    }
                }

                Chunk::FontChange(_) => {
                    let font = chunks.font_props_at(idx, &self.config.default_font());
                    apply_font(target.surface, &font);
                }

                Chunk::Margin(change) => {
                    margins = change.apply(margins);
                }

                Chunk::Movie(movie) => {
                    let Some(movies) = target.movies.as_mut() else {
                        idx += 1;
                        continue;
                    };
                    let Some(layer) = movies.cache.get_or_open(movie, &mut *movies.host) else {
                        idx += 1;
                        continue;
                    };
                    if layer.width == 0 || layer.height == 0 {
                        idx += 1;
                        continue;
                    }
                    let (w, h) = (layer.width as i32, layer.height as i32);
                    let pos = match movie.placement {
                        Placement::Floating { x: fx, y: fy } => (fx, fy),
                        Placement::Flow(alignment) => {
                            if let Some(next_top) = open_line.take() {
                                y = next_top;
                            }
                            if y + h >= ch - margins.bottom && idx > start {
                                y += h;
                                break;
                            }
                            let pos = (flow_x(alignment, w, cw, margins.left, margins.right), y);
                            y += h;
                            x = margins.left;
                            pos
                        }
                    };
                    let rect = self.place_movie(target, movie, pos, (layer.width, layer.height), suppress);
                    if movie.link.is_some() {
                        out.links.push(VisibleLink {
                            chunk_index: idx,
                            side: target.slot.link_side(),
                            rect,
                        });
                    }
                }

                Chunk::Editable => {}
            }
            idx += 1;
        }

        if self.page_starts.len() <= page + 1 {
            self.page_starts.resize(page + 2, idx);
        }
        self.page_starts[page + 1] = idx;
        if idx >= chunks.len() {
            self.last_page = Some(page);
        } else if idx == start {
            warn!("page {} cannot place chunk {}; ending the book there", page, idx);
            self.last_page = Some(page);
        }
        trace!("page {} spans chunks [{}, {})", page, start, idx);
    }

    /// Size and position after counter-scaling a no-resize object.
    fn no_resize_geometry(&self, surface: &dyn RenderSurface, pos: (i32, i32), size: (u32, u32)) -> ((i32, i32), (u32, u32)) {
        let x_scale = if self.scale.width == 0.0 {
            1.0
        } else {
            1.0 / (1.0 - self.scale.width)
        };
        let mut y_scale = if self.scale.height == 0.0 {
            1.0
        } else {
            1.0 / (1.0 - self.scale.height)
        };
        y_scale *= self.config.no_resize_aspect;

        let surface_w = surface.width();
        let surface_h = surface.height();
        let w = ((size.0 as f32 * x_scale).round() as u32).min(surface_w);
        let h = ((size.1 as f32 * y_scale).round() as u32).min(surface_h);

        let x = recenter(pos.0, size.0, w, surface_w);
        let y = recenter(pos.1, size.1, h, surface_h);
        ((x, y), (w, h))
    }

    fn draw_object(
        &self,
        target: &mut RenderTarget<'_>,
        image: &dyn ImageAsset,
        pos: (i32, i32),
        no_resize: bool,
        options: &CompositeOptions,
        suppress: bool,
    ) -> LinkRect {
        let natural = (image.width(), image.height());
        let ((x, y), size) = if no_resize {
            self.no_resize_geometry(&*target.surface, pos, natural)
        } else {
            (pos, natural)
        };
        if suppress {
            return LinkRect::EMPTY;
        }
        target.surface.composite(image, x, y, size, options);
        self.spread_rect(target, x, y, size)
    }

    fn place_movie(
        &self,
        target: &mut RenderTarget<'_>,
        movie: &MovieChunk,
        pos: (i32, i32),
        natural: (u32, u32),
        suppress: bool,
    ) -> LinkRect {
        let ((x, y), size) = if movie.no_resize {
            self.no_resize_geometry(&*target.surface, pos, natural)
        } else {
            (pos, natural)
        };
        if suppress {
            return LinkRect::EMPTY;
        }
        if let Some(movies) = target.movies.as_mut() {
            movies.host.place(movie, target.slot, x, y);
        }
        self.spread_rect(target, x, y, size)
    }

    fn spread_rect(&self, target: &RenderTarget<'_>, x: i32, y: i32, size: (u32, u32)) -> LinkRect {
        let offset = match target.slot.link_side() {
            PageSide::Left => 0,
            PageSide::Right => target.surface.width() as i32,
        };
        LinkRect::new(x + offset, y, size.0 as i32, size.1 as i32)
    }
}

fn apply_font(surface: &mut dyn RenderSurface, font: &FontProps) {
    surface.set_font(&font.face, font.size, font.style);
    surface.set_text_color(font.color);
    surface.set_line_spacing(font.line_spacing);
}

fn flow_x(alignment: Alignment, w: i32, cw: i32, left: i32, right: i32) -> i32 {
    match alignment {
        Alignment::Left => left,
        Alignment::Right => cw - right - w,
        Alignment::Center => cw / 2 - w / 2,
    }
}

/// Keep an object centered on its original box after resizing, clamped to
/// the surface.
fn recenter(pos: i32, old: u32, new: u32, limit: u32) -> i32 {
    let (old, new, limit) = (old as i32, new as i32, limit as i32);
    if new < old {
        let shifted = pos + (old - new) / 2;
        if shifted + new > limit {
            limit - new
        } else {
            shifted
        }
    } else {
        let shift = (new - old) / 2;
        if shift > pos {
            0
        } else {
            pos - shift
        }
    }
}

fn image_options(image: &ImageChunk) -> CompositeOptions {
    let alpha = image.blend == ImageBlend::Alpha;
    match &image.effect {
        ImageEffect::Checkbox(check) => CompositeOptions {
            mode: if alpha {
                CompositeMode::Blend
            } else {
                CompositeMode::BlendWriteAlpha
            },
            opacity: opacity_byte(check.current_color.a),
            tint: Some(check.current_color),
        },
        ImageEffect::Glow(_) => CompositeOptions {
            mode: if alpha {
                CompositeMode::Blend
            } else {
                CompositeMode::MaskSrcAlpha
            },
            opacity: opacity_byte(image.opacity),
            tint: None,
        },
        ImageEffect::None => CompositeOptions {
            mode: if image.translucent {
                CompositeMode::MaskSrcAlpha
            } else if alpha {
                CompositeMode::CopySrcAlpha
            } else {
                CompositeMode::ForceOpaque
            },
            opacity: opacity_byte(image.opacity),
            tint: None,
        },
    }
}

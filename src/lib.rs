//! # journal-book
//!
//! Compiler and content model for paged journal books written in esHTML, a
//! small tag dialect (`<p>`, `<img>`, `<pb>`, `<font>`, `<margin>`,
//! `<cover>`, `<book>`, `<decal>`, `<movie>`, `<editable>`).
//!
//! Compiling yields an ordered [`ChunkSequence`] plus [`BookSettings`].
//! Pagination, rendering and page turning live in `journal-book-render`.
//!
//! ```
//! use journal_book::{compile, Alignment, Chunk, NoImages};
//!
//! let book = compile("<p align=center>Hello</p><pb><p>World</p>", &NoImages);
//! assert_eq!(book.chunks.len(), 3);
//! assert_eq!(book.chunks[1], Chunk::PageBreak);
//! assert_eq!(
//!     book.chunks[2].as_paragraph().map(|p| p.alignment),
//!     Some(Alignment::Center)
//! );
//! ```

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

pub mod chunk;
pub mod color;
pub mod compiler;
pub mod image;
pub mod markup;
pub mod style;

pub use chunk::{
    CheckboxEffect, Chunk, ChunkKind, ChunkSequence, DecalChunk, FontChange, GlowEffect,
    ImageBlend, ImageChunk, ImageEffect, MarginChange, MovieChunk, Paragraph, Placement,
};
pub use color::Rgba;
pub use compiler::{compile, BookSettings, CompiledBook, CoverDecal, MarkupCompiler};
pub use image::{
    ImageAsset, ImageHandle, ImageLibrary, ImageLookup, NoImages, SolidImage,
    SHARED_IMAGE_LOCATION,
};
pub use markup::{Attribute, TagKind};
pub use style::{Alignment, EditStyleSink, FontProps, FontStyle, NoEditStyle, PageMargins};

//! Clickable rectangles of the currently displayed spread.

use smallvec::SmallVec;

/// Which half of an open book.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageSide {
    Left,
    Right,
}

impl PageSide {
    /// Page offset from the spread's left page.
    pub fn page_offset(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// Axis-aligned rectangle in spread coordinates.
///
/// Spread coordinates place the right page directly after the left page's
/// width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl LinkRect {
    /// Rectangle recorded for chunks laid out without drawing; never hit.
    pub const EMPTY: Self = Self {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Half-open containment test.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// A linkable chunk as drawn on one side of the spread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibleLink {
    pub chunk_index: usize,
    pub side: PageSide,
    pub rect: LinkRect,
}

/// Visible links of the current spread.
///
/// Each side's entries are replaced wholesale whenever that side is
/// re-rendered, so repeated renders of the same page never accumulate
/// duplicates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkRegistry {
    entries: SmallVec<[VisibleLink; 8]>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[VisibleLink] {
        &self.entries
    }

    /// Drop every entry of `side` and append `links` in their place.
    pub fn replace_side<I>(&mut self, side: PageSide, links: I)
    where
        I: IntoIterator<Item = VisibleLink>,
    {
        self.entries.retain(|link| link.side != side);
        self.entries.extend(links.into_iter().filter(|link| link.side == side));
    }

    /// First link containing the spread point `(x, y)`.
    pub fn find(&self, x: i32, y: i32) -> Option<&VisibleLink> {
        self.entries.iter().find(|link| link.rect.contains(x, y))
    }

    /// Entry for `chunk_index`, if it is visible.
    pub fn for_chunk(&self, chunk_index: usize) -> Option<&VisibleLink> {
        self.entries.iter().find(|link| link.chunk_index == chunk_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(chunk_index: usize, side: PageSide, rect: LinkRect) -> VisibleLink {
        VisibleLink {
            chunk_index,
            side,
            rect,
        }
    }

    #[test]
    fn containment_is_half_open() {
        let rect = LinkRect::new(10, 10, 5, 5);
        assert!(rect.contains(10, 10));
        assert!(rect.contains(14, 14));
        assert!(!rect.contains(15, 10));
        assert!(!LinkRect::EMPTY.contains(0, 0));
    }

    #[test]
    fn replacing_a_side_is_idempotent() {
        let mut registry = LinkRegistry::new();
        let left = [link(3, PageSide::Left, LinkRect::new(0, 0, 10, 10))];
        let right = [link(7, PageSide::Right, LinkRect::new(520, 0, 10, 10))];
        registry.replace_side(PageSide::Left, left);
        registry.replace_side(PageSide::Right, right);
        registry.replace_side(PageSide::Left, left);
        registry.replace_side(PageSide::Left, left);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find(525, 5).map(|l| l.chunk_index), Some(7));
        assert_eq!(registry.find(5, 5).map(|l| l.chunk_index), Some(3));
        assert!(registry.find(100, 100).is_none());
    }

    #[test]
    fn replace_ignores_links_for_the_other_side() {
        let mut registry = LinkRegistry::new();
        registry.replace_side(
            PageSide::Left,
            [
                link(1, PageSide::Left, LinkRect::new(0, 0, 1, 1)),
                link(2, PageSide::Right, LinkRect::new(0, 0, 1, 1)),
            ],
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.for_chunk(2).is_none());
    }
}

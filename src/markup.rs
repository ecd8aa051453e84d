//! esHTML tokenizer: tag recognition, attribute scanning and value
//! conversion.
//!
//! The scanner walks an immutable character buffer by index. It never fails;
//! anything it cannot make sense of is left for the caller to treat as text
//! or skipped up to the next `>`.

use smallvec::SmallVec;

use crate::color::Rgba;

/// Recognized tag names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagKind {
    Paragraph,
    Image,
    PageBreak,
    Font,
    Margin,
    Cover,
    Book,
    Decal,
    Movie,
    Editable,
}

impl TagKind {
    pub const ALL: [TagKind; 10] = [
        TagKind::Paragraph,
        TagKind::Image,
        TagKind::PageBreak,
        TagKind::Font,
        TagKind::Margin,
        TagKind::Cover,
        TagKind::Book,
        TagKind::Decal,
        TagKind::Movie,
        TagKind::Editable,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Paragraph => "p",
            Self::Image => "img",
            Self::PageBreak => "pb",
            Self::Font => "font",
            Self::Margin => "margin",
            Self::Cover => "cover",
            Self::Book => "book",
            Self::Decal => "decal",
            Self::Movie => "movie",
            Self::Editable => "editable",
        }
    }
}

/// One `name=value` pair from inside a tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Case-insensitive value comparison.
    pub fn value_is(&self, value: &str) -> bool {
        self.value.eq_ignore_ascii_case(value)
    }
}

/// Attribute list of a single tag; tags rarely carry more than a handful.
pub type Attributes = SmallVec<[Attribute; 6]>;

enum AttributeStep {
    Attribute(Attribute),
    /// `>` consumed.
    End,
    /// Malformed attribute or unterminated tag; cursor left in place.
    Malformed,
}

/// Index-based cursor over the source characters.
#[derive(Clone, Debug)]
pub struct Scanner<'a> {
    src: &'a [char],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a [char]) -> Self {
        Self { src, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    /// Consume one character.
    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn char_at(&self, index: usize) -> Option<char> {
        self.src.get(index).copied()
    }

    fn matches_name_at(&self, start: usize, name: &str) -> bool {
        let mut index = start;
        for expected in name.chars() {
            match self.char_at(index) {
                Some(ch) if ch.eq_ignore_ascii_case(&expected) => index += 1,
                _ => return false,
            }
        }
        true
    }

    /// Tag opening at the cursor, if any.
    ///
    /// The name match is a case-insensitive prefix match that must be
    /// followed by `>` or a space, so `<pb>` is not mistaken for `<p`.
    pub fn tag_here(&self) -> Option<TagKind> {
        if self.peek() != Some('<') {
            return None;
        }
        TagKind::ALL.into_iter().find(|kind| {
            let name = kind.name();
            self.matches_name_at(self.pos + 1, name)
                && matches!(self.char_at(self.pos + 1 + name.len()), Some('>' | ' '))
        })
    }

    /// Length of a `</name>` closing tag of a known tag at the cursor.
    pub fn closing_tag_here(&self) -> Option<usize> {
        if self.peek() != Some('<') || self.char_at(self.pos + 1) != Some('/') {
            return None;
        }
        TagKind::ALL.into_iter().find_map(|kind| {
            let name = kind.name();
            let after = self.pos + 2 + name.len();
            if !self.matches_name_at(self.pos + 2, name) {
                return None;
            }
            let mut end = after;
            while self.char_at(end) == Some(' ') {
                end += 1;
            }
            (self.char_at(end) == Some('>')).then_some(end + 1 - self.pos)
        })
    }

    /// Step past `<` and the tag name of `kind`.
    pub fn enter_tag(&mut self, kind: TagKind) {
        self.pos = (self.pos + 1 + kind.name().len()).min(self.src.len());
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(' ') {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.pos += 1;
        }
        self.src[start..self.pos].iter().collect()
    }

    fn next_attribute(&mut self) -> AttributeStep {
        self.skip_spaces();
        if self.peek() == Some('>') {
            self.pos += 1;
            return AttributeStep::End;
        }

        let name_start = self.pos;
        let name = self.take_while(|ch| !matches!(ch, '>' | ' ' | '='));
        if self.peek() != Some('=') {
            self.pos = name_start;
            return AttributeStep::Malformed;
        }
        self.pos += 1;

        self.skip_spaces();
        match self.peek() {
            None | Some('>') => AttributeStep::Malformed,
            Some('"') => {
                self.pos += 1;
                let value = self.take_while(|ch| !matches!(ch, '>' | '"'));
                if self.peek() == Some('"') {
                    self.pos += 1;
                }
                AttributeStep::Attribute(Attribute { name, value })
            }
            Some(_) => {
                let value = self.take_while(|ch| !matches!(ch, ' ' | '>'));
                AttributeStep::Attribute(Attribute { name, value })
            }
        }
    }

    /// Read attributes up to and including the closing `>`.
    ///
    /// A malformed attribute ends the tag: the cursor skips past the next
    /// `>` (or to the end of input) so the delimiters are always consumed.
    pub fn attributes(&mut self) -> Attributes {
        let mut attrs = Attributes::new();
        loop {
            match self.next_attribute() {
                AttributeStep::Attribute(attr) => attrs.push(attr),
                AttributeStep::End => break,
                AttributeStep::Malformed => {
                    while let Some(ch) = self.bump() {
                        if ch == '>' {
                            break;
                        }
                    }
                    break;
                }
            }
        }
        attrs
    }
}

/// Leading decimal integer, `0` if there is none.
pub fn parse_int(value: &str) -> i32 {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let mut result: i64 = 0;
    for digit in digits.chars().map_while(|ch| ch.to_digit(10)) {
        result = (result * 10 + i64::from(digit)).min(i64::from(i32::MAX) + 1);
    }
    let signed = if negative { -result } else { result };
    signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Leading decimal float, `0.0` if there is none.
pub fn parse_float(value: &str) -> f32 {
    let trimmed = value.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (index, ch) in trimmed.char_indices() {
        match ch {
            '+' | '-' if index == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = index + ch.len_utf8();
    }
    if !seen_digit {
        return 0.0;
    }
    trimmed[..end].parse().unwrap_or(0.0)
}

/// Leading hexadecimal number (optional `0x`), stopping at the first
/// non-hex character.
pub fn parse_hex_prefix(value: &str) -> u32 {
    let trimmed = value.trim_start();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    digits
        .chars()
        .map_while(|ch| ch.to_digit(16))
        .fold(0u32, |acc, digit| acc.wrapping_shl(4) | digit)
}

/// Hexadecimal where every character occupies a nibble; non-hex characters
/// count as zero.
pub fn parse_hex_lenient(value: &str) -> u32 {
    value
        .chars()
        .fold(0u32, |acc, ch| acc.wrapping_shl(4) | ch.to_digit(16).unwrap_or(0))
}

/// Opaque `RRGGBB` color, as used by `color=` and `tint=`.
pub fn opaque_color(value: &str) -> Rgba {
    Rgba::from_argb32(parse_hex_prefix(value) | 0xff00_0000)
}

/// `RRGGBB` or `AARRGGBB` color; six digits or fewer get full alpha.
pub fn checkbox_color(value: &str) -> Rgba {
    let mut argb = parse_hex_lenient(value);
    if value.chars().count() <= 6 {
        argb |= 0xff00_0000;
    }
    Rgba::from_argb32(argb)
}

/// `X,Y` pair; a missing `Y` is zero.
pub fn parse_point(value: &str) -> (i32, i32) {
    match value.split_once(',') {
        Some((x, y)) => (parse_int(x), parse_int(y)),
        None => (parse_int(value), 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn tag_detection_requires_delimiter() {
        let src = chars("<pb>");
        assert_eq!(Scanner::new(&src).tag_here(), Some(TagKind::PageBreak));
        let src = chars("<P align=left>");
        assert_eq!(Scanner::new(&src).tag_here(), Some(TagKind::Paragraph));
        let src = chars("<pre>");
        assert_eq!(Scanner::new(&src).tag_here(), None);
        let src = chars("<img");
        assert_eq!(Scanner::new(&src).tag_here(), None);
        let src = chars("x<p>");
        assert_eq!(Scanner::new(&src).tag_here(), None);
    }

    #[test]
    fn closing_tags_of_known_names_are_measured() {
        let src = chars("</p>rest");
        assert_eq!(Scanner::new(&src).closing_tag_here(), Some(4));
        let src = chars("</FONT >");
        assert_eq!(Scanner::new(&src).closing_tag_here(), Some(8));
        let src = chars("</b>");
        assert_eq!(Scanner::new(&src).closing_tag_here(), None);
    }

    #[test]
    fn attributes_accept_quoted_and_bare_values() {
        let src = chars("<img src=\"Big Map\"  align=center link=12>tail");
        let mut scanner = Scanner::new(&src);
        scanner.enter_tag(TagKind::Image);
        let attrs = scanner.attributes();
        assert_eq!(
            attrs.as_slice(),
            &[
                Attribute::new("src", "Big Map"),
                Attribute::new("align", "center"),
                Attribute::new("link", "12"),
            ]
        );
        assert_eq!(scanner.peek(), Some('t'));
    }

    #[test]
    fn unterminated_quote_stops_at_tag_end() {
        let src = chars("<font face=\"Nick>x");
        let mut scanner = Scanner::new(&src);
        scanner.enter_tag(TagKind::Font);
        let attrs = scanner.attributes();
        assert_eq!(attrs.as_slice(), &[Attribute::new("face", "Nick")]);
        assert_eq!(scanner.peek(), Some('x'));
    }

    #[test]
    fn malformed_attribute_skips_to_tag_end() {
        let src = chars("<img bogus size=3>after");
        let mut scanner = Scanner::new(&src);
        scanner.enter_tag(TagKind::Image);
        assert!(scanner.attributes().is_empty());
        assert_eq!(scanner.peek(), Some('a'));

        let src = chars("<font size=>after");
        let mut scanner = Scanner::new(&src);
        scanner.enter_tag(TagKind::Font);
        assert!(scanner.attributes().is_empty());
        assert_eq!(scanner.peek(), Some('a'));

        let src = chars("<pb");
        let mut scanner = Scanner::new(&src);
        scanner.enter_tag(TagKind::PageBreak);
        assert!(scanner.attributes().is_empty());
        assert!(scanner.is_at_end());
    }

    #[test]
    fn numeric_conversions_take_leading_prefix() {
        assert_eq!(parse_int("42px"), 42);
        assert_eq!(parse_int("-7"), -7);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_float("0.75"), 0.75);
        assert_eq!(parse_float("1.5,2"), 1.5);
        assert_eq!(parse_float("."), 0.0);
        assert_eq!(parse_hex_prefix("ff8000"), 0x00ff_8000);
        assert_eq!(parse_hex_prefix("12zz"), 0x12);
        assert_eq!(parse_hex_lenient("1z"), 0x10);
        assert_eq!(parse_point("10,-4"), (10, -4));
        assert_eq!(parse_point("10"), (10, 0));
    }

    #[test]
    fn checkbox_colors_force_alpha_only_when_missing() {
        assert_eq!(checkbox_color("ff0000").to_argb32(), 0xffff_0000);
        assert_eq!(checkbox_color("80ff0000").to_argb32(), 0x80ff_0000);
        assert_eq!(opaque_color("00ff00").to_argb32(), 0xff00_ff00);
    }
}

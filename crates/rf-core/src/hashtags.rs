//! # Hashtag Tokenizer
//!
//! Splits post text into literal runs and hashtags. A hashtag is `#` followed
//! by one or more ASCII word characters (`[A-Za-z0-9_]`) or Hangul syllables.
//! Segments borrow from the input, and concatenating them in order gives back
//! the original text.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Text,
    Hashtag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment<'a> {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    pub content: &'a str,
}

impl<'a> Segment<'a> {
    /// Tag name without the leading `#`, or `None` for text segments.
    pub fn tag(&self) -> Option<&'a str> {
        match self.kind {
            SegmentKind::Hashtag => self.content.strip_prefix('#'),
            SegmentKind::Text => None,
        }
    }
}

const HANGUL_SYLLABLES: std::ops::RangeInclusive<char> = '\u{AC00}'..='\u{D7A3}';

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || HANGUL_SYLLABLES.contains(&c)
}

/// Tokenizes `text` into alternating text and hashtag segments.
pub fn parse_hashtags(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((hash_at, c)) = chars.next() {
        if c != '#' {
            continue;
        }

        let body_start = hash_at + 1;
        let mut end = body_start;
        while let Some(&(idx, next)) = chars.peek() {
            if !is_tag_char(next) {
                break;
            }
            end = idx + next.len_utf8();
            chars.next();
        }

        // A bare `#` stays part of the surrounding text.
        if end == body_start {
            continue;
        }

        if hash_at > text_start {
            segments.push(Segment { kind: SegmentKind::Text, content: &text[text_start..hash_at] });
        }
        segments.push(Segment { kind: SegmentKind::Hashtag, content: &text[hash_at..end] });
        text_start = end;
    }

    if text_start < text.len() {
        segments.push(Segment { kind: SegmentKind::Text, content: &text[text_start..] });
    }
    segments
}

/// Tag names (without `#`) in order of appearance.
pub fn hashtags(text: &str) -> Vec<&str> {
    parse_hashtags(text).iter().filter_map(Segment::tag).collect()
}

//! Overlapping character-window segmentation.
//!
//! Text is walked in windows of at most `max_size` characters. Every segment after the first
//! starts exactly `overlap` characters before the end of the previous one, so neighbours share
//! context and dropping the first `overlap` characters of each later segment reconstructs the
//! input. Inside a window the end prefers the last whitespace in its back half, so words are
//! rarely cut, while each step still advances by at least one character.
//!
//! Sizes are counted in Unicode scalar values, not bytes.

use super::types::ChunkingError;

/// Validated segment size and overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    max_size: usize,
    overlap: usize,
}

impl ChunkConfig {
    /// Validate `max_size` and `overlap`; both must be positive and `overlap < max_size`.
    pub fn new(max_size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        if max_size == 0 || overlap == 0 || overlap >= max_size {
            return Err(ChunkingError::InvalidConfig { max_size, overlap });
        }
        Ok(Self { max_size, overlap })
    }

    /// Maximum segment length in characters.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Characters shared by adjacent segments.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazily segment `text`.
    pub fn segments<'a>(&self, text: &'a str) -> Segments<'a> {
        Segments {
            text,
            config: *self,
            byte: 0,
            char: 0,
            index: 0,
            done: text.is_empty(),
        }
    }

    /// Shortest segment end (in characters) accepted when snapping to whitespace.
    fn min_snap_end(&self) -> usize {
        (self.overlap + 1).max(self.max_size / 2)
    }
}

/// One bounded window of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Zero-based position in the segment sequence.
    pub index: usize,
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset one past the last character.
    pub end: usize,
    /// Segment contents.
    pub text: &'a str,
}

/// Lazy, finite sequence of [`Segment`]s; clone it to restart from the current position.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    config: ChunkConfig,
    byte: usize,
    char: usize,
    index: usize,
    done: bool,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.byte..];
        let max_size = self.config.max_size;
        let min_snap = self.config.min_snap_end();
        let mut window_end = None;
        let mut last_break = None;

        for (count, (offset, ch)) in rest.char_indices().enumerate() {
            if count == max_size {
                window_end = Some(offset);
                break;
            }
            if ch.is_whitespace() && count + 1 >= min_snap {
                last_break = Some((count + 1, offset + ch.len_utf8()));
            }
        }

        let index = self.index;
        self.index += 1;

        let Some(hard_end) = window_end else {
            self.done = true;
            let length = rest.chars().count();
            return Some(Segment {
                index,
                start: self.char,
                end: self.char + length,
                text: rest,
            });
        };

        let (length, byte_len) = last_break.unwrap_or((max_size, hard_end));
        let piece = &rest[..byte_len];
        let segment = Segment {
            index,
            start: self.char,
            end: self.char + length,
            text: piece,
        };

        let overlap_start = piece
            .char_indices()
            .rev()
            .nth(self.config.overlap - 1)
            .map(|(offset, _)| offset)
            .unwrap_or(0);
        self.byte += overlap_start;
        self.char += length - self.config.overlap;

        Some(segment)
    }
}

/// Validate the parameters and segment `text`.
///
/// Empty input yields an empty sequence; input no longer than `max_size` yields one segment
/// equal to the input.
pub fn chunk(text: &str, max_size: usize, overlap: usize) -> Result<Segments<'_>, ChunkingError> {
    Ok(ChunkConfig::new(max_size, overlap)?.segments(text))
}

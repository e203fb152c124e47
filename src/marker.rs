//! Stateless marker detection over a growing text buffer.
//!
//! All offsets and lengths are byte offsets into the buffer. Matched prefixes are always cut at
//! `char` boundaries, so every value returned here can be used to slice the buffer directly.

/// A complete start marker: `start_pattern`, a language tag, and the closing `]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartMarkerInfo<'a> {
    /// Where the first occurrence of the start pattern begins.
    pub start_index: usize,
    /// First `]` at or after the end of the start pattern.
    pub closing_bracket_index: usize,
    /// Text strictly between the start pattern and the closing bracket. May be empty.
    pub language: &'a str,
}

impl StartMarkerInfo<'_> {
    /// Offset of the first byte after the closing bracket.
    pub fn end_index(&self) -> usize {
        self.closing_bracket_index + 1
    }
}

/// Result of [`find_start_marker_unguarded`].
///
/// `start_index` is `None` when the start pattern does not occur in the buffer at all. In that
/// case `closing_bracket_index` and `language` are positional leftovers and carry no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnguardedStartMarker<'a> {
    pub start_index: Option<usize>,
    pub closing_bracket_index: usize,
    pub language: &'a str,
}

/// Length of the longest prefix of `marker` that `buffer` ends with.
///
/// Returns `marker.len()` when the whole marker sits at the tail, a smaller non-zero value while
/// the marker may still be arriving, and `0` when no prefix matches (including for an empty
/// marker or an empty buffer).
pub fn match_trailing_partial(buffer: &str, marker: &str) -> usize {
    // Longest candidate first, so the first hit is the answer.
    let mut len = marker.len().min(buffer.len());
    while len > 0 {
        if marker.is_char_boundary(len) && buffer.ends_with(&marker[..len]) {
            return len;
        }
        len -= 1;
    }
    0
}

/// `true` once the complete (non-empty) marker is at the tail of `buffer`.
pub fn is_complete_match(buffer: &str, marker: &str) -> bool {
    !marker.is_empty() && match_trailing_partial(buffer, marker) == marker.len()
}

/// Split `buffer` into the part that is safe to display and the trailing bytes that might be the
/// beginning of `marker`.
pub fn withhold_partial<'a>(buffer: &'a str, marker: &str) -> (&'a str, &'a str) {
    let held = match_trailing_partial(buffer, marker);
    buffer.split_at(buffer.len() - held)
}

/// Find the first `start_pattern` and the first `]` after it.
///
/// Returns `None` when the pattern is absent, when no `]` has arrived after it yet, or when the
/// pattern is empty.
pub fn find_start_marker<'a>(buffer: &'a str, start_pattern: &str) -> Option<StartMarkerInfo<'a>> {
    if start_pattern.is_empty() {
        return None;
    }
    let start_index = buffer.find(start_pattern)?;
    let language_start = start_index + start_pattern.len();
    let closing_bracket_index = language_start + buffer[language_start..].find(']')?;
    Some(StartMarkerInfo {
        start_index,
        closing_bracket_index,
        language: &buffer[language_start..closing_bracket_index],
    })
}

/// Variant of [`find_start_marker`] that does not stop when the start pattern is missing.
///
/// Without a pattern hit, the bracket search begins at `start_pattern.len() - 1` (the position a
/// `-1` start index plus the pattern length points at) and a record with `start_index: None` is
/// returned if a `]` is found there or later. Prefer [`find_start_marker`]; this exists for
/// callers that depend on the permissive result.
pub fn find_start_marker_unguarded<'a>(
    buffer: &'a str,
    start_pattern: &str,
) -> Option<UnguardedStartMarker<'a>> {
    let start_index = buffer.find(start_pattern);
    let language_start = match start_index {
        Some(i) => i + start_pattern.len(),
        None => start_pattern.len().checked_sub(1)?,
    };
    // `get` refuses offsets past the end or inside a multi-byte char.
    let rest = buffer.get(language_start..)?;
    let closing_bracket_index = language_start + rest.find(']')?;
    Some(UnguardedStartMarker {
        start_index,
        closing_bracket_index,
        language: &buffer[language_start..closing_bracket_index],
    })
}

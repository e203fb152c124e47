use std::ops::Range;

use crate::marker::{find_start_marker, match_trailing_partial};
use crate::options::{Options, OptionsError};
use crate::types::{MarkerEvent, Segment, SegmentId, SegmentKind, SegmentStatus, Update};

mod compaction;

/// Where the scanner stands after the last `append`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState<'a> {
    /// Outside any annotated block; nothing is withheld.
    Scanning,
    /// Outside any annotated block; this many trailing bytes may begin a start marker.
    PartialMatch(usize),
    /// Inside an annotated block with this language tag, waiting for the end marker.
    InsideBlock(&'a str),
}

#[derive(Debug, Clone)]
struct OpenBlock {
    language: String,
    header_start: usize,
    body_start: usize,
    /// No end marker begins before this offset.
    end_scan_from: usize,
}

#[derive(Debug, Clone)]
enum Mode {
    Text,
    Block(OpenBlock),
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Incremental scanner that splits a streamed response into plain text and annotated blocks.
///
/// The stream owns the accumulated buffer. Each [`MarkerStream::append`] returns the segments
/// that became final plus the current pending tail, with any bytes that might still turn into a
/// marker held back from the pending content.
#[derive(Debug)]
pub struct MarkerStream {
    opts: Options,
    buffer: String,
    /// Logical stream offset of `buffer[0]`; grows when the buffer is compacted.
    base_offset: usize,
    segment_start: usize,
    /// No start pattern begins before this offset (outside blocks).
    start_scan_from: usize,
    mode: Mode,
    held: usize,
    next_id: u64,
}

impl Default for MarkerStream {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl MarkerStream {
    /// Create a stream. Empty patterns in `opts` never match; use [`MarkerStream::try_new`] to
    /// reject them up front.
    pub fn new(opts: Options) -> Self {
        debug_assert!(opts.validate().is_ok(), "invalid stream options: {opts:?}");
        Self {
            opts,
            buffer: String::new(),
            base_offset: 0,
            segment_start: 0,
            start_scan_from: 0,
            mode: Mode::Text,
            held: 0,
            next_id: 0,
        }
    }

    pub fn try_new(opts: Options) -> Result<Self, OptionsError> {
        opts.validate()?;
        Ok(Self::new(opts))
    }

    pub fn opts(&self) -> &Options {
        &self.opts
    }

    /// The retained buffer (everything since the last compaction).
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn state(&self) -> ScanState<'_> {
        match &self.mode {
            Mode::Block(block) => ScanState::InsideBlock(&block.language),
            Mode::Text if self.held > 0 => ScanState::PartialMatch(self.held),
            Mode::Text => ScanState::Scanning,
        }
    }

    pub fn append(&mut self, chunk: &str) -> Update {
        self.buffer.push_str(chunk);

        let mut update = Update::empty();
        self.scan(&mut update);
        update.pending = self.pending_segment();
        update.held_back = self.visible_hold_back();
        tracing::trace!(
            chunk_len = chunk.len(),
            committed = update.committed.len(),
            held_back = update.held_back,
            "append"
        );

        self.maybe_compact_buffer();
        update
    }

    /// Commit everything left in the buffer.
    ///
    /// An open annotated block is committed with `closed: false`; withheld bytes and unterminated
    /// start patterns become plain text. Calling this again without new input returns an empty
    /// update.
    pub fn finalize(&mut self) -> Update {
        let mut update = Update::empty();
        self.scan(&mut update);

        let end = self.buffer.len();
        match std::mem::replace(&mut self.mode, Mode::Text) {
            Mode::Text => {
                if self.segment_start < end {
                    let range = self.segment_start..end;
                    self.commit(SegmentKind::Text, range.clone(), range, &mut update);
                }
            }
            Mode::Block(block) => {
                tracing::debug!(
                    language = %block.language,
                    offset = self.base_offset + block.header_start,
                    "annotated block left open at finalize"
                );
                let kind = SegmentKind::Annotated {
                    language: block.language,
                    closed: false,
                };
                self.commit(
                    kind,
                    block.header_start..end,
                    block.body_start..end,
                    &mut update,
                );
            }
        }
        self.segment_start = end;
        self.start_scan_from = end;
        self.held = 0;

        tracing::debug!(committed = update.committed.len(), "finalized stream");
        self.maybe_compact_buffer();
        update
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.base_offset = 0;
        self.segment_start = 0;
        self.start_scan_from = 0;
        self.mode = Mode::Text;
        self.held = 0;
        self.next_id = 0;
    }

    fn scan(&mut self, update: &mut Update) {
        loop {
            let progressed = if matches!(self.mode, Mode::Block(_)) {
                self.scan_block(update)
            } else {
                self.scan_text(update)
            };
            if !progressed {
                break;
            }
        }
    }

    /// Look for a complete start marker. Returns `true` if a block was opened.
    fn scan_text(&mut self, update: &mut Update) -> bool {
        let from = self.start_scan_from;
        let found = find_start_marker(&self.buffer[from..], &self.opts.start_pattern).map(|info| {
            (
                from + info.start_index,
                from + info.end_index(),
                info.language.to_string(),
            )
        });
        let Some((header_start, body_start, language)) = found else {
            self.held = self.text_hold_back();
            return false;
        };

        if header_start > self.segment_start {
            let range = self.segment_start..header_start;
            self.commit(SegmentKind::Text, range.clone(), range, update);
        }

        let id = SegmentId(self.next_id);
        let offset = self.base_offset + header_start;
        tracing::debug!(id = id.0, %language, offset, "annotated block opened");
        update.events.push(MarkerEvent::BlockOpened {
            id,
            language: language.clone(),
            offset,
        });

        self.mode = Mode::Block(OpenBlock {
            language,
            header_start,
            body_start,
            end_scan_from: body_start,
        });
        self.segment_start = header_start;
        self.held = 0;
        true
    }

    /// Bytes at the tail of the current text segment that may still become a start marker.
    fn text_hold_back(&mut self) -> usize {
        let pattern = self.opts.start_pattern.as_str();
        if pattern.is_empty() {
            return 0;
        }
        if let Some(pos) = self.buffer[self.start_scan_from..].find(pattern) {
            // The pattern is here but its `]` is not: hold the whole header back.
            let header_start = self.start_scan_from + pos;
            self.start_scan_from = header_start;
            return self.buffer.len() - header_start;
        }

        let held = match_trailing_partial(&self.buffer[self.segment_start..], pattern);
        let resume = self.buffer.len().saturating_sub(pattern.len() - 1);
        self.start_scan_from = floor_char_boundary(&self.buffer, resume).max(self.segment_start);
        held
    }

    /// Look for the end marker of the open block. Returns `true` if the block was closed.
    fn scan_block(&mut self, update: &mut Update) -> bool {
        let end_marker = self.opts.end_marker.as_str();
        let Mode::Block(block) = &mut self.mode else {
            return false;
        };

        let found = if end_marker.is_empty() {
            None
        } else {
            self.buffer[block.end_scan_from..]
                .find(end_marker)
                .map(|pos| block.end_scan_from + pos)
        };
        let Some(marker_start) = found else {
            self.held = match_trailing_partial(&self.buffer[block.body_start..], end_marker);
            let resume = self
                .buffer
                .len()
                .saturating_sub(end_marker.len().saturating_sub(1));
            block.end_scan_from = floor_char_boundary(&self.buffer, resume).max(block.body_start);
            return false;
        };

        let Mode::Block(block) = std::mem::replace(&mut self.mode, Mode::Text) else {
            return false;
        };
        let block_end = marker_start + self.opts.end_marker.len();
        let kind = SegmentKind::Annotated {
            language: block.language,
            closed: true,
        };
        let id = self.commit(
            kind,
            block.header_start..block_end,
            block.body_start..marker_start,
            update,
        );

        let offset = self.base_offset + block_end;
        tracing::debug!(id = id.0, offset, "annotated block closed");
        update.events.push(MarkerEvent::BlockClosed { id, offset });

        self.segment_start = block_end;
        self.start_scan_from = block_end;
        self.held = 0;
        true
    }

    fn visible_hold_back(&self) -> usize {
        if self.opts.hold_back_partial {
            self.held
        } else {
            0
        }
    }

    fn pending_segment(&self) -> Option<Segment> {
        let end = self.buffer.len();
        let shown = end - self.visible_hold_back();
        match &self.mode {
            Mode::Text => {
                if self.segment_start >= end {
                    return None;
                }
                Some(self.segment(
                    SegmentId(self.next_id),
                    SegmentStatus::Pending,
                    SegmentKind::Text,
                    self.segment_start..end,
                    self.segment_start..shown,
                ))
            }
            Mode::Block(block) => Some(self.segment(
                SegmentId(self.next_id),
                SegmentStatus::Pending,
                SegmentKind::Annotated {
                    language: block.language.clone(),
                    closed: false,
                },
                block.header_start..end,
                block.body_start..shown,
            )),
        }
    }

    fn commit(
        &mut self,
        kind: SegmentKind,
        raw: Range<usize>,
        content: Range<usize>,
        update: &mut Update,
    ) -> SegmentId {
        let id = SegmentId(self.next_id);
        self.next_id += 1;
        let segment = self.segment(id, SegmentStatus::Committed, kind, raw, content);
        update.committed.push(segment);
        id
    }

    fn segment(
        &self,
        id: SegmentId,
        status: SegmentStatus,
        kind: SegmentKind,
        raw: Range<usize>,
        content: Range<usize>,
    ) -> Segment {
        Segment {
            id,
            status,
            kind,
            raw: self.buffer[raw.clone()].to_string(),
            content: self.buffer[content].to_string(),
            span: self.base_offset + raw.start..self.base_offset + raw.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(update: &Update) -> Vec<(&str, Option<&str>)> {
        update
            .committed
            .iter()
            .map(|s| (s.content.as_str(), s.language()))
            .collect()
    }

    #[test]
    fn plain_text_stays_pending_until_finalize() {
        let mut s = MarkerStream::default();
        let u = s.append("hello world");
        assert!(u.committed.is_empty());
        let pending = u.pending.expect("pending");
        assert_eq!(pending.content, "hello world");
        assert_eq!(pending.status, SegmentStatus::Pending);
        assert_eq!(s.state(), ScanState::Scanning);

        let f = s.finalize();
        assert_eq!(texts(&f), vec![("hello world", None)]);
        assert!(s.finalize().is_empty());
    }

    #[test]
    fn partial_start_pattern_is_held_back() {
        let mut s = MarkerStream::default();
        let u = s.append("see ``");
        assert_eq!(u.held_back, 2);
        assert_eq!(u.pending.expect("pending").content, "see ");
        assert_eq!(s.state(), ScanState::PartialMatch(2));

        // Plain inline code after all: the held bytes come back.
        let u = s.append("x`");
        assert_eq!(u.held_back, 1);
        assert_eq!(u.pending.expect("pending").content, "see ``x");
    }

    #[test]
    fn unterminated_header_is_held_back() {
        let mut s = MarkerStream::default();
        let u = s.append("intro ```[pyt");
        assert_eq!(u.held_back, "```[pyt".len());
        assert_eq!(u.pending.expect("pending").content, "intro ");
        assert!(u.events.is_empty());

        let u = s.append("hon]print(1)");
        assert_eq!(texts(&u), vec![("intro ", None)]);
        assert_eq!(
            u.events,
            vec![MarkerEvent::BlockOpened {
                id: SegmentId(1),
                language: "python".to_string(),
                offset: 6,
            }]
        );
        assert_eq!(s.state(), ScanState::InsideBlock("python"));
        let pending = u.pending.expect("pending");
        assert_eq!(pending.language(), Some("python"));
        assert_eq!(pending.content, "print(1)");
        assert_eq!(pending.raw, "```[python]print(1)");
    }

    #[test]
    fn block_closes_on_end_marker() {
        let mut s = MarkerStream::default();
        let u = s.append("a ```[rust]fn main() {}``` b");
        assert_eq!(texts(&u), vec![("a ", None), ("fn main() {}", Some("rust"))]);
        let block = &u.committed[1];
        assert_eq!(block.raw, "```[rust]fn main() {}```");
        assert_eq!(block.span, 2..26);
        assert_eq!(
            block.kind,
            SegmentKind::Annotated {
                language: "rust".to_string(),
                closed: true
            }
        );
        assert_eq!(u.events.len(), 2);
        assert_eq!(u.pending.expect("pending").content, " b");
        assert_eq!(s.state(), ScanState::Scanning);
    }

    #[test]
    fn partial_end_marker_is_held_back_inside_block() {
        let mut s = MarkerStream::default();
        s.append("```[sh]ls -la`");
        let u = s.append("`");
        assert_eq!(u.held_back, 2);
        assert_eq!(u.pending.expect("pending").content, "ls -la");
        assert_eq!(s.state(), ScanState::InsideBlock("sh"));

        let u = s.append("`");
        assert_eq!(texts(&u), vec![("ls -la", Some("sh"))]);
        assert!(u.pending.is_none());
    }

    #[test]
    fn finalize_commits_open_block_as_unclosed() {
        let mut s = MarkerStream::default();
        s.append("```[]body");
        let u = s.finalize();
        assert_eq!(u.committed.len(), 1);
        assert_eq!(
            u.committed[0].kind,
            SegmentKind::Annotated {
                language: String::new(),
                closed: false
            }
        );
        assert_eq!(u.committed[0].content, "body");
        assert!(u.events.is_empty());
    }

    #[test]
    fn finalize_flushes_withheld_bytes_as_text() {
        let mut s = MarkerStream::default();
        s.append("tail ```[unterminated");
        let u = s.finalize();
        assert_eq!(texts(&u), vec![("tail ```[unterminated", None)]);
    }

    #[test]
    fn hold_back_can_be_disabled() {
        let opts = Options {
            hold_back_partial: false,
            ..Options::default()
        };
        let mut s = MarkerStream::new(opts);
        let u = s.append("see ``");
        assert_eq!(u.held_back, 0);
        assert_eq!(u.pending.expect("pending").content, "see ``");
        assert_eq!(s.state(), ScanState::PartialMatch(2));
    }

    #[test]
    fn try_new_rejects_invalid_options() {
        let err = MarkerStream::try_new(Options::new("", "```")).unwrap_err();
        assert_eq!(err, OptionsError::EmptyStartPattern);
        assert!(MarkerStream::try_new(Options::new("<lang:", "</>")).is_ok());
    }

    #[test]
    fn reset_restarts_ids_and_offsets() {
        let mut s = MarkerStream::default();
        s.append("```[a]x```");
        s.reset();
        assert_eq!(s.buffer(), "");
        let u = s.append("```[b]y```");
        assert_eq!(u.committed[0].id, SegmentId(0));
        assert_eq!(u.committed[0].span, 0..10);
    }
}

use super::{MarkerStream, Mode};

impl MarkerStream {
    /// Drop the committed prefix of the buffer once it outgrows `max_buffer_bytes`.
    ///
    /// Only text that is already part of a committed segment is dropped, so the pending segment
    /// and every later commit are unaffected. Spans stay absolute through `base_offset`.
    pub(super) fn maybe_compact_buffer(&mut self) {
        let Some(max) = self.opts.max_buffer_bytes else {
            return;
        };
        if self.buffer.len() <= max {
            return;
        }

        let keep_from = match &self.mode {
            Mode::Text => self.segment_start,
            Mode::Block(block) => block.header_start,
        };
        if keep_from == 0 || keep_from > self.buffer.len() {
            return;
        }
        debug_assert!(self.buffer.is_char_boundary(keep_from));

        self.buffer.drain(..keep_from);
        self.base_offset += keep_from;
        self.segment_start -= keep_from;
        self.start_scan_from = self.start_scan_from.saturating_sub(keep_from);
        if let Mode::Block(block) = &mut self.mode {
            block.header_start -= keep_from;
            block.body_start -= keep_from;
            block.end_scan_from -= keep_from;
        }

        tracing::debug!(
            dropped = keep_from,
            retained = self.buffer.len(),
            base_offset = self.base_offset,
            "compacted stream buffer"
        );
    }
}

use crate::types::{AppliedUpdate, Segment, SegmentId, Update};

/// A UI-friendly container for a streamed response.
///
/// This keeps only the renderable state:
/// - committed segments (append-only)
/// - an optional pending segment (can change every tick)
///
/// It does not own the scanner (`MarkerStream`), so the two can live on different threads.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transcript {
    committed: Vec<Segment>,
    pending: Option<Segment>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> &[Segment] {
        &self.committed
    }

    pub fn pending(&self) -> Option<&Segment> {
        self.pending.as_ref()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.committed.iter().chain(self.pending.iter())
    }

    /// Committed and pending annotated blocks, in stream order.
    pub fn annotated(&self) -> impl Iterator<Item = &Segment> {
        self.segments().filter(|s| s.is_annotated())
    }

    pub fn clear(&mut self) {
        self.committed.clear();
        self.pending = None;
    }

    pub fn apply(&mut self, update: Update) -> AppliedUpdate {
        update.apply_to(&mut self.committed, &mut self.pending)
    }

    pub fn find(&self, id: SegmentId) -> Option<&Segment> {
        self.segments().find(|s| s.id == id)
    }

    /// Concatenated content of every segment, as a renderer would show it right now.
    pub fn visible_text(&self) -> String {
        self.segments().map(|s| s.content.as_str()).collect()
    }
}

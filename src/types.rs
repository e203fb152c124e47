use std::fmt;
use std::ops::Range;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub u64);

impl fmt::Debug for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SegmentId({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStatus {
    Committed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    Annotated {
        language: String,
        /// `false` only for a block cut short by `finalize`.
        closed: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: SegmentId,
    pub status: SegmentStatus,
    pub kind: SegmentKind,
    /// Exact source text, markers included.
    pub raw: String,
    /// Renderable text: the body for annotated blocks. Pending segments exclude withheld bytes.
    pub content: String,
    /// Byte range of `raw` in the logical stream (unaffected by buffer compaction).
    pub span: Range<usize>,
}

impl Segment {
    pub fn language(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Annotated { language, .. } => Some(language),
            SegmentKind::Text => None,
        }
    }

    pub fn is_annotated(&self) -> bool {
        matches!(self.kind, SegmentKind::Annotated { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerEvent {
    /// A complete start marker arrived. `offset` is where the start pattern begins.
    BlockOpened {
        id: SegmentId,
        language: String,
        offset: usize,
    },
    /// The end marker arrived. `offset` is the first byte after it.
    BlockClosed { id: SegmentId, offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub committed: Vec<Segment>,
    pub pending: Option<Segment>,
    /// Trailing bytes withheld from `pending` because they may begin a marker.
    pub held_back: usize,
    pub events: Vec<MarkerEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedUpdate {
    pub held_back: usize,
    pub events: Vec<MarkerEvent>,
}

impl Update {
    pub fn empty() -> Self {
        Self {
            committed: Vec::new(),
            pending: None,
            held_back: 0,
            events: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
            && self.pending.is_none()
            && self.held_back == 0
            && self.events.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.committed.iter().chain(self.pending.iter())
    }

    pub fn apply_to(
        self,
        committed: &mut Vec<Segment>,
        pending: &mut Option<Segment>,
    ) -> AppliedUpdate {
        committed.extend(self.committed);
        *pending = self.pending;
        AppliedUpdate {
            held_back: self.held_back,
            events: self.events,
        }
    }
}

use std::collections::HashMap;

use crate::types::{Segment, SegmentId, SegmentKind, Update};

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options as PulldownOptions, Parser, Tag, TagEnd};

#[derive(Debug, Clone)]
pub struct PulldownAdapterOptions {
    pub pulldown: PulldownOptions,
    /// If true, text segments are parsed as Markdown; otherwise they become a single `Text` event.
    pub parse_text_as_markdown: bool,
}

impl Default for PulldownAdapterOptions {
    fn default() -> Self {
        Self {
            pulldown: PulldownOptions::empty(),
            parse_text_as_markdown: true,
        }
    }
}

/// Turns stream segments into `pulldown-cmark` events.
///
/// Annotated blocks map to a fenced code block whose info string is the language tag. Committed
/// segments are converted once and cached by id; the pending segment is converted on demand.
#[derive(Debug, Default)]
pub struct PulldownAdapter {
    opts: PulldownAdapterOptions,
    committed_cache: HashMap<SegmentId, Vec<Event<'static>>>,
}

impl PulldownAdapter {
    pub fn new(opts: PulldownAdapterOptions) -> Self {
        Self {
            opts,
            committed_cache: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.committed_cache.clear();
    }

    pub fn apply_update(&mut self, update: &Update) {
        for segment in &update.committed {
            let events = self.segment_events(segment);
            self.committed_cache.insert(segment.id, events);
        }
    }

    pub fn committed_events(&self, id: SegmentId) -> Option<&[Event<'static>]> {
        self.committed_cache.get(&id).map(|v| v.as_slice())
    }

    pub fn parse_pending(&self, pending: &Segment) -> Vec<Event<'static>> {
        self.segment_events(pending)
    }

    fn segment_events(&self, segment: &Segment) -> Vec<Event<'static>> {
        match &segment.kind {
            SegmentKind::Annotated { language, .. } => code_block_events(language, &segment.content),
            SegmentKind::Text if self.opts.parse_text_as_markdown => {
                parse_events_static(&segment.content, self.opts.pulldown)
            }
            SegmentKind::Text => {
                if segment.content.is_empty() {
                    Vec::new()
                } else {
                    vec![Event::Text(CowStr::from(segment.content.clone()))]
                }
            }
        }
    }
}

fn code_block_events(language: &str, content: &str) -> Vec<Event<'static>> {
    let info = CowStr::from(language.trim().to_string());
    let mut events = Vec::with_capacity(3);
    events.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))));
    if !content.is_empty() {
        events.push(Event::Text(CowStr::from(content.to_string())));
    }
    events.push(Event::End(TagEnd::CodeBlock));
    events
}

fn parse_events_static(input: &str, options: PulldownOptions) -> Vec<Event<'static>> {
    Parser::new_ext(input, options)
        .map(|e| e.into_static())
        .collect()
}

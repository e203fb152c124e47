//! Incremental `pulldown-cmark` events from a marker stream.
//!
//! Run:
//!   cargo run --features pulldown --example pulldown_incremental

use pulldown_cmark::{Event, Options as PulldownOptions, Tag};
use streamfence::adapters::pulldown::{PulldownAdapter, PulldownAdapterOptions};
use streamfence::{MarkerStream, Options};

fn main() {
    let mut stream = MarkerStream::new(Options::default());
    let mut adapter = PulldownAdapter::new(PulldownAdapterOptions {
        pulldown: PulldownOptions::ENABLE_TABLES | PulldownOptions::ENABLE_STRIKETHROUGH,
        parse_text_as_markdown: true,
    });

    let chunks = [
        "A **short** answer, then code:\n",
        "```[sh]cargo test",
        " --all``",
        "`\n~~done~~",
    ];

    for (i, chunk) in chunks.iter().enumerate() {
        println!("\n== tick {i} ==");
        let update = stream.append(chunk);
        adapter.apply_update(&update);

        for s in &update.committed {
            let events = adapter.committed_events(s.id).unwrap_or(&[]);
            println!("committed id={} kind={:?} events.len={}", s.id.0, s.kind, events.len());
        }

        if let Some(p) = &update.pending {
            let events = adapter.parse_pending(p);
            let is_code = events
                .iter()
                .any(|e| matches!(e, Event::Start(Tag::CodeBlock(_))));
            println!(
                "pending id={} code={} events.len={} held_back={}",
                p.id.0,
                is_code,
                events.len(),
                update.held_back
            );
        } else {
            println!("pending: <none>");
        }
    }

    let update = stream.finalize();
    adapter.apply_update(&update);
    println!("\nfinal commits: {}", update.committed.len());
}

//! Minimal `streamfence` usage: feed chunks, render the transcript after every tick.
//!
//! Run:
//!   RUST_LOG=streamfence=debug cargo run --example minimal

use streamfence::{MarkerStream, Options, Transcript};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut stream = MarkerStream::new(Options::default());
    let mut transcript = Transcript::new();

    let chunks = [
        "Sure, here is the script:\n`",
        "``[pyt",
        "hon]import sys\n",
        "print(sys.argv)\n``",
        "`\nRun it with any arguments.",
    ];

    for (i, chunk) in chunks.iter().enumerate() {
        println!("\n== tick {i} ==");
        let applied = transcript.apply(stream.append(chunk));
        for event in &applied.events {
            println!("event: {event:?}");
        }
        println!("state={:?} held_back={}", stream.state(), applied.held_back);
        println!("visible={:?}", transcript.visible_text());
    }

    println!("\n== finalize ==");
    transcript.apply(stream.finalize());
    for segment in transcript.committed() {
        println!(
            "id={} language={:?} content={:?}",
            segment.id.0,
            segment.language(),
            segment.content
        );
    }
}

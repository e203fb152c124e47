#![allow(dead_code)]

use std::ops::Range;

use streamfence::{MarkerStream, Options, SegmentKind};

pub type Collected = Vec<(SegmentKind, String, Range<usize>)>;

pub fn collect_final_segments(chunks: impl IntoIterator<Item = String>, opts: Options) -> Collected {
    collect_final_segments_with_stream(chunks, MarkerStream::new(opts))
}

pub fn collect_final_segments_with_stream(
    chunks: impl IntoIterator<Item = String>,
    mut s: MarkerStream,
) -> Collected {
    let mut out = Vec::new();
    for chunk in chunks {
        let u = s.append(&chunk);
        out.extend(u.committed.into_iter().map(|b| (b.kind, b.content, b.span)));
    }
    let u = s.finalize();
    out.extend(u.committed.into_iter().map(|b| (b.kind, b.content, b.span)));
    out
}

pub fn chunk_whole(text: &str) -> Vec<String> {
    vec![text.to_string()]
}

pub fn chunk_chars(text: &str) -> Vec<String> {
    text.chars().map(|c| c.to_string()).collect()
}

fn fnv1a64(s: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for &b in s.as_bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

fn xorshift64(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    x
}

pub fn chunk_pseudo_random(
    text: &str,
    seed_label: &str,
    trial: u64,
    max_bytes: usize,
) -> Vec<String> {
    assert!(max_bytes > 0);
    let mut state = fnv1a64(seed_label) ^ (trial.wrapping_mul(0x9e3779b97f4a7c15)) | 1;

    let mut out = Vec::new();
    let mut start = 0usize;
    while start < text.len() {
        let want = (xorshift64(&mut state) as usize % max_bytes) + 1;
        let mut end = (start + want).min(text.len());
        while end < text.len() && !text.is_char_boundary(end) {
            end += 1;
        }
        out.push(text[start..end].to_string());
        start = end;
    }
    out
}

pub fn annotated(language: &str, closed: bool) -> SegmentKind {
    SegmentKind::Annotated {
        language: language.to_string(),
        closed,
    }
}

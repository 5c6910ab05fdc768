//! Search and projection benchmarks on a large execution.
//!
//! 200 sections of 5,000 lines each (one million lines, roughly 60MB of text).
//!
//! Run with: cargo bench

#![allow(missing_docs)] // criterion macros generate undocumented items

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pipelog::model::{LogLevel, LogLine, SectionKey};
use pipelog::state::search::{execute_search, SearchQuery};
use pipelog::state::{reduce, LogAction, LogState};
use pipelog::view_state::RowProjection;
use std::sync::Arc;

const SECTIONS: usize = 200;
const LINES_PER_SECTION: usize = 5_000;

fn section_key(i: usize) -> SectionKey {
    SectionKey::new(format!("step-{i:03}")).expect("valid key")
}

/// Every section loaded and open.
fn generate_large_execution() -> Arc<LogState> {
    let keys: Vec<SectionKey> = (0..SECTIONS).map(section_key).collect();
    let mut state = reduce(
        &Arc::new(LogState::new()),
        LogAction::CreateSections { keys: keys.clone() },
    )
    .expect("fresh keys");

    let filler = "Lorem ipsum dolor sit amet, consectetur adipiscing elit.";
    for (s, key) in keys.into_iter().enumerate() {
        let lines = (0..LINES_PER_SECTION)
            .map(|i| {
                let level = if i % 97 == 0 {
                    LogLevel::Error
                } else {
                    LogLevel::Info
                };
                LogLine::new(
                    format!("2024-05-01T10:{:02}:{:02}Z", (i / 60) % 60, i % 60),
                    level,
                    format!("step {s} line {i}: {filler}"),
                )
            })
            .collect();
        state = reduce(&state, LogAction::UpdateSectionData { key, lines }).expect("known key");
    }
    state
}

fn benchmark_search(c: &mut Criterion) {
    let state = generate_large_execution();

    c.bench_function("search_common_term", |b| {
        let query = SearchQuery::new("lorem").expect("valid query");
        b.iter(|| black_box(execute_search(black_box(&state), black_box(&query))))
    });

    c.bench_function("search_rare_term", |b| {
        let query = SearchQuery::new("step 150 line 4999").expect("valid query");
        b.iter(|| black_box(execute_search(black_box(&state), black_box(&query))))
    });

    c.bench_function("search_no_match", |b| {
        let query = SearchQuery::new("XYZNONEXISTENT").expect("valid query");
        b.iter(|| black_box(execute_search(black_box(&state), black_box(&query))))
    });

    let searched = reduce(
        &state,
        LogAction::Search {
            text: "lorem".to_string(),
        },
    )
    .expect("search applies");
    c.bench_function("next_match_among_one_million", |b| {
        b.iter(|| {
            black_box(reduce(
                black_box(&searched),
                LogAction::GoToNextSearchResult,
            ))
        })
    });
}

fn benchmark_projection(c: &mut Criterion) {
    let state = generate_large_execution();

    c.bench_function("project_200_sections", |b| {
        b.iter(|| black_box(RowProjection::project(black_box(&state))))
    });

    let projection = RowProjection::project(&state);
    let last = projection.flat_len() - 1;
    c.bench_function("locate_scattered_rows", |b| {
        b.iter(|| {
            for i in (0..last).step_by(9_973) {
                black_box(projection.locate(black_box(i)));
            }
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(std::time::Duration::from_secs(10));
    targets = benchmark_search, benchmark_projection
}

criterion_main!(benches);

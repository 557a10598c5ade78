//! Benchmarks for entity patching and decoration.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stencil_buffer::{
    BlockId, ContentModel, Entity, EntityData, EntityId, EntityKind, RawBlock, RawContent,
    RawEntityRange, SelectionRange,
};
use stencil_core::entity::patch_entities;
use stencil_core::render::decorate;
use stencil_core::{ContentEdit, Editor};

/// Generates a document with two parameters per line.
///
/// With `padded` every run already ends with its magic space; without
/// it every run needs one appended.
fn generate_document(lines: usize, padded: bool) -> ContentModel {
    let mut blocks = Vec::with_capacity(lines);
    let mut entities = Vec::with_capacity(lines * 2);
    let run = if padded { 6 } else { 5 };

    for i in 0..lines {
        let text = format!("Line {i:06}: Dear $name , your $mail  is ready.");
        let first = text.find('$').unwrap_or(0);
        let second = text.rfind('$').unwrap_or(0);

        let mut entity_ranges = Vec::new();
        for offset in [first, second] {
            let id = EntityId::new(entities.len() as u64);
            entities.push(Entity::new(id, EntityKind::Parameter, EntityData::default()));
            entity_ranges.push(RawEntityRange {
                offset,
                length: run,
                entity: id,
            });
        }

        blocks.push(RawBlock {
            key: BlockId::new(),
            text,
            entity_ranges,
        });
    }

    let raw = RawContent {
        blocks,
        next_entity_id: entities.len() as u64,
        entities,
    };
    ContentModel::from_raw(&raw).expect("generated document is valid")
}

/// Benchmarks a patch pass over documents of growing size.
fn bench_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch_entities");

    for size in [100, 1000, 10000].iter() {
        let clean = generate_document(*size, true);
        let dirty = generate_document(*size, false);

        group.bench_with_input(BenchmarkId::new("clean", size), &clean, |b, content| {
            b.iter(|| black_box(patch_entities(black_box(content)).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("restore_spaces", size), &dirty, |b, content| {
            b.iter(|| black_box(patch_entities(black_box(content)).unwrap()))
        });
    }

    group.finish();
}

/// Benchmarks typing into a parameter in a large document.
fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("typing");
    let content = generate_document(10000, true);
    let block = content.first_block().id();

    group.bench_function("type_into_parameter", |b| {
        b.iter_with_setup(
            || {
                let mut editor = Editor::new();
                editor.load_content(content.clone());
                // Inside the first "$name "
                editor.dispatch_selection_change(SelectionRange::caret(block, 19));
                editor
            },
            |mut editor| {
                editor.dispatch_content_edit(ContentEdit::InsertText(black_box("x".into())));
                black_box(editor)
            },
        )
    });

    group.finish();
}

/// Benchmarks splitting the document into render segments.
fn bench_decorate(c: &mut Criterion) {
    let content = generate_document(10000, true);
    c.bench_function("decorate", |b| b.iter(|| black_box(decorate(black_box(&content)))));
}

criterion_group!(benches, bench_patch, bench_typing, bench_decorate);
criterion_main!(benches);

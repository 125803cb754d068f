//! Benchmarks for the splitter layout engine
//!
//! Run with: cargo bench layout

mod support;
use support::{make_layout, region};

use dockyard::config::LayoutConfig;
use dockyard::layout::{AddingOption, SplitterLayout};
use dockyard::model::{Location, Orientation, Size};

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

fn main() {
    divan::main();
}

// ============================================================================
// Insertion
// ============================================================================

#[divan::bench(args = [4, 16, 32])]
fn add_widgets(bencher: divan::Bencher, count: usize) {
    bencher.bench_local(|| divan::black_box(make_layout(count)));
}

#[divan::bench(args = [4, 16, 32])]
fn add_widget_relative_to_item(bencher: divan::Bencher, count: usize) {
    bencher
        .with_inputs(|| make_layout(count))
        .bench_local_values(|mut layout| {
            let target = layout.items().next().map(|i| i.id);
            layout.add_widget(region(1000), Location::OnLeft, target, AddingOption::None);
            divan::black_box(layout)
        });
}

// ============================================================================
// Resizing
// ============================================================================

#[divan::bench(args = [4, 16, 32])]
fn set_size(bencher: divan::Bencher, count: usize) {
    bencher
        .with_inputs(|| make_layout(count))
        .bench_local_values(|mut layout| {
            let min = layout.min_size();
            layout.set_size(Size::new(2400, 1400).expanded_to(min));
            divan::black_box(layout)
        });
}

#[divan::bench(args = [4, 16, 32])]
fn move_anchor(bencher: divan::Bencher, count: usize) {
    bencher
        .with_inputs(|| {
            let layout = make_layout(count);
            let anchor = layout.anchors(Orientation::Vertical, false, false)[0];
            (layout, anchor)
        })
        .bench_local_values(|(mut layout, anchor)| {
            let (low, high) = layout.bound_positions_for_anchor(anchor);
            divan::black_box(layout.move_anchor(anchor, (low + high) / 2))
        });
}

#[divan::bench(args = [4, 16, 32])]
fn min_size(bencher: divan::Bencher, count: usize) {
    let layout = make_layout(count);
    bencher.bench_local(|| divan::black_box(layout.min_size()));
}

// ============================================================================
// Serialization
// ============================================================================

#[divan::bench(args = [4, 16, 32])]
fn serialize(bencher: divan::Bencher, count: usize) {
    let layout = make_layout(count);
    bencher.bench_local(|| divan::black_box(layout.serialize()));
}

#[divan::bench(args = [4, 16, 32])]
fn deserialize(bencher: divan::Bencher, count: usize) {
    let record = make_layout(count).serialize();
    bencher.bench_local(|| {
        let mut next = 0;
        let layout = SplitterLayout::deserialize(&record, LayoutConfig::default(), |_| {
            next += 1;
            Some((dockyard::model::RegionId(next), Size::new(80, 90)))
        });
        divan::black_box(layout.is_ok())
    });
}

//! Integration test: allocation lifecycle across reuse, growth and reset.
//!
//! Drives one arena through repeated rounds of same-shaped allocations
//! and releases, and checks that steady-state churn is served from the
//! free list without growing the buffer.

use tessera_arena::{Arena, ArenaConfig, ArenaError, BlockKind};
use tessera_core::Offset;

fn config() -> ArenaConfig {
    ArenaConfig {
        page_size: 4096,
        initial_pages: 1,
        max_pages: 8,
        reserved_prefix: 128,
    }
}

#[test]
fn steady_churn_does_not_grow() {
    let mut arena = Arena::new(config()).unwrap();
    let sizes = [64usize, 128, 256, 512];

    let round = |arena: &mut Arena| {
        let offsets: Vec<Offset> = sizes.iter().map(|&s| arena.allocate(s).unwrap()).collect();
        for off in offsets {
            assert!(arena.deallocate(off));
        }
    };

    round(&mut arena);
    let cursor = arena.heap_cursor();
    let capacity = arena.capacity();

    for _ in 0..100 {
        round(&mut arena);
    }

    assert_eq!(arena.heap_cursor(), cursor);
    assert_eq!(arena.capacity(), capacity);
    assert_eq!(arena.generation(), 0);
    let stats = arena.stats();
    assert_eq!(stats.reuse_hits, 400);
    assert_eq!(stats.current_usage, 0);
    assert_eq!(stats.free_blocks, 4);
}

#[test]
fn growth_then_exhaustion() {
    let mut arena = Arena::new(config()).unwrap();
    let mut generations = vec![arena.generation()];

    // Each 4 KiB request needs one new page once the first is consumed.
    let mut allocated = 0;
    loop {
        match arena.allocate(4096) {
            Ok(_) => {
                allocated += 1;
                generations.push(arena.generation());
            }
            Err(ArenaError::AllocationFailed { max_capacity, .. }) => {
                assert_eq!(max_capacity, 8 * 4096);
                break;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(allocated, 7);
    assert!(generations.windows(2).all(|w| w[1] >= w[0]));
    assert!(arena.capacity() <= arena.max_capacity());

    // Releasing one block makes room again without growth.
    let victim = arena.live_blocks().next().map(|b| b.offset).unwrap();
    arena.deallocate(victim);
    assert_eq!(arena.allocate(4000).unwrap(), victim);
}

#[test]
fn reset_discards_handles_but_keeps_capacity() {
    let mut arena = Arena::new(config()).unwrap();
    let alloc = arena
        .allocate_block(8 * 1024, BlockKind::Vector { len: 1024 }, Some("big".into()))
        .unwrap();
    let grown = arena.capacity();
    assert!(grown > 4096);

    arena.reset();
    assert!(!arena.is_live(alloc.offset, alloc.serial));
    assert!(!arena.deallocate(alloc.offset));
    assert_eq!(arena.capacity(), grown);
    assert_eq!(arena.stats().unknown_deallocations, 1);
}

#[test]
fn output_window_reads_inputs_while_writing() {
    let mut arena = Arena::new(config()).unwrap();
    let a = arena.allocate(32).unwrap();
    let b = arena.allocate(32).unwrap();
    let out = arena.allocate(32).unwrap();
    arena.words_mut(a, 4).unwrap().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
    arena.words_mut(b, 4).unwrap().copy_from_slice(&[4.0, 3.0, 2.0, 1.0]);

    let mut win = arena.output_window(out, 4).unwrap();
    let xs = win.input(a, 4).unwrap();
    let ys = win.input(b, 4).unwrap();
    for ((o, x), y) in win.output().iter_mut().zip(xs).zip(ys) {
        *o = x + y;
    }
    assert!(win.input(out, 1).is_err());

    assert_eq!(arena.words(out, 4).unwrap(), &[5.0; 4]);
}

//! Integration test: `free_all` returns every byte the cache allocated.
//!
//! A counting global allocator tracks live heap bytes per thread, so tests
//! running in parallel do not see each other's allocations. Each test takes
//! a baseline after building its registry, caches frames, frees the cache
//! and expects live bytes to be back at the baseline.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use particula_cache::FrameCache;
use particula_core::FrameIndex;
use particula_test_utils::{populated_state, sizes_only_schema};

// ── Per-thread live byte counter ─────────────────────────────────────

struct CountingAlloc;

thread_local! {
    static LIVE_BYTES: Cell<isize> = const { Cell::new(0) };
}

fn track(delta: isize) {
    // The slot is gone during thread teardown.
    let _ = LIVE_BYTES.try_with(|live| live.set(live.get() + delta));
}

fn live_bytes() -> isize {
    LIVE_BYTES.with(Cell::get)
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            track(layout.size() as isize);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            track(layout.size() as isize);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        track(-(layout.size() as isize));
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            track(new_size as isize - layout.size() as isize);
        }
        new_ptr
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

/// Cache and free one frame so one-time lazy initialisation (logging
/// callsites and the like) happens before the baseline is taken.
fn warm_up(state: &particula_state::ParticlesState) {
    let mut cache = FrameCache::new();
    cache
        .cache_frame(FrameIndex(-1), state)
        .expect("warm-up frame caches");
    cache.free_all();
}

#[test]
fn two_frames_of_dust_are_fully_released() {
    let state = populated_state(4, &[("Dust", 10)]);
    warm_up(&state);

    let mut cache = FrameCache::new();
    let baseline = live_bytes();

    cache.cache_frame(FrameIndex(0), &state).unwrap();
    cache.cache_frame(FrameIndex(1), &state).unwrap();
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.buffer_count(), 6);
    assert!(live_bytes() > baseline);

    cache.free_all();
    assert_eq!(cache.buffer_count(), 0);
    assert_eq!(live_bytes(), baseline);
}

#[test]
fn many_types_and_frames_are_fully_released() {
    let state = populated_state(16, &[("Dust", 100), ("Sparks", 7), ("Empty", 0)]);
    warm_up(&state);

    let mut cache = FrameCache::new();
    let baseline = live_bytes();
    for frame in 0..25 {
        cache.cache_frame(FrameIndex(frame), &state).unwrap();
    }
    assert_eq!(cache.buffer_count(), 25 * 3 * 3);

    cache.free_all();
    assert_eq!(live_bytes(), baseline);
}

#[test]
fn rejected_frame_leaves_no_allocation_behind() {
    let mut state = populated_state(4, &[("Dust", 10)]);
    state
        .lookup_or_create("Smoke", &sizes_only_schema())
        .unwrap()
        .new_particles(3);

    let mut cache = FrameCache::new();
    let baseline = live_bytes();
    let err = cache.cache_frame(FrameIndex(0), &state).unwrap_err();
    drop(err);
    assert!(cache.is_empty());
    assert_eq!(live_bytes(), baseline);
}

#[test]
fn freeing_an_empty_cache_is_a_no_op() {
    let mut cache = FrameCache::new();
    let baseline = live_bytes();
    cache.free_all();
    cache.free_all();
    assert_eq!(live_bytes(), baseline);
}

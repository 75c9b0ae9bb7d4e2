//! # Chunk Planning
//!
//! How much of a run of lines fits in the room left on a page. Renderers
//! with line-granular content (code listings, long message bodies) ask this
//! module where to cut, then draw each chunk as its own boxed unit.
//!
//! Orphan and widow limits keep a chunk from stranding a line or two at the
//! bottom of one page or the top of the next.

/// Where to cut a run of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk {
    /// Everything fits in the room given.
    All,
    /// Nothing should go here; start the run on the next page.
    Defer,
    /// Place the first `n` items here and continue after a page break.
    Take(usize),
}

/// Line-count limits applied when a run is cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakRules {
    /// Minimum items left at the bottom of the first page.
    pub orphans: usize,
    /// Minimum items carried to the next page.
    pub widows: usize,
}

impl Default for BreakRules {
    fn default() -> Self {
        Self {
            orphans: 2,
            widows: 2,
        }
    }
}

/// Plan a cut of `heights` into `available` points, after `overhead` points
/// of fixed chrome (padding, headers) that every chunk carries.
pub fn plan_chunk(available: f64, overhead: f64, heights: &[f64], rules: BreakRules) -> Chunk {
    let total: f64 = heights.iter().sum();
    if overhead + total <= available + 1e-6 {
        return Chunk::All;
    }

    let mut used = overhead;
    let mut fitting = 0;
    for &h in heights {
        if used + h > available + 1e-6 {
            break;
        }
        used += h;
        fitting += 1;
    }

    if fitting == 0 || fitting < rules.orphans.min(heights.len()) {
        return Chunk::Defer;
    }

    let carried = heights.len() - fitting;
    if carried > 0 && carried < rules.widows {
        let pulled = fitting.saturating_sub(rules.widows - carried);
        if pulled == 0 || pulled < rules.orphans {
            return Chunk::Defer;
        }
        return Chunk::Take(pulled);
    }

    Chunk::Take(fitting)
}

/// Split `heights` into chunks: the first sized for `first_room`, the rest for
/// `page_room`. Each returned range is non-empty. A single item taller than a
/// whole page gets a chunk of its own.
pub fn chunk_ranges(
    first_room: f64,
    page_room: f64,
    overhead: f64,
    heights: &[f64],
    rules: BreakRules,
) -> Vec<std::ops::Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut room = first_room;
    let mut fresh = false;
    while start < heights.len() {
        let rest = &heights[start..];
        let take = match plan_chunk(room, overhead, rest, rules) {
            Chunk::All => rest.len(),
            Chunk::Take(n) => n,
            Chunk::Defer if fresh => {
                // Even a full page can't honour the rules; take what fits.
                let relaxed = BreakRules {
                    orphans: 1,
                    widows: 0,
                };
                match plan_chunk(room, overhead, rest, relaxed) {
                    Chunk::All => rest.len(),
                    Chunk::Take(n) => n,
                    Chunk::Defer => 1,
                }
            }
            Chunk::Defer => {
                room = page_room;
                fresh = true;
                if ranges.is_empty() {
                    // Caller will break before drawing; mark with an empty slot.
                    ranges.push(start..start);
                }
                continue;
            }
        };
        ranges.push(start..start + take);
        start += take;
        room = page_room;
        fresh = true;
    }
    ranges
}

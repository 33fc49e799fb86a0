//! Playhead projection across the rendered timeline
//!
//! The timeline lays queue entries out left to right, each song segment with
//! its own measured width, and a fixed-width transition box after every entry
//! that transitions into a following entry.

use std::time::Duration;

use super::queue::QueueEntry;

pub const TRANSITION_BOX_WIDTH: f64 = 60.0;
/// Width assumed for a segment that has not been measured
pub const FALLBACK_SEGMENT_WIDTH: f64 = 250.0;

/// Rendered widths of the song segments, indexed like the queue
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentWidths {
    widths: Vec<f64>,
    transition_box: f64,
}

impl SegmentWidths {
    pub fn new(widths: Vec<f64>) -> Self {
        Self::with_transition_box(widths, TRANSITION_BOX_WIDTH)
    }

    pub fn with_transition_box(widths: Vec<f64>, transition_box: f64) -> Self {
        Self {
            widths,
            transition_box,
        }
    }

    pub fn segment(&self, index: usize) -> f64 {
        self.widths
            .get(index)
            .copied()
            .unwrap_or(FALLBACK_SEGMENT_WIDTH)
    }

    pub fn transition_box(&self) -> f64 {
        self.transition_box
    }
}

/// Whether a transition box is drawn after entry `index`
pub fn has_transition_box(queue: &[QueueEntry], index: usize) -> bool {
    index + 1 < queue.len() && queue[index].has_transition()
}

/// Left edge of segment `index`
pub fn segment_start(queue: &[QueueEntry], index: usize, widths: &SegmentWidths) -> f64 {
    (0..index.min(queue.len()))
        .map(|i| {
            let transition = if has_transition_box(queue, i) {
                widths.transition_box()
            } else {
                0.0
            };
            widths.segment(i) + transition
        })
        .sum()
}

/// Playhead position for the playing segment.
///
/// While a transition clip plays, `current_index` still names the entry it leaves,
/// so progress runs across that entry's transition box instead of its song
/// segment.
pub fn compute_offset(
    queue: &[QueueEntry],
    current_index: usize,
    elapsed: Duration,
    segment_duration: Option<Duration>,
    in_transition: bool,
    widths: &SegmentWidths,
) -> f64 {
    let start = segment_start(queue, current_index, widths);
    let progress = match segment_duration {
        Some(duration) if !duration.is_zero() => {
            (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
        }
        _ => 0.0,
    };

    let song_width = widths.segment(current_index);
    if !in_transition {
        return start + progress * song_width;
    }
    let box_width = if has_transition_box(queue, current_index) {
        widths.transition_box()
    } else {
        0.0
    };
    start + song_width + progress * box_width
}

/// A point on the timeline expressed as queue entry and fraction through it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeekTarget {
    pub index: usize,
    pub fraction: f64,
}

/// Map a timeline offset back to the song segment under it. Offsets on a
/// transition box or past the last segment map to nothing.
pub fn locate(queue: &[QueueEntry], offset: f64, widths: &SegmentWidths) -> Option<SeekTarget> {
    if offset < 0.0 {
        return None;
    }

    let mut start = 0.0;
    for index in 0..queue.len() {
        let width = widths.segment(index);
        if offset < start + width {
            let fraction = if width > 0.0 { (offset - start) / width } else { 0.0 };
            return Some(SeekTarget { index, fraction });
        }
        start += width;

        if has_transition_box(queue, index) {
            start += widths.transition_box();
            if offset < start {
                return None;
            }
        }
    }
    None
}

/// Lay segments out across `viewport` units: the space left after the
/// transition boxes is shared equally, never below `min_width` per segment.
pub fn layout_segments(queue: &[QueueEntry], viewport: f64, min_width: f64, transition_box: f64) -> SegmentWidths {
    if queue.is_empty() {
        return SegmentWidths::with_transition_box(Vec::new(), transition_box);
    }

    let boxes = (0..queue.len())
        .filter(|&index| has_transition_box(queue, index))
        .count() as f64;
    let share = ((viewport - boxes * transition_box) / queue.len() as f64).floor();
    let width = share.max(min_width);

    SegmentWidths::with_transition_box(vec![width; queue.len()], transition_box)
}

/// Segment widths remembered until the entry count or the viewport changes
#[derive(Debug, Default)]
pub struct WidthCache {
    key: Option<(usize, u32)>,
    widths: Option<SegmentWidths>,
}

impl WidthCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached widths, measuring again with `measure` only when
    /// `entry_count` or `viewport` differ from the last measurement.
    pub fn get_or_measure(
        &mut self,
        entry_count: usize,
        viewport: u32,
        measure: impl FnOnce() -> SegmentWidths,
    ) -> &SegmentWidths {
        let key = (entry_count, viewport);
        if self.key != Some(key) || self.widths.is_none() {
            tracing::trace!(entry_count, viewport, "Measuring timeline segments");
            self.key = Some(key);
            self.widths = Some(measure());
        }
        self.widths.get_or_insert_with(|| SegmentWidths::new(Vec::new()))
    }

    pub fn current(&self) -> Option<&SegmentWidths> {
        self.widths.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.widths = None;
    }
}

//! Windows over the typed-subject set of a staging graph.

use crate::error::{ImportError, ImportResult};
use std::fmt;

/// `[offset, offset + limit)` over the ordered typed subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl Window {
    pub fn end(&self) -> u64 {
        self.offset + self.limit
    }
}

/// Records done out of the total, after a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: u64,
    pub total: u64,
}

impl Progress {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.done, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlicePlan {
    total: u64,
    slice_size: u64,
}

impl SlicePlan {
    pub fn new(total: u64, slice_size: u64) -> ImportResult<Self> {
        if slice_size == 0 {
            return Err(ImportError::Config(
                "slice size must be at least 1".to_string(),
            ));
        }
        Ok(Self { total, slice_size })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn window_count(&self) -> u64 {
        self.total.div_ceil(self.slice_size)
    }

    pub fn progress_after(&self, window: &Window) -> Progress {
        Progress {
            done: window.end().min(self.total),
            total: self.total,
        }
    }

    /// Contiguous, disjoint windows covering `[0, total)`; the last one may be short.
    pub fn windows(&self) -> Windows {
        Windows {
            next: 0,
            total: self.total,
            slice_size: self.slice_size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Windows {
    next: u64,
    total: u64,
    slice_size: u64,
}

impl Iterator for Windows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.next >= self.total {
            return None;
        }
        let window = Window {
            offset: self.next,
            limit: self.slice_size.min(self.total - self.next),
        };
        self.next += self.slice_size;
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn two_hundred_fifty_by_one_hundred() {
        let plan = SlicePlan::new(250, 100).unwrap();
        let windows: Vec<Window> = plan.windows().collect();
        assert_eq!(
            windows.iter().map(|w| w.limit).collect::<Vec<_>>(),
            vec![100, 100, 50]
        );
        let progress: Vec<String> = windows
            .iter()
            .map(|w| plan.progress_after(w).to_string())
            .collect();
        assert_eq!(progress, vec!["100/250", "200/250", "250/250"]);
    }

    #[test]
    fn empty_graph_has_no_windows() {
        let plan = SlicePlan::new(0, 100).unwrap();
        assert_eq!(plan.windows().count(), 0);
        assert_eq!(plan.window_count(), 0);
    }

    #[test]
    fn zero_slice_size_is_rejected() {
        assert!(matches!(
            SlicePlan::new(10, 0),
            Err(ImportError::Config(_))
        ));
    }

    proptest! {
        #[test]
        fn windows_partition_the_record_set(total in 0u64..5_000, slice in 1u64..700) {
            let plan = SlicePlan::new(total, slice).unwrap();
            let windows: Vec<Window> = plan.windows().collect();
            prop_assert_eq!(windows.len() as u64, plan.window_count());
            prop_assert_eq!(windows.iter().map(|w| w.limit).sum::<u64>(), total);

            let mut expected_offset = 0;
            for w in &windows {
                prop_assert_eq!(w.offset, expected_offset);
                prop_assert!(w.limit >= 1 && w.limit <= slice);
                expected_offset = w.end();
            }
            if let Some(last) = windows.last() {
                prop_assert_eq!(plan.progress_after(last).done, total);
            }
        }
    }
}

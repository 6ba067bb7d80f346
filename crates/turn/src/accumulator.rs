//! Bounded FIFO of recent forward candidates.

use std::collections::VecDeque;

/// What happened when a candidate was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorOutcome {
    /// Not enough samples yet.
    Waiting,
    /// Full and within the spread bound; carries the median. The buffer is cleared.
    Consistent(usize),
    /// Full but too spread out; the oldest sample was dropped.
    Inconsistent { dropped: usize, spread: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchAccumulator {
    candidates: VecDeque<usize>,
    capacity: usize,
}

impl MatchAccumulator {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            candidates: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, candidate: usize, max_spread: usize) -> AccumulatorOutcome {
        self.candidates.push_back(candidate);
        if self.candidates.len() < self.capacity {
            return AccumulatorOutcome::Waiting;
        }

        let spread = self.spread().unwrap_or(0);
        if spread <= max_spread {
            let median = self.median().unwrap_or(candidate);
            self.candidates.clear();
            return AccumulatorOutcome::Consistent(median);
        }

        let dropped = self.candidates.pop_front().unwrap_or(candidate);
        AccumulatorOutcome::Inconsistent { dropped, spread }
    }

    /// `max - min` of the buffered candidates.
    pub fn spread(&self) -> Option<usize> {
        let min = self.candidates.iter().min()?;
        let max = self.candidates.iter().max()?;
        Some(max - min)
    }

    /// Middle value; the upper median when the count is even.
    pub fn median(&self) -> Option<usize> {
        let mut sorted: Vec<usize> = self.candidates.iter().copied().collect();
        sorted.sort_unstable();
        sorted.get(sorted.len() / 2).copied()
    }

    pub fn candidates(&self) -> impl Iterator<Item = usize> + '_ {
        self.candidates.iter().copied()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistent_emits_median_and_clears() {
        let mut acc = MatchAccumulator::new(3);
        assert_eq!(acc.push(10, 5), AccumulatorOutcome::Waiting);
        assert_eq!(acc.push(11, 5), AccumulatorOutcome::Waiting);
        assert_eq!(acc.push(12, 5), AccumulatorOutcome::Consistent(11));
        assert!(acc.is_empty());
    }

    #[test]
    fn test_median_ignores_arrival_order() {
        let mut acc = MatchAccumulator::new(3);
        acc.push(14, 5);
        acc.push(10, 5);
        assert_eq!(acc.push(12, 5), AccumulatorOutcome::Consistent(12));
    }

    #[test]
    fn test_outlier_is_pruned_over_time() {
        let mut acc = MatchAccumulator::new(3);
        acc.push(10, 5);
        acc.push(50, 5);
        assert_eq!(
            acc.push(11, 5),
            AccumulatorOutcome::Inconsistent {
                dropped: 10,
                spread: 40
            }
        );
        assert_eq!(acc.candidates().collect::<Vec<_>>(), vec![50, 11]);

        assert!(matches!(acc.push(12, 5), AccumulatorOutcome::Inconsistent { dropped: 50, .. }));
        assert_eq!(acc.push(13, 5), AccumulatorOutcome::Consistent(12));
    }

    #[test]
    fn test_even_capacity_uses_upper_median() {
        let mut acc = MatchAccumulator::new(4);
        for c in [1, 2, 3] {
            acc.push(c, 5);
        }
        assert_eq!(acc.push(4, 5), AccumulatorOutcome::Consistent(3));
    }

    #[test]
    fn test_zero_capacity_behaves_as_one() {
        let mut acc = MatchAccumulator::new(0);
        assert_eq!(acc.capacity(), 1);
        assert_eq!(acc.push(7, 0), AccumulatorOutcome::Consistent(7));
    }

    #[test]
    fn test_empty_stats() {
        let acc = MatchAccumulator::new(3);
        assert_eq!(acc.spread(), None);
        assert_eq!(acc.median(), None);
        assert_eq!(acc.len(), 0);
    }
}

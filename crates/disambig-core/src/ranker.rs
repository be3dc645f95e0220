//! Streaming best-value accumulator with tie detection
//!
//! [`Ranker`] consumes `(key, value)` submissions one at a time and keeps the
//! best one seen so far. It also remembers whether the last accepted
//! submission tied the previous best, which is how callers learn that there
//! is no unique winner.

/// Which end of the ordering wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankMode {
    /// Smallest value wins
    #[default]
    Min,

    /// Largest value wins
    Max,
}

/// Outcome of a single submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// New best (strictly better, or the first submission)
    Accepted,

    /// Became the best by equalling the previous best value
    AcceptedTied,

    /// Strictly worse than the current best; ignored
    Rejected,
}

impl Observation {
    /// Whether the submission replaced the best key
    #[inline]
    #[must_use]
    pub fn is_accepted(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Single-pass min/max accumulator
///
/// # Example
/// ```
/// use disambig_core::ranker::{Observation, Ranker};
///
/// let mut ranker = Ranker::min();
/// assert_eq!(ranker.observe("a", 3), Observation::Accepted);
/// assert_eq!(ranker.observe("b", 5), Observation::Rejected);
/// assert_eq!(ranker.observe("c", 3), Observation::AcceptedTied);
/// assert_eq!(ranker.winner(), None);
/// ```
#[derive(Debug, Clone)]
pub struct Ranker<K, V> {
    mode: RankMode,
    best: Option<(K, V)>,
    count: usize,
    tied: bool,
}

impl<K, V: PartialOrd> Ranker<K, V> {
    /// Create ranker for the given mode
    #[inline]
    #[must_use]
    pub fn new(mode: RankMode) -> Self {
        Self {
            mode,
            best: None,
            count: 0,
            tied: false,
        }
    }

    /// Create minimum-mode ranker
    #[inline]
    #[must_use]
    pub fn min() -> Self {
        Self::new(RankMode::Min)
    }

    /// Create maximum-mode ranker
    #[inline]
    #[must_use]
    pub fn max() -> Self {
        Self::new(RankMode::Max)
    }

    /// Submit a candidate
    pub fn observe(&mut self, key: K, value: V) -> Observation {
        self.count += 1;

        if let Some((_, best)) = &self.best {
            let worse = match self.mode {
                RankMode::Min => value > *best,
                RankMode::Max => value < *best,
            };
            if worse {
                return Observation::Rejected;
            }
        }

        let tied = matches!(&self.best, Some((_, best)) if value == *best);
        self.tied = tied;
        self.best = Some((key, value));

        if tied {
            Observation::AcceptedTied
        } else {
            Observation::Accepted
        }
    }

    /// Key of the current best (last accepted) submission
    #[inline]
    #[must_use]
    pub fn best_key(&self) -> Option<&K> {
        self.best.as_ref().map(|(key, _)| key)
    }

    /// Current best value
    #[inline]
    #[must_use]
    pub fn best_value(&self) -> Option<&V> {
        self.best.as_ref().map(|(_, value)| value)
    }

    /// Number of submissions, accepted or not
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// True when the best value was reached by more than one submission
    #[inline]
    #[must_use]
    pub fn is_tied(&self) -> bool {
        self.tied
    }

    /// Key of the unique best submission, `None` when empty or tied
    #[inline]
    #[must_use]
    pub fn winner(&self) -> Option<&K> {
        if self.tied {
            None
        } else {
            self.best_key()
        }
    }

    /// Ranking direction
    #[inline]
    #[must_use]
    pub fn mode(&self) -> RankMode {
        self.mode
    }
}

impl<K, V: PartialOrd> Default for Ranker<K, V> {
    fn default() -> Self {
        Self::min()
    }
}

use std::cmp::Ordering;
use std::fmt;

/// Interval of runtime API levels a rule set applies to.
///
/// `below_or_equal` is always present; a missing `greater_or_equal` leaves the
/// interval open towards older levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ApiLevelRange {
    below_or_equal: u32,
    greater_or_equal: Option<u32>,
}

impl ApiLevelRange {
    pub const fn below_or_equal(level: u32) -> Self {
        Self {
            below_or_equal: level,
            greater_or_equal: None,
        }
    }

    pub const fn between(greater_or_equal: u32, below_or_equal: u32) -> Self {
        Self {
            below_or_equal,
            greater_or_equal: Some(greater_or_equal),
        }
    }

    pub const fn new(below_or_equal: u32, greater_or_equal: Option<u32>) -> Self {
        Self {
            below_or_equal,
            greater_or_equal,
        }
    }

    /// A range matching every API level.
    pub const fn unbounded() -> Self {
        Self::below_or_equal(u32::MAX)
    }

    pub const fn api_level_below_or_equal(&self) -> u32 {
        self.below_or_equal
    }

    pub const fn api_level_greater_or_equal(&self) -> Option<u32> {
        self.greater_or_equal
    }

    pub const fn has_api_level_greater_or_equal(&self) -> bool {
        self.greater_or_equal.is_some()
    }

    /// Whether a compilation whose minimum API level is `level` picks up this
    /// range.
    pub fn matches(&self, level: u32) -> bool {
        level <= self.below_or_equal && self.greater_or_equal.map_or(true, |min| level >= min)
    }

    /// A window like `[24, 23]` that no level can satisfy.
    pub fn is_empty(&self) -> bool {
        self.greater_or_equal
            .is_some_and(|min| min > self.below_or_equal)
    }

    /// Total order used for emission: by upper bound, then by lower bound with
    /// an absent lower bound first.
    pub fn deterministic_order(&self, other: &Self) -> Ordering {
        self.below_or_equal
            .cmp(&other.below_or_equal)
            .then_with(|| self.greater_or_equal.cmp(&other.greater_or_equal))
    }
}

impl PartialOrd for ApiLevelRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApiLevelRange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deterministic_order(other)
    }
}

impl fmt::Display for ApiLevelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.greater_or_equal {
            Some(min) => write!(f, "[{min}, {}]", self.below_or_equal),
            None => write!(f, "[.., {}]", self.below_or_equal),
        }
    }
}

/// Orders ranges the way they are authored and emitted: most recent first.
pub fn emission_order<'a>(ranges: impl IntoIterator<Item = &'a ApiLevelRange>) -> Vec<ApiLevelRange> {
    let mut sorted: Vec<ApiLevelRange> = ranges.into_iter().copied().collect();
    sorted.sort_by(|a, b| b.deterministic_order(a));
    sorted
}

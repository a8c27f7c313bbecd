//! Multi-valued signal domains: value sets and binary encoding.
//!
//! A node with value count `n` carries one of the values `0..n`. Sets of
//! values are packed into a single `u64`, which bounds the value count of
//! any signal to [`MAX_VALUES`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest value count a single signal may have.
pub const MAX_VALUES: u32 = 64;

/// Errors raised when a value count is outside the supported range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueSetError {
    /// Every signal needs at least two values.
    #[error("value count {0} is below the minimum of 2")]
    TooFewValues(u32),
    /// The value count does not fit in a packed value set.
    #[error("value count {0} exceeds the maximum of {MAX_VALUES}")]
    TooManyValues(u32),
}

/// Checks that `values` is a legal value count for a signal.
pub fn validate_value_count(values: u32) -> Result<u32, ValueSetError> {
    if values < 2 {
        Err(ValueSetError::TooFewValues(values))
    } else if values > MAX_VALUES {
        Err(ValueSetError::TooManyValues(values))
    } else {
        Ok(values)
    }
}

/// Number of binary variables needed to encode `values` distinct values.
///
/// A binary signal needs one bit, a 3- or 4-valued signal needs two.
pub fn bits_for_values(values: u32) -> u32 {
    if values <= 1 {
        return 0;
    }
    32 - (values - 1).leading_zeros()
}

/// A set of values of one multi-valued signal, packed as a bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ValueSet(u64);

impl ValueSet {
    /// The empty set.
    pub const EMPTY: ValueSet = ValueSet(0);

    /// Creates a set from a raw bitmask.
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bitmask.
    pub fn bits(self) -> u64 {
        self.0
    }

    /// The set `{0, 1, .., values - 1}`.
    pub fn full(values: u32) -> Self {
        debug_assert!(values <= MAX_VALUES);
        if values >= 64 {
            Self(u64::MAX)
        } else {
            Self((1u64 << values) - 1)
        }
    }

    /// The singleton set `{value}`.
    pub fn single(value: u32) -> Self {
        debug_assert!(value < MAX_VALUES);
        Self(1u64 << value)
    }

    /// Returns `true` if `value` is a member.
    pub fn contains(self, value: u32) -> bool {
        value < MAX_VALUES && self.0 & (1u64 << value) != 0
    }

    /// Adds `value` to the set.
    pub fn insert(&mut self, value: u32) {
        debug_assert!(value < MAX_VALUES);
        self.0 |= 1u64 << value;
    }

    /// Number of members.
    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns `true` if the set has no members.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the only member, if the set is a singleton.
    pub fn as_single(self) -> Option<u32> {
        if self.len() == 1 {
            Some(self.0.trailing_zeros())
        } else {
            None
        }
    }

    /// Set union.
    pub fn union(self, other: ValueSet) -> ValueSet {
        ValueSet(self.0 | other.0)
    }

    /// Set intersection.
    pub fn intersection(self, other: ValueSet) -> ValueSet {
        ValueSet(self.0 & other.0)
    }

    /// Iterates over members in increasing order.
    pub fn iter(self) -> impl Iterator<Item = u32> {
        let mut rest = self.0;
        std::iter::from_fn(move || {
            if rest == 0 {
                None
            } else {
                let v = rest.trailing_zeros();
                rest &= rest - 1;
                Some(v)
            }
        })
    }
}

impl fmt::Debug for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<u32> for ValueSet {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        let mut set = ValueSet::EMPTY;
        for v in iter {
            set.insert(v);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_needed() {
        assert_eq!(bits_for_values(2), 1);
        assert_eq!(bits_for_values(3), 2);
        assert_eq!(bits_for_values(4), 2);
        assert_eq!(bits_for_values(5), 3);
        assert_eq!(bits_for_values(64), 6);
    }

    #[test]
    fn value_count_validation() {
        assert_eq!(validate_value_count(2), Ok(2));
        assert_eq!(validate_value_count(1), Err(ValueSetError::TooFewValues(1)));
        assert_eq!(
            validate_value_count(65),
            Err(ValueSetError::TooManyValues(65))
        );
    }

    #[test]
    fn full_and_single() {
        let full = ValueSet::full(3);
        assert_eq!(full.len(), 3);
        assert!(full.contains(2));
        assert!(!full.contains(3));
        assert_eq!(ValueSet::single(5).as_single(), Some(5));
        assert_eq!(ValueSet::full(64).len(), 64);
    }

    #[test]
    fn iteration_is_sorted() {
        let set: ValueSet = [4, 1, 7].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 4, 7]);
    }

    #[test]
    fn union_and_intersection() {
        let a: ValueSet = [0, 1].into_iter().collect();
        let b: ValueSet = [1, 2].into_iter().collect();
        assert_eq!(a.union(b).len(), 3);
        assert_eq!(a.intersection(b).as_single(), Some(1));
        assert!(ValueSet::EMPTY.is_empty());
    }

    #[test]
    fn debug_lists_members() {
        let set: ValueSet = [0, 2].into_iter().collect();
        assert_eq!(format!("{set:?}"), "{0, 2}");
    }

    #[test]
    fn error_display() {
        let err = ValueSetError::TooManyValues(80);
        assert_eq!(format!("{err}"), "value count 80 exceeds the maximum of 64");
    }
}

//! Dense ordering check
//!
//! A collection of `N` members is dense when its positions are exactly
//! `{0, 1, …, N-1}`.

use std::collections::BTreeMap;

use kiosk_domain::Position;
use serde::{Deserialize, Serialize};

/// Result of checking a collection's positions for density
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DensityReport {
    /// Number of members inspected
    pub size: usize,
    /// Positions in `0..size` held by no member
    pub missing: Vec<Position>,
    /// Positions held by more than one member
    pub duplicated: Vec<Position>,
    /// Positions at or beyond `size`
    pub out_of_range: Vec<Position>,
}

impl DensityReport {
    /// No gaps, no duplicates
    pub fn is_dense(&self) -> bool {
        self.missing.is_empty() && self.duplicated.is_empty() && self.out_of_range.is_empty()
    }
}

/// Check positions (in any order) for density.
pub fn check_density<I>(positions: I) -> DensityReport
where
    I: IntoIterator<Item = Position>,
{
    let mut counts: BTreeMap<Position, usize> = BTreeMap::new();
    let mut size = 0usize;
    for position in positions {
        *counts.entry(position).or_default() += 1;
        size += 1;
    }

    let duplicated = counts.iter().filter(|(_, n)| **n > 1).map(|(p, _)| *p).collect();
    let out_of_range = counts.keys().filter(|p| p.as_index() >= size).copied().collect();
    let missing = (0..size)
        .filter_map(|index| Position::from_index(index).ok())
        .filter(|p| !counts.contains_key(p))
        .collect();

    DensityReport {
        size,
        missing,
        duplicated,
        out_of_range,
    }
}

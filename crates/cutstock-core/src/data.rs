use std::collections::BTreeMap;

use thiserror::Error;

use crate::parser::InputData;

/// Relative slack allowed when checking that parts fit in the stock
pub const LENGTH_TOLERANCE: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Stock length must be a positive number, got {0}")]
    InvalidStockLength(f64),
    #[error("No part lengths given")]
    NoParts,
    #[error("Got {lengths} part lengths but {demands} demands")]
    LengthMismatch { lengths: usize, demands: usize },
    #[error("Part {index} has invalid length {length}")]
    InvalidPartLength { index: usize, length: f64 },
    #[error("Part {index} of length {length} is longer than the stock length {stock_length}")]
    PartTooLong {
        index: usize,
        length: f64,
        stock_length: f64,
    },
    #[error("Part {index} has invalid demand {demand}")]
    InvalidDemand { index: usize, demand: f64 },
    #[error("Pattern refers to unknown part {0}")]
    UnknownPart(usize),
    #[error("Pattern uses length {used} but the stock length is {stock_length}")]
    PatternTooLong { used: f64, stock_length: f64 },
}

/// How many of each part one roll yields, keyed by part index.
///
/// Sparse: parts with a zero count are not stored.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pattern {
    counts: BTreeMap<usize, u32>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pattern cutting `count` pieces of a single part
    pub fn single(part: usize, count: u32) -> Self {
        [(part, count)].into_iter().collect()
    }

    pub fn count(&self, part: usize) -> u32 {
        self.counts.get(&part).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.counts.iter().map(|(&part, &count)| (part, count))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct parts in the pattern
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn pieces(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    pub fn used_length(&self, part_lengths: &[f64]) -> f64 {
        self.iter()
            .map(|(part, count)| f64::from(count) * part_lengths[part])
            .sum()
    }
}

impl FromIterator<(usize, u32)> for Pattern {
    fn from_iter<I: IntoIterator<Item = (usize, u32)>>(iter: I) -> Self {
        let counts = iter.into_iter().filter(|&(_, count)| count > 0).collect();
        Self { counts }
    }
}

/// A validated cutting-stock instance plus the patterns discovered so far.
///
/// Patterns are only ever appended; their position is the pattern index
/// used by the master problems.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct ProblemData {
    stock_length: f64,
    part_lengths: Vec<f64>,
    demands: Vec<f64>,
    patterns: Vec<Pattern>,
}

impl ProblemData {
    pub fn new(stock_length: f64, part_lengths: Vec<f64>, demands: Vec<f64>) -> Result<Self, DataError> {
        if !stock_length.is_finite() || stock_length <= 0.0 {
            return Err(DataError::InvalidStockLength(stock_length));
        }
        if part_lengths.is_empty() {
            return Err(DataError::NoParts);
        }
        if part_lengths.len() != demands.len() {
            return Err(DataError::LengthMismatch {
                lengths: part_lengths.len(),
                demands: demands.len(),
            });
        }
        for (index, &length) in part_lengths.iter().enumerate() {
            if !length.is_finite() || length <= 0.0 {
                return Err(DataError::InvalidPartLength { index, length });
            }
            if length > stock_length * (1.0 + LENGTH_TOLERANCE) {
                return Err(DataError::PartTooLong {
                    index,
                    length,
                    stock_length,
                });
            }
        }
        if let Some((index, &demand)) = demands
            .iter()
            .enumerate()
            .find(|&(_, &d)| !d.is_finite() || d < 0.0)
        {
            return Err(DataError::InvalidDemand { index, demand });
        }

        Ok(Self {
            stock_length,
            part_lengths,
            demands,
            patterns: Vec::new(),
        })
    }

    pub fn stock_length(&self) -> f64 {
        self.stock_length
    }

    pub fn part_lengths(&self) -> &[f64] {
        &self.part_lengths
    }

    pub fn demands(&self) -> &[f64] {
        &self.demands
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn num_parts(&self) -> usize {
        self.part_lengths.len()
    }

    /// Most pieces of `part` that fit in one roll
    pub fn max_count(&self, part: usize) -> u32 {
        let fit = (self.stock_length * (1.0 + LENGTH_TOLERANCE) / self.part_lengths[part]).floor();
        fit.min(f64::from(u32::MAX)) as u32
    }

    pub fn fits(&self, pattern: &Pattern) -> bool {
        pattern.iter().all(|(part, _)| part < self.num_parts())
            && pattern.used_length(&self.part_lengths) <= self.stock_length * (1.0 + LENGTH_TOLERANCE)
    }

    /// The "all of one part" pattern for every part
    pub fn trivial_patterns(&self) -> Vec<Pattern> {
        (0..self.num_parts())
            .map(|part| Pattern::single(part, self.max_count(part)))
            .collect()
    }

    /// Seed the trivial patterns. Does nothing once any pattern exists.
    pub fn seed_patterns(&mut self) {
        if self.patterns.is_empty() {
            self.patterns = self.trivial_patterns();
        }
    }

    /// Append a pattern, returning its index
    pub fn add_pattern(&mut self, pattern: Pattern) -> Result<usize, DataError> {
        if let Some((part, _)) = pattern.iter().find(|&(part, _)| part >= self.num_parts()) {
            return Err(DataError::UnknownPart(part));
        }
        if !self.fits(&pattern) {
            return Err(DataError::PatternTooLong {
                used: pattern.used_length(&self.part_lengths),
                stock_length: self.stock_length,
            });
        }
        self.patterns.push(pattern);
        Ok(self.patterns.len() - 1)
    }

    pub fn contains_pattern(&self, pattern: &Pattern) -> bool {
        self.patterns.iter().any(|p| p == pattern)
    }

    /// Total length of all demanded parts
    pub fn demanded_length(&self) -> f64 {
        self.part_lengths
            .iter()
            .zip(&self.demands)
            .map(|(len, demand)| len * demand)
            .sum()
    }
}

impl TryFrom<InputData> for ProblemData {
    type Error = DataError;

    fn try_from(input: InputData) -> Result<Self, Self::Error> {
        ProblemData::new(input.stock_length, input.part_lengths, input.demands)
    }
}

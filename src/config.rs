//! Knobs of a synthesis or generation session.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_MAX_SIZE: usize = 2;
pub const DEFAULT_RETRY_BUDGET: usize = 10;
pub const DEFAULT_MAX_ATTEMPTS: usize = 100_000;
pub const DEFAULT_SEED: u64 = 42;

pub const DEFAULT_ROWS: RangeInclusive<usize> = 5..=10;
pub const DEFAULT_COLS: RangeInclusive<usize> = 2..=4;
pub const DEFAULT_VALUES: RangeInclusive<i64> = -100..=100;
pub const DEFAULT_CATEGORIES: RangeInclusive<usize> = 2..=5;
pub const DEFAULT_WORDS: &[&str] = &[
    "apple", "river", "stone", "cloud", "ember", "maple", "orbit", "pearl",
    "quill", "tiger", "umber", "violet",
];

/// Search bounds. `max_size` counts production applications only
/// (see [`Expr::loc`](crate::expr::Expr::loc)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub max_depth: usize,
    pub max_size: usize,
}

impl Bounds {
    pub fn new(max_depth: usize, max_size: usize) -> Self {
        Self { max_depth, max_size }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, DEFAULT_MAX_SIZE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Exhaustive,
    /// Randomized candidates. `max_attempts` caps the number of
    /// candidates tried, without it the search may never end.
    Random { seed: u64, max_attempts: usize },
    /// SMT-guided enumeration with counterexample exclusion.
    Guided,
}

#[derive(Debug, Clone, Default)]
pub struct SynthConfig {
    pub bounds: Bounds,
    pub mode: Mode,
    pub policy: SamplingPolicy,
}

/// Relative weights the randomized enumerator uses when picking a
/// production for a hole. Productions not listed weigh 1, a weight of 0
/// disables a production.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplingPolicy {
    weights: HashMap<String, u32>,
}

impl SamplingPolicy {
    pub fn uniform() -> Self {
        Self::default()
    }

    pub fn with_weight(mut self, production: &str, weight: u32) -> Self {
        self.weights.insert(production.to_string(), weight);
        self
    }

    pub fn weight(&self, production: &str) -> u32 {
        self.weights.get(production).copied().unwrap_or(1)
    }
}

/// What a column of a synthetic input table holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Words drawn freely from the word list.
    Str,
    Float,
    Int,
    /// Words drawn from a handful of categories.
    StrCat,
    /// Ints drawn from a handful of categories.
    IntCat,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 5] = [
        ColumnKind::Str,
        ColumnKind::Float,
        ColumnKind::Int,
        ColumnKind::StrCat,
        ColumnKind::IntCat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Str => "string",
            ColumnKind::Float => "float",
            ColumnKind::Int => "int",
            ColumnKind::StrCat => "string_cat",
            ColumnKind::IntCat => "int_cat",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of the synthetic input tables the generator feeds its programs.
/// Column kinds are picked by weight, a weight of 0 rules a kind out.
#[derive(Debug, Clone, PartialEq)]
pub struct InputPolicy {
    weights: Vec<(ColumnKind, u32)>,
    pub rows: RangeInclusive<usize>,
    pub cols: RangeInclusive<usize>,
    /// Range of int cells, and of float cells before rounding.
    pub values: RangeInclusive<i64>,
    /// How many distinct categories a categorical column draws from.
    pub categories: RangeInclusive<usize>,
    pub words: Vec<String>,
}

impl InputPolicy {
    pub fn with_weight(mut self, kind: ColumnKind, weight: u32) -> Self {
        match self.weights.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = weight,
            None => self.weights.push((kind, weight)),
        }
        self
    }

    /// Keeps only `kind`.
    pub fn only(self, kind: ColumnKind) -> Self {
        ColumnKind::ALL.into_iter()
            .fold(self, |p, k| p.with_weight(k, u32::from(k == kind)))
    }

    pub fn weight(&self, kind: ColumnKind) -> u32 {
        self.weights.iter()
            .find(|(k, _)| *k == kind)
            .map_or(0, |(_, w)| *w)
    }

    pub fn weights(&self) -> &[(ColumnKind, u32)] {
        &self.weights
    }
}

impl Default for InputPolicy {
    fn default() -> Self {
        Self {
            weights: vec![
                (ColumnKind::Str, 1),
                (ColumnKind::Float, 2),
                (ColumnKind::Int, 4),
                (ColumnKind::StrCat, 2),
                (ColumnKind::IntCat, 2),
            ],
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            values: DEFAULT_VALUES,
            categories: DEFAULT_CATEGORIES,
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Failed or insane draws tolerated before giving up.
    pub retry_budget: usize,
    pub seed: u64,
    pub max_size: usize,
    pub policy: SamplingPolicy,
    /// Used when the generator draws its own inputs.
    pub inputs: InputPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            seed: DEFAULT_SEED,
            max_size: usize::MAX,
            policy: SamplingPolicy::default(),
            inputs: InputPolicy::default(),
        }
    }
}

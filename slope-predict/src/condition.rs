use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of condition classes the classifier scores.
pub const CONDITION_COUNT: usize = 4;

/// Surface condition classes, in classifier output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Condition {
    Powder,
    Packed,
    IcyCrust,
    Slush,
}

impl Condition {
    pub const ALL: [Condition; CONDITION_COUNT] = [
        Condition::Powder,
        Condition::Packed,
        Condition::IcyCrust,
        Condition::Slush,
    ];

    pub fn index(&self) -> usize {
        match self {
            Condition::Powder => 0,
            Condition::Packed => 1,
            Condition::IcyCrust => 2,
            Condition::Slush => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Condition> {
        Self::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Condition::Powder => "Powder",
            Condition::Packed => "Packed",
            Condition::IcyCrust => "IcyCrust",
            Condition::Slush => "Slush",
        }
    }

    /// Highest-probability class; ties go to the lowest index.
    pub fn most_likely(probabilities: &[f64; CONDITION_COUNT]) -> Condition {
        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate().skip(1) {
            if *p > probabilities[best] {
                best = i;
            }
        }
        Self::ALL[best]
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Condition probabilities for one course and day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionPrediction {
    pub date: NaiveDate,
    pub course_elevation_m: u32,
    /// Indexed by [`Condition::index`]; sums to 1.
    pub probabilities: [f64; CONDITION_COUNT],
    pub top_condition: Condition,
}

impl ConditionPrediction {
    pub fn new(date: NaiveDate, course_elevation_m: u32, probabilities: [f64; CONDITION_COUNT]) -> Self {
        ConditionPrediction {
            date,
            course_elevation_m,
            top_condition: Condition::most_likely(&probabilities),
            probabilities,
        }
    }

    pub fn probability(&self, condition: Condition) -> f64 {
        self.probabilities[condition.index()]
    }
}

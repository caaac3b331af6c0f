use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Letter grade bucket derived from a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Display order, best to worst.
    pub const ALL: [Grade; 7] = [
        Grade::APlus,
        Grade::A,
        Grade::BPlus,
        Grade::B,
        Grade::C,
        Grade::D,
        Grade::F,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps a percentage in [0, 100] to a grade.
///
/// | Range      | Grade |
/// |------------|-------|
/// | >= 90      | A+    |
/// | >= 80      | A     |
/// | >= 70      | B+    |
/// | >= 60      | B     |
/// | >= 50      | C     |
/// | >= 35      | D     |
/// | < 35       | F     |
///
/// Out-of-range and non-finite values are rejected, never clamped.
pub fn classify(percentage: f64) -> Result<Grade, AnalyticsError> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(AnalyticsError::InvalidInput(format!(
            "percentage {percentage} is outside [0, 100]"
        )));
    }

    let grade = match percentage {
        p if p >= 90.0 => Grade::APlus,
        p if p >= 80.0 => Grade::A,
        p if p >= 70.0 => Grade::BPlus,
        p if p >= 60.0 => Grade::B,
        p if p >= 50.0 => Grade::C,
        p if p >= 35.0 => Grade::D,
        _ => Grade::F,
    };
    Ok(grade)
}

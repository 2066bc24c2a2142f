use serde::{Deserialize, Serialize};
use std::fmt;

// ── Validation constants ────────────────────────────────────────────

/// Every letter grade a result sheet may hold, in display order.
pub const LETTER_GRADES: &[&str] = &[
    "O", "A+", "A", "B+", "B", "C", "D/P", "U", "AB", "UA", "RA", "SA", "W", "WD",
];

/// Marker used by uploaded sheets for "no grade supplied"; never stored.
pub const EMPTY_GRADE_MARKER: &str = "NONE";

/// Grades that count as an arrear in the semester they appear in.
pub const ARREAR_GRADES: &[&str] = &["U", "RA", "UA"];

/// Grade point for any grade string. Unknown or empty input resolves to 0.
pub fn grade_point(s: &str) -> u8 {
    Grade::parse(s).map(|g| g.point()).unwrap_or(0)
}

// ── Grade ───────────────────────────────────────────────────────────

/// One cell of a roster: a letter grade, or `Ungraded` (stored as `""`).
///
/// Documented as a plain string in OpenAPI schemas (`value_type = String`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Grade {
    #[default]
    Ungraded,
    O,
    APlus,
    A,
    BPlus,
    B,
    C,
    DP,
    U,
    AB,
    UA,
    RA,
    SA,
    W,
    WD,
}

impl Grade {
    /// Parse a stored grade string. `""` is `Ungraded`; anything outside the
    /// enumeration is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let grade = match s {
            "" => Grade::Ungraded,
            "O" => Grade::O,
            "A+" => Grade::APlus,
            "A" => Grade::A,
            "B+" => Grade::BPlus,
            "B" => Grade::B,
            "C" => Grade::C,
            "D/P" => Grade::DP,
            "U" => Grade::U,
            "AB" => Grade::AB,
            "UA" => Grade::UA,
            "RA" => Grade::RA,
            "SA" => Grade::SA,
            "W" => Grade::W,
            "WD" => Grade::WD,
            _ => return None,
        };
        Some(grade)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Ungraded => "",
            Grade::O => "O",
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::DP => "D/P",
            Grade::U => "U",
            Grade::AB => "AB",
            Grade::UA => "UA",
            Grade::RA => "RA",
            Grade::SA => "SA",
            Grade::W => "W",
            Grade::WD => "WD",
        }
    }

    /// Grade point on the 10-point scale. Failing, absent and ungraded cells are 0.
    pub fn point(&self) -> u8 {
        match self {
            Grade::O => 10,
            Grade::APlus => 9,
            Grade::A => 8,
            Grade::BPlus => 7,
            Grade::B => 6,
            Grade::C => 5,
            Grade::DP => 4,
            Grade::U
            | Grade::AB
            | Grade::UA
            | Grade::RA
            | Grade::SA
            | Grade::W
            | Grade::WD
            | Grade::Ungraded => 0,
        }
    }

    pub fn is_graded(&self) -> bool {
        !matches!(self, Grade::Ungraded)
    }

    /// U, RA and UA are arrears.
    pub fn is_arrear(&self) -> bool {
        matches!(self, Grade::U | Grade::RA | Grade::UA)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Grade {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Grade::parse(&value).ok_or_else(|| {
            format!(
                "Invalid grade: {}. Valid values: {}",
                value,
                LETTER_GRADES.join(", ")
            )
        })
    }
}

impl From<Grade> for String {
    fn from(g: Grade) -> Self {
        g.as_str().to_string()
    }
}

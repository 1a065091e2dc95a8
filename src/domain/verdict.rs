//! Operator answer to a suggestion

use std::fmt;

/// How the operator rated a suggested child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Accept and reinforce
    Super,
    /// Accept as is
    Ok,
    /// Reject, penalize and draw again
    No,
}

impl Verdict {
    /// Parse a typed answer. Blank input means `Ok`; unknown input is `None`.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "s" | "super" => Some(Verdict::Super),
            "o" | "ok" | "" => Some(Verdict::Ok),
            "n" | "no" => Some(Verdict::No),
            _ => None,
        }
    }

    pub fn accepts(self) -> bool {
        !matches!(self, Verdict::No)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Super => write!(f, "super"),
            Verdict::Ok => write!(f, "ok"),
            Verdict::No => write!(f, "no"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("s", Some(Verdict::Super))]
    #[case("Super", Some(Verdict::Super))]
    #[case("o", Some(Verdict::Ok))]
    #[case("", Some(Verdict::Ok))]
    #[case(" n ", Some(Verdict::No))]
    #[case("NO", Some(Verdict::No))]
    #[case("maybe", None)]
    fn test_parse(#[case] input: &str, #[case] expected: Option<Verdict>) {
        assert_eq!(Verdict::parse(input), expected);
    }
}

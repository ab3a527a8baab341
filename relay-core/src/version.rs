//! Version tokens and the numeric comparison rule.
//!
//! A [`Version`] is the normalized, component-wise numeric form of a dotted
//! version string. `"1.2"`, `"1.2.0"` and `"1.2.0.0"` all compare equal:
//! missing trailing components count as zero.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Characters that separate version components.
const SEPARATORS: &[char] = &['.', '-', '_', '+', ' '];

/// A normalized version token.
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    /// Normalize an arbitrary version string.
    ///
    /// Each separator-delimited component contributes its leading digits
    /// (`"3rc1"` → 3); a component without leading digits counts as zero.
    pub fn parse(raw: &str) -> Self {
        let mut components: Vec<u64> = raw
            .trim()
            .trim_start_matches(['v', 'V'])
            .split(SEPARATORS)
            .filter(|part| !part.is_empty())
            .map(leading_number)
            .collect();
        if components.is_empty() {
            components.push(0);
        }
        Self { components }
    }

    /// The version assigned to a task that has never been delivered.
    pub fn zero() -> Self {
        Self {
            components: vec![0],
        }
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Component-wise numeric comparison, padding the shorter side with zeros.
    pub fn compare(&self, other: &Version) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

fn leading_number(part: &str) -> u64 {
    let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
    // Overlong components saturate rather than wrap.
    digits.parse().unwrap_or(if digits.is_empty() { 0 } else { u64::MAX })
}

/// Find the first dotted version pattern (`1.2`, `10.0.3.1`) in page text.
pub fn extract_version(text: &str) -> Option<Version> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"\d+(?:\.\d+)+").ok())
        .as_ref()?;
    pattern.find(text).map(|m| Version::parse(m.as_str()))
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::zero()
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.0", "1.2")]
    #[case("1.2", "1.2.0.0")]
    #[case("1.2.0.0", "1.2.0")]
    #[case("v2.5", "2.5.0")]
    fn trailing_zeros_compare_equal(#[case] a: &str, #[case] b: &str) {
        assert_eq!(Version::parse(a).compare(&Version::parse(b)), Ordering::Equal);
    }

    #[rstest]
    #[case("1.3", "1.2.9")]
    #[case("2.0", "1.99.99")]
    #[case("1.10", "1.9")]
    #[case("10.0", "9.9.9.9")]
    fn numeric_not_lexical(#[case] greater: &str, #[case] lesser: &str) {
        let g = Version::parse(greater);
        let l = Version::parse(lesser);
        assert_eq!(g.compare(&l), Ordering::Greater);
        assert_eq!(l.compare(&g), Ordering::Less);
    }

    #[test]
    fn comparison_is_transitive() {
        let a = Version::parse("1.2.9");
        let b = Version::parse("1.3");
        let c = Version::parse("2.0");
        assert!(a < b && b < c && a < c);
    }

    #[test]
    fn display_is_normalized() {
        assert_eq!(Version::parse("01.002.3").to_string(), "1.2.3");
        assert_eq!(Version::parse("").to_string(), "0");
        assert_eq!(Version::parse("3.1-beta2").to_string(), "3.1.0");
    }

    #[test]
    fn extract_finds_first_dotted_token() {
        let text = "Firefox Portable 128.0.3 for Windows, released 2024";
        assert_eq!(extract_version(text).unwrap().to_string(), "128.0.3");
    }

    #[test]
    fn extract_ignores_bare_numbers() {
        assert!(extract_version("No release in 2024 yet").is_none());
    }

    #[test]
    fn serde_uses_string_form() {
        let v = Version::parse("4.0.1");
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"4.0.1\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}

//! Cell coercion shared by the readers.
//!
//! Spreadsheet exports write amounts as `1,18,000.00`, `Rs. 500`, `18%` or
//! `(250.00)`. Anything that still fails to parse is treated as absent.

use anyhow::Result;
use regex::Regex;

pub struct CellParser {
    noise_re: Regex,
    number_re: Regex,
}

impl CellParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            noise_re: Regex::new(r"(?i)(rs\.?|inr|₹|,|%|\s)")?,
            number_re: Regex::new(
                r"^(?P<paren>\()?(?P<num>[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?)\)?$",
            )?,
        })
    }

    /// Trimmed text; blank and `nan` cells are absent.
    pub fn text(&self, raw: &str) -> Option<String> {
        let s = raw.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("nan") {
            return None;
        }
        Some(s.to_string())
    }

    pub fn number(&self, raw: &str) -> Option<f64> {
        let cleaned = self.noise_re.replace_all(raw.trim(), "");
        let caps = self.number_re.captures(&cleaned)?;
        let value: f64 = caps["num"].parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        if caps.name("paren").is_some() {
            Some(-value.abs())
        } else {
            Some(value)
        }
    }

    /// Combined "GSTIN or state" cells hold a GSTIN when they carry more than two digits.
    pub fn looks_like_identifier(&self, raw: &str) -> bool {
        raw.chars().filter(char::is_ascii_digit).count() > 2
    }
}

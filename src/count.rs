//! Count recognition over counter stdout.
//!
//! GANAK-class counters print the exact model count as a comment line whose
//! shape varies across versions and modes. Recognition is an ordered rule
//! list: the first matching rule wins, then two fallbacks (an explicit
//! UNSAT report, and an unconditional zero).

use regex::Regex;
use tracing::debug;

/// Outcome of scanning counter stdout for a model count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedCount {
    /// A count line matched; payload is the captured decimal digits.
    Exact(String),
    /// No count line, but the counter reported `s UNSATISFIABLE`. An
    /// unsatisfiable formula has zero models, so the count is known.
    Unsat,
    /// Nothing recognized. Reported as `"0"` on the wire; callers should
    /// log it, since it conflates "zero models" with "unparseable output".
    Unrecognized,
}

impl ExtractedCount {
    /// The decimal string submitted to the dispatcher.
    pub fn count_str(&self) -> &str {
        match self {
            ExtractedCount::Exact(digits) => digits,
            ExtractedCount::Unsat | ExtractedCount::Unrecognized => "0",
        }
    }
}

/// A single recognition rule. The first capture group is the count.
struct CountRule {
    name: &'static str,
    pattern: Regex,
}

/// Ordered-rule extractor for counter stdout.
///
/// Compiles its patterns once; build it at startup and reuse it for every
/// task.
pub struct CountExtractor {
    rules: Vec<CountRule>,
}

impl CountExtractor {
    pub fn new() -> Self {
        let rules = vec![
            // Unweighted count line, e.g. "c o exact arb 42"
            CountRule {
                name: "exact-arb",
                pattern: Regex::new(r"c\s+o\s+exact\s+arb\s+(\d+)").unwrap(),
            },
            // Older variant, e.g. "c s exact arb int 42"
            CountRule {
                name: "exact-arb-int",
                pattern: Regex::new(r"c\s+s\s+exact\s+arb\s+int\s+(\d+)").unwrap(),
            },
        ];
        Self { rules }
    }

    /// Scan stdout with the rules in priority order.
    ///
    /// Total: any input (including the empty string) yields an outcome, and
    /// `count_str()` on that outcome is always a non-empty decimal string.
    pub fn extract(&self, stdout: &str) -> ExtractedCount {
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(stdout) {
                debug!(rule = rule.name, "count line matched");
                return ExtractedCount::Exact(caps[1].to_string());
            }
        }
        if stdout.contains("s UNSATISFIABLE") {
            return ExtractedCount::Unsat;
        }
        ExtractedCount::Unrecognized
    }
}

impl Default for CountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

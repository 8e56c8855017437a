//! Scan results, alert text and the scan cycle.

pub mod cycle;
pub mod fusion;

pub use cycle::{DispatchPolicy, ScanCycle, ScanOutcome, SignalSet};
pub use fusion::confluence;

use crate::signal::Score;
use chrono::{DateTime, Utc};
use std::fmt;

/// What caused a scan cycle. Used for logs and metrics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Interval,
    Daily,
    Manual,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            | TriggerKind::Interval => "interval",
            | TriggerKind::Daily => "daily",
            | TriggerKind::Manual => "manual",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cycle's four component scores and their confluence. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    ta: Score,
    social: Score,
    flow: Score,
    liquidity: Score,
    confluence: f64,
    timestamp: DateTime<Utc>,
}

impl ScanResult {
    pub fn new(ta: Score, social: Score, flow: Score, liquidity: Score, timestamp: DateTime<Utc>) -> Self {
        let confluence = fusion::confluence(ta.value(), social.value(), flow.value(), liquidity.value());
        Self { ta, social, flow, liquidity, confluence, timestamp }
    }

    pub fn ta(&self) -> Score {
        self.ta
    }

    pub fn social(&self) -> Score {
        self.social
    }

    pub fn flow(&self) -> Score {
        self.flow
    }

    pub fn liquidity(&self) -> Score {
        self.liquidity
    }

    pub fn confluence(&self) -> f64 {
        self.confluence
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// How many of the four sources produced a value.
    pub fn valid_count(&self) -> usize {
        [self.ta, self.social, self.flow, self.liquidity].iter().filter(|s| s.is_valid()).count()
    }
}

/// Alert text derived from exactly one `ScanResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage(String);

impl AlertMessage {
    /// `Signal: {confluence} (TA {ta}, Soc {social}, Flow {flow}, Liq {liquidity})`
    pub fn from_result(result: &ScanResult) -> Self {
        Self(format!(
            "Signal: {} (TA {}, Soc {}, Flow {}, Liq {})",
            fmt_ratio(result.confluence),
            fmt_ratio(result.ta.value()),
            fmt_ratio(result.social.value()),
            fmt_magnitude(result.flow.value()),
            fmt_ratio(result.liquidity.value()),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scores always show a decimal point: `0.0`, `0.5`, `-1.0`.
fn fmt_ratio(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Flow is a count or token amount: whole values print without a fraction.
fn fmt_magnitude(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-08T12:30:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_scenario_a_message() {
        let result = ScanResult::new(
            Score::Valid(0.5),
            Score::Valid(0.0),
            Score::Valid(0.0),
            Score::Valid(0.0),
            at(),
        );
        assert_eq!(result.confluence(), 0.2);
        assert_eq!(
            AlertMessage::from_result(&result).as_str(),
            "Signal: 0.2 (TA 0.5, Soc 0.0, Flow 0, Liq 0.0)"
        );
    }

    #[test]
    fn test_all_unavailable_message() {
        let result = ScanResult::new(
            Score::Unavailable,
            Score::Unavailable,
            Score::Unavailable,
            Score::Unavailable,
            at(),
        );
        assert_eq!(result.confluence(), 0.0);
        assert_eq!(result.valid_count(), 0);
        assert_eq!(
            AlertMessage::from_result(&result).to_string(),
            "Signal: 0.0 (TA 0.0, Soc 0.0, Flow 0, Liq 0.0)"
        );
    }

    #[test]
    fn test_message_with_fractional_flow() {
        let result = ScanResult::new(
            Score::Valid(-0.12),
            Score::Valid(0.31),
            Score::Valid(1234.56),
            Score::Valid(0.5),
            at(),
        );
        assert_eq!(result.confluence(), 247.0);
        assert_eq!(
            AlertMessage::from_result(&result).as_str(),
            "Signal: 247.0 (TA -0.12, Soc 0.31, Flow 1234.56, Liq 0.5)"
        );
    }

    #[test]
    fn test_solana_signature_count_prints_as_integer() {
        let result = ScanResult::new(
            Score::Unavailable,
            Score::Unavailable,
            Score::Valid(500.0),
            Score::Valid(1.0),
            at(),
        );
        assert_eq!(
            AlertMessage::from_result(&result).as_str(),
            "Signal: 100.1 (TA 0.0, Soc 0.0, Flow 500, Liq 1.0)"
        );
    }

    #[test]
    fn test_extreme_magnitudes_print_positionally() {
        let result = ScanResult::new(
            Score::Unavailable,
            Score::Unavailable,
            Score::Valid(1e17),
            Score::Valid(0.00001),
            at(),
        );
        assert_eq!(
            AlertMessage::from_result(&result).as_str(),
            "Signal: 20000000000000000.0 (TA 0.0, Soc 0.0, Flow 100000000000000000, Liq 0.00001)"
        );
    }
}

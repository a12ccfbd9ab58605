//! Per-window signal snapshot: asset -> signed conviction.
//!
//! Keyed by asset identifier so iteration order, and therefore tie-breaking
//! during allocation, is deterministic. An asset missing from the snapshot has
//! no signal for that window; a stored zero is an explicit neutral opinion.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
    values: BTreeMap<String, f64>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value. Non-finite values are not rankable and are dropped.
    pub fn insert(&mut self, code: impl Into<String>, value: f64) {
        if value.is_finite() {
            self.values.insert(code.into(), value);
        }
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.values.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Keeps only the assets for which `keep` returns true.
    pub fn filtered<F: FnMut(&str) -> bool>(&self, mut keep: F) -> Signal {
        Signal {
            values: self
                .values
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, &v)| (k.clone(), v))
                .collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Signal {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut signal = Signal::new();
        for (code, value) in iter {
            signal.insert(code, value);
        }
        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_values_are_dropped() {
        let signal: Signal = [("A", 0.5), ("B", f64::NAN), ("C", f64::NEG_INFINITY)]
            .into_iter()
            .collect();
        assert_eq!(signal.len(), 1);
        assert_eq!(signal.get("A"), Some(0.5));
        assert_eq!(signal.get("B"), None);
    }

    #[test]
    fn zero_is_kept_as_explicit_opinion() {
        let signal: Signal = [("A", 0.0)].into_iter().collect();
        assert_eq!(signal.get("A"), Some(0.0));
    }

    #[test]
    fn iteration_is_ordered_by_code() {
        let signal: Signal = [("MSFT", 1.0), ("AAPL", 2.0), ("GOOG", 3.0)]
            .into_iter()
            .collect();
        let codes: Vec<&str> = signal.iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec!["AAPL", "GOOG", "MSFT"]);
    }

    #[test]
    fn filtered_leaves_original_untouched() {
        let signal: Signal = [("A", 1.0), ("B", -1.0)].into_iter().collect();
        let only_b = signal.filtered(|c| c == "B");
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b.get("B"), Some(-1.0));
        assert_eq!(signal.len(), 2);
    }
}

//! Issues and the capped, ordered issue log.

use modelaudit_engine::engine::truncate_chars;
use serde::{Deserialize, Serialize};
use std::fmt;

const VALUE_DISPLAY_CHARS: usize = 50;
const FORMULA_DISPLAY_CHARS: usize = 250;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum IssueKind {
    Hardcode,
    Break,
    Error,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssueKind::Hardcode => "Hardcode",
            IssueKind::Break => "Pattern Break",
            IssueKind::Error => "Error",
        })
    }
}

/// One flagged cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub sheet_name: String,
    /// A1 address of the cell, e.g. `F12`.
    pub cell_address: String,
    pub row_label: String,
    /// What the cell holds: its value for literals and errors, its formula for breaks.
    pub actual_text: String,
    /// The row's dominant formula placed at this cell, or empty when there is none.
    pub expected_text: String,
    pub description: String,
    pub recommendation: String,
}

/// Cut a displayed value to its display width.
pub fn truncate_value(value: &str) -> String {
    truncate_chars(value, VALUE_DISPLAY_CHARS)
}

/// Cut a formula to its display width.
pub fn truncate_formula(formula: &str) -> String {
    truncate_chars(formula, FORMULA_DISPLAY_CHARS)
}

/// Append-only issue list that stops storing at a fixed capacity.
///
/// Pushes past the cap are counted in [`IssueLog::dropped`], never stored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueLog {
    capacity: usize,
    issues: Vec<Issue>,
    dropped: usize,
}

impl IssueLog {
    pub fn with_capacity(capacity: usize) -> Self {
        IssueLog {
            capacity,
            issues: Vec::new(),
            dropped: 0,
        }
    }

    /// Store `issue` if there is room. Returns false when it was dropped.
    pub fn push(&mut self, issue: Issue) -> bool {
        if self.is_full() {
            self.note_dropped();
            return false;
        }
        self.issues.push(issue);
        true
    }

    /// Count an issue that was never built because the log is full.
    pub fn note_dropped(&mut self) {
        if self.dropped == 0 {
            tracing::warn!(
                capacity = self.capacity,
                "issue cap reached, further issues are counted only"
            );
        }
        self.dropped += 1;
    }

    pub fn is_full(&self) -> bool {
        self.issues.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(n: usize) -> Issue {
        Issue {
            kind: IssueKind::Hardcode,
            sheet_name: "Model".into(),
            cell_address: format!("E{}", n),
            row_label: "Revenue".into(),
            actual_text: n.to_string(),
            expected_text: String::new(),
            description: String::new(),
            recommendation: String::new(),
        }
    }

    #[test]
    fn test_log_stops_at_capacity_and_counts_drops() {
        let mut log = IssueLog::with_capacity(2);
        assert!(log.push(issue(1)));
        assert!(log.push(issue(2)));
        assert!(!log.push(issue(3)));
        assert!(!log.push(issue(4)));
        assert_eq!(log.len(), 2);
        assert_eq!(log.dropped(), 2);
        assert_eq!(log.issues()[1].cell_address, "E2");
        assert_eq!(log.count_of(IssueKind::Hardcode), 2);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut log = IssueLog::with_capacity(0);
        assert!(!log.push(issue(1)));
        assert!(log.is_empty());
        assert_eq!(log.dropped(), 1);
    }

    #[test]
    fn test_display_truncation() {
        assert_eq!(truncate_value("short"), "short");
        let long = "x".repeat(60);
        assert_eq!(truncate_value(&long), format!("{}...", "x".repeat(50)));
        assert_eq!(truncate_formula(&long), long);
    }
}

//! Priority-ordered transfer rule matching.
//!
//! [`RuleMatcher`] is a pure function of the rule set and the issue: disabled
//! rules are dropped, the rest are stably sorted by descending priority, and
//! the first rule whose predicate groups all hold wins.

mod rule;

pub use rule::TransferRule;

use crate::issue::Issue;
use serde::Serialize;

/// A successful rule match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferMatch {
    /// Name of the matching rule.
    pub rule: String,
    /// Priority of the matching rule.
    pub priority: i32,
    /// Destination repository.
    pub target: String,
    /// Human-readable explanation.
    pub reason: String,
}

/// Outcome of evaluating a rule set against an issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferDecision {
    /// A rule matched.
    Matched(TransferMatch),
    /// No rule matched.
    NotMatched,
}

impl TransferDecision {
    /// Returns the match, if any.
    pub fn matched(&self) -> Option<&TransferMatch> {
        match self {
            Self::Matched(m) => Some(m),
            Self::NotMatched => None,
        }
    }
}

/// Evaluates a fixed rule set.
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    rules: Vec<TransferRule>,
}

impl RuleMatcher {
    /// Prepares `rules` for matching.
    pub fn new(rules: impl IntoIterator<Item = TransferRule>) -> Self {
        let mut rules: Vec<TransferRule> = rules.into_iter().filter(|r| r.enabled).collect();
        // `sort_by` is stable, so equal priorities keep their declared order.
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { rules }
    }

    /// Returns the enabled rules in evaluation order.
    pub fn rules(&self) -> &[TransferRule] {
        &self.rules
    }

    /// Finds the first rule matching `issue`.
    pub fn evaluate(&self, issue: &Issue) -> TransferDecision {
        for rule in &self.rules {
            if let Some(matched) = rule.evaluate(issue) {
                let reason = if matched.is_empty() {
                    format!("rule '{}' is a catch-all", rule.name)
                } else {
                    format!("rule '{}' matched: {}", rule.name, matched.join(", "))
                };
                return TransferDecision::Matched(TransferMatch {
                    rule: rule.name.clone(),
                    priority: rule.priority,
                    target: rule.target.clone(),
                    reason,
                });
            }
        }
        TransferDecision::NotMatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueId;

    fn issue(labels: &[&str]) -> Issue {
        let mut issue = Issue::new(
            IssueId::new("org", "app", 12),
            "Crash when opening settings",
            "Dana",
        );
        issue.body = "Steps to reproduce: open the Settings page".to_string();
        issue.labels = labels.iter().map(|l| l.to_string()).collect();
        issue
    }

    fn target(decision: &TransferDecision) -> Option<&str> {
        decision.matched().map(|m| m.target.as_str())
    }

    #[test]
    fn any_label_rule_beats_lower_catch_all() {
        let mut bugs = TransferRule::new("bugs", 10, "org/bugs");
        bugs.any_labels = vec!["bug".to_string()];
        let matcher = RuleMatcher::new([bugs, TransferRule::new("rest", 5, "org/catchall")]);

        let decision = matcher.evaluate(&issue(&["bug"]));

        assert_eq!(target(&decision), Some("org/bugs"));
        assert_eq!(
            decision.matched().unwrap().reason,
            "rule 'bugs' matched: label 'bug'"
        );
        assert_eq!(
            target(&matcher.evaluate(&issue(&["question"]))),
            Some("org/catchall")
        );
    }

    #[test]
    fn higher_priority_wins_regardless_of_declaration_order() {
        let mut low = TransferRule::new("low", 1, "org/low");
        low.any_labels = vec!["bug".to_string()];
        let mut high = TransferRule::new("high", 100, "org/high");
        high.any_labels = vec!["bug".to_string()];

        let matcher = RuleMatcher::new([low, high]);

        assert_eq!(target(&matcher.evaluate(&issue(&["bug"]))), Some("org/high"));
    }

    #[test]
    fn disabled_rules_never_match() {
        let mut disabled = TransferRule::new("disabled", 100, "org/never");
        disabled.enabled = false;
        let matcher = RuleMatcher::new([disabled, TransferRule::new("rest", 1, "org/rest")]);

        assert_eq!(target(&matcher.evaluate(&issue(&[]))), Some("org/rest"));
        assert_eq!(matcher.rules().len(), 1);
    }

    #[test]
    fn ties_keep_declaration_order() {
        let matcher = RuleMatcher::new([
            TransferRule::new("first", 3, "org/first"),
            TransferRule::new("second", 3, "org/second"),
        ]);

        assert_eq!(target(&matcher.evaluate(&issue(&[]))), Some("org/first"));
    }

    #[test]
    fn all_specified_groups_must_hold() {
        let mut rule = TransferRule::new("ui-crash", 10, "org/ui");
        rule.exact_labels = vec!["Bug".to_string(), "ui".to_string()];
        rule.title_substrings = vec!["CRASH".to_string()];
        rule.body_substrings = vec!["settings".to_string()];
        rule.authors = vec!["dana".to_string()];
        let matcher = RuleMatcher::new([rule]);

        let decision = matcher.evaluate(&issue(&["bug", "UI"]));
        assert_eq!(target(&decision), Some("org/ui"));
        assert_eq!(
            decision.matched().unwrap().reason,
            "rule 'ui-crash' matched: labels [Bug, ui], title contains 'CRASH', \
             body contains 'settings', author 'dana'"
        );

        // Missing one exact label.
        assert_eq!(matcher.evaluate(&issue(&["bug"])), TransferDecision::NotMatched);
    }

    #[test]
    fn author_must_match_exactly() {
        let mut rule = TransferRule::new("team", 1, "org/team");
        rule.authors = vec!["dan".to_string()];
        let matcher = RuleMatcher::new([rule]);

        assert_eq!(matcher.evaluate(&issue(&[])), TransferDecision::NotMatched);
    }

    #[test]
    fn predicates_fold_non_ascii_case_alike() {
        let mut rule = TransferRule::new("intl", 1, "org/intl");
        rule.any_labels = vec!["ÜBERSETZUNG".to_string()];
        rule.title_substrings = vec!["ÉCRAN".to_string()];
        rule.authors = vec!["ÉLODIE".to_string()];
        let matcher = RuleMatcher::new([rule]);

        let mut subject = Issue::new(IssueId::new("org", "app", 3), "Écran noir", "élodie");
        subject.labels = vec!["übersetzung".to_string()];

        assert_eq!(target(&matcher.evaluate(&subject)), Some("org/intl"));
    }

    #[test]
    fn empty_rule_set_does_not_match() {
        let matcher = RuleMatcher::new(Vec::new());
        assert_eq!(matcher.evaluate(&issue(&["bug"])), TransferDecision::NotMatched);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let mut bugs = TransferRule::new("bugs", 10, "org/bugs");
        bugs.any_labels = vec!["bug".to_string()];
        let matcher = RuleMatcher::new([bugs, TransferRule::new("rest", 5, "org/rest")]);
        let subject = issue(&["bug"]);

        let first = matcher.evaluate(&subject);
        for _ in 0..10 {
            assert_eq!(matcher.evaluate(&subject), first);
        }
    }

    #[test]
    fn validates_targets() {
        assert!(TransferRule::new("ok", 1, "org/repo").validate().is_ok());
        assert!(TransferRule::new("bad", 1, "org").validate().is_err());
        assert!(TransferRule::new("bad", 1, "org/repo/extra").validate().is_err());
        assert!(TransferRule::new(" ", 1, "org/repo").validate().is_err());
    }
}

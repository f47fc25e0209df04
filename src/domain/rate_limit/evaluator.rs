//! Sliding-window limit evaluation

use chrono::{DateTime, Utc};

use crate::domain::policy::{LimitRule, LimitScope, LimitSetting, LimitWindow};

/// Details of a limit that was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitRejection {
    pub scope: LimitScope,
    pub limit: u32,
    pub window: LimitWindow,
    /// Requests already in the window when the check ran
    pub count: u64,
}

/// Outcome of evaluating one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitDecision {
    /// Under the limit, or no limit configured
    Admit,
    /// The limit is unusable; the request is let through
    Misconfigured { reason: String },
    /// At or over the limit
    Reject(LimitRejection),
}

impl LimitDecision {
    pub fn is_reject(&self) -> bool {
        matches!(self, Self::Reject(_))
    }
}

/// Stateless limit evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimiter;

impl RateLimiter {
    /// Decide whether a request fits a scope's limit
    ///
    /// `count` is the number of ledger entries already inside the window. A
    /// scope without a setting admits; a misconfigured setting fails open.
    pub fn evaluate(scope: LimitScope, setting: Option<&LimitSetting>, count: u64) -> LimitDecision {
        let rule = match setting {
            None => return LimitDecision::Admit,
            Some(LimitSetting::Misconfigured { reason }) => {
                return LimitDecision::Misconfigured {
                    reason: reason.clone(),
                };
            }
            Some(LimitSetting::Rule(rule)) => rule,
        };

        if count >= u64::from(rule.limit()) {
            LimitDecision::Reject(LimitRejection {
                scope,
                limit: rule.limit(),
                window: rule.window(),
                count,
            })
        } else {
            LimitDecision::Admit
        }
    }

    /// Inclusive counting bounds for a rule, ending at `now`
    pub fn counting_window(rule: &LimitRule, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (rule.window().start_from(now), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn rule(limit: u32) -> LimitSetting {
        LimitSetting::Rule(LimitRule::new(limit, LimitWindow::minutes(1).unwrap()).unwrap())
    }

    #[test]
    fn test_no_setting_admits() {
        assert_eq!(
            RateLimiter::evaluate(LimitScope::Key, None, u64::MAX),
            LimitDecision::Admit
        );
    }

    #[test]
    fn test_below_limit_admits() {
        let setting = rule(3);
        assert_eq!(
            RateLimiter::evaluate(LimitScope::Key, Some(&setting), 2),
            LimitDecision::Admit
        );
    }

    #[test]
    fn test_at_limit_rejects() {
        let setting = rule(3);
        let decision = RateLimiter::evaluate(LimitScope::Method, Some(&setting), 3);

        match decision {
            LimitDecision::Reject(rejection) => {
                assert_eq!(rejection.scope, LimitScope::Method);
                assert_eq!(rejection.limit, 3);
                assert_eq!(rejection.count, 3);
            }
            other => panic!("expected reject, got {:?}", other),
        }
    }

    #[test]
    fn test_misconfigured_never_rejects() {
        let setting = LimitSetting::misconfigured("limit must be a positive integer, got 0");

        for count in [0, 1, 1_000_000] {
            let decision = RateLimiter::evaluate(LimitScope::Key, Some(&setting), count);
            assert!(!decision.is_reject());
            assert!(matches!(decision, LimitDecision::Misconfigured { .. }));
        }
    }

    #[test]
    fn test_counting_window() {
        let now = Utc::now();
        let rule = LimitRule::new(1, LimitWindow::minutes(5).unwrap()).unwrap();

        let (from, to) = RateLimiter::counting_window(&rule, now);

        assert_eq!(from, now - Duration::minutes(5));
        assert_eq!(to, now);
    }
}

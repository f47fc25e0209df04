//! Check-config command - validates configuration without serving

use crate::config::AppConfig;
use crate::domain::policy::PolicyRegistry;

/// Findings from a configuration check
#[derive(Debug, Default)]
pub struct ConfigReport {
    pub policies: usize,
    pub keys: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run the check and print the report
///
/// Fails when any error was found, or when `strict_limits` is set and any
/// limit is misconfigured.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let report = check(&config);

    println!(
        "{} policies, {} seeded keys",
        report.policies, report.keys
    );
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    for error in &report.errors {
        println!("error: {}", error);
    }

    if report.is_ok() {
        println!("configuration OK");
        Ok(())
    } else {
        anyhow::bail!("configuration has {} error(s)", report.errors.len())
    }
}

pub fn check(config: &AppConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    match crate::build_policy_registry(config, false) {
        Ok(registry) => {
            report.policies = registry.len();
            report.warnings.extend(
                registry
                    .diagnostics()
                    .into_iter()
                    .map(|warning| warning.to_string()),
            );

            if !config.guard.logging_enabled
                && registry.policies().iter().any(|(_, policy)| policy.has_limits())
            {
                report.warnings.push(
                    "limits are declared but request logging is disabled; they will never trigger"
                        .to_string(),
                );
            }

            if config.guard.strict_limits {
                if let Err(e) = crate::build_policy_registry(config, true) {
                    report.errors.push(e.to_string());
                }
            }
        }
        Err(e) => report.errors.push(e.to_string()),
    }

    match crate::seed_keys(&config.keys) {
        Ok(keys) => report.keys = keys.len(),
        Err(e) => report.errors.push(e.to_string()),
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedKeyConfig;
    use crate::domain::policy::{LimitDefinition, LimitsDefinition, PolicyDefinition};

    fn policy(route: &str, key_limit: Option<LimitDefinition>) -> PolicyDefinition {
        PolicyDefinition {
            route: route.to_string(),
            method: "GET".to_string(),
            key_authentication: true,
            level: None,
            limits: LimitsDefinition {
                key: key_limit,
                method: None,
            },
        }
    }

    fn limit(limit: i64, window: &str) -> Option<LimitDefinition> {
        Some(LimitDefinition {
            limit: Some(limit),
            window: Some(window.to_string()),
        })
    }

    #[test]
    fn test_clean_configuration() {
        let mut config = AppConfig::default();
        config.policies = vec![policy("/v1/books", limit(10, "1 minute"))];

        let report = check(&config);

        assert!(report.is_ok());
        assert!(report.warnings.is_empty());
        assert_eq!(report.policies, 1);
    }

    #[test]
    fn test_misconfigured_limit_is_a_warning() {
        let mut config = AppConfig::default();
        config.policies = vec![policy("/v1/books", limit(10, "whenever"))];

        let report = check(&config);

        assert!(report.is_ok());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_misconfigured_limit_is_an_error_when_strict() {
        let mut config = AppConfig::default();
        config.guard.strict_limits = true;
        config.policies = vec![policy("/v1/books", limit(-1, "1 minute"))];

        let report = check(&config);

        assert!(!report.is_ok());
    }

    #[test]
    fn test_duplicate_policy_and_bad_key_are_errors() {
        let mut config = AppConfig::default();
        config.policies = vec![policy("/v1/books", None), policy("/v1/books", None)];
        config.keys = vec![SeedKeyConfig {
            id: "k1".to_string(),
            key: "has space".to_string(),
            level: 0,
            ignore_limits: false,
        }];

        let report = check(&config);

        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_limits_without_logging_warn() {
        let mut config = AppConfig::default();
        config.guard.logging_enabled = false;
        config.policies = vec![policy("/v1/books", limit(10, "1 minute"))];

        let report = check(&config);

        assert!(report.is_ok());
        assert_eq!(report.warnings.len(), 1);
    }
}

//! Structured filter extraction from query text

use infraroute_core::{Environment, QueryFilters, Role};
use once_cell::sync::Lazy;
use regex::Regex;

/// Pre-production spellings, masked out before `prod` is tested
static PREPROD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(preprod|pre-prod|preproduction|pre-production)\b").unwrap()
});

static PROD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(prod|production)\b").unwrap());

/// Checked in order after `prod`
static ENVIRONMENT_PATTERNS: Lazy<Vec<(Environment, Regex)>> = Lazy::new(|| {
    vec![
        (Environment::Staging, r"\b(staging|stage|stg)\b"),
        (Environment::Dev, r"\b(dev|development)\b"),
    ]
    .into_iter()
    .map(|(env, p)| (env, Regex::new(p).expect("Invalid environment pattern")))
    .collect()
});

/// First match wins
static ROLE_PATTERNS: Lazy<Vec<(Role, Regex)>> = Lazy::new(|| {
    vec![
        (Role::Web, r"\b(web|webservers?|www|frontend)\b"),
        (Role::Db, r"\b(db|dbs|database|databases)\b"),
        (Role::Cache, r"\b(cache|caches|redis|memcached?)\b"),
        (Role::Mongo, r"\b(mongo|mongodb)\b"),
        (Role::Mysql, r"\bmysql\b"),
        (Role::Postgres, r"\b(postgres|postgresql|pg)\b"),
    ]
    .into_iter()
    .map(|(role, p)| (role, Regex::new(p).expect("Invalid role pattern")))
    .collect()
});

/// At most one environment and one role, by fixed precedence
pub fn extract_filters(text: &str) -> QueryFilters {
    // `_` joins words in host and tag names
    let text = text.to_lowercase().replace('_', " ");
    QueryFilters {
        environment: extract_environment(&text),
        role: ROLE_PATTERNS
            .iter()
            .find(|(_, p)| p.is_match(&text))
            .map(|(role, _)| *role),
    }
}

fn extract_environment(text: &str) -> Option<Environment> {
    let masked = PREPROD_PATTERN.replace_all(text, " ");
    if PROD_PATTERN.is_match(&masked) {
        return Some(Environment::Prod);
    }
    if PREPROD_PATTERN.is_match(text) {
        return Some(Environment::Preprod);
    }
    ENVIRONMENT_PATTERNS
        .iter()
        .find(|(_, p)| p.is_match(text))
        .map(|(env, _)| *env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprod_is_not_prod() {
        let filters = extract_filters("list preprod web servers");
        assert_eq!(filters.environment, Some(Environment::Preprod));
        assert_eq!(filters.role, Some(Role::Web));

        let filters = extract_filters("hosts in pre-prod");
        assert_eq!(filters.environment, Some(Environment::Preprod));
    }

    #[test]
    fn test_prod_with_separators() {
        let filters = extract_filters("list web-prod servers");
        assert_eq!(filters.environment, Some(Environment::Prod));
        assert_eq!(filters.role, Some(Role::Web));

        let filters = extract_filters("list prod_web servers");
        assert_eq!(filters.environment, Some(Environment::Prod));
        assert_eq!(filters.role, Some(Role::Web));

        assert_eq!(
            extract_filters("db_preprod hosts").environment,
            Some(Environment::Preprod)
        );
        assert_eq!(
            extract_filters("pre-prod and prod hosts").environment,
            Some(Environment::Prod)
        );
    }

    #[test]
    fn test_environment_synonyms() {
        assert_eq!(
            extract_filters("Production servers").environment,
            Some(Environment::Prod)
        );
        assert_eq!(extract_filters("prod").environment, Some(Environment::Prod));
        assert_eq!(
            extract_filters("stage boxes").environment,
            Some(Environment::Staging)
        );
        assert_eq!(
            extract_filters("development db").environment,
            Some(Environment::Dev)
        );
        assert_eq!(extract_filters("products table").environment, None);
    }

    #[test]
    fn test_environment_precedence() {
        assert_eq!(
            extract_filters("compare dev and prod hosts").environment,
            Some(Environment::Prod)
        );
    }

    #[test]
    fn test_role_first_match_wins() {
        assert_eq!(extract_filters("web and db servers").role, Some(Role::Web));
        assert_eq!(extract_filters("redis nodes").role, Some(Role::Cache));
        assert_eq!(extract_filters("postgresql hosts").role, Some(Role::Postgres));
        assert_eq!(extract_filters("mysql and mongo").role, Some(Role::Mongo));
    }

    #[test]
    fn test_no_filters() {
        assert!(extract_filters("list all servers").is_empty());
        assert!(extract_filters("").is_empty());
    }
}

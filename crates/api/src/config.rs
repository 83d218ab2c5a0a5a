/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    /// A single `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for in-flight requests after a shutdown signal (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Reject iFDO documents with structural issues instead of logging them.
    pub strict_validation: bool,
    pub database_url: String,
    pub db_max_connections: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                  |
    /// |--------------------------|--------------------------|
    /// | `HOST`                   | `0.0.0.0`                |
    /// | `PORT`                   | `8000`                   |
    /// | `CORS_ORIGINS`           | `http://localhost:3000`  |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                     |
    /// | `IFDO_STRICT_VALIDATION` | `false`                  |
    /// | `DB_MAX_CONNECTIONS`     | `20`                     |
    /// | `DATABASE_URL`           | composed from `POSTGRES_*` |
    pub fn from_env() -> Self {
        let env = |name: &str| std::env::var(name).ok();

        let host = env("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port: u16 = env("PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &env("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:3000".into()),
        );

        let request_timeout_secs: u64 = env("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = env("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let strict_validation = env("IFDO_STRICT_VALIDATION")
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);

        let db_max_connections: u32 = env("DB_MAX_CONNECTIONS")
            .map(|raw| raw.parse().expect("DB_MAX_CONNECTIONS must be a valid u32"))
            .unwrap_or(ifdo_db::DEFAULT_MAX_CONNECTIONS);

        let database_url = database_url_from(env);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            strict_validation,
            database_url,
            db_max_connections,
        }
    }
}

/// `DATABASE_URL` if set, otherwise a URL built from the `POSTGRES_*` variables.
pub fn database_url_from(env: impl Fn(&str) -> Option<String>) -> String {
    if let Some(url) = env("DATABASE_URL").filter(|url| !url.is_empty()) {
        return url;
    }
    let user = env("POSTGRES_USER").unwrap_or_else(|| "postgres".into());
    let password = env("POSTGRES_PASSWORD").unwrap_or_default();
    let host = env("POSTGRES_HOST").unwrap_or_else(|| "localhost".into());
    let port = env("POSTGRES_PORT").unwrap_or_else(|| "5432".into());
    let db = env("POSTGRES_DB").unwrap_or_else(|| "paidiver_st3".into());

    if password.is_empty() {
        format!("postgres://{user}@{host}:{port}/{db}")
    } else {
        format!("postgres://{user}:{password}@{host}:{port}/{db}")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn database_url_wins_when_set() {
        let url = database_url_from(lookup(&[
            ("DATABASE_URL", "postgres://app@db/catalog"),
            ("POSTGRES_USER", "ignored"),
        ]));
        assert_eq!(url, "postgres://app@db/catalog");
    }

    #[test]
    fn database_url_composed_from_parts() {
        let url = database_url_from(lookup(&[
            ("POSTGRES_USER", "ifdo"),
            ("POSTGRES_PASSWORD", "secret"),
            ("POSTGRES_HOST", "pg"),
            ("POSTGRES_PORT", "6543"),
            ("POSTGRES_DB", "catalog"),
        ]));
        assert_eq!(url, "postgres://ifdo:secret@pg:6543/catalog");
    }

    #[test]
    fn database_url_defaults() {
        assert_eq!(
            database_url_from(lookup(&[])),
            "postgres://postgres@localhost:5432/paidiver_st3"
        );
    }

    #[test]
    fn origins_are_trimmed_and_filtered() {
        assert_eq!(
            parse_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn strict_flag_values() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("maybe"));
    }
}

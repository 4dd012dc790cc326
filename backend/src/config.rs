use anyhow::{anyhow, Context};
use chrono::Duration;
use std::{env, net::SocketAddr, str::FromStr};

use crate::utils::cookies::{CookieOptions, SameSite};

/// Whether a mailed login link may keep acting as a bearer credential after
/// it has been redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginLinkPolicy {
    /// The redeemed link token becomes the session cookie and stays valid
    /// until it expires.
    #[default]
    Reusable,
    /// A link can be redeemed once; redemption issues a separate session token.
    SingleUse,
}

impl FromStr for LoginLinkPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reusable" => Ok(LoginLinkPolicy::Reusable),
            "single_use" | "single-use" | "singleuse" => Ok(LoginLinkPolicy::SingleUse),
            other => Err(anyhow!("Invalid LOGIN_LINK_POLICY value: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime of login links and session tokens.
    pub ttl: Duration,
    /// Remaining lifetime at or below which the session guard reissues a token.
    pub renewal_threshold: Duration,
    pub login_link_policy: LoginLinkPolicy,
    pub cookie: CookieOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
            renewal_threshold: Duration::seconds(30),
            login_link_policy: LoginLinkPolicy::Reusable,
            cookie: CookieOptions {
                secure: false,
                same_site: SameSite::Lax,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub skip_send: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub jwt_secret: String,
    /// Base URL used to build the login links sent by email.
    pub public_base_url: String,
    pub session: SessionConfig,
    pub smtp: SmtpConfig,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL")
            .unwrap_or_else(|| "postgres://postgres@localhost/medicines".to_string());

        let listen_addr = var("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let listen_addr: SocketAddr = listen_addr
            .parse()
            .map_err(|_| anyhow!("Invalid LISTEN_ADDR value: {}", listen_addr))?;

        let jwt_secret = var("JWT_SECRET").ok_or_else(|| anyhow!("JWT_SECRET must be set"))?;

        let ttl_hours: i64 = parse_or(&var, "SESSION_TTL_HOURS", 24)?;
        if ttl_hours <= 0 {
            return Err(anyhow!("SESSION_TTL_HOURS must be positive"));
        }
        let renewal_seconds: i64 = parse_or(&var, "SESSION_RENEWAL_THRESHOLD_SECONDS", 30)?;
        if renewal_seconds < 0 {
            return Err(anyhow!("SESSION_RENEWAL_THRESHOLD_SECONDS must not be negative"));
        }

        let login_link_policy = match var("LOGIN_LINK_POLICY") {
            Some(value) => value.parse()?,
            None => LoginLinkPolicy::default(),
        };

        let cookie = CookieOptions {
            secure: parse_bool(var("COOKIE_SECURE").as_deref()),
            same_site: match var("COOKIE_SAMESITE") {
                Some(value) => value.parse()?,
                None => SameSite::Lax,
            },
        };

        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://127.0.0.1:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let username = var("EMAIL").unwrap_or_default();
        let smtp = SmtpConfig {
            host: var("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: parse_or(&var, "SMTP_PORT", 587)?,
            from_address: var("SMTP_FROM_ADDRESS").unwrap_or_else(|| username.clone()),
            username,
            password: var("EMAIL_PASSWORD").unwrap_or_default(),
            skip_send: parse_bool(var("SMTP_SKIP_SEND").as_deref()),
        };

        Ok(Config {
            database_url,
            listen_addr,
            jwt_secret,
            public_base_url,
            session: SessionConfig {
                ttl: Duration::hours(ttl_hours),
                renewal_threshold: Duration::seconds(renewal_seconds),
                login_link_policy,
                cookie,
            },
            smtp,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value: {}", key, raw)),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load_from(&[("JWT_SECRET", "s3cret")]).expect("load config");
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.session.ttl, Duration::hours(24));
        assert_eq!(config.session.renewal_threshold, Duration::seconds(30));
        assert_eq!(config.session.login_link_policy, LoginLinkPolicy::Reusable);
        assert!(!config.session.cookie.secure);
        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.public_base_url, "http://127.0.0.1:8080");
        assert_eq!(config.smtp.host, "smtp.gmail.com");
        assert_eq!(config.smtp.port, 587);
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = load_from(&[]).expect_err("secret is required");
        assert!(err.to_string().contains("JWT_SECRET"));

        assert!(load_from(&[("JWT_SECRET", "   ")]).is_err());
    }

    #[test]
    fn session_policy_is_tunable() {
        let config = load_from(&[
            ("JWT_SECRET", "s"),
            ("SESSION_TTL_HOURS", "2"),
            ("SESSION_RENEWAL_THRESHOLD_SECONDS", "120"),
            ("LOGIN_LINK_POLICY", "single_use"),
            ("COOKIE_SECURE", "true"),
            ("COOKIE_SAMESITE", "strict"),
            ("PUBLIC_BASE_URL", "https://meds.example.com/"),
        ])
        .expect("load config");
        assert_eq!(config.session.ttl, Duration::hours(2));
        assert_eq!(config.session.renewal_threshold, Duration::seconds(120));
        assert_eq!(config.session.login_link_policy, LoginLinkPolicy::SingleUse);
        assert!(config.session.cookie.secure);
        assert!(matches!(config.session.cookie.same_site, SameSite::Strict));
        assert_eq!(config.public_base_url, "https://meds.example.com");
    }

    #[test]
    fn invalid_values_fail_loading() {
        assert!(load_from(&[("JWT_SECRET", "s"), ("SESSION_TTL_HOURS", "abc")]).is_err());
        assert!(load_from(&[("JWT_SECRET", "s"), ("SESSION_TTL_HOURS", "0")]).is_err());
        assert!(load_from(&[("JWT_SECRET", "s"), ("LOGIN_LINK_POLICY", "never")]).is_err());
        assert!(load_from(&[("JWT_SECRET", "s"), ("COOKIE_SAMESITE", "sideways")]).is_err());
        assert!(load_from(&[("JWT_SECRET", "s"), ("LISTEN_ADDR", "nowhere")]).is_err());
    }

    #[test]
    fn smtp_sender_defaults_to_login_email() {
        let config = load_from(&[
            ("JWT_SECRET", "s"),
            ("EMAIL", "clinic@example.com"),
            ("EMAIL_PASSWORD", "pw"),
            ("SMTP_SKIP_SEND", "1"),
        ])
        .expect("load config");
        assert_eq!(config.smtp.from_address, "clinic@example.com");
        assert_eq!(config.smtp.username, "clinic@example.com");
        assert!(config.smtp.skip_send);
    }
}

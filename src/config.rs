use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, NaiveTime};
use dotenvy::dotenv;
use thiserror::Error;

use crate::policy::access_control::UnresolvedRole;
use crate::policy::attendance_window::WindowSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("late window must start before it ends ({start} >= {end})")]
    EmptyLateWindow { start: NaiveTime, end: NaiveTime },
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    // Tokens are issued by the hosted identity provider
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub webhook_secret: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_hooks_per_min: u32,

    pub api_prefix: String,
    pub log_level: tracing::Level,

    pub window: WindowSettings,
    pub unresolved_role: UnresolvedRole,
    pub attendance_cache_ttl: Duration,
    pub change_feed_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let offset_minutes: i32 = parse_or("REFERENCE_UTC_OFFSET_MINUTES", 360)?;
        let reference_offset = FixedOffset::east_opt(offset_minutes * 60).ok_or(ConfigError::Invalid {
            key: "REFERENCE_UTC_OFFSET_MINUTES",
            value: offset_minutes.to_string(),
        })?;

        let window = WindowSettings {
            reference_offset,
            late_window_start: time_or("LATE_WINDOW_START", "11:50:00")?,
            late_window_end: time_or("LATE_WINDOW_END", "11:55:00")?,
            evening_cutoff: time_or("EVENING_CUTOFF", "23:50:00")?,
        };
        if window.late_window_start >= window.late_window_end {
            return Err(ConfigError::EmptyLateWindow {
                start: window.late_window_start,
                end: window.late_window_end,
            });
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string()),
            webhook_secret: required("WEBHOOK_SECRET")?,

            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", 1000)?,
            rate_hooks_per_min: parse_or("RATE_HOOKS_PER_MIN", 600)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
            log_level: parse_or("LOG_LEVEL", tracing::Level::DEBUG)?,

            window,
            unresolved_role: parse_or("RBAC_UNRESOLVED_ROLE", UnresolvedRole::Deny)?,
            attendance_cache_ttl: Duration::from_secs(parse_or("ATTENDANCE_CACHE_TTL_SECS", 300)?),
            change_feed_capacity: parse_or("CHANGE_FEED_CAPACITY", 1024)?,
        })
    }

    #[cfg(test)]
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            server_addr: "127.0.0.1:0".to_string(),
            jwt_secret: jwt_secret.to_string(),
            jwt_audience: "authenticated".to_string(),
            webhook_secret: "hook-secret".to_string(),
            rate_protected_per_min: 1000,
            rate_hooks_per_min: 600,
            api_prefix: "/api/v1".to_string(),
            log_level: tracing::Level::DEBUG,
            window: WindowSettings::default(),
            unresolved_role: UnresolvedRole::Deny,
            attendance_cache_ttl: Duration::from_secs(300),
            change_feed_capacity: 16,
        }
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn time_or(key: &'static str, default: &str) -> Result<NaiveTime, ConfigError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S").map_err(|_| ConfigError::Invalid { key, value: raw })
}

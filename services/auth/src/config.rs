//! Authentication service configuration

use anyhow::Result;

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Days a newly issued session stays valid
    pub session_lifetime_days: i64,
    /// Trailing window in which a validated session is renewed, in days
    pub session_refresh_days: i64,
    /// Minimum accepted password length
    pub min_password_length: usize,
    /// Maximum accepted password length
    pub max_password_length: usize,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,
    /// Invalidate a previously presented session when logging in
    pub single_session_per_login: bool,
    /// Address the HTTP server binds to
    pub bind_address: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_lifetime_days: 30,
            session_refresh_days: 15,
            min_password_length: 8,
            max_password_length: 24,
            cookie_name: "konnekt-session".to_string(),
            cookie_secure: false,
            single_session_per_login: true,
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AuthConfig {
    /// Create a new AuthConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SESSION_LIFETIME_DAYS`: Days a new session stays valid (default: 30)
    /// - `SESSION_REFRESH_DAYS`: Renewal window in days (default: 15)
    /// - `MIN_PASSWORD_LENGTH`: Minimum password length (default: 8)
    /// - `MAX_PASSWORD_LENGTH`: Maximum password length (default: 24)
    /// - `SESSION_COOKIE_NAME`: Session cookie name (default: "konnekt-session")
    /// - `SESSION_COOKIE_SECURE`: Mark the cookie `Secure` (default: false)
    /// - `SINGLE_SESSION_PER_LOGIN`: Invalidate the prior session on login (default: true)
    /// - `BIND_ADDRESS`: HTTP bind address (default: "0.0.0.0:3000")
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let session_lifetime_days = std::env::var("SESSION_LIFETIME_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.session_lifetime_days);

        let session_refresh_days = std::env::var("SESSION_REFRESH_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.session_refresh_days);

        let min_password_length = std::env::var("MIN_PASSWORD_LENGTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.min_password_length);

        let max_password_length = std::env::var("MAX_PASSWORD_LENGTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_password_length);

        let cookie_name =
            std::env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name);

        let cookie_secure = std::env::var("SESSION_COOKIE_SECURE")
            .map(|v| v == "true")
            .unwrap_or(defaults.cookie_secure);

        let single_session_per_login = std::env::var("SINGLE_SESSION_PER_LOGIN")
            .map(|v| v != "false")
            .unwrap_or(defaults.single_session_per_login);

        let bind_address = std::env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address);

        Ok(Self {
            session_lifetime_days,
            session_refresh_days,
            min_password_length,
            max_password_length,
            cookie_name,
            cookie_secure,
            single_session_per_login,
            bind_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_auth_config_defaults() {
        unsafe {
            std::env::remove_var("SESSION_LIFETIME_DAYS");
            std::env::remove_var("SESSION_REFRESH_DAYS");
            std::env::remove_var("SESSION_COOKIE_NAME");
            std::env::remove_var("SINGLE_SESSION_PER_LOGIN");
        }

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.session_lifetime_days, 30);
        assert_eq!(config.session_refresh_days, 15);
        assert_eq!(config.min_password_length, 8);
        assert_eq!(config.max_password_length, 24);
        assert_eq!(config.cookie_name, "konnekt-session");
        assert!(config.single_session_per_login);
    }

    #[test]
    #[serial]
    fn test_auth_config_from_env_with_custom_values() {
        unsafe {
            std::env::set_var("SESSION_LIFETIME_DAYS", "7");
            std::env::set_var("SESSION_REFRESH_DAYS", "3");
            std::env::set_var("SESSION_COOKIE_NAME", "test-session");
            std::env::set_var("SINGLE_SESSION_PER_LOGIN", "false");
        }

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.session_lifetime_days, 7);
        assert_eq!(config.session_refresh_days, 3);
        assert_eq!(config.cookie_name, "test-session");
        assert!(!config.single_session_per_login);

        unsafe {
            std::env::remove_var("SESSION_LIFETIME_DAYS");
            std::env::remove_var("SESSION_REFRESH_DAYS");
            std::env::remove_var("SESSION_COOKIE_NAME");
            std::env::remove_var("SINGLE_SESSION_PER_LOGIN");
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Unit tests for configuration module

#[cfg(test)]
mod test {
    use super::super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_addr, "0.0.0.0:9091");
        assert_eq!(config.base_url, "https://mafreebox.freebox.fr/api/v8/");
        assert_eq!(config.collection_interval_secs, 30);
        assert_eq!(config.poll_endpoints, vec!["connection/", "system/"]);
        assert!(config.app_token_file.is_none());
    }

    #[test]
    fn test_transport_defaults_are_bounded() {
        let options = TransportOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.idle_timeout, Duration::from_secs(600));
        assert_eq!(options.max_idle_per_host, 10);
    }

    #[test]
    fn test_retry_config_defaults() {
        let retry = RetryConfig::from_raw(None, None);
        assert_eq!(retry.min_delay, Duration::from_secs(5));
        assert_eq!(retry.max_delay, Duration::from_secs(60));
    }

    #[test]
    fn test_retry_config_overrides() {
        let retry = RetryConfig::from_raw(Some("2s"), Some("30s"));
        assert_eq!(retry.min_delay, Duration::from_secs(2));
        assert_eq!(retry.max_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_retry_config_invalid_values_fall_back() {
        let retry = RetryConfig::from_raw(Some("soon"), Some("10"));
        assert_eq!(retry, RetryConfig::default());
    }

    #[test]
    fn test_duration_accepts_combined_units() {
        let default = Duration::from_secs(7);
        assert_eq!(
            duration_or_default("T", Some("1h2m"), default),
            Duration::from_secs(3720)
        );
        assert_eq!(
            duration_or_default("T", Some("1m30s"), default),
            Duration::from_secs(90)
        );
        assert_eq!(
            duration_or_default("T", Some(" 1h 30m "), default),
            Duration::from_secs(5400)
        );
        assert_eq!(
            duration_or_default("T", Some("300ms"), default),
            Duration::from_millis(300)
        );
        assert_eq!(duration_or_default("T", None, default), default);
    }

    #[test]
    fn test_duration_rejects_zero_fraction_and_bare_numbers() {
        let default = Duration::from_secs(7);
        for raw in ["1.5s", "0s", "-5s", "10", "soon", ""] {
            assert_eq!(
                duration_or_default("T", Some(raw), default),
                default,
                "{raw:?} should fall back"
            );
        }
    }

    #[test]
    fn test_retry_config_max_below_min_is_raised() {
        let retry = RetryConfig::from_raw(Some("2m"), Some("30s"));
        assert_eq!(retry.min_delay, Duration::from_secs(120));
        assert_eq!(retry.max_delay, Duration::from_secs(120));
    }

    #[test]
    fn test_parse_app_token_raw() {
        let token = parse_app_token("  dyNYgfK0Ya6FWGqq83sBHa7TwzWo+pg4fDFUJHShcjVYzTfaRrZzm93p7OTAfH/0\n").unwrap();
        assert_eq!(
            token.expose_secret(),
            "dyNYgfK0Ya6FWGqq83sBHa7TwzWo+pg4fDFUJHShcjVYzTfaRrZzm93p7OTAfH/0"
        );
    }

    #[test]
    fn test_parse_app_token_json() {
        let token = parse_app_token(r#"{"app_token": "secret", "api": {}}"#).unwrap();
        assert_eq!(token.expose_secret(), "secret");
    }

    #[test]
    fn test_parse_app_token_empty() {
        assert!(matches!(parse_app_token("  \n"), Err(AppError::Config(_))));
        assert!(parse_app_token("{\"other\": 1}").is_err());
    }

    #[test]
    fn test_endpoint_url() {
        let config = Config {
            base_url: normalize_base_url("http://192.168.1.254/api/v8"),
            ..Config::default()
        };
        assert_eq!(config.base_url, "http://192.168.1.254/api/v8/");
        assert_eq!(
            config.endpoint_url("/login/session/"),
            "http://192.168.1.254/api/v8/login/session/"
        );
        assert_eq!(
            config.endpoint_url("connection/"),
            "http://192.168.1.254/api/v8/connection/"
        );
    }

    #[test]
    fn test_parse_endpoints_skips_blanks() {
        assert_eq!(
            parse_endpoints(" connection/ ,, system/ ,"),
            vec!["connection/", "system/"]
        );
        assert!(parse_endpoints("").is_empty());
    }
}

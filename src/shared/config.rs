//! Application configuration. Signed-in profile, location source, paths.

use serde::Deserialize;

/// Default bound on location acquisition, in seconds.
pub const DEFAULT_LOCATION_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding attendance.db. Read from GEO_ATTEND_DATA_DIR.
    pub data_dir: Option<String>,

    /// Seconds to wait for a location fix before giving up. Read from GEO_ATTEND_LOCATION_TIMEOUT_SECS.
    #[serde(default)]
    pub location_timeout_secs: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Location source
    // ─────────────────────────────────────────────────────────────────────────
    /// HTTP geolocation endpoint returning JSON latitude/longitude. Read from GEO_ATTEND_LOCATION_URL.
    #[serde(default)]
    pub location_url: Option<String>,

    /// Static latitude, used when no location URL is set. Read from GEO_ATTEND_FIXED_LATITUDE.
    #[serde(default)]
    pub fixed_latitude: Option<String>,

    /// Static longitude. Read from GEO_ATTEND_FIXED_LONGITUDE.
    #[serde(default)]
    pub fixed_longitude: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Signed-in profile
    // ─────────────────────────────────────────────────────────────────────────
    /// Read from GEO_ATTEND_USER_ID. Optional for students when inst_name and roll_no are set.
    #[serde(default)]
    pub user_id: Option<String>,

    /// "student" (default) or "advisor". Read from GEO_ATTEND_USER_ROLE.
    #[serde(default)]
    pub user_role: Option<String>,

    /// Read from GEO_ATTEND_CLASS_NAME. Without it nobody is signed in.
    #[serde(default)]
    pub class_name: Option<String>,

    /// Read from GEO_ATTEND_DISPLAY_NAME.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Institution, used to derive a student's login id. Read from GEO_ATTEND_INST_NAME.
    #[serde(default)]
    pub inst_name: Option<String>,

    /// Roll number, used to derive a student's login id. Read from GEO_ATTEND_ROLL_NO.
    #[serde(default)]
    pub roll_no: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        // Values stay strings: roll numbers like "007" must not be coerced to integers.
        c = c.add_source(config::Environment::with_prefix("GEO_ATTEND"));
        if let Ok(path) = std::env::var("GEO_ATTEND_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Returns the data directory. Defaults to "./data".
    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }

    /// Returns the location timeout in seconds. Defaults to 15; zero is treated as unset.
    pub fn location_timeout_secs_or_default(&self) -> u64 {
        self.location_timeout_secs
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_LOCATION_TIMEOUT_SECS)
    }

    /// Returns the static location if both halves are configured and numeric.
    pub fn fixed_location(&self) -> Option<(f64, f64)> {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        parse(&self.fixed_latitude).zip(parse(&self.fixed_longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.data_dir_or_default(), "./data");
        assert_eq!(cfg.location_timeout_secs_or_default(), 15);
        assert_eq!(cfg.fixed_location(), None);
    }

    #[test]
    fn test_overrides() {
        let cfg = AppConfig {
            location_timeout_secs: Some("0".into()),
            fixed_latitude: Some("1.0".into()),
            fixed_longitude: Some("2".into()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.location_timeout_secs_or_default(), 15);
        assert_eq!(cfg.fixed_location(), Some((1.0, 2.0)));

        let cfg = AppConfig {
            location_timeout_secs: Some("30".into()),
            fixed_latitude: Some("north".into()),
            fixed_longitude: Some("2".into()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.location_timeout_secs_or_default(), 30);
        assert_eq!(cfg.fixed_location(), None);
    }

    fn from_vars(vars: &[(&str, &str)]) -> AppConfig {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Config::builder()
            .add_source(config::Environment::with_prefix("GEO_ATTEND").source(Some(source)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_env_keeps_numeric_looking_strings() {
        let cfg = from_vars(&[
            ("GEO_ATTEND_ROLL_NO", "007"),
            ("GEO_ATTEND_DISPLAY_NAME", "0042"),
            ("GEO_ATTEND_CLASS_NAME", "CS-1"),
            ("GEO_ATTEND_LOCATION_TIMEOUT_SECS", "20"),
            ("GEO_ATTEND_FIXED_LATITUDE", "12.5"),
            ("GEO_ATTEND_FIXED_LONGITUDE", "-3.25"),
        ]);
        assert_eq!(cfg.roll_no.as_deref(), Some("007"));
        assert_eq!(cfg.display_name.as_deref(), Some("0042"));
        assert_eq!(cfg.location_timeout_secs_or_default(), 20);
        assert_eq!(cfg.fixed_location(), Some((12.5, -3.25)));
    }
}

//! INI file configuration adapter.
//!
//! Values may carry a trailing `; comment` or `# comment`, which is stripped
//! before any conversion.

use crate::domain::error::EngineError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| EngineError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, EngineError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| EngineError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn strip_inline_comment(value: &str) -> &str {
        let cut = [" ;", " #", "\t;", "\t#"]
            .iter()
            .filter_map(|marker| value.find(marker))
            .min()
            .unwrap_or(value.len());
        value[..cut].trim()
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|raw| Self::strip_inline_comment(&raw).to_string())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .and_then(|v| Self::parse_bool(&v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[engine]
timestep = 60 minutes
method_orders_limit = 1

[instruments]
pairs = EUR/USD:0.2, NZD/USD
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("engine", "timestep"),
            Some("60 minutes".to_string())
        );
        assert_eq!(
            adapter.get_string("instruments", "pairs"),
            Some("EUR/USD:0.2, NZD/USD".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[engine]\nhistory_length = 100\n").unwrap();
        assert_eq!(adapter.get_string("engine", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[engine]\nmethod_orders_limit = 5\n").unwrap();
        assert_eq!(adapter.get_int("engine", "method_orders_limit", 0), 5);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[engine]\n").unwrap();
        assert_eq!(adapter.get_int("engine", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[engine]\nhistory_length = abc\n").unwrap();
        assert_eq!(adapter.get_int("engine", "history_length", 42), 42);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[indicators]\nstddev_mult = 2.3\n").unwrap();
        assert_eq!(adapter.get_double("indicators", "stddev_mult", 0.0), 2.3);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[replay]\ncash = lots\n").unwrap();
        assert_eq!(adapter.get_double("replay", "cash", 99.9), 99.9);
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[engine]\na = true\nb = yes\nc = 0\nd = No\n").unwrap();
        assert!(adapter.get_bool("engine", "a", false));
        assert!(adapter.get_bool("engine", "b", false));
        assert!(!adapter.get_bool("engine", "c", true));
        assert!(!adapter.get_bool("engine", "d", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing_or_garbage() {
        let adapter = FileConfigAdapter::from_string("[engine]\ntrend_filter = maybe\n").unwrap();
        assert!(adapter.get_bool("engine", "missing", true));
        assert!(!adapter.get_bool("engine", "trend_filter", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[replay]\ndata_dir = /srv/bars\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("replay", "data_dir"),
            Some("/srv/bars".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(EngineError::ConfigParse { .. })));
    }

    #[test]
    fn inline_comments_are_stripped() {
        let adapter = FileConfigAdapter::from_string(
            "[engine]\nhistory_length = 100 ; bars\nexit_rule = sma_cross # default\ntrend_filter = true ; on\n",
        )
        .unwrap();
        assert_eq!(adapter.get_int("engine", "history_length", 0), 100);
        assert_eq!(
            adapter.get_string("engine", "exit_rule"),
            Some("sma_cross".to_string())
        );
        assert!(adapter.get_bool("engine", "trend_filter", false));
    }
}

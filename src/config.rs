use config::{Config, ConfigError, Map, Source, Value, ValueKind}; // Use the config crate
use ini::{Ini, ParseOption};
use log::debug;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Printed whenever the config file cannot be used.
pub const EXAMPLE_CONFIG: &str = "
[Server]
use_ssl = True
server = smtp.gmail.com

[User]
username = fred@example.com
from = Freds Automated Scripts <fred@example.com>
password = Hunter2
";

const SERVER_SECTION: &str = "Server";
const USER_SECTION: &str = "User";

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Unable to read config file '{path}': {source}")]
    Read { path: String, source: ConfigError },

    #[error("No section: '{0}'")]
    MissingSection(String),

    #[error("No option '{key}' in section: '{section}'")]
    MissingKey { section: String, key: String },

    #[error("Option '{key}' in section '{section}' is not a {expected}: '{value}'")]
    TypeMismatch {
        section: String,
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// SMTP and sender settings. Loaded once per run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub use_ssl: bool,
    pub server: String,
    pub username: String,
    /// Used as the From header, the SMTP envelope sender and the event organizer.
    pub from: String,
    // `SecretString` keeps the password out of Debug output and logs
    pub password: SecretString,
}

impl Settings {
    /// Reads the INI file at `path` and validates every required key.
    ///
    /// Section and key names are matched case-insensitively.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let raw = Config::builder()
            .add_source(RawIniFile::new(path))
            .build()
            .and_then(|c| c.try_deserialize::<HashMap<String, Value>>())
            .map_err(|source| ConfigLoadError::Read {
                path: path.display().to_string(),
                source,
            })?;
        debug!("Read config sections {:?} from {}", raw.keys().collect::<Vec<_>>(), path.display());

        let server = Section::find(&raw, SERVER_SECTION)?;
        let user = Section::find(&raw, USER_SECTION)?;

        Ok(Settings {
            use_ssl: server.get_bool("use_ssl")?,
            server: server.get("server")?,
            username: user.get("username")?,
            from: user.get("from")?,
            password: SecretString::new(user.get("password")?.into()),
        })
    }

    pub fn get_password(&self) -> &str {
        self.password.expose_secret()
    }

    pub fn has_password(&self) -> bool {
        !self.password.expose_secret().is_empty()
    }
}

/// INI file source that keeps values verbatim: no backslash escapes and no
/// quote stripping, so passwords come back exactly as written.
#[derive(Debug, Clone)]
struct RawIniFile {
    path: PathBuf,
}

impl RawIniFile {
    fn new(path: &Path) -> Self {
        RawIniFile {
            path: path.to_path_buf(),
        }
    }
}

impl Source for RawIniFile {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_file_opt(&self.path, opt)
            .map_err(|e| ConfigError::Foreign(Box::new(e)))?;

        let origin = self.path.display().to_string();
        let mut root = Map::new();
        for (section, props) in ini.iter() {
            let entries: Map<String, Value> = props
                .iter()
                .map(|(k, v)| {
                    (
                        k.to_string(),
                        Value::new(Some(&origin), ValueKind::String(v.to_string())),
                    )
                })
                .collect();
            match section {
                Some(name) => {
                    root.insert(
                        name.to_string(),
                        Value::new(Some(&origin), ValueKind::Table(entries)),
                    );
                }
                // Keys above the first section header stay at the top level.
                None => root.extend(entries),
            }
        }
        Ok(root)
    }
}

/// One INI section with case-insensitive key lookup.
struct Section {
    name: &'static str,
    entries: Map<String, Value>,
}

impl Section {
    fn find(raw: &HashMap<String, Value>, name: &'static str) -> Result<Self, ConfigLoadError> {
        let value = raw
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| ConfigLoadError::MissingSection(name.to_string()))?;

        // A bare `key = value` line outside any section is not a section.
        let entries = value
            .into_table()
            .map_err(|_| ConfigLoadError::MissingSection(name.to_string()))?;
        Ok(Section { name, entries })
    }

    fn get(&self, key: &str) -> Result<String, ConfigLoadError> {
        let value = self
            .entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| ConfigLoadError::MissingKey {
                section: self.name.to_string(),
                key: key.to_string(),
            })?;

        value.into_string().map_err(|_| ConfigLoadError::TypeMismatch {
            section: self.name.to_string(),
            key: key.to_string(),
            value: "<table>".to_string(),
            expected: "string",
        })
    }

    fn get_bool(&self, key: &str) -> Result<bool, ConfigLoadError> {
        let value = self.get(key)?;
        parse_bool(&value).ok_or_else(|| ConfigLoadError::TypeMismatch {
            section: self.name.to_string(),
            key: key.to_string(),
            value,
            expected: "boolean",
        })
    }
}

/// INI booleans: `1/yes/true/on` and `0/no/false/off`, any case.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Relative config paths are looked up next to the executable, not the cwd.
pub fn resolve_config_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_exe()
        .and_then(|exe| exe.canonicalize())
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const GOOD: &str = "
[Server]
use_ssl = True
server = smtp.example.com

[User]
username = fred@example.com
from = Fred <fred@example.com>
password = secret
";

    #[test]
    fn loads_well_formed_file() {
        let file = write_config(GOOD);
        let settings = Settings::load(file.path()).unwrap();
        assert!(settings.use_ssl);
        assert_eq!(settings.server, "smtp.example.com");
        assert_eq!(settings.username, "fred@example.com");
        assert_eq!(settings.from, "Fred <fred@example.com>");
        assert_eq!(settings.get_password(), "secret");
    }

    #[test]
    fn example_config_is_loadable() {
        let file = write_config(EXAMPLE_CONFIG);
        let settings = Settings::load(file.path()).unwrap();
        assert!(settings.use_ssl);
        assert_eq!(settings.server, "smtp.gmail.com");
        assert_eq!(settings.from, "Freds Automated Scripts <fred@example.com>");
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let file = write_config(GOOD);
        let settings = Settings::load(file.path()).unwrap();
        assert!(!format!("{:?}", settings).contains("secret"));
    }

    #[test]
    fn missing_server_section() {
        let file = write_config(
            "[User]\nusername = fred@example.com\nfrom = fred@example.com\npassword = x\n",
        );
        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingSection(ref s) if s == "Server"));
    }

    #[test]
    fn missing_key() {
        let file = write_config(
            "[Server]\nuse_ssl = false\nserver = localhost\n[User]\nusername = fred\nfrom = fred@example.com\n",
        );
        let err = Settings::load(file.path()).unwrap_err();
        match err {
            ConfigLoadError::MissingKey { section, key } => {
                assert_eq!(section, "User");
                assert_eq!(key, "password");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn use_ssl_must_be_boolean() {
        let file = write_config(
            "[Server]\nuse_ssl = maybe\nserver = localhost\n[User]\nusername = u\nfrom = f@example.com\npassword = p\n",
        );
        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::TypeMismatch { ref key, expected: "boolean", .. } if key == "use_ssl"
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join("nope.cfg")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Read { .. }));
    }

    #[test]
    fn values_are_read_verbatim() {
        let file = write_config(
            "[Server]\nuse_ssl = yes\nserver = smtp.example.com\n\
             [User]\nusername = fred\nfrom = \"Fred\" <fred@example.com>\npassword = a\\tb\"c\"\n",
        );
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.get_password(), r#"a\tb"c""#);
        assert_eq!(settings.from, r#""Fred" <fred@example.com>"#);
    }

    #[test]
    fn ini_booleans() {
        for t in ["1", "yes", "True", "ON"] {
            assert_eq!(parse_bool(t), Some(true), "{t}");
        }
        for f in ["0", "No", "false", "off"] {
            assert_eq!(parse_bool(f), Some(false), "{f}");
        }
        assert_eq!(parse_bool("2"), None);
    }

    #[test]
    fn absolute_paths_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let abs = dir.path().join("calendar.cfg");
        assert_eq!(resolve_config_path(&abs), abs);
    }

    #[test]
    fn relative_paths_resolve_next_to_the_executable() {
        let resolved = resolve_config_path(Path::new("calendar.cfg"));
        let exe_dir = std::env::current_exe()
            .unwrap()
            .canonicalize()
            .unwrap()
            .parent()
            .unwrap()
            .to_path_buf();
        assert_eq!(resolved, exe_dir.join("calendar.cfg"));
    }
}

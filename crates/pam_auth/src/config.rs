//! Optional TOML configuration.
//!
//! ```toml
//! service = "login"
//! conversation_policy = "lenient"
//!
//! [library]
//! pam = ["libpam.so.0"]
//! libc = ["libc.so.6"]
//! discover = true
//! ```
//!
//! Every key is optional. Library names listed here are tried before the
//! linker cache and the platform defaults; `discover = false` skips the
//! linker cache.

use std::path::Path;

use serde::Deserialize;

use crate::conversation::ConversationPolicy;
use crate::discover;
use crate::error::{Error, Result};

pub const DEFAULT_SERVICE: &str = "login";

#[cfg(target_os = "macos")]
const DEFAULT_PAM_NAMES: &[&str] = &["libpam.dylib", "libpam.2.dylib"];
#[cfg(not(target_os = "macos"))]
const DEFAULT_PAM_NAMES: &[&str] = &["libpam.so", "libpam.so.0", "libpam.so.1"];

#[cfg(target_os = "macos")]
const DEFAULT_LIBC_NAMES: &[&str] = &["libSystem.B.dylib"];
#[cfg(not(target_os = "macos"))]
const DEFAULT_LIBC_NAMES: &[&str] = &["libc.so.6", "libc.so", "libc.so.5"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub service: String,
    pub conversation_policy: ConversationPolicy,
    pub library: LibraryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service: DEFAULT_SERVICE.to_string(),
            conversation_policy: ConversationPolicy::default(),
            library: LibraryConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Where to look for the native libraries.
///
/// Candidates are tried in this order: configured names, then (with
/// `discover`) the linker cache, then the platform defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    pub pam: Vec<String>,
    pub libc: Vec<String>,
    pub discover: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig { pam: Vec::new(), libc: Vec::new(), discover: true }
    }
}

impl LibraryConfig {
    pub fn pam_candidates(&self) -> Vec<String> {
        candidates(&self.pam, &self.discovered("pam"), DEFAULT_PAM_NAMES)
    }

    pub fn libc_candidates(&self) -> Vec<String> {
        candidates(&self.libc, &self.discovered("c"), DEFAULT_LIBC_NAMES)
    }

    fn discovered(&self, nickname: &str) -> Vec<String> {
        if self.discover { discover::find_library(nickname) } else { Vec::new() }
    }
}

fn candidates(configured: &[String], discovered: &[String], defaults: &[&str]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(configured.len() + discovered.len() + defaults.len());
    let found = configured.iter().chain(discovered).map(String::as_str);
    for name in found.chain(defaults.iter().copied()) {
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
        assert_eq!(Config::default().service, "login");
    }

    #[test]
    fn parses_all_keys() {
        let config = Config::from_toml_str(
            r#"
            service = "sshd"
            conversation_policy = "strict"

            [library]
            pam = ["/opt/pam/lib/libpam.so.0"]
            libc = ["libc.musl-x86_64.so.1"]
            discover = false
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            Config {
                service: "sshd".to_string(),
                conversation_policy: ConversationPolicy::Strict,
                library: LibraryConfig {
                    pam: vec!["/opt/pam/lib/libpam.so.0".to_string()],
                    libc: vec!["libc.musl-x86_64.so.1".to_string()],
                    discover: false,
                },
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(Config::from_toml_str("sevrice = \"login\""), Err(Error::ConfigParse(_))));
        assert!(matches!(
            Config::from_toml_str("conversation_policy = \"sometimes\""),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn configured_names_come_first_without_duplicates() {
        let library = LibraryConfig {
            pam: vec!["libpam-custom.so".to_string(), DEFAULT_PAM_NAMES[0].to_string()],
            libc: vec![],
            discover: false,
        };
        let candidates = library.pam_candidates();
        assert_eq!(candidates[0], "libpam-custom.so");
        assert_eq!(candidates.len(), DEFAULT_PAM_NAMES.len() + 1);
        assert_eq!(library.libc_candidates(), DEFAULT_LIBC_NAMES.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn discovered_paths_sit_between_configured_and_defaults() {
        let configured = vec!["libpam-custom.so".to_string()];
        let discovered = vec!["/lib/x86_64-linux-gnu/libpam.so.0".to_string(), "libpam-custom.so".to_string()];
        let names = candidates(&configured, &discovered, &["libpam.so", "libpam.so.0"]);
        assert_eq!(
            names,
            vec!["libpam-custom.so", "/lib/x86_64-linux-gnu/libpam.so.0", "libpam.so", "libpam.so.0"]
        );
    }

    #[test]
    fn discovery_is_on_by_default() {
        assert!(LibraryConfig::default().discover);
        assert!(Config::from_toml_str("[library]\npam = []").unwrap().library.discover);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "service = \"other\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.service, "other");
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}

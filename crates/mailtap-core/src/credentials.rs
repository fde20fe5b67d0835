//! Credential file discovery and loading.
//!
//! The file is JSON:
//!
//! ```json
//! {
//!   "email": "me@example.com",
//!   "password": "app-password",
//!   "imap": { "server": "imap.example.com", "port": 993 },
//!   "smtp": { "server": "smtp.example.com", "port": 465, "security": "tls" }
//! }
//! ```
//!
//! `smtp.security` is optional: port 465 means implicit TLS, any other
//! port means STARTTLS.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable naming a credential file.
pub const CREDENTIALS_ENV: &str = "MAILTAP_CREDENTIALS";

const FILE_NAME: &str = "email.json";

/// Host and port of a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// How the submission connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// TLS from the first byte.
    #[serde(alias = "ssl")]
    Tls,
    /// Plain connect, then STARTTLS.
    #[serde(alias = "start_tls")]
    StartTls,
}

impl Security {
    /// Mode implied by the port alone.
    #[must_use]
    pub const fn for_port(port: u16) -> Self {
        if port == 465 { Self::Tls } else { Self::StartTls }
    }
}

/// Submission server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpEndpoint {
    /// Host and port.
    pub endpoint: Endpoint,
    /// Connection security.
    pub security: Security,
}

/// Validated account credentials.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    /// Mailbox address, also the login name for both servers.
    pub address: String,
    /// Password for both servers.
    pub password: SecretString,
    /// Retrieval server (always implicit TLS).
    pub imap: Endpoint,
    /// Submission server.
    pub smtp: SmtpEndpoint,
}

impl CredentialRecord {
    /// The password in clear, for handing to a protocol client.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

#[derive(Deserialize)]
struct RawRecord {
    email: String,
    password: String,
    imap: RawEndpoint,
    smtp: RawSmtp,
}

#[derive(Deserialize)]
struct RawEndpoint {
    server: String,
    port: u16,
}

#[derive(Deserialize)]
struct RawSmtp {
    server: String,
    port: u16,
    #[serde(default)]
    security: Option<Security>,
}

/// Candidate locations, in search order.
///
/// An explicit path is the only candidate. Otherwise: the file named by
/// [`CREDENTIALS_ENV`], `./.credentials/email.json`, then
/// `<config dir>/mailtap/email.json`.
#[must_use]
pub fn search_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    candidate_paths(
        explicit,
        env::var_os(CREDENTIALS_ENV),
        env::current_dir().ok(),
        dirs::config_dir(),
    )
}

fn candidate_paths(
    explicit: Option<&Path>,
    from_env: Option<OsString>,
    cwd: Option<PathBuf>,
    config_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }

    let mut paths = Vec::new();
    if let Some(path) = from_env.filter(|p| !p.is_empty()) {
        paths.push(PathBuf::from(path));
    }
    paths.push(
        cwd.unwrap_or_else(|| PathBuf::from("."))
            .join(".credentials")
            .join(FILE_NAME),
    );
    if let Some(dir) = config_dir {
        paths.push(dir.join("mailtap").join(FILE_NAME));
    }
    paths
}

/// Loads credentials from the first existing file on the search path.
///
/// # Errors
///
/// [`Error::ConfigMissing`] when no candidate exists, otherwise the errors of
/// [`load_from`].
pub fn load(explicit: Option<&Path>) -> Result<CredentialRecord> {
    load_first(&search_paths(explicit))
}

fn load_first(paths: &[PathBuf]) -> Result<CredentialRecord> {
    let Some(path) = paths.iter().find(|p| p.is_file()) else {
        return Err(Error::ConfigMissing {
            searched: paths.to_vec(),
        });
    };
    debug!(path = %path.display(), "loading credentials");
    load_from(path)
}

/// Loads and validates one credential file.
///
/// # Errors
///
/// [`Error::ConfigInvalid`] if the file cannot be read, is not valid JSON,
/// or lacks a required field.
pub fn load_from(path: &Path) -> Result<CredentialRecord> {
    let invalid = |reason: String| Error::ConfigInvalid {
        path: path.to_path_buf(),
        reason,
    };

    let text = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    parse(&text).map_err(invalid)
}

fn parse(text: &str) -> std::result::Result<CredentialRecord, String> {
    let raw: RawRecord = serde_json::from_str(text).map_err(|e| e.to_string())?;

    let require = |value: String, field: &str| {
        let value = value.trim().to_string();
        if value.is_empty() {
            Err(format!("`{field}` is empty"))
        } else {
            Ok(value)
        }
    };
    let port = |port: u16, field: &str| {
        if port == 0 {
            Err(format!("`{field}` must be a port number"))
        } else {
            Ok(port)
        }
    };

    let address = require(raw.email, "email")?;
    if raw.password.is_empty() {
        return Err("`password` is empty".to_string());
    }

    Ok(CredentialRecord {
        address,
        password: SecretString::from(raw.password),
        imap: Endpoint {
            host: require(raw.imap.server, "imap.server")?,
            port: port(raw.imap.port, "imap.port")?,
        },
        smtp: SmtpEndpoint {
            endpoint: Endpoint {
                host: require(raw.smtp.server, "smtp.server")?,
                port: port(raw.smtp.port, "smtp.port")?,
            },
            security: raw
                .smtp
                .security
                .unwrap_or_else(|| Security::for_port(raw.smtp.port)),
        },
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    const VALID: &str = r#"{
        "email": "me@example.com",
        "password": "hunter2",
        "imap": {"server": "imap.example.com", "port": 993},
        "smtp": {"server": "smtp.example.com", "port": 465}
    }"#;

    #[test]
    fn test_parse_valid() {
        let record = parse(VALID).unwrap();
        assert_eq!(record.address, "me@example.com");
        assert_eq!(record.password(), "hunter2");
        assert_eq!(record.imap.to_string(), "imap.example.com:993");
        assert_eq!(record.smtp.security, Security::Tls);
    }

    #[test]
    fn test_security_from_port_and_override() {
        let starttls = VALID.replace("465", "587");
        assert_eq!(parse(&starttls).unwrap().smtp.security, Security::StartTls);

        let forced = VALID.replace(r#""port": 465"#, r#""port": 2525, "security": "tls""#);
        assert_eq!(parse(&forced).unwrap().smtp.security, Security::Tls);

        let explicit = VALID.replace(r#""port": 465"#, r#""port": 465, "security": "starttls""#);
        assert_eq!(parse(&explicit).unwrap().smtp.security, Security::StartTls);
    }

    #[test]
    fn test_missing_field() {
        let err = parse(r#"{"email": "a@b.c", "password": "x", "imap": {"server": "i", "port": 1}}"#)
            .unwrap_err();
        assert!(err.contains("smtp"), "{err}");
    }

    #[test]
    fn test_empty_values_rejected() {
        let blank_email = VALID.replace("me@example.com", "  ");
        assert!(parse(&blank_email).unwrap_err().contains("email"));

        let blank_password = VALID.replace("hunter2", "");
        assert!(parse(&blank_password).unwrap_err().contains("password"));

        let zero_port = VALID.replace("993", "0");
        assert!(parse(&zero_port).unwrap_err().contains("imap.port"));
    }

    #[test]
    fn test_debug_hides_password() {
        let record = parse(VALID).unwrap();
        assert!(!format!("{record:?}").contains("hunter2"));
    }

    #[test]
    fn test_candidate_order() {
        let paths = candidate_paths(
            None,
            Some(OsString::from("/etc/mail.json")),
            Some(PathBuf::from("/work")),
            Some(PathBuf::from("/home/u/.config")),
        );
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/etc/mail.json"),
                PathBuf::from("/work/.credentials/email.json"),
                PathBuf::from("/home/u/.config/mailtap/email.json"),
            ]
        );
    }

    #[test]
    fn test_explicit_path_wins() {
        let paths = candidate_paths(
            Some(Path::new("/tmp/x.json")),
            Some(OsString::from("/etc/mail.json")),
            None,
            None,
        );
        assert_eq!(paths, vec![PathBuf::from("/tmp/x.json")]);
    }

    #[test]
    fn test_load_first_existing() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("email.json");
        fs::write(&present, VALID).unwrap();

        let record = load_first(&[dir.path().join("absent.json"), present.clone()]).unwrap();
        assert_eq!(record.address, "me@example.com");
    }

    #[test]
    fn test_nothing_found() {
        let dir = tempdir().unwrap();
        let searched = vec![dir.path().join("a.json"), dir.path().join("b.json")];

        let err = load_first(&searched).unwrap_err();
        assert!(matches!(err, Error::ConfigMissing { searched: ref s } if *s == searched));
    }

    #[test]
    fn test_invalid_json_names_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("email.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { path: ref p, .. } if *p == path));
        assert!(err.to_string().contains("email.json"));
    }
}

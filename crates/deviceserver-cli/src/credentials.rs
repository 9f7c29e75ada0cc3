//! The credentials file: an access key with its secret, stored as JSON.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use deviceserver_client::AccessKey;

/// Reads the access key used to authenticate.
pub fn read_credentials(path: &Path) -> Result<AccessKey> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials from {}", path.display()))?;
    let key: AccessKey = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid credentials file {}", path.display()))?;

    if key.key.is_empty() || key.secret.is_none() {
        anyhow::bail!(
            "Credentials file {} has no Key/Secret; create one with create-org",
            path.display()
        );
    }
    Ok(key)
}

/// Writes `key` to `path`, replacing any previous credentials.
pub fn write_credentials(path: &Path, key: &AccessKey) -> Result<()> {
    let json = serde_json::to_string_pretty(key).context("Failed to encode credentials")?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("Failed to write credentials to {}", path.display()))?;

    log::debug!("Wrote credentials to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds");

        let key: AccessKey = serde_json::from_str(
            r#"{"Name":"org","Key":"k-1","Secret":"s-1","Links":[{"rel":"self","href":"http://h/keys/1"}]}"#,
        )
        .unwrap();
        write_credentials(&path, &key).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  \"Key\": \"k-1\""));

        let back = read_credentials(&path).unwrap();
        assert_eq!(back.key, "k-1");
        assert_eq!(back.secret.unwrap().expose_secret(), "s-1");
        assert_eq!(back.links.self_href(), "http://h/keys/1");
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds");
        fs::write(&path, r#"{"Key":"k-1"}"#).unwrap();

        assert!(read_credentials(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_credentials(&dir.path().join("nope")).unwrap_err();
        assert!(err.to_string().contains("Failed to read credentials"));
    }
}

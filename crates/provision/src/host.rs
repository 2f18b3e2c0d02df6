//! Host OS identity from an os-release file.

use std::path::Path;

use crate::error::ProvisionError;

/// The fields of `/etc/os-release` the provisioner branches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsRelease {
    /// `ID`, e.g. `rhel`, `fedora`. Defaults to `linux` when absent.
    pub id: String,
    /// `VERSION_ID`, e.g. `8.10`. Optional on rolling distributions.
    pub version_id: Option<String>,
}

impl OsRelease {
    /// Reads and parses an os-release file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ProvisionError> {
        let path = path.as_ref();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ProvisionError::OsRelease {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
        Ok(Self::parse(&content))
    }

    /// Parses `KEY=value` lines; unknown keys, comments and blank lines are skipped.
    pub fn parse(content: &str) -> Self {
        let mut id = None;
        let mut version_id = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, raw)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(raw.trim());
            match key.trim() {
                "ID" => id = Some(value),
                "VERSION_ID" if !value.is_empty() => version_id = Some(value),
                _ => {}
            }
        }

        Self {
            id: id
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "linux".to_owned()),
            version_id,
        }
    }

    /// Major component of `VERSION_ID` (`8.10` -> `8`).
    pub fn major_version(&self) -> Option<&str> {
        self.version_id
            .as_deref()
            .and_then(|v| v.split('.').next())
            .filter(|major| !major.is_empty())
    }
}

fn unquote(value: &str) -> String {
    let inner = ['"', '\'']
        .iter()
        .find_map(|q| {
            value
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(value);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

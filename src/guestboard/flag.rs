//! Persisted marker gating one note per visitor.

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct FlagFile {
    signed: bool,
    expires_at: DateTime<Utc>,
}

/// "Already signed" flag stored as a small JSON file.
#[derive(Clone, Debug)]
pub struct SignedFlag {
    path: PathBuf,
    expiry_days: u32,
}

impl SignedFlag {
    pub fn new(path: impl Into<PathBuf>, expiry_days: u32) -> Self {
        Self {
            path: path.into(),
            expiry_days,
        }
    }

    /// False when the file is missing, unreadable, unsigned or expired.
    pub fn is_signed(&self, now: DateTime<Utc>) -> bool {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return false;
        };
        match serde_json::from_str::<FlagFile>(&raw) {
            Ok(flag) => flag.signed && flag.expires_at > now,
            Err(e) => {
                tracing::warn!("ignoring unreadable flag {}: {e}", self.path.display());
                false
            }
        }
    }

    /// Record the signature until `now + expiry_days`.
    pub fn mark(&self, now: DateTime<Utc>) -> Result<()> {
        let flag = FlagFile {
            signed: true,
            expires_at: now + ChronoDuration::days(i64::from(self.expiry_days)),
        };
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&flag)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn missing_file_is_unsigned() {
        let dir = tempfile::tempdir().unwrap();
        let flag = SignedFlag::new(dir.path().join("signed.json"), 365);
        assert!(!flag.is_signed(at(1)));
    }

    #[test]
    fn mark_then_expire() {
        let dir = tempfile::tempdir().unwrap();
        let flag = SignedFlag::new(dir.path().join("nested/signed.json"), 10);
        flag.mark(at(1)).unwrap();

        assert!(flag.is_signed(at(1)));
        assert!(flag.is_signed(at(10)));
        assert!(!flag.is_signed(at(11)));
    }

    #[test]
    fn garbage_file_is_unsigned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signed.json");
        fs::write(&path, "true").unwrap();
        assert!(!SignedFlag::new(&path, 365).is_signed(at(1)));

        fs::write(&path, r#"{"signed":false,"expires_at":"2030-01-01T00:00:00Z"}"#).unwrap();
        assert!(!SignedFlag::new(&path, 365).is_signed(at(1)));
    }
}

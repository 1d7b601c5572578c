// Update checker seam

use crate::Result;
use serde::{Deserialize, Serialize};

/// Descriptor of an available release
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Version {
    pub version: String,
    pub release_url: String,
}

impl Version {
    /// An all-default descriptor means "no update"
    pub fn is_empty(&self) -> bool {
        self.version.is_empty() && self.release_url.is_empty()
    }
}

pub trait UpdateChecker: Send + Sync {
    fn check_available(&self) -> Result<Option<Version>>;
}

/// Update checker that always reports the same answer
#[derive(Debug, Clone, Default)]
pub struct FixedUpdateChecker {
    available: Option<Version>,
}

impl FixedUpdateChecker {
    pub fn new(available: Option<Version>) -> Self {
        Self { available }
    }
}

impl UpdateChecker for FixedUpdateChecker {
    fn check_available(&self) -> Result<Option<Version>> {
        Ok(self.available.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_version() {
        assert!(Version::default().is_empty());
        assert!(!Version {
            version: "1.2.0".into(),
            release_url: String::new(),
        }
        .is_empty());
    }

    #[test]
    fn test_fixed_checker() {
        assert_eq!(FixedUpdateChecker::default().check_available().unwrap(), None);

        let v = Version {
            version: "1.2.0".into(),
            release_url: "https://example.org/releases/1.2.0".into(),
        };
        let checker = FixedUpdateChecker::new(Some(v.clone()));
        assert_eq!(checker.check_available().unwrap(), Some(v));
    }
}

use semver::Version;
use serde::{Deserialize, Serialize};

/// A mod package identity for one upgrade session. Old and new versions of
/// the same mod share `base_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Package {
    pub base_name: String,
    pub version: Version,
    pub has_install_procedure: bool,
}

impl Package {
    pub fn new(base_name: impl Into<String>, version: Version, has_install_procedure: bool) -> Self {
        Self {
            base_name: base_name.into(),
            version,
            has_install_procedure,
        }
    }
}

//! Server configuration, read from `/etc/isahub/<name>.toml`.
//!
//! ```toml
//! [root]
//! password_hash = "$argon2id$v=19$..."
//!
//! [jwt]
//! secret = "..."
//! expire_secs = 86400
//!
//! [storage]
//! data_dir = "/var/lib/isahub"
//!
//! [publishing]
//! tier_classes = [["private"], ["visible", "accessible", "editing", "managing"]]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use isa::model::AccessType;
use isa::service::TierEquivalence;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub root: RootConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootConfig {
    /// argon2id PHC string of the root password.
    #[serde(default)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expire_secs")]
    pub expire_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishingConfig {
    /// Public tiers that count as the same exposure. Widening across
    /// classes waits for a gatekeeper.
    pub tier_classes: Vec<Vec<AccessType>>,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            tier_classes: TierEquivalence::default().classes,
        }
    }
}

impl PublishingConfig {
    pub fn tiers(&self) -> TierEquivalence {
        TierEquivalence {
            classes: self.tier_classes.clone(),
        }
    }
}

fn default_expire_secs() -> u64 {
    86400
}

impl ServerConfig {
    /// A bare name resolves to `/etc/isahub/<name>.toml`; anything with a
    /// `/` or `.` is taken as a path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from("/etc/isahub").join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

//! First-start checks.
//!
//! isahubd refuses to start without a root password hash, a JWT secret,
//! a data directory and a consistent tier table.

use argon2::Argon2;
use password_hash::{PasswordHash, PasswordVerifier};

use crate::config::ServerConfig;

/// Verify server configuration is ready for production use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.root.password_hash.is_empty() {
        anyhow::bail!(
            "No root password hash found in configuration.\n\
             Set [root] password_hash to an argon2id PHC string."
        );
    }
    if PasswordHash::new(&config.root.password_hash).is_err() {
        anyhow::bail!("[root] password_hash is not a valid PHC string.");
    }
    if config.jwt.secret.is_empty() {
        anyhow::bail!("JWT secret is empty in configuration.");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    config
        .publishing
        .tiers()
        .validate()
        .map_err(|e| anyhow::anyhow!("[publishing] tier_classes: {}", e))?;
    Ok(())
}

/// Verify a root login attempt against the stored argon2id hash.
pub fn verify_root_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use argon2::PasswordHasher;
    use password_hash::SaltString;

    use super::*;
    use crate::config::{JwtConfig, PublishingConfig, RootConfig, StorageConfig};
    use isa::model::AccessType;

    pub(crate) fn hash(password: &str) -> String {
        let salt = SaltString::encode_b64(b"isahub-test-salt").unwrap();
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    pub(crate) fn config(password_hash: String) -> ServerConfig {
        ServerConfig {
            root: RootConfig { password_hash },
            storage: StorageConfig {
                data_dir: "/tmp".to_string(),
            },
            jwt: JwtConfig {
                secret: "test".to_string(),
                expire_secs: 3600,
            },
            publishing: PublishingConfig::default(),
        }
    }

    #[test]
    fn test_verify_config_empty_hash() {
        assert!(verify_config(&config(String::new())).is_err());
    }

    #[test]
    fn test_verify_config_ok() {
        assert!(verify_config(&config(hash("secret"))).is_ok());
    }

    #[test]
    fn test_verify_config_bad_hash() {
        assert!(verify_config(&config("plaintext".into())).is_err());
    }

    #[test]
    fn test_verify_config_overlapping_tiers() {
        let mut c = config(hash("secret"));
        c.publishing.tier_classes = vec![
            vec![AccessType::Private, AccessType::Visible],
            vec![AccessType::Visible],
        ];
        assert!(verify_config(&c).is_err());
    }

    #[test]
    fn test_verify_root_password() {
        let h = hash("secret");
        assert!(verify_root_password("secret", &h));
        assert!(!verify_root_password("wrong", &h));
    }

    #[test]
    fn test_verify_root_password_invalid_hash() {
        assert!(!verify_root_password("test", "not-a-hash"));
    }
}

//! `encrypt-credential` command
//!
//! Prints an encrypted credential reference for an admin to place in the
//! configuration store. The store itself is never written.

use anyhow::Context;
use gateway_core::credential::{CredentialKey, encrypt_credential};
use gateway_core::GatewayConfig;
use std::io::Read;

pub fn execute(config: &GatewayConfig, value: Option<String>, generate_key: bool) -> anyhow::Result<()> {
    if generate_key {
        println!("{}", CredentialKey::generate().to_base64());
        return Ok(());
    }

    let key = config.credential_key.as_ref().context(
        "No credential key configured; set GATEWAY_CREDENTIAL_KEY or credential_key in the config file",
    )?;
    let plaintext = match value {
        Some(value) => value,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read the API key from stdin")?;
            buffer
        }
    };

    println!("{}", seal(key, &plaintext)?);
    Ok(())
}

fn seal(key: &CredentialKey, plaintext: &str) -> anyhow::Result<String> {
    let plaintext = plaintext.trim();
    if plaintext.is_empty() {
        anyhow::bail!("Refusing to seal an empty API key");
    }
    encrypt_credential(key, plaintext).context("Failed to encrypt credential")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::credential::decrypt_credential;

    #[test]
    fn test_seal_trims_and_opens() {
        let key = CredentialKey::generate();
        let sealed = seal(&key, "  sk-live-123\n").unwrap();
        assert!(!sealed.contains("sk-live-123"));
        assert_eq!(decrypt_credential(&key, &sealed).unwrap(), "sk-live-123");
    }

    #[test]
    fn test_empty_key_is_refused() {
        let key = CredentialKey::generate();
        assert!(seal(&key, " \n").is_err());
    }
}

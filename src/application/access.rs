//! Bearer-token authentication: each configured token maps to one owner.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid bearer token")]
    Invalid,
}

/// The authenticated caller. Every stored post and live session is scoped to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerPrincipal {
    pub owner: String,
}

struct TokenEntry {
    hashed: Vec<u8>,
    owner: String,
}

/// Tokens are kept only as SHA-256 digests.
pub struct AccessTokens {
    entries: Vec<TokenEntry>,
}

impl std::fmt::Debug for AccessTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokens")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl AccessTokens {
    pub fn new(tokens: &BTreeMap<String, String>) -> Self {
        let entries = tokens
            .iter()
            .map(|(token, owner)| TokenEntry {
                hashed: hash_token(token),
                owner: owner.clone(),
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn authenticate(&self, token: &str) -> Result<OwnerPrincipal, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Missing);
        }

        let hashed = hash_token(token);
        // Compare against every entry so timing does not reveal which one matched.
        let mut matched: Option<&TokenEntry> = None;
        for entry in &self.entries {
            if entry.hashed.ct_eq(&hashed).unwrap_u8() == 1 {
                matched = Some(entry);
            }
        }

        matched
            .map(|entry| OwnerPrincipal {
                owner: entry.owner.clone(),
            })
            .ok_or(AuthError::Invalid)
    }
}

fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

//! Sweep requests
//!
//! [`SweepRequest`] is the typed form the orchestrator consumes.
//! [`SweepRequestFile`] is the JSON form the CLI reads, with base58 keys.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::ledger::{AccountId, AssetId};

/// One source account and the assets to pull from it, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAccount {
    pub owner: AccountId,
    pub assets: Vec<AssetId>,
}

impl SourceAccount {
    pub fn new(owner: AccountId, assets: Vec<AssetId>) -> Self {
        Self { owner, assets }
    }
}

/// A batch of source accounts swept into one destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepRequest {
    pub destination: AccountId,
    pub accounts: Vec<SourceAccount>,
}

impl SweepRequest {
    pub fn new(destination: AccountId, accounts: Vec<SourceAccount>) -> Self {
        Self {
            destination,
            accounts,
        }
    }

    /// Every (account, asset) entry in iteration order, null assets included
    pub fn entries(&self) -> impl Iterator<Item = (&AccountId, &AssetId)> {
        self.accounts
            .iter()
            .flat_map(|a| a.assets.iter().map(move |asset| (&a.owner, asset)))
    }

    /// Load and parse a JSON request file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("Cannot read {}: {}", path.display(), e)))?;
        let file: SweepRequestFile = serde_json::from_str(&raw)?;
        Self::try_from(file)
    }
}

/// On-disk request format
///
/// ```json
/// {
///   "destination": "<base58>",
///   "accounts": [{ "owner": "<base58>", "assets": ["<mint>", "..."] }]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRequestFile {
    pub destination: String,
    pub accounts: Vec<SourceAccountFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAccountFile {
    pub owner: String,
    #[serde(default)]
    pub assets: Vec<String>,
}

fn parse_key(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value.trim())
        .map_err(|e| Error::InvalidRequest(format!("{} '{}' is not a valid key: {}", field, value, e)))
}

impl TryFrom<SweepRequestFile> for SweepRequest {
    type Error = Error;

    fn try_from(file: SweepRequestFile) -> Result<Self> {
        let destination = parse_key("destination", &file.destination)?;

        let accounts = file
            .accounts
            .iter()
            .enumerate()
            .map(|(i, account)| {
                let owner = parse_key(&format!("accounts[{}].owner", i), &account.owner)?;
                let assets = account
                    .assets
                    .iter()
                    .enumerate()
                    .map(|(j, asset)| parse_key(&format!("accounts[{}].assets[{}]", i, j), asset))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SourceAccount::new(owner, assets))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SweepRequest::new(destination, accounts))
    }
}

impl From<&SweepRequest> for SweepRequestFile {
    fn from(request: &SweepRequest) -> Self {
        Self {
            destination: request.destination.to_string(),
            accounts: request
                .accounts
                .iter()
                .map(|a| SourceAccountFile {
                    owner: a.owner.to_string(),
                    assets: a.assets.iter().map(|m| m.to_string()).collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_entries_order() {
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        let (x, y, z) = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        let request = SweepRequest::new(
            Pubkey::new_unique(),
            vec![
                SourceAccount::new(a, vec![x, y]),
                SourceAccount::new(b, vec![z]),
            ],
        );

        let entries: Vec<_> = request.entries().map(|(o, m)| (*o, *m)).collect();
        assert_eq!(entries, vec![(a, x), (a, y), (b, z)]);
    }

    #[test]
    fn test_file_accepts_null_asset() {
        let file = SweepRequestFile {
            destination: Pubkey::new_unique().to_string(),
            accounts: vec![SourceAccountFile {
                owner: Pubkey::new_unique().to_string(),
                assets: vec!["11111111111111111111111111111111".to_string()],
            }],
        };

        let request = SweepRequest::try_from(file).unwrap();
        assert_eq!(request.accounts[0].assets[0], Pubkey::default());
    }

    #[test]
    fn test_file_rejects_bad_key() {
        let file = SweepRequestFile {
            destination: Pubkey::new_unique().to_string(),
            accounts: vec![SourceAccountFile {
                owner: "not-a-key".to_string(),
                assets: vec![],
            }],
        };

        let err = SweepRequest::try_from(file).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(msg) if msg.contains("accounts[0].owner")));
    }

    #[test]
    fn test_load_from_disk() {
        let request = SweepRequest::new(
            Pubkey::new_unique(),
            vec![SourceAccount::new(
                Pubkey::new_unique(),
                vec![Pubkey::new_unique()],
            )],
        );
        let json = serde_json::to_string_pretty(&SweepRequestFile::from(&request)).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = SweepRequest::load(file.path()).unwrap();
        assert_eq!(loaded, request);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SweepRequest::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}

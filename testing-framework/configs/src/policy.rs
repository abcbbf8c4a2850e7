use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use serde_json::Value;

use crate::ConfigError;

/// Endorsement policy definition, passed through to the admin client as-is.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EndorsementPolicy(pub Value);

/// Named endorsement policies loaded from `policies.json`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct PolicyBook {
    policies: BTreeMap<String, EndorsementPolicy>,
}

impl PolicyBook {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::ParseJson {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn policy(&self, name: &str) -> Result<&EndorsementPolicy, ConfigError> {
        self.policies
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPolicy {
                name: name.to_owned(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_named_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.json");
        fs::write(
            &path,
            r#"{
                "1AdminOr2Other": {
                    "identities": [{ "role": { "name": "member", "mspId": "Org1MSP" } }],
                    "policy": { "1-of": [{ "signed-by": 0 }] }
                },
                "empty": {}
            }"#,
        )
        .unwrap();

        let book = PolicyBook::load(&path).unwrap();
        let policy = book.policy("1AdminOr2Other").unwrap();
        assert_eq!(policy.0["policy"]["1-of"][0]["signed-by"], 0);
        assert_eq!(book.names().collect::<Vec<_>>(), vec!["1AdminOr2Other", "empty"]);
    }

    #[test]
    fn unknown_policy_fails_fast() {
        let book = PolicyBook::default();
        let err = book.policy("nope").unwrap_err();
        assert_eq!(err.to_string(), "unknown endorsement policy 'nope'");
    }
}

//! Parsers for the free-form arguments carried by step sentences.

use crate::WorkflowError;

/// Parses a JSON string array such as `["init","a","100"]`. `[]` yields no
/// arguments.
pub fn parse_args(raw: &str) -> Result<Vec<String>, WorkflowError> {
    serde_json::from_str(raw.trim()).map_err(|err| WorkflowError::InvalidArgument {
        message: format!("chaincode args must be a JSON array of strings, got '{raw}': {err}"),
    })
}

/// `newly` installed chaincode is instantiated; anything else upgrades an
/// existing instantiation.
#[must_use]
pub fn parse_upgrade(existing: &str) -> bool {
    existing.trim() != "newly"
}

//! Shared snapshot (de)serialization with the schema-version check.

use dirsync_core::model::{State, STATE_SCHEMA_VERSION};

use crate::error::{StateError, StateResult};

pub(crate) fn decode(bytes: &[u8]) -> StateResult<State> {
    let state: State = serde_json::from_slice(bytes)?;
    if state.schema_version != STATE_SCHEMA_VERSION {
        return Err(StateError::SchemaVersion {
            found: state.schema_version,
        });
    }
    Ok(state)
}

pub(crate) fn encode(state: &State) -> StateResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(state)?)
}

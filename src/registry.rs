//! Dataset registry seams: identity and stored-dataset metadata.
//!
//! Storage and authentication live outside this crate. Only the rules around
//! them (size cap, naming, ownership) are enforced here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Who is signed in.
pub trait AuthSession {
    /// Stable identity of the current user, if any.
    fn current_identity(&self) -> Option<String>;
    fn is_anonymous(&self) -> bool;
}

/// Metadata of one stored dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub id: String,
    pub name: String,
    pub unique_file_name: String,
    pub created_at: DateTime<Utc>,
    pub file_type: String,
    pub owner: String,
    pub storage_path: String,
}

/// A dataset about to be stored; the repository assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDataset {
    pub name: String,
    pub unique_file_name: String,
    pub created_at: DateTime<Utc>,
    pub file_type: String,
    pub owner: String,
    pub storage_path: String,
}

/// Owner-scoped dataset listing persistence.
pub trait DatasetRepository {
    fn list(&self, owner: &str) -> Result<Vec<DatasetEntry>>;
    fn create(&mut self, dataset: NewDataset) -> Result<DatasetEntry>;
    fn delete(&mut self, owner: &str, id: &str) -> Result<()>;
}

/// Validate an upload and record it.
///
/// # Errors
/// [`Error::Registry`] when the file is too large, the name is blank or no
/// one is signed in.
pub fn register_upload<R: DatasetRepository>(
    repo: &mut R,
    auth: &impl AuthSession,
    name: &str,
    file_type: &str,
    size_bytes: u64,
    now: DateTime<Utc>,
) -> Result<DatasetEntry> {
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(Error::Registry(format!(
            "file size {size_bytes} bytes exceeds the {MAX_UPLOAD_BYTES} byte limit"
        )));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Registry("a dataset name is required".into()));
    }
    let owner = auth
        .current_identity()
        .ok_or_else(|| Error::Registry("sign in to upload datasets".into()))?;
    if auth.is_anonymous() {
        log::debug!("upload by anonymous identity {owner}");
    }

    let unique_file_name = format!("{}-{name}", now.timestamp_millis());
    let storage_path = format!("datasets/{owner}/{unique_file_name}");
    log::info!("registering upload '{name}' at {storage_path}");

    repo.create(NewDataset {
        name: name.to_string(),
        unique_file_name,
        created_at: now,
        file_type: file_type.to_string(),
        owner,
        storage_path,
    })
}

/// Delete one of the current user's datasets.
pub fn remove_dataset<R: DatasetRepository>(repo: &mut R, auth: &impl AuthSession, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::Registry("invalid dataset selected for deletion".into()));
    }
    let owner = auth
        .current_identity()
        .ok_or_else(|| Error::Registry("sign in to delete datasets".into()))?;
    repo.delete(&owner, id)
}

//! Deletion against repositories that leave a tombstone behind.
//!
//! After a successful DELETE such a repository answers `410 Gone` for the
//! old path and advertises the tombstone through a `hasTombstone` link. The
//! path only becomes reusable once the tombstone itself is deleted.

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::adapters::AdapterError;
use crate::client::ResourceClient;
use crate::link::links_from_headers;

/// Link relation pointing from a deleted path to its tombstone.
pub const HAS_TOMBSTONE: &str = "hasTombstone";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The resource is gone and nothing was left behind.
    Deleted,
    /// There was nothing to delete.
    AlreadyAbsent,
    /// The resource is gone but its tombstone could not be purged.
    DeletedWithStaleTombstone,
    /// The repository refused the delete.
    Rejected(StatusCode),
}

impl DeleteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted | DeleteOutcome::AlreadyAbsent)
    }
}

/// Delete `path`, then purge any tombstone the repository leaves in its place.
pub async fn delete_resource(
    client: &dyn ResourceClient,
    path: &str,
) -> Result<DeleteOutcome, AdapterError> {
    let response = client.delete_resource(path).await?;
    debug!(path = %path, status = %response.status, "Deleted resource");

    match response.status {
        StatusCode::NO_CONTENT => {
            if purge_tombstone(client, path).await? {
                Ok(DeleteOutcome::Deleted)
            } else {
                Ok(DeleteOutcome::DeletedWithStaleTombstone)
            }
        }
        StatusCode::NOT_FOUND => Ok(DeleteOutcome::AlreadyAbsent),
        status => Ok(DeleteOutcome::Rejected(status)),
    }
}

/// Returns `false` when a tombstone exists and at least part of it survives.
async fn purge_tombstone(client: &dyn ResourceClient, path: &str) -> Result<bool, AdapterError> {
    let followup = client.head_resource(path).await?;
    if followup.status != StatusCode::GONE {
        return Ok(true);
    }

    let tombstones: Vec<_> = links_from_headers(&followup.headers)
        .into_iter()
        .filter(|link| link.has_rel(HAS_TOMBSTONE))
        .collect();
    if tombstones.is_empty() {
        warn!(path = %path, "Resource is gone but advertises no tombstone to delete");
        return Ok(false);
    }

    let mut purged = true;
    for tombstone in tombstones {
        let response = client.delete_resource(&tombstone.target).await?;
        if response.status == StatusCode::NO_CONTENT {
            debug!(path = %path, tombstone = %tombstone.target, "Purged tombstone");
        } else {
            warn!(
                path = %path,
                tombstone = %tombstone.target,
                status = %response.status,
                "Failed to purge tombstone"
            );
            purged = false;
        }
    }
    Ok(purged)
}

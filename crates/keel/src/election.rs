//! Preferred leader election requests.

use crate::{
    ClusterError,
    coordination::{CoordinationSession, Status},
    schema::{ElectionRequest, PREFERRED_ELECTION_PATH, PartitionRef},
};
use log::info;

/// Submit a preferred leader election for `partitions`.
///
/// The request is a single create of the admin node. The controller removes
/// the node once the election completes, so an existing node means an earlier
/// request is still pending: that case is reported as `Conflict` and the
/// pending request is left untouched. No retry is attempted.
pub fn trigger_preferred_leader_election(
    session: &CoordinationSession,
    partitions: Vec<PartitionRef>,
) -> Result<(), ClusterError> {
    let request = ElectionRequest::new(partitions);
    let payload = serde_json::to_vec(&request)
        .map_err(|e| ClusterError::from_payload_error(e, PREFERRED_ELECTION_PATH))?;

    match session.create(PREFERRED_ELECTION_PATH, Some(payload.as_slice()))? {
        Status::Ok => {
            info!(
                "Requested preferred leader election for {} partitions",
                request.partitions.len()
            );
            Ok(())
        }
        Status::NodeExists => Err(ClusterError::Conflict {
            path: PREFERRED_ELECTION_PATH.to_string(),
        }),
        status => Err(ClusterError::operation(PREFERRED_ELECTION_PATH, status)),
    }
}

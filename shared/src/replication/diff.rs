use crate::error::LibraryError;

/// Encodes `current` relative to `baseline`. Unchanged bytes become zero,
/// which compresses well.
pub fn diff_snapshots(baseline: &[u8], current: &[u8]) -> Result<Vec<u8>, LibraryError> {
    xor(baseline, current)
}

/// Reconstructs the snapshot a diff was computed from
pub fn apply_diff(baseline: &[u8], diff: &[u8]) -> Result<Vec<u8>, LibraryError> {
    xor(baseline, diff)
}

fn xor(left: &[u8], right: &[u8]) -> Result<Vec<u8>, LibraryError> {
    if left.len() != right.len() {
        return Err(LibraryError::SnapshotSizeMismatch {
            expected: left.len(),
            actual: right.len(),
        });
    }
    Ok(left.iter().zip(right).map(|(a, b)| a ^ b).collect())
}

use crate::types::SequenceNumber;

/// Half of the sequence number space. A sequence is considered newer than
/// another when it lies less than this distance ahead of it.
pub const SEQUENCE_HALF_RANGE: u16 = 1 << 15;

/// Returns whether or not a wrapping number is greater (newer) than another.
/// `s1` is newer than `s2` iff `(s1 - s2 - 1) mod 2^16 < 2^15`.
/// sequence_greater_than(2,1) will return true
/// sequence_greater_than(1,2) will return false
/// sequence_greater_than(1,1) will return false
pub fn sequence_greater_than(s1: SequenceNumber, s2: SequenceNumber) -> bool {
    s1.wrapping_sub(s2).wrapping_sub(1) < SEQUENCE_HALF_RANGE
}

/// Returns whether or not a wrapping number is less (older) than another
/// sequence_less_than(1,2) will return true
/// sequence_less_than(2,1) will return false
/// sequence_less_than(1,1) will return false
pub fn sequence_less_than(s1: SequenceNumber, s2: SequenceNumber) -> bool {
    sequence_greater_than(s2, s1)
}

/// Retrieves the wrapping difference `b - a` between 2 sequence numbers
///
/// # Examples
/// ```
/// # use snapwire_shared::wrapping_diff;
/// assert_eq!(wrapping_diff(1, 2), 1);
/// assert_eq!(wrapping_diff(2, 1), -1);
/// assert_eq!(wrapping_diff(65535, 0), 1);
/// assert_eq!(wrapping_diff(0, 65535), -1);
/// ```
pub fn wrapping_diff(a: SequenceNumber, b: SequenceNumber) -> i16 {
    b.wrapping_sub(a) as i16
}

/// Distance walked forward from `from` to reach `to`, in `[0, 2^16)`
pub fn sequence_distance(from: SequenceNumber, to: SequenceNumber) -> u16 {
    to.wrapping_sub(from)
}

/// Default number of slots in each history buffer ring
pub const HISTORY_BUFFER_SIZE: usize = 50;

/// Number of slots in the client's outgoing reliable message ring
pub const MESSAGE_BUFFER_SIZE: usize = 50;

/// Valid snapshots kept behind the application slot for interpolation. Also
/// the number of points gathered on each side of it when reading attributes.
pub const INTERPOLATION_CUSHION: usize = 10;

/// Largest custom message payload (its length is written as a single byte and
/// zero terminates a message group)
pub const MAX_MESSAGE_SIZE: usize = 255;

/// Largest creation metadata payload
pub const MAX_METADATA_SIZE: usize = 255;

/// Receive buffer size, large enough for any UDP datagram
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

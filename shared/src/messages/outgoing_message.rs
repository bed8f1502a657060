use crate::{constants::MAX_MESSAGE_SIZE, error::UsageError};

/// A custom message queued by the application for the next flush
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub payload: Box<[u8]>,
    pub reliable: bool,
}

impl OutgoingMessage {
    pub fn new(payload: &[u8], reliable: bool) -> Result<Self, UsageError> {
        if payload.is_empty() {
            return Err(UsageError::EmptyMessage);
        }
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(UsageError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        Ok(Self {
            payload: payload.into(),
            reliable,
        })
    }
}

use snapwire_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::types::SequenceNumber;

/// Messages that were first sent under the same sequence number.
///
/// Wire format: `seq(u16) (size(u8) payload)* 0`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageGroup {
    pub sequence: SequenceNumber,
    pub messages: Vec<Box<[u8]>>,
}

/// Writes a group, skipping it entirely when there is nothing to send.
/// Payloads must already be validated to be 1..=255 bytes long.
pub fn write_message_group<'m, I>(writer: &mut ByteWriter, sequence: SequenceNumber, messages: I)
where
    I: IntoIterator<Item = &'m [u8]>,
{
    let mut messages = messages.into_iter().peekable();
    if messages.peek().is_none() {
        return;
    }

    sequence.ser(writer);
    for payload in messages {
        writer.write_byte(payload.len() as u8);
        writer.write_bytes(payload);
    }
    writer.write_byte(0);
}

/// Reads every group remaining in the stream
pub fn read_message_groups(reader: &mut ByteReader) -> Result<Vec<MessageGroup>, SerdeErr> {
    let mut groups = Vec::new();
    while !reader.is_empty() {
        let sequence = SequenceNumber::de(reader)?;
        let mut messages = Vec::new();
        loop {
            let size = reader.read_byte()?;
            if size == 0 {
                break;
            }
            messages.push(reader.read_bytes(usize::from(size))?.into());
        }
        groups.push(MessageGroup { sequence, messages });
    }
    Ok(groups)
}

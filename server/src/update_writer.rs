use std::collections::{BTreeSet, HashSet};

use log::trace;

use snapwire_shared::{
    diff_snapshots, write_message_group, ByteWriter, LibraryError, ObjectAction, ObjectId,
    ObjectTag, SlotIndex,
};

use crate::{
    connection::connection::Connection,
    history_buffer::ServerHistoryBuffer,
    object_store::{ServerObject, ServerObjectStore},
};

/// Writes the update of the running tick for one peer.
///
/// Objects the peer acknowledged in `ack_index` are sent as diffs against
/// that snapshot, or as deletes once they left `scope`. Objects newly in
/// scope are sent whole. Objects sent after the acknowledged tick that are
/// gone again are announced as created & deleted, so a peer that received
/// them learns of their removal.
///
/// Records what was sent in the peer's scope list for the running slot and
/// buffers its reliable messages there.
pub fn write_update(
    writer: &mut ByteWriter,
    history: &ServerHistoryBuffer,
    store: &ServerObjectStore,
    connection: &mut Connection,
    scope: BTreeSet<ObjectId>,
    ack_index: Option<SlotIndex>,
) -> Result<(), LibraryError> {
    let Some(current) = history.current_index() else {
        return Ok(());
    };
    let seq = history.current_seq();
    let ack = ack_index.map_or(seq, |index| history.index_to_seq(index));

    writer.write(&seq);
    writer.write(&ack);
    writer.write(&history.time(current));
    writer.write(&connection.message_ack());

    let mut remaining = scope;
    let mut sent_scope = Vec::new();
    let ack_scope: Vec<ObjectId> = ack_index
        .map(|index| connection.scope(index).to_vec())
        .unwrap_or_default();

    // diffs against the acknowledged tick
    if let Some(ack_index) = ack_index {
        for object_id in ack_scope.iter().copied() {
            let object = store
                .get(&object_id)
                .ok_or(LibraryError::MissingBaseline { object_id })?;
            let baseline = object
                .snapshot(ack_index)
                .ok_or(LibraryError::MissingBaseline { object_id })?;

            let (tag, data) = if remaining.remove(&object_id) {
                sent_scope.push(object_id);
                let data = object
                    .snapshot(current)
                    .ok_or(LibraryError::MissingBaseline { object_id })?;
                (ObjectTag::new(ObjectAction::Diff), data)
            } else {
                let data = object.last_snapshot(current).unwrap_or(baseline);
                let tag = ObjectTag::new(ObjectAction::Delete).with_death(object.is_destroyed());
                (tag, data)
            };

            trace!("object {} {:?} for {}", object_id, tag.action, connection.address);
            writer.write_byte(tag.to_byte());
            writer.write_bytes(&diff_snapshots(baseline, data)?);
        }
    }
    writer.write_byte(ObjectTag::end_of_section().to_byte());

    // newly visible objects
    for object_id in remaining {
        let object = store
            .get(&object_id)
            .ok_or(LibraryError::MissingBaseline { object_id })?;
        let data = object
            .snapshot(current)
            .ok_or(LibraryError::MissingBaseline { object_id })?;
        let tag = ObjectTag::new(ObjectAction::Create)
            .with_birth(object.creation_index() == Some(current));

        trace!("object {} created for {}", object_id, connection.address);
        write_creation(writer, tag, object, data);
        sent_scope.push(object_id);
    }

    // objects that appeared and vanished since the acknowledged tick
    let unacked_slots: Vec<SlotIndex> = match (ack_index, connection.first_update_index()) {
        (Some(ack_index), _) => history.slots_after(ack_index).collect(),
        (None, Some(first)) => history.slots_since(first).collect(),
        (None, None) => Vec::new(),
    };
    let mut announced: HashSet<ObjectId> = ack_scope.iter().chain(&sent_scope).copied().collect();
    for &slot in &unacked_slots {
        for &object_id in connection.scope(slot) {
            if !announced.insert(object_id) {
                continue;
            }
            let Some(object) = store.get(&object_id) else {
                continue;
            };
            let Some(data) = object.last_snapshot(current).or_else(|| object.snapshot(slot)) else {
                continue;
            };
            let tag = ObjectTag::new(ObjectAction::CreateAndDelete).with_death(object.is_destroyed());

            trace!("object {} created & deleted for {}", object_id, connection.address);
            write_creation(writer, tag, object, data);
        }
    }
    writer.write_byte(ObjectTag::end_of_section().to_byte());

    // reliable messages not yet acknowledged, then this tick's messages
    for &slot in &unacked_slots {
        write_message_group(
            writer,
            history.index_to_seq(slot),
            connection.buffered_messages(slot).iter().map(|message| &message[..]),
        );
    }
    let outgoing = connection.take_outgoing_messages();
    write_message_group(
        writer,
        seq,
        outgoing.iter().map(|message| &message.payload[..]),
    );
    for message in outgoing {
        if message.reliable {
            connection.buffer_message(current, message.payload);
        }
    }

    connection.set_scope(current, sent_scope);
    Ok(())
}

fn write_creation(writer: &mut ByteWriter, tag: ObjectTag, object: &ServerObject, data: &[u8]) {
    let metadata = object.metadata();
    writer.write_byte(tag.with_metadata(metadata.is_some()).to_byte());
    writer.write(&object.class_id());
    writer.write(&object.id());
    if let Some(metadata) = metadata {
        writer.write_byte(metadata.len() as u8);
        writer.write_bytes(metadata);
    }
    writer.write_bytes(data);
}

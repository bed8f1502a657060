use log::trace;

use snapwire_shared::{
    apply_diff, ByteReader, ClassId, ClassRegistry, LibraryError, ObjectAction, ObjectId,
    ObjectTag, SequenceNumber, Serde, SerdeErr, SlotIndex,
};

use crate::object_store::{ClientObjectStore, SnapshotState};

const DIFF_SECTION: &str = "diff";
const CREATION_SECTION: &str = "creation";

/// Fixed fields at the start of every server update
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UpdateHeader {
    pub seq: SequenceNumber,
    pub ack: SequenceNumber,
    pub time: f64,
    /// Newest client message sequence the server has received
    pub message_ack: SequenceNumber,
}

impl UpdateHeader {
    pub fn read(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            seq: SequenceNumber::de(reader)?,
            ack: SequenceNumber::de(reader)?,
            time: f64::de(reader)?,
            message_ack: SequenceNumber::de(reader)?,
        })
    }
}

/// Reads the diff & creation sections of an update stored in `seq_index`,
/// whose diffs are relative to the snapshots held in `ack_index`. The reader
/// is left at the first message group.
pub fn read_objects(
    reader: &mut ByteReader,
    registry: &ClassRegistry,
    store: &mut ClientObjectStore,
    seq_index: SlotIndex,
    ack_index: SlotIndex,
) -> Result<(), LibraryError> {
    read_diff_section(reader, registry, store, seq_index, ack_index)?;
    read_creation_section(reader, registry, store, seq_index)
}

fn read_tag(reader: &mut ByteReader, section: &'static str) -> Result<ObjectTag, LibraryError> {
    let byte = reader.read_byte()?;
    ObjectTag::from_byte(byte).ok_or(LibraryError::UnexpectedObjectTag { tag: byte, section })
}

fn class_size(registry: &ClassRegistry, class_id: ClassId) -> Result<usize, LibraryError> {
    registry
        .get(class_id)
        .map(|class| class.byte_size())
        .ok_or(LibraryError::UnknownClass { class_id })
}

fn read_diff_section(
    reader: &mut ByteReader,
    registry: &ClassRegistry,
    store: &mut ClientObjectStore,
    seq_index: SlotIndex,
    ack_index: SlotIndex,
) -> Result<(), LibraryError> {
    // one tag per baseline object, in the order they were first written
    let baseline: Vec<ObjectId> = store.packet_objects(ack_index).to_vec();
    let mut baseline = baseline.into_iter();

    loop {
        let tag = read_tag(reader, DIFF_SECTION)?;
        if tag.action == ObjectAction::EndOfSection {
            return Ok(());
        }
        let unexpected = LibraryError::UnexpectedObjectTag {
            tag: tag.to_byte(),
            section: DIFF_SECTION,
        };
        if !matches!(
            tag.action,
            ObjectAction::Diff | ObjectAction::Snapshot | ObjectAction::Delete
        ) {
            return Err(unexpected);
        }
        let Some(object_id) = baseline.next() else {
            return Err(unexpected);
        };
        let Some(object) = store.get_mut(&object_id) else {
            return Err(LibraryError::MissingBaseline { object_id });
        };

        let payload = reader.read_bytes(class_size(registry, object.class_id())?)?;
        let data: Box<[u8]> = match tag.action {
            ObjectAction::Snapshot => payload.into(),
            _ => {
                let ack_data = object
                    .snapshot(ack_index)
                    .ok_or(LibraryError::MissingBaseline { object_id })?;
                apply_diff(ack_data, payload)?.into()
            }
        };

        trace!("object {} {:?} in slot {}", object_id, tag.action, seq_index);
        if tag.action == ObjectAction::Delete {
            object.set_snapshot(seq_index, data, SnapshotState::Destroyed, false, tag.death);
        } else {
            object.set_snapshot(seq_index, data, SnapshotState::Updated, false, false);
            store.add_to_packet(seq_index, object_id);
        }
    }
}

fn read_creation_section(
    reader: &mut ByteReader,
    registry: &ClassRegistry,
    store: &mut ClientObjectStore,
    seq_index: SlotIndex,
) -> Result<(), LibraryError> {
    loop {
        let tag = read_tag(reader, CREATION_SECTION)?;
        match tag.action {
            ObjectAction::EndOfSection => return Ok(()),
            ObjectAction::Create | ObjectAction::CreateAndDelete => {}
            _ => {
                return Err(LibraryError::UnexpectedObjectTag {
                    tag: tag.to_byte(),
                    section: CREATION_SECTION,
                })
            }
        }

        let class_id = ClassId::de(reader)?;
        let object_id = ObjectId::de(reader)?;
        let metadata = if tag.has_metadata {
            let length = reader.read_byte()?;
            Some(reader.read_bytes(usize::from(length))?)
        } else {
            None
        };

        let known = store.contains(&object_id);
        if !known {
            // validates the class before allocating a record
            class_size(registry, class_id)?;
        }
        let object = store.insert(object_id, class_id);
        let data: Box<[u8]> = reader
            .read_bytes(class_size(registry, object.class_id())?)?
            .into();
        if let Some(metadata) = metadata {
            object.offer_metadata(metadata.into());
        }

        trace!("object {} {:?} in slot {}", object_id, tag.action, seq_index);
        if tag.action == ObjectAction::Create {
            object.set_snapshot(seq_index, data, SnapshotState::Created, tag.birth, false);
            store.add_to_packet(seq_index, object_id);
        } else {
            let state = if known {
                SnapshotState::Destroyed
            } else {
                SnapshotState::CreatedAndDestroyed
            };
            object.set_snapshot(seq_index, data, state, tag.birth, tag.death);
        }
    }
}

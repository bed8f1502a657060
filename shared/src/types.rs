pub type SequenceNumber = u16;
pub type ObjectId = u32;
pub type ClassId = u16;
pub type ConnectionId = u32;
pub type ApplicationId = u16;
pub type SlotIndex = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

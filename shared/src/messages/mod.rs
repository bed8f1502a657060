pub mod message_group;
pub mod message_receiver;
pub mod outgoing_message;
pub mod reliable_message_buffer;

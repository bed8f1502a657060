pub mod diff;
pub mod object_tag;

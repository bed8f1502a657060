pub mod attribute;
pub mod class_registry;
pub mod interpolation;
pub mod object_class;

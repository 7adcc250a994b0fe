pub mod callable;
pub mod events;

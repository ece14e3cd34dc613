pub mod builtin;
pub mod multitool;

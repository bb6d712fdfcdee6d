pub mod access;
pub mod skip;

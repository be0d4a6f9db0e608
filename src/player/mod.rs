pub mod backend;
pub mod position;

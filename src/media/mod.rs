pub mod cover;
pub mod probe;

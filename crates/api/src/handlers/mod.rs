pub mod collections;
pub mod versions;

pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Get, Init, List, Meta, Put, Serve, Version};

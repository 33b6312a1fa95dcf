pub mod args;
pub mod config;
pub mod op;
pub mod ops;

pub use ops::{Cat, Copy, Empty, Exists, Get, Ls, Put, Rm, Stat, Url};

pub mod zone;

pub use zone::*;

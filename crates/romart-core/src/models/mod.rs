//! Data models shared by adapters, the manifest matcher and the registry.

mod lookup;
mod media;
mod rom;

pub use lookup::*;
pub use media::*;
pub use rom::*;

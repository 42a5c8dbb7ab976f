//! Versioned save records.
//!
//! A record starts with the mobile block every version shares, then the
//! creature version and a body in that version's layout. Versions before
//! [`FLAGGED_SINCE`] use fixed field orders, later ones a [`SaveFlags`] mask
//! followed by only the fields that differ from the species defaults.
//! Writers always emit [`CURRENT_VERSION`].
//!
//! Loading is two-phase. [`Creature::deserialize`](crate::creature::Creature::deserialize)
//! reconstructs the record on its own; anything that depends on other
//! entities or on the scheduler comes back as [`PostLoadFixup`]s, applied by
//! [`LoadedCreature::finish`] once the whole world has been read.
mod codec;
mod error;
mod flags;
mod legacy;
mod stream;

pub use codec::{CURRENT_VERSION, FLAGGED_SINCE, LoadContext, LoadedCreature, PostLoadFixup};
pub use error::PersistError;
pub use flags::SaveFlags;
pub use stream::{SaveReader, SaveWriter};

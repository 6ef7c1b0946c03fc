//! Job-family code remapping.
//!
//! - [`AliasTable`]: ordered `from -> to` code pairs with forward and
//!   reverse lookup.
//! - [`ExecDirectory`]: code -> human-readable exec family name.
//! - [`FamilyLookup`]: both of the above folded into the lookup map every
//!   resolution consults.
//! - [`FamilyPolicy`]: engineering / finance classification by code prefix.

mod families;
mod table;

pub use families::{ExecDirectory, FamilyLookup, FamilyPolicy, ResolvedFamily};
pub use table::{AliasEntry, AliasTable};

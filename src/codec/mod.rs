//! Level and benchmark-token codecs.
//!
//! Internal levels look like `L6 IC`, `L6.5 IC`, `L8 Mgr`. Survey rows carry
//! a benchmark token at the end of their job code (`SWE.P5`, `FIN.F3`,
//! `EXE.EA`). The level table maps the former to the latter.

mod level;
mod levels;
mod token;

pub use level::{canonical_level, LevelSpec, Role, EXECUTIVE_TIER};
pub use levels::{LevelEntry, LevelTable};
pub use token::{BenchmarkToken, TokenQuery};

//! # specguard spec
//!
//! Reads specification units and turns them into endpoint entries.
//!
//! A unit is sniffed once into a [`DocumentPattern`] and handed to the
//! [`UnitParser`] for that pattern:
//!
//! - `### API GET /api/users` headings: **direct**, one entry per heading
//! - `### API 10001` sections with `Method`/`Path` fields: **numbered**
//! - anything else: **narrative**, no entries
//!
//! Every entry's route is mapped to its handler file by [`PathNormalizer`].

mod entry;
mod error;
mod normalize;
mod parser;
mod units;

pub use entry::{
    DocumentPattern, HttpMethod, ParseWarning, ParsedUnit, SectionField, SpecificationEntry,
};
pub use error::{Result, SpecError};
pub use normalize::PathNormalizer;
pub use parser::{DirectParser, NarrativeParser, NumberedParser, SpecParser, UnitParser};
pub use units::{discover_units, load_unit, natural_cmp, UnitLoad, UnitRef};

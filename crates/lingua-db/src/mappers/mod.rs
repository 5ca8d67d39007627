//! Entity <-> Model mappers
//!
//! Text columns are parsed back into domain enums, so row-to-entity
//! conversion is fallible.

mod subject;

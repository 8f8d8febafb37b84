//! Query filter language for scoping stored errors
//!
//! A query is zero or more lines, each narrowing the stored history, plus an
//! optional free-text search term. All lines and the search term combine with AND.
//!
//! # Syntax
//!
//! ```text
//! <property> <condition> <value>
//! ```
//!
//! Fields are separated by whitespace; the value is the rest of the line.
//!
//! # Conditions
//!
//! - `=` / `!=` - exact (ordinal) equality
//! - `~` / `!~` - ordinal substring
//!
//! # Properties
//!
//! `application`, `host`, `type`, `source`, `message`, `detail`, `user`,
//! `status`, `method`, `path`, `url` compare as strings. `time` takes a
//! `yyyy-MM-dd` or `yyyy-MM-dd HH:mm:ss` literal and only supports `=` and `!=`.
//!
//! # Examples
//!
//! ```text
//! message ~ timeout                  # Messages mentioning a timeout
//! type = System.Data.SqlException    # One exception type
//! status != 404                      # Everything but not-found
//! time = 2025-03-01                  # Captured on that UTC day
//! ```

pub mod collection;
pub mod error;
pub mod matcher;
pub mod parser;

pub use collection::FilterCollection;
pub use error::QueryParseError;
pub use matcher::property_text;
pub use parser::{Condition, DateOperand, Property, PropertyType, QueryFilter};

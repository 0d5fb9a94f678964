pub mod errors;
pub mod config;
pub mod params;
pub mod search_form;
pub mod pattern;
pub mod filter;
pub mod controller;
pub mod widgets;
pub mod generator;
pub mod installer;
mod inflect;
mod parser;

pub use config::FilterConfig;
pub use controller::{DynamicResource, FilterableResource};
pub use errors::{FilterError, Result};
pub use filter::{apply_filters, substring_filters, Queryable, RecordSet, SqlQuery, SubstringFilter};
pub use params::Params;
pub use pattern::{contains_pattern, escape_like};
pub use search_form::{FieldKind, FieldValue, FormSchema, SchemaRegistry, SearchForm};
pub use widgets::{Debouncer, Display, FilterToggle};

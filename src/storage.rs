/// Rule catalog files.
pub mod rules;
pub use rules::{load_catalog, parse_catalog, CatalogLoadError, RulesFormat};

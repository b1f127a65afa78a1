//! Utility types for the public-forms crates.

mod multi_value_dict;

pub use multi_value_dict::MultiValueDict;

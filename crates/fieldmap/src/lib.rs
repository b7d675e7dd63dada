//! Convert typed records into generic key-value maps.
//!
//! Derive [`Reflect`] on a struct with named fields, then hand it to a
//! [`Converter`]. Field behavior is driven by `#[tag(fieldmap = "...")]`
//! annotations: a name override followed by options (`omitempty`, `string`,
//! `ptr2`, `omitnested`, `flatten`).
//!
//! ```
//! use fieldmap::{Reflect, Value};
//!
//! #[derive(Debug, Clone, PartialEq, Reflect)]
//! struct Address {
//!     pub city: String,
//! }
//!
//! #[derive(Debug, Clone, PartialEq, Reflect)]
//! struct User {
//!     #[tag(fieldmap = "Name")]
//!     pub name: String,
//!     #[tag(fieldmap = ",omitempty")]
//!     pub age: u32,
//!     pub address: Address,
//! }
//!
//! let user = User {
//!     name: "Ann".into(),
//!     age: 0,
//!     address: Address { city: "Oslo".into() },
//! };
//! let map = fieldmap::to_map(&user).expect("records always convert");
//!
//! assert_eq!(map["Name"], Value::from("Ann"));
//! assert!(!map.contains_key("age"));
//! assert_eq!(map["address"].as_map().and_then(|a| a.get("city")), Some(&Value::from("Oslo")));
//! ```

extern crate self as fieldmap;

use std::sync::OnceLock;

pub mod config;
pub mod convert;
pub mod error;
pub mod hook;
pub mod reflect;
mod reflect_impls;
pub mod tag;
pub mod value;

pub use config::{ConverterConfig, DEFAULT_TAG_KEY};
pub use convert::Converter;
pub use error::{ConvertError, Result};
pub use hook::{Hook, Hooks, TypedHook, hook_for};
pub use reflect::{
    AsReflect, Concrete, Field, FieldRef, Hooker, Kind, MapReflect, Record, Reflect, SeqReflect,
    Shape, TypeDesc, Typed,
};
pub use reflect_impls::MapKey;
pub use tag::{TagOptions, parse_tag};
pub use value::{Map, Opaque, Value};

#[cfg(feature = "derive")]
pub use fieldmap_derive::Reflect;

fn default_converter() -> &'static Converter {
    static DEFAULT: OnceLock<Converter> = OnceLock::new();
    DEFAULT.get_or_init(Converter::new)
}

/// [`Converter::convert`] with the default converter: tag key `fieldmap`, no
/// hooks.
pub fn to_map<R: Reflect + ?Sized>(value: &R) -> Option<Map> {
    default_converter().convert(value)
}

/// [`Converter::convert_shallow`] with the default converter.
pub fn to_map_shallow<R: Reflect + ?Sized>(value: &R) -> Option<Map> {
    default_converter().convert_shallow(value)
}

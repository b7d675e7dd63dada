//! Field annotation parsing.
//!
//! An annotation is a comma separated list: the first element overrides the
//! output name (empty keeps the declared name), the rest are options.
//!
//! ```
//! use fieldmap::tag::parse_tag;
//!
//! let (name, options) = parse_tag("addr,omitempty,ptr2");
//! assert_eq!(name, "addr");
//! assert!(options.omit_empty() && options.ptr2());
//! assert!(!options.flatten());
//! ```

pub const OMIT_EMPTY: &str = "omitempty";
pub const STRING: &str = "string";
pub const PTR2: &str = "ptr2";
pub const OMIT_NESTED: &str = "omitnested";
pub const FLATTEN: &str = "flatten";

/// Options that follow the name in an annotation. Unrecognized options are
/// kept and queryable through [`TagOptions::has`] but have no effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagOptions<'a>(Vec<&'a str>);

impl<'a> TagOptions<'a> {
    pub fn has(&self, option: &str) -> bool {
        self.0.iter().any(|candidate| *candidate == option)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.0.iter().copied()
    }

    pub fn omit_empty(&self) -> bool {
        self.has(OMIT_EMPTY)
    }

    pub fn string(&self) -> bool {
        self.has(STRING)
    }

    pub fn ptr2(&self) -> bool {
        self.has(PTR2)
    }

    pub fn omit_nested(&self) -> bool {
        self.has(OMIT_NESTED)
    }

    pub fn flatten(&self) -> bool {
        self.has(FLATTEN)
    }
}

pub fn parse_tag(tag: &str) -> (&str, TagOptions<'_>) {
    let mut parts = tag.split(',').map(str::trim);
    let name = parts.next().unwrap_or("");
    let options = parts.filter(|option| !option.is_empty()).collect();
    (name, TagOptions(options))
}

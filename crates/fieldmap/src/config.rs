use bon::Builder;
use serde::Deserialize;

/// Tag key read when none is configured: `#[tag(fieldmap = "...")]`.
pub const DEFAULT_TAG_KEY: &str = "fieldmap";

/// Construction-time settings of a [`Converter`](crate::Converter).
///
/// Deserializable so host applications can load it next to their own config.
#[derive(Clone, Debug, PartialEq, Eq, Builder, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Annotation key the converter reads field tags from.
    #[builder(into, default = DEFAULT_TAG_KEY.to_string())]
    pub tag_key: String,
    /// Makes [`Converter::convert`](crate::Converter::convert) behave like
    /// [`Converter::convert_shallow`](crate::Converter::convert_shallow).
    #[builder(default)]
    pub omit_nested: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig::builder().build()
    }
}

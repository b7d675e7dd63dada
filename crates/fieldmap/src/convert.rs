//! The conversion engine and the nested walker.

use tracing::trace;

use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use crate::hook::{Hook, Hooks};
use crate::reflect::{FieldRef, Kind, Record, Reflect, Shape, TypeDesc};
use crate::tag::{TagOptions, parse_tag};
use crate::value::{Map, Value};

/// Converts records into [`Map`]s.
///
/// A converter is built once, hooks registered up front, then shared. Calls
/// take `&self` and keep no state between them.
///
/// ```
/// use fieldmap::{Converter, Reflect, Value};
///
/// #[derive(Debug, Clone, PartialEq, Reflect)]
/// struct Server {
///     pub name: String,
///     #[tag(fieldmap = "port,omitempty")]
///     pub port: u16,
/// }
///
/// let converter = Converter::new();
/// let map = converter
///     .convert(&Server { name: "edge".into(), port: 0 })
///     .expect("a record converts to a map");
/// assert_eq!(map.get("name"), Some(&Value::from("edge")));
/// assert!(!map.contains_key("port"));
/// ```
#[derive(Debug, Default)]
pub struct Converter {
    config: ConverterConfig,
    hooks: Hooks,
}

const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Converter>();
};

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ConverterConfig) -> Self {
        Self {
            config,
            hooks: Hooks::new(),
        }
    }

    pub fn with_tag_key(mut self, tag_key: impl Into<String>) -> Self {
        self.config.tag_key = tag_key.into();
        self
    }

    pub fn with_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Appends a hook. Hooks run in registration order.
    pub fn register_hook(&mut self, hook: impl Hook + 'static) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    pub fn tag_key(&self) -> &str {
        &self.config.tag_key
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Converts a record, descending into nested records and collections of
    /// them.
    ///
    /// Returns `None` for an absent input (`None`, or a pointer analogue
    /// around one).
    ///
    /// # Panics
    ///
    /// When `value` is neither a record nor a pointer analogue around one. Use
    /// [`Converter::try_convert`] to get a [`ConvertError`] instead.
    pub fn convert<R: Reflect + ?Sized>(&self, value: &R) -> Option<Map> {
        self.try_convert(value).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Like [`Converter::convert`], but every field is emitted as its raw
    /// value, as if tagged `omitnested`.
    ///
    /// # Panics
    ///
    /// Same as [`Converter::convert`].
    pub fn convert_shallow<R: Reflect + ?Sized>(&self, value: &R) -> Option<Map> {
        self.try_convert_shallow(value)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    #[tracing::instrument(
        name = "fieldmap.convert",
        level = "trace",
        skip_all,
        fields(type_name = value.type_desc().name(), shallow = self.config.omit_nested)
    )]
    pub fn try_convert<R: Reflect + ?Sized>(&self, value: &R) -> Result<Option<Map>> {
        self.convert_root(value.as_reflect(), self.config.omit_nested)
    }

    #[tracing::instrument(
        name = "fieldmap.convert_shallow",
        level = "trace",
        skip_all,
        fields(type_name = value.type_desc().name())
    )]
    pub fn try_convert_shallow<R: Reflect + ?Sized>(&self, value: &R) -> Result<Option<Map>> {
        self.convert_root(value.as_reflect(), true)
    }

    fn convert_root(&self, value: &dyn Reflect, shallow: bool) -> Result<Option<Map>> {
        let mut current = value;
        loop {
            match current.shape() {
                Shape::Record(record) => return Ok(Some(self.convert_record(record, shallow))),
                Shape::Ptr(Some(inner)) => current = inner,
                Shape::Ptr(None) => {
                    trace!(type_name = value.type_desc().name(), "absent input");
                    return Ok(None);
                }
                Shape::Leaf | Shape::Map(_) | Shape::Seq(_) => {
                    return Err(ConvertError::not_a_record(value));
                }
            }
        }
    }

    fn convert_record(&self, record: &dyn Record, shallow: bool) -> Map {
        let mut out = Map::new();
        record.visit_fields(&self.config.tag_key, &mut |field| {
            self.convert_field(field, shallow, &mut out)
        });
        out
    }

    fn convert_field(&self, field: FieldRef<'_>, shallow: bool, out: &mut Map) {
        let (tag_name, options) = parse_tag(field.tag(&self.config.tag_key));
        let name = if tag_name.is_empty() {
            field.name()
        } else {
            tag_name
        };
        let value = field.value();

        if options.omit_empty() && value.is_zero() {
            trace!(field = name, "omitting empty field");
            return;
        }

        if options.string() {
            match value.as_display() {
                Some(display) => {
                    out.insert(name.to_string(), Value::String(display.to_string()));
                }
                None => trace!(
                    field = name,
                    type_name = value.type_desc().name(),
                    "no string form, field skipped"
                ),
            }
            return;
        }

        if let Some(hooked) = self.hooks.try_convert(value) {
            out.insert(name.to_string(), resolve_ptr2(hooked, &options));
            return;
        }

        if let Some(hooker) = value.as_hooker() {
            out.insert(name.to_string(), resolve_ptr2(hooker.hook(), &options));
            return;
        }

        // ptr2 swaps the pointer for its pointee (or the pointee's zero)
        // before the walker sees it.
        let concrete = if options.ptr2() {
            let concrete = value.concrete();
            if concrete.is_none() && matches!(value.shape(), Shape::Ptr(None)) {
                trace!(
                    field = name,
                    type_name = value.type_desc().name(),
                    "ptr2 found no zero value for the absent pointee"
                );
            }
            concrete
        } else {
            None
        };
        let value: &dyn Reflect = match concrete.as_deref() {
            Some(concrete) => concrete,
            None => value,
        };

        let nested = !shallow && !options.omit_nested();
        let final_val = if nested {
            self.resolve(value)
        } else {
            value.to_raw()
        };

        match final_val {
            Value::Map(entries) if nested && options.flatten() => out.extend(entries),
            final_val => {
                out.insert(name.to_string(), final_val);
            }
        }
    }

    /// The nested walker.
    fn resolve(&self, value: &dyn Reflect) -> Value {
        let target = match value.shape() {
            Shape::Ptr(Some(inner)) => inner,
            Shape::Ptr(None) => return Value::Null,
            _ => value,
        };

        match target.shape() {
            Shape::Record(record) => {
                if record.visible_fields(&self.config.tag_key) == 0 {
                    trace!(
                        type_name = target.type_desc().name(),
                        "record without visible fields passed through"
                    );
                    return target.to_raw();
                }
                Value::Map(self.convert_record(record, false))
            }
            Shape::Map(map) => {
                if !walks_map_values(map.value_desc()) {
                    return target.to_raw();
                }
                Value::Map(
                    map.entries()
                        .map(|(key, entry)| (key, self.resolve(entry)))
                        .collect(),
                )
            }
            Shape::Seq(seq) => {
                if !seq.elem_desc().is_record_like() {
                    return target.to_raw();
                }
                Value::Seq(seq.iter().map(|item| self.resolve(item)).collect())
            }
            Shape::Ptr(_) | Shape::Leaf => target.to_raw(),
        }
    }
}

/// Map values are walked when they are records, or sequences of records,
/// optionally behind one pointer.
fn walks_map_values(desc: TypeDesc) -> bool {
    let desc = match desc.kind() {
        Kind::Ptr => match desc.elem() {
            Some(inner) => inner,
            None => return false,
        },
        _ => desc,
    };
    match desc.kind() {
        Kind::Record => true,
        Kind::Seq => desc.elem().is_some_and(|elem| elem.kind() == Kind::Record),
        _ => false,
    }
}

fn resolve_ptr2(value: Value, options: &TagOptions<'_>) -> Value {
    if options.ptr2() {
        value.concrete()
    } else {
        value
    }
}

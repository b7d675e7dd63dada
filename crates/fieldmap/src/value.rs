use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::DEFAULT_TAG_KEY;
use crate::reflect::{Reflect, Shape};

/// Output mapping: field name to generic value.
pub type Map = IndexMap<String, Value>;

/// The untyped result unit of a conversion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Seq(Vec<Value>),
    Map(Map),
    /// A value passed through unchanged, still carrying its concrete type.
    Opaque(Opaque),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Uint(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(value) => Some(*value),
            Value::Int(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Value::Opaque(opaque) => Some(opaque),
            _ => None,
        }
    }

    /// Borrow the concrete value behind an [`Value::Opaque`].
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.as_opaque().and_then(Opaque::downcast_ref)
    }

    /// Resolve an opaque pointer analogue to its pointee, or to the pointee's
    /// zero value when absent. Everything else is returned unchanged.
    pub fn concrete(self) -> Value {
        let resolved = match &self {
            Value::Opaque(opaque) => opaque.get().concrete().map(|inner| inner.to_raw()),
            _ => None,
        };
        resolved.unwrap_or(self)
    }
}

macro_rules! impl_from {
    ($variant:ident: $($ty:ty => $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    #[allow(clippy::redundant_closure_call)]
                    Value::$variant(($conv)(value))
                }
            }
        )*
    };
}

impl_from!(Bool: bool => |v| v);
impl_from!(Int: i8 => i64::from, i16 => i64::from, i32 => i64::from, i64 => |v| v);
impl_from!(Uint: u8 => u64::from, u16 => u64::from, u32 => u64::from, u64 => |v| v);
impl_from!(Float: f32 => f64::from, f64 => |v| v);
impl_from!(String: String => |v| v, &str => str::to_string);
impl_from!(Seq: Vec<Value> => |v| v);
impl_from!(Map: Map => |v| v);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().collect())
    }
}

/// An owned, type-erased copy of a value that was passed through unchanged.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Reflect>);

impl Opaque {
    pub fn new<T: Reflect>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub(crate) fn from_boxed(value: Box<dyn Reflect>) -> Self {
        Self(Arc::from(value))
    }

    pub fn get(&self) -> &dyn Reflect {
        &*self.0
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_desc().name()
    }

    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&self.0).finish()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Int(value) => serializer.serialize_i64(*value),
            Value::Uint(value) => serializer.serialize_u64(*value),
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Seq(values) => serializer.collect_seq(values),
            Value::Map(map) => map.serialize(serializer),
            Value::Opaque(opaque) => opaque.serialize(serializer),
        }
    }
}

impl Serialize for Opaque {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Reflected(self.get()).serialize(serializer)
    }
}

/// Serializes an arbitrary reflected value by its shape. Records use their
/// declared field names; tag options are not applied.
struct Reflected<'a>(&'a dyn Reflect);

impl Serialize for Reflected<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.shape() {
            Shape::Record(record) => {
                let fields = record.fields(DEFAULT_TAG_KEY);
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for field in fields {
                    map.serialize_entry(field.name(), &Reflected(field.value()))?;
                }
                map.end()
            }
            Shape::Map(entries) => {
                serializer.collect_map(entries.entries().map(|(key, value)| (key, Reflected(value))))
            }
            Shape::Seq(items) => serializer.collect_seq(items.iter().map(Reflected)),
            Shape::Ptr(Some(inner)) => Reflected(inner).serialize(serializer),
            Shape::Ptr(None) => serializer.serialize_none(),
            Shape::Leaf => match self.0.to_raw() {
                Value::Opaque(_) => match self.0.as_display() {
                    Some(display) => serializer.collect_str(display),
                    None => serializer.collect_str(&format_args!("{:?}", self.0)),
                },
                raw => raw.serialize(serializer),
            },
        }
    }
}

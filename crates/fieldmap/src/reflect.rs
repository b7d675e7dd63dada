//! Reflection model the conversion engine walks.
//!
//! Rust has no runtime reflection, so every convertible type carries two views
//! of itself: a static [`TypeDesc`] (via [`Typed`]) that answers "what kind of
//! values does this collection hold", and an object-safe [`Reflect`] impl that
//! classifies a concrete value into a [`Shape`]. Structs with named fields get
//! both from `#[derive(Reflect)]`, together with a [`Record`] impl that acts as
//! the field enumerator.

use std::any::Any;
use std::fmt;
use std::ops::Deref;

use crate::value::{Opaque, Value};

/// Coarse type classification used by the nested walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Numbers, booleans, text.
    Primitive,
    /// A struct with named fields.
    Record,
    /// An associative collection with text-convertible keys.
    Map,
    /// An ordered collection.
    Seq,
    /// One level of indirection: `Option`, `Box`, `Arc`.
    Ptr,
    /// A dynamically typed slot (`Box<dyn Reflect>`, `Value`).
    Interface,
    /// Anything else: passed through untouched.
    Opaque,
}

/// Static description of a type, available without a value in hand.
#[derive(Clone, Copy)]
pub struct TypeDesc {
    name: &'static str,
    kind: Kind,
    elem: Option<fn() -> TypeDesc>,
}

impl TypeDesc {
    pub fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            elem: None,
        }
    }

    /// A descriptor for a container whose element (or pointee, or map value)
    /// type is described by `elem`.
    pub fn with_elem(name: &'static str, kind: Kind, elem: fn() -> TypeDesc) -> Self {
        Self {
            name,
            kind,
            elem: Some(elem),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn elem(&self) -> Option<TypeDesc> {
        self.elem.map(|elem| elem())
    }

    /// `true` for a record, or a pointer directly around one.
    pub fn is_record_like(&self) -> bool {
        match self.kind {
            Kind::Record => true,
            Kind::Ptr => self.elem().is_some_and(|inner| inner.kind == Kind::Record),
            _ => false,
        }
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("TypeDesc");
        out.field("name", &self.name).field("kind", &self.kind);
        if let Some(elem) = self.elem() {
            out.field("elem", &elem);
        }
        out.finish()
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

/// Static side of reflection.
pub trait Typed: Sized {
    fn type_desc() -> TypeDesc;

    /// The zero value of the type, if it has a natural one. Used by the `ptr2`
    /// tag option to materialize the pointee of an absent pointer.
    fn zero() -> Option<Self> {
        None
    }
}

/// Runtime classification of a value.
pub enum Shape<'a> {
    Leaf,
    Record(&'a dyn Record),
    Map(&'a dyn MapReflect),
    Seq(&'a dyn SeqReflect),
    /// A pointer analogue; `None` when absent.
    Ptr(Option<&'a dyn Reflect>),
}

impl fmt::Debug for Shape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Leaf => f.write_str("Leaf"),
            Shape::Record(_) => f.write_str("Record"),
            Shape::Map(map) => write!(f, "Map(len = {})", map.len()),
            Shape::Seq(seq) => write!(f, "Seq(len = {})", seq.len()),
            Shape::Ptr(inner) => write!(f, "Ptr(present = {})", inner.is_some()),
        }
    }
}

/// Object-safe reflection over a single value.
///
/// Implementors must also be `Clone + PartialEq`; [`AsReflect`] is provided for
/// them automatically.
pub trait Reflect: AsReflect + Any + Send + Sync + fmt::Debug {
    fn type_desc(&self) -> TypeDesc;

    fn shape(&self) -> Shape<'_>;

    /// Whether the value is the zero value of its type (`omitempty`).
    fn is_zero(&self) -> bool;

    /// The value as passed through without conversion.
    fn to_raw(&self) -> Value {
        Value::Opaque(Opaque::from_boxed(self.clone_reflect()))
    }

    /// Stringification capability, used by the `string` tag option.
    fn as_display(&self) -> Option<&dyn fmt::Display> {
        None
    }

    /// Self-describing conversion capability.
    fn as_hooker(&self) -> Option<&dyn Hooker> {
        None
    }

    /// For pointer analogues: the pointee, or the pointee's zero value when the
    /// pointer is absent. `None` for everything else, or when no zero exists.
    fn concrete(&self) -> Option<Concrete<'_>> {
        None
    }
}

/// Type-erasure helpers every [`Reflect`] type gets for free.
pub trait AsReflect {
    fn as_any(&self) -> &dyn Any;
    fn as_reflect(&self) -> &dyn Reflect;
    fn clone_reflect(&self) -> Box<dyn Reflect>;
    fn eq_reflect(&self, other: &dyn Reflect) -> bool;
}

impl<T: Reflect + Clone + PartialEq> AsReflect for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_reflect(&self) -> &dyn Reflect {
        self
    }

    fn clone_reflect(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    fn eq_reflect(&self, other: &dyn Reflect) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

impl PartialEq for dyn Reflect {
    fn eq(&self, other: &Self) -> bool {
        self.eq_reflect(other)
    }
}

// Lets `#[derive(PartialEq)]` compare `Box<dyn Reflect>` fields without moving
// out of the borrowed box.
impl PartialEq<&Self> for Box<dyn Reflect> {
    fn eq(&self, other: &&Self) -> bool {
        (**self).eq_reflect(&***other)
    }
}

impl Clone for Box<dyn Reflect> {
    fn clone(&self) -> Self {
        (**self).clone_reflect()
    }
}

/// A type's own conversion to a generic value. Opt in with
/// `#[reflect(hooker)]`.
pub trait Hooker {
    fn hook(&self) -> Value;
}

/// Result of resolving a pointer analogue.
pub enum Concrete<'a> {
    Borrowed(&'a (dyn Reflect + 'static)),
    Owned(Box<dyn Reflect>),
}

impl Deref for Concrete<'_> {
    type Target = dyn Reflect;

    fn deref(&self) -> &Self::Target {
        match self {
            Concrete::Borrowed(value) => *value,
            Concrete::Owned(value) => &**value,
        }
    }
}

/// Associative collections the walker can descend into.
pub trait MapReflect {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Static description of the collection's value type.
    fn value_desc(&self) -> TypeDesc;

    /// Entries with their keys rendered as text.
    fn entries(&self) -> Box<dyn Iterator<Item = (String, &dyn Reflect)> + '_>;
}

/// Ordered collections the walker can descend into.
pub trait SeqReflect {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn elem_desc(&self) -> TypeDesc;

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>;
}

/// A declared field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    name: &'static str,
    tags: &'static [(&'static str, &'static str)],
}

impl Field {
    pub const fn new(name: &'static str, tags: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, tags }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The annotation string under `key`, empty when absent.
    pub fn tag(&self, key: &str) -> &'static str {
        self.tags
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, annotation)| *annotation)
            .unwrap_or("")
    }
}

/// A field paired with the value it holds in one record instance.
#[derive(Clone, Copy)]
pub struct FieldRef<'a> {
    field: &'static Field,
    value: &'a dyn Reflect,
}

impl<'a> FieldRef<'a> {
    pub fn new(field: &'static Field, value: &'a dyn Reflect) -> Self {
        Self { field, value }
    }

    pub fn field(&self) -> &'static Field {
        self.field
    }

    pub fn name(&self) -> &'static str {
        self.field.name
    }

    pub fn tag(&self, key: &str) -> &'static str {
        self.field.tag(key)
    }

    pub fn value(&self) -> &'a dyn Reflect {
        self.value
    }
}

impl fmt::Debug for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRef")
            .field("field", self.field)
            .field("value", &self.value)
            .finish()
    }
}

/// Field enumeration for structs with named fields.
///
/// Implementations yield only `pub` fields, in declaration order, skip fields
/// annotated `"-"` under `tag_key`, and splice `#[reflect(embed)]` fields'
/// own visible fields in place of the embedded field.
pub trait Record: Reflect {
    fn visit_fields<'a>(&'a self, tag_key: &str, visit: &mut dyn FnMut(FieldRef<'a>));

    fn fields<'a>(&'a self, tag_key: &str) -> Vec<FieldRef<'a>> {
        let mut fields = Vec::new();
        self.visit_fields(tag_key, &mut |field| fields.push(field));
        fields
    }

    fn visible_fields(&self, tag_key: &str) -> usize {
        let mut count = 0;
        self.visit_fields(tag_key, &mut |_| count += 1);
        count
    }
}

/// Whether a field takes part in enumeration under `tag_key`.
pub fn is_visible(field: &Field, tag_key: &str) -> bool {
    field.tag(tag_key) != "-"
}

#[cfg(test)]
mod tests {
    use super::*;

    static TAGGED: Field = Field::new("Name", &[("fieldmap", "name,omitempty"), ("json", "-")]);

    #[test]
    fn test_field_tag_lookup() {
        assert_eq!(TAGGED.tag("fieldmap"), "name,omitempty");
        assert_eq!(TAGGED.tag("json"), "-");
        assert_eq!(TAGGED.tag("yaml"), "");
    }

    #[test]
    fn test_dash_hides_field_per_key() {
        assert!(is_visible(&TAGGED, "fieldmap"));
        assert!(!is_visible(&TAGGED, "json"));
        assert!(is_visible(&TAGGED, "yaml"));
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Slot {
        value: Box<dyn Reflect>,
    }

    #[test]
    fn test_boxed_dyn_fields_compare_by_value() {
        let first = Slot {
            value: Box::new(String::from("a")),
        };
        assert_eq!(first, first.clone());
        assert_ne!(
            first,
            Slot {
                value: Box::new(String::from("b")),
            }
        );
        assert_ne!(
            first,
            Slot {
                value: Box::new(1u8),
            }
        );
    }

    #[test]
    fn test_record_like_descriptors() {
        let record = || TypeDesc::new("Address", Kind::Record);
        let ptr = TypeDesc::with_elem("Option<Address>", Kind::Ptr, record);
        let nested = TypeDesc::with_elem("Option<Option<Address>>", Kind::Ptr, || {
            TypeDesc::with_elem("Option<Address>", Kind::Ptr, || {
                TypeDesc::new("Address", Kind::Record)
            })
        });

        assert!(record().is_record_like());
        assert!(ptr.is_record_like());
        assert!(!nested.is_record_like());
        assert!(!TypeDesc::new("i32", Kind::Primitive).is_record_like());
    }
}

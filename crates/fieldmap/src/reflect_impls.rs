use std::{
    any::type_name,
    collections::{BTreeMap, HashMap},
    fmt,
    hash::Hash,
    sync::Arc,
};

use indexmap::IndexMap;

use crate::reflect::{
    Concrete, Hooker, Kind, MapReflect, Reflect, SeqReflect, Shape, TypeDesc, Typed,
};
use crate::value::Value;

macro_rules! impl_primitive {
    ($variant:ident, $conv:ty, $zero:expr, [$($ty:ty),* $(,)?]) => {
        $(
            impl Typed for $ty {
                fn type_desc() -> TypeDesc {
                    TypeDesc::new(stringify!($ty), Kind::Primitive)
                }

                fn zero() -> Option<Self> {
                    Some($zero)
                }
            }

            impl Reflect for $ty {
                fn type_desc(&self) -> TypeDesc {
                    <Self as Typed>::type_desc()
                }

                fn shape(&self) -> Shape<'_> {
                    Shape::Leaf
                }

                fn is_zero(&self) -> bool {
                    *self == $zero
                }

                fn to_raw(&self) -> Value {
                    Value::$variant(*self as $conv)
                }

                fn as_display(&self) -> Option<&dyn fmt::Display> {
                    Some(self)
                }
            }
        )*
    };
}

impl_primitive!(Int, i64, 0, [i8, i16, i32, i64, isize]);
impl_primitive!(Uint, u64, 0, [u8, u16, u32, u64, usize]);
impl_primitive!(Float, f64, 0.0, [f32, f64]);

impl Typed for bool {
    fn type_desc() -> TypeDesc {
        TypeDesc::new("bool", Kind::Primitive)
    }

    fn zero() -> Option<Self> {
        Some(false)
    }
}

impl Reflect for bool {
    fn type_desc(&self) -> TypeDesc {
        <Self as Typed>::type_desc()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Leaf
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn to_raw(&self) -> Value {
        Value::Bool(*self)
    }

    fn as_display(&self) -> Option<&dyn fmt::Display> {
        Some(self)
    }
}

impl Typed for char {
    fn type_desc() -> TypeDesc {
        TypeDesc::new("char", Kind::Primitive)
    }

    fn zero() -> Option<Self> {
        Some('\0')
    }
}

impl Reflect for char {
    fn type_desc(&self) -> TypeDesc {
        <Self as Typed>::type_desc()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Leaf
    }

    fn is_zero(&self) -> bool {
        *self == '\0'
    }

    fn to_raw(&self) -> Value {
        Value::String(self.to_string())
    }

    fn as_display(&self) -> Option<&dyn fmt::Display> {
        Some(self)
    }
}

impl Typed for String {
    fn type_desc() -> TypeDesc {
        TypeDesc::new("String", Kind::Primitive)
    }

    fn zero() -> Option<Self> {
        Some(String::new())
    }
}

impl Reflect for String {
    fn type_desc(&self) -> TypeDesc {
        <Self as Typed>::type_desc()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Leaf
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_raw(&self) -> Value {
        Value::String(self.clone())
    }

    fn as_display(&self) -> Option<&dyn fmt::Display> {
        Some(self)
    }
}

impl Typed for &'static str {
    fn type_desc() -> TypeDesc {
        TypeDesc::new("&str", Kind::Primitive)
    }

    fn zero() -> Option<Self> {
        Some("")
    }
}

impl Reflect for &'static str {
    fn type_desc(&self) -> TypeDesc {
        <Self as Typed>::type_desc()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Leaf
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_raw(&self) -> Value {
        Value::String((*self).to_string())
    }

    fn as_display(&self) -> Option<&dyn fmt::Display> {
        Some(self)
    }
}

// Pointer analogues. `Option` is the only one that can be absent.

impl<T: Typed> Typed for Option<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::with_elem(type_name::<Self>(), Kind::Ptr, T::type_desc)
    }

    fn zero() -> Option<Self> {
        Some(None)
    }
}

impl<T: Reflect + Typed + Clone + PartialEq> Reflect for Option<T> {
    fn type_desc(&self) -> TypeDesc {
        <Self as Typed>::type_desc()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Ptr(self.as_ref().map(|value| value as &dyn Reflect))
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn to_raw(&self) -> Value {
        match self {
            Some(value) => value.to_raw(),
            None => Value::Null,
        }
    }

    fn as_display(&self) -> Option<&dyn fmt::Display> {
        self.as_ref().and_then(Reflect::as_display)
    }

    fn as_hooker(&self) -> Option<&dyn Hooker> {
        self.as_ref().and_then(Reflect::as_hooker)
    }

    fn concrete(&self) -> Option<Concrete<'_>> {
        match self {
            Some(value) => Some(Concrete::Borrowed(value)),
            None => T::zero().map(|zero| Concrete::Owned(Box::new(zero))),
        }
    }
}

macro_rules! impl_smart_pointer {
    ($($ptr:ident),*) => {
        $(
            impl<T: Typed> Typed for $ptr<T> {
                fn type_desc() -> TypeDesc {
                    TypeDesc::with_elem(type_name::<Self>(), Kind::Ptr, T::type_desc)
                }

                fn zero() -> Option<Self> {
                    T::zero().map($ptr::new)
                }
            }

            impl<T: Reflect + Typed + Clone + PartialEq> Reflect for $ptr<T> {
                fn type_desc(&self) -> TypeDesc {
                    <Self as Typed>::type_desc()
                }

                fn shape(&self) -> Shape<'_> {
                    Shape::Ptr(Some(&**self))
                }

                fn is_zero(&self) -> bool {
                    false
                }

                fn to_raw(&self) -> Value {
                    (**self).to_raw()
                }

                fn as_display(&self) -> Option<&dyn fmt::Display> {
                    (**self).as_display()
                }

                fn as_hooker(&self) -> Option<&dyn Hooker> {
                    (**self).as_hooker()
                }

                fn concrete(&self) -> Option<Concrete<'_>> {
                    Some(Concrete::Borrowed(&**self))
                }
            }
        )*
    };
}

impl_smart_pointer!(Box, Arc);

// Interface slots: classification follows the dynamic value.

impl Typed for Box<dyn Reflect> {
    fn type_desc() -> TypeDesc {
        TypeDesc::new("Box<dyn Reflect>", Kind::Interface)
    }
}

impl Reflect for Box<dyn Reflect> {
    fn type_desc(&self) -> TypeDesc {
        <Self as Typed>::type_desc()
    }

    fn shape(&self) -> Shape<'_> {
        (**self).shape()
    }

    fn is_zero(&self) -> bool {
        false
    }

    fn to_raw(&self) -> Value {
        (**self).to_raw()
    }

    fn as_display(&self) -> Option<&dyn fmt::Display> {
        (**self).as_display()
    }

    fn as_hooker(&self) -> Option<&dyn Hooker> {
        (**self).as_hooker()
    }

    fn concrete(&self) -> Option<Concrete<'_>> {
        (**self).concrete()
    }
}

impl Typed for Value {
    fn type_desc() -> TypeDesc {
        TypeDesc::new("Value", Kind::Interface)
    }

    fn zero() -> Option<Self> {
        Some(Value::Null)
    }
}

impl Reflect for Value {
    fn type_desc(&self) -> TypeDesc {
        <Self as Typed>::type_desc()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Leaf
    }

    fn is_zero(&self) -> bool {
        self.is_null()
    }

    fn to_raw(&self) -> Value {
        self.clone()
    }
}

// Sequences.

impl<T: Typed> Typed for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::with_elem(type_name::<Self>(), Kind::Seq, T::type_desc)
    }

    fn zero() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<T: Reflect + Typed + Clone + PartialEq> Reflect for Vec<T> {
    fn type_desc(&self) -> TypeDesc {
        <Self as Typed>::type_desc()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Seq(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Reflect + Typed> SeqReflect for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn elem_desc(&self) -> TypeDesc {
        <T as Typed>::type_desc()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.as_slice().iter().map(|item| item as &dyn Reflect))
    }
}

impl<T: Typed, const N: usize> Typed for [T; N] {
    fn type_desc() -> TypeDesc {
        TypeDesc::with_elem(type_name::<Self>(), Kind::Seq, T::type_desc)
    }
}

impl<T: Reflect + Typed + Clone + PartialEq, const N: usize> Reflect for [T; N] {
    fn type_desc(&self) -> TypeDesc {
        <Self as Typed>::type_desc()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Seq(self)
    }

    fn is_zero(&self) -> bool {
        self.as_slice().iter().all(|item| item.is_zero())
    }
}

impl<T: Reflect + Typed, const N: usize> SeqReflect for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn elem_desc(&self) -> TypeDesc {
        <T as Typed>::type_desc()
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.as_slice().iter().map(|item| item as &dyn Reflect))
    }
}

// Associative collections. Keys are rendered with `Display`.

/// Bounds for keys of reflected maps.
pub trait MapKey: fmt::Display + fmt::Debug + Clone + Send + Sync + 'static {}

impl<K: fmt::Display + fmt::Debug + Clone + Send + Sync + 'static> MapKey for K {}

macro_rules! impl_map {
    ($map:ident, $($bound:tt)+) => {
        impl<K: MapKey + $($bound)+, V: Typed> Typed for $map<K, V> {
            fn type_desc() -> TypeDesc {
                TypeDesc::with_elem(type_name::<Self>(), Kind::Map, V::type_desc)
            }

            fn zero() -> Option<Self> {
                Some($map::new())
            }
        }

        impl<K, V> Reflect for $map<K, V>
        where
            K: MapKey + $($bound)+,
            V: Reflect + Typed + Clone + PartialEq,
        {
            fn type_desc(&self) -> TypeDesc {
                <Self as Typed>::type_desc()
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Map(self)
            }

            fn is_zero(&self) -> bool {
                self.is_empty()
            }
        }

        impl<K, V> MapReflect for $map<K, V>
        where
            K: MapKey + $($bound)+,
            V: Reflect + Typed,
        {
            fn len(&self) -> usize {
                $map::len(self)
            }

            fn value_desc(&self) -> TypeDesc {
                <V as Typed>::type_desc()
            }

            fn entries(&self) -> Box<dyn Iterator<Item = (String, &dyn Reflect)> + '_> {
                Box::new(
                    self.iter()
                        .map(|(key, value)| (key.to_string(), value as &dyn Reflect)),
                )
            }
        }
    };
}

impl_map!(HashMap, Eq + Hash);
impl_map!(BTreeMap, Ord);
impl_map!(IndexMap, Eq + Hash);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::AsReflect;

    #[test]
    fn test_primitive_raw_values() {
        assert_eq!(42i32.to_raw(), Value::Int(42));
        assert_eq!((-7i16).to_raw(), Value::Int(-7));
        assert_eq!(7usize.to_raw(), Value::Uint(7));
        assert_eq!(2.5f32.to_raw(), Value::Float(2.5));
        assert_eq!(true.to_raw(), Value::Bool(true));
        assert_eq!('x'.to_raw(), Value::String("x".into()));
        assert_eq!("hello".to_raw(), Value::String("hello".into()));
        assert_eq!("owned".to_string().to_raw(), Value::String("owned".into()));
    }

    #[test]
    fn test_zero_values_per_kind() {
        assert!(0u8.is_zero());
        assert!(!1u8.is_zero());
        assert!(0.0f64.is_zero());
        assert!(false.is_zero());
        assert!(String::new().is_zero());
        assert!(None::<i32>.is_zero());
        assert!(!Some(0i32).is_zero());
        assert!(Vec::<i32>::new().is_zero());
        assert!(HashMap::<String, i32>::new().is_zero());
        assert!([0u8; 4].is_zero());
        assert!(![0u8, 1].is_zero());
        assert!(!Box::new(0i32).is_zero());
    }

    #[test]
    fn test_pointer_shapes() {
        let present = Some(3i32);
        assert!(matches!(present.shape(), Shape::Ptr(Some(_))));
        assert!(matches!(None::<i32>.shape(), Shape::Ptr(None)));
        assert!(matches!(Arc::new(1u8).shape(), Shape::Ptr(Some(_))));
        assert_eq!(present.to_raw(), Value::Int(3));
        assert_eq!(None::<i32>.to_raw(), Value::Null);
    }

    #[test]
    fn test_concrete_pointee_or_zero() {
        let present = Some("x".to_string());
        let resolved = present.concrete().expect("present pointer resolves");
        assert_eq!(resolved.to_raw(), Value::String("x".into()));

        let absent: Option<u32> = None;
        let resolved = absent.concrete().expect("u32 has a zero value");
        assert_eq!(resolved.to_raw(), Value::Uint(0));

        assert!(5i32.concrete().is_none());
    }

    #[test]
    fn test_type_descriptors() {
        let desc = <Vec<Option<String>> as Typed>::type_desc();
        assert_eq!(desc.kind(), Kind::Seq);
        let elem = desc.elem().expect("vec has an element type");
        assert_eq!(elem.kind(), Kind::Ptr);
        assert_eq!(elem.elem().map(|inner| inner.kind()), Some(Kind::Primitive));

        let map = <BTreeMap<u32, Vec<i32>> as Typed>::type_desc();
        assert_eq!(map.kind(), Kind::Map);
        assert_eq!(map.elem().map(|value| value.kind()), Some(Kind::Seq));

        assert_eq!(<Box<dyn Reflect> as Typed>::type_desc().kind(), Kind::Interface);
    }

    #[test]
    fn test_map_entries_stringify_keys() {
        let mut map = BTreeMap::new();
        map.insert(2u32, "b".to_string());
        map.insert(1u32, "a".to_string());

        let Shape::Map(view) = map.shape() else {
            panic!("expected a map shape");
        };
        let entries: Vec<_> = view
            .entries()
            .map(|(key, value)| (key, value.to_raw()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("1".to_string(), Value::String("a".into())),
                ("2".to_string(), Value::String("b".into())),
            ]
        );
    }

    #[test]
    fn test_boxed_dyn_follows_dynamic_value() {
        let boxed: Box<dyn Reflect> = Box::new(vec![1i32, 2]);
        assert!(matches!(boxed.shape(), Shape::Seq(_)));
        assert_eq!(boxed.clone(), boxed);
        assert!(boxed.eq_reflect(&boxed.clone()));
        assert!(!boxed.is_zero());
    }
}

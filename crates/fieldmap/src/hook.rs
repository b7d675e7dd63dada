use std::fmt;
use std::marker::PhantomData;

use crate::reflect::Reflect;
use crate::value::Value;

/// A value transform tried on every field before the default handling.
///
/// Returning `None` declines, letting the next hook run.
pub trait Hook: Send + Sync {
    fn try_convert(&self, value: &dyn Reflect) -> Option<Value>;
}

impl<F> Hook for F
where
    F: Fn(&dyn Reflect) -> Option<Value> + Send + Sync,
{
    fn try_convert(&self, value: &dyn Reflect) -> Option<Value> {
        self(value)
    }
}

/// A hook that fires for every value of concrete type `T` and declines
/// everything else.
///
/// ```
/// use fieldmap::{Value, hook_for};
///
/// let hook = hook_for(|cents: &u64| Value::from(format!("${}.{:02}", cents / 100, cents % 100)));
/// # let _ = hook;
/// ```
pub fn hook_for<T, F>(convert: F) -> TypedHook<T, F>
where
    T: Reflect,
    F: Fn(&T) -> Value + Send + Sync,
{
    TypedHook {
        convert,
        _marker: PhantomData,
    }
}

pub struct TypedHook<T, F> {
    convert: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> Hook for TypedHook<T, F>
where
    T: Reflect,
    F: Fn(&T) -> Value + Send + Sync,
{
    fn try_convert(&self, value: &dyn Reflect) -> Option<Value> {
        value.as_any().downcast_ref::<T>().map(&self.convert)
    }
}

impl<T, F> fmt::Debug for TypedHook<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedHook")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

/// Ordered hook registry. The first hook that returns a value wins.
#[derive(Default)]
pub struct Hooks(Vec<Box<dyn Hook>>);

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hook: impl Hook + 'static) {
        self.0.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn try_convert(&self, value: &dyn Reflect) -> Option<Value> {
        self.0.iter().find_map(|hook| hook.try_convert(value))
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").field("len", &self.0.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_hook_matches_exact_type() {
        let hook = hook_for(|value: &i32| Value::from(value * 2));
        assert_eq!(hook.try_convert(&21i32), Some(Value::Int(42)));
        assert_eq!(hook.try_convert(&21i64), None);
        assert_eq!(hook.try_convert(&Some(21i32)), None);
    }

    #[test]
    fn test_registry_first_success_wins() {
        let mut hooks = Hooks::new();
        hooks.push(|_: &dyn Reflect| -> Option<Value> { None });
        hooks.push(hook_for(|_: &String| Value::from("second")));
        hooks.push(hook_for(|_: &String| Value::from("third")));

        assert_eq!(hooks.len(), 3);
        assert_eq!(
            hooks.try_convert(&"x".to_string()),
            Some(Value::from("second"))
        );
        assert_eq!(hooks.try_convert(&1u8), None);
    }

    #[test]
    fn test_empty_registry_declines() {
        let hooks = Hooks::default();
        assert!(hooks.is_empty());
        assert_eq!(hooks.try_convert(&true), None);
    }
}

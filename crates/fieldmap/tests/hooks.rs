use std::thread;

use fieldmap::{Converter, Hooker, Map, Opaque, Reflect, Value, hook_for};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq, Reflect)]
#[reflect(hooker)]
struct Money {
    pub cents: u64,
}

impl Hooker for Money {
    fn hook(&self) -> Value {
        Value::from(format!("${}.{:02}", self.cents / 100, self.cents % 100))
    }
}

#[derive(Debug, Clone, PartialEq, Reflect)]
struct Location {
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Reflect)]
struct Invoice {
    pub id: u32,
    pub total: Money,
    pub refund: Option<Money>,
    pub ship_to: Location,
    #[tag(fieldmap = ",string")]
    pub lines: u16,
}

fn invoice() -> Invoice {
    Invoice {
        id: 17,
        total: Money { cents: 1250 },
        refund: None,
        ship_to: Location {
            city: "Oslo".into(),
        },
        lines: 3,
    }
}

#[test_log::test]
fn test_hooker_replaces_default_handling() {
    let mut with_refund = invoice();
    with_refund.refund = Some(Money { cents: 5 });

    let converted = Converter::new().convert(&with_refund).expect("record");

    assert_eq!(converted["total"], Value::from("$12.50"));
    assert_eq!(converted["refund"], Value::from("$0.05"));

    let converted = Converter::new().convert(&invoice()).expect("record");
    assert_eq!(converted["refund"], Value::Null);
}

#[test_log::test]
fn test_hook_beats_hooker_and_recursion() {
    let converter = Converter::new()
        .with_hook(hook_for(|money: &Money| Value::Uint(money.cents)))
        .with_hook(hook_for(|location: &Location| {
            Value::from(location.city.to_uppercase())
        }));

    let converted = converter.convert(&invoice()).expect("record");

    assert_eq!(converted["total"], Value::Uint(1250));
    assert_eq!(converted["ship_to"], Value::from("OSLO"));
    assert_eq!(converted["id"], Value::Uint(17));
}

#[test]
fn test_string_option_bypasses_hooks() {
    let converter = Converter::new().with_hook(hook_for(|_: &u16| Value::from("hooked")));

    let converted = converter.convert(&invoice()).expect("record");

    assert_eq!(converted["lines"], Value::from("3"));
}

#[test]
fn test_hooks_run_in_registration_order() {
    let mut converter = Converter::new();
    converter
        .register_hook(|_: &dyn Reflect| -> Option<Value> { None })
        .register_hook(hook_for(|_: &u32| Value::from("first")))
        .register_hook(hook_for(|_: &u32| Value::from("second")));

    let converted = converter.convert(&invoice()).expect("record");

    assert_eq!(converted["id"], Value::from("first"));
}

#[test]
fn test_declining_hooks_fall_through() {
    let converter = Converter::new().with_hook(|value: &dyn Reflect| {
        value
            .as_any()
            .downcast_ref::<u32>()
            .filter(|id| **id > 100)
            .map(|_| Value::from("large"))
    });

    let converted = converter.convert(&invoice()).expect("record");

    assert_eq!(converted["id"], Value::Uint(17));
    assert_eq!(converted["total"], Value::from("$12.50"));
}

#[test]
fn test_hooks_apply_inside_nested_records() {
    let converter = Converter::new().with_hook(hook_for(|city: &String| {
        Value::from(format!("city:{city}"))
    }));

    let converted = converter.convert(&invoice()).expect("record");
    let expected: Map = [("city".to_string(), Value::from("city:Oslo"))]
        .into_iter()
        .collect();

    assert_eq!(converted["ship_to"], Value::Map(expected));
}

#[derive(Debug, Clone, PartialEq, Reflect)]
struct Nickname {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Reflect)]
struct Profile {
    #[tag(fieldmap = "nick,ptr2")]
    pub nickname: Nickname,
    pub alias: Nickname,
}

#[test]
fn test_ptr2_resolves_hook_output() {
    let converter = Converter::new().with_hook(hook_for(|nickname: &Nickname| {
        let value = (!nickname.value.is_empty()).then(|| nickname.value.clone());
        Value::Opaque(Opaque::new(value))
    }));

    let profile = Profile {
        nickname: Nickname {
            value: String::new(),
        },
        alias: Nickname {
            value: "ace".into(),
        },
    };
    let converted = converter.convert(&profile).expect("record");

    assert_eq!(converted["nick"], Value::from(""));
    assert_eq!(
        converted["alias"].downcast_ref::<Option<String>>(),
        Some(&Some("ace".to_string()))
    );
}

#[test]
fn test_converter_is_shared_across_threads() {
    let converter = Converter::new().with_hook(hook_for(|money: &Money| Value::Uint(money.cents)));
    let expected = converter.convert(&invoice());

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| converter.convert(&invoice())))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("thread panicked"), expected);
        }
    });
}

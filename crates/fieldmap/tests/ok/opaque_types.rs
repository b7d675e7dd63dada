use std::fmt;

use fieldmap::{Reflect, Value};

#[derive(Debug, Clone, PartialEq, Default, Reflect)]
#[reflect(display, default)]
enum Level {
    #[default]
    Info,
    Warn,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => f.write_str("info"),
            Level::Warn => f.write_str("warn"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Reflect)]
#[reflect(is_zero = "Millis::is_unset")]
struct Millis(u64);

impl Millis {
    fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, PartialEq, Reflect)]
struct Event {
    #[tag(fieldmap = ",string")]
    pub level: Level,
    #[tag(fieldmap = ",omitempty")]
    pub elapsed: Millis,
    #[tag(fieldmap = ",omitempty")]
    pub fallback: Level,
}

fn main() {
    let event = Event {
        level: Level::Warn,
        elapsed: Millis(0),
        fallback: Level::Info,
    };
    let map = fieldmap::to_map(&event).expect("record");
    assert_eq!(map.get("level"), Some(&Value::from("warn")));
    assert!(!map.contains_key("elapsed"));
    assert!(!map.contains_key("fallback"));
}

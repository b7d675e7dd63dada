use fieldmap::{Converter, Reflect, Value};

#[derive(Debug, Clone, PartialEq, Reflect)]
struct Envelope<T> {
    #[tag(fieldmap = "body,omitempty")]
    pub body: T,
    pub headers: Vec<String>,
}

fn main() {
    let envelope = Envelope {
        body: 5u8,
        headers: Vec::new(),
    };
    let map = Converter::new().convert(&envelope).expect("record");
    assert_eq!(map.get("body"), Some(&Value::Uint(5)));
}

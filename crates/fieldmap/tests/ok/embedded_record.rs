use fieldmap::{Converter, Reflect};

#[derive(Debug, Clone, PartialEq, Reflect)]
struct Audit {
    #[tag(fieldmap = "created_by", json = "createdBy")]
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Reflect)]
struct Document {
    #[reflect(embed)]
    pub audit: Audit,
    #[tag(fieldmap = "-")]
    pub cache: Vec<u8>,
    pub r#type: String,
    revision: u32,
}

impl Document {
    fn revision(&self) -> u32 {
        self.revision
    }
}

fn main() {
    let document = Document {
        audit: Audit {
            created_by: "ann".into(),
        },
        cache: vec![1, 2],
        r#type: "memo".into(),
        revision: 3,
    };
    assert_eq!(document.revision(), 3);

    let map = Converter::new().convert(&document).expect("record");
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, ["created_by", "type"]);

    let json = Converter::new().with_tag_key("json").convert(&document).expect("record");
    assert!(json.contains_key("createdBy"));
    assert!(json.contains_key("cache"));
}

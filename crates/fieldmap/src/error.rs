pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error(
        "cannot convert `{type_name}` to a map: expected a struct with named fields deriving `Reflect`, or a pointer to one"
    )]
    NotARecord { type_name: &'static str },
}

impl ConvertError {
    pub(crate) fn not_a_record(value: &dyn crate::reflect::Reflect) -> Self {
        ConvertError::NotARecord {
            type_name: crate::reflect::Reflect::type_desc(value).name(),
        }
    }
}

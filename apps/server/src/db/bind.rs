use uuid::Uuid;

/// Bind values for `sqlx` queries, collected in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Bool(bool),
    Uuid(Uuid),
    Int(i64),
}

/// Push a value and return its 1-based placeholder index.
pub(crate) fn push_bind(bind_params: &mut Vec<BindValue>, value: BindValue) -> usize {
    bind_params.push(value);
    bind_params.len()
}

use thiserror::Error;

/// Structural errors from hierarchy construction.
///
/// These abort the single analysis request and never touch cache or store
/// state. Everything recoverable (duplicate elements, orphaned H3 headings)
/// is tagged on the nodes instead and graded by the checklist later.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("element list is empty")]
    EmptyInput,

    #[error("unrecognized element kind {kind:?} at order {order}")]
    UnknownKind { kind: String, order: u32 },
}

pub type HierarchyResult<T> = Result<T, HierarchyError>;

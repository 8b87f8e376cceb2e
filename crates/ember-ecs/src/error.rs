/// Errors returned by the ECS runtime.
///
/// Lookups never fail; misses are reported as `None` or `false`. These are
/// the few operations that can genuinely be refused.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    #[error("system '{name}' failed to initialize: {source}")]
    SystemInit {
        name: String,
        #[source]
        source: InitError,
    },

    #[error("cannot bind stable name '{name}' to {type_name}: name or type already bound")]
    DuplicateTypeName {
        name: String,
        type_name: &'static str,
    },
}

/// Failure reported by [`System::init`](crate::System::init).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InitError(pub String);

impl InitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result type for queries and simulated interactions.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Failures surfaced to the test that issued a query or a simulated interaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The selector is not a single tag, `.class` or `#id` token.
    #[error("Invalid selector {selector:?}: expected a tag name, .className or #id")]
    InvalidSelector { selector: String },

    /// `execute()` (or a derived accessor) resolved to nothing.
    #[error("Query did not match a VNode: {trace}")]
    NodeNotFound { trace: String },

    /// The projector has no render function bound.
    #[error("TestProjector is not initialized")]
    NotInitialized,

    /// A simulated interaction found no callback on the node's properties.
    #[error("No {handler} handler registered on {selector:?}")]
    MissingHandler {
        handler: &'static str,
        selector: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_not_found_message_carries_trace() {
        let err = QueryError::NodeNotFound {
            trace: "[\".missing\"]".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Query did not match a VNode"));
        assert!(msg.contains(".missing"));
    }

    #[test]
    fn missing_handler_names_callback() {
        let err = QueryError::MissingHandler {
            handler: "onclick",
            selector: "button.save".into(),
        };
        assert_eq!(
            err.to_string(),
            "No onclick handler registered on \"button.save\""
        );
    }
}

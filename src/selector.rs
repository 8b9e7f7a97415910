use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::error::{QueryError, Result};
use crate::vnode::VNode;

/// Test applied to each candidate node.
pub type Predicate = Rc<dyn Fn(&VNode) -> bool>;

/// Characters that would make a token a compound or combinator selector.
const UNSUPPORTED_CHARS: &[char] = &['>', '+', '~', ',', '[', ']', ':', '*', '(', ')'];

/// A single tag/class/id token, or an arbitrary predicate.
#[derive(Clone)]
pub enum Selector {
    Token(String),
    Predicate(Predicate),
}

impl Selector {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&VNode) -> bool + 'static,
    {
        Self::Predicate(Rc::new(f))
    }
}

impl From<&str> for Selector {
    fn from(token: &str) -> Self {
        Self::Token(token.to_string())
    }
}

impl From<String> for Selector {
    fn from(token: String) -> Self {
        Self::Token(token)
    }
}

impl From<&String> for Selector {
    fn from(token: &String) -> Self {
        Self::Token(token.clone())
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => f.debug_tuple("Token").field(token).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Turn a selector into a predicate over nodes.
///
/// Predicates pass through unchanged. Tokens must be a bare tag name,
/// `.className` or `#id`; anything else is [`QueryError::InvalidSelector`].
pub fn compile(selector: Selector) -> Result<Predicate> {
    match selector {
        Selector::Predicate(predicate) => Ok(predicate),
        Selector::Token(token) => {
            validate_token(&token)?;
            trace!(token = %token, "compiled selector");
            Ok(Rc::new(move |node: &VNode| matches_token(&token, &node.selector)))
        }
    }
}

fn validate_token(token: &str) -> Result<()> {
    let body = token.strip_prefix(['.', '#']).unwrap_or(token);
    let valid = !body.is_empty()
        && !body.contains(['.', '#'])
        && !body.chars().any(|c| c.is_whitespace() || UNSUPPORTED_CHARS.contains(&c));
    if valid {
        Ok(())
    } else {
        Err(QueryError::InvalidSelector {
            selector: token.to_string(),
        })
    }
}

/// Whether `token` appears as a whole segment of a node selector like `div.a#b`.
///
/// Only the first occurrence of `token` is considered. Tag names must lead
/// the selector; class and id tokens must not. The character after the
/// token has to end the segment.
pub fn matches_token(token: &str, selector: &str) -> bool {
    let Some(index) = selector.find(token) else {
        return false;
    };
    let positioned = if token.starts_with(['.', '#']) {
        index > 0
    } else {
        index == 0
    };
    positioned
        && matches!(
            selector[index + token.len()..].chars().next(),
            None | Some('.') | Some('#')
        )
}

//! Diagnostic record of how a query handle was derived.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::error::Result;
use crate::selector::Selector;
use crate::vnode::VNode;

/// Re-derives a value from the current render output on every call.
pub(crate) type Resolve<T> = Rc<dyn Fn() -> Result<T>>;

/// One chaining step between the rendered root and a query handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceStep {
    Selector(String),
    Predicate,
    Child(usize),
    Result(usize),
}

impl From<&Selector> for TraceStep {
    fn from(selector: &Selector) -> Self {
        match selector {
            Selector::Token(token) => Self::Selector(token.clone()),
            Selector::Predicate(_) => Self::Predicate,
        }
    }
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(token) => f.write_str(token),
            Self::Predicate => f.write_str("<predicate>"),
            Self::Child(index) => write!(f, "child:{index}"),
            Self::Result(index) => write!(f, "result:{index}"),
        }
    }
}

/// The rendered root (re-resolved lazily) followed by an immutable list of steps.
#[derive(Clone)]
pub(crate) struct Trace {
    origin: Resolve<Option<VNode>>,
    steps: Rc<[TraceStep]>,
}

impl Trace {
    pub(crate) fn new(origin: Resolve<Option<VNode>>) -> Self {
        Self {
            origin,
            steps: Rc::from(Vec::new()),
        }
    }

    /// A new trace with `step` appended; `self` is left untouched.
    pub(crate) fn extend(&self, step: TraceStep) -> Self {
        let mut steps = self.steps.to_vec();
        steps.push(step);
        Self {
            origin: Rc::clone(&self.origin),
            steps: steps.into(),
        }
    }

    pub(crate) fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    fn entries(&self) -> Value {
        let origin = match (self.origin)() {
            Ok(Some(node)) => serde_json::to_value(&node).unwrap_or(Value::Null),
            Ok(None) => Value::Null,
            Err(err) => Value::String(err.to_string()),
        };
        let mut entries = vec![origin];
        entries.extend(self.steps.iter().map(|step| Value::String(step.to_string())));
        Value::Array(entries)
    }

    pub(crate) fn render(&self) -> String {
        self.entries().to_string()
    }

    pub(crate) fn render_pretty(&self) -> String {
        let entries = self.entries();
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| entries.to_string())
    }
}

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

use crate::event::{EventKind, SimulatedEvent};

/// The receiver a handler is invoked with.
///
/// Mirrors the `this` a real dispatch would use: the node's `bind` value when
/// one is set, the property bag otherwise.
pub enum InvocationContext<'a> {
    Bound(&'a dyn Any),
    Properties(&'a Properties),
}

impl<'a> InvocationContext<'a> {
    /// The bound context, if it is a `T`.
    pub fn bound<T: Any>(&self) -> Option<&'a T> {
        match self {
            Self::Bound(value) => {
                let value: &'a dyn Any = *value;
                value.downcast_ref::<T>()
            }
            Self::Properties(_) => None,
        }
    }

    pub fn properties(&self) -> Option<&'a Properties> {
        match self {
            Self::Properties(properties) => Some(*properties),
            Self::Bound(_) => None,
        }
    }
}

/// Callback stored on a node, e.g. `onclick`.
pub type Handler = Rc<dyn Fn(&InvocationContext<'_>, &mut SimulatedEvent)>;

/// Property bag of a [`VNode`]: plain attributes, an optional `bind` context
/// and one optional callback per interaction.
#[derive(Clone, Default)]
pub struct Properties {
    pub attributes: BTreeMap<String, Value>,
    pub bind: Option<Rc<dyn Any>>,
    pub onkeydown: Option<Handler>,
    pub onkeyup: Option<Handler>,
    pub onmousedown: Option<Handler>,
    pub onmouseup: Option<Handler>,
    pub onmouseover: Option<Handler>,
    pub onmouseout: Option<Handler>,
    pub onclick: Option<Handler>,
    pub oninput: Option<Handler>,
    pub onchange: Option<Handler>,
    pub onfocus: Option<Handler>,
    pub onblur: Option<Handler>,
    pub onmousewheel: Option<Handler>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the value handlers receive as their invocation context.
    pub fn with_bind<T: Any>(mut self, context: T) -> Self {
        self.bind = Some(Rc::new(context));
        self
    }

    /// Registers the callback for `kind`, replacing any previous one.
    pub fn on<F>(mut self, kind: EventKind, handler: F) -> Self
    where
        F: Fn(&InvocationContext<'_>, &mut SimulatedEvent) + 'static,
    {
        *self.slot_mut(kind) = Some(Rc::new(handler));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn handler(&self, kind: EventKind) -> Option<&Handler> {
        match kind {
            EventKind::KeyDown => self.onkeydown.as_ref(),
            EventKind::KeyUp => self.onkeyup.as_ref(),
            EventKind::MouseDown => self.onmousedown.as_ref(),
            EventKind::MouseUp => self.onmouseup.as_ref(),
            EventKind::MouseOver => self.onmouseover.as_ref(),
            EventKind::MouseOut => self.onmouseout.as_ref(),
            EventKind::Click => self.onclick.as_ref(),
            EventKind::Input => self.oninput.as_ref(),
            EventKind::Change => self.onchange.as_ref(),
            EventKind::Focus => self.onfocus.as_ref(),
            EventKind::Blur => self.onblur.as_ref(),
            EventKind::MouseWheel => self.onmousewheel.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: EventKind) -> &mut Option<Handler> {
        match kind {
            EventKind::KeyDown => &mut self.onkeydown,
            EventKind::KeyUp => &mut self.onkeyup,
            EventKind::MouseDown => &mut self.onmousedown,
            EventKind::MouseUp => &mut self.onmouseup,
            EventKind::MouseOver => &mut self.onmouseover,
            EventKind::MouseOut => &mut self.onmouseout,
            EventKind::Click => &mut self.onclick,
            EventKind::Input => &mut self.oninput,
            EventKind::Change => &mut self.onchange,
            EventKind::Focus => &mut self.onfocus,
            EventKind::Blur => &mut self.onblur,
            EventKind::MouseWheel => &mut self.onmousewheel,
        }
    }

    /// Callback names registered on this bag, in [`EventKind::ALL`] order.
    pub fn handler_names(&self) -> Vec<&'static str> {
        EventKind::ALL
            .iter()
            .filter(|kind| self.handler(**kind).is_some())
            .map(|kind| kind.handler_name())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.bind.is_none() && self.handler_names().is_empty()
    }
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Properties")
            .field("attributes", &self.attributes)
            .field("bind", &self.bind.is_some())
            .field("handlers", &self.handler_names())
            .finish()
    }
}

// Callbacks have no data representation; they show up by name only.
impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let handlers = self.handler_names();
        let len = self.attributes.len() + handlers.len() + usize::from(self.bind.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, value) in &self.attributes {
            map.serialize_entry(key, value)?;
        }
        if self.bind.is_some() {
            map.serialize_entry("bind", "[context]")?;
        }
        for name in handlers {
            map.serialize_entry(name, "[handler]")?;
        }
        map.end()
    }
}

/// Immutable node of a rendered tree.
///
/// An empty `selector` denotes a text node whose content lives in `text`.
/// Element nodes may also carry inline `text`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VNode {
    pub selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<VNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl VNode {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            ..Self::default()
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, content: impl Into<String>) -> Self {
        self.text = Some(content.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<VNode>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn is_text(&self) -> bool {
        self.selector.is_empty()
    }

    pub fn child_nodes(&self) -> &[VNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Text of this node and all descendants in document order, without separators.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &VNode, out: &mut String) {
    if node.is_text() {
        out.push_str(node.text.as_deref().unwrap_or_default());
        return;
    }
    if let Some(text) = &node.text {
        out.push_str(text);
    }
    for child in node.child_nodes() {
        collect_text(child, out);
    }
}

impl fmt::Display for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::serialize::to_compact_text(self))
    }
}

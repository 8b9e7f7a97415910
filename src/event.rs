//! Synthesized events and the fake DOM element they target.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Interactions a [`Simulator`](crate::simulator::Simulator) can fire directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeyDown,
    KeyUp,
    MouseDown,
    MouseUp,
    MouseOver,
    MouseOut,
    Click,
    Input,
    Change,
    Focus,
    Blur,
    MouseWheel,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::MouseDown,
        EventKind::MouseUp,
        EventKind::MouseOver,
        EventKind::MouseOut,
        EventKind::Click,
        EventKind::Input,
        EventKind::Change,
        EventKind::Focus,
        EventKind::Blur,
        EventKind::MouseWheel,
    ];

    /// Name of the property-bag callback this interaction invokes.
    pub fn handler_name(self) -> &'static str {
        match self {
            Self::KeyDown => "onkeydown",
            Self::KeyUp => "onkeyup",
            Self::MouseDown => "onmousedown",
            Self::MouseUp => "onmouseup",
            Self::MouseOver => "onmouseover",
            Self::MouseOut => "onmouseout",
            Self::Click => "onclick",
            Self::Input => "oninput",
            Self::Change => "onchange",
            Self::Focus => "onfocus",
            Self::Blur => "onblur",
            Self::MouseWheel => "onmousewheel",
        }
    }

    /// DOM event type, e.g. `"click"`.
    pub fn event_type(self) -> &'static str {
        &self.handler_name()[2..]
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

#[derive(Debug, Default, Clone)]
struct ElementState {
    value: String,
    attributes: Map<String, Value>,
}

/// Stand-in for the DOM element an event is dispatched on.
///
/// Clones share state, so a handler writing `value` is visible to the test
/// holding the original. Equality is identity.
#[derive(Clone, Default)]
pub struct TargetElement {
    state: Rc<RefCell<ElementState>>,
}

impl TargetElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let target = Self::new();
        target.set_value(value);
        target
    }

    pub fn value(&self) -> String {
        self.state.borrow().value.clone()
    }

    pub fn set_value(&self, value: impl Into<String>) {
        self.state.borrow_mut().value = value.into();
    }

    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.state.borrow().attributes.get(key).cloned()
    }

    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.state
            .borrow_mut()
            .attributes
            .insert(key.into(), value.into());
    }

    pub fn ptr_eq(&self, other: &TargetElement) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl PartialEq for TargetElement {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for TargetElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TargetElement")
            .field("value", &state.value)
            .field("attributes", &state.attributes)
            .finish()
    }
}

/// Optional mouse fields copied onto the event as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseEventParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub which: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_key: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctrl_key: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MouseEventParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, page_x: f64, page_y: f64) -> Self {
        self.page_x = Some(page_x);
        self.page_y = Some(page_y);
        self
    }

    pub fn button(mut self, which: u32) -> Self {
        self.which = Some(which);
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta_key = Some(true);
        self
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl_key = Some(true);
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelDeltas {
    pub delta_x: Option<f64>,
    pub delta_y: Option<f64>,
}

impl WheelDeltas {
    pub fn vertical(delta_y: f64) -> Self {
        Self {
            delta_x: None,
            delta_y: Some(delta_y),
        }
    }
}

/// Key code given either literally or as a character.
///
/// A string contributes the UTF-16 code unit of its first character; the
/// empty string yields 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput(pub u32);

impl KeyInput {
    pub fn code(self) -> u32 {
        self.0
    }
}

impl From<u32> for KeyInput {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

/// Lets untyped integer literals such as `13` be passed directly.
///
/// Key codes are never negative; a negative value is clamped to 0 rather
/// than wrapped.
impl From<i32> for KeyInput {
    fn from(code: i32) -> Self {
        Self(u32::try_from(code).unwrap_or(0))
    }
}

impl From<char> for KeyInput {
    fn from(c: char) -> Self {
        let mut buf = [0u16; 2];
        Self(u32::from(c.encode_utf16(&mut buf)[0]))
    }
}

impl From<&str> for KeyInput {
    fn from(s: &str) -> Self {
        Self(s.encode_utf16().next().map(u32::from).unwrap_or(0))
    }
}

impl From<&String> for KeyInput {
    fn from(s: &String) -> Self {
        Self::from(s.as_str())
    }
}

/// Event object handed to a single callback invocation.
#[derive(Debug, Clone)]
pub struct SimulatedEvent {
    pub kind: EventKind,
    pub target: TargetElement,
    pub current_target: TargetElement,
    pub which: Option<u32>,
    pub key_code: Option<u32>,
    pub page_x: Option<f64>,
    pub page_y: Option<f64>,
    pub meta_key: Option<bool>,
    pub ctrl_key: Option<bool>,
    pub delta_x: Option<f64>,
    pub delta_y: Option<f64>,
    pub extra: Map<String, Value>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl SimulatedEvent {
    pub fn new(kind: EventKind, target: TargetElement) -> Self {
        Self {
            kind,
            current_target: target.clone(),
            target,
            which: None,
            key_code: None,
            page_x: None,
            page_y: None,
            meta_key: None,
            ctrl_key: None,
            delta_x: None,
            delta_y: None,
            extra: Map::new(),
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub(crate) fn key(kind: EventKind, code: u32, target: TargetElement) -> Self {
        let mut event = Self::new(kind, target);
        event.which = Some(code);
        event.key_code = Some(code);
        event
    }

    pub(crate) fn mouse(
        kind: EventKind,
        target: TargetElement,
        parameters: Option<&MouseEventParameters>,
    ) -> Self {
        let mut event = Self::new(kind, target);
        if let Some(params) = parameters {
            event.page_x = params.page_x;
            event.page_y = params.page_y;
            event.which = params.which;
            event.meta_key = params.meta_key;
            event.ctrl_key = params.ctrl_key;
            event.extra = params.extra.clone();
        }
        event
    }

    pub(crate) fn wheel(target: TargetElement, deltas: WheelDeltas) -> Self {
        let mut event = Self::new(EventKind::MouseWheel, target);
        event.delta_x = deltas.delta_x;
        event.delta_y = deltas.delta_y;
        event
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

use tracing::trace;

use crate::error::{QueryError, Result};
use crate::event::{EventKind, KeyInput, MouseEventParameters, SimulatedEvent, TargetElement, WheelDeltas};
use crate::vnode::{Handler, InvocationContext, Properties, VNode};

/// Fires common user interactions at the callbacks of one resolved node.
///
/// Each simple interaction requires its callback to be registered and fails
/// with [`QueryError::MissingHandler`] before building any event otherwise.
/// The event is returned after the callback ran, for assertions such as
/// `default_prevented()`.
///
/// The target of an event is the explicit argument, else the target set on
/// the query handle, else a fresh empty element.
pub struct Simulator {
    selector: String,
    properties: Properties,
    default_target: Option<TargetElement>,
}

impl Simulator {
    pub fn new(node: &VNode, default_target: Option<TargetElement>) -> Self {
        Self {
            selector: node.selector.clone(),
            properties: node.properties.clone().unwrap_or_default(),
            default_target,
        }
    }

    pub fn key_down(&self, key: impl Into<KeyInput>, target: Option<&TargetElement>) -> Result<SimulatedEvent> {
        let code = key.into().code();
        self.fire(EventKind::KeyDown, target, |t| {
            SimulatedEvent::key(EventKind::KeyDown, code, t)
        })
    }

    pub fn key_up(&self, key: impl Into<KeyInput>, target: Option<&TargetElement>) -> Result<SimulatedEvent> {
        let code = key.into().code();
        self.fire(EventKind::KeyUp, target, |t| {
            SimulatedEvent::key(EventKind::KeyUp, code, t)
        })
    }

    pub fn mouse_down(
        &self,
        target: Option<&TargetElement>,
        parameters: Option<&MouseEventParameters>,
    ) -> Result<SimulatedEvent> {
        self.fire_mouse(EventKind::MouseDown, target, parameters)
    }

    pub fn mouse_up(
        &self,
        target: Option<&TargetElement>,
        parameters: Option<&MouseEventParameters>,
    ) -> Result<SimulatedEvent> {
        self.fire_mouse(EventKind::MouseUp, target, parameters)
    }

    pub fn mouse_over(
        &self,
        target: Option<&TargetElement>,
        parameters: Option<&MouseEventParameters>,
    ) -> Result<SimulatedEvent> {
        self.fire_mouse(EventKind::MouseOver, target, parameters)
    }

    pub fn mouse_out(
        &self,
        target: Option<&TargetElement>,
        parameters: Option<&MouseEventParameters>,
    ) -> Result<SimulatedEvent> {
        self.fire_mouse(EventKind::MouseOut, target, parameters)
    }

    pub fn click(
        &self,
        target: Option<&TargetElement>,
        parameters: Option<&MouseEventParameters>,
    ) -> Result<SimulatedEvent> {
        self.fire_mouse(EventKind::Click, target, parameters)
    }

    pub fn input(&self, target: Option<&TargetElement>) -> Result<SimulatedEvent> {
        self.fire_plain(EventKind::Input, target)
    }

    pub fn change(&self, target: Option<&TargetElement>) -> Result<SimulatedEvent> {
        self.fire_plain(EventKind::Change, target)
    }

    pub fn focus(&self, target: Option<&TargetElement>) -> Result<SimulatedEvent> {
        self.fire_plain(EventKind::Focus, target)
    }

    pub fn blur(&self, target: Option<&TargetElement>) -> Result<SimulatedEvent> {
        self.fire_plain(EventKind::Blur, target)
    }

    pub fn mouse_wheel(&self, deltas: WheelDeltas, target: Option<&TargetElement>) -> Result<SimulatedEvent> {
        self.fire(EventKind::MouseWheel, target, |t| SimulatedEvent::wheel(t, deltas))
    }

    /// Types one key into a text field.
    ///
    /// Sets the target's value to `value_before`, fires `onkeydown`; unless
    /// that was prevented, sets `value_after` and fires `oninput`; then fires
    /// `onkeyup`. Every callback is optional here.
    pub fn key_press(
        &self,
        key: impl Into<KeyInput>,
        value_before: &str,
        value_after: &str,
        target: Option<&TargetElement>,
    ) {
        let code = key.into().code();
        let target = self.resolve_target(target);
        target.set_value(value_before);

        let mut key_down = SimulatedEvent::key(EventKind::KeyDown, code, target.clone());
        if let Some(handler) = self.properties.handler(EventKind::KeyDown) {
            self.invoke(handler, &mut key_down);
        }

        if key_down.default_prevented() {
            trace!(selector = %self.selector, code, "keydown prevented, skipping input");
        } else {
            target.set_value(value_after);
            if let Some(handler) = self.properties.handler(EventKind::Input) {
                self.invoke(handler, &mut SimulatedEvent::new(EventKind::Input, target.clone()));
            }
        }

        if let Some(handler) = self.properties.handler(EventKind::KeyUp) {
            self.invoke(handler, &mut SimulatedEvent::key(EventKind::KeyUp, code, target));
        }
    }

    fn fire_plain(&self, kind: EventKind, target: Option<&TargetElement>) -> Result<SimulatedEvent> {
        self.fire(kind, target, |t| SimulatedEvent::new(kind, t))
    }

    fn fire_mouse(
        &self,
        kind: EventKind,
        target: Option<&TargetElement>,
        parameters: Option<&MouseEventParameters>,
    ) -> Result<SimulatedEvent> {
        self.fire(kind, target, |t| SimulatedEvent::mouse(kind, t, parameters))
    }

    fn fire(
        &self,
        kind: EventKind,
        target: Option<&TargetElement>,
        build: impl FnOnce(TargetElement) -> SimulatedEvent,
    ) -> Result<SimulatedEvent> {
        let handler = self
            .properties
            .handler(kind)
            .ok_or_else(|| QueryError::MissingHandler {
                handler: kind.handler_name(),
                selector: self.selector.clone(),
            })?;
        let mut event = build(self.resolve_target(target));
        self.invoke(handler, &mut event);
        Ok(event)
    }

    fn invoke(&self, handler: &Handler, event: &mut SimulatedEvent) {
        trace!(selector = %self.selector, handler = event.kind.handler_name(), "dispatching simulated event");
        let context = match self.properties.bind.as_deref() {
            Some(bound) => InvocationContext::Bound(bound),
            None => InvocationContext::Properties(&self.properties),
        };
        handler(&context, event);
    }

    fn resolve_target(&self, explicit: Option<&TargetElement>) -> TargetElement {
        explicit
            .or(self.default_target.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;

    fn node_with(properties: Properties) -> VNode {
        VNode::new("input").with_properties(properties)
    }

    #[test]
    fn click_invokes_onclick_with_target() {
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let node = node_with(Properties::new().on(EventKind::Click, move |_, e| {
            *sink.borrow_mut() = Some(e.target.clone());
        }));
        let element = TargetElement::new();
        let event = Simulator::new(&node, None).click(Some(&element), None).unwrap();
        assert_eq!(event.kind, EventKind::Click);
        assert_eq!(seen.borrow().as_ref(), Some(&element));
    }

    #[test]
    fn missing_handler_fails() {
        let node = node_with(Properties::new().on(EventKind::Click, |_, _| {}));
        let err = Simulator::new(&node, None).blur(None).unwrap_err();
        assert_eq!(
            err,
            QueryError::MissingHandler {
                handler: "onblur",
                selector: "input".into()
            }
        );
    }

    #[test]
    fn node_without_properties_has_no_handlers() {
        let err = Simulator::new(&VNode::new("div"), None).click(None, None).unwrap_err();
        assert!(matches!(err, QueryError::MissingHandler { handler: "onclick", .. }));
    }

    #[test]
    fn explicit_target_beats_default() {
        let default_target = TargetElement::with_value("default");
        let explicit = TargetElement::with_value("explicit");
        let node = node_with(Properties::new().on(EventKind::Change, |_, _| {}));
        let sim = Simulator::new(&node, Some(default_target.clone()));
        assert_eq!(sim.change(Some(&explicit)).unwrap().target, explicit);
        assert_eq!(sim.change(None).unwrap().target, default_target);
    }

    #[test]
    fn handler_writes_attribute_on_target() {
        let node = node_with(Properties::new().on(EventKind::Change, |_, e| {
            let checked = e.target.value() == "on";
            e.target.set_attribute("checked", checked);
        }));
        let checkbox = TargetElement::with_value("on");
        Simulator::new(&node, None).change(Some(&checkbox)).unwrap();
        assert_eq!(checkbox.attribute("checked"), Some(serde_json::Value::Bool(true)));
    }

    #[test]
    fn fallback_target_is_fresh_and_empty() {
        let node = node_with(Properties::new().on(EventKind::Focus, |_, _| {}));
        let sim = Simulator::new(&node, None);
        let first = sim.focus(None).unwrap();
        let second = sim.focus(None).unwrap();
        assert_eq!(first.target.value(), "");
        assert_ne!(first.target, second.target);
    }

    #[test]
    fn handler_runs_with_properties_as_context() {
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let node = node_with(Properties::new().attr("id", "name").on(EventKind::Input, move |ctx, _| {
            let id = ctx.properties().and_then(|p| p.get("id")).cloned();
            *sink.borrow_mut() = id;
        }));
        Simulator::new(&node, None).input(None).unwrap();
        assert_eq!(seen.borrow().clone(), Some(serde_json::json!("name")));
    }

    #[test]
    fn handler_runs_with_bind_as_context() {
        struct Widget {
            clicks: Cell<u32>,
        }
        let node = node_with(
            Properties::new()
                .with_bind(Widget { clicks: Cell::new(0) })
                .on(EventKind::Click, |ctx, _| {
                    let widget = ctx.bound::<Widget>().unwrap();
                    widget.clicks.set(widget.clicks.get() + 1);
                }),
        );
        let sim = Simulator::new(&node, None);
        sim.click(None, None).unwrap();
        sim.click(None, None).unwrap();
        let widget = sim.properties.bind.as_deref().and_then(|b| b.downcast_ref::<Widget>()).unwrap();
        assert_eq!(widget.clicks.get(), 2);
    }

    #[test]
    fn key_down_accepts_char_codes() {
        let node = node_with(Properties::new().on(EventKind::KeyDown, |_, _| {}));
        let sim = Simulator::new(&node, None);
        assert_eq!(sim.key_down(13, None).unwrap().which, Some(13));
        assert_eq!(sim.key_down("a", None).unwrap().key_code, Some(97));
    }

    #[test]
    fn returned_event_reflects_prevent_default() {
        let node = node_with(Properties::new().on(EventKind::KeyUp, |_, e| e.prevent_default()));
        let event = Simulator::new(&node, None).key_up(27, None).unwrap();
        assert!(event.default_prevented());
    }

    #[test]
    fn mouse_wheel_carries_deltas() {
        let node = node_with(Properties::new().on(EventKind::MouseWheel, |_, _| {}));
        let event = Simulator::new(&node, None)
            .mouse_wheel(WheelDeltas { delta_x: Some(1.5), delta_y: Some(-3.0) }, None)
            .unwrap();
        assert_eq!(event.delta_x, Some(1.5));
        assert_eq!(event.delta_y, Some(-3.0));
    }

    #[test]
    fn key_press_runs_full_sequence() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (down, input, up) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
        let node = node_with(
            Properties::new()
                .on(EventKind::KeyDown, move |_, e| down.borrow_mut().push(format!("down:{}", e.target.value())))
                .on(EventKind::Input, move |_, e| input.borrow_mut().push(format!("input:{}", e.target.value())))
                .on(EventKind::KeyUp, move |_, e| up.borrow_mut().push(format!("up:{}", e.target.value()))),
        );
        let element = TargetElement::new();
        Simulator::new(&node, None).key_press('b', "a", "ab", Some(&element));
        assert_eq!(*log.borrow(), vec!["down:a", "input:ab", "up:ab"]);
        assert_eq!(element.value(), "ab");
    }

    #[test]
    fn prevented_key_down_suppresses_input() {
        let counts = Rc::new([Cell::new(0), Cell::new(0), Cell::new(0)]);
        let (down, input, up) = (Rc::clone(&counts), Rc::clone(&counts), Rc::clone(&counts));
        let node = node_with(
            Properties::new()
                .on(EventKind::KeyDown, move |_, e| {
                    down[0].set(down[0].get() + 1);
                    e.prevent_default();
                })
                .on(EventKind::Input, move |_, _| input[1].set(input[1].get() + 1))
                .on(EventKind::KeyUp, move |_, _| up[2].set(up[2].get() + 1)),
        );
        let element = TargetElement::new();
        Simulator::new(&node, None).key_press(13, "before", "after", Some(&element));
        assert_eq!(counts[0].get(), 1);
        assert_eq!(counts[1].get(), 0);
        assert_eq!(counts[2].get(), 1);
        assert_eq!(element.value(), "before");
    }

    #[test]
    fn key_press_tolerates_missing_handlers() {
        let element = TargetElement::new();
        Simulator::new(&VNode::new("input"), Some(element.clone())).key_press('x', "", "x", None);
        assert_eq!(element.value(), "x");
    }
}

//! Lazy query handles over a render function.
//!
//! A handle stores how to find its node, never the node itself. Every
//! accessor re-runs the whole chain from the render function, so results
//! always reflect the current render output.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{QueryError, Result};
use crate::event::TargetElement;
use crate::selector::{self, Selector};
use crate::simulator::Simulator;
use crate::trace::{Resolve, Trace, TraceStep};
use crate::vnode::{Properties, VNode};
use crate::walk;

/// Handle resolving to at most one node.
pub struct QueryNode {
    resolve: Resolve<Option<VNode>>,
    trace: Trace,
    target: RefCell<Option<TargetElement>>,
}

impl QueryNode {
    pub(crate) fn new(resolve: Resolve<Option<VNode>>, trace: Trace) -> Self {
        Self {
            resolve,
            trace,
            target: RefCell::new(None),
        }
    }

    /// Resolves the node, failing with [`QueryError::NodeNotFound`] when absent.
    pub fn execute(&self) -> Result<VNode> {
        match (self.resolve)()? {
            Some(node) => Ok(node),
            None => {
                debug!(steps = self.trace.steps().len(), "query did not match");
                Err(QueryError::NodeNotFound {
                    trace: self.trace.render_pretty(),
                })
            }
        }
    }

    /// Whether the query currently resolves to a node. Resolution errors count as absent.
    pub fn exists(&self) -> bool {
        match (self.resolve)() {
            Ok(node) => node.is_some(),
            Err(err) => {
                debug!(error = %err, "exists() could not resolve");
                false
            }
        }
    }

    /// First descendant of this query's node that matches `selector`.
    pub fn query(&self, selector: impl Into<Selector>) -> Result<QueryNode> {
        let selector = selector.into();
        let trace = self.trace.extend(TraceStep::from(&selector));
        let predicate = selector::compile(selector)?;
        let parent = Rc::clone(&self.resolve);
        let resolve: Resolve<Option<VNode>> = Rc::new(move || {
            let root = parent()?;
            Ok(walk::find(root.as_ref(), &*predicate).cloned())
        });
        Ok(QueryNode::new(resolve, trace))
    }

    /// All descendants of this query's node that match `selector`.
    pub fn query_all(&self, selector: impl Into<Selector>) -> Result<QueryCollection> {
        let selector = selector.into();
        let trace = self.trace.extend(TraceStep::from(&selector));
        let predicate = selector::compile(selector)?;
        let parent = Rc::clone(&self.resolve);
        let resolve: Resolve<Vec<VNode>> = Rc::new(move || {
            let root = parent()?;
            Ok(walk::find_all(root.as_ref(), &*predicate)
                .into_iter()
                .cloned()
                .collect())
        });
        Ok(QueryCollection::new(resolve, trace))
    }

    /// The child at `index`. Out of range resolves to nothing.
    pub fn get_child(&self, index: usize) -> QueryNode {
        let parent = Rc::clone(&self.resolve);
        let resolve: Resolve<Option<VNode>> = Rc::new(move || {
            Ok(parent()?.and_then(|node| node.children.and_then(|mut children| {
                (index < children.len()).then(|| children.swap_remove(index))
            })))
        });
        QueryNode::new(resolve, self.trace.extend(TraceStep::Child(index)))
    }

    pub fn text_content(&self) -> Result<String> {
        Ok(self.execute()?.text_content())
    }

    pub fn vnode_selector(&self) -> Result<String> {
        Ok(self.execute()?.selector)
    }

    pub fn properties(&self) -> Result<Properties> {
        Ok(self.execute()?.properties.unwrap_or_default())
    }

    pub fn children(&self) -> Result<Vec<VNode>> {
        Ok(self.execute()?.children.unwrap_or_default())
    }

    /// A simulator over the node's current callbacks, targeting the element
    /// set with [`set_target_dom_node`](Self::set_target_dom_node).
    pub fn simulate(&self) -> Result<Simulator> {
        let node = self.execute()?;
        Ok(Simulator::new(&node, self.get_target_dom_node()))
    }

    /// Sets the default event target for this handle only; derived handles do not inherit it.
    pub fn set_target_dom_node(&self, target: impl Into<Option<TargetElement>>) {
        *self.target.borrow_mut() = target.into();
    }

    pub fn get_target_dom_node(&self) -> Option<TargetElement> {
        self.target.borrow().clone()
    }

    /// JSON list of the rendered root followed by each chaining step.
    pub fn debug(&self) -> String {
        self.trace.render()
    }

    pub fn trace_steps(&self) -> Vec<TraceStep> {
        self.trace.steps().to_vec()
    }
}

impl fmt::Debug for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryNode")
            .field("steps", &self.trace.steps())
            .field("target", &self.target.borrow())
            .finish_non_exhaustive()
    }
}

/// Handle resolving to an ordered list of nodes.
pub struct QueryCollection {
    resolve: Resolve<Vec<VNode>>,
    trace: Trace,
}

impl QueryCollection {
    pub(crate) fn new(resolve: Resolve<Vec<VNode>>, trace: Trace) -> Self {
        Self { resolve, trace }
    }

    pub fn execute(&self) -> Result<Vec<VNode>> {
        (self.resolve)()
    }

    /// Number of matches, recomputed on every call.
    pub fn len(&self) -> Result<usize> {
        Ok(self.execute()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Handle on the match at `index`. Out of range resolves to nothing.
    pub fn get_result(&self, index: usize) -> QueryNode {
        let parent = Rc::clone(&self.resolve);
        let resolve: Resolve<Option<VNode>> = Rc::new(move || {
            let mut nodes = parent()?;
            Ok((index < nodes.len()).then(|| nodes.swap_remove(index)))
        });
        QueryNode::new(resolve, self.trace.extend(TraceStep::Result(index)))
    }

    pub fn debug(&self) -> String {
        self.trace.render()
    }
}

impl fmt::Debug for QueryCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCollection")
            .field("steps", &self.trace.steps())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::event::EventKind;

    fn over(tree: VNode) -> QueryNode {
        let tree = Rc::new(tree);
        let origin: Resolve<Option<VNode>> = Rc::new(move || Ok(Some((*tree).clone())));
        QueryNode::new(Rc::clone(&origin), Trace::new(origin))
    }

    fn selectors() -> VNode {
        VNode::new("div").with_children(vec![
            VNode::new("span.classA.classB#id1"),
            VNode::new("span.classA"),
            VNode::new("p.classC#id2"),
        ])
    }

    #[test]
    fn finds_by_class_tag_and_id() {
        let q = over(selectors());
        assert_eq!(q.query(".classC").unwrap().vnode_selector().unwrap(), "p.classC#id2");
        assert_eq!(q.query(".classA").unwrap().vnode_selector().unwrap(), "span.classA.classB#id1");
        assert_eq!(q.query("p").unwrap().vnode_selector().unwrap(), "p.classC#id2");
        assert_eq!(q.query("#id1").unwrap().vnode_selector().unwrap(), "span.classA.classB#id1");
    }

    #[test]
    fn finds_by_predicate() {
        let q = over(selectors());
        let result = q
            .query(Selector::predicate(|n| !n.selector.contains('#')))
            .unwrap();
        assert_eq!(result.vnode_selector().unwrap(), "span.classA");
    }

    #[test]
    fn query_all_and_get_result() {
        let all = over(selectors()).query_all(".classA").unwrap();
        assert_eq!(all.len().unwrap(), 2);
        assert_eq!(all.get_result(0).vnode_selector().unwrap(), "span.classA.classB#id1");
        assert_eq!(all.get_result(1).vnode_selector().unwrap(), "span.classA");
        assert!(!all.get_result(2).exists());
    }

    #[test]
    fn invalid_selector_fails_at_call_site() {
        let q = over(selectors());
        assert!(matches!(q.query("div p"), Err(QueryError::InvalidSelector { .. })));
        assert!(matches!(q.query_all(""), Err(QueryError::InvalidSelector { .. })));
    }

    #[test]
    fn missing_match_reports_trace() {
        let missing = over(selectors()).query(".nonexistent").unwrap();
        assert!(!missing.exists());
        match missing.execute() {
            Err(QueryError::NodeNotFound { trace }) => assert!(trace.contains(".nonexistent")),
            other => panic!("expected NodeNotFound, got {other:?}"),
        }
        assert!(missing.text_content().is_err());
        assert!(missing.simulate().is_err());
    }

    #[test]
    fn get_child_is_zero_based_and_lazy() {
        let q = over(VNode::new("div").with_children(vec![
            VNode::new("span.first"),
            VNode::new("span.second").with_child(VNode::new("p.nested")),
        ]));
        assert_eq!(q.get_child(0).vnode_selector().unwrap(), "span.first");
        assert_eq!(q.get_child(1).query(".nested").unwrap().vnode_selector().unwrap(), "p.nested");
        let out_of_range = q.get_child(5);
        assert!(!out_of_range.exists());
        assert!(out_of_range.debug().contains("child:5"));
    }

    #[test]
    fn get_child_of_missing_node_is_absent() {
        let q = over(selectors()).query(".nope").unwrap().get_child(0);
        assert!(!q.exists());
    }

    #[test]
    fn defaults_for_missing_properties_and_children() {
        let q = over(VNode::new("div"));
        assert!(q.properties().unwrap().is_empty());
        assert!(q.children().unwrap().is_empty());
    }

    #[test]
    fn properties_and_children_when_defined() {
        let q = over(
            VNode::new("div")
                .with_properties(Properties::new().attr("id", "test"))
                .with_children(vec![VNode::new("span"), VNode::new("p")]),
        );
        assert_eq!(q.properties().unwrap().get("id"), Some(&serde_json::json!("test")));
        assert_eq!(q.children().unwrap().len(), 2);
    }

    #[test]
    fn resolves_again_on_every_access() {
        let renders = Rc::new(Cell::new(0));
        let counter = Rc::clone(&renders);
        let origin: Resolve<Option<VNode>> = Rc::new(move || {
            counter.set(counter.get() + 1);
            Ok(Some(VNode::new("div").with_text(format!("render {}", counter.get()))))
        });
        let q = QueryNode::new(Rc::clone(&origin), Trace::new(origin));
        assert_eq!(q.text_content().unwrap(), "render 1");
        assert_eq!(q.text_content().unwrap(), "render 2");
        assert!(q.exists());
        assert_eq!(renders.get(), 3);
    }

    #[test]
    fn target_is_local_to_the_handle() {
        let q = over(VNode::new("div").with_child(VNode::new("input")));
        assert!(q.get_target_dom_node().is_none());
        let element = TargetElement::with_value("fake");
        q.set_target_dom_node(element.clone());
        assert_eq!(q.get_target_dom_node(), Some(element));
        assert!(q.query("input").unwrap().get_target_dom_node().is_none());
        q.set_target_dom_node(None);
        assert!(q.get_target_dom_node().is_none());
    }

    #[test]
    fn simulate_uses_handle_target() {
        let q = over(VNode::new("input").with_properties(Properties::new().on(EventKind::Input, |_, _| {})));
        let element = TargetElement::with_value("Text1");
        q.set_target_dom_node(element.clone());
        let event = q.simulate().unwrap().input(None).unwrap();
        assert_eq!(event.target, element);
        assert_eq!(event.target.value(), "Text1");
    }

    #[test]
    fn debug_lists_steps() {
        let results = over(selectors()).query_all(".classA").unwrap();
        let debug = results.get_result(0).debug();
        assert!(debug.contains(".classA"));
        assert!(debug.contains("result:0"));
        assert_eq!(
            results.get_result(1).trace_steps(),
            vec![TraceStep::Selector(".classA".into()), TraceStep::Result(1)]
        );
    }
}

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{QueryError, Result};
use crate::query::{QueryCollection, QueryNode};
use crate::selector::Selector;
use crate::trace::{Resolve, Trace};
use crate::vnode::VNode;

/// Produces the tree under test. Called afresh on every resolution.
pub type RenderFn = Rc<dyn Fn() -> Option<VNode>>;

type Binding = Rc<RefCell<Option<RenderFn>>>;

/// Entry point binding a render function to the query interface.
///
/// Construction never renders; an unbound projector only fails once a query
/// is actually resolved.
pub struct Projector {
    binding: Binding,
    root: QueryNode,
    start: QueryNode,
}

impl Projector {
    /// An uninitialized projector; call [`initialize`](Self::initialize) before resolving.
    pub fn new() -> Self {
        let binding: Binding = Rc::new(RefCell::new(None));

        let rendered: Resolve<Option<VNode>> = {
            let binding = Rc::clone(&binding);
            Rc::new(move || render(&binding))
        };
        // Lets the first query match the rendered node itself.
        let wrapped: Resolve<Option<VNode>> = {
            let rendered = Rc::clone(&rendered);
            Rc::new(move || {
                let children = rendered()?.into_iter().collect();
                Ok(Some(VNode::default().with_children(children)))
            })
        };

        Self {
            root: QueryNode::new(Rc::clone(&rendered), Trace::new(Rc::clone(&rendered))),
            start: QueryNode::new(wrapped, Trace::new(rendered)),
            binding,
        }
    }

    pub fn with_render<F>(render: F) -> Self
    where
        F: Fn() -> Option<VNode> + 'static,
    {
        let projector = Self::new();
        projector.initialize(render);
        projector
    }

    /// Binds (or rebinds) the render function.
    pub fn initialize<F>(&self, render: F)
    where
        F: Fn() -> Option<VNode> + 'static,
    {
        debug!(rebind = self.is_initialized(), "projector initialized");
        *self.binding.borrow_mut() = Some(Rc::new(render));
    }

    /// Drops the render function; later resolutions fail with [`QueryError::NotInitialized`].
    pub fn uninitialize(&self) {
        debug!("projector uninitialized");
        *self.binding.borrow_mut() = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.binding.borrow().is_some()
    }

    /// Query resolving to the rendered node itself.
    pub fn root(&self) -> &QueryNode {
        &self.root
    }

    /// First node of the rendered tree, the top-level node included, matching `selector`.
    pub fn query(&self, selector: impl Into<Selector>) -> Result<QueryNode> {
        self.start.query(selector)
    }

    pub fn query_all(&self, selector: impl Into<Selector>) -> Result<QueryCollection> {
        self.start.query_all(selector)
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Projector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projector")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

fn render(binding: &RefCell<Option<RenderFn>>) -> Result<Option<VNode>> {
    // Released before calling so the render function may use the projector.
    let render = binding.borrow().clone().ok_or(QueryError::NotInitialized)?;
    trace!("rendering");
    Ok(render())
}

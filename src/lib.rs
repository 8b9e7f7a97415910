//! Query and interaction simulation for testing virtual DOM render output.
//!
//! A [`Projector`] binds a render function. Queries derived from it are lazy:
//! each accessor re-renders and re-walks the tree, so a test always observes
//! the current output.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use vnode_query::{EventKind, Projector, Properties, VNode};
//!
//! let clicks = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&clicks);
//! let projector = Projector::with_render(move || {
//!     let counter = Rc::clone(&counter);
//!     Some(VNode::new("div.app").with_child(
//!         VNode::new("button.save")
//!             .with_text(format!("Saved {}", counter.get()))
//!             .with_properties(Properties::new().on(EventKind::Click, move |_, _| {
//!                 counter.set(counter.get() + 1);
//!             })),
//!     ))
//! });
//!
//! let button = projector.query(".save")?;
//! button.simulate()?.click(None, None)?;
//! assert_eq!(button.text_content()?, "Saved 1");
//! # Ok::<(), vnode_query::QueryError>(())
//! ```

pub mod error;
pub mod event;
pub mod fixture;
pub mod projector;
pub mod query;
pub mod selector;
pub mod serialize;
pub mod simulator;
pub mod trace;
pub mod vnode;
pub mod walk;

pub use error::{QueryError, Result};
pub use event::{EventKind, KeyInput, MouseEventParameters, SimulatedEvent, TargetElement, WheelDeltas};
pub use projector::{Projector, RenderFn};
pub use query::{QueryCollection, QueryNode};
pub use selector::{Predicate, Selector};
pub use simulator::Simulator;
pub use trace::TraceStep;
pub use vnode::{Handler, InvocationContext, Properties, VNode};

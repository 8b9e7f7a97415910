//! Depth-first descendant search.

use crate::vnode::VNode;

/// All descendants of `root` matching `predicate`, in document order.
///
/// `root` itself is never a candidate. A matching node's own descendants are
/// still visited.
pub fn find_all<'a>(root: Option<&'a VNode>, predicate: &dyn Fn(&VNode) -> bool) -> Vec<&'a VNode> {
    let mut results = Vec::new();
    if let Some(root) = root {
        find_all_recursive(root.child_nodes(), predicate, &mut results);
    }
    results
}

fn find_all_recursive<'a>(
    nodes: &'a [VNode],
    predicate: &dyn Fn(&VNode) -> bool,
    results: &mut Vec<&'a VNode>,
) {
    for node in nodes {
        if predicate(node) {
            results.push(node);
        }
        find_all_recursive(node.child_nodes(), predicate, results);
    }
}

/// First descendant of `root` matching `predicate`, in document order.
pub fn find<'a>(root: Option<&'a VNode>, predicate: &dyn Fn(&VNode) -> bool) -> Option<&'a VNode> {
    find_all(root, predicate).into_iter().next()
}

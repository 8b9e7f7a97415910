use serde_json::Value;

use crate::vnode::{Properties, VNode};

/// Render a tree as indented text, one node per line.
///
/// Example output:
/// ```text
/// form#login [action=/session]:
///   label "Name"
///   input.name [type=text] {oninput, onkeydown}
///   p:
///     "Forgot your "
///     a [href=/reset] "password"
///     "?"
/// ```
pub fn to_compact_text(node: &VNode) -> String {
    let mut output = String::new();
    serialize_node(node, 0, &mut output);
    output
}

/// Render several trees, e.g. the results of a `query_all`.
pub fn list_to_compact_text(nodes: &[VNode]) -> String {
    nodes.iter().map(to_compact_text).collect()
}

fn serialize_node(node: &VNode, indent: usize, output: &mut String) {
    let prefix = "  ".repeat(indent);

    if node.is_text() {
        let text = node.text.as_deref().unwrap_or_default();
        output.push_str(&format!("{prefix}{text:?}\n"));
        return;
    }

    output.push_str(&prefix);
    output.push_str(&node.selector);

    if let Some(properties) = &node.properties {
        serialize_properties(properties, output);
    }

    if let Some(text) = &node.text {
        output.push_str(&format!(" {text:?}"));
    }

    let children = node.child_nodes();
    if children.is_empty() {
        output.push('\n');
    } else {
        output.push_str(":\n");
        for child in children {
            serialize_node(child, indent + 1, output);
        }
    }
}

fn serialize_properties(properties: &Properties, output: &mut String) {
    for (key, value) in &properties.attributes {
        match value {
            Value::Bool(true) => output.push_str(&format!(" [{key}]")),
            Value::Bool(false) | Value::Null => {}
            Value::String(s) => output.push_str(&format!(" [{key}={s}]")),
            other => output.push_str(&format!(" [{key}={other}]")),
        }
    }

    let handlers = properties.handler_names();
    if !handlers.is_empty() {
        output.push_str(&format!(" {{{}}}", handlers.join(", ")));
    }
}

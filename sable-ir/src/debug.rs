#![forbid(unsafe_code)]

use std::fmt::Write;

use crate::ir::{Graph, NodeKind};

/// Renders a graph as readable text, one node per line. Used by the CLI
/// and by tests asserting on reconstructed IR shape.
pub fn dump_graph(graph: &Graph) -> String {
    let mut out = String::new();

    let inputs = graph
        .inputs
        .iter()
        .map(|v| format!("%{} : {}", v.0, graph.value(*v).ty))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "graph({inputs}):");

    for node in &graph.nodes {
        let args = node
            .inputs
            .iter()
            .map(|v| format!("%{}", v.0))
            .collect::<Vec<_>>()
            .join(", ");
        let line = match &node.kind {
            NodeKind::Constant(c) => format!("constant {c}"),
            NodeKind::GetAttr(field) => format!("getattr[{field}]({args})"),
            NodeKind::Call(callee) => format!("call {callee}({args})"),
            NodeKind::Fork(callee) => format!("fork {callee}({args})"),
        };
        let _ = writeln!(
            out,
            "  %{} : {} = {line}",
            node.output.0,
            graph.value(node.output).ty
        );
    }

    let rets = graph
        .outputs
        .iter()
        .map(|v| format!("%{}", v.0))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "  return {rets}");

    out
}

#[cfg(test)]
mod tests {
    use sable_ast::span;

    use super::*;
    use crate::ir::{Callee, Constant, Graph, NodeKind, Type};

    #[test]
    fn dump_constant_return() {
        let mut g = Graph::new();
        let s = span(0, 0);
        g.add_input(Type::Tensor, s);
        let c = g.insert_constant(Constant::Int(7), s);
        let v = g.insert_node(
            NodeKind::Call(Callee::Builtin("core::add".to_string())),
            vec![c, c],
            Type::Int,
            s,
        );
        g.outputs.push(v);

        let text = dump_graph(&g);
        assert!(text.contains("graph(%0 : Tensor):"));
        assert!(text.contains("%1 : int = constant 7"));
        assert!(text.contains("call core::add(%1, %1)"));
        assert!(text.contains("return %2"));
    }
}

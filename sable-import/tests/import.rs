//! End-to-end coverage of the two reconstruction drivers.

use sable_compile::CompileError;
use sable_import::{import_libs, import_methods, ImportError};
use sable_ir::{Callee, Constant, Module, NodeKind, QualifiedName, TypeRegistry};

fn fresh_module(registry: &mut TypeRegistry) -> Module {
    let ty = registry
        .create(QualifiedName::from_dotted("__sable__.M").unwrap())
        .unwrap();
    Module { ty }
}

#[test]
fn end_to_end_constant_return() {
    let mut registry = TypeRegistry::new();
    let module = fresh_module(&mut registry);
    let constants = vec![Constant::Tensor {
        shape: vec![2],
        data: vec![1.0, 2.0],
    }];

    let src = "op_version_set = 1\ndef f(self):\n  return CONSTANTS.c0\n";
    import_methods(module, src, &constants, &mut registry, |_| {}).unwrap();

    let unit = &registry.class(module.ty).unit;
    let f = unit.get("f").expect("method f must exist");
    assert_eq!(f.graph.nodes.len(), 1);
    assert_eq!(f.graph.nodes[0].kind, NodeKind::Constant(constants[0].clone()));
    assert_eq!(f.graph.outputs, vec![f.graph.nodes[0].output]);
}

#[test]
fn import_callback_fires_once_per_unique_dependency() {
    let mut registry = TypeRegistry::new();
    let module = fresh_module(&mut registry);

    let src = "op_version_set = 1\n\
               import pkg.sub\n\
               import pkg.sub\n\
               import other\n\
               def f(self):\n  return 1\n";
    let mut seen = Vec::new();
    import_methods(module, src, &[], &mut registry, |name| {
        seen.push(name.to_string());
    })
    .unwrap();

    seen.sort();
    assert_eq!(seen, vec!["other".to_string(), "pkg.sub".to_string()]);
}

#[test]
fn reimporting_a_method_overwrites_it() {
    let mut registry = TypeRegistry::new();
    let module = fresh_module(&mut registry);

    let first = "op_version_set = 1\ndef f(self):\n  return 1\n";
    let second = "op_version_set = 1\ndef f(self):\n  return 2\n";
    import_methods(module, first, &[], &mut registry, |_| {}).unwrap();
    import_methods(module, second, &[], &mut registry, |_| {}).unwrap();

    let unit = &registry.class(module.ty).unit;
    assert_eq!(unit.len(), 1);
    let f = unit.get("f").unwrap();
    assert_eq!(f.graph.nodes[0].kind, NodeKind::Constant(Constant::Int(2)));
}

#[test]
fn method_batch_commits_all_or_nothing() {
    let mut registry = TypeRegistry::new();
    let module = fresh_module(&mut registry);

    let src = "op_version_set = 1\n\
               def good(self):\n  return 1\n\
               def bad(self):\n  return mystery\n";
    let err = import_methods(module, src, &[], &mut registry, |_| {}).unwrap_err();
    assert!(matches!(
        err,
        ImportError::Compile(CompileError::UnresolvedIdentifier { .. })
    ));

    // The compiling half of the batch must not have landed either.
    assert!(registry.class(module.ty).unit.is_empty());
}

#[test]
fn version_gates_builtin_resolution_per_unit() {
    for (version, expected) in [(0, "core::div_trunc"), (1, "core::div"), (3, "core::div")] {
        let mut registry = TypeRegistry::new();
        let module = fresh_module(&mut registry);
        let src = format!(
            "op_version_set = {version}\ndef f(self, x, y):\n  return sable.div(x, y)\n"
        );
        import_methods(module, &src, &[], &mut registry, |_| {}).unwrap();

        let f = registry.class(module.ty).unit.get("f").unwrap();
        assert_eq!(
            f.graph.nodes[0].kind,
            NodeKind::Call(Callee::Builtin(expected.to_string()))
        );
    }
}

#[test]
fn division_operator_respects_the_version_gate() {
    for (version, expected) in [(0, "core::div_trunc"), (1, "core::div")] {
        let mut registry = TypeRegistry::new();
        let module = fresh_module(&mut registry);
        let src =
            format!("op_version_set = {version}\ndef f(self, x, y):\n  return x / y\n");
        import_methods(module, &src, &[], &mut registry, |_| {}).unwrap();

        let f = registry.class(module.ty).unit.get("f").unwrap();
        assert_eq!(
            f.graph.nodes[0].kind,
            NodeKind::Call(Callee::Builtin(expected.to_string()))
        );
    }
}

#[test]
fn libs_register_one_type_per_class_body() {
    let mut registry = TypeRegistry::new();
    let qualifier = QualifiedName::from_dotted("__sable__.lib").unwrap();

    let src = "op_version_set = 1\n\
               class A:\n  def f(self):\n    return 1\n\
               class B:\n  def g(self):\n    return 2\n";
    import_libs(&qualifier, src, &[], &mut registry, |_| {}).unwrap();

    let a = registry
        .get(&QualifiedName::from_dotted("__sable__.lib.A").unwrap())
        .expect("A registered");
    let b = registry
        .get(&QualifiedName::from_dotted("__sable__.lib.B").unwrap())
        .expect("B registered");
    assert_ne!(a, b);
    assert!(registry.class(a).unit.get("f").is_some());
    assert!(registry.class(b).unit.get("g").is_some());
}

#[test]
fn libs_keep_earlier_classes_when_a_later_one_fails() {
    let mut registry = TypeRegistry::new();
    let qualifier = QualifiedName::from_dotted("__sable__.lib").unwrap();

    let src = "op_version_set = 1\n\
               class A:\n  def f(self):\n    return 1\n\
               class B:\n  def g(self):\n    return mystery\n";
    let err = import_libs(&qualifier, src, &[], &mut registry, |_| {}).unwrap_err();
    assert!(matches!(err, ImportError::Compile(_)));

    // No rollback: A stays registered and usable.
    let a = registry
        .get(&QualifiedName::from_dotted("__sable__.lib.A").unwrap())
        .expect("A must survive B's failure");
    assert!(registry.class(a).unit.get("f").is_some());
    // B was registered before its methods failed to compile; its unit
    // simply stays empty. Documented no-rollback behavior.
    let b = registry
        .get(&QualifiedName::from_dotted("__sable__.lib.B").unwrap())
        .unwrap();
    assert!(registry.class(b).unit.is_empty());
}

#[test]
fn libs_reject_duplicate_class_names() {
    let mut registry = TypeRegistry::new();
    let qualifier = QualifiedName::from_dotted("__sable__.lib").unwrap();

    let src = "op_version_set = 1\n\
               class A:\n  def f(self):\n    return 1\n\
               class A:\n  def g(self):\n    return 2\n";
    let err = import_libs(&qualifier, src, &[], &mut registry, |_| {}).unwrap_err();
    assert!(matches!(err, ImportError::Registry(_)));
}

#[test]
fn libs_classes_can_reference_earlier_classes_in_the_same_unit() {
    let mut registry = TypeRegistry::new();
    let qualifier = QualifiedName::from_dotted("__sable__.lib").unwrap();

    let src = "op_version_set = 1\n\
               class A:\n  def f(self):\n    return 1\n\
               class B:\n  def g(self, x):\n    return annotate(__sable__.lib.A, x)\n";
    import_libs(&qualifier, src, &[], &mut registry, |_| {}).unwrap();

    let b = registry
        .get(&QualifiedName::from_dotted("__sable__.lib.B").unwrap())
        .unwrap();
    assert!(registry.class(b).unit.get("g").is_some());
}

#[test]
fn libs_each_class_gets_its_own_import_preamble() {
    let mut registry = TypeRegistry::new();
    let qualifier = QualifiedName::from_dotted("__sable__.lib").unwrap();

    let src = "op_version_set = 1\n\
               import depA\n\
               class A:\n  def f(self):\n    return 1\n\
               import depB\n\
               class B:\n  def g(self):\n    return 2\n";
    let mut seen = Vec::new();
    import_libs(&qualifier, src, &[], &mut registry, |name| {
        seen.push(name.to_string());
    })
    .unwrap();

    assert_eq!(seen, vec!["depA".to_string(), "depB".to_string()]);
}

#[test]
fn constant_table_bounds_are_reported_with_sizes() {
    let mut registry = TypeRegistry::new();
    let module = fresh_module(&mut registry);
    let constants = vec![Constant::Int(7), Constant::Int(8)];

    let src = "op_version_set = 1\ndef f(self):\n  return CONSTANTS.c2\n";
    let err = import_methods(module, src, &constants, &mut registry, |_| {}).unwrap_err();
    let ImportError::Compile(CompileError::ConstantIndexOutOfRange { index, len, .. }) = err
    else {
        panic!("expected out-of-range error, got {err:?}");
    };
    assert_eq!((index, len), (2, 2));
}

#[test]
fn inf_and_nan_resolve_to_float_literals() {
    let mut registry = TypeRegistry::new();
    let module = fresh_module(&mut registry);

    let src = "op_version_set = 4\ndef f(self):\n  return inf\ndef g(self):\n  return nan\n";
    import_methods(module, src, &[], &mut registry, |_| {}).unwrap();

    let unit = &registry.class(module.ty).unit;
    let f = unit.get("f").unwrap();
    assert_eq!(
        f.graph.nodes[0].kind,
        NodeKind::Constant(Constant::Float(f64::INFINITY))
    );
    let g = unit.get("g").unwrap();
    let NodeKind::Constant(Constant::Float(x)) = g.graph.nodes[0].kind else {
        panic!("expected a float constant");
    };
    assert!(x.is_nan());
}

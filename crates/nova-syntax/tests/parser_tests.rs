//! End-to-end parses over small but representative compilation units (§8),
//! plus the angle-bracket merge-rule boundary cases a hand-rolled lexer is
//! most likely to get wrong.

use nova_syntax::{modifier, ExprKind, LiteralKind, Member, Type, TyDeclKind};
use pretty_assertions::assert_eq;

fn parse(src: &str) -> nova_syntax::CompUnit {
    nova_syntax::parse_str(src).expect("expected a successful parse")
}

#[test]
fn package_and_public_class() {
    let unit = parse("package com.example; public class Greeter {}");
    assert_eq!(unit.package.as_ref().unwrap().name, vec!["com", "example"]);
    assert_eq!(unit.types.len(), 1);
    let ty = &unit.types[0];
    assert_eq!(ty.name, "Greeter");
    assert_eq!(ty.kind, TyDeclKind::Class);
    assert!(ty.modifiers.contains(modifier::PUBLIC));
    assert!(ty.members.is_empty());
}

#[test]
fn static_wildcard_import() {
    let unit = parse("import static java.util.Collections.*;\nclass C {}");
    assert_eq!(unit.imports.len(), 1);
    let import = &unit.imports[0];
    assert!(import.is_static);
    assert!(import.is_wildcard);
    assert_eq!(import.name, vec!["java", "util", "Collections"]);
}

#[test]
fn bounded_type_parameter_and_field() {
    let unit = parse("class Box<T extends Comparable<T>> { private T value; }");
    let ty = &unit.types[0];
    assert_eq!(ty.type_params.len(), 1);
    let tp = &ty.type_params[0];
    assert_eq!(tp.name, "T");
    assert_eq!(tp.bounds.len(), 1);
    match &tp.bounds[0] {
        Type::Class(c) => assert_eq!(c.name, "Comparable"),
        other => panic!("expected a class-type bound, got {other:?}"),
    }

    assert_eq!(ty.members.len(), 1);
    match &ty.members[0] {
        Member::Field(f) => {
            assert_eq!(f.name, "value");
            assert!(f.modifiers.contains(modifier::PRIVATE));
        }
        other => panic!("expected a field, got {other:?}"),
    }
}

#[test]
fn constructor_with_throws() {
    let unit = parse(
        "class Conn { public Conn(String host) throws java.io.IOException { this.host = host; } }",
    );
    let ty = &unit.types[0];
    assert_eq!(ty.members.len(), 1);
    match &ty.members[0] {
        Member::Method(m) => {
            assert!(m.is_constructor());
            assert!(m.return_type.is_none());
            assert_eq!(m.formals.len(), 1);
            assert_eq!(m.formals[0].name, "host");
            assert_eq!(m.throws.len(), 1);
            assert_eq!(m.throws[0].name, "IOException");
            assert_eq!(
                m.throws[0].enclosing.as_deref().map(|e| e.name.as_str()),
                Some("io")
            );
        }
        other => panic!("expected a constructor, got {other:?}"),
    }
}

#[test]
fn enum_with_implements_and_anonymous_body() {
    let unit = parse(
        "enum Op implements java.io.Serializable {\n\
           ADD { } ,\n\
           SUB;\n\
           int extra;\n\
         }",
    );
    let ty = &unit.types[0];
    assert_eq!(ty.kind, TyDeclKind::Enum);
    assert_eq!(ty.interfaces.len(), 1);
    assert_eq!(ty.interfaces[0].name, "Serializable");

    let constants: Vec<_> = ty
        .members
        .iter()
        .filter_map(|m| match m {
            Member::Field(f) if f.modifiers.contains(modifier::ACC_ENUM) => Some(f),
            _ => None,
        })
        .collect();
    assert_eq!(constants.len(), 2);
    assert_eq!(constants[0].name, "ADD");
    assert!(constants[0].modifiers.contains(modifier::ENUM_IMPL));
    assert_eq!(constants[1].name, "SUB");
    assert!(!constants[1].modifiers.contains(modifier::ENUM_IMPL));

    let extra_field = ty
        .members
        .iter()
        .find_map(|m| match m {
            Member::Field(f) if f.name == "extra" => Some(f),
            _ => None,
        })
        .expect("expected the trailing `extra` field");
    assert!(!extra_field.modifiers.contains(modifier::ACC_ENUM));
}

#[test]
fn annotation_type_with_default_value() {
    let unit = parse("@interface Config { String name() default \"demo\"; int retries(); }");
    let ty = &unit.types[0];
    assert_eq!(ty.kind, TyDeclKind::Annotation);
    assert_eq!(ty.members.len(), 2);

    match &ty.members[0] {
        Member::Method(m) => {
            assert_eq!(m.name, "name");
            let default = m.default_value.as_ref().expect("expected a default value");
            match default {
                nova_syntax::DefaultValue::Expr(expr) => {
                    assert_eq!(expr.kind, ExprKind::Literal(LiteralKind::String, "\"demo\"".into()));
                }
                other => panic!("expected an expression default, got {other:?}"),
            }
        }
        other => panic!("expected a method, got {other:?}"),
    }

    match &ty.members[1] {
        Member::Method(m) => {
            assert_eq!(m.name, "retries");
            assert!(m.default_value.is_none());
        }
        other => panic!("expected a method, got {other:?}"),
    }
}

#[test]
fn multi_declarator_field_with_dims_and_initializer() {
    let unit = parse("class Matrix { int rows = 1, cols[] = {1, 2}, total; }");
    let ty = &unit.types[0];
    assert_eq!(ty.members.len(), 3);

    let fields: Vec<_> = ty
        .members
        .iter()
        .map(|m| match m {
            Member::Field(f) => f,
            other => panic!("expected all members to be fields, got {other:?}"),
        })
        .collect();

    assert_eq!(fields[0].name, "rows");
    assert!(matches!(fields[0].ty, Type::Primitive(_)));
    assert_eq!(
        fields[0].initializer.as_ref().map(|e| &e.kind),
        Some(&ExprKind::Literal(LiteralKind::Int, "1".into()))
    );

    assert_eq!(fields[1].name, "cols");
    assert!(matches!(fields[1].ty, Type::Array(_)));
    // Array-initializer-shaped initializers are dropped (§4.9).
    assert!(fields[1].initializer.is_none());

    assert_eq!(fields[2].name, "total");
    assert!(fields[2].initializer.is_none());
}

#[test]
fn nested_generics_merge_one_close_angle() {
    let unit = parse("class C { java.util.Map<String, java.util.List<String>> m; }");
    let ty = &unit.types[0];
    let field = match &ty.members[0] {
        Member::Field(f) => f,
        other => panic!("expected a field, got {other:?}"),
    };
    match &field.ty {
        Type::Class(c) => {
            assert_eq!(c.name, "Map");
            assert_eq!(c.type_arguments.len(), 2);
            match &c.type_arguments[1] {
                Type::Class(inner) => assert_eq!(inner.name, "List"),
                other => panic!("expected List, got {other:?}"),
            }
        }
        other => panic!("expected a class type, got {other:?}"),
    }
}

#[test]
fn doubly_nested_generics_merge_triple_close_angle() {
    let unit = parse(
        "class C { java.util.Map<String, java.util.List<java.util.List<String>>> m; }",
    );
    let ty = &unit.types[0];
    assert_eq!(ty.members.len(), 1);
}

#[test]
fn declaration_order_is_not_enforced() {
    // §4.2 / Non-goals: package/import/type declarations are accepted in
    // any order, any number of times.
    let unit = parse("import a.B; class C {} import a.D; package demo;");
    assert_eq!(unit.package.as_ref().unwrap().name, vec!["demo"]);
    assert_eq!(unit.imports.len(), 2);
    assert_eq!(unit.imports[0].name, vec!["a", "B"]);
    assert_eq!(unit.imports[1].name, vec!["a", "D"]);
    assert_eq!(unit.types.len(), 1);
    assert_eq!(unit.types[0].name, "C");
}

#[test]
fn enum_constant_with_non_constant_constructor_arguments() {
    // §4.4: constructor arguments are lexically skipped, not parsed as
    // constant expressions, so arbitrary expressions are accepted.
    let unit = parse(
        "enum Color {\n\
           RED(Math.max(1, 2)),\n\
           BLUE(new Object());\n\
         }",
    );
    let ty = &unit.types[0];
    let constants: Vec<_> = ty
        .members
        .iter()
        .filter_map(|m| match m {
            Member::Field(f) if f.modifiers.contains(modifier::ACC_ENUM) => Some(f),
            _ => None,
        })
        .collect();
    assert_eq!(constants.len(), 2);
    assert_eq!(constants[0].name, "RED");
    assert_eq!(constants[1].name, "BLUE");
}

#[test]
fn varargs_and_receiver_parameter() {
    let unit = parse("class Outer { class Inner { Inner(Outer Outer.this, int... xs) {} } }");
    let outer = &unit.types[0];
    let inner = outer
        .members
        .iter()
        .find_map(|m| match m {
            Member::Type(t) if t.name == "Inner" => Some(t),
            _ => None,
        })
        .expect("expected a nested Inner type");
    let ctor = match &inner.members[0] {
        Member::Method(m) => m,
        other => panic!("expected a constructor, got {other:?}"),
    };
    assert_eq!(ctor.formals.len(), 2);
    assert_eq!(ctor.formals[0].name, "this");
    assert_eq!(ctor.formals[1].name, "xs");
    assert!(ctor.formals[1].modifiers.contains(modifier::VARARGS));
    assert!(matches!(ctor.formals[1].ty, Type::Array(_)));
}

//! Snapshot coverage of the generated C++ text for a small fixed
//! specification. Structural properties are asserted in `scenarios.rs`;
//! these pin the exact emitted shape.

use tracemon_tsl::foundation::Span;
use tracemon_tsl::ir::decl::OutputSink;
use tracemon_tsl::{compile, Context, EventDecl, Field, Spec, TraceDecl, Type, Width};

fn fixture() -> Spec {
    let span = Span::zero(0);
    Spec {
        events: vec![
            EventDecl::new("A", vec![Field::new("x", Type::UInt(Width::W32))], span),
            EventDecl::new("B", vec![], span),
        ],
        traces: vec![TraceDecl::new(
            Type::trace([Type::event("A"), Type::event("B")]),
            [OutputSink::Stdout],
            span,
        )],
        ..Spec::default()
    }
}

#[test]
fn events_header() {
    let mut ctx = Context::new();
    let code = compile(&fixture(), &mut ctx).unwrap();
    let header = &code.file("events.h").unwrap().contents;
    insta::assert_snapshot!("events_header", header);
}

#[test]
fn traces_header() {
    let mut ctx = Context::new();
    let code = compile(&fixture(), &mut ctx).unwrap();
    let header = &code.file("traces.h").unwrap().contents;
    insta::assert_snapshot!("traces_header", header);
}

//! Declarations: events, traces and hypertraces.

use crate::foundation::{Span, Type};
use std::collections::BTreeSet;

use super::expr::Expr;

/// A typed field of an event declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A named, field-typed unit of observation.
///
/// Field order is declaration order and is part of the generated artifact's
/// public surface.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDecl {
    pub name: String,
    pub fields: Vec<Field>,
    pub span: Span,
}

impl EventDecl {
    pub fn new(name: impl Into<String>, fields: Vec<Field>, span: Span) -> Self {
        Self {
            name: name.into(),
            fields,
            span,
        }
    }

    /// The event type this declaration introduces.
    pub fn event_type(&self) -> Type {
        Type::event(self.name.clone())
    }
}

/// Output sink a trace feeds into.
///
/// Recorded when the trace shape is first registered; the code generator
/// uses it to pick the wrapper's base behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputSink {
    /// The trace is printed to standard output by the runtime
    Stdout,
}

/// A trace declaration: an ordered stream whose possible event kinds are a
/// fixed set.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceDecl {
    /// Must be a [`Type::Trace`] shape
    pub ty: Type,
    /// Output sinks this trace feeds into
    pub outputs: BTreeSet<OutputSink>,
    pub span: Span,
}

impl TraceDecl {
    pub fn new(ty: Type, outputs: impl IntoIterator<Item = OutputSink>, span: Span) -> Self {
        Self {
            ty,
            outputs: outputs.into_iter().collect(),
            span,
        }
    }
}

/// A hypertrace declaration: a bounded or unbounded collection of traces.
#[derive(Debug, Clone, PartialEq)]
pub struct HypertraceDecl {
    /// Must be a [`Type::Hypertrace`] shape
    pub ty: Type,
    pub span: Span,
}

impl HypertraceDecl {
    pub fn new(ty: Type, span: Span) -> Self {
        Self { ty, span }
    }
}

/// Root of a parsed specification: the unit the pipeline compiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spec {
    pub events: Vec<EventDecl>,
    pub traces: Vec<TraceDecl>,
    pub hypertraces: Vec<HypertraceDecl>,
    /// Monitor expressions attached to the specification
    pub monitors: Vec<Expr>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Width;

    #[test]
    fn test_event_type() {
        let decl = EventDecl::new(
            "Open",
            vec![Field::new("fd", Type::Int(Width::W32))],
            Span::zero(0),
        );
        assert_eq!(decl.event_type(), Type::event("Open"));
        assert_eq!(decl.fields.len(), 1);
    }

    #[test]
    fn test_trace_decl_collects_sinks() {
        let decl = TraceDecl::new(
            Type::trace([Type::event("A")]),
            [OutputSink::Stdout, OutputSink::Stdout],
            Span::zero(0),
        );
        assert_eq!(decl.outputs.len(), 1);
    }
}

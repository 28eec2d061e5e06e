//! Compilation pipeline: declarations to generated declarations.
//!
//! Each stage either produces the input of the next stage or a batch of
//! diagnostics. Registration failures within one stage are accumulated so
//! a single run reports every duplicate declaration, not just the first.

use tracing::{debug, info};

use crate::codegen::{self, GeneratedCode};
use crate::context::Context;
use crate::error::CompileError;
use crate::ir::decl::Spec;
use crate::typecheck::TypeChecker;

/// Compile a specification against a fresh context.
///
/// The context is left populated (declarations, shape registry, resolved
/// type map) so callers can inspect it after a successful run.
pub fn compile(spec: &Spec, ctx: &mut Context) -> Result<GeneratedCode, Vec<CompileError>> {
    register(spec, ctx)?;

    let passes = TypeChecker::new().check(&spec.monitors, ctx)?;
    debug!(passes, roots = spec.monitors.len(), "type checking converged");

    let code = codegen::generate(ctx)?;
    info!(
        events = spec.events.len(),
        files = code.files.len(),
        "compilation finished"
    );
    Ok(code)
}

/// Populate the context from the specification's declaration sections.
fn register(spec: &Spec, ctx: &mut Context) -> Result<(), Vec<CompileError>> {
    let mut errors = Vec::new();

    for event in &spec.events {
        if let Err(e) = ctx.add_event_decl(event.clone()) {
            errors.push(e);
        }
    }
    for trace in &spec.traces {
        if let Err(e) = ctx.add_trace_type(&trace.ty, trace.outputs.clone()) {
            errors.push(e);
        }
    }
    for hypertrace in &spec.hypertraces {
        if let Err(e) = ctx.add_hypertrace_type(&hypertrace.ty) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::foundation::{Span, Type, Width};
    use crate::ir::decl::{EventDecl, Field, OutputSink, TraceDecl};

    fn span() -> Span {
        Span::zero(0)
    }

    fn two_event_spec() -> Spec {
        let events = vec![
            EventDecl::new(
                "A",
                vec![Field::new("x", Type::UInt(Width::W32))],
                span(),
            ),
            EventDecl::new("B", vec![], span()),
        ];
        let traces = vec![TraceDecl::new(
            Type::trace([Type::event("A"), Type::event("B")]),
            [OutputSink::Stdout],
            span(),
        )];
        Spec {
            events,
            traces,
            ..Spec::default()
        }
    }

    #[test]
    fn test_full_pipeline_produces_all_files() {
        let mut ctx = Context::new();
        let code = compile(&two_event_spec(), &mut ctx).unwrap();
        let names: Vec<&str> = code.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["events.h", "events.cpp", "traces.h", "traces.cpp"]);
        assert!(ctx.is_checked());
    }

    #[test]
    fn test_duplicate_declarations_all_reported() {
        let mut spec = two_event_spec();
        spec.events.push(EventDecl::new("A", vec![], span()));
        spec.events.push(EventDecl::new("B", vec![], span()));
        let mut ctx = Context::new();
        let errors = compile(&spec, &mut ctx).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == ErrorKind::DuplicateDeclaration));
    }

    #[test]
    fn test_malformed_trace_shape_reported() {
        let mut spec = two_event_spec();
        spec.traces
            .push(TraceDecl::new(Type::Bool, [OutputSink::Stdout], span()));
        let mut ctx = Context::new();
        assert!(compile(&spec, &mut ctx).is_err());
    }
}

//! Symbol table for one compilation unit.
//!
//! The [`Context`] mediates name resolution between event declarations,
//! trace/hypertrace shapes and built-in module methods. It is created once
//! per compilation, mutated during IR construction (declarations, shape
//! registration) and once by the type checker (installing the final type
//! map), and is read-only during code generation.
//!
//! Trace shapes are canonically named on first registration: the same
//! member set always resolves to the same generated name, and naming is
//! deterministic for a fixed insertion order because the registry preserves
//! insertion order.

use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::foundation::Type;
use crate::ir::decl::{EventDecl, OutputSink};
use crate::ir::expr::{Expr, ExprKind, NodeId};

/// Canonical registry entry for a trace or hypertrace shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Generated name (`Trace_N` / `HTrace_N`); part of the compiled
    /// artifact's public surface
    pub name: String,
    /// Output sinks recorded when the shape was first registered
    pub outputs: BTreeSet<OutputSink>,
}

impl TraceEntry {
    /// Whether this trace feeds standard output.
    pub fn is_stdout(&self) -> bool {
        self.outputs.contains(&OutputSink::Stdout)
    }
}

/// Signature of a built-in method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<Type>,
    pub ret: Type,
}

impl MethodSig {
    pub fn new(name: impl Into<String>, params: Vec<Type>, ret: Type) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
        }
    }
}

/// Method table of a module or type.
pub type MethodTable = IndexMap<String, MethodSig>;

/// Symbol table owned exclusively by one compilation run.
#[derive(Debug, Default)]
pub struct Context {
    eventdecls: IndexMap<String, EventDecl>,
    tracetypes: IndexMap<Type, TraceEntry>,
    htracetypes: IndexMap<Type, TraceEntry>,
    modules: HashMap<String, MethodTable>,
    type_methods: HashMap<Type, MethodTable>,
    types: HashMap<NodeId, Type>,
    checked: bool,
    next_node_id: u32,
}

impl Context {
    /// Create a context seeded with the built-in module and type method
    /// tables.
    pub fn new() -> Self {
        let mut ctx = Self::default();
        ctx.register_builtins();
        ctx
    }

    fn register_builtins(&mut self) {
        use crate::foundation::Width;

        let mut std_module = MethodTable::new();
        std_module.insert(
            "abs".to_string(),
            MethodSig::new("abs", vec![Type::Int(Width::W64)], Type::Int(Width::W64)),
        );
        std_module.insert(
            "len".to_string(),
            MethodSig::new("len", vec![Type::String], Type::UInt(Width::W64)),
        );
        self.modules.insert("std".to_string(), std_module);

        let mut string_methods = MethodTable::new();
        string_methods.insert(
            "len".to_string(),
            MethodSig::new("len", vec![], Type::UInt(Width::W64)),
        );
        self.type_methods.insert(Type::String, string_methods);
    }

    /// Allocate a fresh node identity.
    pub fn fresh_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// Register an event declaration.
    ///
    /// # Errors
    ///
    /// `DuplicateDeclaration` if the name is already bound; a specification
    /// with this defect cannot produce correct code, so compilation aborts.
    pub fn add_event_decl(&mut self, decl: EventDecl) -> CompileResult<()> {
        if let Some(existing) = self.eventdecls.get(&decl.name) {
            return Err(CompileError::new(
                ErrorKind::DuplicateDeclaration,
                decl.span,
                format!("repeated declaration of event '{}'", decl.name),
            )
            .with_label(existing.span, "first declared here".to_string()));
        }
        self.eventdecls.insert(decl.name.clone(), decl);
        Ok(())
    }

    /// Look up an event declaration by name.
    pub fn get_event_decl(&self, name: &str) -> Option<&EventDecl> {
        self.eventdecls.get(name)
    }

    /// Event declarations in declaration order.
    pub fn event_decls(&self) -> impl Iterator<Item = &EventDecl> {
        self.eventdecls.values()
    }

    /// Register a trace shape, returning its canonical entry.
    ///
    /// A shape seen before resolves to the existing entry (structural
    /// lookup on the member set); otherwise a fresh sequential `Trace_N`
    /// name is minted. The `outputs` of the first registration win.
    ///
    /// # Errors
    ///
    /// `Internal` if `shape` is not a [`Type::Trace`].
    pub fn add_trace_type(
        &mut self,
        shape: &Type,
        outputs: BTreeSet<OutputSink>,
    ) -> CompileResult<&TraceEntry> {
        if !shape.is_trace() {
            return Err(CompileError::new(
                ErrorKind::Internal,
                Default::default(),
                format!("`{}` is not a trace shape", shape),
            ));
        }
        let next = self.tracetypes.len();
        Ok(self
            .tracetypes
            .entry(shape.clone())
            .or_insert_with(|| TraceEntry {
                name: format!("Trace_{}", next),
                outputs,
            }))
    }

    /// Register a hypertrace shape, returning its canonical entry.
    ///
    /// # Errors
    ///
    /// `Internal` if `shape` is not a [`Type::Hypertrace`].
    pub fn add_hypertrace_type(&mut self, shape: &Type) -> CompileResult<&TraceEntry> {
        if !shape.is_hypertrace() {
            return Err(CompileError::new(
                ErrorKind::Internal,
                Default::default(),
                format!("`{}` is not a hypertrace shape", shape),
            ));
        }
        let next = self.htracetypes.len();
        Ok(self
            .htracetypes
            .entry(shape.clone())
            .or_insert_with(|| TraceEntry {
                name: format!("HTrace_{}", next),
                outputs: BTreeSet::new(),
            }))
    }

    /// Look up the canonical entry for a registered trace shape.
    pub fn get_trace_type(&self, shape: &Type) -> Option<&TraceEntry> {
        self.tracetypes.get(shape)
    }

    /// Look up the canonical entry for a registered hypertrace shape.
    pub fn get_hypertrace_type(&self, shape: &Type) -> Option<&TraceEntry> {
        self.htracetypes.get(shape)
    }

    /// Registered trace shapes in registration order.
    pub fn trace_types(&self) -> impl Iterator<Item = (&Type, &TraceEntry)> {
        self.tracetypes.iter()
    }

    /// Registered hypertrace shapes in registration order.
    pub fn hypertrace_types(&self) -> impl Iterator<Item = (&Type, &TraceEntry)> {
        self.htracetypes.iter()
    }

    /// Method lookup on a module name.
    pub fn module_method(&self, module: &str, name: &str) -> Option<&MethodSig> {
        self.modules.get(module)?.get(name)
    }

    /// Method lookup on a type's method table.
    pub fn type_method(&self, ty: &Type, name: &str) -> Option<&MethodSig> {
        self.type_methods.get(ty)?.get(name)
    }

    /// Resolve a built-in method for an owner expression.
    ///
    /// The owner is first interpreted as a module name; if it does not
    /// denote a module, it denotes a value whose type is looked up in the
    /// installed type map (so the checker must have run) and the method is
    /// fetched from that type's method table. Returns `None` when neither
    /// resolution succeeds.
    pub fn get_method(&self, owner: &Expr, name: &str) -> Option<&MethodSig> {
        if let ExprKind::Ident { name: module } = &owner.kind {
            if let Some(sig) = self.module_method(module, name) {
                return Some(sig);
            }
        }
        let ty = self.node_type(owner.id)?;
        self.type_method(ty, name)
    }

    /// Type recorded for a node by the checker.
    ///
    /// Reading before the checker has run is a usage error, surfaced as a
    /// warning rather than a crash.
    pub fn node_type(&self, id: NodeId) -> Option<&Type> {
        if !self.checked {
            warn!(node = %id, "type map queried before the type checker ran");
            return None;
        }
        self.types.get(&id)
    }

    /// Whether the type checker has installed its result.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Install the checker's final type map. Called once per compilation.
    pub fn install_types(&mut self, types: HashMap<NodeId, Type>) {
        self.types = types;
        self.checked = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{Span, Width};
    use crate::ir::decl::Field;

    fn decl(name: &str) -> EventDecl {
        EventDecl::new(name, vec![], Span::zero(0))
    }

    #[test]
    fn test_duplicate_event_decl() {
        let mut ctx = Context::new();
        ctx.add_event_decl(decl("A")).unwrap();
        let err = ctx.add_event_decl(decl("A")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateDeclaration);
        assert_eq!(err.labels.len(), 1);
    }

    #[test]
    fn test_trace_name_determinism() {
        let mut ctx = Context::new();
        let ab = Type::trace([Type::event("A"), Type::event("B")]);
        let ba = Type::trace([Type::event("B"), Type::event("A")]);
        let c = Type::trace([Type::event("C")]);

        let first = ctx.add_trace_type(&ab, BTreeSet::new()).unwrap().name.clone();
        let second = ctx.add_trace_type(&ba, BTreeSet::new()).unwrap().name.clone();
        let third = ctx.add_trace_type(&c, BTreeSet::new()).unwrap().name.clone();

        assert_eq!(first, "Trace_0");
        // Same member set, different textual order: same generated name
        assert_eq!(second, "Trace_0");
        assert_eq!(third, "Trace_1");
    }

    #[test]
    fn test_first_registration_outputs_win() {
        let mut ctx = Context::new();
        let shape = Type::trace([Type::event("A")]);
        let stdout: BTreeSet<_> = [OutputSink::Stdout].into_iter().collect();

        ctx.add_trace_type(&shape, stdout).unwrap();
        let entry = ctx.add_trace_type(&shape, BTreeSet::new()).unwrap();
        assert!(entry.is_stdout());
    }

    #[test]
    fn test_trace_shape_validated() {
        let mut ctx = Context::new();
        let err = ctx.add_trace_type(&Type::Bool, BTreeSet::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[test]
    fn test_hypertrace_naming() {
        let mut ctx = Context::new();
        let h = Type::hypertrace([Type::trace([Type::event("A")])], true);
        let entry = ctx.add_hypertrace_type(&h).unwrap();
        assert_eq!(entry.name, "HTrace_0");
    }

    #[test]
    fn test_module_method_resolution() {
        let mut ctx = Context::new();
        let owner = Expr::ident(&mut ctx, "std", Span::zero(0));
        let sig = ctx.get_method(&owner, "abs").expect("std.abs resolves");
        assert_eq!(sig.ret, Type::Int(Width::W64));
    }

    #[test]
    fn test_value_method_requires_checked_types() {
        let mut ctx = Context::new();
        let owner = Expr::string(&mut ctx, "s", Span::zero(0));

        // Checker has not run: resolution degrades to None with a warning
        assert!(ctx.get_method(&owner, "len").is_none());

        let mut types = HashMap::new();
        types.insert(owner.id, Type::String);
        ctx.install_types(types);

        let sig = ctx.get_method(&owner, "len").expect("String.len resolves");
        assert_eq!(sig.ret, Type::UInt(Width::W64));
    }

    #[test]
    fn test_unknown_method_is_none() {
        let mut ctx = Context::new();
        let owner = Expr::ident(&mut ctx, "nosuch", Span::zero(0));
        ctx.install_types(HashMap::new());
        assert!(ctx.get_method(&owner, "frob").is_none());
    }
}

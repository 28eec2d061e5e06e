//! Typed intermediate representation of a specification.
//!
//! The driver layer parses source text into this IR; the core type-checks
//! it and generates code from it. Every expression node owns its children
//! exclusively and carries a [`NodeId`](expr::NodeId) the checker uses as
//! identity in its type map.

pub mod decl;
pub mod expr;

pub use decl::{EventDecl, Field, HypertraceDecl, OutputSink, Spec, TraceDecl};
pub use expr::{BinOp, CompareOp, Expr, ExprKind, Literal, NodeId};

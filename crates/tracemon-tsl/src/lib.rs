//! Compiler core for a trace-monitoring specification language.
//!
//! The crate turns a declarative specification (event declarations, trace
//! and hypertrace shapes, monitor expressions) into C++ declarations a
//! native runtime links against. The pipeline:
//!
//! 1. [`ir`] — build the typed element tree; event references are checked
//!    against declarations at construction time
//! 2. [`context`] — register declarations and canonical trace shapes in a
//!    per-run symbol table
//! 3. [`typecheck`] — iterate local typing rules to a fixed point,
//!    propagating types both up and down the tree
//! 4. [`codegen`] — emit event payload structs and per-shape tagged
//!    unions from the checked context
//!
//! [`compile::compile`] runs the stages end to end:
//!
//! ```
//! use tracemon_tsl::{compile, Context, EventDecl, Field, Spec, Type, Width};
//! use tracemon_tsl::foundation::Span;
//!
//! let spec = Spec {
//!     events: vec![EventDecl::new(
//!         "Open",
//!         vec![Field::new("fd", Type::Int(Width::W32))],
//!         Span::zero(0),
//!     )],
//!     ..Spec::default()
//! };
//! let mut ctx = Context::new();
//! let code = compile(&spec, &mut ctx).unwrap();
//! assert!(code.file("events.h").is_some());
//! ```

pub mod codegen;
pub mod compile;
pub mod context;
pub mod error;
pub mod foundation;
pub mod ir;
pub mod typecheck;

pub use codegen::{GeneratedCode, GeneratedFile};
pub use compile::compile;
pub use context::Context;
pub use error::{format_errors, CompileError, CompileResult, ErrorKind, Severity};
pub use foundation::{Span, Type, TypeError, Width};
pub use ir::{EventDecl, Expr, ExprKind, Field, HypertraceDecl, Spec, TraceDecl};
pub use typecheck::{Facts, TypeChecker};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

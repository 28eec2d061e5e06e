//! Expression nodes of the IR.
//!
//! `ExprKind` is a closed enum: the type checker dispatches on it with an
//! exhaustive match, so adding a variant forces every rule site to be
//! revisited. Each node owns its children exclusively and carries a
//! [`NodeId`] the checker uses as identity in its type map.
//!
//! Constructors allocate node ids from the [`Context`](crate::Context) so
//! that identities are unique per compilation unit. [`Expr::event`] is the
//! one fallible constructor: a parameter count mismatched to the event
//! declaration is an IR-construction error, not a typing error.

use crate::context::Context;
use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::foundation::{Span, Type};
use std::fmt;

/// Identity of an IR node within one compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A literal constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

/// Arithmetic binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        };
        write!(f, "{}", s)
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Identity for the checker's type map
    pub id: NodeId,
    /// Expression variant
    pub kind: ExprKind,
    /// Source location for diagnostics
    pub span: Span,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Literal constant with its declared type; numeric constants start as
    /// `Num(None)` and are refined through unification
    Constant { value: Literal, ty: Type },

    /// Identifier; a leaf that compares by name
    Ident { name: String },

    /// Ordered tuple of expressions
    Tuple { elems: Vec<Expr> },

    /// Cast to a target type; an opaque boundary that puts no constraint on
    /// the inner expression
    Cast { value: Box<Expr>, target: Type },

    /// Command-line argument of the specification (`$1`, `$2`, ...);
    /// always a `String`
    CmdArg { index: u32 },

    /// Logical conjunction
    And { lhs: Box<Expr>, rhs: Box<Expr> },

    /// Logical disjunction
    Or { lhs: Box<Expr>, rhs: Box<Expr> },

    /// Comparison; operand types unify with each other
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Membership test; a two-directional constraint between the needle's
    /// type and the container's element type
    IsIn {
        needle: Box<Expr>,
        haystack: Box<Expr>,
    },

    /// Event construction; parameters are constrained to the declared field
    /// types positionally
    Event { name: String, params: Vec<Expr> },

    /// Arithmetic operation; the result type converges with both operands
    BinaryOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Built-in method call, resolved against a module name or the owner's
    /// type
    MethodCall {
        owner: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    fn new(ctx: &mut Context, kind: ExprKind, span: Span) -> Self {
        Self {
            id: ctx.fresh_node_id(),
            kind,
            span,
        }
    }

    /// Literal constant carrying its declared type.
    pub fn constant(ctx: &mut Context, value: Literal, ty: Type, span: Span) -> Self {
        Self::new(ctx, ExprKind::Constant { value, ty }, span)
    }

    /// Numeric literal with not-yet-resolved width.
    pub fn number(ctx: &mut Context, value: i64, span: Span) -> Self {
        Self::constant(ctx, Literal::Int(value), Type::Num(None), span)
    }

    /// String literal.
    pub fn string(ctx: &mut Context, value: impl Into<String>, span: Span) -> Self {
        Self::constant(ctx, Literal::Str(value.into()), Type::String, span)
    }

    /// Identifier leaf.
    pub fn ident(ctx: &mut Context, name: impl Into<String>, span: Span) -> Self {
        Self::new(ctx, ExprKind::Ident { name: name.into() }, span)
    }

    /// Tuple expression.
    pub fn tuple(ctx: &mut Context, elems: Vec<Expr>, span: Span) -> Self {
        Self::new(ctx, ExprKind::Tuple { elems }, span)
    }

    /// Cast expression.
    pub fn cast(ctx: &mut Context, value: Expr, target: Type, span: Span) -> Self {
        Self::new(
            ctx,
            ExprKind::Cast {
                value: Box::new(value),
                target,
            },
            span,
        )
    }

    /// Command-line argument (`$index`).
    pub fn cmd_arg(ctx: &mut Context, index: u32, span: Span) -> Self {
        Self::new(ctx, ExprKind::CmdArg { index }, span)
    }

    /// Logical conjunction.
    pub fn and(ctx: &mut Context, lhs: Expr, rhs: Expr, span: Span) -> Self {
        Self::new(
            ctx,
            ExprKind::And {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    /// Logical disjunction.
    pub fn or(ctx: &mut Context, lhs: Expr, rhs: Expr, span: Span) -> Self {
        Self::new(
            ctx,
            ExprKind::Or {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    /// Comparison.
    pub fn compare(ctx: &mut Context, op: CompareOp, lhs: Expr, rhs: Expr, span: Span) -> Self {
        Self::new(
            ctx,
            ExprKind::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    /// Membership test.
    pub fn is_in(ctx: &mut Context, needle: Expr, haystack: Expr, span: Span) -> Self {
        Self::new(
            ctx,
            ExprKind::IsIn {
                needle: Box::new(needle),
                haystack: Box::new(haystack),
            },
            span,
        )
    }

    /// Arithmetic operation.
    pub fn binary(ctx: &mut Context, op: BinOp, lhs: Expr, rhs: Expr, span: Span) -> Self {
        Self::new(
            ctx,
            ExprKind::BinaryOp {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    /// Method call on a module name or a typed value.
    pub fn method_call(
        ctx: &mut Context,
        owner: Expr,
        method: impl Into<String>,
        args: Vec<Expr>,
        span: Span,
    ) -> Self {
        Self::new(
            ctx,
            ExprKind::MethodCall {
                owner: Box::new(owner),
                method: method.into(),
                args,
            },
            span,
        )
    }

    /// Event construction.
    ///
    /// The event must already be declared in the context, and the parameter
    /// count must match the declaration's field count.
    ///
    /// # Errors
    ///
    /// - `UnknownType` — no declaration for `name`
    /// - `MalformedArity` — parameter count differs from the field count
    pub fn event(
        ctx: &mut Context,
        name: impl Into<String>,
        params: Vec<Expr>,
        span: Span,
    ) -> CompileResult<Self> {
        let name = name.into();
        let (arity, decl_span) = match ctx.get_event_decl(&name) {
            Some(decl) => (decl.fields.len(), decl.span),
            None => {
                return Err(CompileError::new(
                    ErrorKind::UnknownType,
                    span,
                    format!("no declaration for event '{}'", name),
                ));
            }
        };
        if params.len() != arity {
            return Err(CompileError::new(
                ErrorKind::MalformedArity,
                span,
                format!(
                    "event '{}' declares {} field(s) but was constructed with {} parameter(s)",
                    name,
                    arity,
                    params.len()
                ),
            )
            .with_label(decl_span, "declared here".to_string()));
        }
        Ok(Self::new(ctx, ExprKind::Event { name, params }, span))
    }

    /// Directly-owned sub-nodes, in evaluation order.
    ///
    /// Identifiers and other leaves have no children.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Constant { .. } | ExprKind::Ident { .. } | ExprKind::CmdArg { .. } => {
                Vec::new()
            }
            ExprKind::Tuple { elems } => elems.iter().collect(),
            ExprKind::Cast { value, .. } => vec![value],
            ExprKind::And { lhs, rhs }
            | ExprKind::Or { lhs, rhs }
            | ExprKind::Compare { lhs, rhs, .. }
            | ExprKind::BinaryOp { lhs, rhs, .. } => vec![lhs, rhs],
            ExprKind::IsIn { needle, haystack } => vec![needle, haystack],
            ExprKind::Event { params, .. } => params.iter().collect(),
            ExprKind::MethodCall { owner, args, .. } => {
                let mut children: Vec<&Expr> = vec![owner];
                children.extend(args.iter());
                children
            }
        }
    }

    /// Depth of the expression tree rooted at this node.
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|c| c.depth())
            .max()
            .unwrap_or(0)
    }
}

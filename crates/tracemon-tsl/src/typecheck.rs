//! Fixed-point type checker.
//!
//! The checker assigns types to IR nodes by repeatedly traversing the IR in
//! post order (children before parents, so that a parent's rule can read
//! already-refined child types within the same pass) and invoking the
//! typing rule of each node until a pass produces no change.
//!
//! # What This Pass Does
//!
//! 1. **Type inference** — assigns a [`Type`] to each node, starting from
//!    whatever partial information the node declares
//! 2. **Constraint propagation** — unifies independently inferred types;
//!    bidirectional constraints (`IsIn`, `Compare`, `BinaryOp`) may take
//!    several passes to converge
//! 3. **Method resolution** — resolves built-in calls once the owner's type
//!    is known
//!
//! Assignments are monotone: once a node's type has been refined to `t`,
//! later assignments unify into `t` and can only make it more specific.
//! A genuinely contradictory specification fails through unification's
//! incompatibility error rather than looping; a constraint cycle that
//! never settles is cut off by [`MAX_PASSES`] with a fatal diagnostic.

use std::collections::HashMap;
use tracing::debug;

use crate::context::Context;
use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::foundation::Type;
use crate::ir::expr::{Expr, ExprKind, NodeId};

/// Upper bound on checker passes.
///
/// Well-typed specifications converge within the depth of the deepest
/// expression tree plus one; the cap only fires on constraint systems with
/// no fixed point.
pub const MAX_PASSES: usize = 64;

/// Facts interface the typing rules consume.
///
/// `assign` with `None` records that an assignment was attempted but
/// inconclusive, distinguishing "never visited" from "visited but
/// unresolved"; it never reports a change.
///
/// Traversal is deliberately not part of this interface: rules are local
/// contracts over a node and its direct children, and the checker alone
/// owns visit order. A rule that could recurse into the tree could break
/// the post-order guarantee the fixed point relies on.
pub trait Facts {
    /// Currently-believed type of a node, if any.
    fn get(&self, node: &Expr) -> Option<&Type>;

    /// Merge a type into a node's current assignment.
    ///
    /// Returns whether the stored value changed.
    ///
    /// # Errors
    ///
    /// `IncompatibleTypes` when the new type cannot unify with the
    /// existing assignment.
    fn assign(&mut self, node: &Expr, ty: Option<Type>) -> CompileResult<bool>;
}

/// Fixed-point worklist over the IR.
#[derive(Debug, Default)]
pub struct TypeChecker {
    /// `None` entries mean "attempted but unresolved"
    types: HashMap<NodeId, Option<Type>>,
    changed: bool,
}

impl Facts for TypeChecker {
    fn get(&self, node: &Expr) -> Option<&Type> {
        self.types.get(&node.id)?.as_ref()
    }

    fn assign(&mut self, node: &Expr, ty: Option<Type>) -> CompileResult<bool> {
        let Some(ty) = ty else {
            self.types.entry(node.id).or_insert(None);
            return Ok(false);
        };

        let slot = self.types.entry(node.id).or_insert(None);
        match slot {
            Some(current) => {
                let merged = current
                    .unify(&ty)
                    .map_err(|e| CompileError::incompatible(e, node.span))?;
                let changed = merged != *current;
                if changed {
                    debug!(node = %node.id, from = %current, to = %merged, "refined");
                    *slot = Some(merged);
                    self.changed = true;
                }
                Ok(changed)
            }
            None => {
                debug!(node = %node.id, ty = %ty, "assigned");
                *slot = Some(ty);
                self.changed = true;
                Ok(true)
            }
        }
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the checker to its fixed point and install the resulting type
    /// map into the context.
    ///
    /// Returns the number of passes it took to converge (the last pass is
    /// the one that observed no change).
    ///
    /// # Errors
    ///
    /// - `IncompatibleTypes` — contradictory constraints; compilation
    ///   aborts immediately, no partial result is installed
    /// - `UnresolvedMethod` — a method call whose owner never resolved
    /// - `CheckerDiverged` — no fixed point within [`MAX_PASSES`]
    pub fn check(mut self, roots: &[Expr], ctx: &mut Context) -> Result<usize, Vec<CompileError>> {
        for pass in 1..=MAX_PASSES {
            self.changed = false;
            for root in roots {
                self.visit(root, ctx).map_err(|e| vec![e])?;
            }
            debug!(pass, changed = self.changed, "pass complete");

            if !self.changed {
                let mut errors = Vec::new();
                for root in roots {
                    self.require_methods_resolved(root, &mut errors);
                }
                if !errors.is_empty() {
                    return Err(errors);
                }

                let resolved = self
                    .types
                    .into_iter()
                    .filter_map(|(id, ty)| ty.map(|t| (id, t)))
                    .collect();
                ctx.install_types(resolved);
                return Ok(pass);
            }
        }

        let span = roots.first().map(|e| e.span).unwrap_or_default();
        Err(vec![CompileError::new(
            ErrorKind::CheckerDiverged,
            span,
            format!("no fixed point after {} passes", MAX_PASSES),
        )])
    }

    /// Post-order traversal: children before parent.
    fn visit(&mut self, expr: &Expr, ctx: &Context) -> CompileResult<()> {
        for child in expr.children() {
            self.visit(child, ctx)?;
        }
        typing_rule(expr, ctx, self)
    }

    /// Method calls that never resolved are fatal: downstream stages need
    /// their result type.
    fn require_methods_resolved(&self, expr: &Expr, errors: &mut Vec<CompileError>) {
        if let ExprKind::MethodCall { owner, method, .. } = &expr.kind {
            let resolved = self.types.get(&expr.id).map_or(false, Option::is_some);
            if !resolved {
                errors.push(CompileError::new(
                    ErrorKind::UnresolvedMethod,
                    expr.span,
                    format!(
                        "cannot resolve method '{}': owner is neither a module nor a value of known type",
                        method
                    ),
                ).with_label(owner.span, "owner expression".to_string()));
            }
        }
        for child in expr.children() {
            self.require_methods_resolved(child, errors);
        }
    }
}

/// Local typing contract of one node.
///
/// Exhaustive over [`ExprKind`]: adding a variant forces a rule here.
fn typing_rule(expr: &Expr, ctx: &Context, facts: &mut dyn Facts) -> CompileResult<()> {
    match &expr.kind {
        // A constant asserts its own declared type and nothing else
        ExprKind::Constant { ty, .. } => {
            facts.assign(expr, Some(ty.clone()))?;
        }

        // Identifiers are typed entirely by their uses; record the attempt
        ExprKind::Ident { .. } => {
            facts.assign(expr, None)?;
        }

        ExprKind::Tuple { elems } => {
            // Children up: tuple type from fully-typed slots
            let slot_types: Vec<_> = elems.iter().map(|e| facts.get(e).cloned()).collect();
            if slot_types.iter().all(Option::is_some) {
                let tuple = Type::Tuple(slot_types.into_iter().flatten().collect());
                facts.assign(expr, Some(tuple))?;
            } else {
                facts.assign(expr, None)?;
            }
            // Parent down: slot types from a known tuple type
            if let Some(Type::Tuple(slots)) = facts.get(expr).cloned() {
                if slots.len() == elems.len() {
                    for (elem, slot) in elems.iter().zip(slots) {
                        facts.assign(elem, Some(slot))?;
                    }
                }
            }
        }

        // A cast is an opaque boundary: it does not constrain its operand
        ExprKind::Cast { target, .. } => {
            facts.assign(expr, Some(target.clone()))?;
        }

        ExprKind::CmdArg { .. } => {
            facts.assign(expr, Some(Type::String))?;
        }

        ExprKind::And { lhs, rhs } | ExprKind::Or { lhs, rhs } => {
            facts.assign(expr, Some(Type::Bool))?;
            facts.assign(lhs, Some(Type::Bool))?;
            facts.assign(rhs, Some(Type::Bool))?;
        }

        ExprKind::Compare { lhs, rhs, .. } => {
            facts.assign(expr, Some(Type::Bool))?;
            // Capture both sides first so evaluation order cannot matter
            let lhs_ty = facts.get(lhs).cloned();
            let rhs_ty = facts.get(rhs).cloned();
            facts.assign(lhs, rhs_ty)?;
            facts.assign(rhs, lhs_ty)?;
        }

        ExprKind::IsIn { needle, haystack } => {
            facts.assign(expr, Some(Type::Bool))?;
            // Container down to element
            if let Some(hay_ty) = facts.get(haystack) {
                let elem = hay_ty.element_type();
                facts.assign(needle, elem)?;
            }
            // Element up to container: it must be an iterable of that
            // element, validated against the container's member set once
            // both sides are concrete
            if let Some(needle_ty) = facts.get(needle).cloned() {
                facts.assign(haystack, Some(Type::iterable(needle_ty)))?;
            }
        }

        ExprKind::Event { name, params } => {
            let decl = ctx.get_event_decl(name).ok_or_else(|| {
                CompileError::new(
                    ErrorKind::Internal,
                    expr.span,
                    format!("event '{}' lost its declaration", name),
                )
            })?;
            facts.assign(expr, Some(Type::event(name.clone())))?;
            // Arity was validated at construction time
            for (param, field) in params.iter().zip(&decl.fields) {
                facts.assign(param, Some(field.ty.clone()))?;
            }
        }

        ExprKind::BinaryOp { lhs, rhs, .. } => {
            // The result converges with both operands, and the operands in
            // turn with the result; a single node may need several passes
            let lhs_ty = facts.get(lhs).cloned();
            let rhs_ty = facts.get(rhs).cloned();
            facts.assign(expr, lhs_ty)?;
            facts.assign(expr, rhs_ty)?;
            let self_ty = facts.get(expr).cloned();
            facts.assign(lhs, self_ty.clone())?;
            facts.assign(rhs, self_ty)?;
        }

        ExprKind::MethodCall {
            owner,
            method,
            args,
        } => {
            let sig = match &owner.kind {
                ExprKind::Ident { name } if ctx.module_method(name, method).is_some() => {
                    ctx.module_method(name, method)
                }
                _ => facts
                    .get(owner)
                    .and_then(|ty| ctx.type_method(ty, method)),
            };
            match sig.cloned() {
                Some(sig) => {
                    facts.assign(expr, Some(sig.ret))?;
                    for (arg, param) in args.iter().zip(sig.params) {
                        facts.assign(arg, Some(param))?;
                    }
                }
                // Not resolvable yet; the owner's type may still arrive
                None => {
                    facts.assign(expr, None)?;
                }
            }
        }
    }
    Ok(())
}

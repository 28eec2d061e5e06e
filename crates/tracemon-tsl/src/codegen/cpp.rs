//! C++ spellings for the subset of types that can appear in generated
//! declarations.

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::foundation::{Span, Type};

/// The C++ type a resolved IR type is emitted as.
///
/// Only types that can appear in an event payload or a method signature
/// have a spelling; structural types (traces, tuples, iterators) never
/// reach the emitter directly.
pub fn cpp_type(ty: &Type) -> CompileResult<String> {
    match ty {
        Type::Bool => Ok("bool".to_string()),
        Type::Int(w) => Ok(format!("int{}_t", w.bits())),
        Type::UInt(w) => Ok(format!("uint{}_t", w.bits())),
        // A numeric type that survived checking without gaining a width
        // gets the platform default.
        Type::Num(_) => Ok("int".to_string()),
        Type::String => Ok("std::string".to_string()),
        Type::Event(name) => Ok(format!("Event_{name}")),
        other => Err(CompileError::new(
            ErrorKind::Codegen,
            Span::zero(0),
            format!("type `{other}` has no C++ representation"),
        )),
    }
}

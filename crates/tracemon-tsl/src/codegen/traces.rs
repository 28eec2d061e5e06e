//! Trace declarations: one tagged union per distinct trace shape plus the
//! wrapper classes the runtime instantiates.
//!
//! Every member payload shares the union's footprint with an `Event base`
//! member, so storage for any variant of one trace shape has the same
//! size. All dispatch over the live tag (destructor, equality, printing)
//! switches exhaustively over the shape's members and aborts on an
//! unknown tag.

use crate::context::Context;
use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::foundation::{Span, Type};

use super::GeneratedFile;

/// Generate `traces.h` and `traces.cpp` from the registered trace and
/// hypertrace shapes, in registration order.
pub fn generate(ctx: &Context) -> CompileResult<Vec<GeneratedFile>> {
    let mut header = String::new();
    header.push_str("#ifndef TRACEMON_GEN_TRACES_H_\n");
    header.push_str("#define TRACEMON_GEN_TRACES_H_\n\n");
    header.push_str("#include <cstdlib>\n\n");
    header.push_str("#include <tracemon/cpp/trace.h>\n");
    header.push_str("#include <tracemon/cpp/htrace.h>\n\n");
    header.push_str("#include \"events.h\"\n\n");
    header.push_str("using tracemon::HTrace;\n");
    header.push_str("using tracemon::StdoutTrace;\n");
    header.push_str("using tracemon::Trace;\n\n");

    let mut source = String::new();
    source.push_str("#include <cassert>\n\n");
    source.push_str("#include \"traces.h\"\n\n");

    for (shape, entry) in ctx.trace_types() {
        let members = member_names(shape)?;
        header.push_str(&trace_union(&entry.name, &members));
        header.push_str(&format!(
            "std::ostream &operator<<(std::ostream &s, const Event_{} &ev);\n",
            entry.name
        ));
        header.push_str(&format!(
            "std::ostream &operator<<(std::ostream &s, const EventAndID<Event_{}> &data);\n\n",
            entry.name
        ));
        header.push_str(&trace_class(&entry.name, entry.is_stdout())?);
        source.push_str(&union_print_impl(&entry.name, &members));
    }

    for (shape, entry) in ctx.hypertrace_types() {
        // The member shapes must themselves be registered traces.
        if let Type::Hypertrace { traces, .. } = shape {
            for member in traces {
                if ctx.get_trace_type(member).is_none() {
                    return Err(CompileError::new(
                        ErrorKind::Codegen,
                        Span::zero(0),
                        format!("hypertrace `{}` contains an unregistered trace shape", entry.name),
                    ));
                }
            }
        }
        header.push_str(&hypertrace_class(&entry.name)?);
    }

    header.push_str("#endif // TRACEMON_GEN_TRACES_H_\n");
    Ok(vec![
        GeneratedFile::new("traces.h", header),
        GeneratedFile::new("traces.cpp", source),
    ])
}

/// Member event names of a trace shape, in canonical (sorted) order.
fn member_names(shape: &Type) -> CompileResult<Vec<&str>> {
    let Type::Trace(members) = shape else {
        return Err(internal(format!("`{shape}` registered as a trace shape")));
    };
    members
        .iter()
        .map(|member| match member {
            Type::Event(name) | Type::User(name) => Ok(name.as_str()),
            other => Err(internal(format!(
                "trace member `{other}` is not an event type"
            ))),
        })
        .collect()
}

fn trace_union(name: &str, members: &[&str]) -> String {
    let mut out = String::new();
    out.push_str(&format!("union Event_{name} {{\n"));
    out.push_str("  Event base;\n");
    for member in members {
        out.push_str(&format!("  Event_{member} {member};\n"));
    }
    out.push('\n');

    out.push_str(&format!("  Event_{name}() : base() {{}}\n"));
    for member in members {
        out.push_str(&format!(
            "  Event_{name}(const Event_{member} &ev) : {member}(ev) {{}}\n"
        ));
    }
    out.push('\n');

    // Active member is determined by the tag; placement of any variant
    // starts at the union's base, so the tag is always readable.
    out.push_str(&format!("  ~Event_{name}() {{\n"));
    out.push_str("    switch (base.get_kind()) {\n");
    out.push_str("    case (tmn_kind)Kind::END:\n");
    out.push_str("      break;\n");
    for member in members {
        out.push_str(&format!("    case (tmn_kind)Kind::{member}:\n"));
        out.push_str(&format!("      {member}.~Event_{member}();\n"));
        out.push_str("      break;\n");
    }
    out.push_str("    default:\n");
    out.push_str("      abort();\n");
    out.push_str("    }\n");
    out.push_str("  }\n\n");

    out.push_str(&format!(
        "  bool operator==(const Event_{name} &rhs) const {{\n"
    ));
    out.push_str("    if (base.get_kind() != rhs.base.get_kind())\n");
    out.push_str("      return false;\n");
    out.push_str("    switch (base.get_kind()) {\n");
    out.push_str("    case (tmn_kind)Kind::END:\n");
    out.push_str("      return true;\n");
    for member in members {
        out.push_str(&format!("    case (tmn_kind)Kind::{member}:\n"));
        out.push_str(&format!("      return {member} == rhs.{member};\n"));
    }
    out.push_str("    default:\n");
    out.push_str("      abort();\n");
    out.push_str("    }\n");
    out.push_str("  }\n");
    out.push_str(&format!(
        "  bool operator!=(const Event_{name} &rhs) const {{ return !operator==(rhs); }}\n\n"
    ));

    out.push_str("  template <Kind k> bool isa() const { return base.get_kind() == (tmn_kind)k; }\n");
    out.push_str("  void set_id(tmn_eventid id) { base.set_id(id); }\n");
    out.push_str("  tmn_eventid id() const { return base.get_id(); }\n");
    out.push_str("  tmn_kind kind() const { return base.get_kind(); }\n");
    out.push_str("};\n\n");
    out
}

fn trace_class(name: &str, stdout: bool) -> CompileResult<String> {
    let base = if stdout { "StdoutTrace" } else { "Trace" };
    let type_id = type_id(name)?;
    let mut out = String::new();
    out.push_str(&format!("class {name} : public {base}<Event_{name}> {{\n"));
    out.push_str("public:\n");
    out.push_str(&format!("  constexpr static size_t TYPE_ID = {type_id};\n\n"));
    out.push_str(&format!(
        "  {name}(size_t id) : {base}<Event_{name}>(id, TYPE_ID) {{}}\n"
    ));
    out.push_str("};\n\n");
    Ok(out)
}

fn hypertrace_class(name: &str) -> CompileResult<String> {
    let type_id = type_id(name)?;
    let mut out = String::new();
    out.push_str(&format!("class {name} : public HTrace {{\n"));
    out.push_str("public:\n");
    out.push_str(&format!("  constexpr static size_t TYPE_ID = {type_id};\n\n"));
    out.push_str(&format!(
        "  {name}(size_t id) : HTrace(id, TYPE_ID) {{}}\n"
    ));
    out.push_str("};\n\n");
    Ok(out)
}

/// Numeric type id carried by a canonical shape name (`Trace_3` has id 3).
fn type_id(name: &str) -> CompileResult<usize> {
    name.rsplit_once('_')
        .and_then(|(_, suffix)| suffix.parse().ok())
        .ok_or_else(|| internal(format!("shape name `{name}` carries no numeric suffix")))
}

fn union_print_impl(name: &str, members: &[&str]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "std::ostream &operator<<(std::ostream &s, const Event_{name} &ev) {{\n"
    ));
    out.push_str(&format!("  s << \"{name}::\";\n"));
    out.push_str("  switch (ev.kind()) {\n");
    for member in members {
        out.push_str(&format!("  case (tmn_kind)Kind::{member}:\n"));
        out.push_str(&format!("    s << ev.{member};\n"));
        out.push_str("    break;\n");
    }
    out.push_str("  default:\n");
    out.push_str("    assert(false && \"invalid kind\");\n");
    out.push_str("    abort();\n");
    out.push_str("  }\n");
    out.push_str("  return s;\n");
    out.push_str("}\n\n");

    out.push_str(&format!(
        "std::ostream &operator<<(std::ostream &s, const EventAndID<Event_{name}> &data) {{\n"
    ));
    out.push_str(&format!("  s << \"{name}::\";\n"));
    out.push_str("  switch (data.event.kind()) {\n");
    for member in members {
        out.push_str(&format!("  case (tmn_kind)Kind::{member}:\n"));
        out.push_str(&format!(
            "    s << EventAndID<Event_{member}>(data.event.{member}, data.id);\n"
        ));
        out.push_str("    break;\n");
    }
    out.push_str("  default:\n");
    out.push_str("    assert(false && \"invalid kind\");\n");
    out.push_str("    abort();\n");
    out.push_str("  }\n");
    out.push_str("  return s;\n");
    out.push_str("}\n\n");
    out
}

fn internal(message: String) -> CompileError {
    CompileError::new(ErrorKind::Internal, Span::zero(0), message)
}

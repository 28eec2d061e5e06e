//! Event declarations: the kind enumeration and one payload struct per
//! declared event.

use std::fmt::Write as _;

use crate::context::Context;
use crate::error::CompileResult;
use crate::ir::decl::EventDecl;

use super::cpp::cpp_type;
use super::GeneratedFile;

/// Generate `events.h` and `events.cpp` from the declared events, in
/// declaration order.
pub fn generate(ctx: &Context) -> CompileResult<Vec<GeneratedFile>> {
    let decls: Vec<&EventDecl> = ctx.event_decls().collect();
    Ok(vec![
        GeneratedFile::new("events.h", header(&decls)?),
        GeneratedFile::new("events.cpp", source(&decls)),
    ])
}

fn header(decls: &[&EventDecl]) -> CompileResult<String> {
    let mut out = String::new();
    out.push_str("#ifndef TRACEMON_GEN_EVENTS_H_\n");
    out.push_str("#define TRACEMON_GEN_EVENTS_H_\n\n");
    out.push_str("#include <cstdint>\n");
    out.push_str("#include <iostream>\n");
    out.push_str("#include <string>\n\n");
    out.push_str("#include <tracemon/cpp/event.h>\n");
    out.push_str("#include <tracemon/cpp/event_and_id.h>\n\n");
    out.push_str("using tracemon::Event;\n");
    out.push_str("using tracemon::EventAndID;\n\n");

    out.push_str(&kind_enum(decls));
    for decl in decls {
        out.push_str(&event_struct(decl)?);
        out.push_str(&format!(
            "std::ostream &operator<<(std::ostream &s, const Event_{} &ev);\n",
            decl.name
        ));
        out.push_str(&format!(
            "std::ostream &operator<<(std::ostream &s, const EventAndID<Event_{}> &data);\n\n",
            decl.name
        ));
    }

    out.push_str("#endif // TRACEMON_GEN_EVENTS_H_\n");
    Ok(out)
}

/// The tag enumeration. `END` reuses the runtime's reserved done-kind and
/// the first declared event anchors the valid range; later events follow
/// implicitly, so no declared tag can collide with `END`.
fn kind_enum(decls: &[&EventDecl]) -> String {
    let mut out = String::new();
    out.push_str("enum class Kind : tmn_kind {\n");
    out.push_str("  END = Event::doneKind(),\n");
    for (idx, decl) in decls.iter().enumerate() {
        if idx == 0 {
            out.push_str(&format!("  {} = Event::firstValidKind(),\n", decl.name));
        } else {
            out.push_str(&format!("  {},\n", decl.name));
        }
    }
    out.push_str("};\n\n");
    out
}

fn event_struct(decl: &EventDecl) -> CompileResult<String> {
    let name = &decl.name;
    let mut out = String::new();
    out.push_str(&format!("struct Event_{name} : public Event {{\n"));

    for field in &decl.fields {
        out.push_str(&format!(
            "  {} {};\n",
            cpp_type(&field.ty)?,
            field.name
        ));
    }
    if !decl.fields.is_empty() {
        out.push('\n');
    }

    out.push_str(&format!("  Event_{name}() = default;\n"));
    // Id-only construction must leave every field zero-valued
    let zero_inits: String = decl
        .fields
        .iter()
        .map(|f| format!(", {}()", f.name))
        .collect();
    out.push_str(&format!(
        "  Event_{name}(tmn_eventid id) : Event((tmn_kind)Kind::{name}, id){zero_inits} {{}}\n"
    ));
    if !decl.fields.is_empty() {
        // Full constructor: id plus every field, then a delegating
        // fields-only constructor for payloads without an assigned id.
        let mut params = String::new();
        let mut inits = String::new();
        for field in &decl.fields {
            write!(params, ", {} {}_", cpp_type(&field.ty)?, field.name).ok();
            write!(inits, ", {}({}_)", field.name, field.name).ok();
        }
        out.push_str(&format!(
            "  Event_{name}(tmn_eventid id{params}) : Event((tmn_kind)Kind::{name}, id){inits} {{}}\n"
        ));
        let bare_params: Vec<String> = decl
            .fields
            .iter()
            .map(|f| Ok(format!("{} {}_", cpp_type(&f.ty)?, f.name)))
            .collect::<CompileResult<_>>()?;
        let bare_args: Vec<String> = decl.fields.iter().map(|f| format!("{}_", f.name)).collect();
        out.push_str(&format!(
            "  Event_{name}({}) : Event_{name}(0, {}) {{}}\n",
            bare_params.join(", "),
            bare_args.join(", ")
        ));
    }
    out.push('\n');

    // Identity compares payloads only; ids are transport metadata.
    out.push_str(&format!(
        "  bool operator==(const Event_{name} &rhs) const {{\n"
    ));
    if decl.fields.is_empty() {
        out.push_str("    return true;\n");
    } else {
        let cmps: Vec<String> = decl
            .fields
            .iter()
            .map(|f| format!("{} == rhs.{}", f.name, f.name))
            .collect();
        out.push_str(&format!("    return {};\n", cmps.join(" && ")));
    }
    out.push_str("  }\n");
    out.push_str(&format!(
        "  bool operator!=(const Event_{name} &rhs) const {{ return !operator==(rhs); }}\n"
    ));

    out.push_str("};\n\n");
    Ok(out)
}

fn source(decls: &[&EventDecl]) -> String {
    let mut out = String::new();
    out.push_str("#include <iomanip>\n\n");
    out.push_str("#include \"events.h\"\n\n");
    out.push_str("static const char *color_green = \"\\033[0;32m\";\n");
    out.push_str("static const char *color_red = \"\\033[0;31m\";\n");
    out.push_str("static const char *color_reset = \"\\033[0m\";\n\n");

    for decl in decls {
        out.push_str(&print_impl(decl));
    }
    out
}

fn print_impl(decl: &EventDecl) -> String {
    let name = &decl.name;
    let mut out = String::new();
    out.push_str(&format!(
        "std::ostream &operator<<(std::ostream &s, const Event_{name} &ev) {{\n"
    ));
    out.push_str(&format!(
        "  s << color_green << \"{name}\" << color_reset << \"(\" << color_red << std::setw(2)\n"
    ));
    out.push_str("    << std::right << ev.id() << color_reset;\n");
    if !decl.fields.is_empty() {
        out.push_str("  s << \", \";\n");
        for (idx, field) in decl.fields.iter().enumerate() {
            if idx > 0 {
                out.push_str("  s << \", \";\n");
            }
            out.push_str(&format!(
                "  s << \"{}=\" << ev.{};\n",
                field.name, field.name
            ));
        }
    }
    out.push_str("  s << \")\";\n");
    out.push_str("  return s;\n");
    out.push_str("}\n\n");
    out.push_str(&format!(
        "std::ostream &operator<<(std::ostream &s, const EventAndID<Event_{name}> &data) {{\n"
    ));
    out.push_str("  s << \"(\" << data.id << \", \" << data.event << \")\";\n");
    out.push_str("  return s;\n");
    out.push_str("}\n\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{Span, Type, Width};
    use crate::ir::decl::Field;

    fn ctx_with(decls: Vec<EventDecl>) -> Context {
        let mut ctx = Context::new();
        for decl in decls {
            ctx.add_event_decl(decl).unwrap();
        }
        ctx
    }

    #[test]
    fn test_kind_enum_first_event_anchors_range() {
        let ctx = ctx_with(vec![
            EventDecl::new(
                "A",
                vec![Field::new("x", Type::UInt(Width::W32))],
                Span::zero(0),
            ),
            EventDecl::new("B", vec![], Span::zero(0)),
        ]);
        let files = generate(&ctx).unwrap();
        let header = &files[0].contents;
        assert!(header.contains("END = Event::doneKind(),"));
        assert!(header.contains("A = Event::firstValidKind(),"));
        // Only the first event is pinned; B takes the next value implicitly.
        assert!(header.contains("\n  B,\n"));
        assert!(!header.contains("B = Event::"));
    }

    #[test]
    fn test_payload_struct_fields_and_constructors() {
        let ctx = ctx_with(vec![EventDecl::new(
            "Write",
            vec![
                Field::new("fd", Type::Int(Width::W32)),
                Field::new("len", Type::UInt(Width::W64)),
            ],
            Span::zero(0),
        )]);
        let header = &generate(&ctx).unwrap()[0].contents;
        assert!(header.contains("struct Event_Write : public Event {"));
        assert!(header.contains("  int32_t fd;\n  uint64_t len;\n"));
        assert!(header.contains(
            "Event_Write(tmn_eventid id, int32_t fd_, uint64_t len_) : \
             Event((tmn_kind)Kind::Write, id), fd(fd_), len(len_) {}"
        ));
        assert!(header.contains("Event_Write(int32_t fd_, uint64_t len_) : Event_Write(0, fd_, len_) {}"));
        assert!(header.contains("return fd == rhs.fd && len == rhs.len;"));
    }

    #[test]
    fn test_fieldless_event_equality_is_trivial() {
        let ctx = ctx_with(vec![EventDecl::new("Tick", vec![], Span::zero(0))]);
        let header = &generate(&ctx).unwrap()[0].contents;
        let body = header
            .split("bool operator==(const Event_Tick &rhs) const {")
            .nth(1)
            .unwrap();
        assert!(body.trim_start().starts_with("return true;"));
        // No field constructors for a fieldless event.
        assert!(!header.contains("Event_Tick(tmn_eventid id, "));
    }

    #[test]
    fn test_print_impl_lists_fields() {
        let ctx = ctx_with(vec![EventDecl::new(
            "A",
            vec![Field::new("x", Type::UInt(Width::W32))],
            Span::zero(0),
        )]);
        let source = &generate(&ctx).unwrap()[1].contents;
        assert!(source.contains("operator<<(std::ostream &s, const Event_A &ev)"));
        assert!(source.contains("s << \"x=\" << ev.x;"));
    }
}

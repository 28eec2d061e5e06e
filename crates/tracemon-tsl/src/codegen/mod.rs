//! Code generation: typed IR to target-language declarations.
//!
//! The generator walks the read-only [`Context`] — event declarations in
//! declaration order, trace/hypertrace shapes in registration order — and
//! emits C++ declarations the downstream native runtime links against:
//! an event-tag enumeration, one payload struct per event, one tagged
//! union per distinct trace shape, and wrapper classes carrying a
//! `TYPE_ID` derived from the shape's canonical name.
//!
//! Output is returned in memory; file paths, overwrite policy and the
//! external formatter invocation live in the driver layer.
//!
//! # Artifact invariants
//!
//! - every payload lives inside the trace union next to an `Event base`
//!   member, so each variant occupies the union's uniform footprint
//! - destructor, equality and printer dispatch switch over the live tag
//!   with one case per member event and `abort()` on an unknown tag
//! - the first declared event receives `Event::firstValidKind()`; the
//!   reserved `END` tag is `Event::doneKind()` and never collides

pub mod cpp;
pub mod events;
pub mod traces;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::CompileError;

/// One generated output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// File name relative to the output directory chosen by the driver
    pub name: String,
    pub contents: String,
}

impl GeneratedFile {
    pub fn new(name: impl Into<String>, contents: String) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }
}

/// The complete generated declaration set for one specification.
///
/// Serializable so the driver layer can persist or ship the artifact
/// description without re-running the compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub files: Vec<GeneratedFile>,
}

impl GeneratedCode {
    /// Look up a generated file by name.
    pub fn file(&self, name: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// Generate the full declaration set from a checked context.
pub fn generate(ctx: &Context) -> Result<GeneratedCode, Vec<CompileError>> {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    match events::generate(ctx) {
        Ok(mut generated) => files.append(&mut generated),
        Err(e) => errors.push(e),
    }
    match traces::generate(ctx) {
        Ok(mut generated) => files.append(&mut generated),
        Err(e) => errors.push(e),
    }

    if errors.is_empty() {
        Ok(GeneratedCode { files })
    } else {
        Err(errors)
    }
}

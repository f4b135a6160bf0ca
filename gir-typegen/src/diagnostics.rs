//! Degradation diagnostics.
//!
//! The mapper never fails: unresolvable names, skipped types, and
//! unsupported callback shapes degrade to weaker mappings so codegen can
//! proceed. Each degradation is recorded here so the pipeline can report
//! what was weakened instead of hiding it.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Name matched nothing in any namespace; mapped to an opaque pointer.
    UnresolvedType,
    /// Type is on the skip list; references degrade to an opaque object.
    SkippedType,
    /// Callback-shaped type with no registered trampoline.
    UnsupportedCallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The type name as written in the metadata.
    pub name: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, name: &str) -> Diagnostic {
        Diagnostic {
            kind,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::UnresolvedType => {
                write!(f, "`{}` did not resolve; mapped as opaque pointer", self.name)
            }
            DiagnosticKind::SkippedType => {
                write!(f, "`{}` is skipped; references mapped as opaque object", self.name)
            }
            DiagnosticKind::UnsupportedCallback => {
                write!(f, "`{}` has no registered trampoline", self.name)
            }
        }
    }
}

//! Compile-time error reporting and diagnostics.
//!
//! Every pass reports problems as [`CompileError`] values. A diagnostic with
//! severity [`Severity::Error`] aborts the build and is propagated with `?`;
//! warnings and notes are appended to the build's [`Diagnostics`] sink and
//! the build continues.
//!
//! # Design
//!
//! - `CompileError` - single diagnostic: kind, severity, message, notes
//! - `ErrorKind` - what went wrong, grouped into an [`ErrorCategory`]
//! - `Severity` - error, warning, or note
//! - `Diagnostics` - append-only collection of non-fatal diagnostics
//!
//! # Message templates
//!
//! Field and import diagnostics follow fixed templates that downstream tooling
//! matches on:
//!
//! ```text
//! For schema '<schema>', field '<field>': <message>.
//! For schema '<schema>', import field '<alias>': <message>.
//! ```
//!
//! Use [`CompileError::field`], [`CompileError::import`] and
//! [`CompileError::schema`] to build them.

use std::fmt;

use tracing::warn;

/// Compilation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Category of this error
    pub kind: ErrorKind,
    /// Severity level
    pub severity: Severity,
    /// Primary error message
    pub message: String,
    /// Additional notes or hints
    pub notes: Vec<String>,
}

/// What a diagnostic is about.
///
/// # Invariant
///
/// The discriminant values must match the ERROR_KIND_NAMES array indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    // Reference graph
    /// Import spec without exactly one '.'
    InvalidReferenceSpec = 0,
    /// Import through a field that is not a local reference field
    UnknownReferenceField = 1,
    /// Import target not found in the referenced schema
    UnknownImportTarget = 2,
    /// Alias imported twice
    DuplicateImport = 3,
    /// Documents reference each other in a cycle
    ReferenceCycle = 4,
    /// Reference or inheritance to a document type that does not exist
    UnknownDocumentType = 5,
    /// Summary source, field-set member or rank setting naming no field
    UnknownField = 6,
    /// Inheritance chain loops back on itself
    InheritanceCycle = 7,

    // Types
    /// Import target is not an importable attribute
    UnsupportedImport = 8,
    /// Summary directive or transform not valid for the field's type
    UnsupportedSummary = 9,
    /// Attribute settings not valid for the attribute's type
    IncompatibleAttribute = 10,
    /// Field-set members of incompatible types or settings
    FieldSetMismatch = 11,
    /// Same summary field declared with different types
    SummaryTypeMismatch = 12,
    /// Struct type name that is not declared
    UnknownStruct = 13,
    /// Struct type containing itself
    RecursiveStruct = 14,

    // Indexing scripts
    /// Two sinks assign different values to one field
    ConflictingWrite = 15,
    /// Sink writes to a field other than its own
    IllegalWrite = 16,
    /// Statement reads a field other than its own
    IllegalInput = 17,

    // Settings
    /// Invalid combination of declared settings
    InvalidSettings = 18,
    /// Name reserved by the query language or rank features
    ReservedName = 19,
    /// Summary requires reading the stored document from disk
    DiskAccess = 20,
    /// Inherits a summary or rank profile that does not exist
    UnknownParent = 21,

    // Generic
    /// Internal compiler error (bug in compiler)
    Internal = 22,
}

/// Human-readable names for error kinds.
///
/// Index matches ErrorKind discriminant.
const ERROR_KIND_NAMES: &[&str] = &[
    "invalid reference spec",  // 0: InvalidReferenceSpec
    "unknown reference field", // 1: UnknownReferenceField
    "unknown import target",   // 2: UnknownImportTarget
    "duplicate import",        // 3: DuplicateImport
    "reference cycle",         // 4: ReferenceCycle
    "unknown document type",   // 5: UnknownDocumentType
    "unknown field",           // 6: UnknownField
    "inheritance cycle",       // 7: InheritanceCycle
    "unsupported import",      // 8: UnsupportedImport
    "unsupported summary",     // 9: UnsupportedSummary
    "incompatible attribute",  // 10: IncompatibleAttribute
    "field-set mismatch",      // 11: FieldSetMismatch
    "summary type mismatch",   // 12: SummaryTypeMismatch
    "unknown struct",          // 13: UnknownStruct
    "recursive struct",        // 14: RecursiveStruct
    "conflicting write",       // 15: ConflictingWrite
    "illegal write",           // 16: IllegalWrite
    "illegal input",           // 17: IllegalInput
    "invalid settings",        // 18: InvalidSettings
    "reserved name",           // 19: ReservedName
    "disk access",             // 20: DiskAccess
    "unknown parent",          // 21: UnknownParent
    "internal compiler error", // 22: Internal
];

/// Broad class of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or invalid references, imports and cycles
    Reference,
    /// Field type incompatible with an attribute, transform or collection constraint
    Type,
    /// Indexing script writes that conflict or escape their field
    Conflict,
    /// Invalid combination of declared settings
    Configuration,
    Internal,
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational note (not an error)
    Note,
    /// Warning (schema is valid but suspicious or slow)
    Warning,
    /// Error (compilation cannot proceed)
    Error,
}

impl CompileError {
    /// Creates a new error diagnostic.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::with_severity(kind, Severity::Error, message.into())
    }

    /// Creates a new warning diagnostic.
    pub fn warning(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::with_severity(kind, Severity::Warning, message.into())
    }

    /// Creates a new note diagnostic.
    pub fn note(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::with_severity(kind, Severity::Note, message.into())
    }

    fn with_severity(kind: ErrorKind, severity: Severity, message: String) -> Self {
        Self {
            kind,
            severity,
            message,
            notes: Vec::new(),
        }
    }

    /// `For schema '<schema>', field '<field>': <message>.`
    pub fn field(kind: ErrorKind, schema: &str, field: &str, message: impl AsRef<str>) -> Self {
        Self::new(
            kind,
            format!(
                "For schema '{}', field '{}': {}.",
                schema,
                field,
                message.as_ref()
            ),
        )
    }

    /// `For schema '<schema>', import field '<alias>': <message>.`
    pub fn import(kind: ErrorKind, schema: &str, alias: &str, message: impl AsRef<str>) -> Self {
        Self::new(
            kind,
            format!(
                "For schema '{}', import field '{}': {}.",
                schema,
                alias,
                message.as_ref()
            ),
        )
    }

    /// `For schema '<schema>': <message>.`
    pub fn schema(kind: ErrorKind, schema: &str, message: impl AsRef<str>) -> Self {
        Self::new(
            kind,
            format!("For schema '{}': {}.", schema, message.as_ref()),
        )
    }

    /// `For schema '<schema>', <summary location>: <message>.`
    pub fn summary(kind: ErrorKind, schema: &str, location: &str, message: impl AsRef<str>) -> Self {
        Self::new(
            kind,
            format!("For schema '{}', {}: {}.", schema, location, message.as_ref()),
        )
    }

    /// Downgrades this diagnostic to a warning.
    pub fn into_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    /// Adds a note or hint.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

impl ErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn name(self) -> &'static str {
        ERROR_KIND_NAMES[self as usize]
    }

    pub fn category(self) -> ErrorCategory {
        use ErrorKind::*;
        match self {
            InvalidReferenceSpec | UnknownReferenceField | UnknownImportTarget
            | DuplicateImport | ReferenceCycle | UnknownDocumentType | UnknownField
            | InheritanceCycle | UnknownParent => ErrorCategory::Reference,
            UnsupportedImport | UnsupportedSummary | IncompatibleAttribute | FieldSetMismatch
            | SummaryTypeMismatch | UnknownStruct | RecursiveStruct => ErrorCategory::Type,
            ConflictingWrite | IllegalWrite | IllegalInput => ErrorCategory::Conflict,
            InvalidSettings | ReservedName | DiskAccess => ErrorCategory::Configuration,
            Internal => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.severity,
            self.kind.name(),
            self.message
        )
    }
}

impl std::error::Error for CompileError {}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

// =============================================================================
// Diagnostics sink
// =============================================================================

/// Append-only collection of the non-fatal diagnostics of one build.
///
/// Every diagnostic is logged via `tracing::warn!` when it is pushed.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<CompileError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic. Fatal diagnostics are recorded as given; callers
    /// normally return those instead.
    pub fn push(&mut self, diagnostic: CompileError) {
        warn!(
            kind = ?diagnostic.kind,
            severity = %diagnostic.severity,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    /// Records a warning of `kind`.
    pub fn warn(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.push(CompileError::warning(kind, message));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
        self.entries.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CompileError> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn into_vec(self) -> Vec<CompileError> {
        self.entries
    }
}

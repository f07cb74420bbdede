use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifier of an object in the host application graph.
pub type ObjectId = String;

/// An object in the host application graph (job step, program, dataset, folder).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostObject {
    pub id: ObjectId,
    pub name: String,
    /// Host type tag, e.g. `CAST_JCL_Step`.
    pub type_name: String,
    pub parent: Option<ObjectId>,
}

/// An object the extractor asks the host to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewObject {
    pub name: String,
    pub type_name: String,
    pub parent: ObjectId,
}

/// A source position attached to a call link, with the text it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub file: String,
    pub begin_line: u32,
    /// Source text of the position; `None` when the host could not retrieve it.
    pub code: Option<String>,
}

/// A call from one host object to another, with its source positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLink {
    pub caller: HostObject,
    pub callee: HostObject,
    pub positions: Vec<Position>,
}

impl CallLink {
    /// Short human-readable label used in logs and failure reports.
    pub fn describe(&self) -> String {
        format!("{} -> {}", self.caller.name, self.callee.name)
    }
}

/// Kinds of reference edges written back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessKind {
    Read,
    Write,
    Generic,
}

#[allow(clippy::should_implement_trait)]
impl AccessKind {
    /// Returns the host link type tag for this access kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessKind::Read => "accessReadLink",
            AccessKind::Write => "accessWriteLink",
            AccessKind::Generic => "accessLink",
        }
    }

    /// Parses a host link type tag, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<AccessKind> {
        match s {
            "accessReadLink" => Some(AccessKind::Read),
            "accessWriteLink" => Some(AccessKind::Write),
            "accessLink" => Some(AccessKind::Generic),
            _ => None,
        }
    }
}

/// Direction of an FTP transfer command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferDirection {
    /// Download: the step writes the local dataset.
    Get,
    /// Upload: the step reads the local dataset.
    #[default]
    Put,
}

impl TransferDirection {
    pub fn access_kind(&self) -> AccessKind {
        match self {
            TransferDirection::Get => AccessKind::Write,
            TransferDirection::Put => AccessKind::Read,
        }
    }
}

/// The two embedded-script idioms the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandFamily {
    /// FTP `GET`/`PUT` command blocks.
    Transfer,
    /// CDSEND `&&DSN` parameter blocks.
    ParameterSend,
}

impl CommandFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandFamily::Transfer => "ftp",
            CommandFamily::ParameterSend => "cdsend",
        }
    }
}

/// A script block attached to a call link: ordered lines plus an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptBlock {
    pub file: String,
    /// Absolute line number of the first line of the block.
    pub begin_line: u32,
    pub lines: Vec<String>,
}

impl ScriptBlock {
    pub fn new(file: impl Into<String>, begin_line: u32, text: &str) -> Self {
        Self {
            file: file.into(),
            begin_line,
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Builds a block from a call-link position, or `None` if it carries no text.
    pub fn from_position(position: &Position) -> Option<Self> {
        let code = position.code.as_deref()?;
        Some(Self::new(position.file.clone(), position.begin_line, code))
    }

    /// Converts a span relative to this block into an absolute bookmark.
    pub fn bookmark(&self, span: &LineSpan) -> Bookmark {
        Bookmark {
            file: self.file.clone(),
            begin_line: self.begin_line.saturating_add(span.begin_offset),
            begin_column: span.begin_column,
            end_line: self.begin_line.saturating_add(span.end_offset),
            end_column: span.end_column,
        }
    }
}

/// A span of lines relative to the start of a script block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    pub begin_offset: u32,
    pub begin_column: u32,
    pub end_offset: u32,
    pub end_column: u32,
}

impl LineSpan {
    /// Span covering the whole of a single line.
    pub fn whole_line(offset: u32, line: &str) -> Self {
        Self::lines(offset, offset, line)
    }

    /// Span from column 1 of `begin_offset` to the end of `end_line` at `end_offset`.
    pub fn lines(begin_offset: u32, end_offset: u32, end_line: &str) -> Self {
        Self {
            begin_offset,
            begin_column: 1,
            end_offset,
            end_column: line_length(end_line),
        }
    }
}

/// Length of a line in characters, as used for bookmark end columns.
pub fn line_length(line: &str) -> u32 {
    line.chars().count() as u32
}

/// A dataset reference found by a recognizer, relative to its script block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedReference {
    pub name: String,
    pub access: AccessKind,
    pub span: LineSpan,
}

/// An absolute source span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub file: String,
    pub begin_line: u32,
    pub begin_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

/// A directed access edge from a job step to a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub kind: AccessKind,
    pub source: ObjectId,
    pub target: ObjectId,
    pub bookmark: Bookmark,
}

/// Whether a dataset node pre-existed in the host or was created by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceOrigin {
    Resolved,
    Placeholder,
}

/// A dataset node known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: ObjectId,
    pub name: String,
    pub origin: ResourceOrigin,
    pub parent: Option<ObjectId>,
}

/// A call link whose extraction failed; the run continued past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkFailure {
    pub family: CommandFamily,
    pub caller: String,
    pub callee: String,
    pub message: String,
}

/// Summary of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Landmark programs/procedures found across both families.
    pub landmarks: usize,
    /// Call links whose script text was scanned.
    pub links_scanned: usize,
    /// Call links skipped because they carry no source position.
    pub links_skipped: usize,
    pub references: usize,
    pub edges_created: usize,
    pub placeholders_created: usize,
    pub failures: Vec<LinkFailure>,
}

/// Generates a deterministic object ID from type, name, and parent.
///
/// The ID format is `"obj:32hexchars"` where the hex portion is the first 32
/// characters of the SHA-256 hash of the input components.
pub fn generate_object_id(type_name: &str, name: &str, parent: &str) -> ObjectId {
    let input = format!("{}:{}:{}", type_name, name, parent);
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let hash = hasher.finalize();
    let hex_str = hex::encode(hash);
    format!("obj:{}", &hex_str[..32])
}

pub type RvbResult<M> = std::result::Result<M, RvbError>;

/// Errors from exporting and from reading RVB1 files
#[derive(thiserror::Error, Debug)]
pub enum RvbError {
    #[error("select an object for export")]
    NoActiveObject,
    #[error("{0} triangle corners do not fit in a u32 vertex count")]
    TooManyVertices(usize),
    #[error("bad magic {0:?} (expected \"RVB1\")")]
    BadMagic([u8; 4]),
    #[error("unsupported RVB version {0}. Only version 1 files supported.")]
    UnsupportedVersion(u32),
    #[error("unknown attribute descriptor code {0:#04x}")]
    UnknownAttribute(u32),
    #[error("unexpected attribute layout {0:?}")]
    UnexpectedLayout(Vec<u32>),
    #[error("premature file end")]
    PrematureFileEnd,
    #[error("wrote {written} records but the header declares {declared}")]
    InconsistentState { declared: u32, written: u64 },

    #[error("{source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("From {path}: {source}")]
    IoPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl RvbError {
    /// Map end-of-file to [`RvbError::PrematureFileEnd`], everything else to `Io`
    pub(crate) fn from_read(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            RvbError::PrematureFileEnd
        } else {
            RvbError::Io { source: err }
        }
    }
}

/// Errors from the OBJ and STL importers
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("line {line}: cannot parse {text:?}")]
    ObjSyntax { line: usize, text: String },
    #[error("line {line}: {kind} index {index} out of range")]
    ObjIndex {
        line: usize,
        kind: &'static str,
        index: i64,
    },
    #[error("file too small to be a valid STL")]
    StlTooSmall,
    #[error("unexpected end of STL data after {parsed} of {expected} triangles")]
    StlTruncated { parsed: usize, expected: usize },
    #[error("failed to parse ASCII STL: {0}")]
    StlAscii(String),
    #[error("unsupported mesh format {0:?} (expected .obj or .stl)")]
    UnsupportedFormat(String),
    #[error("text data is not valid UTF-8")]
    NotUtf8,

    #[error("From {path}: {source}")]
    IoPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

use std::fmt;

/// Machine-readable error codes shared by every libshelf error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidPattern,
    LibraryNotFound,
    InvalidEdge,
    CycleDetected,
    SnapshotCorrupt,
    SnapshotPathUnset,
    ExtractionFailed,
    UnsupportedArtifact,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidPattern => "E1002",
            Self::LibraryNotFound => "E2001",
            Self::InvalidEdge => "E2002",
            Self::CycleDetected => "E2003",
            Self::SnapshotCorrupt => "E3001",
            Self::SnapshotPathUnset => "E3002",
            Self::ExtractionFailed => "E4001",
            Self::UnsupportedArtifact => "E4002",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in libshelf.toml and retry."),
            Self::InvalidPattern => Some("Use shell-style globs such as `libfoo*.so`."),
            Self::LibraryNotFound => {
                Some("Run `libshelf analyze <path>` to add the library to the catalog.")
            }
            Self::InvalidEdge => Some("Retry once. If persistent, report a bug with logs."),
            Self::CycleDetected => Some("Group the libraries of the cycle into one component."),
            Self::SnapshotCorrupt => {
                Some("Delete the snapshot file and re-run `libshelf analyze`.")
            }
            Self::SnapshotPathUnset => Some("Pass --project or set LIBSHELF_PROJECT."),
            Self::ExtractionFailed => {
                Some("Check that `nm` is installed or set LIBSHELF_NM to its path.")
            }
            Self::UnsupportedArtifact => Some("Only `.a` and `.so` libraries can be analyzed."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

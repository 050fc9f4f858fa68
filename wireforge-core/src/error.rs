//! Error types shared by the codec core, the IDL front end, and the code
//! generator.

use std::fmt::{self, Display, Formatter};

pub type Result<T> = std::result::Result<T, Error>;

/// The kind of failure that occurred. Distinct from the message, which
/// carries the specifics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Malformed wire bytes: truncation, unexpected character, an
    /// out-of-range VLQ.
    BadInput,
    /// Programmer error: a value was handed to an encoder that does not
    /// match the type the schema expects.
    BadType,
    /// A member id or name on the wire does not correspond to any member
    /// known to the schema.
    KeyNotFound,
    /// Schema-parse failures, one variant per grammar production that can
    /// reject.
    BadIdentifier,
    BadAccessType,
    BadObjectType,
    BadClassMember,
    BadMemberType,
    BadClass,
    BadNamespace,
    /// Cursor bounds violations. Usually surfaced to callers as `BadInput`
    /// once wrapped by a codec.
    Overflow,
    Underflow,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            ErrorKind::BadInput => "bad input",
            ErrorKind::BadType => "bad type",
            ErrorKind::KeyNotFound => "key not found",
            ErrorKind::BadIdentifier => "bad identifier",
            ErrorKind::BadAccessType => "bad access type",
            ErrorKind::BadObjectType => "bad object type",
            ErrorKind::BadClassMember => "bad class member",
            ErrorKind::BadMemberType => "bad member type",
            ErrorKind::BadClass => "bad class",
            ErrorKind::BadNamespace => "bad namespace",
            ErrorKind::Overflow => "overflow",
            ErrorKind::Underflow => "underflow",
        })
    }
}

/// An error raised by any layer of the toolkit.
///
/// Carries an optional rendered cursor-context string (see
/// [`crate::cursor::Cursor::diagnostic`]) so that callers get the same
/// "160 bytes before, marker, 80 bytes after" context a human would want
/// when a schema or a wire stream is malformed.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error { kind, message: message.into(), context: None }
    }

    pub fn with_context(kind: ErrorKind, message: impl Into<String>, context: impl Into<String>) -> Self {
        Error { kind, message: message.into(), context: Some(context.into()) }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

/// Re-kind a cursor bounds violation (`Overflow`/`Underflow`) as
/// `BadInput`: from a codec call site's perspective, a truncated scalar,
/// string, or VLQ is malformed input, not a raw cursor violation. Other
/// error kinds pass through unchanged.
pub(crate) fn as_bad_input<T>(result: Result<T>) -> Result<T> {
    result.map_err(|e| match e.kind {
        ErrorKind::Overflow | ErrorKind::Underflow => Error { kind: ErrorKind::BadInput, ..e },
        _ => e,
    })
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(ErrorKind::BadInput, error.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(ref context) = self.context {
            write!(f, "\n{}", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

macro_rules! error {
    ($k:ident, $($e:tt)*) => {
        $crate::error::Error::new($crate::error::ErrorKind::$k, format!($($e)*))
    };
}

macro_rules! bail {
    ($($e:tt)*) => { return Err(error!($($e)*)) };
}

macro_rules! ensure {
    ($c:expr, $($e:tt)*) => {
        if !$c {
            bail!($($e)*);
        }
    };
}

// Exported (not just crate-visible) so `wireforge-idl` and
// `wireforge-codegen` can build errors in the same concise style rather
// than inventing their own macros for the same `Error::new`/`with_context`
// call shape.
pub use bail;
pub use ensure;
pub use error;

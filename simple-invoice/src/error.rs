use std::fmt::{Debug, Display};

pub struct Error {
    kind: ErrorKind,
    context: Vec<String>,
}

pub enum ErrorKind {
    Io(std::io::Error),
    WebDriverSession(fantoccini::error::NewSessionError),
    WebDriverCmd(fantoccini::error::CmdError),
    PrintConfiguration(fantoccini::error::PrintConfigurationError),
    Template(minijinja::Error),
    QrCode(qrcode::types::QrError),
    Json(serde_json::Error),
    Other(String),
}

pub trait AddContext<T> {
    fn add_context(self, ctx: &str) -> Result<T, Error>;
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut context = self.context.clone();
        context.reverse();
        let context = if context.is_empty() {
            String::from("no context")
        } else {
            context.join(" -> ")
        };
        write!(f, "{context}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            ErrorKind::WebDriverSession(e) => Some(e),
            ErrorKind::WebDriverCmd(e) => Some(e),
            ErrorKind::PrintConfiguration(_) => None,
            ErrorKind::Template(e) => Some(e),
            ErrorKind::QrCode(e) => Some(e),
            ErrorKind::Json(e) => Some(e),
            ErrorKind::Other(_) => None,
        }
    }
}

macro_rules! impl_from {
    ($source:ty, $variant:ident) => {
        impl From<$source> for Error {
            fn from(value: $source) -> Self {
                Error {
                    context: vec![format!("{:?}", value)],
                    kind: ErrorKind::$variant(value),
                }
            }
        }
    };
}

impl_from!(std::io::Error, Io);
impl_from!(fantoccini::error::NewSessionError, WebDriverSession);
impl_from!(fantoccini::error::CmdError, WebDriverCmd);
impl_from!(fantoccini::error::PrintConfigurationError, PrintConfiguration);
impl_from!(minijinja::Error, Template);
impl_from!(qrcode::types::QrError, QrCode);
impl_from!(serde_json::Error, Json);

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error {
            context: vec![value.to_string()],
            kind: ErrorKind::Other(value),
        }
    }
}

impl Error {
    /// Add more context to the given error. This context will ultimately be displayed to the user
    /// and could be useful for correcting bad input or filing a help ticket.
    ///
    /// Generally a single layer of context should be added for every level that an error is
    /// surfaced. If the error is surfaced all the way to main and not handled there, then all the
    /// context will be displayed to the user in reverse order
    ///
    /// # Arguments
    /// * `context` - Any additional information that would be useful for the user to see if the
    /// error is surfaced to them
    pub fn add_context(self, context: &str) -> Error {
        let mut existing = self.context;
        existing.push(context.to_string());
        Self {
            context: existing,
            ..self
        }
    }

    /// The underlying failure that started the context chain.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl<T> AddContext<T> for Result<T, Error> {
    fn add_context(self, ctx: &str) -> Result<T, Error> {
        match self {
            Ok(d) => Ok(d),
            Err(e) => Err(e.add_context(ctx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_displayed_outermost_first() {
        let err: Result<(), Error> = Err(Error::from(String::from("disk full")));
        let err = err
            .add_context("writing pdf")
            .add_context("generating invoice")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "generating invoice -> writing pdf -> disk full"
        );
        assert!(matches!(err.kind(), ErrorKind::Other(_)));
    }

    #[test]
    fn io_errors_keep_their_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::from(io).add_context("creating output file");
        assert!(matches!(err.kind(), ErrorKind::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn print_configuration_errors_have_no_source() {
        let err = Error::from(fantoccini::error::PrintConfigurationError::NegativeDimensions)
            .add_context("building print configuration");
        assert!(matches!(err.kind(), ErrorKind::PrintConfiguration(_)));
        assert!(std::error::Error::source(&err).is_none());
        assert_eq!(
            err.to_string(),
            "building print configuration -> NegativeDimensions"
        );
    }
}

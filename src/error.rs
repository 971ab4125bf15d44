//! Errors for the kernel and the simplifier.

use std::fmt;

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the kernel or the simplifier.
///
/// The two fatal traversal conditions (step exhaustion, interruption)
/// have dedicated variants so that callers can tell them apart from
/// ordinary failures.
#[derive(Debug, Clone)]
pub struct Error(Box<ErrorImpl>);

#[derive(Debug, Clone)]
pub struct ErrorImpl {
    pub msg: ErrorMsg,
    pub source: Option<Error>,
}

/// An error message.
#[derive(Debug, Clone)]
pub enum ErrorMsg {
    EStatic(&'static str),
    EDyn(String),
    /// The simplifier exceeded its step bound.
    EExhausted,
    /// The traversal was interrupted by the cooperative interruption flag.
    EInterrupted,
}

mod impls {
    use super::*;

    impl std::ops::Deref for Error {
        type Target = ErrorImpl;
        fn deref(&self) -> &Self::Target {
            &*self.0
        }
    }

    impl fmt::Display for Error {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            match &self.msg {
                ErrorMsg::EStatic(msg) => write!(out, "{}", msg),
                ErrorMsg::EDyn(s) => write!(out, "{}", &s),
                ErrorMsg::EExhausted => {
                    write!(out, "simplifier failed, maximum number of steps exceeded")
                }
                ErrorMsg::EInterrupted => write!(out, "simplifier interrupted"),
            }
        }
    }

    impl std::error::Error for Error {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match &self.source {
                None => None,
                Some(p) => Some(&*p),
            }
        }
    }
}

impl Error {
    /// Build a new error from a static message.
    pub fn new(msg: &'static str) -> Self {
        Error(Box::new(ErrorImpl {
            msg: ErrorMsg::EStatic(msg),
            source: None,
        }))
    }

    pub fn new_string(msg: String) -> Self {
        Error(Box::new(ErrorImpl {
            msg: ErrorMsg::EDyn(msg),
            source: None,
        }))
    }

    /// The step bound was exceeded.
    pub fn exhausted() -> Self {
        Error(Box::new(ErrorImpl {
            msg: ErrorMsg::EExhausted,
            source: None,
        }))
    }

    /// The interruption flag was raised during a traversal.
    pub fn interrupted() -> Self {
        Error(Box::new(ErrorImpl {
            msg: ErrorMsg::EInterrupted,
            source: None,
        }))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.msg, ErrorMsg::EExhausted)
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self.msg, ErrorMsg::EInterrupted)
    }

    /// Change the source of this error.
    pub fn set_source(&mut self, src: Self) {
        // append at the end of the `source` linked list.
        if let Some(e2) = &mut self.0.source {
            e2.set_source(src)
        } else {
            self.0.source = Some(src);
        }
    }

    pub fn with_source(mut self, src: Self) -> Self {
        self.set_source(src);
        self
    }

    /// Display the error, along with its source if any.
    pub fn to_string_with_src(&self) -> String {
        use std::fmt::Write;

        let mut s = String::new();
        let mut e = self;
        loop {
            write!(&mut s, "{}", e).unwrap();
            if let Some(src) = &e.0.source {
                write!(&mut s, "\nin ").unwrap();
                e = src;
            } else {
                break;
            }
        }
        s
    }
}

/// Format-and-box an error.
#[macro_export]
macro_rules! errorstr {
    ($($t:expr),* $(,)?) => {
        $crate::error::Error::new_string(format!($($t),*))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_size() {
        // errors should be relatively small (one pointer here)
        assert!(std::mem::size_of::<Error>() <= 8);
    }

    #[test]
    fn test_kinds() {
        assert!(Error::exhausted().is_exhausted());
        assert!(!Error::exhausted().is_interrupted());
        assert!(Error::interrupted().is_interrupted());
        assert!(!Error::new("foo").is_exhausted());
    }
}

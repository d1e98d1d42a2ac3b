//! Error types for VHDL file extraction.

use std::path::PathBuf;

/// Errors that can occur while constructing a [`VhdlFile`](crate::VhdlFile).
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The source file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that was being read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A style rule was violated while the file was added strictly.
    #[error("{0}")]
    Style(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_display_includes_path() {
        let err = ExtractError::Io {
            path: PathBuf::from("/missing/file.vhd"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/missing/file.vhd"));
        assert!(msg.starts_with("failed to read"));
    }

    #[test]
    fn style_display_is_message() {
        let err = ExtractError::Style("foo.vhd contains zero design units".to_string());
        assert_eq!(err.to_string(), "foo.vhd contains zero design units");
    }
}

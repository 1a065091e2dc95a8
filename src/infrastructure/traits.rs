//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;
use thiserror::Error;

use crate::domain::{DecisionTree, DomainError, TreeDocument};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write bytes to file, replacing any previous content.
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// The person answering prompts.
pub trait Operator: Send + Sync {
    /// Show `prompt` and read one line of input, without the line ending.
    ///
    /// End of input is an `UnexpectedEof` error, not an empty answer.
    fn ask(&self, prompt: &str) -> io::Result<String>;

    /// Show a line of text.
    fn tell(&self, message: &str);

    /// Report an aborted action.
    fn warn(&self, message: &str) {
        self.tell(message);
    }
}

/// Error from encoding or decoding a persisted tree.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed tree document: {0}")]
    Format(String),

    #[error("{0}")]
    Invalid(#[from] DomainError),
}

/// Byte codec for whole trees.
pub trait TreeCodec: Send + Sync {
    fn encode(&self, tree: &DecisionTree) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<DecisionTree, CodecError>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Operator on the controlling terminal (stdin/stdout).
#[derive(Debug, Default)]
pub struct TerminalOperator;

impl Operator for TerminalOperator {
    fn ask(&self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}", prompt.cyan())?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn tell(&self, message: &str) {
        println!("{}", message);
    }

    fn warn(&self, message: &str) {
        eprintln!("{}: {}", "Warning".yellow(), message);
    }
}

/// Pretty-printed JSON with 4-space indentation.
#[derive(Debug, Default)]
pub struct JsonCodec;

impl TreeCodec for JsonCodec {
    fn encode(&self, tree: &DecisionTree) -> Result<Vec<u8>, CodecError> {
        use serde::Serialize;

        let document = TreeDocument::from(tree);
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document
            .serialize(&mut serializer)
            .map_err(|e| CodecError::Format(e.to_string()))?;
        buf.push(b'\n');
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecisionTree, CodecError> {
        let document: TreeDocument =
            serde_json::from_slice(bytes).map_err(|e| CodecError::Format(e.to_string()))?;
        Ok(DecisionTree::try_from(document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_tree_when_encoding_then_uses_parallel_arrays() {
        let mut tree = DecisionTree::root();
        tree.add_child("work", "");
        tree.add_leaf("nap", "short");
        let bytes = JsonCodec.encode(&tree).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["name"], "root");
        assert_eq!(value["children_probabilities"], serde_json::json!([1.0]));
        assert_eq!(value["children"][0]["name"], "work");
        assert_eq!(value["leaves"][0]["description"], "short");
        assert!(String::from_utf8(bytes).unwrap().contains("\n    \"name\""));
    }

    #[test]
    fn given_garbage_when_decoding_then_reports_format_error() {
        let err = JsonCodec.decode(b"{not json").unwrap_err();
        assert!(matches!(err, CodecError::Format(_)));
    }
}

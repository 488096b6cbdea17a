//! Fetch stage: retrieval of remote summary-statistic files.
//!
//! Catalog rows carry a retrieval command (typically `wget ... -O <file>`)
//! as text. The command is tokenized into a structured program/argument
//! list at catalog load, and the expected output filename is derived from
//! the `-O` option before anything is executed. Path tracking is therefore
//! decoupled from whatever the external tool actually writes.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Option token whose following argument names the output file.
const OUTPUT_OPTION: &str = "-O";

/// Errors from parsing a retrieval instruction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchParseError {
    /// The instruction contained no tokens.
    #[error("Retrieval instruction is empty")]
    Empty,

    /// No `-O <file>` pair was present, so the output filename cannot be
    /// derived before execution.
    #[error("Retrieval instruction has no '{OUTPUT_OPTION} <file>' output designation: {instruction}")]
    MissingOutputOption { instruction: String },
}

/// Errors from executing a retrieval command.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The retrieval program could not be started.
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The retrieval program exited non-zero.
    #[error("'{program}' exited with code {exit_code}: {message}")]
    NonZeroExit {
        program: String,
        exit_code: i32,
        message: String,
    },
}

/// A structured retrieval command bound to one trait and one statistic kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchCommand {
    program: String,
    args: Vec<String>,
    output_name: String,
}

impl FetchCommand {
    /// Parse a retrieval instruction into a structured command.
    ///
    /// Tokenizes on whitespace and locates the filename following the last
    /// `-O` token. Fails if the instruction is empty or carries no output
    /// designation.
    pub fn parse(instruction: &str) -> Result<Self, FetchParseError> {
        let tokens: Vec<&str> = instruction.split_whitespace().collect();
        let (&program, rest) = tokens.split_first().ok_or(FetchParseError::Empty)?;

        let output_name = rest
            .iter()
            .rposition(|t| *t == OUTPUT_OPTION)
            .and_then(|pos| rest.get(pos + 1))
            .ok_or_else(|| FetchParseError::MissingOutputOption {
                instruction: instruction.to_string(),
            })?;

        Ok(Self {
            program: program.to_string(),
            args: rest.iter().map(|t| t.to_string()).collect(),
            output_name: output_name.to_string(),
        })
    }

    /// The program to invoke.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument list.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The output filename declared by the instruction.
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// The path the caller should expect to exist after execution in
    /// `dest_dir`.
    pub fn expected_path(&self, dest_dir: &Path) -> PathBuf {
        dest_dir.join(&self.output_name)
    }

    /// Render the command for logging.
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Execute the retrieval with `dest_dir` as the working directory.
    ///
    /// Returns the expected output path on success. A non-zero exit or a
    /// spawn failure surfaces as a `FetchError`; the caller decides whether
    /// that is fatal (it never is beyond the current trait).
    pub fn execute(&self, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(dest_dir)
            .output()
            .map_err(|e| FetchError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::NonZeroExit {
                program: self.program.clone(),
                exit_code: output.status.code().unwrap_or(-1),
                message: stderr.trim().to_string(),
            });
        }

        Ok(self.expected_path(dest_dir))
    }
}

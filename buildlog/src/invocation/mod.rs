// SPDX-License-Identifier: GPL-3.0-or-later

//! This module provides the normalized record of a tool invocation.
//!
//! An [`Invocation`] describes one observed tool execution: which tool was
//! run, which files it read, which files it produced and which extra
//! arguments it received. Input paths are made portable by stripping a
//! configured [`SourceRoot`] prefix and normalizing the rest; outputs and
//! arguments are kept as given.
//!
//! The source root is process-wide configuration. It is installed at most
//! once with [`set_source_root`], before any invocation is constructed, and
//! read back with [`SourceRoot::global`]. Callers who prefer explicit
//! configuration can build a [`SourceRoot`] and pass it directly.

pub mod compiler;
pub mod recognition;

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// The value installed by [`set_source_root`].
static SOURCE_ROOT: OnceLock<SourceRoot> = OnceLock::new();

/// Used when no source root was ever installed.
static NO_SOURCE_ROOT: SourceRoot = SourceRoot(None);

/// A path prefix stripped from input paths before they are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRoot(Option<PathBuf>);

impl SourceRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Some(path.into()))
    }

    /// A source root that does not strip anything.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn path(&self) -> Option<&Path> {
        self.0.as_deref()
    }

    /// Returns the process-wide source root, or an empty one if it was
    /// never set.
    pub fn global() -> &'static SourceRoot {
        SOURCE_ROOT.get().unwrap_or(&NO_SOURCE_ROOT)
    }

    /// Strips the root prefix (when it matches) and normalizes the rest.
    ///
    /// Prefix matching is done on whole path components, so `/src` does
    /// not match `/srcdir/main.c`. The filesystem is never consulted.
    pub fn relativize(&self, path: &Path) -> PathBuf {
        let stripped = match self.path() {
            Some(root) => match path.strip_prefix(root) {
                Ok(relative) => {
                    debug!("Stripped source root {} from {}", root.display(), path.display());
                    relative
                }
                Err(_) => path,
            },
            None => path,
        };
        normalize(stripped)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceRootError {
    #[error("Source root is already set to '{current}'")]
    AlreadySet { current: String },
}

/// Installs the process-wide source root.
///
/// It can be set only once per process. It must happen before invocations
/// are constructed: values are captured at construction time, and earlier
/// invocations are never re-normalized.
pub fn set_source_root(root: impl Into<PathBuf>) -> Result<(), SourceRootError> {
    SOURCE_ROOT.set(SourceRoot::new(root)).map_err(|_| SourceRootError::AlreadySet {
        current: SourceRoot::global()
            .path()
            .map(|path| path.display().to_string())
            .unwrap_or_default(),
    })
}

/// Syntactic path normalization.
///
/// Removes `.` components and redundant separators, and resolves `..`
/// against a preceding normal component. A `..` directly under the root is
/// dropped, while leading `..` components of a relative path are kept.
/// An empty result is rendered as `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    if components.is_empty() {
        PathBuf::from(".")
    } else {
        components.iter().collect()
    }
}

/// Normalized record of one tool execution.
///
/// The record is append-only: inputs, outputs and arguments can be added
/// while the caller describes the execution, but never removed.
///
/// The source root is not part of the record. It is not serialized and not
/// compared, so a deserialized invocation has no root: inputs added to it
/// are normalized, but not stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    tool: String,
    inputs: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
    args: Vec<String>,
    #[serde(skip)]
    root: SourceRoot,
}

impl PartialEq for Invocation {
    fn eq(&self, other: &Self) -> bool {
        self.tool == other.tool
            && self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.args == other.args
    }
}

impl Invocation {
    /// Creates an empty invocation of the given tool.
    pub fn new(tool: impl Into<String>, root: &SourceRoot) -> Self {
        Self {
            tool: tool.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            args: Vec::new(),
            root: root.clone(),
        }
    }

    /// Creates an invocation with all of its parts at once.
    ///
    /// Inputs go through the same normalization as [`Invocation::add_input`].
    pub fn with<I, O, A>(tool: impl Into<String>, inputs: I, outputs: O, args: A, root: &SourceRoot) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<Path>,
        O: IntoIterator,
        O::Item: Into<PathBuf>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let mut invocation = Self::new(tool, root);
        for input in inputs {
            invocation.add_input(input);
        }
        for output in outputs {
            invocation.add_output(output);
        }
        for arg in args {
            invocation.add_arg(arg);
        }
        invocation
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Appends an input file, relative to the source root and normalized.
    ///
    /// Duplicates and nonexistent paths are accepted.
    pub fn add_input(&mut self, path: impl AsRef<Path>) {
        let input = self.root.relativize(path.as_ref());
        self.inputs.push(input);
    }

    /// Appends an output file verbatim.
    pub fn add_output(&mut self, path: impl Into<PathBuf>) {
        self.outputs.push(path.into());
    }

    /// Appends a raw argument which is not classified otherwise.
    pub fn add_arg(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }
}

/// Renders as `tool input-basenames > outputs`.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tool)?;
        for input in &self.inputs {
            match input.file_name() {
                Some(name) => write!(f, " {}", Path::new(name).display())?,
                None => write!(f, " {}", input.display())?,
            }
        }
        write!(f, " >")?;
        for output in &self.outputs {
            write!(f, " {}", output.display())?;
        }
        Ok(())
    }
}

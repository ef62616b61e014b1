// SPDX-License-Identifier: GPL-3.0-or-later

//! Command-line parser for C-family compiler drivers.
//!
//! The parser takes an already tokenized argument vector (the arguments
//! following the compiler executable) and classifies every token into one
//! of the groups of a [`CompilerInvocation`]:
//!
//! - `-I`, `-L` and `-l` take a value, either glued (`-Iinc`) or as the
//!   next argument (`-I inc`). The value lands in the includes, library
//!   directories or libraries list.
//! - `-o` takes the next argument as an explicit output.
//! - Any other argument starting with `-` is kept as an opaque flag.
//! - Everything else is an input file.
//!
//! When no explicit output was given, one object file name is derived from
//! the first input. Later inputs do not get their own output; that matches
//! the records produced by earlier versions of the log tooling.

use super::{Invocation, SourceRoot};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::fmt;
use std::ops::Deref;
use std::path::{Component, PathBuf};
use thiserror::Error;

/// The extension of the synthesized object file name.
pub const DEFAULT_OBJECT_EXTENSION: &str = "o";

/// Compiler families with a dedicated parser entry point.
///
/// They differ only in the tool identifier stored in the result, the
/// argument classification is shared.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerFamily {
    #[serde(alias = "gnu")]
    Gcc,
    #[serde(alias = "llvm")]
    Clang,
}

impl CompilerFamily {
    /// The tool identifier stored in parsed invocations.
    pub fn tool(&self) -> &'static str {
        match self {
            CompilerFamily::Gcc => "gcc",
            CompilerFamily::Clang => "clang",
        }
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompilerFamily::Gcc => "GCC",
            CompilerFamily::Clang => "Clang",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A flag which requires a value was the last argument.
    #[error("Malformed invocation: flag '{flag}' requires a value")]
    MalformedInvocation { flag: String },
}

/// The list a prefixed flag value belongs to.
#[derive(Copy, Clone, Debug, PartialEq)]
enum ListKind {
    Include,
    LibraryDirectory,
    Library,
}

/// Flags which take a value, glued or separate. Checked before anything else.
const LIST_FLAGS: [(&str, ListKind); 3] = [
    ("-I", ListKind::Include),
    ("-L", ListKind::LibraryDirectory),
    ("-l", ListKind::Library),
];

const OUTPUT_FLAG: &str = "-o";

/// A compiler invocation with its arguments classified.
///
/// Every argument of the original vector ends up in exactly one of the
/// include, library directory, library, output, flag or input lists.
/// The `defines` list is reserved, the parser does not fill it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerInvocation {
    #[serde(flatten)]
    invocation: Invocation,
    defines: Vec<String>,
    includes: Vec<String>,
    libdirs: Vec<String>,
    libraries: Vec<String>,
    flags: Vec<String>,
}

impl CompilerInvocation {
    /// Parses the arguments of a compiler with the default object extension.
    pub fn parse<I>(family: CompilerFamily, arguments: I, root: &SourceRoot) -> Result<Self, ParseError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Parser::new(family).parse(arguments, root)
    }

    pub fn gcc<I>(arguments: I, root: &SourceRoot) -> Result<Self, ParseError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::parse(CompilerFamily::Gcc, arguments, root)
    }

    pub fn clang<I>(arguments: I, root: &SourceRoot) -> Result<Self, ParseError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::parse(CompilerFamily::Clang, arguments, root)
    }

    fn empty(family: CompilerFamily, root: &SourceRoot) -> Self {
        Self {
            invocation: Invocation::new(family.tool(), root),
            defines: Vec::new(),
            includes: Vec::new(),
            libdirs: Vec::new(),
            libraries: Vec::new(),
            flags: Vec::new(),
        }
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn defines(&self) -> &[String] {
        &self.defines
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn libdirs(&self) -> &[String] {
        &self.libdirs
    }

    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<String> {
        match kind {
            ListKind::Include => &mut self.includes,
            ListKind::LibraryDirectory => &mut self.libdirs,
            ListKind::Library => &mut self.libraries,
        }
    }

    /// Derives the output from the first input, when there is no explicit one.
    fn synthesize_output(&mut self, extension: &str) {
        if !self.invocation.outputs().is_empty() {
            return;
        }
        let Some(first) = self.invocation.inputs().first() else {
            return;
        };
        // Same as the base name of the input with its extension removed.
        // Inputs like `.` or `..` have no stem, their base name is used as is.
        let mut name = match first.file_stem() {
            Some(stem) => stem.to_os_string(),
            None => match first.components().next_back() {
                Some(component @ (Component::CurDir | Component::ParentDir)) => {
                    component.as_os_str().to_os_string()
                }
                _ => OsString::new(),
            },
        };
        name.push(".");
        name.push(extension);
        let output = PathBuf::from(name);
        debug!("Synthesized output {} from input {}", output.display(), first.display());
        self.invocation.add_output(output);
    }
}

impl Deref for CompilerInvocation {
    type Target = Invocation;

    fn deref(&self) -> &Self::Target {
        &self.invocation
    }
}

impl fmt::Display for CompilerInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.invocation, f)
    }
}

/// Folds the classified arguments back into a generic invocation.
///
/// The prefixed values are rendered in glued form (`-Iinc`), followed by
/// the opaque flags, in the `args` of the result.
impl From<CompilerInvocation> for Invocation {
    fn from(value: CompilerInvocation) -> Self {
        let mut invocation = value.invocation;
        let prefixed = [
            ("-I", value.includes),
            ("-L", value.libdirs),
            ("-l", value.libraries),
        ];
        for (prefix, values) in prefixed {
            for item in values {
                invocation.add_arg(format!("{prefix}{item}"));
            }
        }
        for flag in value.flags {
            invocation.add_arg(flag);
        }
        invocation
    }
}

/// Compiler argument parser.
///
/// Holds the settings which are fixed for a run: the compiler family and
/// the extension used for synthesized outputs.
#[derive(Debug, Clone)]
pub struct Parser {
    family: CompilerFamily,
    object_extension: String,
}

impl Parser {
    pub fn new(family: CompilerFamily) -> Self {
        Self { family, object_extension: DEFAULT_OBJECT_EXTENSION.to_string() }
    }

    /// Sets the extension (without the dot) of synthesized output names.
    pub fn with_object_extension(mut self, extension: impl Into<String>) -> Self {
        self.object_extension = extension.into();
        self
    }

    pub fn family(&self) -> CompilerFamily {
        self.family
    }

    /// Classifies the arguments in a single left-to-right pass.
    ///
    /// The result is returned only when the whole vector was consumed.
    pub fn parse<I>(&self, arguments: I, root: &SourceRoot) -> Result<CompilerInvocation, ParseError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut queue: VecDeque<String> = arguments.into_iter().map(Into::into).collect();
        let mut result = CompilerInvocation::empty(self.family, root);

        while let Some(argument) = queue.pop_front() {
            let prefixed = LIST_FLAGS
                .iter()
                .find_map(|(prefix, kind)| argument.strip_prefix(*prefix).map(|rest| (*kind, rest)));

            if let Some((kind, rest)) = prefixed {
                let value = if rest.is_empty() {
                    take_value(&mut queue, &argument)?
                } else {
                    rest.to_string()
                };
                result.list_mut(kind).push(value);
            } else if argument == OUTPUT_FLAG {
                let value = take_value(&mut queue, &argument)?;
                result.invocation.add_output(value);
            } else if argument.starts_with('-') {
                result.flags.push(argument);
            } else {
                result.invocation.add_input(&argument);
            }
        }

        result.synthesize_output(&self.object_extension);
        Ok(result)
    }
}

/// Takes the value of a flag from the front of the queue.
fn take_value(queue: &mut VecDeque<String>, flag: &str) -> Result<String, ParseError> {
    queue
        .pop_front()
        .ok_or_else(|| ParseError::MalformedInvocation { flag: flag.to_string() })
}

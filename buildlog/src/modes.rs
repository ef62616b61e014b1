// SPDX-License-Identifier: GPL-3.0-or-later

//! The modes the application can run in.
//!
//! - single: parse one compiler command given on the command line.
//! - batch: parse every command line of a build log file.
//!
//! Both modes classify the commands the same way: recognized compilers are
//! parsed into a [`CompilerInvocation`], anything else is recorded as a
//! generic [`Invocation`] with its arguments kept verbatim.

use crate::args;
use crate::config;
use crate::invocation::compiler::{CompilerInvocation, ParseError, Parser};
use crate::invocation::recognition::Recognizer;
use crate::invocation::{self, Invocation, SourceRoot, SourceRootError};
use crate::output::{Destination, OutputWriter, WriterCreationError};
use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// One parsed line of a build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Compiler(CompilerInvocation),
    Generic(Invocation),
}

/// Turns command lines into records.
pub struct Analyzer {
    recognizer: Recognizer,
    object_extension: String,
}

impl From<&config::Main> for Analyzer {
    fn from(config: &config::Main) -> Self {
        Self {
            recognizer: Recognizer::new(&config.compilers),
            object_extension: config.object_extension.clone(),
        }
    }
}

impl Analyzer {
    /// Classifies the arguments of the given executable.
    ///
    /// Only the compiler parser can fail; other tools are accepted as they are.
    pub fn analyze(&self, executable: &str, arguments: &[String], root: &SourceRoot) -> Result<Record, ParseError> {
        match self.recognizer.recognize(Path::new(executable)) {
            Some(family) => {
                let parser = Parser::new(family).with_object_extension(self.object_extension.as_str());
                log::debug!("Recognized {executable} as {} compiler", parser.family());
                parser.parse(arguments.iter().cloned(), root).map(Record::Compiler)
            }
            None => {
                log::debug!("Not a compiler: {executable}");
                let invocation = Invocation::with(
                    executable,
                    Vec::<PathBuf>::new(),
                    Vec::<PathBuf>::new(),
                    arguments.iter().cloned(),
                    root,
                );
                Ok(Record::Generic(invocation))
            }
        }
    }

    /// Parses a build log, one shell command line per line.
    ///
    /// Empty lines and `#` comments are skipped. Lines which can't be
    /// tokenized or parsed are reported and skipped.
    pub fn analyze_log(&self, content: &str, root: &SourceRoot) -> Vec<Record> {
        content
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    return None;
                }
                let words = match shell_words::split(line) {
                    Ok(words) => words,
                    Err(error) => {
                        log::warn!("Line {}: can't tokenize: {error}", idx + 1);
                        return None;
                    }
                };
                let (executable, arguments) = words.split_first()?;
                match self.analyze(executable, arguments, root) {
                    Ok(record) => Some(record),
                    Err(error) => {
                        log::warn!("Line {}: {error}", idx + 1);
                        None
                    }
                }
            })
            .collect()
    }
}

/// Represent the modes the application can run in.
pub enum Mode {
    Single { analyzer: Analyzer, command: Vec<String>, writer: OutputWriter },
    Batch { analyzer: Analyzer, input: PathBuf, writer: OutputWriter },
}

impl Mode {
    /// Configure the application mode based on the command line arguments and the configuration.
    ///
    /// This is the place where the process-wide source root gets installed, before
    /// any invocation is constructed.
    pub fn configure(args: args::Arguments, config: config::Main) -> Result<Self, ConfigurationError> {
        let source_root = args.source_root.map(PathBuf::from).or_else(|| config.source_root.clone());
        if let Some(root) = source_root {
            log::debug!("Source root: {}", root.display());
            invocation::set_source_root(root).map_err(ConfigurationError::SourceRoot)?;
        }

        let analyzer = Analyzer::from(&config);
        let writer = OutputWriter::try_from(Destination::from(args.output.as_deref()))
            .map_err(ConfigurationError::ConsumerCreation)?;

        match args.mode {
            args::Mode::Single { command } => {
                log::debug!("Mode: parse a single command");
                Ok(Self::Single { analyzer, command, writer })
            }
            args::Mode::Batch { input } => {
                log::debug!("Mode: parse a build log");
                Ok(Self::Batch { analyzer, input: PathBuf::from(input), writer })
            }
        }
    }

    /// It actually runs the application mode.
    pub fn run(self) -> ExitCode {
        self.execute().unwrap_or_else(|error| {
            log::error!("buildlog: {error:#}");
            ExitCode::FAILURE
        })
    }

    fn execute(self) -> anyhow::Result<ExitCode> {
        let root = SourceRoot::global();
        match self {
            Self::Single { analyzer, command, writer } => {
                let (executable, arguments) = command.split_first().context("Missing compiler command")?;
                match analyzer.analyze(executable, arguments, root) {
                    Ok(record) => {
                        writer.write_one(&record)?;
                        Ok(ExitCode::SUCCESS)
                    }
                    Err(error) => {
                        log::error!("buildlog: {error}");
                        Ok(ExitCode::FAILURE)
                    }
                }
            }
            Self::Batch { analyzer, input, writer } => {
                let content = fs::read_to_string(&input)
                    .with_context(|| format!("Failed to read build log: {}", input.display()))?;
                let records = analyzer.analyze_log(&content, root);
                log::info!("Parsed {} records from {}", records.len(), input.display());
                writer.write_all(records.into_iter())?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to set the source root: {0}")]
    SourceRoot(SourceRootError),
    #[error("Failed to create output: {0}")]
    ConsumerCreation(WriterCreationError),
}

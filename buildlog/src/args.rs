// SPDX-License-Identifier: GPL-3.0-or-later

//! This module contains the command line interface of the application.
//!
//! The command line parsing is implemented using the `clap` library.
//! The `Arguments` type represents all possible invocations of the program.

use anyhow::anyhow;
use clap::{ArgAction, ArgMatches, Command, arg, command};
use std::fmt;

/// Represents the command line arguments of the application.
#[derive(Debug, PartialEq)]
pub struct Arguments {
    // The path of the configuration file.
    pub config: Option<String>,
    // Overrides the source root of the configuration file.
    pub source_root: Option<String>,
    // The path of the output file, standard output when missing.
    pub output: Option<String>,
    pub verbose: u8,
    pub mode: Mode,
}

/// Represents the mode of the application.
#[derive(Debug, PartialEq)]
pub enum Mode {
    /// Parse one compiler invocation given on the command line.
    Single { command: Vec<String> },
    /// Parse every command line of a build log file.
    Batch { input: String },
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(matches: ArgMatches) -> Result<Self, Self::Error> {
        let config = matches.get_one::<String>("config").cloned();
        let source_root = matches.get_one::<String>("source-root").cloned();
        let output = matches.get_one::<String>("output").cloned();
        let verbose = matches.get_count("verbose");

        let mode = match (matches.get_one::<String>("input"), matches.get_many::<String>("COMMAND")) {
            (Some(input), None) => Mode::Batch { input: input.clone() },
            (None, Some(command)) => Mode::Single { command: command.cloned().collect() },
            _ => return Err(anyhow!("either a command or an input file is expected")),
        };

        Ok(Arguments { config, source_root, output, verbose, mode })
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Arguments:")?;
        writeln!(f, "  config: {:?}", self.config)?;
        writeln!(f, "  source root: {:?}", self.source_root)?;
        writeln!(f, "  output: {:?}", self.output)?;
        match &self.mode {
            Mode::Single { command } => write!(f, "  command: {:?}", command),
            Mode::Batch { input } => write!(f, "  input: {}", input),
        }
    }
}

/// Represents the command line interface of the application.
pub fn cli() -> Command {
    command!()
        .arg_required_else_help(true)
        .args(&[
            arg!(-v --verbose ... "Sets the level of verbosity").action(ArgAction::Count),
            arg!(-c --config <FILE> "Path of the config file"),
            arg!(--"source-root" <DIR> "Prefix stripped from input paths"),
            arg!(-o --output <FILE> "Path of the result file (standard output by default)"),
            arg!(-i --input <FILE> "Build log with one compiler command per line").conflicts_with("COMMAND"),
            arg!(<COMMAND> "Compiler command")
                .action(ArgAction::Append)
                .value_terminator("--")
                .num_args(1..)
                .last(true)
                .required(false)
                .required_unless_present("input"),
        ])
}

// SPDX-License-Identifier: GPL-3.0-or-later

//! This module is responsible for writing the parsed records.
//!
//! The records are written as JSON, either to the standard output or to a
//! file. A single record is written as an object, a batch as an array.

pub mod json;

use serde::Serialize;
use std::path::PathBuf;
use std::{fs, io};
use thiserror::Error;

/// Where the output goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl From<Option<&str>> for Destination {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some("-") | None => Destination::Stdout,
            Some(path) => Destination::File(PathBuf::from(path)),
        }
    }
}

/// Writes records as JSON to the configured destination.
pub struct OutputWriter {
    output: io::BufWriter<Box<dyn io::Write>>,
    destination: Destination,
}

impl TryFrom<Destination> for OutputWriter {
    type Error = WriterCreationError;

    fn try_from(destination: Destination) -> Result<Self, Self::Error> {
        let output: Box<dyn io::Write> = match &destination {
            Destination::Stdout => Box::new(io::stdout()),
            Destination::File(path) => {
                let file = fs::File::create(path).map_err(|err| WriterCreationError::Io(path.clone(), err))?;
                Box::new(file)
            }
        };

        Ok(Self { output: io::BufWriter::new(output), destination })
    }
}

impl OutputWriter {
    /// Writes a single record as a JSON object.
    pub fn write_one<T: Serialize>(mut self, record: &T) -> Result<(), WriterError> {
        json::serialize_one(&mut self.output, record).map_err(|err| self.error(err))?;
        self.flush()
    }

    /// Writes the records as a JSON array.
    pub fn write_all<T: Serialize>(mut self, records: impl Iterator<Item = T>) -> Result<(), WriterError> {
        json::serialize_seq(&mut self.output, records).map_err(|err| self.error(err))?;
        self.flush()
    }

    fn flush(mut self) -> Result<(), WriterError> {
        use io::Write;

        self.output.flush().map_err(|err| self.error(serde_json::Error::io(err)))
    }

    fn error(&self, source: serde_json::Error) -> WriterError {
        WriterError::Serialization { destination: self.destination.clone(), source }
    }
}

/// Represents errors that can occur while creating an output writer.
#[derive(Error, Debug)]
pub enum WriterCreationError {
    #[error("Failed to create the output file {0}: {1}")]
    Io(PathBuf, io::Error),
}

/// Represents errors that can occur while writing output.
#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Failed to write output to {destination:?}: {source}")]
    Serialization {
        destination: Destination,
        #[source]
        source: serde_json::Error,
    },
}

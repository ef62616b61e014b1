// SPDX-License-Identifier: GPL-3.0-or-later

//! JSON serialization of the records.
//!
//! Batches are written as a JSON array, element by element, so the records
//! don't have to be collected in memory first. It's *not* JSON lines format.

use serde::Serialize;
use serde::ser::{SerializeSeq, Serializer};
use std::io;

/// Serialize a single record as a pretty printed JSON object.
pub fn serialize_one<W, T>(mut writer: W, record: &T) -> Result<(), serde_json::Error>
where
    W: io::Write,
    T: Serialize,
{
    serde_json::to_writer_pretty(&mut writer, record)?;
    writeln!(writer).map_err(serde_json::Error::io)
}

/// Serialize records from an iterator into a JSON array.
pub fn serialize_seq<W, T>(mut writer: W, records: impl Iterator<Item = T>) -> Result<(), serde_json::Error>
where
    W: io::Write,
    T: Serialize,
{
    let mut ser = serde_json::Serializer::pretty(&mut writer);
    let mut seq = ser.serialize_seq(None)?;
    for record in records {
        seq.serialize_element(&record)?;
    }
    seq.end()?;
    writeln!(writer).map_err(serde_json::Error::io)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnostic::Diagnostic;
    use serde_json::{Value, json};

    #[test]
    fn test_serialize_empty_seq() {
        let mut buffer = Vec::new();
        serialize_seq(&mut buffer, std::iter::empty::<Diagnostic>()).unwrap();

        let value: Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(json!([]), value);
    }

    #[test]
    fn test_serialize_seq_keeps_order() {
        let records = vec![Diagnostic::new("a.c", 1, 1, "first"), Diagnostic::new("b.c", 2, 2, "second")];

        let mut buffer = Vec::new();
        serialize_seq(&mut buffer, records.clone().into_iter()).unwrap();

        let result: Vec<Diagnostic> = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(records, result);
    }

    #[test]
    fn test_serialize_one_ends_with_newline() {
        let mut buffer = Vec::new();
        serialize_one(&mut buffer, &Diagnostic::new("a.c", 1, 1, "m")).unwrap();

        assert_eq!(Some(&b'\n'), buffer.last());
        let value: Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(json!("a.c"), value["filename"]);
    }
}

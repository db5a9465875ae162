//! Streaming decoder for a top-level JSON array.
//!
//! Reads one array element at a time from an `io::Read`, so exports bounded
//! only by disk can be processed without holding the whole document tree in
//! memory.

use std::io::{self, BufReader, Read};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{PipelineError, Result};

enum State {
    /// The opening `[` has not been consumed yet.
    Start,
    /// Positioned before the next element or the closing `]`.
    InArray { first: bool },
    Done,
}

/// Lazy iterator over the elements of a top-level JSON array.
///
/// Yields one decoded [`Value`] per array element. The first `next()` call
/// fails if the document does not start with `[`; any malformed element or
/// delimiter ends the stream with an error.
pub struct RecordStream<R: Read> {
    reader: BufReader<R>,
    state: State,
}

impl<R: Read> RecordStream<R> {
    pub fn new(reader: R) -> Self {
        RecordStream {
            reader: BufReader::new(reader),
            state: State::Start,
        }
    }

    /// Read the next byte that is not JSON whitespace.
    fn next_token(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte)? {
                0 => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "unexpected end of JSON input",
                    )
                    .into())
                }
                _ => {
                    if !matches!(byte[0], b' ' | b'\t' | b'\n' | b'\r') {
                        return Ok(byte[0]);
                    }
                }
            }
        }
    }

    /// Decode one JSON value whose first byte has already been consumed.
    fn parse_value(&mut self, first: u8) -> Result<Value> {
        let prefixed = io::Cursor::new([first]).chain(&mut self.reader);
        let mut de = serde_json::Deserializer::from_reader(prefixed);
        Ok(Value::deserialize(&mut de)?)
    }

    fn next_record(&mut self) -> Result<Option<Value>> {
        loop {
            match self.state {
                State::Done => return Ok(None),
                State::Start => {
                    let token = self.next_token()?;
                    if token != b'[' {
                        return Err(PipelineError::NotAnArray {
                            found: token as char,
                        });
                    }
                    self.state = State::InArray { first: true };
                }
                State::InArray { first } => {
                    let token = self.next_token()?;
                    if token == b']' {
                        self.state = State::Done;
                        return Ok(None);
                    }
                    let lead = if first {
                        token
                    } else {
                        if token != b',' {
                            return Err(PipelineError::Malformed(format!(
                                "expected ',' or ']' between array elements, found '{}'",
                                token as char
                            )));
                        }
                        self.next_token()?
                    };
                    let value = self.parse_value(lead)?;
                    self.state = State::InArray { first: false };
                    return Ok(Some(value));
                }
            }
        }
    }
}

impl<R: Read> Iterator for RecordStream<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => None,
            Err(err) => {
                // Stream is unusable after any error
                self.state = State::Done;
                Some(Err(err))
            }
        }
    }
}

//! Intel HEX as a byte source.
//!
//! [`IntelHexReader`] reads `:LLAAAATT[DD...]CC` records one at a time and yields the data bytes
//! of each data record, in file order, as a single stream. record addresses are reported on
//! [`Record`] but not used to place or sort bytes: a listing of the stream labels bytes by their
//! position in it.

use core::str::Lines;

use tracing::{debug, warn};
use yaxpeax_arch::{Reader, ReadError};

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum RecordKind {
    Data,
    EndOfFile,
    ExtendedSegmentAddress,
    StartSegmentAddress,
    ExtendedLinearAddress,
    StartLinearAddress,
    Other(u8),
}

impl From<u8> for RecordKind {
    fn from(kind: u8) -> Self {
        match kind {
            0x00 => RecordKind::Data,
            0x01 => RecordKind::EndOfFile,
            0x02 => RecordKind::ExtendedSegmentAddress,
            0x03 => RecordKind::StartSegmentAddress,
            0x04 => RecordKind::ExtendedLinearAddress,
            0x05 => RecordKind::StartLinearAddress,
            other => RecordKind::Other(other),
        }
    }
}

/// one parsed line of an Intel HEX file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordKind,
    pub address: u16,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("line {line}: record does not start with `:`")]
    MissingStartCode { line: usize },
    #[error("line {line}: invalid hex digit `{digit}`")]
    InvalidDigit { line: usize, digit: char },
    #[error("line {line}: odd number of hex digits")]
    OddLength { line: usize },
    #[error("line {line}: record is too short")]
    TooShort { line: usize },
    #[error("line {line}: byte count says {declared} data bytes, record has {actual}")]
    LengthMismatch { line: usize, declared: usize, actual: usize },
    #[error("line {line}: checksum mismatch (sum={sum:#04x})")]
    Checksum { line: usize, sum: u8 },
}

impl HexError {
    /// a fixed description of this kind of error, for `ReadError::IOError`.
    pub fn description(&self) -> &'static str {
        match self {
            HexError::MissingStartCode { .. } => "intel hex record does not start with `:`",
            HexError::InvalidDigit { .. } => "invalid hex digit in intel hex record",
            HexError::OddLength { .. } => "odd number of hex digits in intel hex record",
            HexError::TooShort { .. } => "intel hex record is too short",
            HexError::LengthMismatch { .. } => "intel hex byte count does not match record length",
            HexError::Checksum { .. } => "intel hex record checksum mismatch",
        }
    }
}

impl Record {
    /// parse one record. `line` is only used to label errors.
    pub fn parse(text: &str, line: usize) -> Result<Record, HexError> {
        let digits = text.strip_prefix(':').ok_or(HexError::MissingStartCode { line })?;
        let bytes = hex_to_bytes(digits, line)?;
        // count, two address bytes, kind, checksum
        if bytes.len() < 5 {
            return Err(HexError::TooShort { line });
        }

        let declared = bytes[0] as usize;
        let actual = bytes.len() - 5;
        if declared != actual {
            return Err(HexError::LengthMismatch { line, declared, actual });
        }

        let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        if sum != 0 {
            return Err(HexError::Checksum { line, sum });
        }

        Ok(Record {
            kind: RecordKind::from(bytes[3]),
            address: u16::from_be_bytes([bytes[1], bytes[2]]),
            data: bytes[4..bytes.len() - 1].to_vec(),
        })
    }
}

fn hex_to_bytes(digits: &str, line: usize) -> Result<Vec<u8>, HexError> {
    let nibble = |c: char| c.to_digit(16).map(|d| d as u8).ok_or(HexError::InvalidDigit { line, digit: c });
    let chars: Vec<char> = digits.chars().collect();
    if chars.len() % 2 != 0 {
        return Err(HexError::OddLength { line });
    }
    chars
        .chunks(2)
        .map(|pair| Ok((nibble(pair[0])? << 4) | nibble(pair[1])?))
        .collect()
}

/// a `yaxpeax_arch::Reader` over the data bytes of an Intel HEX file.
///
/// blank lines are skipped, as are records other than data and end-of-file. an end-of-file record,
/// or the end of the text, exhausts the reader. a malformed record ends the stream with
/// `ReadError::IOError`; the full error is then available from [`IntelHexReader::error`].
pub struct IntelHexReader<'a> {
    lines: Lines<'a>,
    line: usize,
    data: Vec<u8>,
    position: usize,
    finished: bool,
    error: Option<HexError>,
    start: u16,
    mark: u16,
    offset: u16,
}

impl<'a> IntelHexReader<'a> {
    pub fn new(text: &'a str) -> Self {
        IntelHexReader {
            lines: text.lines(),
            line: 0,
            data: Vec::new(),
            position: 0,
            finished: false,
            error: None,
            start: 0,
            mark: 0,
            offset: 0,
        }
    }

    /// the malformed record that stopped this reader, if any.
    pub fn error(&self) -> Option<&HexError> {
        self.error.as_ref()
    }

    fn load_record(&mut self) {
        let text = match self.lines.next() {
            Some(text) => text.trim(),
            None => {
                self.finished = true;
                return;
            }
        };
        self.line += 1;
        if text.is_empty() {
            return;
        }

        match Record::parse(text, self.line) {
            Ok(record) => match record.kind {
                RecordKind::Data => {
                    debug!(line = self.line, address = record.address, len = record.data.len(), "data record");
                    self.data = record.data;
                    self.position = 0;
                }
                RecordKind::EndOfFile => {
                    debug!(line = self.line, "end of file record");
                    self.finished = true;
                }
                other => {
                    debug!(line = self.line, kind = ?other, "skipping record");
                }
            },
            Err(e) => {
                warn!(error = %e, "malformed intel hex record");
                self.error = Some(e);
                self.finished = true;
            }
        }
    }
}

impl<'a> Reader<u16, u8> for IntelHexReader<'a> {
    fn next(&mut self) -> Result<u8, ReadError> {
        loop {
            if let Some(byte) = self.data.get(self.position) {
                self.position += 1;
                self.offset = self.offset.wrapping_add(1);
                return Ok(*byte);
            }
            if self.finished {
                return match self.error.as_ref() {
                    Some(e) => Err(ReadError::IOError(e.description())),
                    None => Err(ReadError::ExhaustedInput),
                };
            }
            self.load_record();
        }
    }

    fn next_n(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        // bytes read before a failure stay consumed.
        for b in buf.iter_mut() {
            *b = self.next()?;
        }
        Ok(())
    }

    fn mark(&mut self) {
        self.mark = self.offset;
    }

    fn offset(&mut self) -> u16 {
        self.offset.wrapping_sub(self.mark)
    }

    fn total_offset(&mut self) -> u16 {
        self.offset.wrapping_sub(self.start)
    }
}

//! decoding a whole byte stream into listing tokens.

use std::collections::VecDeque;

use tracing::{debug, instrument, trace, warn};
use yaxpeax_arch::{Reader, ReadError, U8Reader};

use crate::display::{render, render_with, Listing, ListingOptions};
use crate::{DecodeError, DescriptorTable, Token};

/// where a [`Disassembler`] is between calls to [`Disassembler::step`].
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum State {
    /// between instructions; the next byte read is an opcode.
    Idle,
    /// an opcode has been read and its operands are being read.
    DecodingInstruction,
    /// the byte source ran out (or failed). no more tokens will be produced.
    Exhausted,
}

/// something that went wrong at `address` while decoding. the token stream carries on past
/// unknown opcodes; a read failure ends it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    pub address: u32,
    pub error: DecodeError,
}

/// the complete output of a [`Disassembler`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Disassembly {
    pub tokens: Vec<Token>,
    pub faults: Vec<Fault>,
}

impl Disassembly {
    /// render the tokens as a listing with default [`ListingOptions`].
    pub fn render(&self) -> Listing {
        render(&self.tokens)
    }

    /// render the tokens as a listing with `options`.
    pub fn render_with(&self, options: &ListingOptions) -> Listing {
        render_with(&self.tokens, options)
    }
}

/// the byte source as seen while decoding: counts every byte read and remembers the ones read
/// for the instruction in progress.
struct Cursor<R> {
    source: R,
    program_counter: u32,
    consumed: Vec<u8>,
}

impl<R: Reader<u16, u8>> Reader<u16, u8> for Cursor<R> {
    fn next(&mut self) -> Result<u8, ReadError> {
        let byte = self.source.next()?;
        self.program_counter += 1;
        self.consumed.push(byte);
        Ok(byte)
    }

    fn next_n(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        for b in buf.iter_mut() {
            *b = self.next()?;
        }
        Ok(())
    }

    fn mark(&mut self) {
        self.source.mark();
    }

    fn offset(&mut self) -> u16 {
        self.source.offset()
    }

    fn total_offset(&mut self) -> u16 {
        self.source.total_offset()
    }
}

/// a state machine that decodes a byte source into [`Token`]s, one instruction at a time.
///
/// every byte read is accounted for in the output. a fully decoded instruction becomes
/// `Address, Opcode, <operands>.., EndOfInstruction`. an opcode with no matching descriptor
/// becomes `Address, RawByte, EndOfInstruction`, and decoding resumes with the next byte. if the
/// source runs out partway through an instruction, the bytes read for it are emitted as
/// `Address, RawByte..` with no `EndOfInstruction`, and the stream ends.
///
/// `Disassembler` is an `Iterator` over tokens and only reads from the source when it runs out of
/// decoded tokens to hand out, so dropping it early leaves the rest of the source unread.
pub struct Disassembler<'t, R> {
    table: &'t DescriptorTable,
    cursor: Cursor<R>,
    state: State,
    pending: Vec<Token>,
    ready: VecDeque<Token>,
    faults: Vec<Fault>,
}

impl<'t, R: Reader<u16, u8>> Disassembler<'t, R> {
    /// a disassembler at program counter 0, reading from `source` and dispatching through `table`.
    pub fn new(table: &'t DescriptorTable, source: R) -> Self {
        Disassembler {
            table,
            cursor: Cursor {
                source,
                program_counter: 0,
                consumed: Vec::new(),
            },
            state: State::Idle,
            pending: Vec::new(),
            ready: VecDeque::new(),
            faults: Vec::new(),
        }
    }

    /// the current state of the decoder.
    pub fn state(&self) -> State {
        self.state
    }

    /// the number of bytes read from the source so far.
    pub fn program_counter(&self) -> u32 {
        self.cursor.program_counter
    }

    /// faults seen so far, in stream order.
    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    /// decode one instruction (or run out trying), queueing its tokens.
    pub fn step(&mut self) -> State {
        if self.state == State::Exhausted {
            return self.state;
        }

        let address = self.cursor.program_counter;
        match self.decode_instruction(address) {
            Ok(()) => {
                self.pending.push(Token::EndOfInstruction);
                trace!(address, tokens = ?self.pending, "decoded instruction");
                self.ready.extend(self.pending.drain(..));
                self.cursor.consumed.clear();
                self.state = State::Idle;
            }
            Err(error @ DecodeError::UnknownOpcode(opcode)) => {
                warn!(address, opcode, "no descriptor matches opcode");
                self.faults.push(Fault { address, error });
                self.pending.clear();
                self.cursor.consumed.clear();
                self.ready.extend([Token::Address(address), Token::RawByte(opcode), Token::EndOfInstruction].iter().copied());
                self.state = State::Idle;
            }
            Err(error) => {
                if let DecodeError::ReadFailed(cause) = error {
                    warn!(address, cause, "byte source failed");
                    self.faults.push(Fault { address, error });
                }
                self.flush_partial();
                debug!(program_counter = self.cursor.program_counter, "byte source exhausted");
                self.state = State::Exhausted;
            }
        }
        self.state
    }

    fn decode_instruction(&mut self, address: u32) -> Result<(), DecodeError> {
        let opcode = self.cursor.next()?;
        self.state = State::DecodingInstruction;
        self.pending.push(Token::Address(address));

        let table = self.table;
        let descriptor = table.lookup(opcode).ok_or(DecodeError::UnknownOpcode(opcode))?;
        self.pending.push(Token::Opcode(descriptor.mnemonic()));

        for kind in descriptor.operands() {
            let operand = kind.decode(opcode, &mut self.cursor)?;
            self.pending.extend(operand.token());
        }
        Ok(())
    }

    /// move a partially decoded instruction to the output as raw bytes behind its address.
    fn flush_partial(&mut self) {
        if let Some(address @ Token::Address(_)) = self.pending.first().copied() {
            self.ready.push_back(address);
            self.ready.extend(self.cursor.consumed.iter().map(|b| Token::RawByte(*b)));
        }
        self.pending.clear();
        self.cursor.consumed.clear();
    }

    /// decode everything left in the source.
    #[instrument(skip_all)]
    pub fn finish(mut self) -> Disassembly {
        let tokens: Vec<Token> = self.by_ref().collect();
        debug!(tokens = tokens.len(), faults = self.faults.len(), "disassembly complete");
        Disassembly {
            tokens,
            faults: self.faults,
        }
    }
}

impl<'t, R: Reader<u16, u8>> Iterator for Disassembler<'t, R> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.ready.pop_front() {
                return Some(token);
            }
            if self.step() == State::Exhausted && self.ready.is_empty() {
                return None;
            }
        }
    }
}

/// decode all of `data` through `table`.
pub fn disassemble(table: &DescriptorTable, data: &[u8]) -> Disassembly {
    Disassembler::new(table, U8Reader::new(data)).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BitPattern, Descriptor, OperandKind};

    fn tokens(data: &[u8]) -> Vec<Token> {
        disassemble(DescriptorTable::mcs51(), data).tokens
    }

    #[test_log::test]
    fn complete_instruction() {
        assert_eq!(
            tokens(&[0x02, 0x12, 0x34]),
            vec![Token::Address(0), Token::Opcode("ljmp"), Token::Addr16(0x1234), Token::EndOfInstruction],
        );
    }

    #[test_log::test]
    fn register_and_addr11_encodings() {
        assert_eq!(
            tokens(&[0b0000_1011, 0b0010_0001, 0x10]),
            vec![
                Token::Address(0), Token::Opcode("inc"), Token::Register(3), Token::EndOfInstruction,
                Token::Address(1), Token::Opcode("ajmp"), Token::Addr11(0x110), Token::EndOfInstruction,
            ],
        );
    }

    #[test_log::test]
    fn truncated_tail_becomes_raw_bytes() {
        let disassembly = disassemble(DescriptorTable::mcs51(), &[0x02, 0x12]);
        assert_eq!(
            disassembly.tokens,
            vec![Token::Address(0), Token::RawByte(0x02), Token::RawByte(0x12)],
        );
        assert!(disassembly.faults.is_empty());
    }

    #[test_log::test]
    fn truncated_tail_keeps_its_address() {
        // `nop`, then a `cjne r7, #imm, offset` missing its offset.
        assert_eq!(
            tokens(&[0x00, 0xbf, 0x04]),
            vec![
                Token::Address(0), Token::Opcode("nop"), Token::EndOfInstruction,
                Token::Address(1), Token::RawByte(0xbf), Token::RawByte(0x04),
            ],
        );
    }

    #[test_log::test]
    fn empty_source() {
        let mut disassembler = Disassembler::new(DescriptorTable::mcs51(), U8Reader::new(&[]));
        assert_eq!(disassembler.next(), None);
        assert_eq!(disassembler.state(), State::Exhausted);
        assert_eq!(disassembler.program_counter(), 0);
    }

    #[test_log::test]
    fn unknown_opcode_resumes() {
        let disassembly = disassemble(DescriptorTable::mcs51(), &[0xa5, 0x04]);
        assert_eq!(
            disassembly.tokens,
            vec![
                Token::Address(0), Token::RawByte(0xa5), Token::EndOfInstruction,
                Token::Address(1), Token::Opcode("inc"), Token::Accumulator, Token::EndOfInstruction,
            ],
        );
        assert_eq!(
            disassembly.faults,
            vec![Fault { address: 0, error: DecodeError::UnknownOpcode(0xa5) }],
        );
    }

    #[test_log::test]
    fn program_counter_counts_every_byte() {
        let data = [0x00, 0x75, 0x81, 0x30, 0xa5, 0x12, 0x00];
        let mut disassembler = Disassembler::new(DescriptorTable::mcs51(), U8Reader::new(&data));
        assert_eq!(disassembler.state(), State::Idle);

        let mut seen = vec![disassembler.program_counter()];
        while disassembler.step() != State::Exhausted {
            seen.push(disassembler.program_counter());
        }
        // nop, mov direct #imm, unknown, then `lcall` short one byte.
        assert_eq!(seen, vec![0, 1, 4, 5]);
        assert_eq!(disassembler.program_counter(), data.len() as u32);

        let addresses: Vec<u32> = disassembler
            .filter_map(|t| if let Token::Address(a) = t { Some(a) } else { None })
            .collect();
        assert_eq!(addresses, vec![0, 1, 4, 5]);
    }

    #[test_log::test]
    fn stopping_early_leaves_source_unread() {
        let data = [0x00, 0x00, 0x00];
        let mut disassembler = Disassembler::new(DescriptorTable::mcs51(), U8Reader::new(&data));
        assert_eq!(disassembler.next(), Some(Token::Address(0)));
        assert_eq!(disassembler.program_counter(), 1);
        assert_eq!(disassembler.state(), State::Idle);
    }

    #[test_log::test]
    fn alternate_table() {
        let table = DescriptorTable::new(vec![
            Descriptor::new(BitPattern::lit("1111...."), "hi", &[OperandKind::Register, OperandKind::Direct]),
        ]).unwrap();
        let disassembly = disassemble(&table, &[0xf5, 0x20, 0x00]);
        assert_eq!(
            disassembly.tokens,
            vec![
                Token::Address(0), Token::Opcode("hi"), Token::Register(5), Token::Direct(0x20), Token::EndOfInstruction,
                Token::Address(2), Token::RawByte(0x00), Token::EndOfInstruction,
            ],
        );
    }

    #[test_log::test]
    fn decoding_is_idempotent() {
        let data = [0x10, 0x21, 0x05, 0xe5, 0x81, 0xa5, 0x02, 0x12];
        let first = disassemble(DescriptorTable::mcs51(), &data);
        let second = disassemble(DescriptorTable::mcs51(), &data);
        assert_eq!(first, second);
        assert_eq!(first.render(), second.render());
    }
}

//! # `yaxpeax-mcs51`, a decoder and listing generator for the MCS-51 instruction set
//!
//! the MCS-51 (or "8051", after its best-known part) is an 8-bit microcontroller family Intel
//! introduced in 1980. variants of it are still manufactured and embedded everywhere: keyboard
//! controllers, smart cards, USB bridges, the management cores of much larger chips.
//!
//! instructions are one to three bytes long. the first byte selects the operation, and many
//! operations smuggle an operand into the low bits of that byte: `inc r3` is `0b00001_011`, with
//! the register number in the low three bits. `ajmp` and `acall` go further and put the high three
//! bits of an 11-bit target address in the top of the opcode byte. so, rather than a single big
//! `match`, `yaxpeax-mcs51` decodes through an ordered table of bit patterns
//! ([`DescriptorTable`]): the first pattern an opcode matches decides the mnemonic and the operand
//! kinds to read after it. the table is a plain value, so alternate or extended catalogs can be
//! handed to the decoder in place of the built-in one.
//!
//! there are two ways to decode:
//! * [`InstDecoder`] implements [`yaxpeax_arch::Decoder`] and decodes one [`Instruction`] at a
//!   time from any `yaxpeax_arch::Reader<u16, u8>`.
//! * [`Disassembler`] is a state machine over a whole byte stream, producing a sequence of
//!   [`Token`]s that [`render`] turns into an assembler-style listing. when the stream ends in the
//!   middle of an instruction, the bytes read for it are emitted as raw bytes rather than as a
//!   misleading partial instruction.
//!
//! ## usage
//!
//! decoding a single instruction:
//! ```
//! use yaxpeax_mcs51::InstDecoder;
//!
//! let inst = InstDecoder::decode_slice(&[0x02, 0x12, 0x34]).unwrap();
//!
//! assert_eq!("ljmp 1234", inst.to_string());
//! assert_eq!(inst.len(), 3);
//! ```
//!
//! producing a listing for a run of bytes:
//! ```
//! use yaxpeax_mcs51::{disassemble, DescriptorTable};
//!
//! let disassembly = disassemble(DescriptorTable::mcs51(), &[0x0b, 0x02, 0x12]);
//!
//! assert_eq!(
//!     disassembly.render().text,
//!     "0000    inc     r3\n0001    0x020x12",
//! );
//! ```
//!
//! additionally, `yaxpeax-mcs51` implements `yaxpeax-arch` traits for generic use, such as
//! [`yaxpeax_arch::LengthedInstruction`]. [`yaxpeax_arch::Arch`] is implemented by the unit
//! struct [`MCS51`].

mod display;
pub mod ihex;
mod stream;
mod table;
mod token;

pub use crate::display::{render, render_with, Listing, ListingOptions, NumberBase, RenderError};
pub use crate::stream::{disassemble, Disassembler, Disassembly, Fault, State};
pub use crate::table::{BitPattern, Descriptor, DescriptorTable, OperandKind, PatternError, TableError, MAX_OPERANDS};
pub use crate::token::{Token, TokenClass, TokenError};

use yaxpeax_arch::{AddressDiff, Arch, Decoder, LengthedInstruction, Reader, ReadError, U8Reader};

/// a trivial struct for [`yaxpeax_arch::Arch`] to be implemented on. it's only interesting for the
/// associated type parameters.
#[derive(Hash, Eq, PartialEq, Debug, Copy, Clone)]
pub struct MCS51;

impl Arch for MCS51 {
    type Address = u16;
    type Word = u8;
    type Instruction = Instruction;
    type Decoder = InstDecoder<'static>;
    type DecodeError = DecodeError;
    type Operand = Operand;
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum DecodeError {
    /// no input available but the instruction would require at least one more byte to decode
    #[error("exhausted input")]
    ExhaustedInput,
    /// the opcode byte matches no entry of the descriptor table
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    /// the byte source failed for a reason other than running out of bytes
    #[error("byte source failed: {0}")]
    ReadFailed(&'static str),
}

impl From<ReadError> for DecodeError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::ExhaustedInput => DecodeError::ExhaustedInput,
            ReadError::IOError(cause) => DecodeError::ReadFailed(cause),
        }
    }
}

impl yaxpeax_arch::DecodeError for DecodeError {
    fn data_exhausted(&self) -> bool {
        *self == DecodeError::ExhaustedInput
    }
    fn bad_opcode(&self) -> bool {
        matches!(self, DecodeError::UnknownOpcode(_))
    }
    fn bad_operand(&self) -> bool {
        // every operand kind accepts any byte value; operands can't be "bad" at decode time.
        false
    }
    fn description(&self) -> &'static str {
        match self {
            DecodeError::ExhaustedInput => "exhausted input",
            DecodeError::UnknownOpcode(_) => "unknown opcode",
            DecodeError::ReadFailed(cause) => *cause,
        }
    }
}

/// an `mcs51` instruction.
///
/// `mcs51` instructions have a mnemonic, selected by their opcode byte, and up to three
/// [`Operand`]s. they are one to three bytes long.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Instruction {
    opcode: u8,
    mnemonic: &'static str,
    operands: [Operand; MAX_OPERANDS],
    length: u8,
}

impl Default for Instruction {
    fn default() -> Instruction {
        Instruction {
            opcode: 0x00,
            mnemonic: "nop",
            operands: [Operand::Nothing, Operand::Nothing, Operand::Nothing],
            length: 0,
        }
    }
}

impl Instruction {
    fn reset_operands(&mut self) {
        self.operands = [Operand::Nothing, Operand::Nothing, Operand::Nothing];
    }

    /// the length of this instruction, in bytes.
    pub fn len(&self) -> u8 {
        self.length
    }

    /// get the number of operands in this instruction.
    ///
    /// calls to `Instruction::operand` for indices between 0 and this value will return an operand
    /// other than `Operand::Nothing`.
    pub fn operand_count(&self) -> u8 {
        self.operands.iter().take_while(|op| **op != Operand::Nothing).count() as u8
    }

    /// get the `Operand` at the provided index.
    ///
    /// indices at or above `3` will always yield `Operand::Nothing`.
    pub fn operand(&self, idx: u8) -> Operand {
        self.operands.get(idx as usize).copied().unwrap_or(Operand::Nothing)
    }

    /// the opcode byte this instruction was decoded from.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// the mnemonic of the descriptor this instruction's opcode matched.
    pub fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    /// the listing tokens for this instruction, as if it was decoded at `address`.
    ///
    /// this is the same `Address, Opcode, operands.., EndOfInstruction` run a [`Disassembler`]
    /// produces for a fully-decoded instruction.
    pub fn tokens(&self, address: u32) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(3 + self.operand_count() as usize);
        tokens.push(Token::Address(address));
        tokens.push(Token::Opcode(self.mnemonic));
        tokens.extend(self.operands.iter().filter_map(Operand::token));
        tokens.push(Token::EndOfInstruction);
        tokens
    }
}

impl LengthedInstruction for Instruction {
    type Unit = AddressDiff<<MCS51 as Arch>::Address>;
    fn min_size() -> Self::Unit {
        AddressDiff::from_const(1)
    }
    fn len(&self) -> Self::Unit {
        AddressDiff::from_const(self.length as u16)
    }
}

impl yaxpeax_arch::Instruction for Instruction {
    fn well_defined(&self) -> bool { true }
}

/// an operand for an `mcs51` instruction.
#[derive(Copy, Clone, Hash, PartialEq, Eq)]
pub enum Operand {
    /// no operand in this position.
    ///
    /// reaching this as a user of `yaxpeax_mcs51` is almost certainly a bug.
    Nothing,
    /// the accumulator, `a`.
    Accumulator,
    /// one of the eight working registers `r0`..`r7` of the selected register bank.
    Register(u8),
    /// an address in the lower 128 bytes of internal ram, or an sfr above that.
    Direct(u8),
    /// `@r0` or `@r1`: internal ram addressed through a working register.
    Indirect(u8),
    /// a bit address.
    Bit(u8),
    /// a relative jump offset, as encoded.
    Offset(u8),
    /// an 8-bit literal, `#data`.
    Immediate(u8),
    /// an 11-bit address within the current 2k page of program memory.
    Addr11(u16),
    /// a full 16-bit program memory address.
    Addr16(u16),
}

impl Operand {
    /// the listing token for this operand, or `None` for `Operand::Nothing`.
    pub fn token(&self) -> Option<Token> {
        let token = match *self {
            Operand::Nothing => return None,
            Operand::Accumulator => Token::Accumulator,
            Operand::Register(r) => Token::Register(r),
            Operand::Direct(v) => Token::Direct(v),
            Operand::Indirect(r) => Token::Indirect(r),
            Operand::Bit(v) => Token::Bit(v),
            Operand::Offset(v) => Token::Offset(v),
            Operand::Immediate(v) => Token::Immediate(v),
            Operand::Addr11(addr) => Token::Addr11(addr),
            Operand::Addr16(addr) => Token::Addr16(addr),
        };
        Some(token)
    }
}

/// an `mcs51` instruction decoder.
///
/// the decoder borrows the [`DescriptorTable`] it dispatches through. `InstDecoder::default()`
/// uses the built-in catalog, [`DescriptorTable::mcs51()`].
#[derive(Debug, Copy, Clone)]
pub struct InstDecoder<'t> {
    table: &'t DescriptorTable,
}

impl<'t> InstDecoder<'t> {
    /// create a decoder that dispatches opcodes through `table`.
    pub fn with_table(table: &'t DescriptorTable) -> Self {
        InstDecoder { table }
    }

    /// the descriptor table this decoder dispatches through.
    pub fn table(&self) -> &'t DescriptorTable {
        self.table
    }
}

impl InstDecoder<'static> {
    /// decode a slice of bytes into an instruction (or error)
    ///
    /// this is just a higher-level interface to the [`InstDecoder`] impl of
    /// [`yaxpeax_arch::Decoder`].
    pub fn decode_slice(data: &[u8]) -> Result<Instruction, <MCS51 as Arch>::DecodeError> {
        InstDecoder::default()
            .decode(&mut U8Reader::new(data))
    }
}

impl Default for InstDecoder<'static> {
    fn default() -> Self {
        InstDecoder { table: DescriptorTable::mcs51() }
    }
}

impl<'t> Decoder<MCS51> for InstDecoder<'t> {
    fn decode_into<T: Reader<<MCS51 as Arch>::Address, <MCS51 as Arch>::Word>>(&self, inst: &mut Instruction, words: &mut T) -> Result<(), <MCS51 as Arch>::DecodeError> {
        inst.length = 0;
        inst.reset_operands();
        words.mark();
        let opcode = words.next()?;

        let descriptor = self.table.lookup(opcode)
            .ok_or(DecodeError::UnknownOpcode(opcode))?;

        inst.opcode = opcode;
        inst.mnemonic = descriptor.mnemonic();
        // table construction guarantees at most `MAX_OPERANDS` kinds per descriptor.
        for (slot, kind) in inst.operands.iter_mut().zip(descriptor.operands()) {
            *slot = kind.decode(opcode, words)?;
        }

        inst.length = words.offset() as u8;
        Ok(())
    }
}

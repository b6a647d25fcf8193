//! lexical units of a decoded byte stream.

use crate::display::{ListingOptions, NumberBase};

/// one unit of disassembly output.
///
/// a decoded instruction is `Address, Opcode, <operands>.., EndOfInstruction`. bytes that could
/// not be decoded are `Address, RawByte..`, see [`crate::Disassembler`].
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Token {
    /// program counter at the first byte of the instruction.
    Address(u32),
    /// the instruction's mnemonic.
    Opcode(&'static str),
    Register(u8),
    /// the accumulator sfr, `a`.
    Accumulator,
    Direct(u8),
    Indirect(u8),
    Bit(u8),
    Offset(u8),
    Immediate(u8),
    Addr11(u16),
    Addr16(u16),
    /// a byte that was read but is not part of any decoded instruction.
    RawByte(u8),
    EndOfInstruction,
}

/// how a token participates in listing layout.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum TokenClass {
    /// instruction operands: runs of these are separated by `, `.
    Operand,
    /// structure of the listing rather than content of an instruction.
    Helper,
    Plain,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// bit addresses `0x00..0x80` are the bits of ram bytes `0x20..0x30`. higher bit addresses
    /// belong to sfrs and have no `byte.bit` form here.
    #[error("bit address {0:#04x} is outside the bit-addressable ram")]
    BitOutOfRange(u8),
}

impl TokenError {
    /// the text written in a listing in place of the token that failed.
    pub fn marker(&self) -> String {
        match self {
            TokenError::BitOutOfRange(bit) => format!("<bad bit {:#04x}>", bit),
        }
    }
}

impl Token {
    pub fn class(&self) -> TokenClass {
        match self {
            Token::Address(_) |
            Token::EndOfInstruction => TokenClass::Helper,
            Token::Opcode(_) |
            Token::RawByte(_) => TokenClass::Plain,
            Token::Register(_) |
            Token::Accumulator |
            Token::Direct(_) |
            Token::Indirect(_) |
            Token::Bit(_) |
            Token::Offset(_) |
            Token::Immediate(_) |
            Token::Addr11(_) |
            Token::Addr16(_) => TokenClass::Operand,
        }
    }

    pub fn is_operand(&self) -> bool {
        self.class() == TokenClass::Operand
    }

    pub fn is_helper(&self) -> bool {
        self.class() == TokenClass::Helper
    }

    /// the name of this token's kind.
    pub fn terminal(&self) -> &'static str {
        match self {
            Token::Address(_) => "address",
            Token::Opcode(_) => "opcode",
            Token::Register(_) => "register",
            Token::Accumulator => "sfr",
            Token::Direct(_) => "direct",
            Token::Indirect(_) => "indirect",
            Token::Bit(_) => "bit",
            Token::Offset(_) => "offset",
            Token::Immediate(_) => "immediate",
            Token::Addr11(_) => "addr11",
            Token::Addr16(_) => "addr16",
            Token::RawByte(_) => "raw_byte",
            Token::EndOfInstruction => "eoi",
        }
    }

    /// the text of this token on its own, without column padding or separators.
    pub fn render(&self, options: &ListingOptions) -> Result<String, TokenError> {
        let text = match *self {
            Token::Address(addr) => format!("{:04x}", addr),
            Token::Opcode(mnemonic) => mnemonic.to_owned(),
            Token::Register(r) => format!("r{}", r),
            Token::Accumulator => "a".to_owned(),
            Token::Direct(addr) => match options.direct_base {
                NumberBase::Decimal => format!("{}", addr),
                NumberBase::Hex => format!("{:#04x}", addr),
            },
            Token::Indirect(r) => format!("@r{}", r),
            Token::Bit(bit) => {
                let (byte, index) = bit_location(bit).ok_or(TokenError::BitOutOfRange(bit))?;
                format!("{}.{}", byte, index)
            }
            Token::Offset(offset) => format!("{}", offset),
            Token::Immediate(value) => format!("#{}", value),
            Token::Addr11(addr) |
            Token::Addr16(addr) => format!("{:04x}", addr),
            Token::RawByte(byte) => format!("{:#04x}", byte),
            Token::EndOfInstruction => "\n".to_owned(),
        };
        Ok(text)
    }
}

/// the ram byte and bit index a bit address refers to, if it is in the bit-addressable area.
pub(crate) fn bit_location(bit: u8) -> Option<(u8, u8)> {
    if bit < 0x80 {
        Some((0x20 + bit / 8, bit % 8))
    } else {
        None
    }
}

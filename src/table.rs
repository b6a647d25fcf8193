//! the instruction descriptor table: an ordered catalog of opcode bit patterns, each with the
//! mnemonic and operand kinds of the instructions it selects.
//!
//! patterns overlap. `...00001` (`ajmp`) and `00000001` describe the same byte, and a register
//! form like `00001...` covers eight opcodes at once. dispatch is always first match in
//! declaration order; [`DescriptorTable::push`] refuses any descriptor that earlier entries
//! already fully cover, since under first-match order it could never be selected.

use core::fmt;
use core::str::FromStr;
use std::sync::OnceLock;

use yaxpeax_arch::Reader;

use crate::{DecodeError, Operand};

/// the most operands any one descriptor may declare. an [`crate::Instruction`] has this many
/// operand slots.
pub const MAX_OPERANDS: usize = 3;

/// an 8-bit opcode template: a byte matches if it agrees with `value` on every bit set in `mask`.
/// bits clear in `mask` are "don't care".
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct BitPattern {
    value: u8,
    mask: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("expected 8 pattern characters, found {0}")]
    WrongLength(usize),
    #[error("unexpected `{character}` at position {position}, expected `0`, `1` or `.`")]
    BadCharacter { position: usize, character: char },
}

impl BitPattern {
    /// a pattern caring about the bits in `mask`. bits of `value` outside `mask` are ignored.
    pub const fn new(value: u8, mask: u8) -> Self {
        BitPattern { value: value & mask, mask }
    }

    /// a pattern that matches `byte` and nothing else.
    pub const fn exact(byte: u8) -> Self {
        BitPattern { value: byte, mask: 0xff }
    }

    /// parse the textual form, most significant bit first: `0` and `1` are fixed bits, `.` is a
    /// wildcard. `"...00001"` is every byte whose low five bits are `00001`.
    ///
    /// for use in constant catalogs, where a malformed pattern is a compile error. use
    /// `str::parse` for patterns that aren't known ahead of time.
    pub const fn lit(text: &str) -> Self {
        match parse_pattern(text.as_bytes()) {
            Ok(pattern) => pattern,
            Err(_) => panic!("malformed bit pattern"),
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    #[inline]
    pub fn matches(&self, byte: u8) -> bool {
        (byte ^ self.value) & self.mask == 0
    }

    /// every byte this pattern matches, in increasing order.
    pub fn matching_bytes(&self) -> impl Iterator<Item = u8> {
        let pattern = *self;
        (0..=255u8).filter(move |b| pattern.matches(*b))
    }
}

const fn parse_pattern(text: &[u8]) -> Result<BitPattern, PatternError> {
    if text.len() != 8 {
        return Err(PatternError::WrongLength(text.len()));
    }
    let mut value = 0u8;
    let mut mask = 0u8;
    let mut i = 0;
    while i < 8 {
        let bit = 1u8 << (7 - i);
        match text[i] {
            b'0' => {
                mask |= bit;
            }
            b'1' => {
                mask |= bit;
                value |= bit;
            }
            b'.' => {}
            other => {
                return Err(PatternError::BadCharacter { position: i, character: other as char });
            }
        }
        i += 1;
    }
    Ok(BitPattern { value, mask })
}

impl FromStr for BitPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((position, character)) = s.chars().enumerate().find(|(_, c)| !c.is_ascii()) {
            return Err(PatternError::BadCharacter { position, character });
        }
        parse_pattern(s.as_bytes())
    }
}

impl fmt::Display for BitPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for i in (0..8).rev() {
            let bit = 1u8 << i;
            let c = if self.mask & bit == 0 {
                '.'
            } else if self.value & bit == 0 {
                '0'
            } else {
                '1'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// the addressing-mode category of one instruction operand.
///
/// each kind has exactly one decode rule, in [`OperandKind::decode`].
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum OperandKind {
    /// the accumulator; no bytes.
    Accumulator,
    /// `rN`, from the low three bits of the opcode; no bytes.
    Register,
    /// one byte, an internal ram or sfr address.
    Direct,
    /// `@rN`, from the low bit of the opcode; no bytes.
    Indirect,
    /// one byte, a bit address.
    Bit,
    /// one byte, `#data`.
    Immediate,
    /// one byte, combined with the high three bits of the opcode.
    Addr11,
    /// two bytes, big-endian.
    Addr16,
    /// one byte, a relative jump offset.
    Offset,
}

impl OperandKind {
    /// how many bytes after the opcode this operand consumes.
    pub fn byte_len(&self) -> u8 {
        match self {
            OperandKind::Accumulator |
            OperandKind::Register |
            OperandKind::Indirect => 0,
            OperandKind::Direct |
            OperandKind::Bit |
            OperandKind::Immediate |
            OperandKind::Addr11 |
            OperandKind::Offset => 1,
            OperandKind::Addr16 => 2,
        }
    }

    /// the name this kind goes by in textual catalogs.
    pub fn name(&self) -> &'static str {
        match self {
            OperandKind::Accumulator => "a",
            OperandKind::Register => "register",
            OperandKind::Direct => "direct",
            OperandKind::Indirect => "indirect",
            OperandKind::Bit => "bit",
            OperandKind::Immediate => "imm8",
            OperandKind::Addr11 => "addr11",
            OperandKind::Addr16 => "addr16",
            OperandKind::Offset => "offset",
        }
    }

    /// decode this operand of an instruction whose opcode byte was `opcode`, reading any operand
    /// bytes from `words`.
    pub fn decode<T: Reader<u16, u8>>(&self, opcode: u8, words: &mut T) -> Result<Operand, DecodeError> {
        let operand = match self {
            OperandKind::Accumulator => Operand::Accumulator,
            OperandKind::Register => Operand::Register(opcode & 0b0000_0111),
            OperandKind::Indirect => Operand::Indirect(opcode & 0b0000_0001),
            OperandKind::Direct => Operand::Direct(words.next()?),
            OperandKind::Bit => Operand::Bit(words.next()?),
            OperandKind::Offset => Operand::Offset(words.next()?),
            OperandKind::Immediate => Operand::Immediate(words.next()?),
            OperandKind::Addr11 => {
                let page = ((opcode & 0b1110_0000) as u16) << 3;
                Operand::Addr11(page | words.next()? as u16)
            }
            OperandKind::Addr16 => {
                // read one at a time: if the second byte is missing, the first was still consumed.
                let high = words.next()?;
                let low = words.next()?;
                Operand::Addr16(u16::from_be_bytes([high, low]))
            }
        };
        Ok(operand)
    }
}

impl FromStr for OperandKind {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "a" | "acc" => OperandKind::Accumulator,
            "register" => OperandKind::Register,
            "direct" => OperandKind::Direct,
            "indirect" => OperandKind::Indirect,
            "bit" => OperandKind::Bit,
            "imm8" | "immediate" => OperandKind::Immediate,
            "addr11" => OperandKind::Addr11,
            "addr16" => OperandKind::Addr16,
            "offset" => OperandKind::Offset,
            other => return Err(TableError::UnknownOperandKind(other.to_owned())),
        };
        Ok(kind)
    }
}

/// a catalog entry: an opcode pattern, the mnemonic it decodes to, and its operands in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pattern: BitPattern,
    mnemonic: &'static str,
    operands: Vec<OperandKind>,
}

impl Descriptor {
    pub fn new(pattern: BitPattern, mnemonic: &'static str, operands: &[OperandKind]) -> Self {
        Descriptor {
            pattern,
            mnemonic,
            operands: operands.to_vec(),
        }
    }

    /// build a descriptor from its textual form, e.g.
    /// `Descriptor::parse("00010000", "jbc", &["bit", "offset"])`.
    ///
    /// fails on a malformed pattern or an operand name with no decode rule.
    pub fn parse(pattern: &str, mnemonic: &'static str, operands: &[&str]) -> Result<Self, TableError> {
        let pattern = pattern.parse::<BitPattern>().map_err(|cause| TableError::BadPattern {
            pattern: pattern.to_owned(),
            cause,
        })?;
        let operands = operands
            .iter()
            .map(|name| name.parse::<OperandKind>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Descriptor { pattern, mnemonic, operands })
    }

    pub fn pattern(&self) -> BitPattern {
        self.pattern
    }

    pub fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    pub fn operands(&self) -> &[OperandKind] {
        &self.operands
    }

    /// total length of an instruction this descriptor decodes, opcode byte included.
    pub fn len(&self) -> u8 {
        1 + self.operands.iter().map(OperandKind::byte_len).sum::<u8>()
    }

    pub fn matches(&self, opcode: u8) -> bool {
        self.pattern.matches(opcode)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("malformed bit pattern `{pattern}`")]
    BadPattern {
        pattern: String,
        #[source]
        cause: PatternError,
    },
    #[error("operand kind `{0}` has no decode rule")]
    UnknownOperandKind(String),
    #[error("descriptor {index} ({pattern}) has an empty mnemonic")]
    EmptyMnemonic { index: usize, pattern: BitPattern },
    #[error("`{mnemonic}` declares {count} operands, at most {max} are supported", max = MAX_OPERANDS)]
    TooManyOperands { mnemonic: &'static str, count: usize },
    #[error("`{mnemonic}` ({pattern}) at index {index} only matches opcodes claimed by earlier descriptors")]
    Unreachable { index: usize, mnemonic: &'static str, pattern: BitPattern },
}

/// an ordered, immutable-once-built catalog of [`Descriptor`]s.
///
/// opcode lookup is first match in declaration order. tables are plain values: share one by
/// reference between as many decoders as needed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DescriptorTable {
    descriptors: Vec<Descriptor>,
}

impl DescriptorTable {
    /// build a table from `descriptors`, in order, validating each as it is appended.
    pub fn new<I: IntoIterator<Item = Descriptor>>(descriptors: I) -> Result<Self, TableError> {
        let mut table = DescriptorTable::default();
        for descriptor in descriptors {
            table.push(descriptor)?;
        }
        Ok(table)
    }

    /// append `descriptor` as the lowest-priority entry.
    ///
    /// a descriptor that would never be selected, because every opcode it matches is claimed by
    /// an earlier entry, is rejected; the table is left unchanged on error.
    pub fn push(&mut self, descriptor: Descriptor) -> Result<(), TableError> {
        let index = self.descriptors.len();
        if descriptor.mnemonic.is_empty() {
            return Err(TableError::EmptyMnemonic { index, pattern: descriptor.pattern });
        }
        if descriptor.operands.len() > MAX_OPERANDS {
            return Err(TableError::TooManyOperands {
                mnemonic: descriptor.mnemonic,
                count: descriptor.operands.len(),
            });
        }
        let reachable = descriptor.pattern
            .matching_bytes()
            .any(|opcode| self.lookup(opcode).is_none());
        if !reachable {
            return Err(TableError::Unreachable {
                index,
                mnemonic: descriptor.mnemonic,
                pattern: descriptor.pattern,
            });
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// the built-in MCS-51 catalog, constructed on first use.
    pub fn mcs51() -> &'static DescriptorTable {
        static MCS51_TABLE: OnceLock<DescriptorTable> = OnceLock::new();
        // the catalog's validity is covered by `builtin_catalog_is_well_formed`.
        MCS51_TABLE.get_or_init(|| DescriptorTable {
            descriptors: MCS51_CATALOG
                .iter()
                .map(|(pattern, mnemonic, operands)| Descriptor::new(*pattern, *mnemonic, operands))
                .collect(),
        })
    }

    /// the first descriptor, in declaration order, whose pattern matches `opcode`.
    pub fn lookup(&self, opcode: u8) -> Option<&Descriptor> {
        self.descriptors.iter().find(|d| d.matches(opcode))
    }

    /// the declaration index of the descriptor `lookup` would return.
    pub fn position(&self, opcode: u8) -> Option<usize> {
        self.descriptors.iter().position(|d| d.matches(opcode))
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }
}

macro_rules! op {
    ($pattern:expr, $mnemonic:expr $(, $operand:ident)*) => {
        (BitPattern::lit($pattern), $mnemonic, &[$(OperandKind::$operand),*])
    };
}

// opcodes the nine operand kinds can't express (`mov dptr, #data16`, `jmp @a+dptr`, `movc`,
// `movx`, anything on `c` or `ab`) are left out and decode as unknown.
const MCS51_CATALOG: &[(BitPattern, &str, &[OperandKind])] = &[
    op!("00000000", "nop"),
    op!("...00001", "ajmp", Addr11),
    op!("00000010", "ljmp", Addr16),
    op!("00000011", "rr", Accumulator),
    op!("00000100", "inc", Accumulator),
    op!("00000101", "inc", Direct),
    op!("0000011.", "inc", Indirect),
    op!("00001...", "inc", Register),
    op!("00010000", "jbc", Bit, Offset),
    op!("...10001", "acall", Addr11),
    op!("00010010", "lcall", Addr16),
    op!("00010011", "rrc", Accumulator),
    op!("00010100", "dec", Accumulator),
    op!("00010101", "dec", Direct),
    op!("0001011.", "dec", Indirect),
    op!("00011...", "dec", Register),
    op!("00100000", "jb", Bit, Offset),
    op!("00100010", "ret"),
    op!("00100011", "rl", Accumulator),
    op!("00100100", "add", Accumulator, Immediate),
    op!("00100101", "add", Accumulator, Direct),
    op!("0010011.", "add", Accumulator, Indirect),
    op!("00101...", "add", Accumulator, Register),
    op!("00110000", "jnb", Bit, Offset),
    op!("00110010", "reti"),
    op!("00110011", "rlc", Accumulator),
    op!("00110100", "addc", Accumulator, Immediate),
    op!("00110101", "addc", Accumulator, Direct),
    op!("0011011.", "addc", Accumulator, Indirect),
    op!("00111...", "addc", Accumulator, Register),
    op!("01000000", "jc", Offset),
    op!("01000010", "orl", Direct, Accumulator),
    op!("01000011", "orl", Direct, Immediate),
    op!("01000100", "orl", Accumulator, Immediate),
    op!("01000101", "orl", Accumulator, Direct),
    op!("0100011.", "orl", Accumulator, Indirect),
    op!("01001...", "orl", Accumulator, Register),
    op!("01010000", "jnc", Offset),
    op!("01010010", "anl", Direct, Accumulator),
    op!("01010011", "anl", Direct, Immediate),
    op!("01010100", "anl", Accumulator, Immediate),
    op!("01010101", "anl", Accumulator, Direct),
    op!("0101011.", "anl", Accumulator, Indirect),
    op!("01011...", "anl", Accumulator, Register),
    op!("01100000", "jz", Offset),
    op!("01100010", "xrl", Direct, Accumulator),
    op!("01100011", "xrl", Direct, Immediate),
    op!("01100100", "xrl", Accumulator, Immediate),
    op!("01100101", "xrl", Accumulator, Direct),
    op!("0110011.", "xrl", Accumulator, Indirect),
    op!("01101...", "xrl", Accumulator, Register),
    op!("01110000", "jnz", Offset),
    op!("01110100", "mov", Accumulator, Immediate),
    op!("01110101", "mov", Direct, Immediate),
    op!("0111011.", "mov", Indirect, Immediate),
    op!("01111...", "mov", Register, Immediate),
    op!("10000000", "sjmp", Offset),
    op!("1000011.", "mov", Direct, Indirect),
    op!("10001...", "mov", Direct, Register),
    op!("10010100", "subb", Accumulator, Immediate),
    op!("10010101", "subb", Accumulator, Direct),
    op!("1001011.", "subb", Accumulator, Indirect),
    op!("10011...", "subb", Accumulator, Register),
    op!("1010011.", "mov", Indirect, Direct),
    op!("10101...", "mov", Register, Direct),
    op!("10110010", "cpl", Bit),
    op!("10110100", "cjne", Accumulator, Immediate, Offset),
    op!("10110101", "cjne", Accumulator, Direct, Offset),
    op!("1011011.", "cjne", Indirect, Immediate, Offset),
    op!("10111...", "cjne", Register, Immediate, Offset),
    op!("11000000", "push", Direct),
    op!("11000010", "clr", Bit),
    op!("11000100", "swap", Accumulator),
    op!("11000101", "xch", Accumulator, Direct),
    op!("1100011.", "xch", Accumulator, Indirect),
    op!("11001...", "xch", Accumulator, Register),
    op!("11010000", "pop", Direct),
    op!("11010010", "setb", Bit),
    op!("11010100", "da", Accumulator),
    op!("11010101", "djnz", Direct, Offset),
    op!("1101011.", "xchd", Accumulator, Indirect),
    op!("11011...", "djnz", Register, Offset),
    op!("11100100", "clr", Accumulator),
    op!("11100101", "mov", Accumulator, Direct),
    op!("1110011.", "mov", Accumulator, Indirect),
    op!("11101...", "mov", Accumulator, Register),
    op!("11110100", "cpl", Accumulator),
    op!("11110101", "mov", Direct, Accumulator),
    op!("1111011.", "mov", Indirect, Accumulator),
    op!("11111...", "mov", Register, Accumulator),
];

#[cfg(test)]
mod tests {
    use super::*;
    use yaxpeax_arch::U8Reader;

    fn operand(kind: OperandKind, opcode: u8, rest: &[u8]) -> Result<Operand, DecodeError> {
        kind.decode(opcode, &mut U8Reader::new(rest))
    }

    #[test]
    fn builtin_catalog_is_well_formed() {
        let rebuilt = DescriptorTable::new(DescriptorTable::mcs51().iter().cloned())
            .unwrap_or_else(|e| panic!("{}", e));
        assert_eq!(&rebuilt, DescriptorTable::mcs51());
    }

    #[test]
    fn table_is_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DescriptorTable>();
        assert_send_sync::<&'static DescriptorTable>();

        let table = DescriptorTable::mcs51();
        let mnemonic = std::thread::spawn(move || table.lookup(0x02).map(Descriptor::mnemonic))
            .join()
            .unwrap();
        assert_eq!(mnemonic, Some("ljmp"));
    }

    #[test]
    fn pattern_text() {
        let p = BitPattern::lit("...00001");
        assert_eq!(p.value(), 0b0000_0001);
        assert_eq!(p.mask(), 0b0001_1111);
        assert_eq!(p.to_string(), "...00001");
        assert_eq!(p.matching_bytes().collect::<Vec<_>>(), vec![0x01, 0x21, 0x41, 0x61, 0x81, 0xa1, 0xc1, 0xe1]);

        assert_eq!("0000011.".parse::<BitPattern>(), Ok(BitPattern::new(0b0000_0110, 0b1111_1110)));
        assert_eq!("0000011".parse::<BitPattern>(), Err(PatternError::WrongLength(7)));
        assert_eq!(
            "0000x11.".parse::<BitPattern>(),
            Err(PatternError::BadCharacter { position: 4, character: 'x' }),
        );
        assert_eq!(
            "0000é11.".parse::<BitPattern>(),
            Err(PatternError::BadCharacter { position: 4, character: 'é' }),
        );
    }

    #[test]
    fn pattern_ignores_value_bits_outside_mask() {
        let p = BitPattern::new(0xff, 0xf0);
        assert_eq!(p.value(), 0xf0);
        assert!(p.matches(0xf3));
        assert!(!p.matches(0x73));
    }

    #[test]
    fn lookup_is_consistent_with_patterns() {
        let table = DescriptorTable::mcs51();
        for opcode in 0..=255u8 {
            match table.position(opcode) {
                Some(idx) => {
                    let descriptor = table.lookup(opcode).unwrap();
                    assert!(descriptor.matches(opcode));
                    assert_eq!(descriptor, table.iter().nth(idx).unwrap());
                    // nothing declared earlier also matches.
                    assert!(table.iter().take(idx).all(|d| !d.matches(opcode)));
                }
                None => {
                    assert!(table.lookup(opcode).is_none());
                    assert!(table.iter().all(|d| !d.matches(opcode)));
                }
            }
        }
    }

    #[test]
    fn first_match_wins() {
        let table = DescriptorTable::new(vec![
            Descriptor::new(BitPattern::exact(0x08), "special", &[]),
            Descriptor::new(BitPattern::lit("00001..."), "inc", &[OperandKind::Register]),
        ]).unwrap();
        assert_eq!(table.lookup(0x08).unwrap().mnemonic(), "special");
        assert_eq!(table.lookup(0x09).unwrap().mnemonic(), "inc");
        assert!(table.lookup(0x10).is_none());
    }

    #[test]
    fn shadowed_descriptor_is_rejected() {
        let mut table = DescriptorTable::new(vec![
            Descriptor::new(BitPattern::lit("...10010"), "lcall", &[OperandKind::Addr16]),
        ]).unwrap();
        let err = table.push(Descriptor::new(BitPattern::lit("00110010"), "reti", &[])).unwrap_err();
        assert_eq!(err, TableError::Unreachable {
            index: 1,
            mnemonic: "reti",
            pattern: BitPattern::exact(0x32),
        });
        assert_eq!(table.len(), 1);

        // partially overlapping is fine: some opcodes are still left for it.
        table.push(Descriptor::new(BitPattern::lit("0011001."), "other", &[])).unwrap();
        assert_eq!(table.lookup(0x33).unwrap().mnemonic(), "other");
        assert_eq!(table.lookup(0x32).unwrap().mnemonic(), "lcall");
    }

    #[test]
    fn malformed_descriptors_are_rejected() {
        assert_eq!(
            Descriptor::parse("00000101", "inc", &["dirct"]),
            Err(TableError::UnknownOperandKind("dirct".to_owned())),
        );
        assert!(matches!(
            Descriptor::parse("0000010", "inc", &["direct"]),
            Err(TableError::BadPattern { cause: PatternError::WrongLength(7), .. }),
        ));
        assert!(matches!(
            DescriptorTable::new(vec![Descriptor::new(BitPattern::exact(0), "", &[])]),
            Err(TableError::EmptyMnemonic { index: 0, .. }),
        ));
        let too_many = Descriptor::parse("11111111", "wide", &["a", "a", "a", "a"]).unwrap();
        assert_eq!(
            DescriptorTable::new(vec![too_many]),
            Err(TableError::TooManyOperands { mnemonic: "wide", count: 4 }),
        );
    }

    #[test]
    fn textual_descriptors() {
        let jbc = Descriptor::parse("00010000", "jbc", &["bit", "offset"]).unwrap();
        assert_eq!(jbc, Descriptor::new(BitPattern::exact(0x10), "jbc", &[OperandKind::Bit, OperandKind::Offset]));
        assert_eq!(jbc.len(), 3);

        let add = Descriptor::parse("00100100", "add", &["a", "imm8"]).unwrap();
        assert_eq!(add.operands(), &[OperandKind::Accumulator, OperandKind::Immediate]);
        assert_eq!(add.len(), 2);

        for kind in [
            OperandKind::Accumulator, OperandKind::Register, OperandKind::Direct,
            OperandKind::Indirect, OperandKind::Bit, OperandKind::Immediate,
            OperandKind::Addr11, OperandKind::Addr16, OperandKind::Offset,
        ].iter() {
            assert_eq!(kind.name().parse::<OperandKind>(), Ok(*kind));
        }
    }

    #[test]
    fn operand_rules() {
        assert_eq!(operand(OperandKind::Accumulator, 0x04, &[]), Ok(Operand::Accumulator));
        assert_eq!(operand(OperandKind::Register, 0b0000_1011, &[]), Ok(Operand::Register(3)));
        assert_eq!(operand(OperandKind::Indirect, 0b0000_0111, &[]), Ok(Operand::Indirect(1)));
        assert_eq!(operand(OperandKind::Direct, 0x05, &[0x81]), Ok(Operand::Direct(0x81)));
        assert_eq!(operand(OperandKind::Immediate, 0x24, &[0x7f]), Ok(Operand::Immediate(0x7f)));
        assert_eq!(
            operand(OperandKind::Addr11, 0b0010_0001, &[0x10]),
            Ok(Operand::Addr11(((0b0010_0000u16) << 3) | 0x10)),
        );
        assert_eq!(operand(OperandKind::Addr11, 0xe1, &[0xff]), Ok(Operand::Addr11(0x7ff)));
        assert_eq!(operand(OperandKind::Addr16, 0x02, &[0x12, 0x34]), Ok(Operand::Addr16(0x1234)));
        assert_eq!(operand(OperandKind::Addr16, 0x02, &[0x12]), Err(DecodeError::ExhaustedInput));
        assert_eq!(operand(OperandKind::Offset, 0x40, &[]), Err(DecodeError::ExhaustedInput));
    }
}

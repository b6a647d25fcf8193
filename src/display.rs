use core::fmt;

use tracing::warn;

use crate::token::{bit_location, TokenError};
use crate::{Instruction, Operand, Token};

/// how `Direct` operands are written in a listing.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum NumberBase {
    /// `129`
    Decimal,
    /// `0x81`
    Hex,
}

impl Default for NumberBase {
    fn default() -> Self {
        NumberBase::Decimal
    }
}

/// listing layout options.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct ListingOptions {
    pub direct_base: NumberBase,
    /// address and mnemonic columns are left-justified to this many characters.
    pub column_width: usize,
}

impl Default for ListingOptions {
    fn default() -> Self {
        ListingOptions {
            direct_base: NumberBase::default(),
            column_width: 8,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot render token {index}")]
pub struct RenderError {
    /// position of the offending token in the rendered sequence.
    pub index: usize,
    #[source]
    pub cause: TokenError,
}

/// rendered listing text, and every token that could not be rendered faithfully.
///
/// a token that fails to render is written in place as a visible `<bad ...>` marker, so one bad
/// operand costs only its own text rather than the rest of the listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub text: String,
    /// render failures, in token order.
    pub errors: Vec<RenderError>,
}

impl Listing {
    /// `true` if every token rendered by its normal rule.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// render `tokens` as a listing with default [`ListingOptions`].
pub fn render(tokens: &[Token]) -> Listing {
    render_with(tokens, &ListingOptions::default())
}

/// render `tokens` as a listing.
///
/// addresses and mnemonics are padded to `options.column_width`, adjacent operands are joined
/// with `", "`, and everything else is written as-is. tokens that cannot be rendered are
/// reported in [`Listing::errors`] and marked in the text; the rest of the listing is unaffected.
pub fn render_with(tokens: &[Token], options: &ListingOptions) -> Listing {
    let mut listing = Listing::default();
    let mut previous: Option<&Token> = None;

    for (index, token) in tokens.iter().enumerate() {
        let text = match token.render(options) {
            Ok(text) => text,
            Err(cause) => {
                warn!(index, error = %cause, "token rendered as a marker");
                listing.errors.push(RenderError { index, cause });
                cause.marker()
            }
        };
        match token {
            Token::Address(_) | Token::Opcode(_) => {
                listing.text.push_str(&format!("{:<width$}", text, width = options.column_width));
            }
            _ => {
                if token.is_operand() && previous.map_or(false, Token::is_operand) {
                    listing.text.push_str(", ");
                }
                listing.text.push_str(&text);
            }
        }
        previous = Some(token);
    }

    listing
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.mnemonic)?;
        for i in 0..self.operand_count() {
            if i == 0 {
                f.write_str(" ")?;
            } else {
                f.write_str(", ")?;
            }
            write!(f, "{}", self.operands[i as usize])?;
        }
        Ok(())
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <Operand as fmt::Display>::fmt(self, f)
    }
}

// same text as the listing with default options, including the `<bad bit ..>` marker for sfr bit
// addresses (`0x80` and up); a `Display` impl has no way to report the error itself.
impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use crate::Operand::*;
        match self {
            Nothing => f.write_str("BUG"),
            Accumulator => f.write_str("a"),
            Register(r) => write!(f, "r{}", r),
            Direct(addr) => write!(f, "{}", addr),
            Indirect(r) => write!(f, "@r{}", r),
            Bit(bit) => match bit_location(*bit) {
                Some((byte, index)) => write!(f, "{}.{}", byte, index),
                None => f.write_str(&TokenError::BitOutOfRange(*bit).marker()),
            },
            Offset(offset) => write!(f, "{}", offset),
            Immediate(value) => write!(f, "#{}", value),
            Addr11(addr) |
            Addr16(addr) => write!(f, "{:04x}", addr),
        }
    }
}

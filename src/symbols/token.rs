//! Metadata tokens linking symbols to .NET type-system definitions.

use std::fmt;

/// A .NET metadata token correlating a symbol to its type-system definition.
///
/// Managed procedure and constant records store the metadata token of the
/// method or field they describe. Tokens are 32-bit values where:
/// - The high byte (bits 24-31) indicates the metadata table
/// - The low 24 bits (bits 0-23) indicate the row index within that table
///
/// The token is the join key between the symbol stream and the assembly's
/// metadata tables; this library only transports it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_parts() {
        let token = Token::new(0x0600_0001);
        assert_eq!(token.value(), 0x0600_0001);
        assert_eq!(token.table(), 0x06);
        assert_eq!(token.row(), 1);
        assert!(!token.is_null());
    }

    #[test]
    fn null_token() {
        assert!(Token::new(0).is_null());
    }

    #[test]
    fn token_display() {
        let token = Token::new(0x0600_002A);
        assert_eq!(token.to_string(), "0x0600002a");
    }

    #[test]
    fn token_conversions() {
        let token: Token = 0x0600_0005_u32.into();
        let raw: u32 = token.into();
        assert_eq!(raw, 0x0600_0005);
    }
}

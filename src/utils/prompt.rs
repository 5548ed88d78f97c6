use crate::error::Result;
use std::io::{BufRead, Write};

pub const SYMBOL_PROMPT: &str = "Enter the stock symbol (e.g., SPY): ";

/// Prompt for a ticker symbol and return it trimmed and upper-cased.
///
/// The symbol is not validated; end of input yields an empty string.
pub fn read_symbol<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<String> {
    output.write_all(SYMBOL_PROMPT.as_bytes())?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    Ok(line.trim().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn trims_and_uppercases() {
        let mut out = Vec::new();
        let symbol = read_symbol(Cursor::new("  spy \n"), &mut out).unwrap();

        assert_eq!(symbol, "SPY");
        assert_eq!(String::from_utf8(out).unwrap(), SYMBOL_PROMPT);
    }

    #[test]
    fn only_first_line_is_read() {
        let symbol = read_symbol(Cursor::new("qqq\naapl\n"), Vec::new()).unwrap();
        assert_eq!(symbol, "QQQ");
    }

    #[test]
    fn no_validation_is_applied() {
        let symbol = read_symbol(Cursor::new("brk.b\r\n"), Vec::new()).unwrap();
        assert_eq!(symbol, "BRK.B");
    }

    #[test]
    fn end_of_input_gives_empty_symbol() {
        let symbol = read_symbol(Cursor::new(""), Vec::new()).unwrap();
        assert!(symbol.is_empty());
    }
}

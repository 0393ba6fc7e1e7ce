//! A1-style cell addresses

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A single cell address such as `B3` or `$B$3`.
///
/// Rows and columns are stored 0-based; the A1 text form is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row index (0-based)
    pub row: u32,
    /// Column index (0-based, A=0)
    pub col: u16,
    /// `$` before the row number
    pub row_absolute: bool,
    /// `$` before the column letters
    pub col_absolute: bool,
}

impl CellAddress {
    /// Relative address at a 0-based position
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Address from 1-based row and column numbers, as the applications report them
    pub fn from_numbers(row: u32, col: u32) -> Result<Self> {
        if row == 0 || row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row.saturating_sub(1), MAX_ROWS - 1));
        }
        if col == 0 || col > MAX_COLS as u32 {
            return Err(Error::ColumnOutOfBounds(
                col.saturating_sub(1).min(u16::MAX as u32) as u16,
                MAX_COLS - 1,
            ));
        }
        Ok(Self::new(row - 1, (col - 1) as u16))
    }

    /// Parse `A1`, `$A$1`, `a1` (surrounding whitespace is ignored)
    ///
    /// ```
    /// use office_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("$C$7").unwrap();
    /// assert_eq!((addr.row, addr.col), (6, 2));
    /// assert!(addr.row_absolute && addr.col_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        let mut rest = text;

        let col_absolute = rest.starts_with('$');
        if col_absolute {
            rest = &rest[1..];
        }

        let letters_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphabetic())
            .count();
        if letters_len == 0 {
            return Err(Error::InvalidAddress(format!("no column letters in '{text}'")));
        }
        let col = Self::letters_to_column(&rest[..letters_len])?;
        rest = &rest[letters_len..];

        let row_absolute = rest.starts_with('$');
        if row_absolute {
            rest = &rest[1..];
        }

        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!("invalid row number in '{text}'")));
        }
        let row: u32 = rest
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{text}'")))?;
        if row == 0 {
            return Err(Error::InvalidAddress(format!("row number must be >= 1 in '{text}'")));
        }
        if row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row - 1, MAX_ROWS - 1));
        }

        Ok(Self {
            row: row - 1,
            col,
            row_absolute,
            col_absolute,
        })
    }

    /// Convert column letters to a 0-based index (`A` → 0, `AA` → 26)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() || letters.len() > 3 {
            return Err(Error::InvalidAddress(format!("bad column letters '{letters}'")));
        }
        let mut value: u32 = 0;
        for b in letters.bytes() {
            if !b.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!("bad column letters '{letters}'")));
            }
            value = value * 26 + (b.to_ascii_uppercase() - b'A' + 1) as u32;
        }
        let index = value - 1;
        if index >= MAX_COLS as u32 {
            return Err(Error::ColumnOutOfBounds(
                index.min(u16::MAX as u32) as u16,
                MAX_COLS - 1,
            ));
        }
        Ok(index as u16)
    }

    /// Convert a 0-based column index to letters (0 → `A`, 26 → `AA`)
    pub fn column_to_letters(col: u16) -> String {
        let mut n = col as u32 + 1;
        let mut out = Vec::with_capacity(3);
        while n > 0 {
            let rem = (n - 1) % 26;
            out.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        out.reverse();
        String::from_utf8(out).unwrap_or_default()
    }

    /// 1-based row number
    pub fn row_number(&self) -> u32 {
        self.row + 1
    }

    /// 1-based column number
    pub fn col_number(&self) -> u32 {
        self.col as u32 + 1
    }

    /// Relative A1 text (`B3`), ignoring the absolute flags
    pub fn to_a1(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row + 1)
    }

    /// Fully absolute text (`$B$3`)
    pub fn to_absolute(&self) -> String {
        format!("${}${}", Self::column_to_letters(self.col), self.row + 1)
    }

    /// Address moved by a row/column delta, or `None` if it leaves the sheet
    pub fn offset(&self, rows: i64, cols: i64) -> Option<Self> {
        let row = self.row as i64 + rows;
        let col = self.col as i64 + cols;
        if row < 0 || col < 0 || row >= MAX_ROWS as i64 || col >= MAX_COLS as i64 {
            return None;
        }
        Some(Self::new(row as u32, col as u16))
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col_absolute {
            f.write_str("$")?;
        }
        f.write_str(&Self::column_to_letters(self.col))?;
        if self.row_absolute {
            f.write_str("$")?;
        }
        write!(f, "{}", self.row + 1)
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relative_and_absolute() {
        let a = CellAddress::parse("B3").unwrap();
        assert_eq!((a.row, a.col), (2, 1));
        assert!(!a.row_absolute && !a.col_absolute);

        let b = CellAddress::parse(" $AA$10 ").unwrap();
        assert_eq!((b.row, b.col), (9, 26));
        assert_eq!(b.to_string(), "$AA$10");

        let mixed = CellAddress::parse("c$4").unwrap();
        assert!(mixed.row_absolute);
        assert!(!mixed.col_absolute);
        assert_eq!(mixed.to_string(), "C$4");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "12", "A", "A0", "A1B", "$", "A-1", "1A"] {
            assert!(CellAddress::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_bounds() {
        assert!(CellAddress::parse("XFD1048576").is_ok());
        assert!(CellAddress::parse("XFE1").is_err());
        assert!(CellAddress::parse("A1048577").is_err());
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(CellAddress::column_to_letters(0), "A");
        assert_eq!(CellAddress::column_to_letters(25), "Z");
        assert_eq!(CellAddress::column_to_letters(26), "AA");
        assert_eq!(CellAddress::column_to_letters(701), "ZZ");
        assert_eq!(CellAddress::column_to_letters(702), "AAA");
        assert_eq!(CellAddress::letters_to_column("zz").unwrap(), 701);
        assert_eq!(CellAddress::letters_to_column("XFD").unwrap(), 16383);
    }

    #[test]
    fn test_absolute_text_and_numbers() {
        let a = CellAddress::from_numbers(5, 3).unwrap();
        assert_eq!(a.to_a1(), "C5");
        assert_eq!(a.to_absolute(), "$C$5");
        assert_eq!((a.row_number(), a.col_number()), (5, 3));
        assert!(CellAddress::from_numbers(0, 1).is_err());
    }

    #[test]
    fn test_offset() {
        let a = CellAddress::parse("B2").unwrap();
        assert_eq!(a.offset(1, 1).unwrap().to_a1(), "C3");
        assert!(a.offset(-2, 0).is_none());
    }
}

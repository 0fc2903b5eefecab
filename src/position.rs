use derive_more::Display;

/// A place in some source text, resolved from a byte offset.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[display("[{line}:{column}]")]
pub struct Position {
    /// Byte offset. Starts at 0.
    pub offset: usize,
    /// Starts at 1.
    pub line: usize,
    /// Counted in characters. Starts at 1.
    pub column: usize,
}

impl Position {
    /// Resolve `offset` in `text`. The offset must lie on a char boundary.
    pub fn locate(text: &str, offset: usize) -> Self {
        let before = &text[..offset];
        let line = before.chars().filter(|&c| c == '\n').count() + 1;
        let column = before.chars().rev().take_while(|&c| c != '\n').count() + 1;
        Self {
            offset,
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn start_of_text() {
        let p = Position::locate("abc", 0);
        assert_eq!((p.line, p.column), (1, 1));
        assert_eq!(p.to_string(), "[1:1]");
    }

    #[test]
    fn after_newlines() {
        let text = indoc! {"
            x = 1;
            y = 22;
        "};
        let offset = text.find("22").unwrap();
        let p = Position::locate(text, offset);
        assert_eq!(p.offset, offset);
        assert_eq!((p.line, p.column), (2, 5));
    }

    #[test]
    fn columns_count_chars_not_bytes() {
        let text = "ää$";
        let p = Position::locate(text, text.find('$').unwrap());
        assert_eq!(p.column, 3);
    }
}

use crate::engine::{BoardState, Color};
use crate::error::ParseError;

/// Parses an array of string slices into a `BoardState` of liquid containers.
///
/// Each string slice is one container, listed from index 0. Characters run
/// from the bottom unit to the top unit and use the single-letter palette codes
/// (see [`Color::to_char`]). An empty string, `"."` or `"-"` is an empty
/// container; `.` characters after the units are treated as free slots and
/// ignored, so the output of `BoardState`'s `Display` parses back.
///
/// # Returns
/// * `Ok(BoardState)` if every character is a known color and no container
///   exceeds `capacity`.
/// * `Err(ParseError)` otherwise.
///
/// # Examples
/// ```
/// use pour_sort::utils::board_from_rows;
/// use pour_sort::engine::Color;
///
/// let board = board_from_rows(&["RGBR", "GB", ""], 4).unwrap();
/// assert_eq!(board.len(), 3);
/// assert_eq!(board.color_columns()[1], vec![Color::Green, Color::Blue]);
/// assert!(board.container(2).unwrap().is_empty());
///
/// assert!(board_from_rows(&["RXB"], 4).is_err());
/// assert!(board_from_rows(&["RRRRR"], 4).is_err());
/// ```
pub fn board_from_rows(rows: &[&str], capacity: usize) -> Result<BoardState, ParseError> {
    if capacity == 0 {
        return Err(ParseError::ZeroCapacity);
    }
    if rows.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut columns = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let row = row.trim();
        let mut colors = Vec::new();
        if row != "-" {
            for ch in row.chars().filter(|ch| *ch != '.' && !ch.is_whitespace()) {
                let color = Color::from_char(ch)
                    .ok_or(ParseError::UnknownColor { ch, container: idx })?;
                colors.push(color);
            }
        }
        if colors.len() > capacity {
            return Err(ParseError::Overfull {
                container: idx,
                len: colors.len(),
                capacity,
            });
        }
        columns.push(colors);
    }
    Ok(BoardState::from_colors(capacity, &columns))
}

/// Parses a whole board file: one container per line, `#` starts a comment,
/// blank lines are skipped. Use `.` or `-` for an empty container.
pub fn board_from_text(text: &str, capacity: usize) -> Result<BoardState, ParseError> {
    let rows: Vec<&str> = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .collect();
    board_from_rows(&rows, capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_from_rows_valid() {
        let board = board_from_rows(&["RGBR", "GBRG", "BRGB", ""], 4).unwrap();
        assert_eq!(board.len(), 4);
        assert_eq!(board.total_units(), 12);
        assert_eq!(
            board.color_columns()[0],
            vec![Color::Red, Color::Green, Color::Blue, Color::Red]
        );
    }

    #[test]
    fn test_board_from_rows_invalid_char() {
        let err = board_from_rows(&["RG", "RZ"], 4).unwrap_err();
        assert!(matches!(err, ParseError::UnknownColor { ch: 'Z', container: 1 }));
    }

    #[test]
    fn test_board_from_rows_overfull() {
        let err = board_from_rows(&["RGB"], 2).unwrap_err();
        assert!(matches!(err, ParseError::Overfull { container: 0, len: 3, capacity: 2 }));
    }

    #[test]
    fn test_board_from_rows_empty_markers() {
        let board = board_from_rows(&["-", ".", "R...", ""], 4).unwrap();
        assert_eq!(board.total_units(), 1);
        assert_eq!(board.len(), 4);
    }

    #[test]
    fn test_board_from_text_skips_comments_and_blanks() {
        let text = "# tutorial layout\nRGBR\n\nGBRG  # second\nBRGB\n.\n";
        let board = board_from_text(text, 4).unwrap();
        assert_eq!(board.len(), 4);
        assert!(board.container(3).unwrap().is_empty());
    }

    #[test]
    fn test_display_output_parses_back() {
        let board = board_from_rows(&["RGB", "", "YYYY"], 4).unwrap();
        let reparsed = board_from_text(&board.to_string(), 4).unwrap();
        assert_eq!(reparsed, board);
    }

    #[test]
    fn test_board_from_rows_rejects_empty_and_zero_capacity() {
        assert!(matches!(board_from_rows(&[], 4), Err(ParseError::Empty)));
        assert!(matches!(board_from_rows(&["R"], 0), Err(ParseError::ZeroCapacity)));
    }
}

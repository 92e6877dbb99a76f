/// Outcome of parsing a reply to a "pick item #N" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// A valid 1-based pick, returned as a 0-based index.
    Index(usize),
    /// The member typed `exit`.
    Exit,
    /// Not a number, or out of range.
    Invalid,
}

/// Parse a selection reply against a listing of `len` items.
///
/// Indexes are 1-based in the prompt and stay stable for the whole session:
/// the listing is snapshotted when the flow starts, never re-fetched.
pub fn parse_selection(input: &str, len: usize) -> Selection {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        return Selection::Exit;
    }
    match trimmed.parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Selection::Index(n - 1),
        _ => Selection::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_based_picks_map_to_zero_based() {
        assert_eq!(parse_selection("1", 3), Selection::Index(0));
        assert_eq!(parse_selection(" 3 ", 3), Selection::Index(2));
    }

    #[test]
    fn exit_wins_in_any_case() {
        assert_eq!(parse_selection("exit", 3), Selection::Exit);
        assert_eq!(parse_selection("EXIT", 3), Selection::Exit);
    }

    #[test]
    fn out_of_range_and_garbage_are_invalid() {
        assert_eq!(parse_selection("0", 3), Selection::Invalid);
        assert_eq!(parse_selection("4", 3), Selection::Invalid);
        assert_eq!(parse_selection("abc", 3), Selection::Invalid);
        assert_eq!(parse_selection("1", 0), Selection::Invalid);
    }
}

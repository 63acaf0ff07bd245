// the collection of utility functions for bracket-aware string scanning and
// identifier validation, used by the equation splitter and the namespace

/// Returns positions of `target_char` occurring at bracket depth zero.
pub fn find_char_positions_outside_brackets(input: &str, target_char: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut depth: i32 = 0;

    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if depth == 0 && c == target_char => positions.push(i),
            _ => {}
        }
    }

    positions
}

/// Checks that every opening bracket has a matching closing one.
pub fn brackets_balanced(s: &str) -> bool {
    let mut depth: i32 = 0;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// A valid bare identifier: starts with an alphabetic character or '_',
/// continues with alphanumerics or '_'. Unicode letters are allowed so that
/// perturbation names like "δu" are valid.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_outside_brackets() {
        let pos = find_char_positions_outside_brackets("a + f(b + c) + d", '+');
        assert_eq!(pos, vec![2, 13]);
    }

    #[test]
    fn test_brackets_balanced() {
        assert!(brackets_balanced("f(g(x) + 1)"));
        assert!(!brackets_balanced("f(g(x) + 1"));
        assert!(!brackets_balanced(")("));
    }

    #[test]
    fn test_identifiers() {
        assert!(is_valid_identifier("u"));
        assert!(is_valid_identifier("_tmp1"));
        assert!(is_valid_identifier("δu"));
        assert!(!is_valid_identifier("2u"));
        assert!(!is_valid_identifier("d x"));
        assert!(!is_valid_identifier(""));
    }
}

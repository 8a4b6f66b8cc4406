/// Characters with a structural meaning in Newick. A bare label cannot contain any of them.
pub const RESERVED_CHARS: &[char] = &['(', ')', '[', ']', '{', '}', ':', ';', ','];

/// Default quotation mark for labels.
pub const DEFAULT_QUOTATION_MARK: char = '\'';

/// Returns `true` if `c` ends a bare label.
pub fn is_delimiter(c: char, quotation_mark: char) -> bool {
    c.is_whitespace() || c == quotation_mark || RESERVED_CHARS.contains(&c)
}

/// Returns `true` if `name` cannot be written as a bare label.
pub fn needs_quoting(name: &str, quotation_mark: char) -> bool {
    name.chars().any(|c| is_delimiter(c, quotation_mark))
}

/// Wraps `name` in `quotation_mark`, doubling every embedded quotation mark.
pub fn quote_label(name: &str, quotation_mark: char) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push(quotation_mark);
    for c in name.chars() {
        if c == quotation_mark {
            quoted.push(quotation_mark);
        }
        quoted.push(c);
    }
    quoted.push(quotation_mark);
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_quoting() {
        assert!(!needs_quoting("Homo_sapiens", '\''));
        assert!(needs_quoting("Homo sapiens", '\''));
        assert!(needs_quoting("a:b", '\''));
        assert!(needs_quoting("it's", '\''));
        assert!(!needs_quoting("it's", '"'));
        assert!(!needs_quoting("", '\''));
    }

    #[test]
    fn test_quote_label_doubles_quotes() {
        assert_eq!(quote_label("a b", '\''), "'a b'");
        assert_eq!(quote_label("it's", '\''), "'it''s'");
        assert_eq!(quote_label("''", '\''), "''''''");
    }
}

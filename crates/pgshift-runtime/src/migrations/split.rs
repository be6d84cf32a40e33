//! Splitting trusted SQL scripts into statements.

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuoted,
    /// `E'...'` literal where backslash escapes the next byte.
    EscapeQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(usize),
    DollarQuoted(Vec<u8>),
}

/// Split SQL into individual statements.
///
/// Semicolons inside string literals, quoted identifiers, dollar-quoted
/// bodies and comments do not terminate a statement. Fragments holding only
/// whitespace or comments are dropped. The trailing `;` is not kept.
pub fn split_statements(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut state = State::Normal;
    let mut start = 0;
    let mut has_code = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            State::Normal => match b {
                b';' => {
                    push_statement(&mut statements, &sql[start..i], has_code);
                    has_code = false;
                    start = i + 1;
                    i += 1;
                }
                b'-' if bytes.get(i + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    i += 2;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    i += 2;
                }
                b'\'' => {
                    has_code = true;
                    state = if escape_prefix(bytes, i) {
                        State::EscapeQuoted
                    } else {
                        State::SingleQuoted
                    };
                    i += 1;
                }
                b'"' => {
                    has_code = true;
                    state = State::DoubleQuoted;
                    i += 1;
                }
                b'$' => {
                    has_code = true;
                    // `$` inside an identifier such as `a$b$c` opens nothing
                    let in_ident = i > 0 && is_ident_byte(bytes[i - 1]);
                    match (!in_ident).then(|| dollar_tag(&bytes[i..])).flatten() {
                        Some(tag) => {
                            i += tag.len();
                            state = State::DollarQuoted(tag);
                        }
                        None => i += 1,
                    }
                }
                _ => {
                    if !b.is_ascii_whitespace() {
                        has_code = true;
                    }
                    i += 1;
                }
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    // '' is an escaped quote
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 2;
                        continue;
                    }
                    state = State::Normal;
                }
                i += 1;
            }
            State::EscapeQuoted => match b {
                b'\\' => i += 2,
                b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
                b'\'' => {
                    state = State::Normal;
                    i += 1;
                }
                _ => i += 1,
            },
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(i + 1) == Some(&b'"') {
                        i += 2;
                        continue;
                    }
                    state = State::Normal;
                }
                i += 1;
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
                i += 1;
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    i += 2;
                } else if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    i += 2;
                } else {
                    i += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if bytes[i..].starts_with(tag) {
                    i += tag.len();
                    state = State::Normal;
                } else {
                    i += 1;
                }
            }
        }
    }

    push_statement(&mut statements, &sql[start..], has_code);
    statements
}

/// Whether the script holds no executable statement.
pub fn is_blank(sql: &str) -> bool {
    split_statements(sql).is_empty()
}

fn push_statement(statements: &mut Vec<String>, fragment: &str, has_code: bool) {
    let stmt = fragment.trim();
    if has_code && !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
}

/// Bytes that may continue an identifier. Non-ASCII counts, as in PostgreSQL.
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Whether the quote at `quote` opens an `E'...'` literal.
fn escape_prefix(bytes: &[u8], quote: usize) -> bool {
    if quote == 0 || !matches!(bytes[quote - 1], b'E' | b'e') {
        return false;
    }
    quote < 2 || !is_ident_byte(bytes[quote - 2])
}

/// Match a dollar-quote delimiter (`$$` or `$tag$`) at the start of `rest`.
fn dollar_tag(rest: &[u8]) -> Option<Vec<u8>> {
    let mut j = 1;
    while j < rest.len() {
        let c = rest[j];
        if c == b'$' {
            return Some(rest[..=j].to_vec());
        }
        let valid = c == b'_' || c.is_ascii_alphabetic() || (j > 1 && c.is_ascii_digit());
        if !valid {
            return None;
        }
        j += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_statements() {
        let stmts = split_statements("SELECT 1; SELECT 2; SELECT 3;");
        assert_eq!(stmts, vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
    }

    #[test]
    fn test_last_statement_without_semicolon() {
        let stmts = split_statements("CREATE TABLE t (id INT);\nINSERT INTO t VALUES (1)");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[1], "INSERT INTO t VALUES (1)");
    }

    #[test]
    fn test_split_with_dollar_quoted_function() {
        let sql = r#"
CREATE FUNCTION test() RETURNS void AS $$
BEGIN
    PERFORM 1;
    PERFORM 2;
END;
$$ LANGUAGE plpgsql;

SELECT 3;
"#;
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("CREATE FUNCTION"));
        assert!(stmts[0].ends_with("$$ LANGUAGE plpgsql"));
        assert_eq!(stmts[1], "SELECT 3");
    }

    #[test]
    fn test_split_with_tagged_dollar_quote() {
        let sql = "DO $body$ BEGIN RAISE NOTICE 'a;b'; END $body$; SELECT 1;";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "DO $body$ BEGIN RAISE NOTICE 'a;b'; END $body$");
    }

    #[test]
    fn test_positional_parameter_is_not_a_tag() {
        let stmts = split_statements("PREPARE p AS SELECT $1; EXECUTE p(1);");
        assert_eq!(stmts, vec!["PREPARE p AS SELECT $1", "EXECUTE p(1)"]);
    }

    #[test]
    fn test_semicolons_in_literals() {
        let sql = "INSERT INTO t VALUES ('a;b', 'it''s;'); SELECT \"weird;name\" FROM t;";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "INSERT INTO t VALUES ('a;b', 'it''s;')");
        assert_eq!(stmts[1], "SELECT \"weird;name\" FROM t");
    }

    #[test]
    fn test_semicolons_in_comments() {
        let sql = "-- drop it; later\nDROP TABLE t; /* nested /* ; */ still; */ SELECT 1;";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].ends_with("DROP TABLE t"));
        assert!(stmts[1].ends_with("SELECT 1"));
    }

    #[test]
    fn test_comment_only_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("   \n\t"));
        assert!(is_blank("-- Write your migration here;\n-- nothing yet\n"));
        assert!(is_blank("/* block */ ;;"));
        assert!(!is_blank("-- comment\nSELECT 1"));
    }

    #[test]
    fn test_trailing_comment_dropped() {
        let stmts = split_statements("SELECT 1; -- done");
        assert_eq!(stmts, vec!["SELECT 1"]);
    }

    #[test]
    fn test_escape_string_with_backslash_quote() {
        let sql = r"INSERT INTO t VALUES (E'it\'s; fine'); SELECT 1;";
        let stmts = split_statements(sql);
        assert_eq!(stmts, vec![r"INSERT INTO t VALUES (E'it\'s; fine')", "SELECT 1"]);
    }

    #[test]
    fn test_backslash_in_plain_literal_is_literal() {
        let sql = r"INSERT INTO t VALUES ('C:\'); INSERT INTO t VALUES (e'a\\'); SELECT 1;";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0], r"INSERT INTO t VALUES ('C:\')");
        assert_eq!(stmts[1], r"INSERT INTO t VALUES (e'a\\')");
    }

    #[test]
    fn test_identifier_ending_in_e_is_not_escape_prefix() {
        let stmts = split_statements(r"SELECT name'x\'; SELECT 2;");
        assert_eq!(stmts, vec![r"SELECT name'x\'", "SELECT 2"]);
    }

    #[test]
    fn test_dollar_inside_identifier_is_not_a_tag() {
        let stmts = split_statements("CREATE TABLE a$b$c (id INT); SELECT 1;");
        assert_eq!(stmts, vec!["CREATE TABLE a$b$c (id INT)", "SELECT 1"]);
    }

    #[test]
    fn test_multibyte_text_in_dollar_body() {
        let sql = "COMMENT ON TABLE t IS $$héllo; wörld$$; SELECT 'ü';";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "COMMENT ON TABLE t IS $$héllo; wörld$$");
    }
}

//! Content stream tokenizer for PDF operator/operand parsing.
//!
//! [`Lexer`] walks raw content stream bytes and yields [`Operator`]s, each
//! carrying the [`Operand`]s that preceded it. A malformed token yields an
//! error, after which the lexer drops the pending operands, skips to the next
//! token boundary and keeps going.

use crate::error::BackendError;

/// Deepest array/dictionary nesting accepted in an operand.
const MAX_NESTING: usize = 256;

/// A PDF content stream operand value.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Integer number (e.g., `42`, `-7`).
    Integer(i64),
    /// Real (floating-point) number (e.g., `3.14`, `.5`).
    Real(f64),
    /// Name object (e.g., `/F1`, `/DeviceRGB`). Stored without the leading `/`.
    Name(String),
    /// Literal string delimited by parentheses, stored as raw bytes.
    LiteralString(Vec<u8>),
    /// Hexadecimal string delimited by angle brackets, stored as decoded bytes.
    HexString(Vec<u8>),
    /// Array of operands (e.g., `[1 2 3]`).
    Array(Vec<Operand>),
    /// Boolean value (`true` or `false`).
    Boolean(bool),
    /// The null object.
    Null,
    /// Dictionary object (`<< /Key value ... >>`).
    Dictionary(Vec<(String, Operand)>),
}

impl Operand {
    /// Numeric value of an integer or real operand.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Integer(i) => Some(*i as f64),
            Operand::Real(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Bytes of a literal or hex string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Operand::LiteralString(s) | Operand::HexString(s) => Some(s),
            _ => None,
        }
    }
}

/// A PDF content stream operator with its preceding operands.
///
/// Inline images are reported as a `BI` operator whose operands are the
/// image dictionary followed by the raw data as a literal string.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    /// Operator name (e.g., `"BT"`, `"Tf"`, `"Tj"`, `"m"`).
    pub name: String,
    /// Operands that preceded this operator on the operand stack.
    pub operands: Vec<Operand>,
}

/// Streaming, fail-soft content stream lexer.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    stack: Vec<Operand>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            stack: Vec::new(),
        }
    }

    fn next_operator(&mut self) -> Option<Result<Operator, BackendError>> {
        loop {
            skip_whitespace_and_comments(self.input, &mut self.pos);
            if self.pos >= self.input.len() {
                return None;
            }
            let start = self.pos;
            match self.input[self.pos] {
                b'a'..=b'z' | b'A'..=b'Z' | b'*' | b'\'' | b'"' => {
                    let keyword = parse_keyword(self.input, &mut self.pos);
                    match keyword.as_str() {
                        "true" => self.stack.push(Operand::Boolean(true)),
                        "false" => self.stack.push(Operand::Boolean(false)),
                        "null" => self.stack.push(Operand::Null),
                        "BI" => {
                            self.stack.clear();
                            return Some(match parse_inline_image(self.input, &mut self.pos) {
                                Ok((dict, data)) => Ok(Operator {
                                    name: keyword,
                                    operands: vec![
                                        Operand::Dictionary(dict),
                                        Operand::LiteralString(data),
                                    ],
                                }),
                                Err(e) => {
                                    self.resync(start);
                                    Err(e)
                                }
                            });
                        }
                        _ => {
                            return Some(Ok(Operator {
                                name: keyword,
                                operands: std::mem::take(&mut self.stack),
                            }));
                        }
                    }
                }
                b']' | b')' | b'>' | b'{' | b'}' => {
                    self.resync(start);
                    return Some(Err(BackendError::Interpreter(format!(
                        "unexpected '{}' at byte {start}",
                        self.input[start] as char
                    ))));
                }
                _ => match parse_value(self.input, &mut self.pos, 0) {
                    Ok(value) => self.stack.push(value),
                    Err(e) => {
                        self.resync(start);
                        return Some(Err(e));
                    }
                },
            }
        }
    }

    /// Drop pending operands and move past the bad token.
    fn resync(&mut self, start: usize) {
        self.stack.clear();
        self.pos = self.pos.max(start + 1);
        while self.pos < self.input.len()
            && !is_whitespace(self.input[self.pos])
            && !is_delimiter(self.input[self.pos])
        {
            self.pos += 1;
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Operator, BackendError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_operator()
    }
}

/// Parse PDF content stream bytes into a sequence of operators.
///
/// Strict variant of [`Lexer`]: the first malformed token aborts.
///
/// # Errors
///
/// Returns [`BackendError::Interpreter`] for malformed content streams.
pub fn tokenize(input: &[u8]) -> Result<Vec<Operator>, BackendError> {
    Lexer::new(input).collect()
}

/// Returns `true` if `b` is a PDF whitespace character.
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

/// Returns `true` if `b` is a PDF delimiter character.
fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Skip whitespace and comments.
fn skip_whitespace_and_comments(input: &[u8], pos: &mut usize) {
    while *pos < input.len() {
        if is_whitespace(input[*pos]) {
            *pos += 1;
        } else if input[*pos] == b'%' {
            while *pos < input.len() && input[*pos] != b'\n' && input[*pos] != b'\r' {
                *pos += 1;
            }
        } else {
            break;
        }
    }
}

/// Parse one operand value: number, name, string, array or dictionary.
///
/// Bare keywords other than `true`/`false`/`null` become names, which is
/// how they appear inside arrays and inline image dictionaries. `depth` is
/// the number of enclosing arrays and dictionaries.
fn parse_value(input: &[u8], pos: &mut usize, depth: usize) -> Result<Operand, BackendError> {
    let b = input[*pos];
    let opens = b == b'[' || (b == b'<' && input.get(*pos + 1) == Some(&b'<'));
    if opens && depth >= MAX_NESTING {
        return Err(BackendError::Interpreter(format!(
            "operand nesting exceeds {MAX_NESTING} at byte {}",
            *pos
        )));
    }
    match b {
        b'/' => Ok(Operand::Name(parse_name(input, pos))),
        b'(' => Ok(Operand::LiteralString(parse_literal_string(input, pos)?)),
        b'<' if input.get(*pos + 1) == Some(&b'<') => {
            Ok(Operand::Dictionary(parse_dictionary(input, pos, depth + 1)?))
        }
        b'<' => Ok(Operand::HexString(parse_hex_string(input, pos)?)),
        b'[' => {
            *pos += 1;
            Ok(Operand::Array(parse_array(input, pos, depth + 1)?))
        }
        b'0'..=b'9' | b'+' | b'-' | b'.' => parse_number(input, pos),
        b'a'..=b'z' | b'A'..=b'Z' => {
            let kw = parse_keyword(input, pos);
            Ok(match kw.as_str() {
                "true" => Operand::Boolean(true),
                "false" => Operand::Boolean(false),
                "null" => Operand::Null,
                _ => Operand::Name(kw),
            })
        }
        _ => Err(BackendError::Interpreter(format!(
            "unexpected byte 0x{b:02X} at {}",
            *pos
        ))),
    }
}

/// Parse a literal string `(...)` with balanced parentheses and escape sequences.
fn parse_literal_string(input: &[u8], pos: &mut usize) -> Result<Vec<u8>, BackendError> {
    *pos += 1;

    let mut result = Vec::new();
    let mut depth = 1u32;

    while *pos < input.len() {
        let b = input[*pos];
        *pos += 1;
        match b {
            b'(' => {
                depth += 1;
                result.push(b);
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(result);
                }
                result.push(b);
            }
            b'\\' => {
                let Some(&escaped) = input.get(*pos) else {
                    break;
                };
                *pos += 1;
                match escaped {
                    b'n' => result.push(b'\n'),
                    b'r' => result.push(b'\r'),
                    b't' => result.push(b'\t'),
                    b'b' => result.push(0x08),
                    b'f' => result.push(0x0C),
                    // line continuation
                    b'\r' => {
                        if input.get(*pos) == Some(&b'\n') {
                            *pos += 1;
                        }
                    }
                    b'\n' => {}
                    b'0'..=b'7' => {
                        let mut val = u32::from(escaped - b'0');
                        for _ in 0..2 {
                            match input.get(*pos) {
                                Some(&d @ b'0'..=b'7') => {
                                    val = val * 8 + u32::from(d - b'0');
                                    *pos += 1;
                                }
                                _ => break,
                            }
                        }
                        result.push((val & 0xFF) as u8);
                    }
                    // \( \) \\ and unknown escapes keep the character
                    other => result.push(other),
                }
            }
            _ => result.push(b),
        }
    }

    Err(BackendError::Interpreter(
        "unterminated literal string".to_string(),
    ))
}

/// Parse a hex string `<...>`. An odd digit count is padded with `0`.
fn parse_hex_string(input: &[u8], pos: &mut usize) -> Result<Vec<u8>, BackendError> {
    *pos += 1;

    let mut digits = Vec::new();
    let mut bad = None;
    while *pos < input.len() {
        let b = input[*pos];
        *pos += 1;
        if b == b'>' {
            break;
        }
        if !is_whitespace(b) {
            match hex_digit(b) {
                Ok(d) => digits.push(d),
                Err(e) => {
                    bad.get_or_insert(e);
                }
            }
        }
    }
    // the whole string is consumed before reporting a bad digit
    if let Some(e) = bad {
        return Err(e);
    }
    if digits.len() % 2 != 0 {
        digits.push(0);
    }
    Ok(digits.chunks(2).map(|c| (c[0] << 4) | c[1]).collect())
}

/// Convert a hex digit character to its value (0-15).
fn hex_digit(b: u8) -> Result<u8, BackendError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(BackendError::Interpreter(format!(
            "invalid hex digit: {:?}",
            b as char
        ))),
    }
}

/// Parse an array until `]`. Assumes `[` already consumed.
fn parse_array(input: &[u8], pos: &mut usize, depth: usize) -> Result<Vec<Operand>, BackendError> {
    let mut elements = Vec::new();
    loop {
        skip_whitespace_and_comments(input, pos);
        match input.get(*pos) {
            None => return Err(BackendError::Interpreter("unterminated array".to_string())),
            Some(b']') => {
                *pos += 1;
                return Ok(elements);
            }
            Some(_) => elements.push(parse_value(input, pos, depth)?),
        }
    }
}

/// Parse a dictionary `<< /Key value ... >>`. Assumes current bytes are `<<`.
fn parse_dictionary(
    input: &[u8],
    pos: &mut usize,
    depth: usize,
) -> Result<Vec<(String, Operand)>, BackendError> {
    *pos += 2;

    let mut entries = Vec::new();
    loop {
        skip_whitespace_and_comments(input, pos);
        match input.get(*pos) {
            None => {
                return Err(BackendError::Interpreter(
                    "unterminated dictionary".to_string(),
                ));
            }
            Some(b'>') if input.get(*pos + 1) == Some(&b'>') => {
                *pos += 2;
                return Ok(entries);
            }
            Some(b'/') => {
                let key = parse_name(input, pos);
                skip_whitespace_and_comments(input, pos);
                if *pos >= input.len() {
                    return Err(BackendError::Interpreter(
                        "unterminated dictionary value".to_string(),
                    ));
                }
                let value = parse_value(input, pos, depth)?;
                entries.push((key, value));
            }
            Some(_) => {
                return Err(BackendError::Interpreter(
                    "expected name key in dictionary".to_string(),
                ));
            }
        }
    }
}

/// Parse a `/Name` token, decoding `#XX` escapes. Assumes current byte is `/`.
fn parse_name(input: &[u8], pos: &mut usize) -> String {
    *pos += 1;

    let start = *pos;
    while *pos < input.len() && !is_whitespace(input[*pos]) && !is_delimiter(input[*pos]) {
        *pos += 1;
    }

    let raw = &input[start..*pos];
    let mut name = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            if let (Ok(hi), Ok(lo)) = (hex_digit(raw[i + 1]), hex_digit(raw[i + 2])) {
                name.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        name.push(raw[i]);
        i += 1;
    }

    String::from_utf8_lossy(&name).into_owned()
}

/// Parse a number (integer or real).
fn parse_number(input: &[u8], pos: &mut usize) -> Result<Operand, BackendError> {
    let start = *pos;
    let mut has_dot = false;

    if matches!(input.get(*pos), Some(b'+' | b'-')) {
        *pos += 1;
    }
    while let Some(&b) = input.get(*pos) {
        if b == b'.' && !has_dot {
            has_dot = true;
        } else if !b.is_ascii_digit() {
            break;
        }
        *pos += 1;
    }

    let token = &input[start..*pos];
    let s = std::str::from_utf8(token)
        .map_err(|_| BackendError::Interpreter("invalid UTF-8 in number token".to_string()))?;

    if has_dot {
        // "5." and "-.5" are valid reals; "." and "-." are not
        s.parse::<f64>()
            .map(Operand::Real)
            .map_err(|_| BackendError::Interpreter(format!("invalid real number: {s}")))
    } else {
        match s.parse::<i64>() {
            Ok(v) => Ok(Operand::Integer(v)),
            // integers too large for i64 are still numbers
            Err(_) if s.len() > 1 => s
                .parse::<f64>()
                .map(Operand::Real)
                .map_err(|_| BackendError::Interpreter(format!("invalid integer: {s}"))),
            Err(_) => Err(BackendError::Interpreter(format!("invalid integer: {s}"))),
        }
    }
}

/// Parse a keyword: regular characters up to the next whitespace or
/// delimiter, so operators such as `d0`, `T*` and `'` are accepted.
fn parse_keyword(input: &[u8], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < input.len() && !is_whitespace(input[*pos]) && !is_delimiter(input[*pos]) {
        *pos += 1;
    }
    String::from_utf8_lossy(&input[start..*pos]).into_owned()
}

/// Inline image dictionary entries: key-value pairs.
type InlineImageDict = Vec<(String, Operand)>;

/// Parse inline image data: `BI <dict entries> ID <data> EI`.
/// Called after `BI` keyword has been consumed.
fn parse_inline_image(
    input: &[u8],
    pos: &mut usize,
) -> Result<(InlineImageDict, Vec<u8>), BackendError> {
    let mut dict = Vec::new();

    loop {
        skip_whitespace_and_comments(input, pos);
        if *pos >= input.len() {
            return Err(BackendError::Interpreter(
                "unterminated inline image (missing ID)".to_string(),
            ));
        }
        if input[*pos..].starts_with(b"ID")
            && input.get(*pos + 2).is_none_or(|&b| is_whitespace(b))
        {
            *pos += 2;
            // one whitespace byte separates ID from the data
            if input.get(*pos).is_some_and(|&b| is_whitespace(b)) {
                *pos += 1;
            }
            break;
        }
        if input[*pos] != b'/' {
            return Err(BackendError::Interpreter(
                "expected name key in inline image dictionary".to_string(),
            ));
        }
        let key = parse_name(input, pos);
        skip_whitespace_and_comments(input, pos);
        if *pos >= input.len() {
            return Err(BackendError::Interpreter(
                "unterminated inline image dictionary".to_string(),
            ));
        }
        let value = parse_value(input, pos, 1)?;
        dict.push((key, value));
    }

    // EI must be preceded by whitespace and followed by whitespace, a
    // delimiter or the end of the stream.
    let data_start = *pos;
    while *pos + 2 <= input.len() {
        let at_ei = input[*pos..].starts_with(b"EI")
            && (*pos == data_start || is_whitespace(input[*pos - 1]))
            && input
                .get(*pos + 2)
                .is_none_or(|&b| is_whitespace(b) || is_delimiter(b));
        if at_ei {
            let mut end = *pos;
            if end > data_start && is_whitespace(input[end - 1]) {
                end -= 1;
            }
            let data = input[data_start..end].to_vec();
            *pos += 2;
            return Ok((dict, data));
        }
        *pos += 1;
    }

    Err(BackendError::Interpreter(
        "unterminated inline image (missing EI)".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_integer() {
        let ops = tokenize(b"42 m").unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name, "m");
        assert_eq!(ops[0].operands, vec![Operand::Integer(42)]);
    }

    #[test]
    fn parse_reals() {
        let ops = tokenize(b"3.5 .5 -.002 5. w").unwrap();
        assert_eq!(
            ops[0].operands,
            vec![
                Operand::Real(3.5),
                Operand::Real(0.5),
                Operand::Real(-0.002),
                Operand::Real(5.0)
            ]
        );
    }

    #[test]
    fn parse_name_operand() {
        let ops = tokenize(b"/F1 12 Tf").unwrap();
        assert_eq!(ops[0].name, "Tf");
        assert_eq!(
            ops[0].operands,
            vec![Operand::Name("F1".to_string()), Operand::Integer(12)]
        );
    }

    #[test]
    fn parse_name_with_hex_escape() {
        let ops = tokenize(b"/F#231 12 Tf").unwrap();
        assert_eq!(ops[0].operands[0], Operand::Name("F#1".to_string()));
    }

    #[test]
    fn parse_literal_strings() {
        let ops = tokenize(b"(a(b)c) Tj (line1\\nline2) Tj (\\101\\)) Tj").unwrap();
        assert_eq!(ops[0].operands, vec![Operand::LiteralString(b"a(b)c".to_vec())]);
        assert_eq!(
            ops[1].operands,
            vec![Operand::LiteralString(b"line1\nline2".to_vec())]
        );
        assert_eq!(ops[2].operands, vec![Operand::LiteralString(b"A)".to_vec())]);
    }

    #[test]
    fn literal_string_line_continuation() {
        let ops = tokenize(b"(ab\\\r\ncd) Tj").unwrap();
        assert_eq!(ops[0].operands, vec![Operand::LiteralString(b"abcd".to_vec())]);
    }

    #[test]
    fn parse_hex_strings() {
        let ops = tokenize(b"<48656C 6C6F> Tj <ABC> Tj").unwrap();
        assert_eq!(ops[0].operands, vec![Operand::HexString(b"Hello".to_vec())]);
        assert_eq!(ops[1].operands, vec![Operand::HexString(vec![0xAB, 0xC0])]);
    }

    #[test]
    fn parse_tj_array() {
        let ops = tokenize(b"[(H) -120 (ello)] TJ").unwrap();
        assert_eq!(ops[0].name, "TJ");
        assert_eq!(
            ops[0].operands,
            vec![Operand::Array(vec![
                Operand::LiteralString(b"H".to_vec()),
                Operand::Integer(-120),
                Operand::LiteralString(b"ello".to_vec()),
            ])]
        );
    }

    #[test]
    fn parse_dictionary_operand() {
        let ops = tokenize(b"/Span << /MCID 3 /Alt (x) >> BDC").unwrap();
        assert_eq!(ops[0].name, "BDC");
        assert_eq!(
            ops[0].operands[1],
            Operand::Dictionary(vec![
                ("MCID".to_string(), Operand::Integer(3)),
                ("Alt".to_string(), Operand::LiteralString(b"x".to_vec())),
            ])
        );
    }

    #[test]
    fn keywords_with_digits_and_quotes() {
        let ops = tokenize(b"500 0 d0 T* (a) ' 1 2 (b) \" f*").unwrap();
        let names: Vec<&str> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["d0", "T*", "'", "\"", "f*"]);
    }

    #[test]
    fn booleans_and_null() {
        let ops = tokenize(b"true false null op").unwrap();
        assert_eq!(
            ops[0].operands,
            vec![Operand::Boolean(true), Operand::Boolean(false), Operand::Null]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let ops = tokenize(b"% a comment\n1 0 0 RG % trailing\nS").unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].name, "RG");
        assert_eq!(ops[1].name, "S");
    }

    #[test]
    fn inline_image_is_captured() {
        let ops = tokenize(b"q BI /W 2 /H 1 /CS /G /BPC 8 ID \x00\xFF EI Q").unwrap();
        let names: Vec<&str> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["q", "BI", "Q"]);
        let Operand::Dictionary(dict) = &ops[1].operands[0] else {
            panic!("expected dictionary");
        };
        assert_eq!(dict[0], ("W".to_string(), Operand::Integer(2)));
        assert_eq!(dict[2], ("CS".to_string(), Operand::Name("G".to_string())));
        assert_eq!(ops[1].operands[1], Operand::LiteralString(vec![0x00, 0xFF]));
    }

    #[test]
    fn inline_image_data_may_contain_ei_bytes() {
        let ops = tokenize(b"BI /W 4 /H 1 ID xEIy EI").unwrap();
        assert_eq!(ops[0].operands[1], Operand::LiteralString(b"xEIy".to_vec()));
    }

    #[test]
    fn lexer_resyncs_after_garbage() {
        let results: Vec<_> = Lexer::new(b"1 0 0 rg ] 10 10 50 50 re f").collect();
        assert_eq!(results.len(), 4);
        assert!(results[1].is_err());
        let ops: Vec<Operator> = results.into_iter().filter_map(Result::ok).collect();
        assert_eq!(ops[0].name, "rg");
        assert_eq!(ops[1].name, "re");
        assert_eq!(ops[1].operands.len(), 4);
        assert_eq!(ops[2].name, "f");
    }

    #[test]
    fn lexer_drops_operands_of_bad_token() {
        let results: Vec<_> = Lexer::new(b"5 <4G> Tj 2 w").collect();
        assert!(results[0].is_err());
        let ops: Vec<Operator> = results.into_iter().filter_map(Result::ok).collect();
        assert_eq!(ops[0].name, "Tj");
        assert!(ops[0].operands.is_empty());
        assert_eq!(ops[1].operands, vec![Operand::Integer(2)]);
    }

    #[test]
    fn deep_nesting_is_rejected_without_recursing() {
        let mut content = "[".repeat(100_000);
        content.push_str(&"]".repeat(100_000));
        content.push_str(" 0 0 1 1 re f");
        let results: Vec<_> = Lexer::new(content.as_bytes()).collect();
        let first = results[0].as_ref().unwrap_err();
        assert!(first.to_string().contains("nesting"), "{first}");
        let ops: Vec<Operator> = results.into_iter().filter_map(Result::ok).collect();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].name, "re");
        assert_eq!(ops[0].operands.len(), 4);
    }

    #[test]
    fn nesting_below_the_limit_parses() {
        let depth = MAX_NESTING;
        let content = format!("{}1{} x", "[".repeat(depth), "]".repeat(depth));
        let ops = tokenize(content.as_bytes()).unwrap();
        let mut operand = &ops[0].operands[0];
        for _ in 0..depth {
            let Operand::Array(items) = operand else {
                panic!("expected an array, got {operand:?}");
            };
            operand = &items[0];
        }
        assert_eq!(*operand, Operand::Integer(1));
        let arrays = format!("{}{} x", "[".repeat(depth + 1), "]".repeat(depth + 1));
        assert!(tokenize(arrays.as_bytes()).is_err());
        let dicts = format!("{}1{} x", "<</A ".repeat(depth + 1), ">>".repeat(depth + 1));
        assert!(tokenize(dicts.as_bytes()).is_err());
    }

    #[test]
    fn strict_tokenize_reports_errors() {
        assert!(tokenize(b"(unterminated Tj").is_err());
        assert!(tokenize(b"[1 2").is_err());
    }

    #[test]
    fn operand_accessors() {
        assert_eq!(Operand::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Operand::Real(1.5).as_f64(), Some(1.5));
        assert_eq!(Operand::Name("X".into()).as_name(), Some("X"));
        assert_eq!(Operand::HexString(vec![1]).as_bytes(), Some(&[1u8][..]));
        assert!(Operand::Null.as_f64().is_none());
    }
}

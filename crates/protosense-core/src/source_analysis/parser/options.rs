// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parsing of options and literal values.
//!
//! Covers `option name = value;` statements at every level, `[...]`
//! field option lists, and the value grammar shared by both: strings
//! (with adjacent-literal concatenation), numbers in all written bases,
//! booleans, bare enum constants, and `{ ... }` aggregate values whose
//! raw text is preserved for downstream consumers.

use ecow::EcoString;

use crate::ast::{FieldOption, OptionStatement, OptionValue};
use crate::source_analysis::{Range, TokenKind};

use super::{Diagnostic, Parser};

impl Parser<'_> {
    /// Parses `option name = value;`.
    pub(super) fn parse_option_statement(&mut self) -> Option<OptionStatement> {
        let start = self.current_token().range();
        self.advance(); // option

        let Some((name, name_range)) = self.parse_option_name() else {
            self.synchronize();
            return None;
        };
        if self.expect(&TokenKind::Equals, "expected '=' after the option name").is_none() {
            self.synchronize();
            return None;
        }
        let Some(value) = self.parse_option_value() else {
            self.synchronize();
            return None;
        };
        self.expect(&TokenKind::Semicolon, "expected ';' after the option");

        Some(OptionStatement {
            name,
            name_range,
            value,
            range: start.merge(self.prev_range()),
        })
    }

    /// Parses an option name: plain (`deprecated`), dotted
    /// (`features.field_presence`), or with parenthesized extension
    /// segments (`(buf.validate.field).string.email`). Recorded
    /// verbatim, parentheses included.
    fn parse_option_name(&mut self) -> Option<(EcoString, Range)> {
        let mut name = String::new();
        let mut range: Option<Range> = None;

        loop {
            if self.check(&TokenKind::LeftParen) {
                let open_range = self.current_token().range();
                self.advance();
                let (inner, _) = self.parse_type_name("expected an extension option name")?;
                self.expect(
                    &TokenKind::RightParen,
                    "expected ')' to close the extension option name",
                )?;
                name.push('(');
                name.push_str(&inner);
                name.push(')');
                let segment_range = open_range.merge(self.prev_range());
                range = Some(range.map_or(segment_range, |r| r.merge(segment_range)));
            } else {
                let (segment, segment_range) = self.expect_identifier("expected an option name")?;
                name.push_str(&segment);
                range = Some(range.map_or(segment_range, |r| r.merge(segment_range)));
            }

            if self.match_token(&TokenKind::Dot) {
                name.push('.');
            } else {
                break;
            }
        }

        Some((name.into(), range?))
    }

    /// Parses the entries of a `[...]` field option list. The opening
    /// `[` has already been consumed; the closing `]` is consumed here.
    pub(super) fn parse_field_options(&mut self) -> Vec<FieldOption> {
        let mut options = Vec::new();
        loop {
            if self.check(&TokenKind::RightBracket) || self.is_at_end() {
                break;
            }
            let Some((name, name_range)) = self.parse_option_name() else {
                break;
            };
            if self.expect(&TokenKind::Equals, "expected '=' after the option name").is_none() {
                break;
            }
            let Some(value) = self.parse_option_value() else {
                break;
            };
            options.push(FieldOption {
                name,
                value,
                range: name_range.merge(self.prev_range()),
            });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        if self
            .expect(&TokenKind::RightBracket, "expected ']' to close the field options")
            .is_none()
        {
            // Skip to the closing bracket so the field's ';' still parses.
            while !self.check(&TokenKind::RightBracket)
                && !self.check(&TokenKind::Semicolon)
                && !self.is_at_end()
            {
                self.advance();
            }
            self.match_token(&TokenKind::RightBracket);
        }
        options
    }

    /// Parses an option value of any form.
    pub(super) fn parse_option_value(&mut self) -> Option<OptionValue> {
        match self.current_kind().clone() {
            TokenKind::StringLiteral(_) => {
                self.parse_string_value().map(|(s, _)| OptionValue::String(s))
            }
            TokenKind::LeftBrace => Some(self.parse_aggregate_value()),
            TokenKind::Plus | TokenKind::Minus | TokenKind::IntLiteral(_)
            | TokenKind::FloatLiteral(_) => self.parse_number_value(),
            TokenKind::Identifier(word) => match word.as_str() {
                "true" => {
                    self.advance();
                    Some(OptionValue::Bool(true))
                }
                "false" => {
                    self.advance();
                    Some(OptionValue::Bool(false))
                }
                "inf" | "nan" => self.parse_number_value(),
                // A bare (possibly dotted) identifier: an enum constant
                // such as `SPEED`, recorded as a string value.
                _ => {
                    let (name, _) = self.parse_type_name("expected an option value")?;
                    Some(OptionValue::String(name))
                }
            },
            _ => {
                self.error("expected an option value");
                None
            }
        }
    }

    /// Parses one or more adjacent string literals, concatenated.
    ///
    /// Adjacency may span lines; the returned range covers the whole
    /// run. Returns `None` without reporting if the current token is
    /// not a string.
    pub(super) fn parse_string_value(&mut self) -> Option<(EcoString, Range)> {
        let TokenKind::StringLiteral(first) = self.current_kind() else {
            return None;
        };
        let mut value = String::from(first.as_str());
        let mut range = self.current_token().range();
        self.advance();

        while let TokenKind::StringLiteral(next) = self.current_kind() {
            value.push_str(next);
            range = range.merge(self.current_token().range());
            self.advance();
        }
        Some((value.into(), range))
    }

    /// Parses an optionally sign-prefixed integer literal.
    ///
    /// Reports `message` and returns `None` if the current token is not
    /// an integer (after any sign).
    pub(super) fn parse_signed_integer(&mut self, message: &str) -> Option<i64> {
        let negative = if self.match_token(&TokenKind::Minus) {
            true
        } else {
            self.match_token(&TokenKind::Plus);
            false
        };

        let TokenKind::IntLiteral(text) = self.current_kind() else {
            self.error(message);
            return None;
        };
        let text = text.clone();
        self.advance();

        match parse_integer(&text) {
            Some(value) => Some(if negative { -value } else { value }),
            None => {
                self.diagnostics.push(Diagnostic::error(
                    format!("integer literal '{text}' is out of range"),
                    self.prev_range(),
                ));
                None
            }
        }
    }

    /// Parses an optionally sign-prefixed numeric value (integer,
    /// float, `inf`, or `nan`).
    #[expect(
        clippy::cast_precision_loss,
        reason = "option values are f64 by contract; field numbers never exceed 2^29"
    )]
    fn parse_number_value(&mut self) -> Option<OptionValue> {
        let negative = if self.match_token(&TokenKind::Minus) {
            true
        } else {
            self.match_token(&TokenKind::Plus);
            false
        };

        let value = match self.current_kind().clone() {
            TokenKind::IntLiteral(text) => {
                self.advance();
                match parse_integer(&text) {
                    Some(v) => v as f64,
                    None => {
                        self.diagnostics.push(Diagnostic::error(
                            format!("integer literal '{text}' is out of range"),
                            self.prev_range(),
                        ));
                        return None;
                    }
                }
            }
            TokenKind::FloatLiteral(text) => {
                self.advance();
                match text.parse::<f64>() {
                    Ok(v) => v,
                    Err(_) => {
                        self.diagnostics.push(Diagnostic::error(
                            format!("malformed float literal '{text}'"),
                            self.prev_range(),
                        ));
                        return None;
                    }
                }
            }
            TokenKind::Identifier(word) if word == "inf" => {
                self.advance();
                f64::INFINITY
            }
            TokenKind::Identifier(word) if word == "nan" => {
                self.advance();
                f64::NAN
            }
            _ => {
                self.error("expected a number");
                return None;
            }
        };
        Some(OptionValue::Number(if negative { -value } else { value }))
    }

    /// Parses a `{ ... }` aggregate value, preserving the raw text
    /// between the braces (trimmed).
    ///
    /// The content is skipped token-by-token with brace balancing, not
    /// parsed: consumers that care about message-literal structure
    /// re-parse the raw text themselves.
    fn parse_aggregate_value(&mut self) -> OptionValue {
        let open = self.advance(); // {
        let content_start = open.span().end();
        let mut depth = 1usize;
        let content_end;

        loop {
            if self.is_at_end() {
                content_end = self.current_token().span().start();
                self.error("expected '}' to close the aggregate value");
                break;
            }
            match self.current_kind() {
                TokenKind::LeftBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RightBrace => {
                    depth -= 1;
                    if depth == 0 {
                        content_end = self.current_token().span().start();
                        self.advance();
                        break;
                    }
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }

        let raw = self.source_slice(content_start, content_end).trim();
        OptionValue::Aggregate(raw.into())
    }
}

/// Parses an integer literal in any written base.
///
/// `0x`/`0X` prefixes select hexadecimal; a leading `0` with all-octal
/// digits selects octal; anything else is decimal (so `09`, illegal as
/// octal, falls back to its decimal reading — legality is a diagnostics
/// concern). Returns `None` on overflow.
pub(super) fn parse_integer(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if text.len() > 1
        && text.starts_with('0')
        && text.bytes().all(|b| b.is_ascii_digit() && b < b'8')
    {
        i64::from_str_radix(text, 8).ok()
    } else {
        text.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::parse_integer;
    use crate::ast::{OptionValue, ProtoFile};
    use crate::source_analysis::parser::{Diagnostic, parse};

    fn parse_ok(source: &str) -> (ProtoFile, Vec<Diagnostic>) {
        parse(source, "file:///test.proto").expect("fatal parse error")
    }

    fn parse_clean(source: &str) -> ProtoFile {
        let (file, diagnostics) = parse_ok(source);
        assert!(diagnostics.is_empty(), "diagnostics: {diagnostics:?}");
        file
    }

    fn file_option_value(source: &str) -> OptionValue {
        parse_clean(source).options.remove(0).value
    }

    #[test]
    fn integer_bases() {
        assert_eq!(parse_integer("123"), Some(123));
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("0x5678"), Some(0x5678));
        assert_eq!(parse_integer("0XFF"), Some(255));
        assert_eq!(parse_integer("010"), Some(8));
        assert_eq!(parse_integer("0777"), Some(511));
        // Illegal octal digits fall back to decimal.
        assert_eq!(parse_integer("09"), Some(9));
        // Overflow.
        assert_eq!(parse_integer("99999999999999999999"), None);
    }

    #[test]
    fn bool_and_bare_identifier_values() {
        assert_eq!(
            file_option_value("option deprecated = true;"),
            OptionValue::Bool(true)
        );
        assert_eq!(
            file_option_value("option optimize_for = SPEED;"),
            OptionValue::String("SPEED".into())
        );
    }

    #[test]
    fn numeric_values_with_signs() {
        assert_eq!(
            file_option_value("option x = 42;"),
            OptionValue::Number(42.0)
        );
        assert_eq!(
            file_option_value("option x = -1.5;"),
            OptionValue::Number(-1.5)
        );
        assert_eq!(
            file_option_value("option x = 2e3;"),
            OptionValue::Number(2000.0)
        );
        assert_eq!(
            file_option_value("option x = 0x10;"),
            OptionValue::Number(16.0)
        );
    }

    #[test]
    fn inf_and_nan_values() {
        assert_eq!(
            file_option_value("option x = inf;"),
            OptionValue::Number(f64::INFINITY)
        );
        assert_eq!(
            file_option_value("option x = -inf;"),
            OptionValue::Number(f64::NEG_INFINITY)
        );
        let OptionValue::Number(n) = file_option_value("option x = nan;") else {
            panic!("expected a number");
        };
        assert!(n.is_nan());
    }

    #[test]
    fn dotted_and_extension_option_names() {
        let file = parse_clean("option features.field_presence = IMPLICIT;");
        assert_eq!(file.options[0].name, "features.field_presence");

        let file = parse_clean("option (buf.validate.field).string.email = true;");
        assert_eq!(file.options[0].name, "(buf.validate.field).string.email");
    }

    #[test]
    fn aggregate_value_preserves_raw_text() {
        let file = parse_clean(
            "option (my.opt) = { key: \"value\" nested { a: 1 } };",
        );
        assert_eq!(
            file.options[0].value,
            OptionValue::Aggregate("key: \"value\" nested { a: 1 }".into())
        );
    }

    #[test]
    fn unclosed_aggregate_recovers() {
        let (file, diagnostics) = parse_ok("option (my.opt) = { a: 1");
        assert!(!diagnostics.is_empty());
        assert_eq!(file.options.len(), 1);
    }

    #[test]
    fn out_of_range_field_number_is_reported() {
        let (file, diagnostics) = parse_ok("message M { int32 x = 99999999999999999999; }");
        assert!(
            diagnostics
                .iter()
                .any(|d| d.message.contains("out of range"))
        );
        assert!(file.messages[0].fields.is_empty());
    }
}

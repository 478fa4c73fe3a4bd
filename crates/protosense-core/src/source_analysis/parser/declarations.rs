// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parsing of declarations: messages, fields, enums, services, and
//! extend blocks.
//!
//! Message bodies are the only recursive production (nested messages
//! and proto2 groups). Recursion is bounded by the parser's nesting
//! guard and backed by `stacker` so deep-but-legal input cannot blow
//! the stack.

use ecow::EcoString;

use crate::ast::{
    EnumDefinition, EnumValue, ExtendDefinition, ExtensionRangeStatement, FieldDefinition,
    FieldModifier, GroupFieldDefinition, MapFieldDefinition, MessageDefinition, OneofDefinition,
    ReservedRange, ReservedStatement, RpcDefinition, ServiceDefinition,
};
use crate::builtins::FIELD_NUMBER_MAX;
use crate::source_analysis::{ParseError, Range, TokenKind};

use super::Parser;

/// Red zone for `stacker`: grow the stack when less than this remains.
const STACK_RED_ZONE: usize = 64 * 1024;

/// How much stack to allocate when growing.
const STACK_GROW_SIZE: usize = 1024 * 1024;

impl Parser<'_> {
    /// Parses `message Name { ... }`.
    ///
    /// Returns `Ok(None)` after recovering from a malformed header.
    pub(super) fn parse_message(&mut self) -> Result<Option<MessageDefinition>, ParseError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.parse_message_inner())
    }

    fn parse_message_inner(&mut self) -> Result<Option<MessageDefinition>, ParseError> {
        let comment = self.collect_comment();
        let start = self.current_token().range();
        self.advance(); // message

        let Some((name, name_range)) = self.expect_identifier("expected a message name") else {
            self.synchronize();
            return Ok(None);
        };
        if self
            .expect(&TokenKind::LeftBrace, "expected '{' after the message name")
            .is_none()
        {
            self.synchronize();
            return Ok(None);
        }

        let mut message = MessageDefinition {
            name,
            name_range,
            comment,
            ..MessageDefinition::default()
        };
        self.enter_nesting()?;
        let body = self.parse_message_body(&mut message);
        self.leave_nesting();
        body?;

        self.expect(&TokenKind::RightBrace, "expected '}' to close the message body");
        message.range = start.merge(self.prev_range());
        Ok(Some(message))
    }

    /// Parses message members until the closing `}` (not consumed).
    ///
    /// Shared between `message` bodies and proto2 group bodies, which
    /// accept the same member set.
    fn parse_message_body(&mut self, message: &mut MessageDefinition) -> Result<(), ParseError> {
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let comment = self.collect_comment();
            let member_start = self.current_token().range();

            match self.current_kind().clone() {
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Identifier(word) => match word.as_str() {
                    "option" => {
                        if let Some(stmt) = self.parse_option_statement() {
                            message.options.push(stmt);
                        }
                    }
                    "message" if self.at_block_header() => {
                        if let Some(nested) = self.parse_message()? {
                            message.messages.push(nested);
                        }
                    }
                    "enum" if self.at_block_header() => {
                        if let Some(definition) = self.parse_enum() {
                            message.enums.push(definition);
                        }
                    }
                    "oneof" if self.at_block_header() => {
                        if let Some(oneof) = self.parse_oneof() {
                            message.oneofs.push(oneof);
                        }
                    }
                    "extend" => {
                        if let Some(extend) = self.parse_extend()? {
                            message.extends.push(extend);
                        }
                    }
                    "reserved" => {
                        if let Some(stmt) = self.parse_reserved() {
                            message.reserved.push(stmt);
                        }
                    }
                    "extensions" => {
                        if let Some(stmt) = self.parse_extensions() {
                            message.extensions.push(stmt);
                        }
                    }
                    "map" if matches!(self.peek_at(1), Some(TokenKind::LeftAngle)) => {
                        if let Some(map) = self.parse_map_field(member_start, comment) {
                            message.maps.push(map);
                        }
                    }
                    "optional" | "required" | "repeated" => {
                        let modifier = Some(modifier_for(word.as_str()));
                        self.advance();
                        if self.at_keyword("group") {
                            if let Some(group) =
                                self.parse_group(modifier, member_start, comment)?
                            {
                                message.groups.push(group);
                            }
                        } else if let Some(field) =
                            self.parse_field(modifier, member_start, comment)
                        {
                            message.fields.push(field);
                        }
                    }
                    "group" if matches!(self.peek_at(1), Some(TokenKind::Identifier(_))) => {
                        if let Some(group) = self.parse_group(None, member_start, comment)? {
                            message.groups.push(group);
                        }
                    }
                    _ => {
                        // Anything else identifier-shaped starts a field
                        // type (keywords are valid type names).
                        if let Some(field) = self.parse_field(None, member_start, comment) {
                            message.fields.push(field);
                        }
                    }
                },
                // A leading dot starts an absolutely-qualified field type.
                TokenKind::Dot => {
                    if let Some(field) = self.parse_field(None, member_start, comment) {
                        message.fields.push(field);
                    }
                }
                _ => {
                    self.error(format!(
                        "unexpected '{}'; expected a message member",
                        self.current_kind()
                    ));
                    self.synchronize();
                }
            }
        }
        Ok(())
    }

    /// Returns `true` if the current contextual keyword heads a block
    /// declaration: `keyword Name {`.
    ///
    /// Distinguishes `message Inner { ... }` from a field whose *type*
    /// is named `message`.
    fn at_block_header(&self) -> bool {
        matches!(self.peek_at(1), Some(TokenKind::Identifier(_)))
            && matches!(self.peek_at(2), Some(TokenKind::LeftBrace))
    }

    /// Parses `[modifier] Type name = number [options];`
    ///
    /// The modifier (if any) has already been consumed; `start` is the
    /// range of the first token of the whole field.
    pub(super) fn parse_field(
        &mut self,
        modifier: Option<FieldModifier>,
        start: Range,
        comment: Option<EcoString>,
    ) -> Option<FieldDefinition> {
        let Some((field_type, field_type_range)) = self.parse_type_name("expected a field type")
        else {
            self.synchronize();
            return None;
        };
        let Some((name, name_range)) = self.expect_identifier("expected a field name") else {
            self.synchronize();
            return None;
        };
        if self.expect(&TokenKind::Equals, "expected '=' after the field name").is_none() {
            self.synchronize();
            return None;
        }
        let Some(number) = self.parse_signed_integer("expected a field number") else {
            self.synchronize();
            return None;
        };
        let options = if self.match_token(&TokenKind::LeftBracket) {
            self.parse_field_options()
        } else {
            Vec::new()
        };
        self.expect(&TokenKind::Semicolon, "expected ';' after the field");

        Some(FieldDefinition {
            modifier,
            field_type,
            field_type_range,
            name,
            name_range,
            number,
            options,
            comment,
            range: start.merge(self.prev_range()),
        })
    }

    /// Parses `map<Key, Value> name = number [options];`
    fn parse_map_field(
        &mut self,
        start: Range,
        comment: Option<EcoString>,
    ) -> Option<MapFieldDefinition> {
        self.advance(); // map
        if self.expect(&TokenKind::LeftAngle, "expected '<' after 'map'").is_none() {
            self.synchronize();
            return None;
        }
        // Any identifier is accepted as the key; key eligibility is a
        // diagnostics concern.
        let Some((key_type, _)) = self.expect_identifier("expected a map key type") else {
            self.synchronize();
            return None;
        };
        if self.expect(&TokenKind::Comma, "expected ',' between map key and value types").is_none()
        {
            self.synchronize();
            return None;
        }
        let Some((value_type, value_type_range)) =
            self.parse_type_name("expected a map value type")
        else {
            self.synchronize();
            return None;
        };
        self.expect(&TokenKind::RightAngle, "expected '>' to close the map type");

        let Some((name, name_range)) = self.expect_identifier("expected a field name") else {
            self.synchronize();
            return None;
        };
        if self.expect(&TokenKind::Equals, "expected '=' after the field name").is_none() {
            self.synchronize();
            return None;
        }
        let Some(number) = self.parse_signed_integer("expected a field number") else {
            self.synchronize();
            return None;
        };
        let options = if self.match_token(&TokenKind::LeftBracket) {
            self.parse_field_options()
        } else {
            Vec::new()
        };
        self.expect(&TokenKind::Semicolon, "expected ';' after the map field");

        Some(MapFieldDefinition {
            key_type,
            value_type,
            value_type_range,
            name,
            name_range,
            number,
            options,
            comment,
            range: start.merge(self.prev_range()),
        })
    }

    /// Parses a proto2 group: `[modifier] group Name = number { ... }`
    ///
    /// The body is recorded as a message definition named after the
    /// group.
    fn parse_group(
        &mut self,
        modifier: Option<FieldModifier>,
        start: Range,
        comment: Option<EcoString>,
    ) -> Result<Option<GroupFieldDefinition>, ParseError> {
        self.advance(); // group

        let Some((name, name_range)) = self.expect_identifier("expected a group name") else {
            self.synchronize();
            return Ok(None);
        };
        if self.expect(&TokenKind::Equals, "expected '=' after the group name").is_none() {
            self.synchronize();
            return Ok(None);
        }
        let Some(number) = self.parse_signed_integer("expected a field number") else {
            self.synchronize();
            return Ok(None);
        };
        if self
            .expect(&TokenKind::LeftBrace, "expected '{' to open the group body")
            .is_none()
        {
            self.synchronize();
            return Ok(None);
        }

        let mut body = MessageDefinition {
            name: name.clone(),
            name_range,
            comment,
            ..MessageDefinition::default()
        };
        self.enter_nesting()?;
        let result = self.parse_message_body(&mut body);
        self.leave_nesting();
        result?;
        self.expect(&TokenKind::RightBrace, "expected '}' to close the group body");
        body.range = start.merge(self.prev_range());

        Ok(Some(GroupFieldDefinition {
            modifier,
            name,
            name_range,
            number,
            body,
            range: start.merge(self.prev_range()),
        }))
    }

    /// Parses `oneof name { fields }`.
    fn parse_oneof(&mut self) -> Option<OneofDefinition> {
        let start = self.current_token().range();
        self.advance(); // oneof

        let Some((name, name_range)) = self.expect_identifier("expected a oneof name") else {
            self.synchronize();
            return None;
        };
        if self
            .expect(&TokenKind::LeftBrace, "expected '{' after the oneof name")
            .is_none()
        {
            self.synchronize();
            return None;
        }

        let mut fields = Vec::new();
        let mut options = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let comment = self.collect_comment();
            let member_start = self.current_token().range();
            match self.current_kind().clone() {
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Identifier(word) if word == "option" => {
                    if let Some(stmt) = self.parse_option_statement() {
                        options.push(stmt);
                    }
                }
                TokenKind::Identifier(_) | TokenKind::Dot => {
                    // Oneof members carry no label; a stray one is still
                    // consumed so the field parses (diagnostics flag it).
                    let modifier = self.match_field_modifier();
                    if let Some(field) = self.parse_field(modifier, member_start, comment) {
                        fields.push(field);
                    }
                }
                _ => {
                    self.error(format!(
                        "unexpected '{}'; expected a oneof member",
                        self.current_kind()
                    ));
                    self.synchronize();
                }
            }
        }
        self.expect(&TokenKind::RightBrace, "expected '}' to close the oneof body");

        Some(OneofDefinition {
            name,
            name_range,
            fields,
            options,
            range: start.merge(self.prev_range()),
        })
    }

    /// Consumes a field label if one is present.
    fn match_field_modifier(&mut self) -> Option<FieldModifier> {
        for label in ["optional", "required", "repeated"] {
            if self.at_keyword(label)
                && matches!(self.peek_at(1), Some(TokenKind::Identifier(_) | TokenKind::Dot))
            {
                self.advance();
                return Some(modifier_for(label));
            }
        }
        None
    }

    /// Parses `reserved ...;` — either names or numeric ranges.
    ///
    /// Names are quoted in proto2/proto3 and bare identifiers under
    /// editions; both forms are accepted.
    fn parse_reserved(&mut self) -> Option<ReservedStatement> {
        let start = self.current_token().range();
        self.advance(); // reserved

        let mut stmt = ReservedStatement::default();
        match self.current_kind().clone() {
            TokenKind::StringLiteral(_) => loop {
                let Some((name, _)) = self.parse_string_value() else {
                    self.error("expected a reserved field name");
                    break;
                };
                stmt.names.push(name);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            },
            TokenKind::Identifier(_) => loop {
                let Some((name, _)) = self.expect_identifier("expected a reserved field name")
                else {
                    break;
                };
                stmt.names.push(name);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            },
            _ => stmt.ranges = self.parse_number_ranges(),
        }
        self.expect(&TokenKind::Semicolon, "expected ';' after the reserved statement");

        stmt.range = start.merge(self.prev_range());
        Some(stmt)
    }

    /// Parses `extensions N to M, ...;` (proto2).
    fn parse_extensions(&mut self) -> Option<ExtensionRangeStatement> {
        let start = self.current_token().range();
        self.advance(); // extensions

        let ranges = self.parse_number_ranges();
        // Editions extension declarations: `[declaration = {...}]` —
        // consumed and discarded.
        if self.match_token(&TokenKind::LeftBracket) {
            let mut depth = 1usize;
            while depth > 0 && !self.is_at_end() {
                match self.current_kind().clone() {
                    TokenKind::LeftBracket => depth += 1,
                    TokenKind::RightBracket => depth -= 1,
                    _ => {}
                }
                self.advance();
            }
        }
        self.expect(&TokenKind::Semicolon, "expected ';' after the extensions statement");

        Some(ExtensionRangeStatement {
            ranges,
            range: start.merge(self.prev_range()),
        })
    }

    /// Parses a comma-separated list of `N`, `N to M`, `N to max`.
    fn parse_number_ranges(&mut self) -> Vec<ReservedRange> {
        let mut ranges = Vec::new();
        loop {
            let Some(start) = self.parse_signed_integer("expected a field number") else {
                break;
            };
            let end = if self.match_keyword("to") {
                if self.match_keyword("max") {
                    FIELD_NUMBER_MAX
                } else {
                    self.parse_signed_integer("expected a field number after 'to'")
                        .unwrap_or(start)
                }
            } else {
                start
            };
            ranges.push(ReservedRange { start, end });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        ranges
    }

    /// Parses `enum Name { ... }`.
    pub(super) fn parse_enum(&mut self) -> Option<EnumDefinition> {
        let comment = self.collect_comment();
        let start = self.current_token().range();
        self.advance(); // enum

        let Some((name, name_range)) = self.expect_identifier("expected an enum name") else {
            self.synchronize();
            return None;
        };
        if self
            .expect(&TokenKind::LeftBrace, "expected '{' after the enum name")
            .is_none()
        {
            self.synchronize();
            return None;
        }

        let mut definition = EnumDefinition {
            name,
            name_range,
            comment,
            ..EnumDefinition::default()
        };
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            match self.current_kind().clone() {
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Identifier(word) if word == "option" => {
                    if let Some(stmt) = self.parse_option_statement() {
                        definition.options.push(stmt);
                    }
                }
                TokenKind::Identifier(word) if word == "reserved" => {
                    if let Some(stmt) = self.parse_reserved() {
                        definition.reserved.push(stmt);
                    }
                }
                TokenKind::Identifier(_) => {
                    if let Some(value) = self.parse_enum_value() {
                        definition.values.push(value);
                    }
                }
                _ => {
                    self.error(format!(
                        "unexpected '{}'; expected an enum value",
                        self.current_kind()
                    ));
                    self.synchronize();
                }
            }
        }
        self.expect(&TokenKind::RightBrace, "expected '}' to close the enum body");

        definition.range = start.merge(self.prev_range());
        Some(definition)
    }

    /// Parses one `NAME = number [options];` enum value.
    fn parse_enum_value(&mut self) -> Option<EnumValue> {
        let comment = self.collect_comment();
        let start = self.current_token().range();

        let Some((name, name_range)) = self.expect_identifier("expected an enum value name")
        else {
            self.synchronize();
            return None;
        };
        if self.expect(&TokenKind::Equals, "expected '=' after the enum value name").is_none() {
            self.synchronize();
            return None;
        }
        let Some(number) = self.parse_signed_integer("expected an enum value number") else {
            self.synchronize();
            return None;
        };
        let options = if self.match_token(&TokenKind::LeftBracket) {
            self.parse_field_options()
        } else {
            Vec::new()
        };
        self.expect(&TokenKind::Semicolon, "expected ';' after the enum value");

        Some(EnumValue {
            name,
            name_range,
            number,
            options,
            comment,
            range: start.merge(self.prev_range()),
        })
    }

    /// Parses `service Name { ... }`.
    pub(super) fn parse_service(&mut self) -> Option<ServiceDefinition> {
        let comment = self.collect_comment();
        let start = self.current_token().range();
        self.advance(); // service

        let Some((name, name_range)) = self.expect_identifier("expected a service name") else {
            self.synchronize();
            return None;
        };
        if self
            .expect(&TokenKind::LeftBrace, "expected '{' after the service name")
            .is_none()
        {
            self.synchronize();
            return None;
        }

        let mut service = ServiceDefinition {
            name,
            name_range,
            comment,
            ..ServiceDefinition::default()
        };
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            match self.current_kind().clone() {
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Identifier(word) if word == "option" => {
                    if let Some(stmt) = self.parse_option_statement() {
                        service.options.push(stmt);
                    }
                }
                TokenKind::Identifier(word) if word == "rpc" => {
                    if let Some(rpc) = self.parse_rpc() {
                        service.rpcs.push(rpc);
                    }
                }
                _ => {
                    self.error(format!(
                        "unexpected '{}'; expected an rpc or option",
                        self.current_kind()
                    ));
                    self.synchronize();
                }
            }
        }
        self.expect(&TokenKind::RightBrace, "expected '}' to close the service body");

        service.range = start.merge(self.prev_range());
        Some(service)
    }

    /// Parses `rpc Name (Req) returns (Resp);` or with an options body.
    fn parse_rpc(&mut self) -> Option<RpcDefinition> {
        let comment = self.collect_comment();
        let start = self.current_token().range();
        self.advance(); // rpc

        let Some((name, name_range)) = self.expect_identifier("expected an rpc name") else {
            self.synchronize();
            return None;
        };
        if self.expect(&TokenKind::LeftParen, "expected '(' after the rpc name").is_none() {
            self.synchronize();
            return None;
        }
        let (request_streaming, request_type, request_type_range) =
            self.parse_rpc_type("expected a request type")?;
        self.expect(&TokenKind::RightParen, "expected ')' after the request type");

        if !self.match_keyword("returns") {
            self.error("expected 'returns' after the request type");
            self.synchronize();
            return None;
        }
        if self.expect(&TokenKind::LeftParen, "expected '(' after 'returns'").is_none() {
            self.synchronize();
            return None;
        }
        let (response_streaming, response_type, response_type_range) =
            self.parse_rpc_type("expected a response type")?;
        self.expect(&TokenKind::RightParen, "expected ')' after the response type");

        let mut options = Vec::new();
        if self.match_token(&TokenKind::LeftBrace) {
            while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
                match self.current_kind().clone() {
                    TokenKind::Semicolon => {
                        self.advance();
                    }
                    TokenKind::Identifier(word) if word == "option" => {
                        if let Some(stmt) = self.parse_option_statement() {
                            options.push(stmt);
                        }
                    }
                    _ => {
                        self.error(format!(
                            "unexpected '{}'; expected an option in the rpc body",
                            self.current_kind()
                        ));
                        self.synchronize();
                    }
                }
            }
            self.expect(&TokenKind::RightBrace, "expected '}' to close the rpc body");
        } else {
            self.expect(&TokenKind::Semicolon, "expected ';' or '{' after the rpc signature");
        }

        Some(RpcDefinition {
            name,
            name_range,
            request_type,
            request_type_range,
            request_streaming,
            response_type,
            response_type_range,
            response_streaming,
            options,
            comment,
            range: start.merge(self.prev_range()),
        })
    }

    /// Parses `[stream] Type` inside rpc parentheses.
    ///
    /// `stream` is contextual: `(stream)` is a type named `stream`,
    /// `(stream Foo)` is a streamed `Foo`.
    fn parse_rpc_type(&mut self, message: &str) -> Option<(bool, EcoString, Range)> {
        let streaming = self.at_keyword("stream")
            && matches!(self.peek_at(1), Some(TokenKind::Identifier(_) | TokenKind::Dot));
        if streaming {
            self.advance();
        }
        let Some((name, range)) = self.parse_type_name(message) else {
            self.synchronize();
            return None;
        };
        Some((streaming, name, range))
    }

    /// Parses `extend Target { fields }`.
    pub(super) fn parse_extend(&mut self) -> Result<Option<ExtendDefinition>, ParseError> {
        let start = self.current_token().range();
        self.advance(); // extend

        let Some((target, target_range)) = self.parse_type_name("expected a type to extend")
        else {
            self.synchronize();
            return Ok(None);
        };
        if self
            .expect(&TokenKind::LeftBrace, "expected '{' after the extended type")
            .is_none()
        {
            self.synchronize();
            return Ok(None);
        }

        let mut extend = ExtendDefinition {
            target,
            target_range,
            ..ExtendDefinition::default()
        };
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let comment = self.collect_comment();
            let member_start = self.current_token().range();
            match self.current_kind().clone() {
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Identifier(_) | TokenKind::Dot => {
                    let modifier = self.match_field_modifier();
                    if self.at_keyword("group") {
                        if let Some(group) = self.parse_group(modifier, member_start, comment)? {
                            extend.groups.push(group);
                        }
                    } else if let Some(field) = self.parse_field(modifier, member_start, comment)
                    {
                        extend.fields.push(field);
                    }
                }
                _ => {
                    self.error(format!(
                        "unexpected '{}'; expected an extension field",
                        self.current_kind()
                    ));
                    self.synchronize();
                }
            }
        }
        self.expect(&TokenKind::RightBrace, "expected '}' to close the extend body");

        extend.range = start.merge(self.prev_range());
        Ok(Some(extend))
    }
}

fn modifier_for(label: &str) -> FieldModifier {
    match label {
        "optional" => FieldModifier::Optional,
        "required" => FieldModifier::Required,
        _ => FieldModifier::Repeated,
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{FieldModifier, OptionValue, ProtoFile, ReservedRange};
    use crate::builtins::FIELD_NUMBER_MAX;
    use crate::source_analysis::parser::{Diagnostic, parse};

    fn parse_ok(source: &str) -> (ProtoFile, Vec<Diagnostic>) {
        parse(source, "file:///test.proto").expect("fatal parse error")
    }

    fn parse_clean(source: &str) -> ProtoFile {
        let (file, diagnostics) = parse_ok(source);
        assert!(diagnostics.is_empty(), "diagnostics: {diagnostics:?}");
        file
    }

    #[test]
    fn parses_message_with_scalar_fields() {
        let file = parse_clean(
            "message User {\n  int32 id = 1;\n  string name = 2;\n  repeated string tags = 3;\n}",
        );
        let message = &file.messages[0];
        assert_eq!(message.name, "User");
        assert_eq!(message.fields.len(), 3);
        assert_eq!(message.fields[0].field_type, "int32");
        assert_eq!(message.fields[0].number, 1);
        assert_eq!(message.fields[0].modifier, None);
        assert_eq!(message.fields[2].modifier, Some(FieldModifier::Repeated));
    }

    #[test]
    fn parses_qualified_and_absolute_field_types() {
        let file = parse_clean(
            "message M {\n  common.Address addr = 1;\n  .com.example.Thing thing = 2;\n}",
        );
        let message = &file.messages[0];
        assert_eq!(message.fields[0].field_type, "common.Address");
        assert_eq!(message.fields[1].field_type, ".com.example.Thing");
    }

    #[test]
    fn parses_nested_messages_and_enums() {
        let file = parse_clean(
            "message Outer {\n  message Inner { int32 x = 1; }\n  enum Kind { KIND_UNSPECIFIED = 0; }\n  Inner inner = 1;\n  Kind kind = 2;\n}",
        );
        let outer = &file.messages[0];
        assert_eq!(outer.messages[0].name, "Inner");
        assert_eq!(outer.enums[0].name, "Kind");
        assert_eq!(outer.fields.len(), 2);
    }

    #[test]
    fn field_may_use_keyword_named_type() {
        // `message` stays a valid identifier in type position.
        let file = parse_clean("message M { message msg = 1; }");
        assert_eq!(file.messages[0].fields[0].field_type, "message");
        assert!(file.messages[0].messages.is_empty());
    }

    #[test]
    fn parses_map_fields() {
        let file = parse_clean("message M { map<string, Project> projects = 3; }");
        let map = &file.messages[0].maps[0];
        assert_eq!(map.key_type, "string");
        assert_eq!(map.value_type, "Project");
        assert_eq!(map.name, "projects");
        assert_eq!(map.number, 3);
    }

    #[test]
    fn parses_field_options() {
        let file = parse_clean(
            "message M { int32 x = 1 [deprecated = true, (custom.opt) = \"v\"]; }",
        );
        let field = &file.messages[0].fields[0];
        assert_eq!(field.options.len(), 2);
        assert_eq!(field.options[0].name, "deprecated");
        assert_eq!(field.options[0].value, OptionValue::Bool(true));
        assert_eq!(field.options[1].name, "(custom.opt)");
    }

    #[test]
    fn reserved_ranges_and_names() {
        // Two statements: numeric ranges then quoted names.
        let file = parse_clean(
            "message M {\n  reserved 1, 2, 10 to 20;\n  reserved \"old_field\", \"legacy\";\n}",
        );
        let message = &file.messages[0];
        assert_eq!(message.reserved.len(), 2);
        assert_eq!(
            message.reserved[0].ranges,
            vec![
                ReservedRange { start: 1, end: 1 },
                ReservedRange { start: 2, end: 2 },
                ReservedRange { start: 10, end: 20 },
            ]
        );
        assert!(message.reserved[0].names.is_empty());
        assert_eq!(message.reserved[1].names, vec!["old_field", "legacy"]);
        assert!(message.reserved[1].ranges.is_empty());
    }

    #[test]
    fn reserved_to_max_uses_sentinel() {
        let file = parse_clean("message M { reserved 1000 to max; }");
        assert_eq!(
            file.messages[0].reserved[0].ranges,
            vec![ReservedRange { start: 1000, end: FIELD_NUMBER_MAX }]
        );
    }

    #[test]
    fn reserved_bare_identifier_names() {
        // Editions spelling, without quotes.
        let file = parse_clean("message M { reserved old_field, legacy; }");
        assert_eq!(file.messages[0].reserved[0].names, vec!["old_field", "legacy"]);
    }

    #[test]
    fn parses_extensions_statement() {
        let file = parse_clean("message M { extensions 100 to 199, 500; }");
        assert_eq!(
            file.messages[0].extensions[0].ranges,
            vec![
                ReservedRange { start: 100, end: 199 },
                ReservedRange { start: 500, end: 500 },
            ]
        );
    }

    #[test]
    fn oneof_preserves_duplicate_field_numbers() {
        // Faithful recording; duplicate detection belongs to diagnostics.
        let file = parse_clean(
            "message M {\n  oneof choice {\n    string a = 4;\n    int32 b = 4;\n  }\n}",
        );
        let oneof = &file.messages[0].oneofs[0];
        assert_eq!(oneof.name, "choice");
        assert_eq!(oneof.fields.len(), 2);
        assert_eq!(oneof.fields[0].number, 4);
        assert_eq!(oneof.fields[1].number, 4);
    }

    #[test]
    fn parses_proto2_group() {
        let file = parse_clean(
            "message M {\n  optional group Result = 1 {\n    required string url = 2;\n  }\n}",
        );
        let group = &file.messages[0].groups[0];
        assert_eq!(group.name, "Result");
        assert_eq!(group.number, 1);
        assert_eq!(group.modifier, Some(FieldModifier::Optional));
        assert_eq!(group.body.fields[0].name, "url");
        assert_eq!(group.body.fields[0].modifier, Some(FieldModifier::Required));
    }

    #[test]
    fn parses_enum_with_negative_and_aliased_values() {
        let file = parse_clean(
            "enum Status {\n  option allow_alias = true;\n  UNKNOWN = 0;\n  STARTED = 1;\n  RUNNING = 1;\n  FAILED = -1;\n}",
        );
        let definition = &file.enums[0];
        assert_eq!(definition.values.len(), 4);
        assert_eq!(definition.values[1].number, 1);
        assert_eq!(definition.values[2].number, 1);
        assert_eq!(definition.values[3].number, -1);
        assert_eq!(definition.options[0].name, "allow_alias");
    }

    #[test]
    fn parses_service_with_streaming_rpcs() {
        let file = parse_clean(
            "service Chat {\n  rpc Send(Message) returns (Ack);\n  rpc Watch(stream Ping) returns (stream Pong) {\n    option idempotency_level = NO_SIDE_EFFECTS;\n  }\n}",
        );
        let service = &file.services[0];
        assert_eq!(service.name, "Chat");
        assert_eq!(service.rpcs.len(), 2);
        let send = &service.rpcs[0];
        assert_eq!(send.request_type, "Message");
        assert!(!send.request_streaming);
        assert!(!send.response_streaming);
        let watch = &service.rpcs[1];
        assert!(watch.request_streaming);
        assert!(watch.response_streaming);
        assert_eq!(watch.response_type, "Pong");
        assert_eq!(watch.options[0].name, "idempotency_level");
    }

    #[test]
    fn parses_extend_block() {
        let file = parse_clean(
            "extend google.protobuf.FieldOptions {\n  optional string validator = 50000;\n}",
        );
        let extend = &file.extends[0];
        assert_eq!(extend.target, "google.protobuf.FieldOptions");
        assert_eq!(extend.fields[0].name, "validator");
        assert_eq!(extend.fields[0].number, 50_000);
    }

    #[test]
    fn recovers_inside_message_body() {
        // The malformed member is skipped to its `;`; siblings survive.
        let (file, diagnostics) = parse_ok(
            "message M {\n  int32 good = 1;\n  int32 broken = ;\n  string also_good = 2;\n}",
        );
        assert!(!diagnostics.is_empty());
        let message = &file.messages[0];
        assert_eq!(message.fields.len(), 2);
        assert_eq!(message.fields[0].name, "good");
        assert_eq!(message.fields[1].name, "also_good");
    }

    #[test]
    fn recovers_from_unclosed_message_at_eof() {
        let (file, diagnostics) = parse_ok("message M {\n  int32 x = 1;\n");
        assert!(!diagnostics.is_empty());
        assert_eq!(file.messages[0].fields.len(), 1);
    }

    #[test]
    fn field_comments_attach() {
        let file = parse_clean(
            "message M {\n  // Primary key.\n  int32 id = 1;\n  string name = 2;\n}",
        );
        let message = &file.messages[0];
        assert_eq!(message.fields[0].comment.as_deref(), Some("Primary key."));
        assert_eq!(message.fields[1].comment, None);
    }
}

/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Line tokenization and operand classification.

use crate::errors::AssemblyError;
use crate::types::{Register, RegWidth};

#[derive(Debug, Clone, PartialEq)]
pub enum OperandToken {
    Register(Register),
    Immediate(i64),
    Label(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataDirective {
    Int(i64),
    Float(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineContent {
    Empty,
    Data(DataDirective),
    Instruction { mnemonic: String, operands: Vec<OperandToken> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub line_number: usize,
    pub label: Option<String>,
    pub content: LineContent,
}

/// Splits `source` into lines and lexes each one. Line numbers are 1-based
/// and reflect position in the original source regardless of blank lines.
pub fn lex_source(lines: &[String]) -> Result<Vec<Line>, AssemblyError> {
    lines
        .iter()
        .enumerate()
        .map(|(i, raw)| lex_line(i + 1, raw))
        .collect()
}

fn lex_line(line_number: usize, raw: &str) -> Result<Line, AssemblyError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() || trimmed.starts_with("//") {
        return Ok(Line {
            line_number,
            label: None,
            content: LineContent::Empty,
        });
    }

    // A label may share a line with a directive, but never with an
    // instruction. `name:` on its own line is the common case.
    let (label, rest) = match trimmed.split_once(':') {
        Some((name, rest)) if !name.trim().is_empty() && is_label_name(name.trim()) => {
            (Some(name.trim().to_string()), rest.trim())
        }
        _ => (None, trimmed),
    };

    if rest.is_empty() {
        return Ok(Line {
            line_number,
            label,
            content: LineContent::Empty,
        });
    }

    if let Some(directive_body) = rest.strip_prefix(".int") {
        let value = parse_integer(directive_body.trim(), line_number)?;
        return Ok(Line {
            line_number,
            label,
            content: LineContent::Data(DataDirective::Int(value)),
        });
    }
    if let Some(directive_body) = rest.strip_prefix(".float") {
        let token = directive_body.trim();
        let value: f32 = token.parse().map_err(|_| AssemblyError::BadOperand {
            line: line_number,
            token: token.to_string(),
            reason: "expected a floating point literal".to_string(),
        })?;
        return Ok(Line {
            line_number,
            label,
            content: LineContent::Data(DataDirective::Float(value)),
        });
    }

    let mut fields = rest.split_whitespace();
    let mnemonic = fields.next().unwrap().to_uppercase();
    let operand_text: String = fields.collect::<Vec<_>>().join(" ");
    let operands = tokenize_operands(&operand_text, line_number)?;

    Ok(Line {
        line_number,
        label,
        content: LineContent::Instruction { mnemonic, operands },
    })
}

fn is_label_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().map_or(false, |c| c.is_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Splits the operand portion of a line on whitespace, strips `,`, `[`, `]`
/// from each token, then classifies it as a register, immediate, or label
/// reference.
fn tokenize_operands(text: &str, line_number: usize) -> Result<Vec<OperandToken>, AssemblyError> {
    text.split_whitespace()
        .map(|raw| strip_punctuation(raw))
        .filter(|tok| !tok.is_empty())
        .map(|tok| classify_operand(&tok, line_number))
        .collect()
}

fn strip_punctuation(token: &str) -> String {
    token.chars().filter(|&c| c != ',' && c != '[' && c != ']').collect()
}

fn classify_operand(token: &str, line_number: usize) -> Result<OperandToken, AssemblyError> {
    if let Some(reg) = parse_register(token) {
        return Ok(OperandToken::Register(reg));
    }
    if let Some(body) = token.strip_prefix('#') {
        let value = parse_integer(body, line_number)?;
        return Ok(OperandToken::Immediate(value));
    }
    // A letter followed by digits (`W32`, `Q0`) reads as an attempted
    // register rather than a label; report it as such instead of letting it
    // fall through to an unresolved-label error far from the real mistake.
    if looks_like_register(token) {
        return Err(AssemblyError::BadRegisterName {
            line: line_number,
            token: token.to_string(),
        });
    }
    Ok(OperandToken::Label(token.to_string()))
}

fn looks_like_register(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    let rest = chars.as_str();
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

fn parse_register(token: &str) -> Option<Register> {
    if token.eq_ignore_ascii_case("sp") {
        return Some(Register::sp());
    }
    let mut chars = token.chars();
    let prefix = chars.next()?;
    let width = match prefix {
        'W' | 'w' => RegWidth::W,
        'X' | 'x' => RegWidth::X,
        _ => return None,
    };
    let rest: String = chars.collect();
    let number: u8 = rest.parse().ok()?;
    if number > 31 {
        return None;
    }
    Some(Register::new(number, width))
}

/// Parses `#<dec>` / `#0x<hex>` immediate bodies (the `#` has already been
/// stripped by the caller) and bare `.int` directive bodies (no `#` prefix).
fn parse_integer(body: &str, line_number: usize) -> Result<i64, AssemblyError> {
    let (negative, body) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let magnitude = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).map_err(|_| AssemblyError::BadOperand {
            line: line_number,
            token: format!("#{body}"),
            reason: "expected a hexadecimal immediate".to_string(),
        })?
    } else {
        body.parse::<i64>().map_err(|_| AssemblyError::BadOperand {
            line: line_number,
            token: format!("#{body}"),
            reason: "expected a decimal immediate".to_string(),
        })?
    };
    Ok(if negative { -magnitude } else { magnitude })
}

//! `ToUnicode` CMap parsing: token-based scanning of
//! `beginbfchar`/`endbfchar` and `beginbfrange`/`endbfrange` sections.

use std::collections::HashMap;

use encoding_rs::UTF_16BE;

use crate::lexer;

enum Token {
    Hex(Vec<u8>),
    Array(Vec<Vec<u8>>),
}

pub(crate) fn parse_to_unicode_cmap(data: &[u8]) -> HashMap<u32, String> {
    let mut map = HashMap::new();

    let mut pos = 0;
    while let Some(start) = find(data, b"beginbfchar", pos) {
        let section_start = start + b"beginbfchar".len();
        let section_end = find(data, b"endbfchar", section_start).unwrap_or(data.len());
        parse_bfchar(&data[section_start..section_end], &mut map);
        pos = section_end + b"endbfchar".len();
    }

    pos = 0;
    while let Some(start) = find(data, b"beginbfrange", pos) {
        let section_start = start + b"beginbfrange".len();
        let section_end = find(data, b"endbfrange", section_start).unwrap_or(data.len());
        parse_bfrange(&data[section_start..section_end], &mut map);
        pos = section_end + b"endbfrange".len();
    }

    map
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack.get(from..)?.windows(needle.len()).position(|w| w == needle).map(|p| p + from)
}

fn tokenize(mut data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    loop {
        data = lexer::skip_whitespace_and_comments(data);
        match data.first() {
            None => break,
            Some(b'<') => match lexer::scan_hex_string(data) {
                Some((bytes, consumed)) => {
                    tokens.push(Token::Hex(bytes));
                    data = &data[consumed..];
                }
                None => break,
            },
            Some(b'[') => {
                let mut rest = &data[1..];
                let mut items = Vec::new();
                loop {
                    rest = lexer::skip_whitespace_and_comments(rest);
                    if rest.first() == Some(&b']') {
                        rest = &rest[1..];
                        break;
                    }
                    match lexer::scan_hex_string(rest) {
                        Some((bytes, consumed)) => {
                            items.push(bytes);
                            rest = &rest[consumed..];
                        }
                        None => break,
                    }
                }
                tokens.push(Token::Array(items));
                data = rest;
            }
            _ => {
                // skip an unrecognized bareword token (e.g. a stray
                // `usecmap` directive) and keep scanning.
                let (_, consumed) = lexer::scan_keyword(data);
                if consumed == 0 {
                    break;
                }
                data = &data[consumed..];
            }
        }
    }
    tokens
}

fn code_from_bytes(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn decode_dst(bytes: &[u8]) -> String {
    let (text, _, had_errors) = UTF_16BE.decode(bytes);
    if had_errors {
        bytes.iter().map(|&b| b as char).collect()
    } else {
        text.into_owned()
    }
}

fn parse_bfchar(section: &[u8], map: &mut HashMap<u32, String>) {
    let tokens = tokenize(section);
    let mut iter = tokens.into_iter();
    while let (Some(Token::Hex(src)), Some(dst)) = (iter.next(), iter.next()) {
        let code = code_from_bytes(&src);
        match dst {
            Token::Hex(bytes) => {
                map.insert(code, decode_dst(&bytes));
            }
            Token::Array(_) => {}
        }
    }
}

fn parse_bfrange(section: &[u8], map: &mut HashMap<u32, String>) {
    let tokens = tokenize(section);
    let mut iter = tokens.into_iter();
    while let (Some(Token::Hex(start)), Some(Token::Hex(end)), Some(dst)) = (iter.next(), iter.next(), iter.next()) {
        let start_code = code_from_bytes(&start);
        let end_code = code_from_bytes(&end);
        if end_code < start_code || end_code - start_code > 65_535 {
            continue;
        }
        match dst {
            Token::Hex(bytes) if bytes.len() == 2 => {
                let base = u16::from_be_bytes([bytes[0], bytes[1]]);
                for (i, code) in (start_code..=end_code).enumerate() {
                    let unit = base.wrapping_add(i as u16);
                    map.insert(code, decode_dst(&unit.to_be_bytes()));
                }
            }
            Token::Hex(bytes) => {
                let text = decode_dst(&bytes);
                for code in start_code..=end_code {
                    map.insert(code, text.clone());
                }
            }
            Token::Array(items) => {
                for (i, code) in (start_code..=end_code).enumerate() {
                    if let Some(bytes) = items.get(i) {
                        map.insert(code, decode_dst(bytes));
                    }
                }
            }
        }
    }
}

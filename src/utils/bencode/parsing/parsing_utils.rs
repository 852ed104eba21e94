use std::collections::BTreeMap;
use std::ops::Range;

use super::super::{BencodedValue, MalformedInput};

pub struct Decoder<'a> {
    input: &'a [u8],
    cur_index: usize,
    depth: usize,

    capture_key: Option<&'a [u8]>,
    captured: Option<Range<usize>>,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            cur_index: 0,
            depth: 0,

            capture_key: None,
            captured: None,
        }
    }

    pub fn capturing(input: &'a [u8], key: &'a [u8]) -> Self {
        Self {
            capture_key: Some(key),
            ..Self::new(input)
        }
    }

    pub fn captured(&self) -> Option<Range<usize>> {
        self.captured.clone()
    }

    fn error(&self, reason: &str) -> MalformedInput {
        MalformedInput::new(reason, self.cur_index)
    }

    fn peek(&self) -> Result<u8, MalformedInput> {
        match self.input.get(self.cur_index) {
            Some(&byte) => Ok(byte),
            None => Err(self.error("unexpected end of input")),
        }
    }

    pub fn create_value(&mut self) -> Result<BencodedValue, MalformedInput> {
        match self.peek()? {
            b'd' => self.create_dict(),
            b'l' => self.create_list(),
            b'i' => self.create_int(),
            b'0'..=b'9' => Ok(BencodedValue::ByteString(self.create_byte_string()?.to_vec())),
            byte => Err(self.error(&format!("invalid leading byte {:?}", byte as char))),
        }
    }

    fn enter(&mut self) -> Result<(), MalformedInput> {
        if self.depth >= crate::MAX_BENCODE_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;

        Ok(())
    }

    pub fn create_dict(&mut self) -> Result<BencodedValue, MalformedInput> {
        let is_root = self.depth == 0;
        self.enter()?;
        self.cur_index += 1; // 'd'

        let mut dict = BTreeMap::new();
        loop {
            match self.peek().map_err(|_| self.error("unterminated dictionary"))? {
                b'e' => break,
                b'0'..=b'9' => {
                    let key = self.create_byte_string()?;

                    let value_start = self.cur_index;
                    let value = self.create_value()?;

                    if is_root && self.captured.is_none() && self.capture_key == Some(key) {
                        self.captured = Some(value_start..self.cur_index);
                    }

                    dict.insert(key.to_vec(), value);
                }
                _ => return Err(self.error("dictionary key is not a byte string")),
            }
        }
        self.cur_index += 1; // 'e'
        self.depth -= 1;

        Ok(BencodedValue::Dict(dict))
    }

    pub fn create_list(&mut self) -> Result<BencodedValue, MalformedInput> {
        self.enter()?;
        self.cur_index += 1; // 'l'

        let mut list = Vec::new();
        loop {
            match self.peek().map_err(|_| self.error("unterminated list"))? {
                b'e' => break,
                _ => list.push(self.create_value()?),
            }
        }
        self.cur_index += 1; // 'e'
        self.depth -= 1;

        Ok(BencodedValue::List(list))
    }

    pub fn create_int(&mut self) -> Result<BencodedValue, MalformedInput> {
        let start = self.cur_index + 1; // skip 'i'

        let end = match self.input[start..].iter().position(|&byte| b'e' == byte) {
            Some(len) => start + len,
            None => return Err(self.error("unterminated integer")),
        };

        let number = parse_bencoded_integer(&self.input[start..end])
            .map_err(|reason| MalformedInput::new(reason, start))?;
        self.cur_index = end + 1;

        Ok(BencodedValue::Integer(number))
    }

    /// Reads `<len>:<bytes>` and returns the raw bytes without copying.
    pub fn create_byte_string(&mut self) -> Result<&'a [u8], MalformedInput> {
        let start = self.cur_index;
        let input = self.input;

        let digits = input[start..].iter().take_while(|byte| byte.is_ascii_digit()).count();
        let colon = start + digits;

        if 0 == digits || input.get(colon) != Some(&b':') {
            return Err(MalformedInput::new("invalid byte string length", start));
        }

        let word_len = parse_length(&input[start..colon])
            .ok_or_else(|| MalformedInput::new("byte string length overflows", start))?;

        let word_start = colon + 1;
        let word_end = match word_start.checked_add(word_len) {
            Some(end) if end <= input.len() => end,
            _ => return Err(MalformedInput::new("byte string length exceeds input", start)),
        };
        self.cur_index = word_end;

        Ok(&input[word_start..word_end])
    }
}

fn parse_length(digits: &[u8]) -> Option<usize> {
    digits.iter().try_fold(0usize, |len, &digit| {
        len.checked_mul(10)?.checked_add((digit - b'0') as usize)
    })
}

/// Parses the literal between 'i' and 'e'.
pub fn parse_bencoded_integer(literal: &[u8]) -> Result<i64, &'static str> {
    let digits = match literal.first() {
        None => return Err("empty integer"),
        Some(b'-') => &literal[1..],
        Some(_) => literal,
    };

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err("invalid integer");
    }

    if digits[0] == b'0' && literal.len() > 1 {
        return match literal[0] {
            b'-' => Err("negative zero"),
            _ => Err("leading zeros"),
        };
    }

    // only ASCII digits and '-' are left at this point
    let number = std::str::from_utf8(literal).map_err(|_| "invalid integer")?;

    number.parse::<i64>().map_err(|_| "integer out of range")
}

pub fn to_bencoded(value: &BencodedValue, bencoded_string: &mut Vec<u8>) {
    match value {
        BencodedValue::Dict(dict) => {
            bencoded_string.push(b'd');
            for (key, value) in dict {
                to_bencoded_byte_string(key, bencoded_string);
                to_bencoded(value, bencoded_string);
            }
            bencoded_string.push(b'e');
        }
        BencodedValue::List(list) => {
            bencoded_string.push(b'l');
            for value in list {
                to_bencoded(value, bencoded_string);
            }
            bencoded_string.push(b'e');
        }
        BencodedValue::Integer(integer) => {
            bencoded_string.push(b'i');
            bencoded_string.extend_from_slice(integer.to_string().as_bytes());
            bencoded_string.push(b'e');
        }
        BencodedValue::ByteString(bytes) => to_bencoded_byte_string(bytes, bencoded_string),
    }
}

fn to_bencoded_byte_string(bytes: &[u8], bencoded_string: &mut Vec<u8>) {
    bencoded_string.extend_from_slice(bytes.len().to_string().as_bytes());
    bencoded_string.push(b':');
    bencoded_string.extend_from_slice(bytes);
}

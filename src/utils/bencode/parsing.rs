use std::ops::Range;

use super::{BencodedValue, MalformedInput};

mod parsing_utils;
use parsing_utils::Decoder;

pub fn decode(bytes: &[u8]) -> Result<BencodedValue, MalformedInput> {
    if bytes.is_empty() {
        return Err(MalformedInput { reason: "empty input".to_string(), offset: None });
    }

    Decoder::new(bytes).create_value()
}

pub fn decode_capturing(bytes: &[u8], key: &[u8]) -> Result<(BencodedValue, Option<Range<usize>>), MalformedInput> {
    if bytes.is_empty() {
        return Err(MalformedInput { reason: "empty input".to_string(), offset: None });
    }

    let mut decoder = Decoder::capturing(bytes, key);
    let value = decoder.create_value()?;

    Ok((value, decoder.captured()))
}

pub fn encode(bencoded_value: &BencodedValue) -> Vec<u8> {
    let mut bencoded_string = Vec::new();
    parsing_utils::to_bencoded(bencoded_value, &mut bencoded_string);

    bencoded_string
}

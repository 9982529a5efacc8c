//! Percent codec for delta tokens and patch lines.
//!
//! Encoding follows the JavaScript `encodeURI` convention: ASCII
//! alphanumerics and the characters `` !#$&'()*+,-./:;=?@_~`` (space
//! included) stay literal, everything else becomes `%XX` over its UTF-8
//! bytes. Decoding is strict where the underlying crate is lenient: a
//! truncated or non-hex escape is a parse error, not pass-through.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::errors::Error;

const ESCAPED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b' ')
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b'-')
    .remove(b'.')
    .remove(b'/')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'?')
    .remove(b'@')
    .remove(b'_')
    .remove(b'~');

pub(crate) fn encode(text: &[char]) -> String {
    let text: String = text.iter().collect();
    utf8_percent_encode(&text, ESCAPED).to_string()
}

pub(crate) fn decode(text: &str) -> Result<Vec<char>, Error> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len()
                || !bytes[i + 1].is_ascii_hexdigit()
                || !bytes[i + 2].is_ascii_hexdigit()
            {
                return Err(Error::BadEscape(text.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(text)
        .decode_utf8()
        .map(|decoded| decoded.chars().collect())
        .map_err(|_| Error::BadEscape(text.to_string()))
}

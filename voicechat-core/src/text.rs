use thiserror::Error;

/// Shown in the input buffer while an upload is outstanding.
pub const INPUT_DISABLED_PLACEHOLDER: &str = "Input and voice recording are unavailable.";

/// Shown in place of the transcript before the first message.
pub const EMPTY_CHAT_HINT: &str = "Ask me anything!\nThe AI will answer.";

// Escapes of these characters survive decoding (decodeURI semantics).
const RESERVED: &[u8] = b";/?:@&=+$,#";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeUriError {
    #[error("malformed percent escape at byte {0}")]
    MalformedEscape(usize),

    #[error("percent escapes do not form valid UTF-8")]
    InvalidUtf8,
}

pub fn decode_uri(input: &str) -> Result<String, DecodeUriError> {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        let lead = hex_byte(bytes, i).ok_or(DecodeUriError::MalformedEscape(i))?;
        if lead < 0x80 {
            if RESERVED.contains(&lead) {
                out.extend_from_slice(&bytes[i..i + 3]);
            } else {
                out.push(lead);
            }
            i += 3;
            continue;
        }

        // Multi-byte sequence: every continuation byte must be escaped as well.
        let len = utf8_len(lead).ok_or(DecodeUriError::InvalidUtf8)?;
        let start = out.len();
        out.push(lead);
        i += 3;
        for _ in 1..len {
            if bytes.get(i) != Some(&b'%') {
                return Err(DecodeUriError::InvalidUtf8);
            }
            let cont = hex_byte(bytes, i).ok_or(DecodeUriError::MalformedEscape(i))?;
            out.push(cont);
            i += 3;
        }
        std::str::from_utf8(&out[start..]).map_err(|_| DecodeUriError::InvalidUtf8)?;
    }

    String::from_utf8(out).map_err(|_| DecodeUriError::InvalidUtf8)
}

fn hex_byte(bytes: &[u8], at: usize) -> Option<u8> {
    let hi = (*bytes.get(at + 1)? as char).to_digit(16)?;
    let lo = (*bytes.get(at + 2)? as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_spaces_and_multibyte() {
        assert_eq!(decode_uri("hello%20world").unwrap(), "hello world");
        assert_eq!(decode_uri("%EC%95%88%EB%85%95").unwrap(), "안녕");
        assert_eq!(decode_uri("plain").unwrap(), "plain");
        assert_eq!(decode_uri("").unwrap(), "");
    }

    #[test]
    fn keeps_reserved_escapes() {
        assert_eq!(decode_uri("a%2Fb%3Fc%23d").unwrap(), "a%2Fb%3Fc%23d");
        assert_eq!(decode_uri("50%25").unwrap(), "50%");
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(decode_uri("100%"), Err(DecodeUriError::MalformedEscape(3)));
        assert_eq!(decode_uri("%zz"), Err(DecodeUriError::MalformedEscape(0)));
        assert_eq!(decode_uri("%E4%B8"), Err(DecodeUriError::InvalidUtf8));
        assert_eq!(decode_uri("%C3%28"), Err(DecodeUriError::InvalidUtf8));
        assert_eq!(decode_uri("%FF"), Err(DecodeUriError::InvalidUtf8));
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("안녕하세요", 2), "안녕");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}

use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    /// Lower-case encoding name, `utf-8-sig` when a BOM was stripped.
    pub encoding: String,
    pub had_errors: bool,
}

/// Decode a source file to UTF-8 text.
///
/// Valid UTF-8 is taken as is. Anything else goes through detection, so
/// posts saved as windows-1252 or latin-1 by older editors still load.
pub fn decode(bytes: &[u8]) -> Decoded {
    // BOM UTF-8 (EF BB BF)
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        let (text, had_errors) = decode_with(UTF_8, rest);
        return Decoded {
            text,
            encoding: "utf-8-sig".into(),
            had_errors,
        };
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Decoded {
            text: text.to_string(),
            encoding: "utf-8".into(),
            had_errors: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    let (text, had_errors) = decode_with(encoding, bytes);
    let name = encoding.name().to_lowercase();

    if had_errors {
        warn!("decoded as {name} with replacement characters");
    } else {
        debug!("decoded as {name}");
    }

    Decoded {
        text,
        encoding: name,
        had_errors,
    }
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> (String, bool) {
    let (text, _, had_errors) = encoding.decode(bytes);
    let text = match text {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    };
    (text, had_errors)
}

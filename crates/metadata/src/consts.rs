use regex::Regex;
use regex::bytes::Regex as BytesRegex;
use std::sync::LazyLock;

/// Lowercased token identifying the sidecar entry anywhere in an entry name.
pub(crate) const SIDECAR_TOKEN: &str = "comicinfo.xml";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

macro_rules! bytes_regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<BytesRegex> = LazyLock::new(|| BytesRegex::new($regex).unwrap());
    };
}

// Series title followed by a 1-3 digit issue number, anchored at the start.
regex!(SERIES_NUMBER_REGEX, r#"^[A-Za-z0-9)(.\-" ']+ [0-9]{1,3}"#);
regex!(DIGIT_RUN_REGEX, r"[0-9]+");
// Charset declared in the XML prolog; matched on raw bytes before decoding.
bytes_regex!(XML_ENCODING_REGEX, r#"(?-u)\A\s*<\?xml\s[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#);

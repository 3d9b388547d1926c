//! Utility functions and types.

use std::fmt::Debug;

/// Debug wrapper that keeps credential material out of logs.
///
/// Strings of 12 characters or more show their first and last three
/// characters around a `***` filler, enough to tell two keys apart;
/// anything shorter is fully masked.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> Debug for Redact<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let length = self.0.len();
        if length == 0 {
            f.write_str("EMPTY")
        } else if length < 12 {
            f.write_str("***")
        } else {
            f.write_str(&self.0[..3])?;
            f.write_str("***")?;
            f.write_str(&self.0[length - 3..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        let cases = vec![
            ("Short", "***"),
            ("Hello World!", "Hel***ld!"),
            ("This is a longer string", "Thi***ing"),
            ("", "EMPTY"),
            ("HelloWorld", "***"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                format!("{:?}", Redact(input)),
                expected,
                "Failed on input: {}",
                input
            );
        }
    }

    #[test]
    fn test_redact_from_string() {
        let secret = "wJalrXUtnFEMI/K7MDENG".to_string();
        let out = format!("{:?}", Redact::from(&secret));
        assert_eq!(out, "wJa***ENG");
    }
}

//! Field codec: bidirectional mapping between structured values and the
//! flat name/value wire forms (query string, form body, header metadata).
//!
//! Every field of a request/response type carries a [`Tag`] describing its
//! wire name template. Three placeholders are understood:
//!
//! - `#` is replaced by successive integers when a sequence expands, e.g.
//!   `Tags.member.#` with base 1 yields `Tags.member.1`, `Tags.member.2`, …
//! - `*` is replaced by each map key, e.g. `x-amz-meta-*` yields
//!   `x-amz-meta-foo`, `x-amz-meta-bar`.
//! - a name ending in `.` flattens a nested struct under that prefix.

use std::collections::BTreeMap;

use http::header::HeaderName;
use http::{HeaderMap, HeaderValue};

use crate::time::DateTime;
use crate::{Error, Result};

/// Wire schema annotation for one field.
#[derive(Debug, Clone, Copy)]
pub struct Tag {
    /// Wire name template, with `#`/`*` placeholders.
    pub name: &'static str,
    /// First index used when a sequence expands `#`.
    pub base: u8,
    /// Time format string (chrono `strftime` syntax).
    pub format: Option<&'static str>,
    /// Omit the field when its value is the type's zero value.
    pub omit_empty: bool,
    /// Substitute for an absent value.
    pub default: Option<&'static str>,
}

impl Tag {
    /// Create a tag with the given wire name and all options off.
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            base: 0,
            format: None,
            omit_empty: false,
            default: None,
        }
    }

    /// Select the base index for sequence expansion.
    pub const fn base(mut self, base: u8) -> Self {
        self.base = base;
        self
    }

    /// Set the time format string.
    pub const fn format(mut self, format: &'static str) -> Self {
        self.format = Some(format);
        self
    }

    /// Omit the field when the value is zero/empty/false.
    pub const fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    /// Provide a default used when the value is absent.
    pub const fn default_value(mut self, v: &'static str) -> Self {
        self.default = Some(v);
        self
    }
}

/// Time format used when a tag carries none.
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn indexed(template: &str, idx: usize) -> String {
    template.replacen('#', &idx.to_string(), 1)
}

fn wildcarded(template: &str, key: &str) -> String {
    template.replacen('*', key, 1)
}

/// Render a value into ordered name/value pairs.
pub trait ToParams {
    /// Write all fields into the writer.
    fn to_params(&self, w: &mut ParamWriter);
}

/// Rebuild a value from name/value pairs.
pub trait FromParams: Sized {
    /// Read all fields from the reader.
    fn from_params(r: &ParamReader<'_>) -> Result<Self>;
}

/// Render header-carried metadata into a header map.
pub trait ToHeaders {
    /// Write all fields into the writer.
    fn to_headers(&self, w: &mut HeaderWriter) -> Result<()>;
}

/// Rebuild header-carried metadata from a header map.
pub trait FromHeaders: Sized {
    /// Read all fields from the reader.
    fn from_headers(r: &HeaderReader<'_>) -> Result<Self>;
}

/// Writer producing ordered `(name, value)` pairs.
///
/// Insertion order is preserved; repeated keys are expected only through
/// the dotted indexing scheme.
#[derive(Debug, Default)]
pub struct ParamWriter {
    pairs: Vec<(String, String)>,
    prefix: String,
}

impl ParamWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the writer, yielding the pairs in insertion order.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    fn resolve(&self, template: &str) -> String {
        if self.prefix.is_empty() {
            template.to_string()
        } else {
            format!("{}{}", self.prefix, template)
        }
    }

    fn push(&mut self, name: String, value: String) {
        self.pairs.push((name, value));
    }

    /// Write a text scalar.
    pub fn write_str(&mut self, tag: &Tag, v: &str) {
        if v.is_empty() {
            if tag.omit_empty {
                return;
            }
            if let Some(d) = tag.default {
                self.push(self.resolve(tag.name), d.to_string());
                return;
            }
        }
        self.push(self.resolve(tag.name), v.to_string());
    }

    /// Write an optional text scalar; absent values are omitted unless the
    /// tag carries a default.
    pub fn write_opt_str(&mut self, tag: &Tag, v: Option<&str>) {
        match v {
            Some(v) => self.write_str(tag, v),
            None => {
                if let Some(d) = tag.default {
                    self.push(self.resolve(tag.name), d.to_string());
                }
            }
        }
    }

    /// Write an integer scalar.
    pub fn write_i64(&mut self, tag: &Tag, v: i64) {
        if v == 0 && tag.omit_empty {
            return;
        }
        self.push(self.resolve(tag.name), v.to_string());
    }

    /// Write an optional integer scalar.
    pub fn write_opt_i64(&mut self, tag: &Tag, v: Option<i64>) {
        if let Some(v) = v {
            self.write_i64(tag, v);
        }
    }

    /// Write a floating scalar.
    pub fn write_f64(&mut self, tag: &Tag, v: f64) {
        if v == 0.0 && tag.omit_empty {
            return;
        }
        self.push(self.resolve(tag.name), v.to_string());
    }

    /// Write a boolean scalar as `true`/`false`.
    pub fn write_bool(&mut self, tag: &Tag, v: bool) {
        if !v && tag.omit_empty {
            return;
        }
        self.push(self.resolve(tag.name), v.to_string());
    }

    /// Write a time value using the tag's format.
    pub fn write_time(&mut self, tag: &Tag, v: DateTime) {
        let fmt = tag.format.unwrap_or(DEFAULT_TIME_FORMAT);
        self.push(self.resolve(tag.name), v.format(fmt).to_string());
    }

    /// Write an optional time value; absent omits.
    pub fn write_opt_time(&mut self, tag: &Tag, v: Option<DateTime>) {
        if let Some(v) = v {
            self.write_time(tag, v);
        }
    }

    /// Write a sequence of text values under dotted indexing.
    ///
    /// The tag's name must contain `#`.
    pub fn write_str_seq(&mut self, tag: &Tag, vs: &[String]) {
        for (i, v) in vs.iter().enumerate() {
            let name = self.resolve(&indexed(tag.name, tag.base as usize + i));
            self.push(name, v.clone());
        }
    }

    /// Write a sequence of nested structs under dotted indexing.
    ///
    /// Each element renders its own fields below `name.N.`.
    pub fn write_struct_seq<T: ToParams>(&mut self, tag: &Tag, vs: &[T]) {
        for (i, v) in vs.iter().enumerate() {
            let prefix = format!(
                "{}.",
                self.resolve(&indexed(tag.name, tag.base as usize + i))
            );
            let saved = std::mem::replace(&mut self.prefix, prefix);
            v.to_params(self);
            self.prefix = saved;
        }
    }

    /// Write a text map by substituting each key for `*` in the tag's name.
    ///
    /// Keys are emitted in sorted order so the rendering is stable per call.
    pub fn write_map(&mut self, tag: &Tag, vs: &BTreeMap<String, String>) {
        for (k, v) in vs {
            let name = self.resolve(&wildcarded(tag.name, k));
            self.push(name, v.clone());
        }
    }

    /// Write a nested struct flattened under the tag's name.
    ///
    /// The tag's name must end with `.`.
    pub fn write_nested<T: ToParams>(&mut self, tag: &Tag, v: &T) {
        let prefix = self.resolve(tag.name);
        let saved = std::mem::replace(&mut self.prefix, prefix);
        v.to_params(self);
        self.prefix = saved;
    }
}

/// Reader over ordered `(name, value)` pairs.
#[derive(Debug)]
pub struct ParamReader<'a> {
    pairs: &'a [(String, String)],
    prefix: String,
}

impl<'a> ParamReader<'a> {
    /// Create a reader over the given pairs.
    pub fn new(pairs: &'a [(String, String)]) -> Self {
        Self {
            pairs,
            prefix: String::new(),
        }
    }

    fn resolve(&self, template: &str) -> String {
        if self.prefix.is_empty() {
            template.to_string()
        } else {
            format!("{}{}", self.prefix, template)
        }
    }

    fn get(&self, name: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn scoped(&self, prefix: String) -> ParamReader<'a> {
        ParamReader {
            pairs: self.pairs,
            prefix,
        }
    }

    /// Read a text scalar; missing yields the tag's default or empty text.
    pub fn read_str(&self, tag: &Tag) -> String {
        self.get(&self.resolve(tag.name))
            .or(tag.default)
            .unwrap_or_default()
            .to_string()
    }

    /// Read an optional text scalar.
    pub fn read_opt_str(&self, tag: &Tag) -> Option<String> {
        self.get(&self.resolve(tag.name)).map(str::to_string)
    }

    /// Read an integer scalar; missing yields zero.
    pub fn read_i64(&self, tag: &Tag) -> Result<i64> {
        match self.get(&self.resolve(tag.name)).or(tag.default) {
            None => Ok(0),
            Some(v) => v
                .parse()
                .map_err(|e| Error::decode_failed(format!("{} is not an integer: {e}", tag.name))),
        }
    }

    /// Read an optional integer scalar.
    pub fn read_opt_i64(&self, tag: &Tag) -> Result<Option<i64>> {
        match self.get(&self.resolve(tag.name)) {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|e| Error::decode_failed(format!("{} is not an integer: {e}", tag.name))),
        }
    }

    /// Read a boolean scalar; missing yields `false`.
    pub fn read_bool(&self, tag: &Tag) -> Result<bool> {
        match self.get(&self.resolve(tag.name)).or(tag.default) {
            None => Ok(false),
            Some(v) => v
                .parse()
                .map_err(|e| Error::decode_failed(format!("{} is not a boolean: {e}", tag.name))),
        }
    }

    /// Read a time value using the tag's format.
    pub fn read_opt_time(&self, tag: &Tag) -> Result<Option<DateTime>> {
        let Some(v) = self.get(&self.resolve(tag.name)) else {
            return Ok(None);
        };
        let fmt = tag.format.unwrap_or(DEFAULT_TIME_FORMAT);
        let t = chrono::NaiveDateTime::parse_from_str(v, fmt)
            .map_err(|e| Error::decode_failed(format!("{} is not a valid time: {e}", tag.name)))?;
        Ok(Some(t.and_utc()))
    }

    /// Read a sequence of text values expanded under dotted indexing.
    pub fn read_str_seq(&self, tag: &Tag) -> Vec<String> {
        let mut out = Vec::new();
        let mut idx = tag.base as usize;
        while let Some(v) = self.get(&self.resolve(&indexed(tag.name, idx))) {
            out.push(v.to_string());
            idx += 1;
        }
        out
    }

    /// Read a sequence of nested structs expanded under dotted indexing.
    pub fn read_struct_seq<T: FromParams>(&self, tag: &Tag) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut idx = tag.base as usize;
        loop {
            let prefix = format!("{}.", self.resolve(&indexed(tag.name, idx)));
            if !self.pairs.iter().any(|(k, _)| k.starts_with(&prefix)) {
                break;
            }
            out.push(T::from_params(&self.scoped(prefix))?);
            idx += 1;
        }
        Ok(out)
    }

    /// Read a text map by matching keys against the `*` wildcard.
    pub fn read_map(&self, tag: &Tag) -> BTreeMap<String, String> {
        let template = self.resolve(tag.name);
        let Some(star) = template.find('*') else {
            return BTreeMap::new();
        };
        let (pre, post) = (&template[..star], &template[star + 1..]);

        self.pairs
            .iter()
            .filter(|(k, _)| k.starts_with(pre) && k.ends_with(post) && k.len() > pre.len() + post.len())
            .map(|(k, v)| (k[pre.len()..k.len() - post.len()].to_string(), v.clone()))
            .collect()
    }

    /// Read a nested struct flattened under the tag's name.
    pub fn read_nested<T: FromParams>(&self, tag: &Tag) -> Result<T> {
        T::from_params(&self.scoped(self.resolve(tag.name)))
    }
}

/// Writer producing a header map from tagged fields.
///
/// Header names are case-insensitive; templates are lowered on emission.
#[derive(Debug, Default)]
pub struct HeaderWriter {
    headers: HeaderMap,
}

impl HeaderWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the writer, yielding the header map.
    pub fn into_headers(self) -> HeaderMap {
        self.headers
    }

    fn insert(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::try_from(name.to_lowercase())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Write a text scalar header.
    pub fn write_str(&mut self, tag: &Tag, v: &str) -> Result<()> {
        if v.is_empty() && tag.omit_empty {
            return Ok(());
        }
        self.insert(tag.name, v)
    }

    /// Write an optional text scalar header; absent omits.
    pub fn write_opt_str(&mut self, tag: &Tag, v: Option<&str>) -> Result<()> {
        match v {
            Some(v) => self.write_str(tag, v),
            None => Ok(()),
        }
    }

    /// Write an optional integer header; absent omits.
    pub fn write_opt_i64(&mut self, tag: &Tag, v: Option<i64>) -> Result<()> {
        match v {
            Some(v) => self.insert(tag.name, &v.to_string()),
            None => Ok(()),
        }
    }

    /// Write an optional time header using the tag's format.
    pub fn write_opt_time(&mut self, tag: &Tag, v: Option<DateTime>) -> Result<()> {
        match v {
            Some(v) => {
                let fmt = tag.format.unwrap_or(DEFAULT_TIME_FORMAT);
                self.insert(tag.name, &v.format(fmt).to_string())
            }
            None => Ok(()),
        }
    }

    /// Write a text map of headers by substituting each key for `*`.
    pub fn write_map(&mut self, tag: &Tag, vs: &BTreeMap<String, String>) -> Result<()> {
        for (k, v) in vs {
            self.insert(&wildcarded(tag.name, k), v)?;
        }
        Ok(())
    }
}

/// Reader over a response's header map.
#[derive(Debug)]
pub struct HeaderReader<'a> {
    headers: &'a HeaderMap,
}

impl<'a> HeaderReader<'a> {
    /// Create a reader over the given headers.
    pub fn new(headers: &'a HeaderMap) -> Self {
        Self { headers }
    }

    fn get(&self, name: &str) -> Result<Option<&'a str>> {
        match self.headers.get(name.to_lowercase()) {
            None => Ok(None),
            Some(v) => Ok(Some(v.to_str()?)),
        }
    }

    /// Read a text scalar header; missing yields the tag's default or empty.
    pub fn read_str(&self, tag: &Tag) -> Result<String> {
        Ok(self
            .get(tag.name)?
            .or(tag.default)
            .unwrap_or_default()
            .to_string())
    }

    /// Read an optional text scalar header.
    pub fn read_opt_str(&self, tag: &Tag) -> Result<Option<String>> {
        Ok(self.get(tag.name)?.map(str::to_string))
    }

    /// Read an optional integer header.
    pub fn read_opt_i64(&self, tag: &Tag) -> Result<Option<i64>> {
        match self.get(tag.name)? {
            None => Ok(None),
            Some(v) => v
                .parse()
                .map(Some)
                .map_err(|e| Error::decode_failed(format!("{} is not an integer: {e}", tag.name))),
        }
    }

    /// Read an optional time header using the tag's format.
    pub fn read_opt_time(&self, tag: &Tag) -> Result<Option<DateTime>> {
        let Some(v) = self.get(tag.name)? else {
            return Ok(None);
        };
        let fmt = tag.format.unwrap_or(DEFAULT_TIME_FORMAT);
        let t = chrono::NaiveDateTime::parse_from_str(v, fmt)
            .map_err(|e| Error::decode_failed(format!("{} is not a valid time: {e}", tag.name)))?;
        Ok(Some(t.and_utc()))
    }

    /// Read a text map of headers by matching names against the `*` wildcard.
    pub fn read_map(&self, tag: &Tag) -> BTreeMap<String, String> {
        let template = tag.name.to_lowercase();
        let Some(star) = template.find('*') else {
            return BTreeMap::new();
        };
        let (pre, post) = (&template[..star], &template[star + 1..]);

        self.headers
            .iter()
            .filter_map(|(k, v)| {
                let k = k.as_str();
                if k.starts_with(pre) && k.ends_with(post) && k.len() > pre.len() + post.len() {
                    Some((
                        k[pre.len()..k.len() - post.len()].to_string(),
                        v.to_str().ok()?.to_string(),
                    ))
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TagPair {
        key: String,
        value: String,
    }

    impl TagPair {
        const KEY: Tag = Tag::named("Key");
        const VALUE: Tag = Tag::named("Value");
    }

    impl ToParams for TagPair {
        fn to_params(&self, w: &mut ParamWriter) {
            w.write_str(&Self::KEY, &self.key);
            w.write_str(&Self::VALUE, &self.value);
        }
    }

    impl FromParams for TagPair {
        fn from_params(r: &ParamReader<'_>) -> crate::Result<Self> {
            Ok(Self {
                key: r.read_str(&Self::KEY),
                value: r.read_str(&Self::VALUE),
            })
        }
    }

    #[test]
    fn test_scalars_with_omit_empty() {
        let mut w = ParamWriter::new();
        w.write_str(&Tag::named("Name"), "demo");
        w.write_str(&Tag::named("Blank").omit_empty(), "");
        w.write_i64(&Tag::named("Zero").omit_empty(), 0);
        w.write_i64(&Tag::named("Count"), 3);
        w.write_bool(&Tag::named("Off").omit_empty(), false);
        w.write_bool(&Tag::named("On"), true);

        assert_eq!(
            w.into_pairs(),
            vec![
                ("Name".to_string(), "demo".to_string()),
                ("Count".to_string(), "3".to_string()),
                ("On".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_value() {
        let tag = Tag::named("Version").default_value("2011-01-01");

        let mut w = ParamWriter::new();
        w.write_opt_str(&tag, None);
        let pairs = w.into_pairs();
        assert_eq!(
            pairs,
            vec![("Version".to_string(), "2011-01-01".to_string())]
        );

        let r = ParamReader::new(&[]);
        assert_eq!(r.read_str(&tag), "2011-01-01");
    }

    #[test]
    fn test_str_seq_base_one() {
        // Spec scenario: Tags=[a,b,c] tagged `Tags.member.#` base 1.
        let tag = Tag::named("Tags.member.#").base(1);
        let tags = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let mut w = ParamWriter::new();
        w.write_str_seq(&tag, &tags);
        let pairs = w.into_pairs();

        assert_eq!(
            pairs,
            vec![
                ("Tags.member.1".to_string(), "a".to_string()),
                ("Tags.member.2".to_string(), "b".to_string()),
                ("Tags.member.3".to_string(), "c".to_string()),
            ]
        );

        let r = ParamReader::new(&pairs);
        assert_eq!(r.read_str_seq(&tag), tags);
    }

    #[test]
    fn test_struct_seq_nested_fields() {
        let tag = Tag::named("Tags.member.#").base(1);
        let tags = vec![
            TagPair {
                key: "env".to_string(),
                value: "prod".to_string(),
            },
            TagPair {
                key: "team".to_string(),
                value: "infra".to_string(),
            },
        ];

        let mut w = ParamWriter::new();
        w.write_struct_seq(&tag, &tags);
        let pairs = w.into_pairs();

        assert_eq!(
            pairs,
            vec![
                ("Tags.member.1.Key".to_string(), "env".to_string()),
                ("Tags.member.1.Value".to_string(), "prod".to_string()),
                ("Tags.member.2.Key".to_string(), "team".to_string()),
                ("Tags.member.2.Value".to_string(), "infra".to_string()),
            ]
        );

        let r = ParamReader::new(&pairs);
        let back: Vec<TagPair> = r.read_struct_seq(&tag).unwrap();
        assert_eq!(back, tags);
    }

    #[test]
    fn test_map_wildcard_round_trip() {
        let tag = Tag::named("Metadata.*");
        let mut map = BTreeMap::new();
        map.insert("foo".to_string(), "1".to_string());
        map.insert("bar".to_string(), "2".to_string());

        let mut w = ParamWriter::new();
        w.write_map(&tag, &map);
        let pairs = w.into_pairs();

        assert_eq!(
            pairs,
            vec![
                ("Metadata.bar".to_string(), "2".to_string()),
                ("Metadata.foo".to_string(), "1".to_string()),
            ]
        );

        let r = ParamReader::new(&pairs);
        assert_eq!(r.read_map(&tag), map);
    }

    #[test]
    fn test_time_format_round_trip() {
        let tag = Tag::named("CreatedTime").format("%Y-%m-%dT%H:%M:%SZ");
        let t = Utc.with_ymd_and_hms(2014, 6, 11, 0, 0, 0).unwrap();

        let mut w = ParamWriter::new();
        w.write_time(&tag, t);
        let pairs = w.into_pairs();
        assert_eq!(pairs[0].1, "2014-06-11T00:00:00Z");

        let r = ParamReader::new(&pairs);
        assert_eq!(r.read_opt_time(&tag).unwrap(), Some(t));
    }

    #[test]
    fn test_nested_prefix() {
        let tag = Tag::named("Filter.");
        let v = TagPair {
            key: "name".to_string(),
            value: "web".to_string(),
        };

        let mut w = ParamWriter::new();
        w.write_nested(&tag, &v);
        let pairs = w.into_pairs();

        assert_eq!(
            pairs,
            vec![
                ("Filter.Key".to_string(), "name".to_string()),
                ("Filter.Value".to_string(), "web".to_string()),
            ]
        );

        let r = ParamReader::new(&pairs);
        let back: TagPair = r.read_nested(&tag).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_header_map_wildcard() {
        // Spec scenario: metadata {"foo":"1","bar":"2"} tagged `X-Amz-Meta-*`.
        let tag = Tag::named("X-Amz-Meta-*");
        let mut map = BTreeMap::new();
        map.insert("foo".to_string(), "1".to_string());
        map.insert("bar".to_string(), "2".to_string());

        let mut w = HeaderWriter::new();
        w.write_map(&tag, &map).unwrap();
        let headers = w.into_headers();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("x-amz-meta-foo").unwrap(), "1");
        assert_eq!(headers.get("x-amz-meta-bar").unwrap(), "2");

        let r = HeaderReader::new(&headers);
        assert_eq!(r.read_map(&tag), map);
    }

    #[test]
    fn test_header_scalars() {
        let acl = Tag::named("X-Amz-Acl").omit_empty();
        let length = Tag::named("Content-Length");

        let mut w = HeaderWriter::new();
        w.write_str(&acl, "public-read").unwrap();
        w.write_opt_i64(&length, Some(42)).unwrap();
        let headers = w.into_headers();

        let r = HeaderReader::new(&headers);
        assert_eq!(r.read_str(&acl).unwrap(), "public-read");
        assert_eq!(r.read_opt_i64(&length).unwrap(), Some(42));
        assert_eq!(r.read_opt_str(&Tag::named("X-Missing")).unwrap(), None);
    }
}

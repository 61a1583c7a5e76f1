//! HTML text escaping and attribute serialization.

use std::borrow::Cow;
use std::fmt;

/// Escape the five HTML-significant characters.
///
/// Returns the input unchanged, without allocating, when nothing needs
/// replacing.
pub fn escape(input: &str) -> Cow<'_, str> {
    let mut out: Option<String> = None;
    let mut last = 0;

    for (i, byte) in input.bytes().enumerate() {
        let replacement = match byte {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\'' => "&#039;",
            _ => continue,
        };
        let buf = out.get_or_insert_with(|| String::with_capacity(input.len() + 16));
        buf.push_str(&input[last..i]);
        buf.push_str(replacement);
        last = i + 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&input[last..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(input),
    }
}

/// [`escape`] for an owned string; hands the original back when no
/// replacement was needed.
pub fn escape_owned(input: String) -> String {
    let escaped = match escape(&input) {
        Cow::Owned(buf) => Some(buf),
        Cow::Borrowed(_) => None,
    };
    escaped.unwrap_or(input)
}

/// Decimal text form of a number as markup sees it: integral values
/// without a fraction, `NaN`, `Infinity`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Integer(i128),
    Number(f64),
    Bool(bool),
    /// Null or undefined: the attribute is omitted.
    Null,
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Integer(n) => write!(f, "{n}"),
            AttrValue::Number(n) => f.write_str(&format_number(*n)),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

macro_rules! integer_attr {
    ($($t:ty),*) => {
        $(impl From<$t> for AttrValue {
            fn from(n: $t) -> Self {
                AttrValue::Integer(i128::from(n))
            }
        })*
    };
}

integer_attr!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<usize> for AttrValue {
    fn from(n: usize) -> Self {
        AttrValue::Integer(n as i128)
    }
}

impl From<isize> for AttrValue {
    fn from(n: isize) -> Self {
        AttrValue::Integer(n as i128)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<f32> for AttrValue {
    fn from(n: f32) -> Self {
        AttrValue::Number(f64::from(n))
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttrValue::Null, Into::into)
    }
}

/// Attribute names mapped to scalar values, serialized in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs(Vec<(String, AttrValue)>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn set(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set `name`, replacing an earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attrs::new();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

/// Build [`Attrs`] from `name => value` pairs.
///
/// ```
/// use interest_html::{attrs, serialize_attributes};
///
/// let a = attrs! { "src" => "x.png", "alt" => None::<&str>, "hidden" => true };
/// assert_eq!(serialize_attributes(&a), r#" src="x.png" hidden"#);
/// ```
#[macro_export]
macro_rules! attrs {
    () => { $crate::Attrs::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut attrs = $crate::Attrs::new();
        $( attrs.insert($name, $value); )+
        attrs
    }};
}

/// Serialize attributes for direct concatenation after a tag name.
///
/// Null and `false` are skipped, `true` renders the bare name, anything
/// else renders `name="escaped value"`. Each entry carries a leading space.
pub fn serialize_attributes(attrs: &Attrs) -> String {
    let mut out = String::new();
    for (name, value) in attrs.iter() {
        match value {
            AttrValue::Null | AttrValue::Bool(false) => continue,
            AttrValue::Bool(true) => {
                out.push(' ');
                out.push_str(name);
            }
            other => {
                let text = other.to_string();
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape(&text));
                out.push('"');
            }
        }
    }
    out
}

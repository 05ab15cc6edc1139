//! Message bodies: ordered sequences of opaque values.
//!
//! A [`Body`] is forwarded to the remote end as a single positional array.
//! Its values are never inspected or rewritten.

use serde::Serialize;
use serde_json::Value;

/// Ordered arguments of a `send` or `request` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Body(Vec<Value>);

impl Body {
    /// Create an empty body.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append an already encoded value.
    #[must_use]
    pub fn with(mut self, value: Value) -> Self {
        self.0.push(value);
        self
    }

    /// Serialize `value` and append it.
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] if `value` cannot be represented as JSON.
    pub fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.0.push(serde_json::to_value(value)?);
        Ok(())
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Whether the body has no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Borrow the arguments.
    #[must_use]
    pub fn values(&self) -> &[Value] { &self.0 }

    /// Build the positional argument list of the dispatch method:
    /// `[address, [body...]]`.
    pub(crate) fn into_arguments(self, address: &str) -> Vec<Value> {
        vec![Value::String(address.to_owned()), Value::Array(self.0)]
    }
}

impl From<Vec<Value>> for Body {
    fn from(values: Vec<Value>) -> Self { Self(values) }
}

impl From<()> for Body {
    fn from((): ()) -> Self { Self::default() }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self { Self(vec![value]) }
}

impl FromIterator<Value> for Body {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self { Self(iter.into_iter().collect()) }
}

impl IntoIterator for Body {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

/// Build a [`Body`] from JSON-like literals.
///
/// Arguments are comma separated and each accepts the same syntax as an
/// element of a [`serde_json::json!`] array, including arbitrary
/// expressions.
///
/// ```
/// use hubline::body;
///
/// let count = 2;
/// let body = body!["room-1", { "text": "hi" }, -3, count + 1];
/// assert_eq!(body.len(), 4);
/// ```
#[macro_export]
macro_rules! body {
    () => {
        $crate::Body::new()
    };
    ($($tt:tt)+) => {
        $crate::__private::body($crate::__private::json!([$($tt)+]))
    };
}

use std::fmt::{self, Display, Formatter};

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut first = true;
    for v in values {
        let start = out.len();
        if !first {
            out.push_str(separator);
        }
        let len = out.len();
        f(out, v);
        if out.len() == len {
            // Nothing written, drop the separator as well
            out.truncate(start);
        } else {
            first = false;
        }
    }
}

pub fn consume_while<'s>(input: &mut &'s str, mut predicate: impl FnMut(&char) -> bool) -> &'s str {
    let len = input
        .char_indices()
        .find(|(_, c)| !predicate(c))
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    let result = &input[..len];
    *input = &input[len..];
    result
}

/// Prints at most [`Truncated::LIMIT`] bytes of a long text, used for SQL in logs and errors.
pub struct Truncated<'a>(pub &'a str);

impl Truncated<'_> {
    pub const LIMIT: usize = 497;
}

impl Display for Truncated<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.len() <= Self::LIMIT {
            return f.write_str(self.0.trim_end());
        }
        let mut end = Self::LIMIT;
        while !self.0.is_char_boundary(end) {
            end -= 1;
        }
        write!(f, "{}...", self.0[..end].trim_end())
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        $crate::Truncated(::std::convert::AsRef::<str>::as_ref(&$query))
    };
}

/// Builds a [`Conditions`](crate::Conditions) map.
///
/// Keys are a field name optionally followed by an operator alias, or `and` /
/// `or` followed by a braced nested group.
/// ```rust
/// use rivet_core::conditions;
/// let conditions = conditions! {
///     "or" => {
///         "and" => { "manufacturer_id" => 1, "name like" => "A%" },
///         "manufacturer_id" => 2,
///     },
/// };
/// assert_eq!(conditions.len(), 1);
/// ```
#[macro_export]
macro_rules! conditions {
    (@push $c:ident;) => {};
    (@push $c:ident; $key:expr => { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $c.push($key, $crate::Condition::Group($crate::conditions!($($inner)*)));
        $crate::conditions!(@push $c; $($($rest)*)?);
    };
    (@push $c:ident; $key:expr => $value:expr $(, $($rest:tt)*)?) => {
        $c.push($key, $crate::Condition::Value(::std::convert::Into::<$crate::Value>::into($value)));
        $crate::conditions!(@push $c; $($($rest)*)?);
    };
    ($($body:tt)*) => {{
        #[allow(unused_mut)]
        let mut conditions = $crate::Conditions::new();
        $crate::conditions!(@push conditions; $($body)*);
        conditions
    }};
}

/// Builds an ordered [`Data`](crate::Data) map of field values.
#[macro_export]
macro_rules! data {
    () => {
        $crate::Data::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut data = $crate::Data::new();
        $(
            data.insert(
                ::std::convert::Into::<String>::into($key),
                ::std::convert::Into::<$crate::Value>::into($value),
            );
        )+
        data
    }};
}

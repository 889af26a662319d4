//! Inclusive bounds validation for decoded header fields.

/// Checks that `$n` lies within `[$lower, $upper]`, producing an
/// [`std::io::ErrorKind::InvalidData`] error naming the field otherwise.
#[macro_export]
macro_rules! range_check {
    ($n:expr, $lower:expr, $upper:expr) => {{
        let value = $n;

        #[allow(unused_comparisons, clippy::manual_range_contains)]
        let out_of_range = value < $lower || value > $upper;
        if out_of_range {
            ::std::result::Result::Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                format!(
                    "{} = {} is outside [{}, {}]",
                    stringify!($n),
                    value,
                    $lower,
                    $upper
                ),
            ))
        } else {
            ::std::result::Result::Ok(value)
        }
    }};
}

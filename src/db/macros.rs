//! Convenience macros for building parameter lists.

/// Build a `Vec<SqlParam>` from heterogeneous values.
///
/// Each value is converted through `Into<SqlParam>`, so only the kinds the
/// binder supports compile.
///
/// # Example
///
/// ```ignore
/// let rows = connector
///     .query("INSERT INTO Opt_out (GID, UID) VALUES (?, ?)", &params!["123", "456"])
///     .await?;
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::db::params::SqlParam>::new()
    };
    ($($value:expr),+ $(,)?) => {
        <[_]>::into_vec(::std::boxed::Box::new([
            $($crate::db::params::SqlParam::from($value)),+
        ]))
    };
}

pub use params;

#[cfg(test)]
mod tests {
    use crate::db::SqlParam;

    #[test]
    fn test_empty_params() {
        let p = params![];
        assert!(p.is_empty());
    }

    #[test]
    fn test_mixed_params() {
        let p = params!["123", 9i64, true, None::<String>];
        assert_eq!(
            p,
            vec![
                SqlParam::Text("123".into()),
                SqlParam::BigInt(9),
                SqlParam::Bool(true),
                SqlParam::Null,
            ]
        );
    }
}

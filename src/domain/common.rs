//! Common helpers for domain models

use regex::Regex;

/// Implements MySQL string (de)serialization for a lowercase status enum
/// backed by `FromStr` + `Display`.
macro_rules! impl_mysql_string_enum {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::MySql> for $ty {
            fn type_info() -> sqlx::mysql::MySqlTypeInfo {
                <String as sqlx::Type<sqlx::MySql>>::type_info()
            }

            fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::MySql> for $ty {
            fn decode(
                value: sqlx::mysql::MySqlValueRef<'r>,
            ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
                let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::MySql> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut Vec<u8>,
            ) -> std::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
            }
        }
    };
}

pub(crate) use impl_mysql_string_enum;

lazy_static::lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^\p{L}\p{N}\s_-]+").unwrap();
    static ref SEPARATOR_RUNS: Regex = Regex::new(r"[\s_-]+").unwrap();
}

/// Build a URL/identifier-safe slug.
///
/// Lowercases, expands `@` to `at`, strips punctuation, and collapses every
/// run of whitespace, dashes and underscores into `separator`.
pub fn slugify(input: &str, separator: char) -> String {
    let expanded = input.replace('@', " at ").to_lowercase();
    let cleaned = NON_SLUG_CHARS.replace_all(&expanded, "");
    let joined = SEPARATOR_RUNS.replace_all(&cleaned, separator.to_string().as_str());
    joined.trim_matches(separator).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Acme Co", '_', "acme_co")]
    #[case("acme", '_', "acme")]
    #[case("  Big--Corp__Ltd ", '_', "big_corp_ltd")]
    #[case("acme.io", '_', "acmeio")]
    #[case("Acme Co", '-', "acme-co")]
    #[case("sales@acme", '-', "sales-at-acme")]
    fn test_slugify(#[case] input: &str, #[case] sep: char, #[case] expected: &str) {
        assert_eq!(slugify(input, sep), expected);
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify("!!!", '_'), "");
    }
}

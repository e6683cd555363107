use convert_case::{Boundary, Case, Converter};

/// Column name for a camelCase property name (`someOtherId` -> `some_other_id`).
///
/// Words split only before an uppercase letter, so digits stay attached:
/// `address2` -> `address2`, `utf8Text` -> `utf8_text`.
pub fn to_field_name(property_name: &str) -> String {
    Converter::new()
        .set_boundaries(&[Boundary::LowerUpper, Boundary::DigitUpper])
        .to_case(Case::Snake)
        .convert(property_name)
}

/// Property name for a snake_case column name (`some_other_id` -> `someOtherId`).
pub fn to_property_name(field_name: &str) -> String {
    Converter::new()
        .set_boundaries(&[Boundary::Underscore])
        .to_case(Case::Camel)
        .convert(field_name)
}

/// Backtick-quotes an identifier, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name() {
        assert_eq!(to_field_name("someName"), "some_name");
        assert_eq!(to_field_name("someOtherId"), "some_other_id");
        assert_eq!(to_field_name("id"), "id");
    }

    #[test]
    fn test_property_name() {
        assert_eq!(to_property_name("some_name"), "someName");
        assert_eq!(to_property_name("some_other_id"), "someOtherId");
    }

    #[test]
    fn test_digits_stay_in_their_word() {
        assert_eq!(to_field_name("address2"), "address2");
        assert_eq!(to_field_name("utf8Text"), "utf8_text");
        assert_eq!(to_property_name("address2"), "address2");
        assert_eq!(to_property_name("utf8_text"), "utf8Text");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("t"), "`t`");
        assert_eq!(quote_identifier("a`b"), "`a``b`");
    }
}

use juniper::{GraphQLScalar, InputValue, ScalarValue};
use std::fmt;
use uuid::Uuid;


/// Identifier of users, profiles and posts.
///
/// On the wire, this is always the hyphenated 36 character form of a UUID,
/// e.g. `67e55044-10b1-426f-9247-bb680e5fe0c8`. Parsing accepts upper and
/// lower case hex digits, but nothing else: no braces, no `urn:uuid:` prefix
/// and no simple (unhyphenated) form. Output is always lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, GraphQLScalar)]
#[graphql(
    name = "UUID",
    description = "A UUID in its canonical hyphenated form",
    parse_token(String),
)]
pub(crate) struct Id(pub(crate) Uuid);

impl Id {
    fn to_output<S: ScalarValue>(&self) -> juniper::Value<S> {
        juniper::Value::scalar(self.to_string())
    }

    fn from_input<S: ScalarValue>(input: &InputValue<S>) -> Result<Self, String> {
        let s = input.as_string_value().ok_or("expected string")?;
        s.parse().map_err(|e| format!("invalid UUID '{s}': {e}"))
    }
}

impl std::str::FromStr for Id {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 36 {
            return Err("invalid length");
        }

        let hyphens_ok = s.bytes().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => b == b'-',
            _ => b.is_ascii_hexdigit(),
        });
        if !hyphens_ok {
            return Err("not in hyphenated hex form");
        }

        Uuid::try_parse(s).map(Self).map_err(|_| "not a valid UUID")
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl From<Uuid> for Id {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}


#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use uuid::Uuid;
    use super::Id;

    #[test]
    fn canonical_form() {
        let s = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let id = Id::from_str(s).unwrap();
        assert_eq!(id.to_string(), s);
        assert_eq!(id.0, Uuid::parse_str(s).unwrap());
    }

    #[test]
    fn output_is_lowercase() {
        let id = Id::from_str("67E55044-10B1-426F-9247-BB680E5FE0C8").unwrap();
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn invalid_decode() {
        // Wrong length
        assert_eq!(Id::from_str(""), Err("invalid length"));
        assert_eq!(Id::from_str("67e5504410b1426f9247bb680e5fe0c8"), Err("invalid length"));
        assert_eq!(
            Id::from_str("{67e55044-10b1-426f-9247-bb680e5fe0c8}"),
            Err("invalid length"),
        );

        // Right length, wrong shape
        assert_eq!(
            Id::from_str("67e55044-10b1-426f-9247bbb680e5fe0c8"),
            Err("not in hyphenated hex form"),
        );
        assert_eq!(
            Id::from_str("67e55044-10b1-426f-9247-bb680e5fe0cg"),
            Err("not in hyphenated hex form"),
        );
    }
}

//! Field-by-field comparison of a requested update against fetched state.

use std::collections::BTreeSet;

/// Names of requested fields whose fetched value differs.
pub type Mismatches = BTreeSet<&'static str>;

/// Compares explicitly requested fields against a freshly fetched resource.
///
/// Fields left unset in the request are never compared.
pub trait FieldMatch<T> {
    fn mismatched_fields(&self, actual: &T) -> Mismatches;

    fn matches(&self, actual: &T) -> bool {
        self.mismatched_fields(actual).is_empty()
    }
}

/// Record `name` if `requested` is set and differs from `actual`.
pub fn compare_field<V: PartialEq>(
    mismatches: &mut Mismatches,
    name: &'static str,
    requested: Option<&V>,
    actual: Option<&V>,
) {
    if let Some(requested) = requested {
        if actual != Some(requested) {
            mismatches.insert(name);
        }
    }
}

/// Implements [`FieldMatch`] for a request whose `Option` fields mirror
/// `Option` fields of the same name on the resource.
#[macro_export]
macro_rules! field_match {
    ($request:ty => $resource:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::convergence::FieldMatch<$resource> for $request {
            fn mismatched_fields(&self, actual: &$resource) -> $crate::convergence::Mismatches {
                let mut mismatches = $crate::convergence::Mismatches::new();
                $(
                    $crate::convergence::compare_field(
                        &mut mismatches,
                        stringify!($field),
                        self.$field.as_ref(),
                        actual.$field.as_ref(),
                    );
                )+
                mismatches
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Rename {
        name: Option<String>,
        description: Option<String>,
    }

    struct Thing {
        name: Option<String>,
        description: Option<String>,
    }

    crate::field_match!(Rename => Thing { name, description });

    fn thing(name: &str, description: &str) -> Thing {
        Thing {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
        }
    }

    #[test]
    fn test_only_requested_fields_compared() {
        let request = Rename {
            name: Some("lab".to_string()),
            ..Rename::default()
        };
        assert!(request.matches(&thing("lab", "anything")));
        assert_eq!(
            request.mismatched_fields(&thing("old", "anything")),
            Mismatches::from(["name"])
        );
    }

    #[test]
    fn test_empty_request_always_matches() {
        assert!(Rename::default().matches(&thing("a", "b")));
    }

    #[test]
    fn test_missing_actual_value_mismatches() {
        let request = Rename {
            description: Some("d".to_string()),
            ..Rename::default()
        };
        let actual = Thing {
            name: None,
            description: None,
        };
        assert_eq!(
            request.mismatched_fields(&actual),
            Mismatches::from(["description"])
        );
    }
}

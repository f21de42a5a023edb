//! Small collection helpers shared by assertions and cookie lookups.

use crate::result::{PageCheckError, PageCheckResult};
use std::fmt::Display;

/// Join items for humans, using a different separator before the last item.
///
/// `["foo", "bar", "baz"]` with `"and"` becomes `"foo, bar and baz"`.
pub fn human_readable_list<T: Display>(items: &[T], last_separator: &str) -> String {
    human_readable_list_with(items, ", ", last_separator)
}

/// Same as [`human_readable_list`] with a custom separator for all but the last item.
pub fn human_readable_list_with<T: Display>(
    items: &[T],
    separator: &str,
    last_separator: &str,
) -> String {
    match items {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => {
            let head = init
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(separator);
            format!("{head} {last_separator} {last}")
        }
    }
}

/// Take exactly one item out of an iterator.
///
/// `what` names the item in the error: `Cannot find <what>` when the
/// iterator is empty, `More than one <what> found` when it yields more.
pub fn only_one<T, I>(items: I, what: &str) -> PageCheckResult<T>
where
    I: IntoIterator<Item = T>,
{
    let mut iter = items.into_iter();
    let first = iter.next().ok_or_else(|| PageCheckError::MissingValue {
        what: what.to_string(),
    })?;
    if iter.next().is_some() {
        return Err(PageCheckError::MultipleValues {
            what: what.to_string(),
        });
    }
    Ok(first)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod human_readable_list_tests {
        use super::*;

        #[test]
        fn test_empty() {
            let items: [&str; 0] = [];
            assert_eq!(human_readable_list(&items, "or"), "");
        }

        #[test]
        fn test_single() {
            assert_eq!(human_readable_list(&["foo"], "or"), "foo");
        }

        #[test]
        fn test_two() {
            assert_eq!(human_readable_list(&["foo", "bar"], "and"), "foo and bar");
        }

        #[test]
        fn test_many() {
            assert_eq!(
                human_readable_list(&["foo", "bar", "baz"], "and"),
                "foo, bar and baz"
            );
        }

        #[test]
        fn test_custom_separator() {
            assert_eq!(
                human_readable_list_with(&[1, 2, 3, 4], "; ", "or"),
                "1; 2; 3 or 4"
            );
        }
    }

    mod only_one_tests {
        use super::*;

        #[test]
        fn test_exactly_one() {
            assert_eq!(only_one(vec![7], "number").unwrap(), 7);
        }

        #[test]
        fn test_none() {
            let err = only_one(Vec::<i32>::new(), "session cookie").unwrap_err();
            assert_eq!(err.to_string(), "Cannot find session cookie");
        }

        #[test]
        fn test_many() {
            let err = only_one(vec![1, 2], "session cookie").unwrap_err();
            assert_eq!(err.to_string(), "More than one session cookie found");
        }
    }
}

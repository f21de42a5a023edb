//! URI equivalence.
//!
//! Two URIs are equivalent when scheme, host, port and path agree. A root
//! path (`/`) and an empty path are the same path. Query and fragment are
//! compared only when asked for.
//!
//! Default ports are dropped by the parser, so `https://x.com:443/` and
//! `https://x.com/` have the same (absent) port.

use crate::driver::BrowserDriver;
use crate::result::{PageCheckError, PageCheckResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// Which optional URI components take part in a comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UriMatch {
    /// Compare query strings
    pub query_needed: bool,
    /// Compare fragments
    pub fragment_needed: bool,
}

impl UriMatch {
    /// Compare scheme, host, port and path only
    pub const LOOSE: Self = Self::new(false, false);

    /// Create match flags
    #[must_use]
    pub const fn new(query_needed: bool, fragment_needed: bool) -> Self {
        Self {
            query_needed,
            fragment_needed,
        }
    }

    /// Require equal query strings
    #[must_use]
    pub const fn with_query(mut self, needed: bool) -> Self {
        self.query_needed = needed;
        self
    }

    /// Require equal fragments
    #[must_use]
    pub const fn with_fragment(mut self, needed: bool) -> Self {
        self.fragment_needed = needed;
        self
    }

    /// Whether `actual` is equivalent to `expected` under these flags
    #[must_use]
    pub fn matches(&self, actual: &Url, expected: &Url) -> bool {
        compare_uris(actual, expected, *self)
    }

    /// Whether `actual` is equivalent to any of `candidates`
    #[must_use]
    pub fn matches_any(&self, actual: &Url, candidates: &[Url]) -> bool {
        matches_any(actual, candidates, *self)
    }
}

/// Whether two URIs are equivalent under `flags`
#[must_use]
pub fn compare_uris(a: &Url, b: &Url, flags: UriMatch) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port() == b.port()
        && normalized_path(a) == normalized_path(b)
        && (!flags.query_needed || a.query() == b.query())
        && (!flags.fragment_needed || a.fragment() == b.fragment())
}

/// Whether `actual` is equivalent to any candidate, stopping at the first match
#[must_use]
pub fn matches_any(actual: &Url, candidates: &[Url], flags: UriMatch) -> bool {
    candidates
        .iter()
        .any(|candidate| compare_uris(actual, candidate, flags))
}

/// Path with a bare `/` folded to the empty path
#[must_use]
pub fn normalized_path(url: &Url) -> &str {
    match url.path() {
        "/" => "",
        path => path,
    }
}

/// Parse an absolute URI
///
/// # Errors
///
/// Returns [`PageCheckError::InvalidUrl`] if `raw` is not an absolute URI
pub fn parse_uri(raw: &str) -> PageCheckResult<Url> {
    Url::parse(raw).map_err(|source| PageCheckError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

/// Resolve `reference` against `base`; absolute references are kept as-is
///
/// # Errors
///
/// Returns [`PageCheckError::InvalidUrl`] if the result is not a valid URI
pub fn resolve_uri(base: Option<&Url>, reference: &str) -> PageCheckResult<Url> {
    let resolved = match base {
        Some(base) => base.join(reference),
        None => Url::parse(reference),
    };
    resolved.map_err(|source| PageCheckError::InvalidUrl {
        url: reference.to_string(),
        source,
    })
}

/// Copy of `url` with the components not needed by `flags` removed
#[must_use]
pub fn strip_uri(url: &Url, flags: UriMatch) -> Url {
    let mut stripped = url.clone();
    if !flags.query_needed {
        stripped.set_query(None);
    }
    if !flags.fragment_needed {
        stripped.set_fragment(None);
    }
    stripped
}

/// Human-readable form of a URI, root path shown without the trailing `/`
#[must_use]
pub fn display_uri(url: &Url) -> String {
    let text = url.as_str();
    if url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
        text.strip_suffix('/').unwrap_or(text).to_string()
    } else {
        text.to_string()
    }
}

/// Read the browser location, keeping only the components `flags` ask for.
///
/// # Errors
///
/// Returns [`PageCheckError::BrokenUri`] if the location does not parse and
/// the driver failure if the location cannot be read at all
pub fn opened_uri(driver: &dyn BrowserDriver, flags: UriMatch) -> PageCheckResult<Url> {
    let raw = driver.current_url()?;
    let url = Url::parse(&raw).map_err(|_| PageCheckError::BrokenUri { url: raw.clone() })?;
    Ok(strip_uri(&url, flags))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;
    use proptest::prelude::*;

    fn url(raw: &str) -> Url {
        parse_uri(raw).unwrap()
    }

    const ALL_FLAGS: [UriMatch; 4] = [
        UriMatch::new(false, false),
        UriMatch::new(true, false),
        UriMatch::new(false, true),
        UriMatch::new(true, true),
    ];

    mod compare_tests {
        use super::*;

        #[test]
        fn test_root_path_normalization_under_every_flag() {
            for flags in ALL_FLAGS {
                assert!(compare_uris(&url("https://x.com"), &url("https://x.com/"), flags));
            }
        }

        #[test]
        fn test_query_sensitivity() {
            let a = url("https://x.com/a?x=1");
            let b = url("https://x.com/a?x=2");
            assert!(compare_uris(&a, &b, UriMatch::new(false, false)));
            assert!(!compare_uris(&a, &b, UriMatch::new(true, false)));
        }

        #[test]
        fn test_fragment_sensitivity() {
            let a = url("https://x.com/a#top");
            let b = url("https://x.com/a#bottom");
            assert!(compare_uris(&a, &b, UriMatch::new(false, false)));
            assert!(!compare_uris(&a, &b, UriMatch::new(false, true)));
        }

        #[test]
        fn test_missing_query_differs_when_needed() {
            let a = url("https://x.com/a");
            let b = url("https://x.com/a?x=1");
            assert!(!compare_uris(&a, &b, UriMatch::LOOSE.with_query(true)));
        }

        #[test]
        fn test_scheme_host_port_path_must_match() {
            let base = url("https://x.com:8443/a");
            assert!(!compare_uris(&base, &url("http://x.com:8443/a"), UriMatch::LOOSE));
            assert!(!compare_uris(&base, &url("https://y.com:8443/a"), UriMatch::LOOSE));
            assert!(!compare_uris(&base, &url("https://x.com/a"), UriMatch::LOOSE));
            assert!(!compare_uris(&base, &url("https://x.com:8443/b"), UriMatch::LOOSE));
            assert!(!compare_uris(&base, &url("https://x.com:8443/a/"), UriMatch::LOOSE));
        }

        #[test]
        fn test_default_port_is_absent() {
            assert!(compare_uris(
                &url("https://x.com:443/a"),
                &url("https://x.com/a"),
                UriMatch::LOOSE
            ));
        }
    }

    mod matches_any_tests {
        use super::*;

        #[test]
        fn test_alternate_matches() {
            let candidates = [url("https://site.com/en"), url("https://site.com/en-gb")];
            assert!(matches_any(&url("https://site.com/en-gb"), &candidates, UriMatch::LOOSE));
            assert!(!matches_any(&url("https://site.com/de"), &candidates, UriMatch::LOOSE));
        }

        #[test]
        fn test_empty_list_never_matches() {
            assert!(!UriMatch::LOOSE.matches_any(&url("https://site.com"), &[]));
        }
    }

    mod helper_tests {
        use super::*;

        #[test]
        fn test_strip_uri() {
            let full = url("https://site.com/en/home?ref=x#top");
            assert_eq!(strip_uri(&full, UriMatch::LOOSE).as_str(), "https://site.com/en/home");
            assert_eq!(
                strip_uri(&full, UriMatch::new(true, false)).as_str(),
                "https://site.com/en/home?ref=x"
            );
            assert_eq!(strip_uri(&full, UriMatch::new(true, true)), full);
        }

        #[test]
        fn test_resolve_relative_and_absolute() {
            let base = url("https://site.com/");
            assert_eq!(
                resolve_uri(Some(&base), "/en/home").unwrap().as_str(),
                "https://site.com/en/home"
            );
            assert_eq!(
                resolve_uri(Some(&base), "https://other.com/x").unwrap().as_str(),
                "https://other.com/x"
            );
            assert!(matches!(
                resolve_uri(None, "/en/home"),
                Err(PageCheckError::InvalidUrl { .. })
            ));
        }

        #[test]
        fn test_display_uri() {
            assert_eq!(display_uri(&url("https://site.com/")), "https://site.com");
            assert_eq!(display_uri(&url("https://site.com/en")), "https://site.com/en");
        }

        #[test]
        fn test_opened_uri_strips_components() {
            let driver = MockDriver::new().with_url("https://site.com/en/home?ref=x#top");
            let opened = opened_uri(&driver, UriMatch::LOOSE).unwrap();
            assert_eq!(opened.as_str(), "https://site.com/en/home");
        }

        #[test]
        fn test_opened_uri_reports_broken_location() {
            let driver = MockDriver::new().with_url("not a uri");
            let err = opened_uri(&driver, UriMatch::LOOSE).unwrap_err();
            assert_eq!(err.to_string(), "Browser is showing broken URI: not a uri");
            assert!(err.is_transient());
        }
    }

    mod properties {
        use super::*;
        use crate::mock::arb_url;

        fn segment() -> impl Strategy<Value = String> {
            "[a-z0-9]{1,8}"
        }

        proptest! {
            #[test]
            fn prop_reflexive(u in arb_url(), q in any::<bool>(), f in any::<bool>()) {
                prop_assert!(compare_uris(&u, &u, UriMatch::new(q, f)));
            }

            #[test]
            fn prop_symmetric(a in arb_url(), b in arb_url(), q in any::<bool>(), f in any::<bool>()) {
                let flags = UriMatch::new(q, f);
                prop_assert_eq!(compare_uris(&a, &b, flags), compare_uris(&b, &a, flags));
            }

            #[test]
            fn prop_loose_ignores_query_and_fragment(u in arb_url(), q in "[a-z]{1,5}", f in segment()) {
                let mut other = u.clone();
                other.set_query(Some(&q));
                other.set_fragment(Some(&f));
                prop_assert!(compare_uris(&u, &other, UriMatch::LOOSE));
            }

            #[test]
            fn prop_strict_implies_loose(a in arb_url(), b in arb_url()) {
                if compare_uris(&a, &b, UriMatch::new(true, true)) {
                    prop_assert!(compare_uris(&a, &b, UriMatch::LOOSE));
                }
            }

            #[test]
            fn prop_stripped_uri_matches_original_loosely(u in arb_url()) {
                prop_assert!(compare_uris(&strip_uri(&u, UriMatch::LOOSE), &u, UriMatch::LOOSE));
            }
        }
    }
}

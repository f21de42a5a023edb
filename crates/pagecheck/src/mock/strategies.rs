//! Proptest strategies for page-check inputs
//!
//! ```rust,ignore
//! proptest! {
//!     #[test]
//!     fn prop_page_opens_on_its_own_uri(uri in arb_url()) {
//!         let driver = MockDriver::new().with_url(uri.as_str());
//!         // ...
//!     }
//! }
//! ```

use crate::cookies::Cookie;
use proptest::prelude::*;
use url::Url;

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

/// Absolute http(s) URL with optional path, query and fragment
pub fn arb_url() -> impl Strategy<Value = Url> {
    (
        any::<bool>(),
        "[a-z]{1,10}\\.(com|org|io)",
        prop::option::of(1024_u16..9000),
        prop::collection::vec(segment(), 0..4),
        prop::option::of("[a-z]{1,5}=[0-9]{1,3}"),
        prop::option::of(segment()),
    )
        .prop_filter_map(
            "unparseable url",
            |(https, host, port, path, query, fragment)| {
                let scheme = if https { "https" } else { "http" };
                let port = port.map(|p| format!(":{p}")).unwrap_or_default();
                let mut raw = format!("{scheme}://{host}{port}/{}", path.join("/"));
                if let Some(q) = query {
                    raw.push('?');
                    raw.push_str(&q);
                }
                if let Some(f) = fragment {
                    raw.push('#');
                    raw.push_str(&f);
                }
                Url::parse(&raw).ok()
            },
        )
}

/// Cookie with a short alphanumeric name and value
pub fn arb_cookie() -> impl Strategy<Value = Cookie> {
    ("[a-z_]{1,10}", "[A-Za-z0-9]{0,12}").prop_map(|(name, value)| Cookie::new(name, value))
}

/// Cookies with distinct names
pub fn arb_cookie_set() -> impl Strategy<Value = Vec<Cookie>> {
    prop::collection::btree_map("[a-z_]{1,10}", "[A-Za-z0-9]{0,12}", 0..5).prop_map(|cookies| {
        cookies
            .into_iter()
            .map(|(name, value)| Cookie::new(name, value))
            .collect()
    })
}

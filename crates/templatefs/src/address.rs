//! Template identity carried in an address query string
//!
//! Addresses look like `templatefs:/greeting.md?name=greeting&ext=md`. Only
//! the query matters: scheme and path are opaque to the adapter.

use url::Url;

/// Query keys understood by the adapter
const NAME_KEY: &str = "name";
const EXT_KEY: &str = "ext";

/// Decoded `name`/`ext` pair of an address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateQuery {
    /// Template identity. `None` when absent or empty.
    pub name: Option<String>,
    /// Extension, only consulted when a template is created
    pub ext: Option<String>,
}

impl TemplateQuery {
    /// Decode the query string of `uri`
    ///
    /// Form-urlencoded rules apply (`%xx` and `+`). The first occurrence of
    /// a repeated key wins and empty values count as absent. Never fails.
    pub fn decode(uri: &Url) -> Self {
        let mut query = Self::default();
        for (key, value) in uri.query_pairs() {
            let slot = match key.as_ref() {
                NAME_KEY => &mut query.name,
                EXT_KEY => &mut query.ext,
                _ => continue,
            };
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }
        query
    }

    /// Build an address from `base` with its query replaced by `name`/`ext`
    pub fn to_uri(base: &Url, name: &str, ext: Option<&str>) -> Url {
        let mut uri = base.clone();
        {
            let mut pairs = uri.query_pairs_mut();
            pairs.clear().append_pair(NAME_KEY, name);
            if let Some(ext) = ext {
                pairs.append_pair(EXT_KEY, ext);
            }
        }
        uri
    }

    /// Template name, or the empty string when the address carries none
    ///
    /// Stores never hold a template under the empty name, so lookups with it
    /// miss.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

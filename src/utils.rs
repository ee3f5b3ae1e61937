use std::fmt::Display;

/// Joins path segments with single forward slashes.
///
/// Leading and trailing slashes are stripped from every segment, except that a
/// segment ending in `//` (such as a bare `https://`) keeps exactly one trailing
/// slash. Segment contents are not escaped.
///
/// # Examples
///
/// ```
/// use solaredge::urljoin;
///
/// assert_eq!(
///     urljoin(["https://monitoringapi.solaredge.com/", "site", "12345", "/details"]),
///     "https://monitoringapi.solaredge.com/site/12345/details"
/// );
/// assert_eq!(urljoin(["http://", "example.com"]), "http://example.com");
/// ```
pub fn urljoin<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Display,
{
    parts
        .into_iter()
        .map(|part| {
            let part = part.to_string();
            if part.ends_with("//") {
                part[..part.len() - 1].to_string()
            } else {
                part.trim_matches('/').to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

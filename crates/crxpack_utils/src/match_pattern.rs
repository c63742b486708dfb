/// Origin-level form of a match pattern: `https://*.example.com/app/*` becomes
/// `https://*.example.com/*`. Special patterns such as `<all_urls>` are returned unchanged.
///
/// Returns `None` for text that is not a match pattern.
pub fn get_match_pattern_origin(pattern: &str) -> Option<String> {
  if pattern.starts_with('<') {
    return Some(pattern.to_string());
  }

  let (scheme, rest) = pattern.split_once("://")?;
  if scheme.is_empty() {
    return None;
  }
  let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
  if path.is_empty() {
    Some(format!("{scheme}://{host}"))
  } else {
    Some(format!("{scheme}://{host}/*"))
  }
}

/// Whether a manifest path is a glob rather than a concrete file.
pub fn is_glob(path: &str) -> bool {
  path.contains(['*', '?', '[', '{'])
}

#[test]
fn test_get_match_pattern_origin() {
  assert_eq!(get_match_pattern_origin("https://a.com/app/*").as_deref(), Some("https://a.com/*"));
  assert_eq!(get_match_pattern_origin("*://*/*").as_deref(), Some("*://*/*"));
  assert_eq!(get_match_pattern_origin("https://a.com").as_deref(), Some("https://a.com"));
  assert_eq!(get_match_pattern_origin("<all_urls>").as_deref(), Some("<all_urls>"));
  assert_eq!(get_match_pattern_origin("a.com/*"), None);
}

#[test]
fn test_is_glob() {
  assert!(is_glob("**/*"));
  assert!(is_glob("images/*.png"));
  assert!(!is_glob("icons/16.png"));
}

//! Small utility helpers used across modules.

/// Canonical form used for answer comparison: surrounding whitespace removed,
/// lower-cased. Inner whitespace is kept as-is.
pub fn normalize(s: &str) -> String {
  s.trim().to_lowercase()
}

/// Log-safe truncation for user-supplied strings.
/// Cuts on a char boundary so multi-byte input never panics.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

//! Small utility helpers used across modules.

/// True if the login identifier should be treated as an email address.
/// The wire contract disambiguates email vs username by `@` presence.
pub fn is_email(identifier: &str) -> bool {
  identifier.contains('@')
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_detection_is_at_sign_presence() {
    assert!(is_email("a@b.c"));
    assert!(!is_email("plainuser"));
  }

  #[test]
  fn truncation_keeps_short_strings_intact() {
    assert_eq!(trunc_for_log("short", 64), "short");
    assert!(trunc_for_log(&"x".repeat(100), 8).starts_with("xxxxxxxx"));
  }
}

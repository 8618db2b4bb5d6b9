use crate::serve::config::SinglePage;

/// Parse the value of `--single`.
///
/// Accepts `true`, `false` or a file name relative to the served directory.
/// File names may not climb out of the served directory.
///
/// # Errors
///
/// Returns an error message for names containing `..` segments.
pub fn parse_single(s: &str) -> Result<SinglePage, String> {
    if s.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(format!(
            "Fallback file must be inside the served directory: '{}'",
            s
        ));
    }

    SinglePage::parse(s)
}

use url::Url;

/// Validates an icon or image reference.
///
/// Accepts a site-relative path (`/uploads/a.png`) or an absolute
/// http(s) URL. Files themselves are stored elsewhere.
pub fn validate_asset_ref(value: &str) -> Result<(), validator::ValidationError> {
    if value.starts_with('/') && !value.starts_with("//") && !value.contains("..") {
        return Ok(());
    }

    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_asset_ref")),
    }
}

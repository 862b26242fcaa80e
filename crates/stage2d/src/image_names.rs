use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageNameError {
    #[error("image name must not be empty")]
    Empty,
    #[error("image name must not start with '/'")]
    LeadingSlash,
    #[error("image name must not contain '\\\\'")]
    Backslash,
    #[error("image name must not contain '..'")]
    ParentTraversal,
    #[error("image name contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Image names map onto `sprites/<name>.png` under the asset root, so they stay relative.
pub(crate) fn validate_image_name(name: &str) -> Result<(), ImageNameError> {
    if name.is_empty() {
        return Err(ImageNameError::Empty);
    }
    if name.starts_with('/') {
        return Err(ImageNameError::LeadingSlash);
    }
    if name.contains('\\') {
        return Err(ImageNameError::Backslash);
    }
    if name.contains("..") {
        return Err(ImageNameError::ParentTraversal);
    }
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '/' | '-' | '.') {
            continue;
        }
        return Err(ImageNameError::InvalidCharacter { character: ch });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_asset_style_names() {
        for name in ["hero", "icons/goodie_3", "Bird-Flap.1", "tiles/grass"] {
            assert!(validate_image_name(name).is_ok(), "name={name}");
        }
    }

    #[test]
    fn rejects_names_escaping_the_sprite_dir() {
        for name in ["", "/abs", "..", "a/../b", r"a\b", "sp ace", "star*"] {
            assert!(validate_image_name(name).is_err(), "name={name}");
        }
        assert_eq!(
            validate_image_name("x y"),
            Err(ImageNameError::InvalidCharacter { character: ' ' })
        );
    }
}

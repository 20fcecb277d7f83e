use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldErrors};

/// Name of the wishlist every customer gets at signup.
pub const DEFAULT_WISHLIST_NAME: &str = "favorites";

const MAX_NAME_LEN: usize = 32;

pub fn normalize_name(name: &str) -> AppResult<String> {
    let mut errors = FieldErrors::default();
    errors.require_text("wishlist_name", name, MAX_NAME_LEN);
    errors.into_result()?;
    Ok(name.trim().to_string())
}

/// `holder` is the caller's wishlist already using the name, `target` the wishlist
/// being renamed (`None` when creating). Renaming a wishlist to its own name is fine.
pub fn ensure_name_free(name: &str, holder: Option<Uuid>, target: Option<Uuid>) -> AppResult<()> {
    match holder {
        Some(holder) if Some(holder) != target => Err(AppError::DuplicateName(name.to_string())),
        _ => Ok(()),
    }
}

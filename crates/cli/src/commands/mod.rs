//! CLI command implementations.

pub mod cart;
pub mod checkout;

use kirana_storefront::config::StorefrontConfig;
use kirana_storefront::error::AppError;
use kirana_storefront::state::AppState;

/// Load configuration and open the persisted cart.
pub fn open_state() -> Result<AppState, AppError> {
    let config = StorefrontConfig::from_env()?;
    Ok(AppState::new(config))
}

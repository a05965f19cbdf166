pub mod gate;
pub mod identity;

pub use gate::require_sign_in;
pub use identity::{current_user, resolve_signed_in_name, sign_in_cookie};

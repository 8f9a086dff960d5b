// Utility modules

pub mod auth_errors;
pub mod password;
pub mod validation;

pub use auth_errors::{ApiError, ErrorResponse};
pub use password::{hash_password, hash_password_with_cost, verify_password, PasswordError};
pub use validation::{trim_and_validate_field, trim_optional_field};

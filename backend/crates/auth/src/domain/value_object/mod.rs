//! Value Object Module

pub mod account_id;
pub mod account_status;
pub mod display_name;
pub mod email;
pub mod password_hash;
pub mod user_role;

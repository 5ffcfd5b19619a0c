//! Token pair issuance shared by every sign-in path

use crate::domain::entity::token::{TokenIdentity, TokenPair};
use crate::domain::service::TokenProvider;
use crate::error::AuthResult;

pub fn issue_token_pair<T>(tokens: &T, identity: &TokenIdentity) -> AuthResult<TokenPair>
where
    T: TokenProvider + ?Sized,
{
    Ok(TokenPair {
        access_token: tokens.generate_access_token(identity)?,
        refresh_token: tokens.generate_refresh_token(identity)?,
    })
}

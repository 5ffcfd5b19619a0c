/// Identity asserted by an OAuth provider after a code exchange
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthUser {
    pub email: String,
    pub name: Option<String>,
    pub email_verified: bool,
}

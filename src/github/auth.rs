use secrecy::SecretString;

// -------------------------------------------------------------------------------------------------
// Auth
// -------------------------------------------------------------------------------------------------
/// Supported forms of authentication
pub enum Auth {
    /// No authentication
    Unauthenticated,

    /// Authenticate with a bearer token (a personal access token or an app installation token)
    BearerToken(SecretString),
}

impl Auth {
    pub fn bearer(token: String) -> Self {
        Auth::BearerToken(SecretString::new(token))
    }
}

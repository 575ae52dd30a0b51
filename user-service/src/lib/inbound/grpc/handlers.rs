use auth::TokenPair;

pub mod issue_token;

impl From<TokenPair> for crate::proto::IssueTokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

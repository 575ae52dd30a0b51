use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::Role;
use super::claims::TokenPair;
use super::claims::VerifiedToken;
use super::claims::WireClaims;
use super::errors::TokenError;

/// Issues and checks signed, time-bounded identity tokens.
///
/// Uses HS256 with a single symmetric secret. Access and refresh tokens share
/// the claim shape and the key and differ only in lifetime, so a refresh token
/// is accepted anywhere an access token is until the access TTL would have
/// run out on it. Splitting them would need a second key or a token-kind claim.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Create a codec with a signing secret and the two token lifetimes.
    ///
    /// # Arguments
    /// * `secret` - HS256 signing secret
    /// * `access_ttl` - Lifetime of access tokens
    /// * `refresh_ttl` - Lifetime of refresh tokens
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `verify` against whole seconds, not by the decoder.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue an access/refresh pair for a subject, starting now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue(&self, subject_id: u64, role: Role) -> Result<TokenPair, TokenError> {
        self.issue_at(subject_id, role, Utc::now())
    }

    /// Issue an access/refresh pair as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject_id: u64,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let (access_token, access_expires_at) = self.sign(subject_id, role, now, self.access_ttl)?;
        let (refresh_token, refresh_expires_at) =
            self.sign(subject_id, role, now, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn sign(
        &self,
        subject_id: u64,
        role: Role,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::EncodingFailed(format!("ttl out of range: {ttl}")))?
            .timestamp();
        let claims = WireClaims {
            user_id: subject_id,
            role: role.as_str().to_string(),
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))?;
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| TokenError::EncodingFailed(format!("exp out of range: {exp}")))?;

        Ok((token, expires_at))
    }

    /// Check the signature and decode the claim set. Expiry is not checked.
    ///
    /// # Errors
    /// * `SignatureInvalid` - Signature does not match the secret
    /// * `Malformed` - Token is structurally invalid or a claim has the wrong type
    /// * `UnknownRole` - Role tag is neither `user` nor `driver`
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<WireClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed(e.to_string()),
            },
        )?;

        Claims::try_from(data.claims)
    }

    /// Verify a token for this service's protected paths.
    ///
    /// # Errors
    /// * Every error of [`parse`](Self::parse)
    /// * `Expired` - Expiry is in the past
    /// * `UnknownRole` - Token was issued for a role other than `user`
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken, TokenError> {
        let claims = self.parse(token)?;

        if claims.is_expired(now) {
            return Err(TokenError::Expired);
        }

        if claims.role != Role::User {
            return Err(TokenError::UnknownRole(claims.role.to_string()));
        }

        Ok(VerifiedToken {
            subject_id: claims.subject_id,
            expires_at: claims.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::minutes(15), Duration::days(30))
    }

    #[test]
    fn test_issue_and_parse() {
        let codec = codec();
        let now = Utc::now();

        for role in [Role::User, Role::Driver] {
            let pair = codec.issue_at(42, role, now).expect("Failed to issue tokens");

            let access = codec.parse(&pair.access_token).expect("Failed to parse access");
            assert_eq!(access.subject_id, 42);
            assert_eq!(access.role, role);
            assert_eq!(
                access.expires_at.timestamp(),
                (now + Duration::minutes(15)).timestamp()
            );

            let refresh = codec.parse(&pair.refresh_token).expect("Failed to parse refresh");
            assert_eq!(refresh.subject_id, 42);
            assert_eq!(refresh.role, role);
            assert_eq!(
                refresh.expires_at.timestamp(),
                (now + Duration::days(30)).timestamp()
            );
        }
    }

    #[test]
    fn test_pair_expiry_matches_claims() {
        let codec = codec();

        let pair = codec.issue(9, Role::User).unwrap();

        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(
            codec.parse(&pair.access_token).unwrap().expires_at,
            pair.access_expires_at
        );
        assert_eq!(
            codec.parse(&pair.refresh_token).unwrap().expires_at,
            pair.refresh_expires_at
        );
        assert_eq!(pair.access_expires_at.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_verify_returns_subject() {
        let codec = codec();
        let pair = codec.issue(u64::MAX, Role::User).unwrap();

        let verified = codec.verify(&pair.access_token).expect("Failed to verify");

        assert_eq!(verified.subject_id, u64::MAX);
        assert_eq!(verified.expires_at, pair.access_expires_at);
    }

    #[test]
    fn test_wrong_secret_is_signature_error() {
        let issuer = TokenCodec::new(
            b"secret1_at_least_32_bytes_long_key!",
            Duration::minutes(15),
            Duration::days(30),
        );
        let other = TokenCodec::new(
            b"secret2_at_least_32_bytes_long_key!",
            Duration::minutes(15),
            Duration::days(30),
        );

        let pair = issuer.issue(1, Role::User).unwrap();

        assert_eq!(other.parse(&pair.access_token), Err(TokenError::SignatureInvalid));
        assert_eq!(other.verify(&pair.refresh_token), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_expired_token() {
        let codec = codec();
        let issued_at = Utc::now() - Duration::hours(1);
        let pair = codec.issue_at(1, Role::User, issued_at).unwrap();

        assert_eq!(codec.verify(&pair.access_token), Err(TokenError::Expired));
        assert!(codec.verify(&pair.refresh_token).is_ok());
        // Parsing does not look at expiry.
        assert!(codec.parse(&pair.access_token).is_ok());
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec();
        let now = Utc::now();
        let pair = codec.issue_at(1, Role::User, now).unwrap();
        let exp = pair.access_expires_at;

        assert!(codec.verify_at(&pair.access_token, exp).is_ok());
        assert_eq!(
            codec.verify_at(&pair.access_token, exp + Duration::seconds(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_ttl_past_calendar_range_is_error() {
        let codec = TokenCodec::new(SECRET, Duration::minutes(15), Duration::days(100_000_000));

        assert!(matches!(
            codec.issue(1, Role::User),
            Err(TokenError::EncodingFailed(_))
        ));
    }

    #[test]
    fn test_verify_rejects_driver_role() {
        let codec = codec();
        let pair = codec.issue(3, Role::Driver).unwrap();

        assert_eq!(
            codec.verify(&pair.access_token),
            Err(TokenError::UnknownRole("driver".to_string()))
        );
    }

    #[test]
    fn test_malformed_token() {
        let codec = codec();

        assert!(matches!(codec.parse("invalid.token.here"), Err(TokenError::Malformed(_))));
        assert!(matches!(codec.parse(""), Err(TokenError::Malformed(_))));
        assert!(matches!(codec.verify("not-a-jwt"), Err(TokenError::Malformed(_))));
    }

    #[derive(Serialize)]
    struct ForeignClaims<T: Serialize> {
        user_id: T,
        #[serde(rename = "type")]
        role: &'static str,
        exp: i64,
    }

    fn sign_foreign<T: Serialize>(user_id: T, role: &'static str) -> String {
        let claims = ForeignClaims {
            user_id,
            role,
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    #[test]
    fn test_non_numeric_subject_is_malformed() {
        let codec = codec();

        for token in [
            sign_foreign("5", "user"),
            sign_foreign(1.5, "user"),
            sign_foreign(-1, "user"),
        ] {
            assert!(matches!(codec.parse(&token), Err(TokenError::Malformed(_))));
        }
    }

    #[test]
    fn test_unknown_embedded_role() {
        let codec = codec();

        assert_eq!(
            codec.parse(&sign_foreign(5, "admin")),
            Err(TokenError::UnknownRole("admin".to_string()))
        );
    }

    #[test]
    fn test_parses_tokens_issued_by_previous_service() {
        // Issued by the service this one replaces, with the same claim layout.
        let codec = TokenCodec::new(b"QWERTfg53gxb2", Duration::minutes(15), Duration::days(30));
        let token = concat!(
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.",
            "eyJleHAiOjE2Nzk0NzAxNTQsInR5cGUiOiJ1c2VyIiwidXNlcl9pZCI6MX0.",
            "r5vZu9eOds5kti9UjQFXx8AYLHZC23YLtVVnr8dgx24"
        );

        let claims = codec.parse(token).expect("Failed to parse token");
        assert_eq!(claims.subject_id, 1);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.expires_at.timestamp(), 1_679_470_154);

        assert_eq!(codec.verify(token), Err(TokenError::Expired));
        let before_expiry = DateTime::from_timestamp(1_679_470_000, 0).unwrap();
        assert_eq!(codec.verify_at(token, before_expiry).unwrap().subject_id, 1);
    }
}

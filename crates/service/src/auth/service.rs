use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument, warn};

use super::domain::{Account, AuthSession, AuthUser, Claims, LoginInput, Principal, Role};
use super::errors::AuthError;
use super::repository::{AccountRepository, InMemoryAccountRepository};

/// Token settings
#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

impl From<&configs::AuthConfig> for AuthSettings {
    fn from(cfg: &configs::AuthConfig) -> Self {
        Self { jwt_secret: cfg.jwt_secret.clone(), token_ttl_minutes: cfg.token_ttl_minutes }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AccountRepository> {
    repo: Arc<R>,
    settings: AuthSettings,
}

impl AuthService<InMemoryAccountRepository> {
    /// In-memory account store seeded with the configured accounts.
    pub async fn from_config(cfg: &configs::AuthConfig) -> Result<Self, AuthError> {
        let svc = AuthService::new(Arc::new(InMemoryAccountRepository::default()), AuthSettings::from(cfg));
        for seed in &cfg.accounts {
            let role: Role = seed.role.parse().map_err(AuthError::Repository)?;
            svc.seed_account(&seed.username, &seed.password, role).await?;
        }
        info!(accounts = cfg.accounts.len(), "accounts initialized");
        Ok(svc)
    }
}

impl<R: AccountRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, settings: AuthSettings) -> Self { Self { repo, settings } }

    /// Store an account with an argon2 hash of `password`.
    pub async fn seed_account(&self, username: &str, password: &str, role: Role) -> Result<(), AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .to_string();
        self.repo.upsert(Account { username: username.to_string(), password_hash: hash, role }).await?;
        debug!(username, %role, "account seeded");
        Ok(())
    }

    /// Verify credentials and issue an access token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthSettings, Role};
    /// use service::auth::domain::LoginInput;
    /// use service::auth::repository::InMemoryAccountRepository;
    /// use std::sync::Arc;
    /// let svc = AuthService::new(Arc::new(InMemoryAccountRepository::default()), AuthSettings { jwt_secret: "secret".into(), token_ttl_minutes: 60 });
    /// tokio_test::block_on(svc.seed_account("u@e.com", "Passw0rd", Role::User)).unwrap();
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert_eq!(session.user.role, Role::User);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let Some(account) = self.repo.find_by_username(&input.email).await? else {
            warn!("user not found");
            return Err(AuthError::Login);
        };

        let parsed = PasswordHash::new(&account.password_hash).map_err(|e| AuthError::Hash(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            warn!("invalid password");
            return Err(AuthError::Login);
        }

        let access_token = self.issue_token(&account)?;
        info!(role = %account.role, "login_succeeded");
        Ok(AuthSession { access_token, user: AuthUser { email: account.username, role: account.role } })
    }

    fn issue_token(&self, account: &Account) -> Result<String, AuthError> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::minutes(self.settings.token_ttl_minutes);
        let claims = Claims {
            sub: account.username.clone(),
            role: account.role,
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };
        encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.settings.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::Token(e.to_string()))
    }

    /// Decode and validate a token (signature and expiry).
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.settings.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            debug!(error = %e, "token rejected");
            AuthError::Authentication
        })?;
        Ok(Principal { username: data.claims.sub, role: data.claims.role })
    }

    /// Succeeds when the principal's role is one of `allowed`.
    pub fn authorize(&self, principal: &Principal, allowed: &[Role]) -> Result<(), AuthError> {
        if allowed.contains(&principal.role) {
            return Ok(());
        }
        warn!(username = %principal.username, role = %principal.role, "forbidden");
        Err(AuthError::Authorization)
    }
}

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::FromRow;
use sqlx::PgPool;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::PhoneNumber;
use crate::domain::user::models::UpdateProfileCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserName;
use crate::domain::user::models::UserStatus;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const USER_COLUMNS: &str = "id, name, phone_number, email, password, rating, status";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    phone_number: String,
    email: String,
    password: Vec<u8>,
    rating: f64,
    status: String,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = u64::try_from(row.id)
            .map_err(|_| UserError::Unknown(format!("negative user id in storage: {}", row.id)))?;

        Ok(User {
            id: UserId(id),
            name: UserName::new(row.name)?,
            phone_number: PhoneNumber::new(row.phone_number)?,
            email: EmailAddress::new(row.email)?,
            rating: row.rating,
            status: row.status.parse().map_err(UserError::Unknown)?,
            password_digest: row.password,
        })
    }
}

/// Run a query with the store timeout. A timeout is reported as a database error.
async fn bounded<T, F>(query: F) -> Result<T, UserError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    tokio::time::timeout(QUERY_TIMEOUT, query)
        .await
        .map_err(|_| UserError::DatabaseError("query timed out".to_string()))?
        .map_err(|e| UserError::DatabaseError(e.to_string()))
}

/// Ids above the storage range cannot exist.
fn storage_id(id: &UserId) -> Option<i64> {
    i64::try_from(id.value()).ok()
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let row: UserRow = bounded(
            sqlx::query_as(&format!(
                r#"
                INSERT INTO users (name, phone_number, email, password, rating, status)
                VALUES ($1, $2, $3, $4, 0.0, $5)
                RETURNING {USER_COLUMNS}
                "#
            ))
            .bind(user.name.as_str())
            .bind(user.phone_number.as_str())
            .bind(user.email.as_str())
            .bind(user.password_digest.as_slice())
            .bind(UserStatus::Created.as_str())
            .fetch_one(&self.pool),
        )
        .await?;

        row.try_into()
    }

    async fn exists_active(
        &self,
        phone_number: &PhoneNumber,
        email: &EmailAddress,
    ) -> Result<bool, UserError> {
        bounded(
            sqlx::query_scalar(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM users
                    WHERE (phone_number = $1 OR email = $2) AND status = $3
                )
                "#,
            )
            .bind(phone_number.as_str())
            .bind(email.as_str())
            .bind(UserStatus::Created.as_str())
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn find_active_by_phone_number(
        &self,
        phone_number: &PhoneNumber,
    ) -> Result<Option<User>, UserError> {
        let row: Option<UserRow> = bounded(
            sqlx::query_as(&format!(
                r#"
                SELECT {USER_COLUMNS}
                FROM users
                WHERE phone_number = $1 AND status = $2
                "#
            ))
            .bind(phone_number.as_str())
            .bind(UserStatus::Created.as_str())
            .fetch_optional(&self.pool),
        )
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_active_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let Some(id) = storage_id(id) else {
            return Ok(None);
        };

        let row: Option<UserRow> = bounded(
            sqlx::query_as(&format!(
                r#"
                SELECT {USER_COLUMNS}
                FROM users
                WHERE id = $1 AND status = $2
                "#
            ))
            .bind(id)
            .bind(UserStatus::Created.as_str())
            .fetch_optional(&self.pool),
        )
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn update(&self, id: &UserId, changes: UpdateProfileCommand) -> Result<User, UserError> {
        let id = storage_id(id).ok_or(UserError::DoesNotExist)?;

        let row: Option<UserRow> = bounded(
            sqlx::query_as(&format!(
                r#"
                UPDATE users
                SET name = COALESCE($1, name),
                    phone_number = COALESCE($2, phone_number),
                    email = COALESCE($3, email)
                WHERE id = $4 AND status = $5
                RETURNING {USER_COLUMNS}
                "#
            ))
            .bind(changes.name.as_ref().map(|name| name.as_str()))
            .bind(changes.phone_number.as_ref().map(|phone| phone.as_str()))
            .bind(changes.email.as_ref().map(|email| email.as_str()))
            .bind(id)
            .bind(UserStatus::Created.as_str())
            .fetch_optional(&self.pool),
        )
        .await?;

        row.ok_or(UserError::DoesNotExist)?.try_into()
    }

    async fn soft_delete(&self, id: &UserId) -> Result<(), UserError> {
        let id = storage_id(id).ok_or(UserError::DoesNotExist)?;

        let result = bounded(
            sqlx::query(
                r#"
                UPDATE users
                SET status = $1
                WHERE id = $2 AND status = $3
                "#,
            )
            .bind(UserStatus::Deleted.as_str())
            .bind(id)
            .bind(UserStatus::Created.as_str())
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::DoesNotExist);
        }

        Ok(())
    }
}

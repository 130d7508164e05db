//! User dimension, updated in place as account events arrive.

use time::OffsetDateTime;

/// A user profile row in `dim_users`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserDim {
    pub user_id: i64,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub region: Option<String>,
    pub enabled: bool,
    pub organization_name: Option<String>,
    pub phone_number: Option<String>,
    pub last_login_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Change-only profile fields carried by an UPDATED event.
///
/// `None` means "not in the payload"; the corresponding column keeps its
/// stored value (COALESCE on the SQL side).
#[derive(Debug, Clone, Default)]
pub struct UserProfilePatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub region: Option<String>,
    pub organization_name: Option<String>,
    pub phone_number: Option<String>,
}

impl UserDim {
    /// Full upsert on registration. Every mutable column takes the
    /// incoming value; `last_login_at` starts at the registration time.
    pub async fn upsert_registered_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: i64,
        patch: &UserProfilePatch,
        enabled: bool,
        at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO dim_users
                (user_id, username, email, role, region, enabled,
                 organization_name, phone_number, last_login_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                role = EXCLUDED.role,
                region = EXCLUDED.region,
                enabled = EXCLUDED.enabled,
                organization_name = EXCLUDED.organization_name,
                phone_number = EXCLUDED.phone_number,
                last_login_at = EXCLUDED.last_login_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(&patch.username)
        .bind(&patch.email)
        .bind(&patch.role)
        .bind(&patch.region)
        .bind(enabled)
        .bind(&patch.organization_name)
        .bind(&patch.phone_number)
        .bind(at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Partial update: absent fields keep their stored values, so a later
    /// event can never null out data it did not carry.
    pub async fn apply_patch_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: i64,
        patch: &UserProfilePatch,
        at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE dim_users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                region = COALESCE($5, region),
                organization_name = COALESCE($6, organization_name),
                phone_number = COALESCE($7, phone_number),
                updated_at = $8
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&patch.username)
        .bind(&patch.email)
        .bind(&patch.role)
        .bind(&patch.region)
        .bind(&patch.organization_name)
        .bind(&patch.phone_number)
        .bind(at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Record a login.
    pub async fn touch_login_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: i64,
        at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE dim_users SET last_login_at = $2, updated_at = $2
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Toggle the enabled flag. Deletion is a soft delete (`enabled = false`);
    /// the row itself stays for reporting history.
    pub async fn set_enabled_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: i64,
        enabled: bool,
        at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE dim_users SET enabled = $2, updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(enabled)
        .bind(at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Total user count, for the users gauge.
    pub async fn count(pool: &sqlx::PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT count(*) FROM dim_users")
            .fetch_one(pool)
            .await
    }
}

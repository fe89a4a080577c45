//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use veridoc_core::domain::{DocumentMetadata, RiskAnalysis, User, UserCredentials};
use veridoc_core::ports::{DatabaseService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Infrastructure(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct AuthSessionRecord {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct DocumentMetadataRecord {
    id: Uuid,
    user_id: Uuid,
    filename: String,
    document_type: String,
    mime_type: String,
    storage_url: String,
    uploaded_at: DateTime<Utc>,
    ai_summary: Option<String>,
    risk_analysis: Option<serde_json::Value>,
}
impl DocumentMetadataRecord {
    fn to_domain(self) -> DocumentMetadata {
        DocumentMetadata {
            id: self.id,
            user_id: self.user_id,
            filename: self.filename,
            document_type: self.document_type,
            mime_type: self.mime_type,
            storage_url: self.storage_url,
            uploaded_at: self.uploaded_at,
            ai_summary: self.ai_summary,
            // A malformed stored payload degrades to "no analysis" rather
            // than failing the whole read.
            risk_analysis: self
                .risk_analysis
                .and_then(|value| serde_json::from_value::<RiskAnalysis>(value).ok()),
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;

        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "SELECT user_id, expires_at FROM auth_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => unexpected(e),
        })?;

        if record.expires_at < Utc::now() {
            return Err(PortError::Unauthorized);
        }
        Ok(record.user_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_document_metadata(&self, metadata: &DocumentMetadata) -> PortResult<()> {
        let risk_json = metadata
            .risk_analysis
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| PortError::Infrastructure(e.to_string()))?;

        sqlx::query(
            "INSERT INTO documents \
             (id, user_id, filename, document_type, mime_type, storage_url, uploaded_at, \
              ai_summary, risk_analysis) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(metadata.id)
        .bind(metadata.user_id)
        .bind(&metadata.filename)
        .bind(&metadata.document_type)
        .bind(&metadata.mime_type)
        .bind(&metadata.storage_url)
        .bind(metadata.uploaded_at)
        .bind(&metadata.ai_summary)
        .bind(risk_json)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn update_document_analysis(
        &self,
        document_id: Uuid,
        ai_summary: &str,
        risk_analysis: &RiskAnalysis,
    ) -> PortResult<()> {
        let risk_json = serde_json::to_value(risk_analysis)
            .map_err(|e| PortError::Infrastructure(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE documents SET ai_summary = $1, risk_analysis = $2 WHERE id = $3",
        )
        .bind(ai_summary)
        .bind(risk_json)
        .bind(document_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Document {} not found",
                document_id
            )));
        }
        Ok(())
    }

    async fn get_document_metadata(&self, document_id: Uuid) -> PortResult<DocumentMetadata> {
        let record = sqlx::query_as::<_, DocumentMetadataRecord>(
            "SELECT id, user_id, filename, document_type, mime_type, storage_url, \
             uploaded_at, ai_summary, risk_analysis \
             FROM documents WHERE id = $1",
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Document {} not found", document_id))
            }
            _ => unexpected(e),
        })?;

        Ok(record.to_domain())
    }

    async fn list_documents_for_user(&self, user_id: Uuid) -> PortResult<Vec<DocumentMetadata>> {
        let records = sqlx::query_as::<_, DocumentMetadataRecord>(
            "SELECT id, user_id, filename, document_type, mime_type, storage_url, \
             uploaded_at, ai_summary, risk_analysis \
             FROM documents WHERE user_id = $1 ORDER BY uploaded_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

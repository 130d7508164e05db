//! Database access wrapper for the message-per-query processor pattern.

use sqlx::PgPool;

/// Pool-backed processor for the operator-surface queries.
///
/// Query messages (see the entity modules) implement
/// `kanau::processor::Processor` against this type, one message struct
/// per query, so the admin layer stays decoupled from the SQL.
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Subject identifier issued by the external identity provider.
pub type UserId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

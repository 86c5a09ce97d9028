use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use log::info;
use rand::Rng;

use super::accounts::Contact;
use crate::core::shared::models::PasswordCode;
use crate::core::shared::schema::password_codes;
use crate::security::Role;

pub const CODE_LENGTH: usize = 6;

pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:0width$}", width = CODE_LENGTH)
}

/// A code is accepted while it is younger than `ttl` and matches exactly.
pub fn is_code_valid(
    stored: &PasswordCode,
    submitted: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> bool {
    now - stored.created_at < ttl && stored.code == submitted.trim()
}

#[derive(Debug, thiserror::Error)]
#[error("code delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Delivers reset codes to users. E-mail for admins and organizations,
/// SMS for operators and owners.
#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send_code(&self, contact: &Contact, code: &str) -> Result<(), DeliveryError>;
}

/// Writes codes to the log instead of sending them.
pub struct LogCodeSender;

#[async_trait]
impl CodeSender for LogCodeSender {
    async fn send_code(&self, contact: &Contact, code: &str) -> Result<(), DeliveryError> {
        match contact {
            Contact::Email(email) => info!("Password reset code for {}: {}", email, code),
            Contact::Phone(phone) => info!("Password reset code for {} (sms): {}", phone, code),
        }
        Ok(())
    }
}

pub fn upsert_code(conn: &mut PgConnection, code: &PasswordCode) -> QueryResult<usize> {
    diesel::insert_into(password_codes::table)
        .values(code)
        .on_conflict((password_codes::role, password_codes::login))
        .do_update()
        .set((
            password_codes::code.eq(excluded(password_codes::code)),
            password_codes::created_at.eq(excluded(password_codes::created_at)),
        ))
        .execute(conn)
}

pub fn find_code(
    conn: &mut PgConnection,
    role: Role,
    login: &str,
) -> QueryResult<Option<PasswordCode>> {
    password_codes::table
        .find((role.as_str(), login))
        .first(conn)
        .optional()
}

pub fn remove_code(conn: &mut PgConnection, role: Role, login: &str) -> QueryResult<usize> {
    diesel::delete(password_codes::table.find((role.as_str(), login))).execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(code: &str, created_at: DateTime<Utc>) -> PasswordCode {
        PasswordCode {
            role: "owner".into(),
            login: "+79001234567".into(),
            code: code.into(),
            created_at,
        }
    }

    #[test]
    fn test_generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_fresh_code_is_valid() {
        let now = Utc::now();
        let code = stored("123456", now - Duration::minutes(5));
        assert!(is_code_valid(&code, "123456", now, Duration::minutes(60)));
        assert!(is_code_valid(&code, " 123456 ", now, Duration::minutes(60)));
    }

    #[test]
    fn test_expired_code_is_rejected() {
        let now = Utc::now();
        let code = stored("123456", now - Duration::minutes(61));
        assert!(!is_code_valid(&code, "123456", now, Duration::minutes(60)));
    }

    #[test]
    fn test_wrong_code_is_rejected() {
        let now = Utc::now();
        let code = stored("123456", now);
        assert!(!is_code_valid(&code, "654321", now, Duration::minutes(60)));
    }

    #[tokio::test]
    async fn test_log_sender_accepts_everything() {
        let sender = LogCodeSender;
        assert!(sender
            .send_code(&Contact::Email("org@desk.local".into()), "000001")
            .await
            .is_ok());
    }
}

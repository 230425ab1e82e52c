//! Bulk creation of confirmed demo accounts for development databases.

use chrono::{DateTime, Duration, Utc};
use fake::Fake;
use fake::faker::address::en::CityName;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::Paragraph;
use fake::faker::name::en::Name;
use tracing::{debug, info};

use flasky_core::error::{AppError, ErrorKind};

use super::forms::NewAccount;
use super::service::IdentityService;

/// Password given to every seeded account.
pub const SEED_PASSWORD: &str = "password";

/// A confirmed account with random profile data, registered up to a year
/// before `now`.
pub fn fake_account(now: DateTime<Utc>) -> NewAccount {
    let days_ago: i64 = (0..365).fake();
    let mut account = NewAccount::new(
        SafeEmail().fake::<String>(),
        Username().fake::<String>(),
        SEED_PASSWORD,
    );
    account.confirmed = true;
    account.name = Some(Name().fake());
    account.location = Some(CityName().fake());
    account.about_me = Some(Paragraph(1..3).fake());
    account.member_since = Some(now - Duration::days(days_ago));
    account
}

impl IdentityService {
    /// Creates `count` confirmed accounts with random profiles.
    ///
    /// See [`Self::seed_users`].
    pub async fn seed_fake_users(&self, count: u64) -> Result<u64, AppError> {
        let now = self.clock.now();
        self.seed_users(count, || fake_account(now)).await
    }

    /// Creates `count` accounts drawn from `next`.
    ///
    /// Candidates whose email or username is taken are discarded and
    /// another is drawn. Every account goes through [`Self::create`], so each
    /// follows itself. Gives up after `10 * count + 100` draws.
    pub async fn seed_users<F>(&self, count: u64, mut next: F) -> Result<u64, AppError>
    where
        F: FnMut() -> NewAccount,
    {
        let max_attempts = count.saturating_mul(10).saturating_add(100);
        let mut created = 0;
        let mut attempts = 0;

        while created < count {
            if attempts == max_attempts {
                return Err(AppError::internal(format!(
                    "Seeded only {created} of {count} users after {attempts} attempts"
                )));
            }
            attempts += 1;

            match self.create(next()).await {
                Ok(_) => created += 1,
                Err(e) if e.is(ErrorKind::DuplicateEmail) || e.is(ErrorKind::DuplicateUsername) => {
                    debug!(reason = %e.message, "Discarded seed candidate");
                }
                Err(e) => return Err(e),
            }
        }

        info!(created, attempts, "Seeded users");
        Ok(created)
    }
}

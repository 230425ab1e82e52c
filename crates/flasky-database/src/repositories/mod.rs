//! PostgreSQL repository implementations of the store contracts.

pub mod follow;
pub mod post;
pub mod role;
pub mod user;

pub use follow::PgFollowRepository;
pub use post::PgPostRepository;
pub use role::PgRoleRepository;
pub use user::PgUserRepository;

use flasky_core::types::PageRequest;

/// `LIMIT` and `OFFSET` as Postgres `BIGINT`s, saturating at `i64::MAX`.
pub(crate) fn sql_window(page: &PageRequest) -> (i64, i64) {
    let limit = i64::try_from(page.limit()).unwrap_or(i64::MAX);
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

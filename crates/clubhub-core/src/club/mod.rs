//! Club directory port: the domain actions behind club tools and the wizard.

use clubhub_types::club::{Club, ClubQuery, NewClub};
use clubhub_types::error::ClubError;

/// Storage and lookup of clubs.
///
/// Implementations live in clubhub-infra (e.g., `SqliteClubDirectory`).
pub trait ClubDirectory: Send + Sync {
    /// Persist a new club. Fails with `DuplicateName` when a club with the
    /// same name (case-insensitive) exists.
    fn create_club(
        &self,
        club: &NewClub,
    ) -> impl std::future::Future<Output = Result<Club, ClubError>> + Send;

    /// Clubs matching every non-empty filter field, newest first.
    fn search_clubs(
        &self,
        query: &ClubQuery,
    ) -> impl std::future::Future<Output = Result<Vec<Club>, ClubError>> + Send;

    /// Clubs created by `owner_id`, newest first.
    fn clubs_owned_by(
        &self,
        owner_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Club>, ClubError>> + Send;
}

//! Club-creation wizard: a deterministic slot-filling state machine.
//!
//! Stages run `start -> name -> description -> category -> city -> confirm`
//! and end in `committed` or `cancelled`. Every stage except the terminal
//! ones answers without the language model.

pub mod machine;
pub mod validate;

use tracing::{info, warn};

use clubhub_types::club::NewClub;
use clubhub_types::error::ClubError;
use clubhub_types::wizard::{ClubField, WizardStage, WizardState};

use crate::club::ClubDirectory;

use machine::{Step, prompts};

/// Direct answer produced by the wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardReply {
    pub text: String,
    /// The wizard reached a terminal stage; the agent should be released.
    pub task_completed: bool,
}

impl WizardReply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            task_completed: false,
        }
    }
}

/// Outcome of offering a message to the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardTurn {
    Handled(WizardReply),
    /// The wizard is idle or finished; the model should answer.
    PassThrough,
}

/// Feed one user message to the wizard, committing the club when the user
/// confirms.
///
/// Must run under the session's lock: the commit relies on the stage read
/// here still being current.
pub async fn handle_turn<D: ClubDirectory>(
    state: &mut WizardState,
    message: &str,
    directory: &D,
    owner_id: &str,
) -> WizardTurn {
    match machine::advance(state, message) {
        Step::Reply(text) => WizardTurn::Handled(WizardReply::text(text)),
        Step::Commit => WizardTurn::Handled(commit(state, directory, owner_id).await),
        Step::PassThrough => WizardTurn::PassThrough,
    }
}

/// Create the club from the collected fields.
///
/// Does nothing unless the wizard is at `confirm`, so a repeated "yes" after
/// a successful commit never creates a second club. On failure the wizard
/// stays at `confirm` with `last_error` set.
pub async fn commit<D: ClubDirectory>(
    state: &mut WizardState,
    directory: &D,
    owner_id: &str,
) -> WizardReply {
    if state.stage != WizardStage::Confirm {
        warn!(session_id = %state.session_id, stage = %state.stage, "Commit outside confirm ignored");
        return WizardReply::text(prompts::already_done(state.stage));
    }

    let new_club = match draft_to_new_club(state, owner_id) {
        Ok(club) => club,
        Err(missing) => {
            // Collected data is incomplete; go back and ask for the field.
            state.stage = missing.stage();
            state.correcting = true;
            return WizardReply::text(prompts::ask(state.stage));
        }
    };

    match directory.create_club(&new_club).await {
        Ok(club) => {
            info!(session_id = %state.session_id, club_id = %club.id, "Club created by wizard");
            state.stage = WizardStage::Committed;
            state.last_error = None;
            WizardReply {
                text: prompts::created(&club),
                task_completed: true,
            }
        }
        Err(err) => {
            warn!(session_id = %state.session_id, error = %err, "Club creation failed");
            let message = commit_error_message(&err);
            state.last_error = Some(message.clone());
            WizardReply::text(prompts::commit_failed(&message))
        }
    }
}

/// Mark the wizard as abandoned when its agent is reset. Terminal stages
/// are left untouched.
pub fn cancel(state: &mut WizardState) -> bool {
    if state.stage.is_terminal() {
        return false;
    }
    state.stage = WizardStage::Cancelled;
    state.correcting = false;
    state.updated_at = chrono::Utc::now();
    true
}

fn draft_to_new_club(state: &WizardState, owner_id: &str) -> Result<NewClub, ClubField> {
    let fields = &state.fields;
    Ok(NewClub {
        name: fields.name.clone().ok_or(ClubField::Name)?,
        description: fields.description.clone().ok_or(ClubField::Description)?,
        category: fields.category.clone().ok_or(ClubField::Category)?,
        city: fields.city.clone(),
        owner_id: owner_id.to_string(),
    })
}

fn commit_error_message(err: &ClubError) -> String {
    match err {
        ClubError::Storage(_) => "the club service is temporarily unavailable".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryClubDirectory;
    use clubhub_types::wizard::ClubDraft;
    use uuid::Uuid;

    fn confirm_state() -> WizardState {
        let mut state = WizardState::new(Uuid::now_v7());
        state.stage = WizardStage::Confirm;
        state.fields = ClubDraft {
            name: Some("Chess Club".into()),
            description: Some("D".repeat(210)),
            category: Some("Sports".into()),
            city: Some("Almaty".into()),
        };
        state
    }

    #[tokio::test]
    async fn test_full_flow_commits_once() {
        let directory = InMemoryClubDirectory::default();
        let mut state = WizardState::new(Uuid::now_v7());
        let description = "A".repeat(210);

        for (message, stage) in [
            ("I want to create a club", WizardStage::Name),
            ("Chess Club", WizardStage::Description),
            (description.as_str(), WizardStage::Category),
            ("Sports", WizardStage::City),
            ("Almaty", WizardStage::Confirm),
        ] {
            let turn = handle_turn(&mut state, message, &directory, "user-1").await;
            assert!(matches!(turn, WizardTurn::Handled(_)));
            assert_eq!(state.stage, stage);
        }

        let WizardTurn::Handled(reply) = handle_turn(&mut state, "yes", &directory, "user-1").await
        else {
            panic!("confirm must be handled");
        };
        assert_eq!(state.stage, WizardStage::Committed);
        assert!(reply.task_completed);
        let club = &directory.clubs()[0];
        assert!(reply.text.contains("created successfully"));
        assert!(reply.text.contains(&club.id.to_string()));
        assert_eq!(directory.create_calls(), 1);

        // A second "yes" finds the wizard finished.
        let again = handle_turn(&mut state, "yes", &directory, "user-1").await;
        assert_eq!(again, WizardTurn::PassThrough);
        assert_eq!(directory.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_commit_guard_outside_confirm() {
        let directory = InMemoryClubDirectory::default();
        let mut state = confirm_state();
        state.stage = WizardStage::Committed;

        let reply = commit(&mut state, &directory, "user-1").await;
        assert_eq!(reply.text, "This club has already been created.");
        assert!(!reply.task_completed);
        assert_eq!(directory.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_domain_failure_stays_at_confirm() {
        let directory = InMemoryClubDirectory::default();
        directory.fail_next(ClubError::DuplicateName("Chess Club".into()));
        let mut state = confirm_state();

        let reply = commit(&mut state, &directory, "user-1").await;
        assert_eq!(state.stage, WizardStage::Confirm);
        assert!(!reply.task_completed);
        assert!(reply.text.contains("already exists"));
        assert_eq!(
            state.last_error.as_deref(),
            Some("a club named 'Chess Club' already exists")
        );

        // Correct the name and retry.
        handle_turn(&mut state, "change the name", &directory, "user-1").await;
        handle_turn(&mut state, "Chess Club Almaty", &directory, "user-1").await;
        assert_eq!(state.stage, WizardStage::Confirm);
        let reply = commit(&mut state, &directory, "user-1").await;
        assert!(reply.task_completed);
        assert!(state.last_error.is_none());
        assert_eq!(directory.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_storage_failure_message_is_generic() {
        let directory = InMemoryClubDirectory::default();
        directory.fail_next(ClubError::Storage("disk I/O error".into()));
        let mut state = confirm_state();

        let reply = commit(&mut state, &directory, "user-1").await;
        assert!(reply.text.contains("temporarily unavailable"));
        assert!(!reply.text.contains("disk"));
    }

    #[tokio::test]
    async fn test_missing_field_sends_user_back() {
        let directory = InMemoryClubDirectory::default();
        let mut state = confirm_state();
        state.fields.category = None;

        let reply = commit(&mut state, &directory, "user-1").await;
        assert_eq!(state.stage, WizardStage::Category);
        assert!(reply.text.contains("Step 3"));
        assert_eq!(directory.create_calls(), 0);
    }

    #[test]
    fn test_cancel() {
        let mut state = confirm_state();
        assert!(cancel(&mut state));
        assert_eq!(state.stage, WizardStage::Cancelled);
        assert!(!cancel(&mut state));
    }
}

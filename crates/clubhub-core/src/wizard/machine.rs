//! Pure stage transitions of the club-creation wizard.
//!
//! `advance` never performs side effects; a "yes" at `confirm` is returned as
//! `Step::Commit` and the caller runs the commit under the session lock.

use chrono::Utc;

use clubhub_types::wizard::{ClubDraft, ClubField, WizardStage, WizardState};

use super::validate::{self, ValidationError};

/// What the wizard wants done with the current message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Answer directly, without the model.
    Reply(String),
    /// The user confirmed at `confirm`: create the club.
    Commit,
    /// Not a wizard turn; let the model answer.
    PassThrough,
}

const INTENT_PHRASES: &[&str] = &[
    "create a club",
    "create club",
    "create a new club",
    "create my own club",
    "new club",
    "start a club",
    "open a club",
    "create a community",
    "создать клуб",
    "создай клуб",
    "создать сообщество",
    "хочу создать",
    "открыть клуб",
];

const YES_WORDS: &[&str] = &[
    "yes", "y", "yep", "yeah", "confirm", "ok", "okay", "create", "да", "ок", "создать",
    "подтверждаю",
];

const NO_WORDS: &[&str] = &[
    "no", "n", "nope", "change", "fix", "edit", "нет", "не", "исправить", "поменять",
];

const CORRECTIONS: &[(ClubField, &[&str])] = &[
    (ClubField::Name, &["name", "title", "название", "имя"]),
    (ClubField::Description, &["description", "описание"]),
    (ClubField::Category, &["category", "категор"]),
    (ClubField::City, &["city", "location", "город"]),
];

/// How a reply at `confirm` is understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    Correct(ClubField),
    No,
    Unclear,
}

/// Whether the message asks to create a club.
pub fn detect_intent(message: &str) -> bool {
    let lowered = message.to_lowercase();
    INTENT_PHRASES.iter().any(|p| lowered.contains(p))
}

pub fn classify_confirmation(message: &str) -> Confirmation {
    let lowered = message.to_lowercase();
    let bare = lowered.trim().trim_end_matches(['!', '.', ',', '?', ')']).trim();

    if YES_WORDS.contains(&bare) {
        return Confirmation::Yes;
    }
    for (field, words) in CORRECTIONS {
        if words.iter().any(|w| lowered.contains(w)) {
            return Confirmation::Correct(*field);
        }
    }
    if NO_WORDS.contains(&bare) {
        return Confirmation::No;
    }
    Confirmation::Unclear
}

/// Move `state` forward by one user message.
pub fn advance(state: &mut WizardState, message: &str) -> Step {
    let step = match state.stage {
        WizardStage::Start => start(state, message),
        WizardStage::Committed | WizardStage::Cancelled => restart(state, message),
        WizardStage::Name => fill(state, message, WizardStage::Name),
        WizardStage::Description => fill(state, message, WizardStage::Description),
        WizardStage::Category => fill(state, message, WizardStage::Category),
        WizardStage::City => fill(state, message, WizardStage::City),
        WizardStage::Confirm => confirm(state, message),
    };
    state.updated_at = Utc::now();
    step
}

fn start(state: &mut WizardState, message: &str) -> Step {
    if !detect_intent(message) {
        return Step::PassThrough;
    }
    state.stage = WizardStage::Name;
    Step::Reply(prompts::welcome())
}

/// A finished wizard only wakes up again for a new creation request.
fn restart(state: &mut WizardState, message: &str) -> Step {
    if !detect_intent(message) {
        return Step::PassThrough;
    }
    state.fields = ClubDraft::default();
    state.last_error = None;
    state.correcting = false;
    state.stage = WizardStage::Name;
    Step::Reply(prompts::welcome())
}

fn fill(state: &mut WizardState, message: &str, stage: WizardStage) -> Step {
    let accepted: Result<(), ValidationError> = match stage {
        WizardStage::Name => validate::validate_name(message).map(|v| state.fields.name = Some(v)),
        WizardStage::Description => {
            validate::validate_description(message).map(|v| state.fields.description = Some(v))
        }
        WizardStage::Category => {
            validate::validate_category(message).map(|v| state.fields.category = Some(v))
        }
        WizardStage::City => {
            state.fields.city = validate::parse_city(message);
            Ok(())
        }
        _ => return Step::PassThrough,
    };

    if let Err(err) = accepted {
        return Step::Reply(prompts::invalid(&err, stage));
    }

    let next = if state.correcting {
        WizardStage::Confirm
    } else {
        next_stage(stage)
    };
    state.stage = next;
    if next == WizardStage::Confirm {
        state.correcting = false;
        Step::Reply(prompts::summary(&state.fields))
    } else {
        Step::Reply(prompts::ask(next))
    }
}

fn next_stage(stage: WizardStage) -> WizardStage {
    match stage {
        WizardStage::Start => WizardStage::Name,
        WizardStage::Name => WizardStage::Description,
        WizardStage::Description => WizardStage::Category,
        WizardStage::Category => WizardStage::City,
        WizardStage::City | WizardStage::Confirm => WizardStage::Confirm,
        terminal => terminal,
    }
}

fn confirm(state: &mut WizardState, message: &str) -> Step {
    match classify_confirmation(message) {
        Confirmation::Yes => Step::Commit,
        Confirmation::Correct(field) => {
            state.stage = field.stage();
            state.correcting = true;
            Step::Reply(prompts::correction(field))
        }
        Confirmation::No => Step::Reply(prompts::which_field().to_string()),
        Confirmation::Unclear => Step::Reply(prompts::clarify().to_string()),
    }
}

pub(crate) mod prompts {
    use clubhub_types::club::Club;
    use clubhub_types::wizard::{ClubDraft, ClubField, WizardStage};

    use crate::wizard::validate::ValidationError;

    const SUMMARY_DESCRIPTION_CHARS: usize = 200;

    pub fn welcome() -> String {
        format!("Great, let's create a club! 🎉\n\n{}", ask(WizardStage::Name))
    }

    pub fn ask(stage: WizardStage) -> String {
        match stage {
            WizardStage::Name => {
                "Step 1 of 4: what should the club be called? (at least 3 characters)".to_string()
            }
            WizardStage::Description => "Step 2 of 4: describe the club: what members do, who it \
                is for and how often you meet. (at least 200 characters)"
                .to_string(),
            WizardStage::Category => "Step 3 of 4: pick a category: Sports / Hobby / IT / \
                Profession / Creativity / Education / Business"
                .to_string(),
            WizardStage::City => {
                "Step 4 of 4: which city is the club in? (reply 'skip' for no city)".to_string()
            }
            _ => clarify().to_string(),
        }
    }

    pub fn invalid(err: &ValidationError, stage: WizardStage) -> String {
        format!("Hmm, {err}. {}", ask(stage))
    }

    pub fn summary(fields: &ClubDraft) -> String {
        let description = fields
            .description
            .as_deref()
            .map(|d| {
                if d.chars().count() > SUMMARY_DESCRIPTION_CHARS {
                    let head: String = d.chars().take(SUMMARY_DESCRIPTION_CHARS).collect();
                    format!("{head}...")
                } else {
                    d.to_string()
                }
            })
            .unwrap_or_else(|| "—".to_string());

        format!(
            "Please check the details:\n\n\
             Name: {}\nCategory: {}\nCity: {}\nDescription: {}\n\n\
             Is everything correct? Reply 'yes' to create the club or name the field to change \
             (name, description, category, city).",
            fields.name.as_deref().unwrap_or("—"),
            fields.category.as_deref().unwrap_or("—"),
            fields.city.as_deref().unwrap_or("—"),
            description,
        )
    }

    pub fn correction(field: ClubField) -> String {
        match field {
            ClubField::Name => "Let's change the name. Enter the new club name (at least 3 characters).".to_string(),
            ClubField::Description => "OK, let's update the description. Write the full description (at least 200 characters).".to_string(),
            ClubField::Category => format!("Choose the new category. {}", ask(WizardStage::Category)),
            ClubField::City => "Enter the new city (or reply 'skip' for no city).".to_string(),
        }
    }

    pub fn which_field() -> &'static str {
        "What should we change: the name, description, category or city?"
    }

    pub fn clarify() -> &'static str {
        "I didn't quite get that. Reply 'yes' to create the club, or tell me what to change: \
         the name, description, category or city?"
    }

    pub fn created(club: &Club) -> String {
        format!(
            "Club \"{}\" created successfully! 🎉\nClub ID: {}\nLink: {}",
            club.name,
            club.id,
            club.link()
        )
    }

    pub fn commit_failed(error: &str) -> String {
        format!(
            "Could not create the club: {error}. Reply 'yes' to try again or name the field \
             to change (name, description, category, city)."
        )
    }

    pub fn already_done(stage: WizardStage) -> String {
        match stage {
            WizardStage::Committed => "This club has already been created.".to_string(),
            _ => "There is nothing to confirm yet.".to_string(),
        }
    }
}

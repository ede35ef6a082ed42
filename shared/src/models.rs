use serde::{Serialize, Deserialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: Uuid,
    pub question: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub text: String,
    pub votes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_id: Uuid,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub id: Uuid,
    pub text: String,
    pub votes: i64,
}

/// A poll as handed to callers: its options with their counts and the summed total.
/// Built fresh on every read, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollView {
    pub id: Uuid,
    pub question: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: OffsetDateTime,
    pub options: Vec<OptionView>,
    pub total_votes: i64,
}

impl PollView {
    pub fn assemble(poll: Poll, options: Option<Vec<OptionView>>) -> Self {
        let options = options.unwrap_or_default();
        let total_votes = options.iter().map(|o| o.votes).sum();
        Self {
            id: poll.id,
            question: poll.question,
            description: poll.description,
            owner_id: poll.owner_id,
            created_at: poll.created_at,
            options,
            total_votes,
        }
    }

    pub fn option(&self, id: Uuid) -> Option<&OptionView> {
        self.options.iter().find(|o| o.id == id)
    }
}

impl From<PollOption> for OptionView {
    fn from(option: PollOption) -> Self {
        Self {
            id: option.id,
            text: option.text,
            votes: option.votes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest {
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollRequest {
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
    pub options: Vec<OptionInput>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVoteRequest {
    #[serde(default)]
    pub poll_id: Option<Uuid>,
    #[serde(default)]
    pub option_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_id: Option<Uuid>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self { success: true, poll_id: None }
    }

    pub fn created(poll_id: Uuid) -> Self {
        Self { success: true, poll_id: Some(poll_id) }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentVote {
    pub poll_id: Uuid,
    pub option_id: Option<Uuid>,
}

/// Trims a free-form description, collapsing blank input to `None`.
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

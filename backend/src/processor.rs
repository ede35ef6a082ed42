use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use poll_shared::models::*;
use poll_shared::validation::{validate_create_poll, validate_update_poll};
use crate::auth::require_caller;
use crate::error::ActionError;
use crate::store::{NewPoll, PollStore};
use crate::views::{ViewCache, MUTATED_VIEWS};

/// Poll and vote operations. Each call is an independent unit of work taking
/// the caller explicitly; consistency beyond the ordering here is left to the store.
pub struct PollProcessor<'a> {
    store: &'a dyn PollStore,
    views: &'a ViewCache,
}

impl<'a> PollProcessor<'a> {
    pub fn new(store: &'a dyn PollStore, views: &'a ViewCache) -> Self {
        Self { store, views }
    }

    #[instrument(skip(self, request), fields(options = request.options.len()))]
    pub async fn create_poll(&self, caller: Option<Uuid>, request: &CreatePollRequest) -> Result<Uuid, ActionError> {
        let owner_id = require_caller(caller)?;
        validate_create_poll(request)?;

        let poll = self.store
            .insert_poll(&NewPoll {
                question: request.question.clone(),
                description: normalize_description(request.description.as_deref()),
                owner_id,
            })
            .await
            .map_err(ActionError::storage("Failed to create poll"))?;

        if let Err(e) = self.store.insert_options(poll.id, &request.options).await {
            error!("Failed to insert options for poll {}: {}", poll.id, e);
            if let Err(cleanup) = self.store.delete_poll(poll.id).await {
                warn!("Failed to remove orphaned poll {}: {}", poll.id, cleanup);
            }
            return Err(ActionError::Storage { context: "Failed to create poll options", source: e });
        }

        self.views.invalidate(&MUTATED_VIEWS);
        info!("Created poll {} for user {}", poll.id, owner_id);
        Ok(poll.id)
    }

    pub async fn list_polls(&self) -> Result<Vec<PollView>, ActionError> {
        self.store
            .list_polls(None)
            .await
            .map_err(ActionError::storage("Failed to fetch polls"))
    }

    pub async fn user_polls(&self, caller: Option<Uuid>) -> Result<Vec<PollView>, ActionError> {
        let Some(owner_id) = caller else {
            debug!("Anonymous dashboard request; returning no polls");
            return Ok(Vec::new());
        };

        self.store
            .list_polls(Some(owner_id))
            .await
            .map_err(ActionError::storage("Failed to fetch polls"))
    }

    pub async fn get_poll(&self, poll_id: Uuid) -> Result<PollView, ActionError> {
        self.store
            .get_poll(poll_id)
            .await
            .map_err(ActionError::storage("Failed to fetch poll"))?
            .ok_or(ActionError::PollNotFound)
    }

    /// The option the caller currently has selected in a poll, if any.
    pub async fn current_vote(&self, caller: Option<Uuid>, poll_id: Uuid) -> Result<Option<Uuid>, ActionError> {
        let Some(user_id) = caller else { return Ok(None) };

        let vote = self.store
            .find_vote(poll_id, user_id)
            .await
            .map_err(ActionError::storage("Failed to fetch vote"))?;
        Ok(vote.map(|v| v.option_id))
    }

    async fn owned_poll(&self, poll_id: Uuid, caller: Uuid) -> Result<(), ActionError> {
        let owner = self.store
            .poll_owner(poll_id)
            .await
            .map_err(ActionError::storage("Failed to fetch poll"))?
            .ok_or(ActionError::PollNotFound)?;

        if owner != caller {
            warn!("User {} attempted to modify poll {} owned by {}", caller, poll_id, owner);
            return Err(ActionError::NotAuthorized);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_poll(&self, caller: Option<Uuid>, poll_id: Uuid) -> Result<(), ActionError> {
        let user_id = require_caller(caller)?;
        self.owned_poll(poll_id, user_id).await?;

        self.store
            .delete_options(poll_id)
            .await
            .map_err(ActionError::storage("Failed to delete poll options"))?;

        self.store
            .delete_poll(poll_id)
            .await
            .map_err(ActionError::storage("Failed to delete poll"))?;

        self.views.invalidate(&MUTATED_VIEWS);
        info!("Deleted poll {}", poll_id);
        Ok(())
    }

    /// Applies question, description and option edits. Submitted options with a
    /// known id are renamed, the rest are appended; stored options missing from
    /// the request are left alone.
    #[instrument(skip(self, request), fields(options = request.options.len()))]
    pub async fn update_poll(&self, caller: Option<Uuid>, poll_id: Uuid, request: &UpdatePollRequest) -> Result<(), ActionError> {
        let user_id = require_caller(caller)?;
        validate_update_poll(request)?;
        self.owned_poll(poll_id, user_id).await?;

        let existing: HashSet<Uuid> = self.store
            .option_ids(poll_id)
            .await
            .map_err(ActionError::storage("Failed to fetch poll options"))?
            .into_iter()
            .collect();

        let description = normalize_description(request.description.as_deref());
        self.store
            .update_poll(poll_id, &request.question, description.as_deref())
            .await
            .map_err(ActionError::storage("Failed to update poll"))?;

        for option in &request.options {
            match option.id.filter(|id| existing.contains(id)) {
                Some(option_id) => self.store
                    .update_option_text(option_id, &option.text)
                    .await
                    .map_err(ActionError::storage("Failed to update option"))?,
                None => {
                    self.store
                        .insert_options(poll_id, std::slice::from_ref(&option.text))
                        .await
                        .map_err(ActionError::storage("Failed to add option"))?;
                }
            }
        }

        self.views.invalidate(&MUTATED_VIEWS);
        info!("Updated poll {}", poll_id);
        Ok(())
    }

    /// Points the caller's single vote in a poll at `option_id`, replacing any
    /// earlier choice.
    #[instrument(skip(self, request))]
    pub async fn submit_vote(&self, caller: Option<Uuid>, request: &SubmitVoteRequest) -> Result<(), ActionError> {
        let user_id = require_caller(caller)?;
        let (Some(poll_id), Some(option_id)) = (request.poll_id, request.option_id) else {
            return Err(ActionError::MissingParameter);
        };

        let option = self.store
            .find_option(option_id)
            .await
            .map_err(ActionError::storage("Failed to fetch option"))?
            .ok_or(ActionError::OptionNotFound)?;

        if option.poll_id != poll_id {
            warn!("Option {} belongs to poll {}, not {}", option_id, option.poll_id, poll_id);
            return Err(ActionError::OptionPollMismatch);
        }

        self.store
            .upsert_vote(poll_id, option_id, user_id)
            .await
            .map_err(ActionError::storage("Failed to submit vote"))?;

        self.views.invalidate(&MUTATED_VIEWS);
        debug!("Recorded vote by {} for option {} in poll {}", user_id, option_id, poll_id);
        Ok(())
    }
}

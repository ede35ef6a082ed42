use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use uuid::Uuid;
use poll_shared::models::*;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Store lock poisoned")]
    LockFailed,
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct NewPoll {
    pub question: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

/// Table-scoped reads and writes against the relational store backing polls.
///
/// Implementations own vote counting: `PollOption::votes` must reflect the
/// vote rows referencing that option whenever it is read.
#[rocket::async_trait]
pub trait PollStore: Send + Sync {
    async fn insert_poll(&self, poll: &NewPoll) -> Result<Poll, StoreError>;
    async fn delete_poll(&self, poll_id: Uuid) -> Result<(), StoreError>;
    async fn update_poll(&self, poll_id: Uuid, question: &str, description: Option<&str>) -> Result<(), StoreError>;
    async fn poll_owner(&self, poll_id: Uuid) -> Result<Option<Uuid>, StoreError>;

    async fn insert_options(&self, poll_id: Uuid, texts: &[String]) -> Result<Vec<PollOption>, StoreError>;
    async fn delete_options(&self, poll_id: Uuid) -> Result<(), StoreError>;
    async fn option_ids(&self, poll_id: Uuid) -> Result<Vec<Uuid>, StoreError>;
    async fn update_option_text(&self, option_id: Uuid, text: &str) -> Result<(), StoreError>;
    async fn find_option(&self, option_id: Uuid) -> Result<Option<PollOption>, StoreError>;

    /// Records the caller's single vote for a poll, replacing any earlier choice atomically.
    async fn upsert_vote(&self, poll_id: Uuid, option_id: Uuid, user_id: Uuid) -> Result<Vote, StoreError>;
    async fn find_vote(&self, poll_id: Uuid, user_id: Uuid) -> Result<Option<Vote>, StoreError>;

    /// Polls joined with their options, newest first, optionally restricted to one owner.
    async fn list_polls(&self, owner_id: Option<Uuid>) -> Result<Vec<PollView>, StoreError>;
    async fn get_poll(&self, poll_id: Uuid) -> Result<Option<PollView>, StoreError>;
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    InsertPoll,
    DeletePoll,
    UpdatePoll,
    InsertOptions,
    DeleteOptions,
    UpdateOption,
    UpsertVote,
    ListPolls,
}

#[derive(Debug)]
struct StoredPoll {
    poll: Poll,
    seq: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    polls: HashMap<Uuid, StoredPoll>,
    options: Vec<PollOption>,
    votes: HashMap<(Uuid, Uuid), Vote>,
    next_seq: u64,
}

impl MemoryState {
    fn vote_count(&self, option_id: Uuid) -> i64 {
        self.votes.values().filter(|v| v.option_id == option_id).count() as i64
    }

    fn counted(&self, option: &PollOption) -> PollOption {
        PollOption { votes: self.vote_count(option.id), ..option.clone() }
    }

    fn view(&self, stored: &StoredPoll) -> PollView {
        let options = self.options.iter()
            .filter(|o| o.poll_id == stored.poll.id)
            .map(|o| OptionView::from(self.counted(o)))
            .collect();
        PollView::assemble(stored.poll.clone(), Some(options))
    }
}

/// In-process store with the same cascade and uniqueness rules as the SQL schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    #[cfg(test)]
    failures: Mutex<HashSet<FailPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::LockFailed)
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Makes every subsequent call through `point` fail until cleared.
    pub fn fail_on(&self, point: FailPoint) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(point);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.clear();
        }
    }

    pub fn poll_count(&self) -> usize {
        self.state.lock().map(|s| s.polls.len()).unwrap_or(0)
    }

    pub fn option_count(&self) -> usize {
        self.state.lock().map(|s| s.options.len()).unwrap_or(0)
    }

    pub fn votes_for(&self, poll_id: Uuid) -> Vec<Vote> {
        self.state.lock()
            .map(|s| s.votes.values().filter(|v| v.poll_id == poll_id).cloned().collect())
            .unwrap_or_default()
    }

    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        let failures = self.failures.lock().map_err(|_| StoreError::LockFailed)?;
        if failures.contains(&point) {
            return Err(StoreError::Unavailable(format!("{point:?} failed")));
        }
        Ok(())
    }
}

#[rocket::async_trait]
impl PollStore for MemoryStore {
    async fn insert_poll(&self, poll: &NewPoll) -> Result<Poll, StoreError> {
        #[cfg(test)]
        self.check(FailPoint::InsertPoll)?;
        let mut state = self.state()?;
        let created = Poll {
            id: Uuid::new_v4(),
            question: poll.question.clone(),
            description: poll.description.clone(),
            owner_id: poll.owner_id,
            created_at: OffsetDateTime::now_utc(),
        };
        let seq = state.next_seq;
        state.next_seq += 1;
        state.polls.insert(created.id, StoredPoll { poll: created.clone(), seq });
        Ok(created)
    }

    async fn delete_poll(&self, poll_id: Uuid) -> Result<(), StoreError> {
        #[cfg(test)]
        self.check(FailPoint::DeletePoll)?;
        let mut state = self.state()?;
        state.polls.remove(&poll_id);
        state.options.retain(|o| o.poll_id != poll_id);
        state.votes.retain(|_, v| v.poll_id != poll_id);
        Ok(())
    }

    async fn update_poll(&self, poll_id: Uuid, question: &str, description: Option<&str>) -> Result<(), StoreError> {
        #[cfg(test)]
        self.check(FailPoint::UpdatePoll)?;
        let mut state = self.state()?;
        if let Some(stored) = state.polls.get_mut(&poll_id) {
            stored.poll.question = question.to_string();
            stored.poll.description = description.map(str::to_string);
        }
        Ok(())
    }

    async fn poll_owner(&self, poll_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        Ok(self.state()?.polls.get(&poll_id).map(|p| p.poll.owner_id))
    }

    async fn insert_options(&self, poll_id: Uuid, texts: &[String]) -> Result<Vec<PollOption>, StoreError> {
        #[cfg(test)]
        self.check(FailPoint::InsertOptions)?;
        let mut state = self.state()?;
        if !state.polls.contains_key(&poll_id) {
            return Err(StoreError::Unavailable(format!("poll {poll_id} does not exist")));
        }
        let inserted: Vec<_> = texts.iter()
            .map(|text| PollOption { id: Uuid::new_v4(), poll_id, text: text.clone(), votes: 0 })
            .collect();
        state.options.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn delete_options(&self, poll_id: Uuid) -> Result<(), StoreError> {
        #[cfg(test)]
        self.check(FailPoint::DeleteOptions)?;
        let mut state = self.state()?;
        let removed: HashSet<Uuid> = state.options.iter()
            .filter(|o| o.poll_id == poll_id)
            .map(|o| o.id)
            .collect();
        state.options.retain(|o| o.poll_id != poll_id);
        state.votes.retain(|_, v| !removed.contains(&v.option_id));
        Ok(())
    }

    async fn option_ids(&self, poll_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.state()?.options.iter().filter(|o| o.poll_id == poll_id).map(|o| o.id).collect())
    }

    async fn update_option_text(&self, option_id: Uuid, text: &str) -> Result<(), StoreError> {
        #[cfg(test)]
        self.check(FailPoint::UpdateOption)?;
        let mut state = self.state()?;
        if let Some(option) = state.options.iter_mut().find(|o| o.id == option_id) {
            option.text = text.to_string();
        }
        Ok(())
    }

    async fn find_option(&self, option_id: Uuid) -> Result<Option<PollOption>, StoreError> {
        let state = self.state()?;
        Ok(state.options.iter().find(|o| o.id == option_id).map(|o| state.counted(o)))
    }

    async fn upsert_vote(&self, poll_id: Uuid, option_id: Uuid, user_id: Uuid) -> Result<Vote, StoreError> {
        #[cfg(test)]
        self.check(FailPoint::UpsertVote)?;
        let mut state = self.state()?;
        if !state.options.iter().any(|o| o.id == option_id && o.poll_id == poll_id) {
            return Err(StoreError::Unavailable(format!("option {option_id} is not in poll {poll_id}")));
        }
        let vote = state.votes.entry((poll_id, user_id))
            .and_modify(|v| {
                v.option_id = option_id;
                v.created_at = OffsetDateTime::now_utc();
            })
            .or_insert_with(|| Vote {
                id: Uuid::new_v4(),
                poll_id,
                option_id,
                user_id,
                created_at: OffsetDateTime::now_utc(),
            });
        Ok(vote.clone())
    }

    async fn find_vote(&self, poll_id: Uuid, user_id: Uuid) -> Result<Option<Vote>, StoreError> {
        Ok(self.state()?.votes.get(&(poll_id, user_id)).cloned())
    }

    async fn list_polls(&self, owner_id: Option<Uuid>) -> Result<Vec<PollView>, StoreError> {
        #[cfg(test)]
        self.check(FailPoint::ListPolls)?;
        let state = self.state()?;
        let mut polls: Vec<&StoredPoll> = state.polls.values()
            .filter(|p| owner_id.map_or(true, |owner| p.poll.owner_id == owner))
            .collect();
        polls.sort_by(|a, b| b.poll.created_at.cmp(&a.poll.created_at).then(b.seq.cmp(&a.seq)));
        Ok(polls.into_iter().map(|p| state.view(p)).collect())
    }

    async fn get_poll(&self, poll_id: Uuid) -> Result<Option<PollView>, StoreError> {
        #[cfg(test)]
        self.check(FailPoint::ListPolls)?;
        let state = self.state()?;
        Ok(state.polls.get(&poll_id).map(|p| state.view(p)))
    }
}

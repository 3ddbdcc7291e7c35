use crate::types::ReferenceId;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

const ACCOUNT_NUMBER_MIN: u64 = 100_000_000_000;
const ACCOUNT_NUMBER_MAX: u64 = 999_999_999_999;

/// Source of identifiers handed out by the engine.
///
/// Collisions are tolerated: the engine checks account numbers against the
/// store and the journal rejects duplicate reference ids.
pub trait IdGenerator: Send + Sync + 'static {
    /// A 12 digit account number candidate.
    fn account_number(&self) -> String;
    /// A reference id for a new journal entry.
    fn reference_id(&self) -> ReferenceId;
}

/// Uniformly random account numbers and v4 UUID reference ids.
#[derive(Debug, Default)]
pub struct RandomIdGenerator;

impl RandomIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for RandomIdGenerator {
    fn account_number(&self) -> String {
        rand::thread_rng().gen_range(ACCOUNT_NUMBER_MIN..=ACCOUNT_NUMBER_MAX).to_string()
    }

    fn reference_id(&self) -> ReferenceId {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic generator for tests and replays.
///
/// Scripted account numbers are handed out first, after which numbers count up
/// from `100000000000`. Reference ids are `REF-1`, `REF-2`, ... unless scripted.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next_number: AtomicU64,
    next_reference: AtomicU64,
    scripted_numbers: Mutex<VecDeque<String>>,
    scripted_references: Mutex<VecDeque<ReferenceId>>
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account_numbers<I, S>(self, numbers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut scripted) = self.scripted_numbers.lock() {
            scripted.extend(numbers.into_iter().map(Into::into));
        }
        self
    }

    pub fn with_reference_ids<I, S>(self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut scripted) = self.scripted_references.lock() {
            scripted.extend(references.into_iter().map(Into::into));
        }
        self
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn account_number(&self) -> String {
        if let Some(number) = self.scripted_numbers.lock().ok().and_then(|mut scripted| scripted.pop_front()) {
            return number;
        }

        let offset = self.next_number.fetch_add(1, Ordering::Relaxed);
        (ACCOUNT_NUMBER_MIN + offset).to_string()
    }

    fn reference_id(&self) -> ReferenceId {
        if let Some(reference) = self.scripted_references.lock().ok().and_then(|mut scripted| scripted.pop_front()) {
            return reference;
        }

        let next = self.next_reference.fetch_add(1, Ordering::Relaxed) + 1;
        format!("REF-{next}")
    }
}

//! In-memory [`ContentStore`] for integration tests and local development.
//!
//! Keeps the four collections in hash maps behind one mutex. Counter bumps
//! and the acceptance batch hold the lock for their whole duration, so the
//! adapter honours the same atomicity contract as the real store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{
    Answer, AnswerId, ContentStore, Question, QuestionId, StoreError, Tag, TagName, User, UserId,
};

#[derive(Default)]
struct Collections {
    users: HashMap<UserId, User>,
    questions: HashMap<QuestionId, Question>,
    answers: HashMap<AnswerId, Answer>,
    tags: HashMap<TagName, Tag>,
}

/// Hash-map-backed document store.
#[derive(Default)]
pub struct MemoryContentStore {
    inner: Mutex<Collections>,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Collections>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::unavailable("store mutex poisoned"))
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.lock()?.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    async fn list_questions_newest_first(&self) -> Result<Vec<Question>, StoreError> {
        let mut questions: Vec<Question> =
            self.lock()?.questions.values().cloned().collect();
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(questions)
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>, StoreError> {
        Ok(self.lock()?.questions.get(&id).cloned())
    }

    async fn insert_question(&self, question: &Question) -> Result<(), StoreError> {
        self.lock()?
            .questions
            .insert(question.id, question.clone());
        Ok(())
    }

    async fn record_view(&self, id: QuestionId) -> Result<(), StoreError> {
        // Counter bumps require an existing document, as the real store's
        // conditional update does.
        match self.lock()?.questions.get_mut(&id) {
            Some(question) => {
                question.views += 1;
                Ok(())
            }
            None => Err(StoreError::query(format!("question {id} does not exist"))),
        }
    }

    async fn increment_answer_count(&self, id: QuestionId) -> Result<(), StoreError> {
        match self.lock()?.questions.get_mut(&id) {
            Some(question) => {
                question.answer_count += 1;
                Ok(())
            }
            None => Err(StoreError::query(format!("question {id} does not exist"))),
        }
    }

    async fn record_tag_usage(
        &self,
        name: &TagName,
        display_name: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner
            .tags
            .entry(name.clone())
            .and_modify(|tag| tag.question_count += 1)
            .or_insert_with(|| Tag {
                name: name.clone(),
                display_name: display_name.to_owned(),
                question_count: 1,
            });
        Ok(())
    }

    async fn top_tags(&self, limit: usize) -> Result<Vec<Tag>, StoreError> {
        let mut tags: Vec<Tag> = self.lock()?.tags.values().cloned().collect();
        tags.sort_by(|a, b| b.question_count.cmp(&a.question_count));
        tags.truncate(limit);
        Ok(tags)
    }

    async fn insert_answer(&self, answer: &Answer) -> Result<(), StoreError> {
        self.lock()?.answers.insert(answer.id, answer.clone());
        Ok(())
    }

    async fn find_answer(&self, id: AnswerId) -> Result<Option<Answer>, StoreError> {
        Ok(self.lock()?.answers.get(&id).cloned())
    }

    async fn answers_for_question(&self, id: QuestionId) -> Result<Vec<Answer>, StoreError> {
        let mut answers: Vec<Answer> = self
            .lock()?
            .answers
            .values()
            .filter(|answer| answer.question_id == id)
            .cloned()
            .collect();
        answers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(answers)
    }

    async fn accepted_answers_for_question(
        &self,
        id: QuestionId,
    ) -> Result<Vec<AnswerId>, StoreError> {
        Ok(self
            .lock()?
            .answers
            .values()
            .filter(|answer| answer.question_id == id && answer.accepted)
            .map(|answer| answer.id)
            .collect())
    }

    async fn commit_acceptance(
        &self,
        question_id: QuestionId,
        clear: &[AnswerId],
        set: AnswerId,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;

        // Validate every leg before touching any flag.
        for answer_id in clear.iter().chain(std::iter::once(&set)) {
            let answer = inner
                .answers
                .get(answer_id)
                .ok_or_else(|| StoreError::query(format!("answer {answer_id} vanished")))?;
            if answer.question_id != question_id {
                return Err(StoreError::query(format!(
                    "answer {answer_id} does not belong to question {question_id}"
                )));
            }
        }

        for answer_id in clear {
            if let Some(answer) = inner.answers.get_mut(answer_id) {
                answer.accepted = false;
            }
        }
        if let Some(answer) = inner.answers.get_mut(&set) {
            answer.accepted = true;
        }
        Ok(())
    }
}

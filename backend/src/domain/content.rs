//! Content service: question/answer reads and writes, tag bookkeeping, and
//! the answer-acceptance invariant.
//!
//! This is the one place with a real invariant to enforce: at most one
//! answer per question may be accepted at any time. The store has no native
//! "at most one true per group" constraint, so acceptance is a
//! read-then-batch-write where the batch commit is all-or-nothing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, warn};

use super::answer::{AnswerId, AnswerWithAuthor, NewAnswer};
use super::error::Error;
use super::ports::{ContentCommand, ContentQuery, ContentStore, StoreError};
use super::question::{
    NewQuestion, Question, QuestionId, QuestionThread, QuestionWithAuthor,
};
use super::tag::Tag;
use super::user::{User, UserId};

/// Number of tags returned by the popular-tags ranking.
pub const POPULAR_TAGS_LIMIT: usize = 20;

/// Content repository service over the document-store port.
#[derive(Clone)]
pub struct ContentService<S> {
    store: Arc<S>,
}

impl<S> ContentService<S> {
    /// Create a new service over the given store adapter.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S> ContentService<S>
where
    S: ContentStore,
{
    fn map_store_error(error: StoreError) -> Error {
        match error {
            StoreError::Unavailable { message } => {
                Error::service_unavailable(format!("document store unavailable: {message}"))
            }
            StoreError::Query { message } => {
                Error::internal(format!("document store error: {message}"))
            }
            StoreError::Corrupt { message } => {
                error!(%message, "document store returned a malformed document");
                Error::data_inconsistency(format!("malformed document in store: {message}"))
            }
        }
    }

    /// Resolve a question's author, treating a missing profile as broken
    /// referential integrity rather than a user-facing not-found.
    async fn resolve_question_author(&self, question: &Question) -> Result<User, Error> {
        let author = self
            .store
            .find_user(&question.author_id)
            .await
            .map_err(Self::map_store_error)?;

        author.ok_or_else(|| {
            error!(
                question_id = %question.id,
                author_id = %question.author_id,
                "question references a missing author profile"
            );
            Error::data_inconsistency(format!(
                "question {} references missing author {}",
                question.id, question.author_id
            ))
        })
    }

    /// Join answers with their authors.
    ///
    /// Answers whose author profile is missing are dropped from the thread
    /// rather than failing the whole page; each drop is logged as a
    /// referential-integrity warning.
    async fn join_answer_authors(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<AnswerWithAuthor>, Error> {
        let answers = self
            .store
            .answers_for_question(question_id)
            .await
            .map_err(Self::map_store_error)?;

        let mut joined = Vec::with_capacity(answers.len());
        for answer in answers {
            let author = self
                .store
                .find_user(&answer.author_id)
                .await
                .map_err(Self::map_store_error)?;
            match author {
                Some(author) => joined.push(AnswerWithAuthor { answer, author }),
                None => warn!(
                    answer_id = %answer.id,
                    author_id = %answer.author_id,
                    "dropping answer with missing author profile"
                ),
            }
        }

        // Stable sort: the accepted answer (if any) first, the rest keep
        // their original creation order.
        joined.sort_by_key(|entry| !entry.answer.accepted);
        Ok(joined)
    }
}

#[async_trait]
impl<S> ContentQuery for ContentService<S>
where
    S: ContentStore,
{
    async fn questions(&self) -> Result<Vec<QuestionWithAuthor>, Error> {
        let questions = self
            .store
            .list_questions_newest_first()
            .await
            .map_err(Self::map_store_error)?;

        let mut joined = Vec::with_capacity(questions.len());
        for question in questions {
            let author = self.resolve_question_author(&question).await?;
            joined.push(QuestionWithAuthor { question, author });
        }
        Ok(joined)
    }

    async fn question(&self, id: QuestionId) -> Result<QuestionThread, Error> {
        let mut question = self
            .store
            .find_question(id)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(|| Error::not_found(format!("question {id} does not exist")))?;

        // Reads are a visible mutation: every fetch counts one view, with
        // no de-duplication, the author's own reads included. The adapter's
        // increment is atomic so the returned copy can bump locally instead
        // of re-reading.
        self.store
            .record_view(id)
            .await
            .map_err(Self::map_store_error)?;
        question.views += 1;

        let author = self.resolve_question_author(&question).await?;
        let answers = self.join_answer_authors(id).await?;

        Ok(QuestionThread {
            question: QuestionWithAuthor { question, author },
            answers,
        })
    }

    async fn popular_tags(&self) -> Result<Vec<Tag>, Error> {
        self.store
            .top_tags(POPULAR_TAGS_LIMIT)
            .await
            .map_err(Self::map_store_error)
    }

    async fn users(&self) -> Result<Vec<User>, Error> {
        self.store.list_users().await.map_err(Self::map_store_error)
    }
}

#[async_trait]
impl<S> ContentCommand for ContentService<S>
where
    S: ContentStore,
{
    async fn create_question(
        &self,
        author: &UserId,
        question: NewQuestion,
    ) -> Result<QuestionId, Error> {
        let tags = question.tags().to_vec();
        let question = question.into_question(author.clone(), Utc::now());
        let id = question.id;

        self.store
            .insert_question(&question)
            .await
            .map_err(Self::map_store_error)?;

        // Tags are deduplicated during validation, so each distinct tag is
        // counted exactly once per question. Each upsert is atomic on its
        // own, but the loop is not a cross-tag transaction: a failure
        // partway leaves earlier counters already bumped.
        for tag in tags {
            self.store
                .record_tag_usage(&tag.name, &tag.display_name)
                .await
                .map_err(Self::map_store_error)?;
        }

        Ok(id)
    }

    async fn add_answer(
        &self,
        question_id: QuestionId,
        author: &UserId,
        answer: NewAnswer,
    ) -> Result<AnswerId, Error> {
        // Check the parent exists before inserting so a bad id cannot
        // create an orphaned answer.
        self.store
            .find_question(question_id)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(|| Error::not_found(format!("question {question_id} does not exist")))?;

        let answer = answer.into_answer(question_id, author.clone(), Utc::now());
        let id = answer.id;

        self.store
            .insert_answer(&answer)
            .await
            .map_err(Self::map_store_error)?;
        self.store
            .increment_answer_count(question_id)
            .await
            .map_err(Self::map_store_error)?;

        Ok(id)
    }

    async fn accept_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        acting_user: &UserId,
    ) -> Result<(), Error> {
        let question = self
            .store
            .find_question(question_id)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(|| Error::not_found(format!("question {question_id} does not exist")))?;

        if question.author_id != *acting_user {
            return Err(Error::forbidden(
                "only the question author may accept an answer",
            ));
        }

        let answer = self
            .store
            .find_answer(answer_id)
            .await
            .map_err(Self::map_store_error)?
            .ok_or_else(|| Error::not_found(format!("answer {answer_id} does not exist")))?;
        if answer.question_id != question_id {
            return Err(Error::not_found(format!(
                "answer {answer_id} does not belong to question {question_id}"
            )));
        }

        // Read-then-batch-write: everything currently accepted is cleared
        // and the target set in one all-or-nothing commit, so no reader
        // ever observes two accepted answers.
        let clear: Vec<AnswerId> = self
            .store
            .accepted_answers_for_question(question_id)
            .await
            .map_err(Self::map_store_error)?
            .into_iter()
            .filter(|id| *id != answer_id)
            .collect();

        self.store
            .commit_acceptance(question_id, &clear, answer_id)
            .await
            .map_err(Self::map_store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::answer::Answer;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::MockContentStore;
    use crate::domain::tag::TagName;
    use crate::domain::user::{DisplayName, EmailAddress, Role};
    use mockall::predicate::eq;
    use rstest::rstest;

    fn user(id: &str) -> User {
        let name = DisplayName::new("Ada Lovelace").expect("valid name");
        User {
            id: UserId::new(id).expect("valid id"),
            avatar_url: User::placeholder_avatar(&name),
            name,
            email: EmailAddress::new("ada@example.com").expect("valid email"),
            role: Role::User,
        }
    }

    fn question(id: QuestionId, author: &str) -> Question {
        Question {
            id,
            title: "how do hooks work".to_owned(),
            description: "a description easily long enough".to_owned(),
            author_id: UserId::new(author).expect("valid id"),
            tags: vec![TagName::new("react").expect("valid tag")],
            upvotes: 0,
            downvotes: 0,
            views: 0,
            answer_count: 0,
            created_at: Utc::now(),
        }
    }

    fn answer(id: AnswerId, question_id: QuestionId, author: &str, accepted: bool) -> Answer {
        Answer {
            id,
            question_id,
            author_id: UserId::new(author).expect("valid id"),
            content: "a sufficiently long answer body".to_owned(),
            upvotes: 0,
            downvotes: 0,
            accepted,
            created_at: Utc::now(),
        }
    }

    fn service(store: MockContentStore) -> ContentService<MockContentStore> {
        ContentService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn question_read_counts_exactly_one_view() {
        let id = QuestionId::random();
        let q = question(id, "uid-alice");
        let mut store = MockContentStore::new();
        store
            .expect_find_question()
            .with(eq(id))
            .times(1)
            .return_once(move |_| Ok(Some(q)));
        store
            .expect_record_view()
            .with(eq(id))
            .times(1)
            .return_once(|_| Ok(()));
        store
            .expect_find_user()
            .times(1)
            .return_once(|_| Ok(Some(user("uid-alice"))));
        store
            .expect_answers_for_question()
            .times(1)
            .return_once(|_| Ok(Vec::new()));

        let thread = service(store).question(id).await.expect("thread");
        assert_eq!(thread.question.question.views, 1);
        assert!(thread.answers.is_empty());
    }

    #[tokio::test]
    async fn missing_question_is_not_found_without_a_view_write() {
        let id = QuestionId::random();
        let mut store = MockContentStore::new();
        store
            .expect_find_question()
            .times(1)
            .return_once(|_| Ok(None));
        store.expect_record_view().times(0);

        let err = service(store).question(id).await.expect_err("not found");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn missing_question_author_is_a_data_inconsistency() {
        let id = QuestionId::random();
        let q = question(id, "uid-ghost");
        let mut store = MockContentStore::new();
        store
            .expect_find_question()
            .times(1)
            .return_once(move |_| Ok(Some(q)));
        store.expect_record_view().times(1).return_once(|_| Ok(()));
        store.expect_find_user().times(1).return_once(|_| Ok(None));

        let err = service(store).question(id).await.expect_err("corrupt");
        assert_eq!(err.code(), ErrorCode::DataInconsistency);
    }

    #[tokio::test]
    async fn answers_with_missing_authors_are_dropped_not_fatal() {
        let id = QuestionId::random();
        let q = question(id, "uid-alice");
        let kept = answer(AnswerId::random(), id, "uid-bob", false);
        let orphaned = answer(AnswerId::random(), id, "uid-ghost", false);
        let kept_id = kept.id;

        let mut store = MockContentStore::new();
        store
            .expect_find_question()
            .times(1)
            .return_once(move |_| Ok(Some(q)));
        store.expect_record_view().times(1).return_once(|_| Ok(()));
        store.expect_find_user().returning(|user_id| {
            if user_id.as_ref() == "uid-ghost" {
                Ok(None)
            } else {
                Ok(Some(user(user_id.as_ref())))
            }
        });
        store
            .expect_answers_for_question()
            .times(1)
            .return_once(move |_| Ok(vec![kept, orphaned]));

        let thread = service(store).question(id).await.expect("thread");
        assert_eq!(thread.answers.len(), 1);
        assert_eq!(thread.answers[0].answer.id, kept_id);
    }

    #[tokio::test]
    async fn accepted_answer_sorts_first_others_keep_order() {
        let id = QuestionId::random();
        let q = question(id, "uid-alice");
        let first = answer(AnswerId::random(), id, "uid-bob", false);
        let second = answer(AnswerId::random(), id, "uid-bob", false);
        let starred = answer(AnswerId::random(), id, "uid-bob", true);
        let (first_id, second_id, starred_id) = (first.id, second.id, starred.id);

        let mut store = MockContentStore::new();
        store
            .expect_find_question()
            .times(1)
            .return_once(move |_| Ok(Some(q)));
        store.expect_record_view().times(1).return_once(|_| Ok(()));
        store
            .expect_find_user()
            .returning(|user_id| Ok(Some(user(user_id.as_ref()))));
        store
            .expect_answers_for_question()
            .times(1)
            .return_once(move |_| Ok(vec![first, second, starred]));

        let thread = service(store).question(id).await.expect("thread");
        let order: Vec<AnswerId> = thread.answers.iter().map(|a| a.answer.id).collect();
        assert_eq!(order, vec![starred_id, first_id, second_id]);
    }

    #[tokio::test]
    async fn unreachable_store_is_service_unavailable_not_an_empty_list() {
        let mut store = MockContentStore::new();
        store
            .expect_list_questions_newest_first()
            .times(1)
            .return_once(|| Err(StoreError::unavailable("connection refused")));

        let err = service(store).questions().await.expect_err("unavailable");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn create_question_counts_each_distinct_tag_once() {
        let new = NewQuestion::try_new(
            "how do hooks work",
            "a description easily long enough",
            &["React".to_owned(), "react".to_owned(), "typescript".to_owned()],
        )
        .expect("valid question");
        let author = UserId::new("uid-alice").expect("valid id");

        let mut store = MockContentStore::new();
        store
            .expect_insert_question()
            .times(1)
            .return_once(|_| Ok(()));
        store
            .expect_record_tag_usage()
            .with(eq(TagName::new("react").expect("tag")), eq("React"))
            .times(1)
            .return_once(|_, _| Ok(()));
        store
            .expect_record_tag_usage()
            .with(eq(TagName::new("typescript").expect("tag")), eq("typescript"))
            .times(1)
            .return_once(|_, _| Ok(()));

        service(store)
            .create_question(&author, new)
            .await
            .expect("question created");
    }

    #[tokio::test]
    async fn add_answer_to_missing_question_fails_without_writes() {
        let author = UserId::new("uid-bob").expect("valid id");
        let new = NewAnswer::try_new("a sufficiently long answer body").expect("valid answer");

        let mut store = MockContentStore::new();
        store
            .expect_find_question()
            .times(1)
            .return_once(|_| Ok(None));
        store.expect_insert_answer().times(0);
        store.expect_increment_answer_count().times(0);

        let err = service(store)
            .add_answer(QuestionId::random(), &author, new)
            .await
            .expect_err("not found");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn add_answer_increments_the_parent_counter() {
        let id = QuestionId::random();
        let q = question(id, "uid-alice");
        let author = UserId::new("uid-bob").expect("valid id");
        let new = NewAnswer::try_new("a sufficiently long answer body").expect("valid answer");

        let mut store = MockContentStore::new();
        store
            .expect_find_question()
            .times(1)
            .return_once(move |_| Ok(Some(q)));
        store
            .expect_insert_answer()
            .times(1)
            .return_once(|_| Ok(()));
        store
            .expect_increment_answer_count()
            .with(eq(id))
            .times(1)
            .return_once(|_| Ok(()));

        service(store)
            .add_answer(id, &author, new)
            .await
            .expect("answer added");
    }

    #[tokio::test]
    async fn non_author_cannot_accept_and_nothing_is_written() {
        let id = QuestionId::random();
        let q = question(id, "uid-alice");
        let intruder = UserId::new("uid-mallory").expect("valid id");

        let mut store = MockContentStore::new();
        store
            .expect_find_question()
            .times(1)
            .return_once(move |_| Ok(Some(q)));
        store.expect_find_answer().times(0);
        store.expect_commit_acceptance().times(0);

        let err = service(store)
            .accept_answer(id, AnswerId::random(), &intruder)
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn accepting_clears_the_previous_acceptance_in_one_batch() {
        let id = QuestionId::random();
        let q = question(id, "uid-alice");
        let owner = UserId::new("uid-alice").expect("valid id");
        let previous = AnswerId::random();
        let target = AnswerId::random();
        let target_answer = answer(target, id, "uid-bob", false);

        let mut store = MockContentStore::new();
        store
            .expect_find_question()
            .times(1)
            .return_once(move |_| Ok(Some(q)));
        store
            .expect_find_answer()
            .with(eq(target))
            .times(1)
            .return_once(move |_| Ok(Some(target_answer)));
        store
            .expect_accepted_answers_for_question()
            .with(eq(id))
            .times(1)
            .return_once(move |_| Ok(vec![previous]));
        store
            .expect_commit_acceptance()
            .withf(move |qid, clear, set| *qid == id && clear == [previous] && *set == target)
            .times(1)
            .return_once(|_, _, _| Ok(()));

        service(store)
            .accept_answer(id, target, &owner)
            .await
            .expect("acceptance committed");
    }

    #[tokio::test]
    async fn re_accepting_the_same_answer_clears_nothing() {
        let id = QuestionId::random();
        let q = question(id, "uid-alice");
        let owner = UserId::new("uid-alice").expect("valid id");
        let target = AnswerId::random();
        let target_answer = answer(target, id, "uid-bob", true);

        let mut store = MockContentStore::new();
        store
            .expect_find_question()
            .times(1)
            .return_once(move |_| Ok(Some(q)));
        store
            .expect_find_answer()
            .times(1)
            .return_once(move |_| Ok(Some(target_answer)));
        store
            .expect_accepted_answers_for_question()
            .times(1)
            .return_once(move |_| Ok(vec![target]));
        store
            .expect_commit_acceptance()
            .withf(move |_, clear, set| clear.is_empty() && *set == target)
            .times(1)
            .return_once(|_, _, _| Ok(()));

        service(store)
            .accept_answer(id, target, &owner)
            .await
            .expect("idempotent acceptance");
    }

    #[tokio::test]
    async fn answer_from_another_question_is_not_found() {
        let id = QuestionId::random();
        let other = QuestionId::random();
        let q = question(id, "uid-alice");
        let owner = UserId::new("uid-alice").expect("valid id");
        let stray = answer(AnswerId::random(), other, "uid-bob", false);
        let stray_id = stray.id;

        let mut store = MockContentStore::new();
        store
            .expect_find_question()
            .times(1)
            .return_once(move |_| Ok(Some(q)));
        store
            .expect_find_answer()
            .times(1)
            .return_once(move |_| Ok(Some(stray)));
        store.expect_accepted_answers_for_question().times(0);
        store.expect_commit_acceptance().times(0);

        let err = service(store)
            .accept_answer(id, stray_id, &owner)
            .await
            .expect_err("not found");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}

//! [`ContentStore`] implementation backed by DynamoDB.
//!
//! Four tables mirror the four collections: `users` keyed by `id`,
//! `questions` keyed by `id`, `answers` keyed by `id` with a
//! `answers_by_question` index on `questionId`, and `tags` keyed by `name`.
//! Documents are marshalled with `serde_dynamo`, so attribute names match
//! the camelCase serde contract of the domain types.
//!
//! Counter bumps are expressed as update expressions so concurrent writers
//! never lose an increment, and answer acceptance goes through a single
//! `TransactWriteItems` call so no reader ever observes two accepted
//! answers on one question.

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::types::{AttributeValue, TransactWriteItem, Update};
use tracing::debug;

use serde_dynamo::aws_sdk_dynamodb_1::{from_item, from_items, to_item};

use crate::domain::{
    Answer, AnswerId, ContentStore, Question, QuestionId, StoreError, Tag, TagName, User, UserId,
};

/// Table and index names used by [`DynamoContentStore`].
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Profile documents, keyed by `id`.
    pub users: String,
    /// Question documents, keyed by `id`.
    pub questions: String,
    /// Answer documents, keyed by `id`.
    pub answers: String,
    /// Global secondary index on the answers table, keyed by `questionId`.
    pub answers_by_question: String,
    /// Tag documents, keyed by `name`.
    pub tags: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            users: "users".to_owned(),
            questions: "questions".to_owned(),
            answers: "answers".to_owned(),
            answers_by_question: "answers_by_question".to_owned(),
            tags: "tags".to_owned(),
        }
    }
}

/// DynamoDB-backed document store.
pub struct DynamoContentStore {
    client: aws_sdk_dynamodb::Client,
    tables: TableConfig,
}

impl DynamoContentStore {
    /// Wrap an already-configured SDK client.
    pub fn new(client: aws_sdk_dynamodb::Client, tables: TableConfig) -> Self {
        Self { client, tables }
    }

    /// Load AWS configuration from the environment and connect.
    ///
    /// `endpoint_url` overrides the regional endpoint; used for DynamoDB
    /// Local in development.
    pub async fn from_env(tables: TableConfig, endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::from_env();
        if let Some(url) = endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let config = loader.load().await;
        Self::new(aws_sdk_dynamodb::Client::new(&config), tables)
    }
}

/// Classify an SDK failure: transport problems are retriable outages,
/// everything else is a failed request.
fn map_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let transport = matches!(
        err,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)
    );
    let message = format!("{operation}: {}", DisplayErrorContext(&err));
    if transport {
        StoreError::unavailable(message)
    } else {
        StoreError::query(message)
    }
}

fn map_serde_error(operation: &str, err: serde_dynamo::Error) -> StoreError {
    StoreError::corrupt(format!("{operation}: {err}"))
}

#[async_trait]
impl ContentStore for DynamoContentStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let item = to_item(user).map_err(|e| map_serde_error("marshal user", e))?;
        self.client
            .put_item()
            .table_name(&self.tables.users)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| map_sdk_error("insert user", e))?;
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.tables.users)
            .key("id", AttributeValue::S(id.as_ref().to_owned()))
            .send()
            .await
            .map_err(|e| map_sdk_error("find user", e))?;
        output
            .item
            .map(|item| from_item(item).map_err(|e| map_serde_error("unmarshal user", e)))
            .transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let output = self
            .client
            .scan()
            .table_name(&self.tables.users)
            .send()
            .await
            .map_err(|e| map_sdk_error("list users", e))?;
        from_items(output.items.unwrap_or_default())
            .map_err(|e| map_serde_error("unmarshal users", e))
    }

    async fn list_questions_newest_first(&self) -> Result<Vec<Question>, StoreError> {
        let output = self
            .client
            .scan()
            .table_name(&self.tables.questions)
            .send()
            .await
            .map_err(|e| map_sdk_error("list questions", e))?;
        let mut questions: Vec<Question> = from_items(output.items.unwrap_or_default())
            .map_err(|e| map_serde_error("unmarshal questions", e))?;
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(questions)
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.tables.questions)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| map_sdk_error("find question", e))?;
        output
            .item
            .map(|item| from_item(item).map_err(|e| map_serde_error("unmarshal question", e)))
            .transpose()
    }

    async fn insert_question(&self, question: &Question) -> Result<(), StoreError> {
        let item = to_item(question).map_err(|e| map_serde_error("marshal question", e))?;
        self.client
            .put_item()
            .table_name(&self.tables.questions)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| map_sdk_error("insert question", e))?;
        debug!(question_id = %question.id, "question stored");
        Ok(())
    }

    async fn record_view(&self, id: QuestionId) -> Result<(), StoreError> {
        self.bump_question_counter(id, "views", "record view").await
    }

    async fn increment_answer_count(&self, id: QuestionId) -> Result<(), StoreError> {
        self.bump_question_counter(id, "answerCount", "increment answer count")
            .await
    }

    async fn record_tag_usage(
        &self,
        name: &TagName,
        display_name: &str,
    ) -> Result<(), StoreError> {
        // Create-or-increment in one request; the first writer's spelling
        // wins the display name and later writers only bump the counter.
        self.client
            .update_item()
            .table_name(&self.tables.tags)
            .key("name", AttributeValue::S(name.as_ref().to_owned()))
            .update_expression(
                "SET questionCount = if_not_exists(questionCount, :zero) + :one, \
                 displayName = if_not_exists(displayName, :display)",
            )
            .expression_attribute_values(":zero", AttributeValue::N("0".to_owned()))
            .expression_attribute_values(":one", AttributeValue::N("1".to_owned()))
            .expression_attribute_values(":display", AttributeValue::S(display_name.to_owned()))
            .send()
            .await
            .map_err(|e| map_sdk_error("record tag usage", e))?;
        Ok(())
    }

    async fn top_tags(&self, limit: usize) -> Result<Vec<Tag>, StoreError> {
        let output = self
            .client
            .scan()
            .table_name(&self.tables.tags)
            .send()
            .await
            .map_err(|e| map_sdk_error("list tags", e))?;
        let mut tags: Vec<Tag> = from_items(output.items.unwrap_or_default())
            .map_err(|e| map_serde_error("unmarshal tags", e))?;
        tags.sort_by(|a, b| b.question_count.cmp(&a.question_count));
        tags.truncate(limit);
        Ok(tags)
    }

    async fn insert_answer(&self, answer: &Answer) -> Result<(), StoreError> {
        let item = to_item(answer).map_err(|e| map_serde_error("marshal answer", e))?;
        self.client
            .put_item()
            .table_name(&self.tables.answers)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| map_sdk_error("insert answer", e))?;
        Ok(())
    }

    async fn find_answer(&self, id: AnswerId) -> Result<Option<Answer>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.tables.answers)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| map_sdk_error("find answer", e))?;
        output
            .item
            .map(|item| from_item(item).map_err(|e| map_serde_error("unmarshal answer", e)))
            .transpose()
    }

    async fn answers_for_question(&self, id: QuestionId) -> Result<Vec<Answer>, StoreError> {
        let mut answers: Vec<Answer> = self.query_question_answers(id, false).await?;
        answers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(answers)
    }

    async fn accepted_answers_for_question(
        &self,
        id: QuestionId,
    ) -> Result<Vec<AnswerId>, StoreError> {
        let accepted = self.query_question_answers(id, true).await?;
        Ok(accepted.into_iter().map(|answer| answer.id).collect())
    }

    async fn commit_acceptance(
        &self,
        question_id: QuestionId,
        clear: &[AnswerId],
        set: AnswerId,
    ) -> Result<(), StoreError> {
        let mut items = Vec::with_capacity(clear.len() + 1);
        for answer_id in clear {
            items.push(self.acceptance_update(question_id, *answer_id, false)?);
        }
        items.push(self.acceptance_update(question_id, set, true)?);

        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(|e| map_sdk_error("commit acceptance", e))?;
        debug!(%question_id, answer_id = %set, cleared = clear.len(), "acceptance committed");
        Ok(())
    }
}

impl DynamoContentStore {
    async fn bump_question_counter(
        &self,
        id: QuestionId,
        attribute: &str,
        operation: &str,
    ) -> Result<(), StoreError> {
        self.client
            .update_item()
            .table_name(&self.tables.questions)
            .key("id", AttributeValue::S(id.to_string()))
            .update_expression("SET #counter = if_not_exists(#counter, :zero) + :one")
            .expression_attribute_names("#counter", attribute)
            .expression_attribute_values(":zero", AttributeValue::N("0".to_owned()))
            .expression_attribute_values(":one", AttributeValue::N("1".to_owned()))
            .condition_expression("attribute_exists(id)")
            .send()
            .await
            .map_err(|e| map_sdk_error(operation, e))?;
        Ok(())
    }

    async fn query_question_answers(
        &self,
        id: QuestionId,
        accepted_only: bool,
    ) -> Result<Vec<Answer>, StoreError> {
        let mut query = self
            .client
            .query()
            .table_name(&self.tables.answers)
            .index_name(&self.tables.answers_by_question)
            .key_condition_expression("questionId = :qid")
            .expression_attribute_values(":qid", AttributeValue::S(id.to_string()));
        if accepted_only {
            query = query
                .filter_expression("accepted = :yes")
                .expression_attribute_values(":yes", AttributeValue::Bool(true));
        }
        let output = query
            .send()
            .await
            .map_err(|e| map_sdk_error("query answers", e))?;
        from_items(output.items.unwrap_or_default())
            .map_err(|e| map_serde_error("unmarshal answers", e))
    }

    fn acceptance_update(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        accepted: bool,
    ) -> Result<TransactWriteItem, StoreError> {
        // Guard every leg on the answer still belonging to the question so
        // a concurrent change aborts the whole batch.
        let update = Update::builder()
            .table_name(&self.tables.answers)
            .key("id", AttributeValue::S(answer_id.to_string()))
            .update_expression("SET accepted = :flag")
            .condition_expression("attribute_exists(id) AND questionId = :qid")
            .expression_attribute_values(":flag", AttributeValue::Bool(accepted))
            .expression_attribute_values(":qid", AttributeValue::S(question_id.to_string()))
            .build()
            .map_err(|e| StoreError::query(format!("build acceptance update: {e}")))?;
        Ok(TransactWriteItem::builder().update(update).build())
    }
}

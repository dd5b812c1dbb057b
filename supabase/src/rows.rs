//! PostgREST row access for the todo table.

use crate::client::SupabaseClient;
use crate::error::{response_message, transport_message};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use todosync_core::providers::BoxFuture;
use todosync_core::{ItemStore, NewTodo, Todo, TodoError, TodoId, TodoPatch, UserId};
use tracing::{debug, error};

/// Returned when a single-row write matched nothing.
const NO_ROWS_MESSAGE: &str = "JSON object requested, multiple (or no) rows returned";

#[derive(Serialize)]
#[serde(untagged)]
enum PatchBody<'a> {
    Completed { completed: bool },
    Title { title: &'a str },
}

impl<'a> From<&'a TodoPatch> for PatchBody<'a> {
    fn from(patch: &'a TodoPatch) -> Self {
        match patch {
            TodoPatch::Completed(completed) => Self::Completed {
                completed: *completed,
            },
            TodoPatch::Title(title) => Self::Title { title },
        }
    }
}

impl SupabaseClient {
    async fn bearer(&self) -> Result<String, TodoError> {
        self.access_token().await.ok_or(TodoError::Unauthenticated)
    }

    /// Send a row request and turn any failure into a `TodoError`.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, TodoError> {
        let response = request
            .send()
            .await
            .map_err(|e| TodoError::Network(transport_message(&e, self.config.request_timeout)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let (status, message) = response_message(response).await;
        if status.is_server_error() {
            error!(%status, %message, "Unexpected response from row service");
        } else {
            debug!(%status, %message, "Row request rejected");
        }
        Err(TodoError::Remote(message))
    }

    async fn rows(response: Response) -> Result<Vec<Todo>, TodoError> {
        response
            .json::<Vec<Todo>>()
            .await
            .map_err(|e| TodoError::Network(format!("failed to parse rows: {e}")))
    }

    async fn single_row(response: Response) -> Result<Todo, TodoError> {
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TodoError::Remote(NO_ROWS_MESSAGE.to_string()))
    }

    async fn select_owned(&self, owner: &UserId) -> Result<Vec<Todo>, TodoError> {
        let token = self.bearer().await?;
        debug!(user_id = %owner, table = %self.config.table, "Selecting todos");

        let request = self.table_request(Method::GET, &token).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{owner}")),
            ("order", "created_at.asc".to_string()),
        ]);

        let todos = Self::rows(self.execute(request).await?).await?;
        debug!(count = todos.len(), "Selected todos");
        Ok(todos)
    }

    async fn insert_row(&self, todo: NewTodo) -> Result<Todo, TodoError> {
        let token = self.bearer().await?;
        debug!(user_id = %todo.user_id, "Inserting todo");

        let request = self
            .table_request(Method::POST, &token)
            .header("Prefer", "return=representation")
            .json(&[todo]);

        Self::single_row(self.execute(request).await?).await
    }

    async fn update_row(&self, id: &TodoId, patch: TodoPatch) -> Result<Todo, TodoError> {
        let token = self.bearer().await?;
        debug!(todo_id = %id, ?patch, "Updating todo");

        let request = self
            .table_request(Method::PATCH, &token)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&PatchBody::from(&patch));

        Self::single_row(self.execute(request).await?).await
    }

    async fn delete_row(&self, id: &TodoId) -> Result<(), TodoError> {
        let token = self.bearer().await?;
        debug!(todo_id = %id, "Deleting todo");

        let request = self
            .table_request(Method::DELETE, &token)
            .query(&[("id", format!("eq.{id}"))]);

        self.execute(request).await.map(|_| ())
    }

    async fn delete_completed(&self, owner: &UserId) -> Result<(), TodoError> {
        let token = self.bearer().await?;
        debug!(user_id = %owner, "Clearing completed todos");

        let request = self.table_request(Method::DELETE, &token).query(&[
            ("user_id", format!("eq.{owner}")),
            ("completed", "eq.true".to_string()),
        ]);

        self.execute(request).await.map(|_| ())
    }
}

impl ItemStore for SupabaseClient {
    fn select_by_owner<'a>(&'a self, owner: &'a UserId) -> BoxFuture<'a, Result<Vec<Todo>, TodoError>> {
        Box::pin(self.select_owned(owner))
    }

    fn insert(&self, todo: NewTodo) -> BoxFuture<'_, Result<Todo, TodoError>> {
        Box::pin(self.insert_row(todo))
    }

    fn update<'a>(&'a self, id: &'a TodoId, patch: TodoPatch) -> BoxFuture<'a, Result<Todo, TodoError>> {
        Box::pin(self.update_row(id, patch))
    }

    fn delete_by_id<'a>(&'a self, id: &'a TodoId) -> BoxFuture<'a, Result<(), TodoError>> {
        Box::pin(self.delete_row(id))
    }

    fn delete_completed_by_owner<'a>(&'a self, owner: &'a UserId) -> BoxFuture<'a, Result<(), TodoError>> {
        Box::pin(self.delete_completed(owner))
    }
}

// MCP Tools implementation using official rmcp SDK
// Lets an assistant inspect the status feed and update task state with
// mcp-level source priority

use rmcp::{
    ErrorData as McpError,
    model::*,
    tool, tool_router,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
};
use serde::Deserialize;
use schemars::JsonSchema;
use std::sync::Arc;
use tauri::Emitter;

use crate::server::{FeedState, UpdateOutcome, UpdateStateRequest};

const INSTRUCTIONS: &str = "Vibebar MCP Server - AI task status tracker.

Call `list_tasks` first, match the target by ide/project_path/window_title,
then `update_task_status(task_id, status)`. Updates are prioritized by
source: hook > mcp > plugin. Valid statuses: idle, armed, running, active,
completed, error.";

/// Vibebar MCP Server - exposes the status feed to assistants
#[derive(Clone)]
pub struct VibebarServer {
    pub feed: Arc<FeedState>,
    pub app_handle: tauri::AppHandle,
    tool_router: ToolRouter<Self>,
}

impl VibebarServer {
    pub fn new(feed: Arc<FeedState>, app_handle: tauri::AppHandle) -> Self {
        Self {
            feed,
            app_handle,
            tool_router: Self::tool_router(),
        }
    }
}

// Implement ServerHandler - delegates tool calls to the tool_router
impl rmcp::handler::server::ServerHandler for VibebarServer {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        let mut info = rmcp::model::ServerInfo::default();
        info.instructions = Some(INSTRUCTIONS.into());
        info
    }

    fn initialize(
        &self,
        _request: rmcp::model::InitializeRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::InitializeResult, McpError>> + Send + '_ {
        async move {
            println!("[MCP] Initialize called");
            let mut result = rmcp::model::InitializeResult::default();
            result.capabilities.tools = Some(rmcp::model::ToolsCapability {
                list_changed: Some(false),
            });
            result.server_info.name = "vibebar".into();
            result.server_info.version = env!("CARGO_PKG_VERSION").into();
            result.instructions = Some(INSTRUCTIONS.into());
            Ok(result)
        }
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::ListToolsResult, McpError>> + Send + '_ {
        async move {
            let tools = self.tool_router.list_all();
            println!("[MCP] list_tools called, found {} tools", tools.len());
            Ok(rmcp::model::ListToolsResult {
                tools,
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: rmcp::model::CallToolRequestParam,
        context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let tool_context = rmcp::handler::server::tool::ToolCallContext::new(self, request, context);
            self.tool_router.call(tool_context).await
        }
    }
}

// ============================================
// Tool Input Types
// ============================================

#[derive(Deserialize, JsonSchema)]
pub struct UpdateTaskStatusInput {
    pub task_id: String,
    /// New status: idle, armed, running, active, completed, error
    pub status: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct EmptyInput {}

// ============================================
// Tool Implementations
// ============================================

#[tool_router]
impl VibebarServer {
    #[tool(description = "Get all tracked tasks with their id, IDE, project path, active file, status, and progress")]
    async fn list_tasks(&self, _input: Parameters<EmptyInput>) -> Result<CallToolResult, McpError> {
        let snapshot = self.feed.snapshot();
        let json = serde_json::to_string_pretty(&snapshot.tasks).unwrap_or_else(|_| "[]".to_string());
        println!("[MCP] list_tasks: returning {} tasks", snapshot.task_count);
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get the currently selected task, if any")]
    async fn get_current_task(&self, _input: Parameters<EmptyInput>) -> Result<CallToolResult, McpError> {
        let snapshot = self.feed.snapshot();
        let json = serde_json::to_string_pretty(&snapshot.current_task)
            .unwrap_or_else(|_| "null".to_string());
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a task's status. Priority: hook > mcp > plugin. Valid statuses: idle, armed, running, active, completed, error")]
    async fn update_task_status(&self, input: Parameters<UpdateTaskStatusInput>) -> Result<CallToolResult, McpError> {
        let request = UpdateStateRequest {
            task_id: input.0.task_id.clone(),
            status: Some(input.0.status.clone()),
            progress: None,
            tokens: None,
            increment: false,
        };
        match self.feed.applyUpdateState(&request, "mcp") {
            UpdateOutcome::Ok => {
                let _ = self.app_handle.emit("mcp-tasks-changed", ());
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "Task {} status updated to {}",
                    input.0.task_id, input.0.status
                ))]))
            }
            UpdateOutcome::Ignored(reason) => Ok(CallToolResult::success(vec![Content::text(
                format!("Ignored: {}", reason),
            )])),
            UpdateOutcome::NotFound => Err(McpError::invalid_params(
                format!("Task not found: {}", input.0.task_id),
                None,
            )),
            UpdateOutcome::InvalidStatus(status) => Err(McpError::invalid_params(
                format!("Invalid status '{}'", status),
                None,
            )),
        }
    }
}

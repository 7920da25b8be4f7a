//! Tool-call endpoints.
//!
//! Four read-only tools for agent clients, exposed as plain JSON routes:
//! `GET /tools` lists them and `POST /tools/:name` invokes one with a JSON
//! arguments object.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::handlers::{page_bounds, parse_id, slice_bounds};
use crate::state::AppState;

/// Name and description of one tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
}

pub const TOOLS: [ToolDescriptor; 4] = [
    ToolDescriptor {
        name: "list_documents",
        description: concat!(
            "List stored documents, newest first. ",
            "Arguments: limit (1-100, default 20), offset (default 0)."
        ),
    },
    ToolDescriptor {
        name: "get_document_info",
        description: "Get the full metadata record of a document. Arguments: document_id.",
    },
    ToolDescriptor {
        name: "read_document_content",
        description: concat!(
            "Read the converted text of a document, optionally a character window. ",
            "Arguments: document_id, offset, limit."
        ),
    },
    ToolDescriptor {
        name: "get_document_outline",
        description: concat!(
            "Get the heading outline of a document with character offsets usable for ",
            "read_document_content. Arguments: document_id."
        ),
    },
];

#[derive(Debug, Default, Deserialize)]
struct ListArgs {
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DocumentArgs {
    document_id: String,
}

#[derive(Debug, Deserialize)]
struct ReadArgs {
    document_id: String,
    offset: Option<i64>,
    limit: Option<i64>,
}

fn parse_args<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::validation(format!("invalid tool arguments: {e}")))?
    };
    if !value.is_object() {
        return Err(ApiError::validation("tool arguments must be a JSON object"));
    }
    serde_json::from_value(value)
        .map_err(|e| ApiError::validation(format!("invalid tool arguments: {e}")))
}

pub async fn list_tools() -> Json<Value> {
    Json(json!({ "tools": TOOLS }))
}

pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    tracing::debug!(tool = %name, "tool call");
    let result = match name.as_str() {
        "list_documents" => {
            let args: ListArgs = parse_args(&body)?;
            let (limit, offset) =
                page_bounds(args.limit, args.offset, state.config.default_page_size)?;
            let list = state.service.list(limit, offset).await?;
            to_value(&list.summaries())?
        }
        "get_document_info" => {
            let args: DocumentArgs = parse_args(&body)?;
            let record = state.service.get(&parse_id(&args.document_id)?).await?;
            to_value(&record)?
        }
        "read_document_content" => {
            let args: ReadArgs = parse_args(&body)?;
            let id = parse_id(&args.document_id)?;
            let (offset, limit) = slice_bounds(args.offset, args.limit)?;
            let slice = state.service.read_content(&id, offset, limit).await?;
            json!({ "text": slice.to_tool_text() })
        }
        "get_document_outline" => {
            let args: DocumentArgs = parse_args(&body)?;
            let outline = state.service.outline(&parse_id(&args.document_id)?).await?;
            to_value(&outline)?
        }
        other => return Err(ApiError::NotFound(format!("unknown tool: {other}"))),
    };
    Ok(Json(result))
}

fn to_value<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{body_json, get, test_app, test_app_with, upload, FixedConverter};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use dfab_types::DocumentId;
    use tower::util::ServiceExt;

    fn call(name: &str, args: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/tools/{name}"))
            .header("content-type", "application/json")
            .body(Body::from(args.to_string()))
            .unwrap()
    }

    async fn create(app: &Router, name: &str) -> String {
        let response = app
            .clone()
            .oneshot(upload("POST", "/api/documents", name, "application/pdf", b"x", None))
            .await
            .unwrap();
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    // -----------------------------------------------------------------------
    // Discovery
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn lists_four_tools() {
        let body = body_json(test_app().oneshot(get("/tools")).await.unwrap()).await;
        let names: Vec<&str> = body["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            [
                "list_documents",
                "get_document_info",
                "read_document_content",
                "get_document_outline"
            ]
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let response = test_app().oneshot(call("delete_everything", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // -----------------------------------------------------------------------
    // Tools
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn list_documents_returns_summaries() {
        let app = test_app();
        create(&app, "a.pdf").await;
        create(&app, "b.pdf").await;

        let body = body_json(app.clone().oneshot(call("list_documents", "")).await.unwrap()).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["limit"], 20);
        let first = body["items"][0].as_object().unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.contains_key("id"));
        assert!(first.contains_key("filename"));

        let paged = app
            .oneshot(call("list_documents", r#"{"limit": 1, "offset": 1}"#))
            .await
            .unwrap();
        let paged = body_json(paged).await;
        assert_eq!(paged["items"].as_array().unwrap().len(), 1);
        assert_eq!(paged["offset"], 1);
    }

    #[tokio::test]
    async fn get_document_info() {
        let app = test_app();
        let id = create(&app, "info.pdf").await;
        let body = body_json(
            app.oneshot(call("get_document_info", &format!(r#"{{"document_id": "{id}"}}"#)))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["filename"], "info.pdf");
        assert_eq!(body["metadata"], json!({}));
    }

    #[tokio::test]
    async fn read_content_full_and_partial() {
        let app = test_app();
        let id = create(&app, "a.pdf").await;

        let full = body_json(
            app.clone()
                .oneshot(call("read_document_content", &format!(r#"{{"document_id": "{id}"}}"#)))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(full["text"], "# Converted markdown");

        let part = body_json(
            app.oneshot(call(
                "read_document_content",
                &format!(r#"{{"document_id": "{id}", "offset": 2, "limit": 9}}"#),
            ))
            .await
            .unwrap(),
        )
        .await;
        assert_eq!(
            part["text"],
            "Converted\n\n---\n[offset=2 length=9 total=20]"
        );
    }

    #[tokio::test]
    async fn outline_tool() {
        let app = test_app_with(FixedConverter("# A\n## B\n# C"), 1024 * 1024);
        let id = create(&app, "a.pdf").await;
        let body = body_json(
            app.oneshot(call("get_document_outline", &format!(r#"{{"document_id": "{id}"}}"#)))
                .await
                .unwrap(),
        )
        .await;
        let sections = body["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0]["length"], 9);
        assert_eq!(body["total_length"], 12);
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let args = format!(r#"{{"document_id": "{}"}}"#, DocumentId::new());
        for tool in ["get_document_info", "read_document_content", "get_document_outline"] {
            let response = test_app().oneshot(call(tool, &args)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{tool}");
            let body = body_json(response).await;
            assert!(body["detail"].as_str().unwrap().contains("not found"));
        }
    }

    #[tokio::test]
    async fn malformed_arguments_are_rejected() {
        let app = test_app();
        for (tool, args) in [
            ("get_document_info", "{}"),
            ("get_document_info", r#"{"document_id": "nope"}"#),
            ("get_document_info", "not json"),
            ("list_documents", "[1, 2]"),
            ("list_documents", r#"{"limit": 0}"#),
            ("read_document_content", r#"{"document_id": "x", "offset": -1}"#),
        ] {
            let response = app.clone().oneshot(call(tool, args)).await.unwrap();
            assert_eq!(
                response.status(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "{tool} {args}"
            );
        }
    }
}

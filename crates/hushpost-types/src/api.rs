use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Post, PublicPost, Reply};

// -- JWT Claims --

/// Session claims issued on login and checked by the owner-route middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Envelope --

/// Every JSON response is `{ success, message?, ...payload }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn ok(payload: T) -> Self {
        Self { success: true, message: None, payload }
    }

    pub fn ok_with_message(message: impl Into<String>, payload: T) -> Self {
        Self { success: true, message: Some(message.into()), payload }
    }
}

impl Envelope<Empty> {
    pub fn message(message: impl Into<String>) -> Self {
        Self::ok_with_message(message, Empty {})
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()), payload: Empty {} }
    }
}

/// Payload for envelopes that carry nothing but `success` and `message`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Empty {}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    /// Username or email.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleMessagesRequest {
    pub is_accepting_messages: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TogglePayload {
    pub is_accepting_messages: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostPayload {
    pub post: Post,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostsPayload {
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicPostPayload {
    pub post: PublicPost,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserPostsPayload {
    pub username: String,
    pub posts: Vec<PublicPost>,
}

/// Raw feed query. Values are parsed leniently so a garbage `page` falls back
/// to the default instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

// -- Replies --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendReplyRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub reply: Reply,
}

// -- Suggestions --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    #[serde(default)]
    pub post_content: String,
    #[serde(default)]
    pub user_draft: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_flattens_payload() {
        let body = serde_json::to_value(Envelope::ok(TogglePayload { is_accepting_messages: false })).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "isAcceptingMessages": false }));
    }

    #[test]
    fn failure_envelope_has_message_only() {
        let body = serde_json::to_value(Envelope::failure("Post not found")).unwrap();
        assert_eq!(body, serde_json::json!({ "success": false, "message": "Post not found" }));
    }

    #[test]
    fn suggest_request_fields_default_to_empty() {
        let req: SuggestRequest = serde_json::from_str("{}").unwrap();
        assert!(req.post_content.is_empty());
        assert!(req.user_draft.is_empty());
    }
}

//! Conversation and messaging tools.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    Guidance, ToolError, ToolOutput, ToolResult, array_at, resolve_location, send, str_at,
    strip_nulls, unwrap_key, wire_str,
};
use crate::client::{ApiRequest, Transport};

pub const CONVERSATIONS_API_VERSION: &str = "2021-04-15";
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

const SEND_VALIDATION: &str = "the contact needs a phone (SMS) or email (Email) on file, \
     phone numbers use E.164, and scheduledTimestamp is epoch seconds.";

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    All,
    Read,
    Unread,
    Starred,
    Recents,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchConversationsParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    #[schemars(description = "Only conversations with this contact")]
    pub contact_id: Option<String>,
    #[schemars(description = "Free-text search")]
    pub query: Option<String>,
    pub status: Option<ConversationStatus>,
    #[schemars(description = "Only conversations assigned to this user")]
    pub assigned_to: Option<String>,
    #[schemars(description = "Maximum results (default: 20)")]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationIdParams {
    #[schemars(description = "Conversation ID")]
    pub conversation_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationParams {
    pub location_id: Option<String>,
    #[schemars(description = "Contact to open the conversation with")]
    pub contact_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConversationParams {
    #[schemars(description = "Conversation ID")]
    pub conversation_id: String,
    pub location_id: Option<String>,
    #[schemars(description = "Set to 0 to mark as read")]
    pub unread_count: Option<u32>,
    pub starred: Option<bool>,
    pub feedback: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetMessagesParams {
    #[schemars(description = "Conversation ID")]
    pub conversation_id: String,
    #[schemars(description = "Maximum messages to return")]
    pub limit: Option<u32>,
    #[schemars(description = "Page backwards from this message ID")]
    pub last_message_id: Option<String>,
    #[schemars(description = "Message type filter, e.g. TYPE_SMS,TYPE_EMAIL")]
    #[serde(rename = "type")]
    pub message_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageIdParams {
    #[schemars(description = "Message ID")]
    pub message_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendSmsParams {
    #[schemars(description = "Recipient contact ID")]
    pub contact_id: String,
    #[schemars(description = "Message text")]
    pub message: String,
    #[schemars(description = "Sending number (E.164); defaults to the location's number")]
    pub from_number: Option<String>,
    #[schemars(description = "Override recipient number (E.164)")]
    pub to_number: Option<String>,
    #[schemars(description = "Send later, as epoch seconds")]
    pub scheduled_timestamp: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailParams {
    #[schemars(description = "Recipient contact ID")]
    pub contact_id: String,
    #[schemars(description = "Subject line")]
    pub subject: String,
    #[schemars(description = "HTML body")]
    pub html: Option<String>,
    #[schemars(description = "Plain-text body, used when html is absent")]
    pub message: Option<String>,
    #[schemars(description = "Sender address")]
    pub email_from: Option<String>,
    pub email_cc: Option<Vec<String>>,
    pub email_bcc: Option<Vec<String>>,
    #[schemars(description = "Attachment URLs")]
    pub attachments: Option<Vec<String>>,
    #[schemars(description = "Message ID to thread the reply under")]
    pub reply_message_id: Option<String>,
    #[schemars(description = "Send later, as epoch seconds")]
    pub scheduled_timestamp: Option<i64>,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Conversation tools.
    ConversationTools, family = "conversations";
    "search_conversations" => search_conversations(SearchConversationsParams):
        "Search conversations. Default limit: 20.";
    "get_conversation" => get_conversation(ConversationIdParams):
        "Get a conversation by ID";
    "create_conversation" => create_conversation(CreateConversationParams):
        "Start a conversation with a contact";
    "update_conversation" => update_conversation(UpdateConversationParams):
        "Update a conversation (read state, starred)";
    "delete_conversation" => delete_conversation(ConversationIdParams):
        "Delete a conversation";
    "get_messages" => get_messages(GetMessagesParams):
        "List messages in a conversation";
    "get_message" => get_message(MessageIdParams):
        "Get a single message by ID";
    "send_sms" => send_sms(SendSmsParams):
        "Send an SMS to a contact";
    "send_email" => send_email(SendEmailParams):
        "Send an email to a contact";
    "cancel_scheduled_message" => cancel_scheduled_message(MessageIdParams):
        "Cancel a scheduled SMS or email before it is sent";
}

fn conversations_request(request: ApiRequest) -> ApiRequest {
    request.version(CONVERSATIONS_API_VERSION)
}

fn sent_output(channel: &str, contact_id: &str, response: Value) -> ToolOutput {
    let message_id = str_at(&response, &["messageId", "emailMessageId"])
        .unwrap_or("unknown")
        .to_string();
    ToolOutput::new(format!(
        "{channel} sent to contact {contact_id} (message ID: {message_id})"
    ))
    .with("result", response)
}

impl<T: Transport + 'static> ConversationTools<T> {
    pub async fn search_conversations(
        &self,
        params: SearchConversationsParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("search_conversations", "search conversations", "location");

        let location_id = resolve_location(&self.ctx, "search_conversations", params.location_id)?;
        let status = params.status.as_ref().map(wire_str);
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            conversations_request(
                ApiRequest::get("/conversations/search")
                    .query("locationId", &location_id)
                    .query("limit", params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
                    .query_opt("contactId", params.contact_id.as_deref())
                    .query_opt("query", params.query.as_deref())
                    .query_opt("status", status)
                    .query_opt("assignedTo", params.assigned_to.as_deref()),
            ),
        )
        .await?;

        let conversations = array_at(&response, "conversations");
        let total = response
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(conversations.len() as u64);

        Ok(ToolOutput::new(format!("Found {} conversations", conversations.len()))
            .with("total", total)
            .with("conversations", conversations))
    }

    pub async fn get_conversation(&self, params: ConversationIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_conversation", "get the conversation", "conversation")
            .lookup("search_conversations");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.conversation_id),
            conversations_request(ApiRequest::get(format!(
                "/conversations/{}",
                params.conversation_id
            ))),
        )
        .await?;

        Ok(ToolOutput::new(format!("Retrieved conversation {}", params.conversation_id))
            .with("conversation", response))
    }

    pub async fn create_conversation(
        &self,
        params: CreateConversationParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_conversation", "start the conversation", "contact")
            .lookup("search_contacts")
            .conflict("A conversation with this contact already exists; use search_conversations with contactId.");

        let location_id = resolve_location(&self.ctx, "create_conversation", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            conversations_request(ApiRequest::post("/conversations/").json(json!({
                "locationId": location_id,
                "contactId": params.contact_id,
            }))),
        )
        .await?;
        let conversation = unwrap_key(response, "conversation");
        let id = str_at(&conversation, &["id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!(
            "Conversation started with contact {} (ID: {id})",
            params.contact_id
        ))
        .with("conversation", conversation))
    }

    pub async fn update_conversation(
        &self,
        params: UpdateConversationParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_conversation", "update the conversation", "conversation")
            .lookup("search_conversations");

        let location_id = resolve_location(&self.ctx, "update_conversation", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "unreadCount": params.unread_count,
            "starred": params.starred,
            "feedback": params.feedback,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.conversation_id),
            conversations_request(
                ApiRequest::put(format!("/conversations/{}", params.conversation_id))
                    .json(strip_nulls(body)),
            ),
        )
        .await?;

        Ok(ToolOutput::new(format!("Conversation {} updated", params.conversation_id))
            .with("conversation", unwrap_key(response, "conversation")))
    }

    pub async fn delete_conversation(
        &self,
        params: ConversationIdParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("delete_conversation", "delete the conversation", "conversation")
            .lookup("search_conversations");

        send(
            &self.ctx,
            &GUIDE,
            Some(&params.conversation_id),
            conversations_request(ApiRequest::delete(format!(
                "/conversations/{}",
                params.conversation_id
            ))),
        )
        .await?;

        Ok(ToolOutput::new(format!("Conversation {} deleted", params.conversation_id))
            .with("conversationId", params.conversation_id))
    }

    pub async fn get_messages(&self, params: GetMessagesParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_messages", "list messages", "conversation")
            .lookup("search_conversations");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.conversation_id),
            conversations_request(
                ApiRequest::get(format!("/conversations/{}/messages", params.conversation_id))
                    .query_opt("limit", params.limit)
                    .query_opt("lastMessageId", params.last_message_id.as_deref())
                    .query_opt("type", params.message_type.as_deref()),
            ),
        )
        .await?;

        // The page object sits under `messages`, with the list nested again.
        let page = response.get("messages").cloned().unwrap_or(Value::Null);
        let messages = if page.is_array() {
            page.as_array().cloned().unwrap_or_default()
        } else {
            array_at(&page, "messages")
        };
        let next_page = page.get("nextPage").and_then(Value::as_bool).unwrap_or(false);

        let mut output = ToolOutput::new(format!(
            "Found {} messages in conversation {}",
            messages.len(),
            params.conversation_id
        ))
        .with("nextPage", next_page)
        .with("messages", messages);
        if let Some(last) = str_at(&page, &["lastMessageId"]) {
            output = output.with("lastMessageId", last);
        }
        Ok(output)
    }

    pub async fn get_message(&self, params: MessageIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_message", "get the message", "message").lookup("get_messages");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.message_id),
            conversations_request(ApiRequest::get(format!(
                "/conversations/messages/{}",
                params.message_id
            ))),
        )
        .await?;

        Ok(ToolOutput::new(format!("Retrieved message {}", params.message_id))
            .with("messageData", unwrap_key(response, "message")))
    }

    pub async fn send_sms(&self, params: SendSmsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("send_sms", "send the SMS", "contact")
            .lookup("search_contacts")
            .validation(SEND_VALIDATION);

        let body = json!({
            "type": "SMS",
            "contactId": params.contact_id,
            "message": params.message,
            "fromNumber": params.from_number,
            "toNumber": params.to_number,
            "scheduledTimestamp": params.scheduled_timestamp,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            conversations_request(ApiRequest::post("/conversations/messages").json(strip_nulls(body))),
        )
        .await?;

        Ok(sent_output("SMS", &params.contact_id, response))
    }

    pub async fn send_email(&self, params: SendEmailParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("send_email", "send the email", "contact")
            .lookup("search_contacts")
            .validation(SEND_VALIDATION);

        if params.html.is_none() && params.message.is_none() {
            return Err(ToolError::invalid("send_email", "provide html or message"));
        }
        let body = json!({
            "type": "Email",
            "contactId": params.contact_id,
            "subject": params.subject,
            "html": params.html,
            "message": params.message,
            "emailFrom": params.email_from,
            "emailCc": params.email_cc,
            "emailBcc": params.email_bcc,
            "attachments": params.attachments,
            "replyMessageId": params.reply_message_id,
            "scheduledTimestamp": params.scheduled_timestamp,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            conversations_request(ApiRequest::post("/conversations/messages").json(strip_nulls(body))),
        )
        .await?;

        Ok(sent_output("Email", &params.contact_id, response))
    }

    pub async fn cancel_scheduled_message(
        &self,
        params: MessageIdParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("cancel_scheduled_message", "cancel the scheduled message", "scheduled message")
                .lookup("get_messages");

        send(
            &self.ctx,
            &GUIDE,
            Some(&params.message_id),
            conversations_request(ApiRequest::delete(format!(
                "/conversations/messages/{}/schedule",
                params.message_id
            ))),
        )
        .await?;

        Ok(ToolOutput::new(format!("Scheduled message {} cancelled", params.message_id))
            .with("messageId", params.message_id))
    }
}

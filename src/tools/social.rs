//! Social planner tools: posts, accounts, categories, tags and OAuth.
//!
//! The social endpoints nest the location in the path and wrap payloads in
//! `results`. Their list endpoints take paging values as strings.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    Guidance, ToolError, ToolOutput, ToolResult, array_at, resolve_location, send, str_at,
    strip_nulls, unwrap_key, wire_str,
};
use crate::client::{ApiRequest, Transport};

pub const DEFAULT_SKIP: &str = "0";
pub const DEFAULT_LIMIT: &str = "10";

const POST_VALIDATION: &str = "accountIds must come from get_social_accounts, scheduled posts need \
     a future scheduleDate, and media URLs must be publicly reachable.";

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostFilter {
    Recent,
    All,
    Scheduled,
    Draft,
    Failed,
    InReview,
    Published,
    InProgress,
    Deleted,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Post,
    Story,
    Reel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Google,
    Facebook,
    Instagram,
    Linkedin,
    Twitter,
    Tiktok,
    TiktokBusiness,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostMedia {
    #[schemars(description = "Public URL of the image or video")]
    pub url: String,
    #[schemars(description = "MIME type, e.g. image/png")]
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchPostsParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    #[serde(rename = "type")]
    pub filter: Option<PostFilter>,
    #[schemars(description = "Only posts for these account IDs")]
    pub accounts: Option<Vec<String>>,
    #[schemars(description = "Range start (ISO-8601)")]
    pub from_date: Option<String>,
    #[schemars(description = "Range end (ISO-8601)")]
    pub to_date: Option<String>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub skip: Option<u32>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostParams {
    pub location_id: Option<String>,
    #[schemars(description = "Social account IDs to publish to")]
    pub account_ids: Vec<String>,
    #[schemars(description = "Post text")]
    pub summary: String,
    pub media: Option<Vec<PostMedia>>,
    #[schemars(description = "draft, scheduled or published (default: draft)")]
    pub status: Option<PostStatus>,
    #[schemars(description = "When to publish (ISO-8601); required for scheduled posts")]
    pub schedule_date: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<PostType>,
    pub tags: Option<Vec<String>>,
    pub category_id: Option<String>,
    #[schemars(description = "User creating the post")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostIdParams {
    pub location_id: Option<String>,
    #[schemars(description = "Post ID")]
    pub post_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostParams {
    pub location_id: Option<String>,
    #[schemars(description = "Post ID")]
    pub post_id: String,
    pub account_ids: Option<Vec<String>>,
    pub summary: Option<String>,
    pub media: Option<Vec<PostMedia>>,
    pub status: Option<PostStatus>,
    pub schedule_date: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<PostType>,
    pub tags: Option<Vec<String>>,
    pub category_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteParams {
    pub location_id: Option<String>,
    #[schemars(description = "Post IDs to delete")]
    pub post_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SocialLocationParams {
    pub location_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountParams {
    pub location_id: Option<String>,
    #[schemars(description = "Connected account ID")]
    pub account_id: String,
    pub company_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchLabelsParams {
    pub location_id: Option<String>,
    #[schemars(description = "Filter by name")]
    pub search_text: Option<String>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub skip: Option<u32>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartOauthParams {
    pub location_id: Option<String>,
    pub platform: Platform,
    #[schemars(description = "User starting the connection")]
    pub user_id: String,
    #[schemars(description = "Reconnect an expired account")]
    pub reconnect: Option<bool>,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Social planner tools.
    SocialMediaTools, family = "social";
    "search_social_posts" => search_social_posts(SearchPostsParams):
        "Search social posts. Defaults: skip 0, limit 10.";
    "create_social_post" => create_social_post(CreatePostParams):
        "Create, schedule or publish a social post";
    "get_social_post" => get_social_post(PostIdParams):
        "Get a social post by ID";
    "update_social_post" => update_social_post(UpdatePostParams):
        "Update a social post";
    "delete_social_post" => delete_social_post(PostIdParams):
        "Delete a social post";
    "bulk_delete_social_posts" => bulk_delete_social_posts(BulkDeleteParams):
        "Delete several social posts at once";
    "get_social_accounts" => get_social_accounts(SocialLocationParams):
        "List connected social accounts and groups";
    "delete_social_account" => delete_social_account(DeleteAccountParams):
        "Disconnect a social account";
    "get_social_categories" => get_social_categories(SearchLabelsParams):
        "List post categories";
    "get_social_tags" => get_social_tags(SearchLabelsParams):
        "List post tags";
    "start_social_oauth" => start_social_oauth(StartOauthParams):
        "Start the OAuth flow to connect a social platform";
}

fn results(response: Value) -> Value {
    unwrap_key(response, "results")
}

fn paging(skip: Option<u32>, limit: Option<u32>) -> (String, String) {
    (
        skip.map(|s| s.to_string()).unwrap_or_else(|| DEFAULT_SKIP.to_string()),
        limit.map(|l| l.to_string()).unwrap_or_else(|| DEFAULT_LIMIT.to_string()),
    )
}

impl<T: Transport + 'static> SocialMediaTools<T> {
    pub async fn search_social_posts(&self, params: SearchPostsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("search_social_posts", "search social posts", "location")
            .validation("fromDate and toDate are ISO-8601 and type is a known post filter.");

        let location_id = resolve_location(&self.ctx, "search_social_posts", params.location_id)?;
        let (skip, limit) = paging(params.skip, params.limit);
        let body = json!({
            "type": params.filter,
            "accounts": params.accounts.map(|ids| ids.join(",")),
            "fromDate": params.from_date,
            "toDate": params.to_date,
            "skip": skip,
            "limit": limit,
            "includeUsers": "true",
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::post(format!("/social-media-posting/{location_id}/posts/list"))
                .json(strip_nulls(body)),
        )
        .await?;
        let payload = results(response);
        let posts = array_at(&payload, "posts");
        let count = payload
            .get("count")
            .and_then(Value::as_u64)
            .unwrap_or(posts.len() as u64);

        Ok(ToolOutput::new(format!("Found {} social posts", posts.len()))
            .with("total", count)
            .with("posts", posts))
    }

    pub async fn create_social_post(&self, params: CreatePostParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_social_post", "create the post", "social account")
            .lookup("get_social_accounts")
            .validation(POST_VALIDATION);

        if matches!(params.status, Some(PostStatus::Scheduled)) && params.schedule_date.is_none() {
            return Err(ToolError::invalid(
                "create_social_post",
                "scheduled posts need a scheduleDate",
            ));
        }
        let location_id = resolve_location(&self.ctx, "create_social_post", params.location_id)?;
        let body = json!({
            "accountIds": params.account_ids,
            "summary": params.summary,
            "media": params.media,
            "status": params.status.unwrap_or(PostStatus::Draft),
            "scheduleDate": params.schedule_date,
            "type": params.post_type.unwrap_or(PostType::Post),
            "tags": params.tags,
            "categoryId": params.category_id,
            "userId": params.user_id,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            None,
            ApiRequest::post(format!("/social-media-posting/{location_id}/posts")).json(strip_nulls(body)),
        )
        .await?;
        let post = unwrap_key(results(response), "post");
        let id = str_at(&post, &["_id", "id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!(
            "Social post created for {} accounts (ID: {id})",
            params.account_ids.len()
        ))
        .with("post", post))
    }

    pub async fn get_social_post(&self, params: PostIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_social_post", "get the post", "post")
            .lookup("search_social_posts");

        let location_id = resolve_location(&self.ctx, "get_social_post", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.post_id),
            ApiRequest::get(format!(
                "/social-media-posting/{location_id}/posts/{}",
                params.post_id
            )),
        )
        .await?;

        Ok(ToolOutput::new(format!("Retrieved social post {}", params.post_id))
            .with("post", unwrap_key(results(response), "post")))
    }

    pub async fn update_social_post(&self, params: UpdatePostParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_social_post", "update the post", "post")
            .lookup("search_social_posts")
            .validation(POST_VALIDATION);

        let location_id = resolve_location(&self.ctx, "update_social_post", params.location_id)?;
        let body = json!({
            "accountIds": params.account_ids,
            "summary": params.summary,
            "media": params.media,
            "status": params.status,
            "scheduleDate": params.schedule_date,
            "type": params.post_type,
            "tags": params.tags,
            "categoryId": params.category_id,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.post_id),
            ApiRequest::put(format!(
                "/social-media-posting/{location_id}/posts/{}",
                params.post_id
            ))
            .json(strip_nulls(body)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Social post {} updated", params.post_id))
            .with("post", unwrap_key(results(response), "post")))
    }

    pub async fn delete_social_post(&self, params: PostIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("delete_social_post", "delete the post", "post")
            .lookup("search_social_posts");

        let location_id = resolve_location(&self.ctx, "delete_social_post", params.location_id)?;
        send(
            &self.ctx,
            &GUIDE,
            Some(&params.post_id),
            ApiRequest::delete(format!(
                "/social-media-posting/{location_id}/posts/{}",
                params.post_id
            )),
        )
        .await?;

        Ok(ToolOutput::new(format!("Social post {} deleted", params.post_id))
            .with("postId", params.post_id))
    }

    pub async fn bulk_delete_social_posts(
        &self,
        params: BulkDeleteParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("bulk_delete_social_posts", "delete the posts", "location")
            .validation("postIds must be a non-empty list of post IDs.");

        if params.post_ids.is_empty() {
            return Err(ToolError::invalid("bulk_delete_social_posts", "postIds is empty"));
        }
        let location_id =
            resolve_location(&self.ctx, "bulk_delete_social_posts", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::post(format!("/social-media-posting/{location_id}/posts/bulk-delete"))
                .json(json!({"postIds": params.post_ids})),
        )
        .await?;
        let payload = results(response);
        let deleted = payload
            .get("deletedCount")
            .and_then(Value::as_u64)
            .unwrap_or(params.post_ids.len() as u64);

        Ok(ToolOutput::new(format!("Deleted {deleted} social posts"))
            .with("deletedCount", deleted))
    }

    pub async fn get_social_accounts(&self, params: SocialLocationParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_social_accounts", "list social accounts", "location");

        let location_id = resolve_location(&self.ctx, "get_social_accounts", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get(format!("/social-media-posting/{location_id}/accounts")),
        )
        .await?;
        let payload = results(response);
        let accounts = array_at(&payload, "accounts");
        let groups = array_at(&payload, "groups");

        Ok(ToolOutput::new(format!(
            "Found {} social accounts in {} groups",
            accounts.len(),
            groups.len()
        ))
        .with("accounts", accounts)
        .with("groups", groups))
    }

    pub async fn delete_social_account(&self, params: DeleteAccountParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("delete_social_account", "disconnect the account", "social account")
            .lookup("get_social_accounts");

        let location_id = resolve_location(&self.ctx, "delete_social_account", params.location_id)?;
        let company_id = params
            .company_id
            .or_else(|| self.ctx.default_company_id().map(str::to_string));
        send(
            &self.ctx,
            &GUIDE,
            Some(&params.account_id),
            ApiRequest::delete(format!(
                "/social-media-posting/{location_id}/accounts/{}",
                params.account_id
            ))
            .query_opt("companyId", company_id.as_deref())
            .query_opt("userId", params.user_id.as_deref()),
        )
        .await?;

        Ok(ToolOutput::new(format!("Social account {} disconnected", params.account_id))
            .with("accountId", params.account_id))
    }

    pub async fn get_social_categories(&self, params: SearchLabelsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_social_categories", "list categories", "location");

        let location_id = resolve_location(&self.ctx, "get_social_categories", params.location_id)?;
        let (skip, limit) = paging(params.skip, params.limit);
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get(format!("/social-media-posting/{location_id}/categories"))
                .query_opt("searchText", params.search_text.as_deref())
                .query("skip", skip)
                .query("limit", limit),
        )
        .await?;
        let categories = array_at(&results(response), "categories");

        Ok(ToolOutput::new(format!("Found {} categories", categories.len()))
            .with("categories", categories))
    }

    pub async fn get_social_tags(&self, params: SearchLabelsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_social_tags", "list tags", "location");

        let location_id = resolve_location(&self.ctx, "get_social_tags", params.location_id)?;
        let (skip, limit) = paging(params.skip, params.limit);
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get(format!("/social-media-posting/{location_id}/tags"))
                .query_opt("searchText", params.search_text.as_deref())
                .query("skip", skip)
                .query("limit", limit),
        )
        .await?;
        let tags = array_at(&results(response), "tags");

        Ok(ToolOutput::new(format!("Found {} tags", tags.len())).with("tags", tags))
    }

    pub async fn start_social_oauth(&self, params: StartOauthParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("start_social_oauth", "start the OAuth flow", "location");

        let location_id = resolve_location(&self.ctx, "start_social_oauth", params.location_id)?;
        let platform = wire_str(&params.platform);
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get(format!("/social-media-posting/oauth/{platform}/start"))
                .query("locationId", &location_id)
                .query("userId", &params.user_id)
                .query_opt("reconnect", params.reconnect),
        )
        .await?;

        Ok(ToolOutput::new(format!(
            "OAuth flow started for {platform}; open the returned URL to authorize"
        ))
        .with("platform", platform)
        .with("oauth", response))
    }
}

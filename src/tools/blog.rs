//! Blog tools: posts, sites, authors, categories and slug checks.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    Guidance, ToolOutput, ToolResult, array_at, resolve_location, send, str_at, strip_nulls,
    unwrap_key, wire_str,
};
use crate::client::{ApiRequest, Transport};
use crate::convert::now_iso;

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_OFFSET: u32 = 0;

const DUPLICATE_SLUG: &str = "The URL slug is already used by another post. \
     Pick a different urlSlug and confirm it with check_url_slug.";
const POST_VALIDATION: &str = "blogId must come from get_blog_sites, author and categories \
     must be IDs from get_blog_authors and get_blog_categories, and urlSlug must be lowercase with dashes.";

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlogPostStatus {
    Draft,
    Published,
    Scheduled,
    Archived,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogPostParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    #[schemars(description = "Blog site ID")]
    pub blog_id: String,
    pub title: String,
    #[schemars(description = "Post body as HTML")]
    pub content: String,
    pub description: String,
    pub image_url: String,
    pub image_alt_text: String,
    pub url_slug: String,
    #[schemars(description = "Author ID")]
    pub author: String,
    #[schemars(description = "Category IDs")]
    pub categories: Vec<String>,
    pub tags: Option<Vec<String>>,
    pub canonical_link: Option<String>,
    #[schemars(description = "DRAFT, PUBLISHED, SCHEDULED or ARCHIVED (default: DRAFT)")]
    pub status: Option<BlogPostStatus>,
    #[schemars(description = "Publish time (ISO-8601, default: now)")]
    pub published_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogPostParams {
    pub location_id: Option<String>,
    #[schemars(description = "Post ID")]
    pub post_id: String,
    pub blog_id: String,
    pub title: Option<String>,
    #[schemars(description = "Post body as HTML")]
    pub content: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub image_alt_text: Option<String>,
    pub url_slug: Option<String>,
    pub author: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub canonical_link: Option<String>,
    pub status: Option<BlogPostStatus>,
    pub published_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetBlogPostsParams {
    pub location_id: Option<String>,
    #[schemars(description = "Blog site ID")]
    pub blog_id: String,
    pub search_term: Option<String>,
    pub status: Option<BlogPostStatus>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetBlogSitesParams {
    pub location_id: Option<String>,
    pub search_term: Option<String>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPageParams {
    pub location_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckUrlSlugParams {
    pub location_id: Option<String>,
    #[schemars(description = "Slug to check")]
    pub url_slug: String,
    #[schemars(description = "Post being edited, so its own slug is not reported")]
    pub post_id: Option<String>,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Blog tools.
    BlogTools, family = "blog";
    "create_blog_post" => create_blog_post(CreateBlogPostParams):
        "Create a blog post. Status defaults to DRAFT and publishedAt to now.";
    "update_blog_post" => update_blog_post(UpdateBlogPostParams):
        "Update a blog post";
    "get_blog_posts" => get_blog_posts(GetBlogPostsParams):
        "List posts of a blog site";
    "get_blog_sites" => get_blog_sites(GetBlogSitesParams):
        "List blog sites";
    "get_blog_authors" => get_blog_authors(BlogPageParams):
        "List blog authors";
    "get_blog_categories" => get_blog_categories(BlogPageParams):
        "List blog categories";
    "check_url_slug" => check_url_slug(CheckUrlSlugParams):
        "Check whether a URL slug is already taken";
}

impl<T: Transport + 'static> BlogTools<T> {
    pub async fn create_blog_post(&self, params: CreateBlogPostParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_blog_post", "create the blog post", "blog")
            .lookup("get_blog_sites")
            .conflict(DUPLICATE_SLUG)
            .validation(POST_VALIDATION);

        let location_id = resolve_location(&self.ctx, "create_blog_post", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "blogId": params.blog_id,
            "title": params.title,
            "rawHTML": params.content,
            "description": params.description,
            "imageUrl": params.image_url,
            "imageAltText": params.image_alt_text,
            "urlSlug": params.url_slug,
            "author": params.author,
            "categories": params.categories,
            "tags": params.tags,
            "canonicalLink": params.canonical_link,
            "status": params.status.unwrap_or(BlogPostStatus::Draft),
            "publishedAt": params.published_at.unwrap_or_else(now_iso),
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.blog_id),
            ApiRequest::post("/blogs/posts").json(strip_nulls(body)),
        )
        .await?;
        let post = unwrap_key(response, "data");
        let id = str_at(&post, &["_id", "id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!("Blog post '{}' created (ID: {id})", params.title))
            .with("blogPost", post))
    }

    pub async fn update_blog_post(&self, params: UpdateBlogPostParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_blog_post", "update the blog post", "blog post")
            .lookup("get_blog_posts")
            .conflict(DUPLICATE_SLUG)
            .validation(POST_VALIDATION);

        let location_id = resolve_location(&self.ctx, "update_blog_post", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "blogId": params.blog_id,
            "title": params.title,
            "rawHTML": params.content,
            "description": params.description,
            "imageUrl": params.image_url,
            "imageAltText": params.image_alt_text,
            "urlSlug": params.url_slug,
            "author": params.author,
            "categories": params.categories,
            "tags": params.tags,
            "canonicalLink": params.canonical_link,
            "status": params.status,
            "publishedAt": params.published_at,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.post_id),
            ApiRequest::put(format!("/blogs/posts/{}", params.post_id)).json(strip_nulls(body)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Blog post {} updated", params.post_id))
            .with("blogPost", unwrap_key(response, "updatedBlogPost")))
    }

    pub async fn get_blog_posts(&self, params: GetBlogPostsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_blog_posts", "list blog posts", "blog")
            .lookup("get_blog_sites");

        let location_id = resolve_location(&self.ctx, "get_blog_posts", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.blog_id),
            ApiRequest::get("/blogs/posts/all")
                .query("locationId", &location_id)
                .query("blogId", &params.blog_id)
                .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
                .query("offset", params.offset.unwrap_or(DEFAULT_OFFSET))
                .query_opt("searchTerm", params.search_term.as_deref())
                .query_opt("status", params.status.map(|s| wire_str(&s))),
        )
        .await?;
        let posts = array_at(&response, "blogs");

        Ok(ToolOutput::new(format!("Found {} blog posts", posts.len())).with("posts", posts))
    }

    pub async fn get_blog_sites(&self, params: GetBlogSitesParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_blog_sites", "list blog sites", "location");

        let location_id = resolve_location(&self.ctx, "get_blog_sites", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get("/blogs/site/all")
                .query("locationId", &location_id)
                .query("skip", params.skip.unwrap_or(DEFAULT_OFFSET))
                .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
                .query_opt("searchTerm", params.search_term.as_deref()),
        )
        .await?;
        let sites = array_at(&response, "data");

        Ok(ToolOutput::new(format!("Found {} blog sites", sites.len())).with("sites", sites))
    }

    pub async fn get_blog_authors(&self, params: BlogPageParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_blog_authors", "list blog authors", "location");

        let location_id = resolve_location(&self.ctx, "get_blog_authors", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get("/blogs/authors")
                .query("locationId", &location_id)
                .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
                .query("offset", params.offset.unwrap_or(DEFAULT_OFFSET)),
        )
        .await?;
        let authors = array_at(&response, "authors");

        Ok(ToolOutput::new(format!("Found {} blog authors", authors.len()))
            .with("authors", authors))
    }

    pub async fn get_blog_categories(&self, params: BlogPageParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_blog_categories", "list blog categories", "location");

        let location_id = resolve_location(&self.ctx, "get_blog_categories", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get("/blogs/categories")
                .query("locationId", &location_id)
                .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
                .query("offset", params.offset.unwrap_or(DEFAULT_OFFSET)),
        )
        .await?;
        let categories = array_at(&response, "categories");

        Ok(ToolOutput::new(format!("Found {} blog categories", categories.len()))
            .with("categories", categories))
    }

    pub async fn check_url_slug(&self, params: CheckUrlSlugParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("check_url_slug", "check the URL slug", "location")
            .conflict(DUPLICATE_SLUG);

        let location_id = resolve_location(&self.ctx, "check_url_slug", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.url_slug),
            ApiRequest::get("/blogs/posts/url-slug-exists")
                .query("locationId", &location_id)
                .query("urlSlug", &params.url_slug)
                .query_opt("postId", params.post_id.as_deref()),
        )
        .await?;
        let exists = response
            .get("exists")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let message = if exists {
            format!("URL slug '{}' is already taken", params.url_slug)
        } else {
            format!("URL slug '{}' is available", params.url_slug)
        };

        Ok(ToolOutput::new(message)
            .with("urlSlug", params.url_slug)
            .with("exists", exists)
            .with("available", !exists))
    }
}

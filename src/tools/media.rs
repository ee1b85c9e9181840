//! Media library tools.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    Guidance, ToolOutput, ToolResult, array_at, resolve_location, send, str_at, strip_nulls,
    wire_str,
};
use crate::client::{ApiRequest, Transport};

pub const DEFAULT_LIMIT: u32 = 20;
pub const DEFAULT_OFFSET: u32 = 0;
const ALT_TYPE: &str = "location";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    File,
    Folder,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetMediaFilesParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    #[schemars(description = "file or folder (default: file)")]
    #[serde(rename = "type")]
    pub kind: Option<MediaKind>,
    #[schemars(description = "Search by name")]
    pub query: Option<String>,
    #[schemars(description = "Folder to list (root when omitted)")]
    pub parent_id: Option<String>,
    #[schemars(description = "Sort field (default: createdAt)")]
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[schemars(description = "Maximum results (default: 20)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaOverviewParams {
    pub location_id: Option<String>,
    #[schemars(description = "Folder to show (root when omitted)")]
    pub parent_id: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadMediaParams {
    pub location_id: Option<String>,
    #[schemars(description = "Public URL of the file to import")]
    pub file_url: String,
    #[schemars(description = "Name shown in the media library")]
    pub name: Option<String>,
    #[schemars(description = "Destination folder")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderParams {
    pub location_id: Option<String>,
    pub name: String,
    #[schemars(description = "Parent folder (root when omitted)")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMediaParams {
    pub location_id: Option<String>,
    #[schemars(description = "File or folder ID")]
    pub id: String,
}

tool_module! {
    /// Media library tools.
    MediaTools, family = "media";
    "get_media_files" => get_media_files(GetMediaFilesParams):
        "List media files or folders";
    "get_media_overview" => get_media_overview(MediaOverviewParams):
        "List files and folders of a media folder together";
    "upload_media_file" => upload_media_file(UploadMediaParams):
        "Import a file into the media library from a public URL";
    "create_media_folder" => create_media_folder(CreateFolderParams):
        "Create a media folder";
    "delete_media_file" => delete_media_file(DeleteMediaParams):
        "Delete a media file or folder";
}

fn listing_request(
    location_id: &str,
    kind: MediaKind,
    parent_id: Option<&str>,
    limit: Option<u32>,
) -> ApiRequest {
    ApiRequest::get("/medias/files")
        .query("altId", location_id)
        .query("altType", ALT_TYPE)
        .query("type", wire_str(&kind))
        .query("sortBy", "createdAt")
        .query("sortOrder", "desc")
        .query("limit", limit.unwrap_or(DEFAULT_LIMIT))
        .query("offset", DEFAULT_OFFSET)
        .query_opt("parentId", parent_id)
}

impl<T: Transport + 'static> MediaTools<T> {
    pub async fn get_media_files(&self, params: GetMediaFilesParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_media_files", "list media", "folder")
            .lookup("get_media_overview");

        let location_id = resolve_location(&self.ctx, "get_media_files", params.location_id)?;
        let kind = params.kind.unwrap_or(MediaKind::File);
        let response = send(
            &self.ctx,
            &GUIDE,
            params.parent_id.as_deref(),
            ApiRequest::get("/medias/files")
                .query("altId", &location_id)
                .query("altType", ALT_TYPE)
                .query("type", wire_str(&kind))
                .query("sortBy", params.sort_by.as_deref().unwrap_or("createdAt"))
                .query("sortOrder", wire_str(&params.sort_order.unwrap_or(SortOrder::Desc)))
                .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
                .query("offset", params.offset.unwrap_or(DEFAULT_OFFSET))
                .query_opt("query", params.query.as_deref())
                .query_opt("parentId", params.parent_id.as_deref()),
        )
        .await?;
        let files = array_at(&response, "files");
        let noun = match kind {
            MediaKind::File => "files",
            MediaKind::Folder => "folders",
        };

        Ok(ToolOutput::new(format!("Found {} media {noun}", files.len())).with("files", files))
    }

    /// Files and folders of one folder, fetched concurrently. Either
    /// listing failing fails the whole call.
    pub async fn get_media_overview(&self, params: MediaOverviewParams) -> ToolResult<ToolOutput> {
        const FILES: Guidance = Guidance::new("get_media_overview", "list media files", "folder");
        const FOLDERS: Guidance = Guidance::new("get_media_overview", "list media folders", "folder");

        let location_id = resolve_location(&self.ctx, "get_media_overview", params.location_id)?;
        let parent_id = params.parent_id.as_deref();
        let (files, folders) = tokio::try_join!(
            send(
                &self.ctx,
                &FILES,
                parent_id,
                listing_request(&location_id, MediaKind::File, parent_id, params.limit),
            ),
            send(
                &self.ctx,
                &FOLDERS,
                parent_id,
                listing_request(&location_id, MediaKind::Folder, parent_id, params.limit),
            ),
        )?;
        let files = array_at(&files, "files");
        let folders = array_at(&folders, "files");

        Ok(ToolOutput::new(format!(
            "Found {} files and {} folders",
            files.len(),
            folders.len()
        ))
        .with("files", files)
        .with("folders", folders))
    }

    pub async fn upload_media_file(&self, params: UploadMediaParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("upload_media_file", "upload the file", "folder")
            .lookup("get_media_overview")
            .validation("fileUrl must be publicly reachable and under the size limit.");

        let location_id = resolve_location(&self.ctx, "upload_media_file", params.location_id)?;
        let mut fields = vec![
            ("hosted".to_string(), "true".to_string()),
            ("fileUrl".to_string(), params.file_url.clone()),
            ("altId".to_string(), location_id),
            ("altType".to_string(), ALT_TYPE.to_string()),
        ];
        if let Some(name) = &params.name {
            fields.push(("name".to_string(), name.clone()));
        }
        if let Some(parent_id) = &params.parent_id {
            fields.push(("parentId".to_string(), parent_id.clone()));
        }

        let response = send(
            &self.ctx,
            &GUIDE,
            params.parent_id.as_deref(),
            ApiRequest::post("/medias/upload-file").multipart(fields),
        )
        .await?;
        let id = str_at(&response, &["fileId", "_id", "id"])
            .unwrap_or("unknown")
            .to_string();

        Ok(ToolOutput::new(format!("Uploaded {} (ID: {id})", params.file_url))
            .with("file", response))
    }

    pub async fn create_media_folder(&self, params: CreateFolderParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_media_folder", "create the folder", "folder")
            .lookup("get_media_overview")
            .conflict("A folder with this name already exists here.");

        let location_id = resolve_location(&self.ctx, "create_media_folder", params.location_id)?;
        let body = json!({
            "altId": location_id,
            "altType": ALT_TYPE,
            "name": params.name,
            "parentId": params.parent_id,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            params.parent_id.as_deref(),
            ApiRequest::post("/medias/folder").json(strip_nulls(body)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Folder '{}' created", params.name))
            .with("folder", response))
    }

    pub async fn delete_media_file(&self, params: DeleteMediaParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("delete_media_file", "delete the media item", "media item")
            .lookup("get_media_files");

        let location_id = resolve_location(&self.ctx, "delete_media_file", params.location_id)?;
        send(
            &self.ctx,
            &GUIDE,
            Some(&params.id),
            ApiRequest::delete(format!("/medias/{}", params.id))
                .query("altId", &location_id)
                .query("altType", ALT_TYPE),
        )
        .await?;

        Ok(ToolOutput::new(format!("Media item {} deleted", params.id)).with("id", params.id))
    }
}

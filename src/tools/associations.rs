//! Association tools: link definitions between object types and the
//! record-to-record relations built on them.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    Guidance, ToolOutput, ToolResult, array_at, resolve_location, send, str_at, unwrap_key,
};
use crate::client::{ApiRequest, Transport};

pub const DEFAULT_SKIP: u32 = 0;
pub const DEFAULT_LIMIT: u32 = 10;

const DUPLICATE_KEY: &str = "An association with this key already exists for the location. \
     Use get_association_by_key to inspect it.";
const DUPLICATE_RELATION: &str = "These two records are already related through this association.";

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListAssociationsParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub skip: Option<u32>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssociationParams {
    pub location_id: Option<String>,
    #[schemars(description = "Unique key, e.g. doctor_patient")]
    pub key: String,
    #[schemars(description = "Label seen from the first object, e.g. Doctor")]
    pub first_object_label: String,
    #[schemars(description = "First object key, e.g. contact or custom_objects.pets")]
    pub first_object_key: String,
    pub second_object_label: String,
    pub second_object_key: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssociationIdParams {
    #[schemars(description = "Association ID")]
    pub association_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssociationParams {
    #[schemars(description = "Association ID")]
    pub association_id: String,
    pub first_object_label: String,
    pub second_object_label: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssociationKeyParams {
    pub location_id: Option<String>,
    #[schemars(description = "Association key")]
    pub key_name: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectKeyParams {
    pub location_id: Option<String>,
    #[schemars(description = "Object key, e.g. contact")]
    pub object_key: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelationParams {
    pub location_id: Option<String>,
    #[schemars(description = "Association the relation belongs to")]
    pub association_id: String,
    #[schemars(description = "Record ID of the first object")]
    pub first_record_id: String,
    #[schemars(description = "Record ID of the second object")]
    pub second_record_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelationsByRecordParams {
    pub location_id: Option<String>,
    #[schemars(description = "Record whose relations to list")]
    pub record_id: String,
    #[schemars(description = "Only relations of these associations")]
    pub association_ids: Option<Vec<String>>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelationIdParams {
    pub location_id: Option<String>,
    #[schemars(description = "Relation ID")]
    pub relation_id: String,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Association tools.
    AssociationTools, family = "associations";
    "get_all_associations" => get_all_associations(ListAssociationsParams):
        "List association definitions for a location";
    "create_association" => create_association(CreateAssociationParams):
        "Define a new association between two object types";
    "get_association" => get_association(AssociationIdParams):
        "Get an association by ID";
    "update_association" => update_association(UpdateAssociationParams):
        "Update association labels";
    "delete_association" => delete_association(AssociationIdParams):
        "Delete an association and its relations";
    "get_association_by_key" => get_association_by_key(AssociationKeyParams):
        "Get an association by its key";
    "get_association_by_object_key" => get_association_by_object_key(ObjectKeyParams):
        "List associations involving an object key";
    "create_relation" => create_relation(CreateRelationParams):
        "Relate two records through an association";
    "get_relations_by_record" => get_relations_by_record(RelationsByRecordParams):
        "List relations of a record";
    "delete_relation" => delete_relation(RelationIdParams):
        "Delete a relation";
}

fn association_of(response: Value) -> Value {
    unwrap_key(response, "association")
}

impl<T: Transport + 'static> AssociationTools<T> {
    pub async fn get_all_associations(
        &self,
        params: ListAssociationsParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_all_associations", "list associations", "location");

        let location_id = resolve_location(&self.ctx, "get_all_associations", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get("/associations/")
                .query("locationId", &location_id)
                .query("skip", params.skip.unwrap_or(DEFAULT_SKIP))
                .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT)),
        )
        .await?;
        let associations = array_at(&response, "associations");
        let total = response
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(associations.len() as u64);

        Ok(ToolOutput::new(format!("Found {} associations", associations.len()))
            .with("total", total)
            .with("associations", associations))
    }

    pub async fn create_association(
        &self,
        params: CreateAssociationParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_association", "create the association", "location")
            .conflict(DUPLICATE_KEY)
            .validation("object keys must exist (contact, opportunity, business or custom_objects.<key>).");

        let location_id = resolve_location(&self.ctx, "create_association", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "key": params.key,
            "firstObjectLabel": params.first_object_label,
            "firstObjectKey": params.first_object_key,
            "secondObjectLabel": params.second_object_label,
            "secondObjectKey": params.second_object_key,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            None,
            ApiRequest::post("/associations/").json(body),
        )
        .await?;
        let association = association_of(response);
        let id = str_at(&association, &["id", "_id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!(
            "Association '{}' created (ID: {id})",
            params.key
        ))
        .with("association", association))
    }

    pub async fn get_association(&self, params: AssociationIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_association", "get the association", "association")
            .lookup("get_all_associations");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.association_id),
            ApiRequest::get(format!("/associations/{}", params.association_id)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Retrieved association {}", params.association_id))
            .with("association", association_of(response)))
    }

    pub async fn update_association(
        &self,
        params: UpdateAssociationParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_association", "update the association", "association")
            .lookup("get_all_associations");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.association_id),
            ApiRequest::put(format!("/associations/{}", params.association_id)).json(json!({
                "firstObjectLabel": params.first_object_label,
                "secondObjectLabel": params.second_object_label,
            })),
        )
        .await?;

        Ok(ToolOutput::new(format!("Association {} updated", params.association_id))
            .with("association", association_of(response)))
    }

    pub async fn delete_association(&self, params: AssociationIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("delete_association", "delete the association", "association")
            .lookup("get_all_associations");

        send(
            &self.ctx,
            &GUIDE,
            Some(&params.association_id),
            ApiRequest::delete(format!("/associations/{}", params.association_id)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Association {} deleted", params.association_id))
            .with("associationId", params.association_id))
    }

    pub async fn get_association_by_key(
        &self,
        params: AssociationKeyParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_association_by_key", "get the association", "association key")
            .lookup("get_all_associations");

        let location_id = resolve_location(&self.ctx, "get_association_by_key", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.key_name),
            ApiRequest::get(format!("/associations/key/{}", params.key_name))
                .query("locationId", &location_id),
        )
        .await?;

        Ok(ToolOutput::new(format!("Retrieved association '{}'", params.key_name))
            .with("association", association_of(response)))
    }

    pub async fn get_association_by_object_key(
        &self,
        params: ObjectKeyParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_association_by_object_key", "list associations", "object key");

        let location_id =
            resolve_location(&self.ctx, "get_association_by_object_key", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.object_key),
            ApiRequest::get(format!("/associations/objectKey/{}", params.object_key))
                .query("locationId", &location_id),
        )
        .await?;

        Ok(ToolOutput::new(format!(
            "Retrieved associations for object '{}'",
            params.object_key
        ))
        .with("associations", response))
    }

    pub async fn create_relation(&self, params: CreateRelationParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_relation", "create the relation", "association")
            .lookup("get_all_associations")
            .conflict(DUPLICATE_RELATION)
            .validation("record IDs must match the object types the association links.");

        let location_id = resolve_location(&self.ctx, "create_relation", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.association_id),
            ApiRequest::post("/associations/relations").json(json!({
                "locationId": location_id,
                "associationId": params.association_id,
                "firstRecordId": params.first_record_id,
                "secondRecordId": params.second_record_id,
            })),
        )
        .await?;

        Ok(ToolOutput::new(format!(
            "Related {} and {}",
            params.first_record_id, params.second_record_id
        ))
        .with("relation", unwrap_key(response, "relation")))
    }

    pub async fn get_relations_by_record(
        &self,
        params: RelationsByRecordParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_relations_by_record", "list relations", "record");

        let location_id =
            resolve_location(&self.ctx, "get_relations_by_record", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.record_id),
            ApiRequest::get(format!("/associations/relations/{}", params.record_id))
                .query("locationId", &location_id)
                .query("skip", params.skip.unwrap_or(DEFAULT_SKIP))
                .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
                .query_list("associationIds", params.association_ids.as_deref()),
        )
        .await?;
        let relations = array_at(&response, "relations");

        Ok(ToolOutput::new(format!(
            "Found {} relations for record {}",
            relations.len(),
            params.record_id
        ))
        .with("relations", relations))
    }

    pub async fn delete_relation(&self, params: RelationIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("delete_relation", "delete the relation", "relation")
            .lookup("get_relations_by_record");

        let location_id = resolve_location(&self.ctx, "delete_relation", params.location_id)?;
        send(
            &self.ctx,
            &GUIDE,
            Some(&params.relation_id),
            ApiRequest::delete(format!("/associations/relations/{}", params.relation_id))
                .query("locationId", &location_id),
        )
        .await?;

        Ok(ToolOutput::new(format!("Relation {} deleted", params.relation_id))
            .with("relationId", params.relation_id))
    }
}

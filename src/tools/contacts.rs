//! Contact management tools.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    Guidance, ToolError, ToolOutput, ToolResult, array_at, resolve_location, send, str_at,
    strip_nulls, unwrap_key,
};
use crate::client::{ApiRequest, Transport};

pub const DEFAULT_SEARCH_LIMIT: u32 = 25;

const CONTACT_VALIDATION: &str = "invalid email or phone format (use E.164, e.g. +15551234567), \
     unknown custom field IDs, or tags passed as a single string instead of a list.";

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldValue {
    #[schemars(description = "Custom field ID (see get_location_custom_fields)")]
    pub id: String,
    #[schemars(description = "Value to store in the field")]
    pub field_value: Value,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    #[schemars(description = "First name")]
    pub first_name: Option<String>,
    #[schemars(description = "Last name")]
    pub last_name: Option<String>,
    #[schemars(description = "Full name, used when first/last are not split")]
    pub name: Option<String>,
    #[schemars(description = "Email address")]
    pub email: Option<String>,
    #[schemars(description = "Phone number in E.164 format, e.g. +15551234567")]
    pub phone: Option<String>,
    #[schemars(description = "Street address")]
    pub address1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    #[schemars(description = "Two-letter country code")]
    pub country: Option<String>,
    pub website: Option<String>,
    #[schemars(description = "IANA timezone, e.g. America/New_York")]
    pub timezone: Option<String>,
    pub company_name: Option<String>,
    #[schemars(description = "Lead source label")]
    pub source: Option<String>,
    #[schemars(description = "Tags to apply")]
    pub tags: Option<Vec<String>>,
    #[schemars(description = "User ID of the assigned owner")]
    pub assigned_to: Option<String>,
    #[schemars(description = "Do-not-disturb across all channels")]
    pub dnd: Option<bool>,
    #[schemars(description = "Custom field values")]
    pub custom_fields: Option<Vec<CustomFieldValue>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchContactsParams {
    pub location_id: Option<String>,
    #[schemars(description = "Free-text search across name, email, phone and company")]
    pub query: Option<String>,
    #[schemars(description = "Exact email filter")]
    pub email: Option<String>,
    #[schemars(description = "Exact phone filter")]
    pub phone: Option<String>,
    #[schemars(description = "Maximum number of contacts to return (default: 25)")]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactIdParams {
    #[schemars(description = "Contact ID")]
    pub contact_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactParams {
    #[schemars(description = "Contact ID to update")]
    pub contact_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub timezone: Option<String>,
    pub company_name: Option<String>,
    pub source: Option<String>,
    #[schemars(description = "Replaces all tags when provided")]
    pub tags: Option<Vec<String>>,
    pub assigned_to: Option<String>,
    pub dnd: Option<bool>,
    pub custom_fields: Option<Vec<CustomFieldValue>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateContactParams {
    pub location_id: Option<String>,
    #[schemars(description = "Email to check")]
    pub email: Option<String>,
    #[schemars(description = "Phone number to check")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactTagsParams {
    #[schemars(description = "Contact ID")]
    pub contact_id: String,
    #[schemars(description = "Tags to add or remove")]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactTaskParams {
    #[schemars(description = "Contact ID")]
    pub contact_id: String,
    #[schemars(description = "Task title")]
    pub title: String,
    #[schemars(description = "Task details")]
    pub body: Option<String>,
    #[schemars(description = "Due date (ISO-8601)")]
    pub due_date: String,
    #[schemars(description = "Whether the task is already completed (default: false)")]
    pub completed: Option<bool>,
    #[schemars(description = "User ID to assign")]
    pub assigned_to: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactNoteParams {
    #[schemars(description = "Contact ID")]
    pub contact_id: String,
    #[schemars(description = "Note text")]
    pub body: String,
    #[schemars(description = "Author user ID")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactWorkflowParams {
    #[schemars(description = "Contact ID")]
    pub contact_id: String,
    #[schemars(description = "Workflow ID")]
    pub workflow_id: String,
    #[schemars(description = "When the workflow should start (ISO-8601, optional)")]
    pub event_start_time: Option<String>,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Contact tools: CRUD, search, upsert, tags, tasks, notes and workflows.
    ContactTools, family = "contacts";
    "create_contact" => create_contact(CreateContactParams):
        "Create a new contact. Provide at least one of name, email or phone.";
    "search_contacts" => search_contacts(SearchContactsParams):
        "Search contacts by free text, email or phone. Default limit: 25.";
    "get_contact" => get_contact(ContactIdParams):
        "Get a contact by ID";
    "update_contact" => update_contact(UpdateContactParams):
        "Update fields on an existing contact";
    "delete_contact" => delete_contact(ContactIdParams):
        "Delete a contact permanently";
    "upsert_contact" => upsert_contact(CreateContactParams):
        "Create a contact, or update it when one with the same email/phone exists";
    "get_duplicate_contact" => get_duplicate_contact(DuplicateContactParams):
        "Check whether a contact with the given email or phone already exists";
    "add_contact_tags" => add_contact_tags(ContactTagsParams):
        "Add tags to a contact";
    "remove_contact_tags" => remove_contact_tags(ContactTagsParams):
        "Remove tags from a contact";
    "get_contact_tasks" => get_contact_tasks(ContactIdParams):
        "List tasks attached to a contact";
    "create_contact_task" => create_contact_task(CreateContactTaskParams):
        "Create a task on a contact";
    "get_contact_notes" => get_contact_notes(ContactIdParams):
        "List notes attached to a contact";
    "create_contact_note" => create_contact_note(CreateContactNoteParams):
        "Add a note to a contact";
    "add_contact_to_workflow" => add_contact_to_workflow(ContactWorkflowParams):
        "Enroll a contact in a workflow";
    "remove_contact_from_workflow" => remove_contact_from_workflow(ContactWorkflowParams):
        "Remove a contact from a workflow";
}

fn contact_label(contact: &Value) -> String {
    let first = str_at(contact, &["firstName"]).unwrap_or_default();
    let last = str_at(contact, &["lastName"]).unwrap_or_default();
    let full = format!("{first} {last}").trim().to_string();
    if !full.is_empty() {
        return full;
    }
    str_at(contact, &["name", "contactName", "email", "phone", "id"])
        .unwrap_or("contact")
        .to_string()
}

fn contact_fields(params: &CreateContactParams) -> Value {
    json!({
        "firstName": params.first_name,
        "lastName": params.last_name,
        "name": params.name,
        "email": params.email,
        "phone": params.phone,
        "address1": params.address1,
        "city": params.city,
        "state": params.state,
        "postalCode": params.postal_code,
        "country": params.country,
        "website": params.website,
        "timezone": params.timezone,
        "companyName": params.company_name,
        "source": params.source,
        "tags": params.tags,
        "assignedTo": params.assigned_to,
        "dnd": params.dnd,
        "customFields": params.custom_fields,
    })
}

fn require_identity(tool: &str, params: &CreateContactParams) -> ToolResult<()> {
    let any = [
        &params.first_name,
        &params.last_name,
        &params.name,
        &params.email,
        &params.phone,
    ]
    .iter()
    .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()));
    if any {
        Ok(())
    } else {
        Err(ToolError::invalid(
            tool,
            "provide at least one of firstName, lastName, name, email or phone",
        ))
    }
}

impl<T: Transport + 'static> ContactTools<T> {
    pub async fn create_contact(&self, params: CreateContactParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_contact", "create the contact", "contact")
            .conflict("A contact with this email or phone already exists; use upsert_contact or get_duplicate_contact.")
            .validation(CONTACT_VALIDATION);

        require_identity("create_contact", &params)?;
        let location_id = resolve_location(&self.ctx, "create_contact", params.location_id.clone())?;

        let mut body = contact_fields(&params);
        body["locationId"] = json!(location_id);

        let response = send(&self.ctx, &GUIDE, None, ApiRequest::post("/contacts/").json(strip_nulls(body))).await?;
        let contact = unwrap_key(response, "contact");
        let id = str_at(&contact, &["id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!(
            "Contact {} created successfully (ID: {id})",
            contact_label(&contact)
        ))
        .with("contact", contact))
    }

    pub async fn search_contacts(&self, params: SearchContactsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("search_contacts", "search contacts", "location");

        let location_id = resolve_location(&self.ctx, "search_contacts", params.location_id)?;
        let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

        let mut filters = Vec::new();
        if let Some(email) = &params.email {
            filters.push(json!({"field": "email", "operator": "eq", "value": email}));
        }
        if let Some(phone) = &params.phone {
            filters.push(json!({"field": "phone", "operator": "eq", "value": phone}));
        }

        let body = json!({
            "locationId": location_id,
            "pageLimit": limit,
            "query": params.query,
            "filters": if filters.is_empty() { Value::Null } else { Value::Array(filters) },
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::post("/contacts/search").json(strip_nulls(body)),
        )
        .await?;

        let contacts = array_at(&response, "contacts");
        let total = response
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(contacts.len() as u64);

        Ok(ToolOutput::new(format!("Found {} contacts", contacts.len()))
            .with("total", total)
            .with("contacts", contacts))
    }

    pub async fn get_contact(&self, params: ContactIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_contact", "get the contact", "contact").lookup("search_contacts");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            ApiRequest::get(format!("/contacts/{}", params.contact_id)),
        )
        .await?;
        let contact = unwrap_key(response, "contact");

        Ok(ToolOutput::new(format!("Retrieved contact {}", contact_label(&contact)))
            .with("contact", contact))
    }

    pub async fn update_contact(&self, params: UpdateContactParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_contact", "update the contact", "contact")
            .lookup("search_contacts")
            .conflict("Another contact already uses this email or phone.")
            .validation(CONTACT_VALIDATION);

        let body = json!({
            "firstName": params.first_name,
            "lastName": params.last_name,
            "name": params.name,
            "email": params.email,
            "phone": params.phone,
            "address1": params.address1,
            "city": params.city,
            "state": params.state,
            "postalCode": params.postal_code,
            "country": params.country,
            "website": params.website,
            "timezone": params.timezone,
            "companyName": params.company_name,
            "source": params.source,
            "tags": params.tags,
            "assignedTo": params.assigned_to,
            "dnd": params.dnd,
            "customFields": params.custom_fields,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            ApiRequest::put(format!("/contacts/{}", params.contact_id)).json(strip_nulls(body)),
        )
        .await?;
        let contact = unwrap_key(response, "contact");

        Ok(ToolOutput::new(format!("Contact {} updated successfully", params.contact_id))
            .with("contact", contact))
    }

    pub async fn delete_contact(&self, params: ContactIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("delete_contact", "delete the contact", "contact").lookup("search_contacts");

        send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            ApiRequest::delete(format!("/contacts/{}", params.contact_id)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Contact {} deleted successfully", params.contact_id))
            .with("contactId", params.contact_id))
    }

    pub async fn upsert_contact(&self, params: CreateContactParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("upsert_contact", "upsert the contact", "contact")
            .validation(CONTACT_VALIDATION);

        require_identity("upsert_contact", &params)?;
        let location_id = resolve_location(&self.ctx, "upsert_contact", params.location_id.clone())?;

        let mut body = contact_fields(&params);
        body["locationId"] = json!(location_id);

        let response = send(
            &self.ctx,
            &GUIDE,
            None,
            ApiRequest::post("/contacts/upsert").json(strip_nulls(body)),
        )
        .await?;

        let created = response.get("new").and_then(Value::as_bool).unwrap_or(false);
        let contact = unwrap_key(response, "contact");
        let id = str_at(&contact, &["id"]).unwrap_or("unknown").to_string();
        let verb = if created { "created" } else { "updated" };

        Ok(ToolOutput::new(format!("Contact {verb} successfully (ID: {id})"))
            .with("created", created)
            .with("contact", contact))
    }

    pub async fn get_duplicate_contact(
        &self,
        params: DuplicateContactParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_duplicate_contact", "check for duplicate contacts", "location");

        if params.email.is_none() && params.phone.is_none() {
            return Err(ToolError::invalid(
                "get_duplicate_contact",
                "provide email or phone to check",
            ));
        }
        let location_id = resolve_location(&self.ctx, "get_duplicate_contact", params.location_id)?;

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            ApiRequest::get("/contacts/search/duplicate")
                .query("locationId", &location_id)
                .query_opt("email", params.email.as_deref())
                .query_opt("number", params.phone.as_deref()),
        )
        .await?;

        let contact = response.get("contact").cloned().unwrap_or(Value::Null);
        let output = if contact.is_null() {
            ToolOutput::new("No duplicate contact found")
        } else {
            let id = str_at(&contact, &["id"]).unwrap_or("unknown");
            ToolOutput::new(format!("Duplicate contact found (ID: {id})"))
        };

        Ok(output
            .with("duplicate", !contact.is_null())
            .with("contact", contact))
    }

    pub async fn add_contact_tags(&self, params: ContactTagsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("add_contact_tags", "add tags to the contact", "contact").lookup("search_contacts");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            ApiRequest::post(format!("/contacts/{}/tags", params.contact_id))
                .json(json!({"tags": params.tags})),
        )
        .await?;

        Ok(ToolOutput::new(format!(
            "Added {} tags to contact {}",
            params.tags.len(),
            params.contact_id
        ))
        .with("tags", response.get("tags").cloned().unwrap_or(json!(params.tags))))
    }

    pub async fn remove_contact_tags(&self, params: ContactTagsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("remove_contact_tags", "remove tags from the contact", "contact")
                .lookup("search_contacts");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            ApiRequest::delete(format!("/contacts/{}/tags", params.contact_id))
                .json(json!({"tags": params.tags})),
        )
        .await?;

        Ok(ToolOutput::new(format!(
            "Removed {} tags from contact {}",
            params.tags.len(),
            params.contact_id
        ))
        .with("tags", response.get("tags").cloned().unwrap_or(json!([]))))
    }

    pub async fn get_contact_tasks(&self, params: ContactIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_contact_tasks", "list the contact's tasks", "contact").lookup("search_contacts");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            ApiRequest::get(format!("/contacts/{}/tasks", params.contact_id)),
        )
        .await?;
        let tasks = array_at(&response, "tasks");

        Ok(ToolOutput::new(format!(
            "Found {} tasks for contact {}",
            tasks.len(),
            params.contact_id
        ))
        .with("tasks", tasks))
    }

    pub async fn create_contact_task(
        &self,
        params: CreateContactTaskParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_contact_task", "create the task", "contact")
            .lookup("search_contacts")
            .validation("dueDate must be ISO-8601 and assignedTo must be a user of this location.");

        let body = json!({
            "title": params.title,
            "body": params.body,
            "dueDate": params.due_date,
            "completed": params.completed.unwrap_or(false),
            "assignedTo": params.assigned_to,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            ApiRequest::post(format!("/contacts/{}/tasks", params.contact_id)).json(strip_nulls(body)),
        )
        .await?;
        let task = unwrap_key(response, "task");

        Ok(ToolOutput::new(format!("Task '{}' created", params.title)).with("task", task))
    }

    pub async fn get_contact_notes(&self, params: ContactIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_contact_notes", "list the contact's notes", "contact").lookup("search_contacts");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            ApiRequest::get(format!("/contacts/{}/notes", params.contact_id)),
        )
        .await?;
        let notes = array_at(&response, "notes");

        Ok(ToolOutput::new(format!(
            "Found {} notes for contact {}",
            notes.len(),
            params.contact_id
        ))
        .with("notes", notes))
    }

    pub async fn create_contact_note(
        &self,
        params: CreateContactNoteParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("create_contact_note", "add the note", "contact").lookup("search_contacts");

        let body = json!({"body": params.body, "userId": params.user_id});
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            ApiRequest::post(format!("/contacts/{}/notes", params.contact_id)).json(strip_nulls(body)),
        )
        .await?;
        let note = unwrap_key(response, "note");

        Ok(ToolOutput::new(format!("Note added to contact {}", params.contact_id)).with("note", note))
    }

    pub async fn add_contact_to_workflow(
        &self,
        params: ContactWorkflowParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("add_contact_to_workflow", "enroll the contact in the workflow", "contact or workflow")
                .lookup("search_contacts");

        let body = json!({"eventStartTime": params.event_start_time});
        send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            ApiRequest::post(format!(
                "/contacts/{}/workflow/{}",
                params.contact_id, params.workflow_id
            ))
            .json(strip_nulls(body)),
        )
        .await?;

        Ok(ToolOutput::new(format!(
            "Contact {} added to workflow {}",
            params.contact_id, params.workflow_id
        ))
        .with("contactId", params.contact_id)
        .with("workflowId", params.workflow_id))
    }

    pub async fn remove_contact_from_workflow(
        &self,
        params: ContactWorkflowParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new(
            "remove_contact_from_workflow",
            "remove the contact from the workflow",
            "contact or workflow",
        )
        .lookup("search_contacts");

        send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_id),
            ApiRequest::delete(format!(
                "/contacts/{}/workflow/{}",
                params.contact_id, params.workflow_id
            )),
        )
        .await?;

        Ok(ToolOutput::new(format!(
            "Contact {} removed from workflow {}",
            params.contact_id, params.workflow_id
        ))
        .with("contactId", params.contact_id)
        .with("workflowId", params.workflow_id))
    }
}

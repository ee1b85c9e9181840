//! Calendar, appointment and availability tools.
//!
//! The calendar endpoints speak epoch milliseconds for range queries while
//! callers pass ISO-8601; conversion goes through [`crate::convert`] and any
//! fallback to the current time is reported in the result's `warnings`.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    Guidance, ToolError, ToolOutput, ToolResult, array_at, resolve_location, send, str_at,
    strip_nulls, unwrap_key,
};
use crate::client::{ApiRequest, Transport};
use crate::convert::epoch_millis_or_now;

pub const CALENDAR_API_VERSION: &str = "2021-04-15";

const DOUBLE_BOOKED: &str = "The slot is already booked or blocked. Call get_free_slots for open times, \
     or set ignoreDateRange when booking outside the calendar's availability on purpose.";

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    New,
    Confirmed,
    Cancelled,
    Showed,
    Noshow,
    Invalid,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationScopedParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetCalendarsParams {
    pub location_id: Option<String>,
    #[schemars(description = "Only calendars in this group")]
    pub group_id: Option<String>,
    #[schemars(description = "Include draft calendars")]
    pub show_drafted: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarIdParams {
    #[schemars(description = "Calendar ID")]
    pub calendar_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCalendarParams {
    pub location_id: Option<String>,
    #[schemars(description = "Calendar name")]
    pub name: String,
    pub description: Option<String>,
    #[schemars(description = "Calendar type: round_robin, event, class_booking, collective, service_booking, personal")]
    pub calendar_type: Option<String>,
    #[schemars(description = "Group ID to place the calendar in")]
    pub group_id: Option<String>,
    #[schemars(description = "Appointment length in minutes")]
    pub slot_duration: Option<u32>,
    #[schemars(description = "Minutes between slot start times")]
    pub slot_interval: Option<u32>,
    #[schemars(description = "User IDs assigned to the calendar")]
    pub team_members: Option<Vec<String>>,
    #[schemars(description = "URL slug for the booking widget")]
    pub widget_slug: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCalendarParams {
    #[schemars(description = "Calendar ID to update")]
    pub calendar_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub group_id: Option<String>,
    pub slot_duration: Option<u32>,
    pub slot_interval: Option<u32>,
    pub team_members: Option<Vec<String>>,
    pub widget_slug: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetCalendarEventsParams {
    pub location_id: Option<String>,
    #[schemars(description = "Range start (ISO-8601, e.g. 2025-10-20T09:00:00Z, or 13-digit epoch milliseconds)")]
    pub start_time: String,
    #[schemars(description = "Range end (ISO-8601 or 13-digit epoch milliseconds)")]
    pub end_time: String,
    #[schemars(description = "Filter by calendar. One of calendarId, userId or groupId is required")]
    pub calendar_id: Option<String>,
    #[schemars(description = "Filter by assigned user")]
    pub user_id: Option<String>,
    #[schemars(description = "Filter by calendar group")]
    pub group_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetFreeSlotsParams {
    #[schemars(description = "Calendar ID")]
    pub calendar_id: String,
    #[schemars(description = "First day to check (YYYY-MM-DD or 13-digit epoch milliseconds)")]
    pub start_date: String,
    #[schemars(description = "Last day to check (YYYY-MM-DD or 13-digit epoch milliseconds)")]
    pub end_date: String,
    #[schemars(description = "IANA timezone for the returned slots")]
    pub timezone: Option<String>,
    #[schemars(description = "Only slots for this user")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentParams {
    pub location_id: Option<String>,
    #[schemars(description = "Calendar ID")]
    pub calendar_id: String,
    #[schemars(description = "Contact ID being booked")]
    pub contact_id: String,
    #[schemars(description = "Start time (ISO-8601)")]
    pub start_time: String,
    #[schemars(description = "End time (ISO-8601); defaults to the calendar slot length")]
    pub end_time: Option<String>,
    pub title: Option<String>,
    pub appointment_status: Option<AppointmentStatus>,
    #[schemars(description = "User ID the appointment is assigned to")]
    pub assigned_user_id: Option<String>,
    #[schemars(description = "Meeting address or link")]
    pub address: Option<String>,
    #[schemars(description = "Book even outside the calendar's availability")]
    pub ignore_date_range: Option<bool>,
    #[schemars(description = "Send notifications to the contact")]
    pub to_notify: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentIdParams {
    #[schemars(description = "Appointment (event) ID")]
    pub appointment_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentParams {
    #[schemars(description = "Appointment (event) ID")]
    pub appointment_id: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub title: Option<String>,
    pub appointment_status: Option<AppointmentStatus>,
    pub assigned_user_id: Option<String>,
    pub address: Option<String>,
    pub ignore_date_range: Option<bool>,
    pub to_notify: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockSlotParams {
    pub location_id: Option<String>,
    #[schemars(description = "Calendar to block; omit to block the user across calendars")]
    pub calendar_id: Option<String>,
    #[schemars(description = "Block start (ISO-8601)")]
    pub start_time: String,
    #[schemars(description = "Block end (ISO-8601)")]
    pub end_time: String,
    pub title: Option<String>,
    pub assigned_user_id: Option<String>,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Calendar tools.
    CalendarTools, family = "calendars";
    "get_calendar_groups" => get_calendar_groups(LocationScopedParams):
        "List calendar groups for a location";
    "get_calendars" => get_calendars(GetCalendarsParams):
        "List calendars for a location";
    "get_calendar" => get_calendar(CalendarIdParams):
        "Get a calendar by ID";
    "create_calendar" => create_calendar(CreateCalendarParams):
        "Create a calendar";
    "update_calendar" => update_calendar(UpdateCalendarParams):
        "Update a calendar";
    "delete_calendar" => delete_calendar(CalendarIdParams):
        "Delete a calendar";
    "get_calendar_events" => get_calendar_events(GetCalendarEventsParams):
        "List appointments and events between two ISO-8601 timestamps";
    "get_free_slots" => get_free_slots(GetFreeSlotsParams):
        "List open booking slots for a calendar between two dates (YYYY-MM-DD)";
    "create_appointment" => create_appointment(CreateAppointmentParams):
        "Book an appointment for a contact";
    "get_appointment" => get_appointment(AppointmentIdParams):
        "Get an appointment by ID";
    "update_appointment" => update_appointment(UpdateAppointmentParams):
        "Reschedule or update an appointment";
    "delete_appointment" => delete_appointment(AppointmentIdParams):
        "Delete an appointment";
    "create_block_slot" => create_block_slot(CreateBlockSlotParams):
        "Block time on a calendar so it cannot be booked";
}

fn calendar_request(request: ApiRequest) -> ApiRequest {
    request.version(CALENDAR_API_VERSION)
}

/// Total slot count across the per-day entries of a free-slots response.
fn count_slots(response: &Value) -> usize {
    response
        .as_object()
        .map(|days| {
            days.values()
                .filter_map(|day| day.get("slots").and_then(Value::as_array))
                .map(Vec::len)
                .sum()
        })
        .unwrap_or(0)
}

impl<T: Transport + 'static> CalendarTools<T> {
    pub async fn get_calendar_groups(&self, params: LocationScopedParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_calendar_groups", "list calendar groups", "location");

        let location_id = resolve_location(&self.ctx, "get_calendar_groups", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            calendar_request(ApiRequest::get("/calendars/groups").query("locationId", &location_id)),
        )
        .await?;
        let groups = array_at(&response, "groups");

        Ok(ToolOutput::new(format!("Found {} calendar groups", groups.len())).with("groups", groups))
    }

    pub async fn get_calendars(&self, params: GetCalendarsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_calendars", "list calendars", "location");

        let location_id = resolve_location(&self.ctx, "get_calendars", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            calendar_request(
                ApiRequest::get("/calendars/")
                    .query("locationId", &location_id)
                    .query_opt("groupId", params.group_id.as_deref())
                    .query_opt("showDrafted", params.show_drafted),
            ),
        )
        .await?;
        let calendars = array_at(&response, "calendars");

        Ok(ToolOutput::new(format!("Found {} calendars", calendars.len())).with("calendars", calendars))
    }

    pub async fn get_calendar(&self, params: CalendarIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_calendar", "get the calendar", "calendar").lookup("get_calendars");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.calendar_id),
            calendar_request(ApiRequest::get(format!("/calendars/{}", params.calendar_id))),
        )
        .await?;
        let calendar = unwrap_key(response, "calendar");
        let name = str_at(&calendar, &["name"]).unwrap_or(&params.calendar_id).to_string();

        Ok(ToolOutput::new(format!("Retrieved calendar {name}")).with("calendar", calendar))
    }

    pub async fn create_calendar(&self, params: CreateCalendarParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_calendar", "create the calendar", "location")
            .conflict("A calendar with this widget slug already exists; choose another widgetSlug.")
            .validation("teamMembers must be user IDs of this location and slot lengths are whole minutes.");

        let location_id = resolve_location(&self.ctx, "create_calendar", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "name": params.name,
            "description": params.description,
            "calendarType": params.calendar_type,
            "groupId": params.group_id,
            "slotDuration": params.slot_duration,
            "slotInterval": params.slot_interval,
            "teamMembers": params
                .team_members
                .map(|ids| ids.into_iter().map(|user_id| json!({"userId": user_id})).collect::<Vec<_>>()),
            "widgetSlug": params.widget_slug,
            "isActive": params.is_active,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            None,
            calendar_request(ApiRequest::post("/calendars/").json(strip_nulls(body))),
        )
        .await?;
        let calendar = unwrap_key(response, "calendar");
        let id = str_at(&calendar, &["id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!("Calendar '{}' created (ID: {id})", params.name))
            .with("calendar", calendar))
    }

    pub async fn update_calendar(&self, params: UpdateCalendarParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_calendar", "update the calendar", "calendar")
            .lookup("get_calendars")
            .conflict("A calendar with this widget slug already exists; choose another widgetSlug.");

        let body = json!({
            "name": params.name,
            "description": params.description,
            "groupId": params.group_id,
            "slotDuration": params.slot_duration,
            "slotInterval": params.slot_interval,
            "teamMembers": params
                .team_members
                .map(|ids| ids.into_iter().map(|user_id| json!({"userId": user_id})).collect::<Vec<_>>()),
            "widgetSlug": params.widget_slug,
            "isActive": params.is_active,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.calendar_id),
            calendar_request(
                ApiRequest::put(format!("/calendars/{}", params.calendar_id)).json(strip_nulls(body)),
            ),
        )
        .await?;

        Ok(ToolOutput::new(format!("Calendar {} updated", params.calendar_id))
            .with("calendar", unwrap_key(response, "calendar")))
    }

    pub async fn delete_calendar(&self, params: CalendarIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("delete_calendar", "delete the calendar", "calendar").lookup("get_calendars");

        send(
            &self.ctx,
            &GUIDE,
            Some(&params.calendar_id),
            calendar_request(ApiRequest::delete(format!("/calendars/{}", params.calendar_id))),
        )
        .await?;

        Ok(ToolOutput::new(format!("Calendar {} deleted", params.calendar_id))
            .with("calendarId", params.calendar_id))
    }

    pub async fn get_calendar_events(
        &self,
        params: GetCalendarEventsParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_calendar_events", "list calendar events", "calendar")
            .lookup("get_calendars")
            .validation("one of calendarId, userId or groupId is required and startTime must precede endTime.");

        if params.calendar_id.is_none() && params.user_id.is_none() && params.group_id.is_none() {
            return Err(ToolError::invalid(
                "get_calendar_events",
                "provide one of calendarId, userId or groupId",
            ));
        }
        let location_id = resolve_location(&self.ctx, "get_calendar_events", params.location_id)?;
        let start = epoch_millis_or_now("startTime", &params.start_time);
        let end = epoch_millis_or_now("endTime", &params.end_time);

        let subject = params
            .calendar_id
            .as_deref()
            .or(params.group_id.as_deref())
            .or(params.user_id.as_deref())
            .map(str::to_string);

        let response = send(
            &self.ctx,
            &GUIDE,
            subject.as_deref(),
            calendar_request(
                ApiRequest::get("/calendars/events")
                    .query("locationId", &location_id)
                    .query("startTime", start.millis)
                    .query("endTime", end.millis)
                    .query_opt("calendarId", params.calendar_id.as_deref())
                    .query_opt("userId", params.user_id.as_deref())
                    .query_opt("groupId", params.group_id.as_deref()),
            ),
        )
        .await?;
        let events = array_at(&response, "events");

        Ok(ToolOutput::new(format!("Found {} events", events.len()))
            .with("events", events)
            .with_warnings([start.warning, end.warning]))
    }

    pub async fn get_free_slots(&self, params: GetFreeSlotsParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_free_slots", "fetch free slots", "calendar")
            .lookup("get_calendars")
            .validation("dates are YYYY-MM-DD, endDate is on or after startDate, and the range spans at most 31 days.");

        let start = epoch_millis_or_now("startDate", &params.start_date);
        let end = epoch_millis_or_now("endDate", &params.end_date);

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.calendar_id),
            calendar_request(
                ApiRequest::get(format!("/calendars/{}/free-slots", params.calendar_id))
                    .query("startDate", start.millis)
                    .query("endDate", end.millis)
                    .query_opt("timezone", params.timezone.as_deref())
                    .query_opt("userId", params.user_id.as_deref()),
            ),
        )
        .await?;
        let total = count_slots(&response);

        Ok(ToolOutput::new(format!(
            "Found {total} available slots on calendar {}",
            params.calendar_id
        ))
        .with("totalSlots", total)
        .with("slots", response)
        .with_warnings([start.warning, end.warning]))
    }

    pub async fn create_appointment(
        &self,
        params: CreateAppointmentParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_appointment", "book the appointment", "calendar or contact")
            .lookup("get_calendars")
            .conflict(DOUBLE_BOOKED)
            .validation("startTime must be ISO-8601 with an offset and the contact must belong to this location.");

        let location_id = resolve_location(&self.ctx, "create_appointment", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "calendarId": params.calendar_id,
            "contactId": params.contact_id,
            "startTime": params.start_time,
            "endTime": params.end_time,
            "title": params.title,
            "appointmentStatus": params.appointment_status,
            "assignedUserId": params.assigned_user_id,
            "address": params.address,
            "ignoreDateRange": params.ignore_date_range,
            "toNotify": params.to_notify,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.calendar_id),
            calendar_request(ApiRequest::post("/calendars/events/appointments").json(strip_nulls(body))),
        )
        .await?;
        let id = str_at(&response, &["id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!(
            "Appointment booked for {} (ID: {id})",
            params.start_time
        ))
        .with("appointment", response))
    }

    pub async fn get_appointment(&self, params: AppointmentIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("get_appointment", "get the appointment", "appointment")
            .lookup("get_calendar_events");

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.appointment_id),
            calendar_request(ApiRequest::get(format!(
                "/calendars/events/appointments/{}",
                params.appointment_id
            ))),
        )
        .await?;

        Ok(ToolOutput::new(format!("Retrieved appointment {}", params.appointment_id))
            .with("appointment", unwrap_key(response, "event")))
    }

    pub async fn update_appointment(
        &self,
        params: UpdateAppointmentParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_appointment", "update the appointment", "appointment")
            .lookup("get_calendar_events")
            .conflict(DOUBLE_BOOKED);

        let body = json!({
            "startTime": params.start_time,
            "endTime": params.end_time,
            "title": params.title,
            "appointmentStatus": params.appointment_status,
            "assignedUserId": params.assigned_user_id,
            "address": params.address,
            "ignoreDateRange": params.ignore_date_range,
            "toNotify": params.to_notify,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.appointment_id),
            calendar_request(
                ApiRequest::put(format!("/calendars/events/appointments/{}", params.appointment_id))
                    .json(strip_nulls(body)),
            ),
        )
        .await?;

        Ok(ToolOutput::new(format!("Appointment {} updated", params.appointment_id))
            .with("appointment", response))
    }

    pub async fn delete_appointment(&self, params: AppointmentIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("delete_appointment", "delete the appointment", "appointment")
            .lookup("get_calendar_events");

        send(
            &self.ctx,
            &GUIDE,
            Some(&params.appointment_id),
            calendar_request(ApiRequest::delete(format!(
                "/calendars/events/{}",
                params.appointment_id
            ))),
        )
        .await?;

        Ok(ToolOutput::new(format!("Appointment {} deleted", params.appointment_id))
            .with("appointmentId", params.appointment_id))
    }

    pub async fn create_block_slot(&self, params: CreateBlockSlotParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_block_slot", "block the time slot", "calendar")
            .lookup("get_calendars")
            .conflict(DOUBLE_BOOKED);

        let location_id = resolve_location(&self.ctx, "create_block_slot", params.location_id)?;
        let body = json!({
            "locationId": location_id,
            "calendarId": params.calendar_id,
            "startTime": params.start_time,
            "endTime": params.end_time,
            "title": params.title,
            "assignedUserId": params.assigned_user_id,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            params.calendar_id.as_deref(),
            calendar_request(ApiRequest::post("/calendars/events/block-slots").json(strip_nulls(body))),
        )
        .await?;
        let id = str_at(&response, &["id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!(
            "Blocked {} to {} (ID: {id})",
            params.start_time, params.end_time
        ))
        .with("blockSlot", response))
    }
}

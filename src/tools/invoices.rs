//! Invoice tools. Item amounts and payments are decimal dollars.

use rmcp::{schemars, schemars::JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{
    Guidance, ToolOutput, ToolResult, array_at, resolve_location, send, str_at, strip_nulls,
};
use crate::client::{ApiRequest, Transport};
use crate::convert::format_dollars;

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_OFFSET: u32 = 0;

const ITEM_VALIDATION: &str = "item amounts are dollars (49.99, not 4999), qty is a positive number, \
     dates are YYYY-MM-DD, and contactDetails.id is an existing contact.";

// =============================================================================
// Parameter Structs
// =============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    #[schemars(description = "Line item name")]
    pub name: String,
    pub description: Option<String>,
    #[schemars(description = "Unit price in dollars, e.g. 49.99")]
    pub amount: f64,
    #[schemars(description = "Quantity")]
    pub qty: f64,
    #[schemars(description = "ISO currency code (default: the invoice currency)")]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    #[schemars(description = "Contact ID")]
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_no: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesParams {
    #[schemars(description = "Location ID (defaults to the configured location)")]
    pub location_id: Option<String>,
    #[schemars(description = "draft, sent, payment_processing, paid, void or partially_paid")]
    pub status: Option<String>,
    pub contact_id: Option<String>,
    #[schemars(description = "Search by invoice name or number")]
    pub search: Option<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceIdParams {
    #[schemars(description = "Invoice ID")]
    pub invoice_id: String,
    pub location_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceParams {
    pub location_id: Option<String>,
    #[schemars(description = "Internal invoice name")]
    pub name: String,
    #[schemars(description = "Title printed on the invoice")]
    pub title: Option<String>,
    #[schemars(description = "ISO currency code, e.g. USD")]
    pub currency: String,
    pub contact_details: ContactDetails,
    pub items: Vec<InvoiceItem>,
    #[schemars(description = "Issue date (YYYY-MM-DD)")]
    pub issue_date: String,
    #[schemars(description = "Due date (YYYY-MM-DD)")]
    pub due_date: Option<String>,
    #[schemars(description = "Invoice number; see generate_invoice_number")]
    pub invoice_number: Option<String>,
    pub terms_notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceParams {
    #[schemars(description = "Invoice ID")]
    pub invoice_id: String,
    pub location_id: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub currency: Option<String>,
    pub items: Option<Vec<InvoiceItem>>,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    pub terms_notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SendAction {
    Email,
    SmsAndEmail,
    SendManually,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendInvoiceParams {
    #[schemars(description = "Invoice ID")]
    pub invoice_id: String,
    pub location_id: Option<String>,
    #[schemars(description = "User sending the invoice")]
    pub user_id: String,
    #[schemars(description = "Delivery channel (default: email)")]
    pub action: Option<SendAction>,
    #[schemars(description = "Send in live mode rather than test (default: true)")]
    pub live_mode: Option<bool>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    Cash,
    Card,
    Cheque,
    BankTransfer,
    Other,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentParams {
    #[schemars(description = "Invoice ID")]
    pub invoice_id: String,
    pub location_id: Option<String>,
    pub mode: PaymentMode,
    #[schemars(description = "Amount received in dollars")]
    pub amount: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceScopeParams {
    pub location_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTemplatesParams {
    pub location_id: Option<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    pub limit: Option<u32>,
    #[schemars(description = "Results to skip (default: 0)")]
    pub offset: Option<u32>,
}

// =============================================================================
// Tool table
// =============================================================================

tool_module! {
    /// Invoice tools.
    InvoiceTools, family = "invoices";
    "list_invoices" => list_invoices(ListInvoicesParams):
        "List invoices. Defaults: limit 10, offset 0.";
    "get_invoice" => get_invoice(InvoiceIdParams):
        "Get an invoice by ID";
    "create_invoice" => create_invoice(CreateInvoiceParams):
        "Create a draft invoice. Item amounts are in dollars.";
    "update_invoice" => update_invoice(UpdateInvoiceParams):
        "Update a draft invoice";
    "delete_invoice" => delete_invoice(InvoiceIdParams):
        "Delete an invoice";
    "send_invoice" => send_invoice(SendInvoiceParams):
        "Send an invoice to its contact";
    "void_invoice" => void_invoice(InvoiceIdParams):
        "Void an invoice";
    "record_invoice_payment" => record_invoice_payment(RecordPaymentParams):
        "Record a manual payment against an invoice. amount is in dollars.";
    "generate_invoice_number" => generate_invoice_number(InvoiceScopeParams):
        "Get the next available invoice number";
    "list_invoice_templates" => list_invoice_templates(ListTemplatesParams):
        "List invoice templates";
}

fn scoped(request: ApiRequest, location_id: &str) -> ApiRequest {
    request.query("altId", location_id).query("altType", "location")
}

fn scoped_body(location_id: &str, mut body: Value) -> Value {
    body["altId"] = json!(location_id);
    body["altType"] = json!("location");
    strip_nulls(body)
}

/// Sum of `amount * qty` across line items.
pub fn items_total(items: &[InvoiceItem]) -> f64 {
    items.iter().map(|item| item.amount * item.qty).sum()
}

impl<T: Transport + 'static> InvoiceTools<T> {
    pub async fn list_invoices(&self, params: ListInvoicesParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("list_invoices", "list invoices", "location");

        let location_id = resolve_location(&self.ctx, "list_invoices", params.location_id)?;
        let request = scoped(ApiRequest::get("/invoices/"), &location_id)
            .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
            .query("offset", params.offset.unwrap_or(DEFAULT_OFFSET))
            .query_opt("status", params.status.as_deref())
            .query_opt("contactId", params.contact_id.as_deref())
            .query_opt("search", params.search.as_deref());

        let response = send(&self.ctx, &GUIDE, Some(&location_id), request).await?;
        let invoices = array_at(&response, "invoices");
        let total = response
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(invoices.len() as u64);

        Ok(ToolOutput::new(format!("Found {} invoices", invoices.len()))
            .with("total", total)
            .with("invoices", invoices))
    }

    pub async fn get_invoice(&self, params: InvoiceIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("get_invoice", "get the invoice", "invoice").lookup("list_invoices");

        let location_id = resolve_location(&self.ctx, "get_invoice", params.location_id)?;
        let invoice = send(
            &self.ctx,
            &GUIDE,
            Some(&params.invoice_id),
            scoped(ApiRequest::get(format!("/invoices/{}", params.invoice_id)), &location_id),
        )
        .await?;
        let number = str_at(&invoice, &["invoiceNumber"]).unwrap_or(&params.invoice_id).to_string();

        Ok(ToolOutput::new(format!("Retrieved invoice {number}")).with("invoice", invoice))
    }

    pub async fn create_invoice(&self, params: CreateInvoiceParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("create_invoice", "create the invoice", "contact")
            .lookup("search_contacts")
            .conflict("This invoice number is already used; call generate_invoice_number.")
            .validation(ITEM_VALIDATION);

        let location_id = resolve_location(&self.ctx, "create_invoice", params.location_id)?;
        let items: Vec<Value> = params
            .items
            .iter()
            .map(|item| {
                json!({
                    "name": item.name,
                    "description": item.description,
                    "amount": item.amount,
                    "qty": item.qty,
                    "currency": item.currency.as_deref().unwrap_or(&params.currency),
                })
            })
            .collect();
        let body = json!({
            "name": params.name,
            "title": params.title,
            "currency": params.currency,
            "contactDetails": params.contact_details,
            "items": items,
            "issueDate": params.issue_date,
            "dueDate": params.due_date,
            "invoiceNumber": params.invoice_number,
            "termsNotes": params.terms_notes,
        });

        let invoice = send(
            &self.ctx,
            &GUIDE,
            Some(&params.contact_details.id),
            ApiRequest::post("/invoices/").json(scoped_body(&location_id, body)),
        )
        .await?;
        let id = str_at(&invoice, &["_id", "id"]).unwrap_or("unknown").to_string();

        Ok(ToolOutput::new(format!(
            "Invoice '{}' for {} created (ID: {id})",
            params.name,
            format_dollars(items_total(&params.items))
        ))
        .with("invoice", invoice))
    }

    pub async fn update_invoice(&self, params: UpdateInvoiceParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("update_invoice", "update the invoice", "invoice")
            .lookup("list_invoices")
            .validation(ITEM_VALIDATION);

        let location_id = resolve_location(&self.ctx, "update_invoice", params.location_id)?;
        let body = json!({
            "name": params.name,
            "title": params.title,
            "currency": params.currency,
            "items": params.items,
            "issueDate": params.issue_date,
            "dueDate": params.due_date,
            "termsNotes": params.terms_notes,
        });

        let invoice = send(
            &self.ctx,
            &GUIDE,
            Some(&params.invoice_id),
            ApiRequest::put(format!("/invoices/{}", params.invoice_id))
                .json(scoped_body(&location_id, body)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Invoice {} updated", params.invoice_id)).with("invoice", invoice))
    }

    pub async fn delete_invoice(&self, params: InvoiceIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("delete_invoice", "delete the invoice", "invoice").lookup("list_invoices");

        let location_id = resolve_location(&self.ctx, "delete_invoice", params.location_id)?;
        send(
            &self.ctx,
            &GUIDE,
            Some(&params.invoice_id),
            scoped(ApiRequest::delete(format!("/invoices/{}", params.invoice_id)), &location_id),
        )
        .await?;

        Ok(ToolOutput::new(format!("Invoice {} deleted", params.invoice_id))
            .with("invoiceId", params.invoice_id))
    }

    pub async fn send_invoice(&self, params: SendInvoiceParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("send_invoice", "send the invoice", "invoice")
            .lookup("list_invoices")
            .validation("the contact needs an email (or phone for SMS) and userId must be a user of this location.");

        let location_id = resolve_location(&self.ctx, "send_invoice", params.location_id)?;
        let body = json!({
            "userId": params.user_id,
            "action": params.action.unwrap_or(SendAction::Email),
            "liveMode": params.live_mode.unwrap_or(true),
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.invoice_id),
            ApiRequest::post(format!("/invoices/{}/send", params.invoice_id))
                .json(scoped_body(&location_id, body)),
        )
        .await?;

        Ok(ToolOutput::new(format!("Invoice {} sent", params.invoice_id)).with("result", response))
    }

    pub async fn void_invoice(&self, params: InvoiceIdParams) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("void_invoice", "void the invoice", "invoice")
            .lookup("list_invoices")
            .conflict("Paid invoices cannot be voided.");

        let location_id = resolve_location(&self.ctx, "void_invoice", params.location_id)?;
        let invoice = send(
            &self.ctx,
            &GUIDE,
            Some(&params.invoice_id),
            ApiRequest::post(format!("/invoices/{}/void", params.invoice_id))
                .json(scoped_body(&location_id, json!({}))),
        )
        .await?;

        Ok(ToolOutput::new(format!("Invoice {} voided", params.invoice_id)).with("invoice", invoice))
    }

    pub async fn record_invoice_payment(
        &self,
        params: RecordPaymentParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance = Guidance::new("record_invoice_payment", "record the payment", "invoice")
            .lookup("list_invoices")
            .validation("amount is in dollars and cannot exceed the balance due.");

        let location_id = resolve_location(&self.ctx, "record_invoice_payment", params.location_id)?;
        let body = json!({
            "mode": params.mode,
            "amount": params.amount,
            "notes": params.notes,
        });

        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&params.invoice_id),
            ApiRequest::post(format!("/invoices/{}/record-payment", params.invoice_id))
                .json(scoped_body(&location_id, body)),
        )
        .await?;

        Ok(ToolOutput::new(format!(
            "Recorded {} payment on invoice {}",
            format_dollars(params.amount),
            params.invoice_id
        ))
        .with("result", response))
    }

    pub async fn generate_invoice_number(
        &self,
        params: InvoiceScopeParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("generate_invoice_number", "generate an invoice number", "location");

        let location_id = resolve_location(&self.ctx, "generate_invoice_number", params.location_id)?;
        let response = send(
            &self.ctx,
            &GUIDE,
            Some(&location_id),
            scoped(ApiRequest::get("/invoices/generate-invoice-number"), &location_id),
        )
        .await?;
        let number = response.get("invoiceNumber").cloned().unwrap_or(Value::Null);
        let shown = match &number {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        Ok(ToolOutput::new(format!("Next invoice number: {shown}")).with("invoiceNumber", number))
    }

    pub async fn list_invoice_templates(
        &self,
        params: ListTemplatesParams,
    ) -> ToolResult<ToolOutput> {
        const GUIDE: Guidance =
            Guidance::new("list_invoice_templates", "list invoice templates", "location");

        let location_id = resolve_location(&self.ctx, "list_invoice_templates", params.location_id)?;
        let request = scoped(ApiRequest::get("/invoices/template"), &location_id)
            .query("limit", params.limit.unwrap_or(DEFAULT_LIMIT))
            .query("offset", params.offset.unwrap_or(DEFAULT_OFFSET));

        let response = send(&self.ctx, &GUIDE, Some(&location_id), request).await?;
        let templates = array_at(&response, "data");

        Ok(ToolOutput::new(format!("Found {} invoice templates", templates.len()))
            .with("templates", templates))
    }
}

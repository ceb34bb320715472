//! Invoice document generation
//!
//! Runs outside the ledger commit. Generation failures are logged by
//! the caller and never roll anything back; a transaction without an
//! invoice can always be regenerated later.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::InvoiceStore;

/// Invoice generation service
#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
    store: InvoiceStore,
}

#[derive(Debug, FromRow)]
struct InvoiceHeader {
    id: Uuid,
    transaction_number: String,
    transaction_date: NaiveDate,
    kind: String,
    subtotal: Decimal,
    tax_amount: Decimal,
    discount_amount: Decimal,
    total_amount: Decimal,
    paid_amount: Decimal,
    payment_status: String,
    notes: Option<String>,
    invoice_url: Option<String>,
    contact_name: String,
    contact_phone: String,
    contact_address: Option<String>,
    contact_gstin: Option<String>,
}

#[derive(Debug, FromRow)]
struct InvoiceLine {
    product_name: String,
    size: String,
    packing: String,
    quantity: i32,
    unit_price: Decimal,
    line_total: Decimal,
}

impl InvoiceService {
    pub fn new(db: PgPool, config: Arc<Config>) -> Self {
        let store = InvoiceStore::new(&config.storage);
        Self { db, store }
    }

    /// Generate the invoice document for a committed transaction and
    /// record its URL and checksum. Skips transactions that already
    /// have one unless `force` is set.
    pub async fn generate(&self, transaction_id: Uuid, force: bool) -> AppResult<String> {
        let header = sqlx::query_as::<_, InvoiceHeader>(
            r#"
            SELECT t.id, t.transaction_number, t.transaction_date, t.kind,
                   t.subtotal, t.tax_amount, t.discount_amount, t.total_amount,
                   t.paid_amount, t.payment_status, t.notes, t.invoice_url,
                   c.name AS contact_name, c.phone AS contact_phone,
                   c.address AS contact_address, c.gstin AS contact_gstin
            FROM transactions t
            JOIN contacts c ON c.id = t.contact_id
            WHERE t.id = $1 AND t.deleted_at IS NULL
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        if let Some(url) = &header.invoice_url {
            if !force {
                return Ok(url.clone());
            }
        }

        let lines = sqlx::query_as::<_, InvoiceLine>(
            r#"
            SELECT p.name AS product_name, p.size, p.packing,
                   l.quantity, l.unit_price, l.line_total
            FROM transaction_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.transaction_id = $1 AND l.deleted_at IS NULL
            ORDER BY l.created_at ASC
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.db)
        .await?;

        let document = render_invoice(&header, &lines);
        let filename = format!("{}.html", header.transaction_number);
        let stored = self.store.put(&filename, document.as_bytes()).await?;

        sqlx::query(
            r#"
            UPDATE transactions
            SET invoice_url = $1, invoice_checksum = $2, updated_at = now()
            WHERE id = $3
            "#,
        )
        .bind(&stored.url)
        .bind(&stored.checksum)
        .bind(transaction_id)
        .execute(&self.db)
        .await?;

        tracing::info!(
            transaction_number = %header.transaction_number,
            url = %stored.url,
            "Invoice generated"
        );

        Ok(stored.url)
    }
}

fn render_invoice(header: &InvoiceHeader, lines: &[InvoiceLine]) -> String {
    let generated_at: DateTime<Utc> = Utc::now();
    let title = match header.kind.as_str() {
        "sale" => "Invoice",
        _ => "Purchase Record",
    };

    let mut rows = String::new();
    for line in lines {
        rows.push_str(&format!(
            "<tr><td>{} ({}, {})</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            line.product_name,
            line.size,
            line.packing,
            line.quantity,
            line.unit_price,
            line.line_total
        ));
    }

    let contact_block = [
        Some(header.contact_name.clone()),
        Some(header.contact_phone.clone()),
        header.contact_address.clone(),
        header.contact_gstin.as_ref().map(|g| format!("GSTIN: {g}")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join("<br>");

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title} {number}</title></head>
<body>
<h1>{title} {number}</h1>
<p>Date: {date}</p>
<p>{contact_block}</p>
<table border="1" cellpadding="4" cellspacing="0">
<tr><th>Item</th><th>Qty</th><th>Unit Price</th><th>Total</th></tr>
{rows}</table>
<p>Subtotal: {subtotal}<br>
Tax: {tax}<br>
Discount: {discount}<br>
<strong>Total: {total}</strong><br>
Paid: {paid} ({status})</p>
{notes}
<p><small>Generated {generated_at}</small></p>
</body>
</html>
"#,
        title = title,
        number = header.transaction_number,
        date = header.transaction_date,
        contact_block = contact_block,
        rows = rows,
        subtotal = header.subtotal,
        tax = header.tax_amount,
        discount = header.discount_amount,
        total = header.total_amount,
        paid = header.paid_amount,
        status = header.payment_status,
        notes = header
            .notes
            .as_ref()
            .map(|n| format!("<p>Notes: {n}</p>"))
            .unwrap_or_default(),
        generated_at = generated_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

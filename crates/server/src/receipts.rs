//! Receipt API endpoints
//!
//! Creation and update take `multipart/form-data` with the text fields
//! `receiptName`, `amount`, `date` and an optional `image` file.

use api_types::{Message, Totals, receipt::Receipt};
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::NaiveDate;
use engine::{EngineError, MoneyCents, ReceiptDraft, ReceiptPatch, User};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

struct ImageUpload {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct ReceiptForm {
    receipt_name: Option<String>,
    amount: Option<String>,
    date: Option<String>,
    image: Option<ImageUpload>,
}

impl ReceiptForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ServerError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| ServerError::Generic(err.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let file_name = field.file_name().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|err| ServerError::Generic(err.body_text()))?;
                    if !bytes.is_empty() {
                        form.image = Some(ImageUpload {
                            file_name,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                "receiptName" | "amount" | "date" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|err| ServerError::Generic(err.body_text()))?;
                    let slot = match name.as_str() {
                        "receiptName" => &mut form.receipt_name,
                        "amount" => &mut form.amount,
                        _ => &mut form.date,
                    };
                    *slot = Some(text);
                }
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }
        Ok(form)
    }
}

fn parse_amount(raw: &str) -> Result<MoneyCents, ServerError> {
    Ok(raw.parse::<MoneyCents>()?)
}

fn parse_date(raw: &str) -> Result<NaiveDate, ServerError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        EngineError::Validation(format!("invalid date, expected YYYY-MM-DD: {raw}")).into()
    })
}

async fn store_image(
    state: &ServerState,
    image: Option<ImageUpload>,
) -> Result<Option<String>, ServerError> {
    let Some(image) = image else {
        return Ok(None);
    };
    state
        .uploads
        .save(image.file_name.as_deref(), &image.bytes)
        .await
        .map(Some)
        .map_err(|err| match err.kind() {
            std::io::ErrorKind::InvalidInput => ServerError::Generic(err.to_string()),
            _ => ServerError::Internal(format!("cannot store image: {err}")),
        })
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Receipt>), ServerError> {
    let form = ReceiptForm::read(multipart).await?;
    let amount = parse_amount(
        form.amount
            .as_deref()
            .ok_or_else(|| EngineError::InvalidAmount("amount is required".to_string()))?,
    )?;
    let date = parse_date(
        form.date
            .as_deref()
            .ok_or_else(|| EngineError::Validation("date is required".to_string()))?,
    )?;
    let image_url = store_image(&state, form.image).await?;

    let draft = ReceiptDraft {
        receipt_name: form.receipt_name.unwrap_or_default(),
        amount,
        date,
        image_url: image_url.clone(),
    };
    match state.engine.create_receipt(user.id, draft).await {
        Ok(receipt) => Ok((StatusCode::CREATED, Json(views::receipt(receipt)))),
        Err(err) => {
            if let Some(url) = image_url {
                state.uploads.remove(&url).await;
            }
            Err(err.into())
        }
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<Receipt>>, ServerError> {
    let receipts = state.engine.list_receipts(user.id).await?;
    Ok(Json(receipts.into_iter().map(views::receipt).collect()))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Receipt>, ServerError> {
    let receipt = state.engine.receipt(user.id, id).await?;
    Ok(Json(views::receipt(receipt)))
}

/// Partial update. A new image replaces the stored one.
pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Receipt>, ServerError> {
    let form = ReceiptForm::read(multipart).await?;
    let previous = state.engine.receipt(user.id, id).await?;

    let amount = form.amount.as_deref().map(parse_amount).transpose()?;
    let date = form.date.as_deref().map(parse_date).transpose()?;
    let image_url = store_image(&state, form.image).await?;

    let patch = ReceiptPatch {
        receipt_name: form.receipt_name,
        amount,
        date,
        image_url: image_url.clone(),
    };
    match state.engine.update_receipt(user.id, id, patch).await {
        Ok(receipt) => {
            if let (Some(_), Some(old)) = (&image_url, previous.image_url) {
                state.uploads.remove(&old).await;
            }
            Ok(Json(views::receipt(receipt)))
        }
        Err(err) => {
            if let Some(url) = image_url {
                state.uploads.remove(&url).await;
            }
            Err(err.into())
        }
    }
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ServerError> {
    let receipt = state.engine.delete_receipt(user.id, id).await?;
    if let Some(url) = receipt.image_url {
        state.uploads.remove(&url).await;
    }
    Ok(Json(Message::new("receipt deleted")))
}

pub async fn total(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Totals>, ServerError> {
    let totals = state.engine.receipt_totals(user.id).await?;
    Ok(Json(views::totals(totals)))
}

/// Serve a stored receipt image.
pub async fn image(
    State(state): State<ServerState>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let (bytes, content_type) = state.uploads.open(&file).await.map_err(|err| {
        tracing::debug!(file, "image not served: {err}");
        StatusCode::NOT_FOUND
    })?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

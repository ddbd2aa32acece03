use serde::{Deserialize, Serialize};

use crate::sweets::repo::Sweet;

#[derive(Debug, Deserialize)]
pub struct CreateSweetRequest {
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub quantity: Option<i32>,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSweetRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i32>,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Body for purchase and restock.
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct SweetResponse {
    pub message: &'static str,
    pub data: Sweet,
}

#[derive(Debug, Serialize)]
pub struct SweetListResponse {
    pub message: &'static str,
    pub data: Vec<Sweet>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// What a buyer gets back from a purchase.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub sweet_name: String,
    pub quantity: i32,
    pub total: f64,
    pub remaining_stock: i32,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub message: &'static str,
    pub data: PurchaseReceipt,
}

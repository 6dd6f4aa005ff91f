//! Backend over HTTP.
//!
//! Cart, wishlist and address calls go to the REST API. Orders, order lines
//! and the bulk cart clear go to the record store's `/rest/v1/<table>`
//! endpoints.

use crate::address::{AddressDraft, ShippingAddress};
use crate::api::{ApiResult, CommerceApi};
use crate::cart::CartLineItem;
use crate::checkout::{
    CheckoutAddress, NewOrder, OrderLine, OrderNumber, OrderStatus, OrderSummary, PaymentMethod,
};
use crate::config::{ApiConfig, StorefrontConfig};
use crate::error::{RemoteError, RemoteErrorKind};
use crate::ids::{AddressId, CartRowId, LineItemId, OrderId, ProductId};
use crate::money::Money;
use crate::wishlist::{ProductSnapshot, WishlistEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use yf_auth::{Session, UserId};
use yf_data::{ClientRequestBuilder, FetchClient, FetchError};

/// Columns read back for order listings.
const ORDER_COLUMNS: &str = "id,order_number,status,total_amount,created_at";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryDto {
    Name(String),
    Object { name: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDto {
    id: ProductId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    price: Money,
    /// Absolute amount off `price`.
    #[serde(default)]
    discount: Option<Money>,
    #[serde(default)]
    category: Option<CategoryDto>,
}

impl ProductDto {
    fn discount(&self) -> Money {
        self.discount.unwrap_or(Money::ZERO).max(Money::ZERO)
    }

    fn into_snapshot(self) -> ProductSnapshot {
        let discount_percent = self.price.percent_of(self.discount());
        ProductSnapshot {
            id: self.id,
            name: self.name,
            description: self.description.unwrap_or_default(),
            image: self.image_url.unwrap_or_default(),
            price: self.price,
            discount_percent,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CartRowDto {
    id: CartRowId,
    quantity: u32,
    product: ProductDto,
}

impl CartRowDto {
    fn into_line(self, default_category: &str) -> CartLineItem {
        let discount = self.product.discount();
        let category = match self.product.category {
            Some(CategoryDto::Name(name) | CategoryDto::Object { name }) if !name.is_empty() => name,
            _ => default_category.to_string(),
        };
        CartLineItem {
            id: LineItemId::for_product(self.product.id),
            product_id: self.product.id,
            name: self.product.name,
            unit_price: self.product.price.saturating_sub(discount),
            original_price: discount.is_positive().then_some(self.product.price),
            image: self.product.image_url.unwrap_or_default(),
            quantity: self.quantity,
            category,
            remote_id: Some(self.id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WishlistItemDto {
    product: ProductDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressDto {
    id: AddressId,
    name: String,
    #[serde(default)]
    phone: String,
    address_line1: String,
    #[serde(default)]
    address_line2: Option<String>,
    city: String,
    state: String,
    #[serde(default)]
    country: String,
    zip_code: String,
    #[serde(default)]
    is_default: Option<bool>,
}

impl From<AddressDto> for ShippingAddress {
    fn from(dto: AddressDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            phone: dto.phone,
            address_line1: dto.address_line1,
            address_line2: dto.address_line2.filter(|s| !s.is_empty()),
            city: dto.city,
            state: dto.state,
            country: dto.country,
            zip_code: dto.zip_code,
            is_default: dto.is_default.unwrap_or(false),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressRequest<'a> {
    name: &'a str,
    phone: &'a str,
    address_line1: &'a str,
    address_line2: Option<&'a str>,
    city: &'a str,
    state: &'a str,
    country: &'a str,
    zip_code: &'a str,
    is_default: bool,
}

impl<'a> From<&'a AddressDraft> for AddressRequest<'a> {
    fn from(d: &'a AddressDraft) -> Self {
        Self {
            name: &d.name,
            phone: &d.phone,
            address_line1: &d.address_line1,
            address_line2: d.address_line2.as_deref(),
            city: &d.city,
            state: &d.state,
            country: &d.country,
            zip_code: &d.zip_code,
            is_default: d.is_default,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CartAddRequest {
    product_id: ProductId,
    quantity: u32,
}

#[derive(Serialize)]
struct CartUpdateRequest {
    quantity: u32,
}

/// A row of the record store's `orders` table.
#[derive(Serialize)]
struct OrderRow<'a> {
    user_id: UserId,
    order_number: &'a OrderNumber,
    status: OrderStatus,
    total_amount: Money,
    shipping_address: &'a CheckoutAddress,
    payment_method: PaymentMethod,
}

/// A row of the record store's `order_items` table.
#[derive(Serialize)]
struct OrderItemRow<'a> {
    order_id: OrderId,
    product_id: ProductId,
    product_name: &'a str,
    product_image: &'a str,
    price: Money,
    quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AtomicOrderRequest<'a> {
    order_number: &'a OrderNumber,
    status: OrderStatus,
    total_amount: Money,
    shipping_address: &'a CheckoutAddress,
    payment_method: PaymentMethod,
    items: Vec<AtomicOrderItem<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AtomicOrderItem<'a> {
    product_id: ProductId,
    product_name: &'a str,
    product_image: &'a str,
    price: Money,
    quantity: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AtomicOrderResponse {
    id: OrderId,
    order_number: OrderNumber,
    #[serde(default)]
    status: OrderStatus,
    total_amount: Money,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<AtomicOrderResponse> for OrderSummary {
    fn from(r: AtomicOrderResponse) -> Self {
        Self {
            id: r.id,
            order_number: r.order_number,
            status: r.status,
            total_amount: r.total_amount,
            created_at: r.created_at,
        }
    }
}

/// [`CommerceApi`] backed by the storefront's REST API and record store.
#[derive(Debug, Clone)]
pub struct HttpCommerceApi {
    rest: FetchClient,
    records: FetchClient,
    records_key: Option<String>,
    default_category: String,
}

impl HttpCommerceApi {
    /// Build clients for the configured endpoints.
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let rest = FetchClient::with_policy(config.timeout, config.retry)?
            .with_base_url(config.base_url.clone());
        let mut records = FetchClient::with_policy(config.timeout, config.retry)?
            .with_base_url(format!("{}/rest/v1", config.records_url().trim_end_matches('/')));
        if let Some(key) = &config.records_key {
            records = records.with_default_header("apikey", key.clone());
        }
        Ok(Self {
            rest,
            records,
            records_key: config.records_key.clone(),
            default_category: "General".to_string(),
        })
    }

    /// Build from the full storefront configuration.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, FetchError> {
        Ok(Self::new(&config.api)?.with_default_category(config.catalog.default_category.clone()))
    }

    /// Category used for cart rows whose product has none.
    pub fn with_default_category(mut self, category: impl Into<String>) -> Self {
        self.default_category = category.into();
        self
    }

    fn rest_auth<'a>(
        &self,
        builder: ClientRequestBuilder<'a>,
        session: &Session,
    ) -> ClientRequestBuilder<'a> {
        match session.credential.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// The record store takes the user's token, or its API key when there is none.
    fn records_auth<'a>(
        &self,
        builder: ClientRequestBuilder<'a>,
        session: &Session,
    ) -> ClientRequestBuilder<'a> {
        match session.credential.token().or(self.records_key.as_deref()) {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn cart_path(session: &Session) -> String {
        format!("/api/cart/{}", session.user_id())
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn single<T>(mut rows: Vec<T>, what: &str) -> ApiResult<T> {
    if rows.is_empty() {
        return Err(RemoteError::new(
            RemoteErrorKind::Decode,
            format!("record store returned no {what} row"),
        ));
    }
    Ok(rows.swap_remove(0))
}

#[async_trait]
impl CommerceApi for HttpCommerceApi {
    async fn fetch_cart(&self, session: &Session) -> ApiResult<Vec<CartLineItem>> {
        let rows: Vec<CartRowDto> = self
            .rest_auth(self.rest.get(Self::cart_path(session)), session)
            .send_json()
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_line(&self.default_category))
            .collect())
    }

    async fn add_cart_item(
        &self,
        session: &Session,
        product_id: ProductId,
        quantity: u32,
    ) -> ApiResult<CartLineItem> {
        let row: CartRowDto = self
            .rest_auth(self.rest.post(Self::cart_path(session)), session)
            .json(&CartAddRequest {
                product_id,
                quantity,
            })?
            .send_json()
            .await?;
        Ok(row.into_line(&self.default_category))
    }

    async fn update_cart_item(
        &self,
        session: &Session,
        row: CartRowId,
        quantity: u32,
    ) -> ApiResult<CartLineItem> {
        let path = format!("{}/{}", Self::cart_path(session), row);
        let row: CartRowDto = self
            .rest_auth(self.rest.put(path), session)
            .json(&CartUpdateRequest { quantity })?
            .send_json()
            .await?;
        Ok(row.into_line(&self.default_category))
    }

    async fn remove_cart_item(&self, session: &Session, row: CartRowId) -> ApiResult<()> {
        let path = format!("{}/{}", Self::cart_path(session), row);
        self.rest_auth(self.rest.delete(path), session)
            .send_empty()
            .await?;
        Ok(())
    }

    async fn clear_cart(&self, session: &Session) -> ApiResult<()> {
        self.records_auth(self.records.delete("/cart_items"), session)
            .query("user_id", eq(session.user_id()))
            .send_empty()
            .await?;
        Ok(())
    }

    async fn fetch_wishlist(&self, session: &Session) -> ApiResult<Vec<WishlistEntry>> {
        let items: Vec<WishlistItemDto> = self
            .rest_auth(self.rest.get("/api/wishlist"), session)
            .send_json()
            .await?;
        Ok(items
            .into_iter()
            .map(|item| WishlistEntry::new(item.product.into_snapshot()))
            .collect())
    }

    async fn add_wishlist(
        &self,
        session: &Session,
        product_id: ProductId,
    ) -> ApiResult<WishlistEntry> {
        let item: WishlistItemDto = self
            .rest_auth(self.rest.post(format!("/api/wishlist/{product_id}")), session)
            .send_json()
            .await?;
        Ok(WishlistEntry::new(item.product.into_snapshot()))
    }

    async fn remove_wishlist(&self, session: &Session, product_id: ProductId) -> ApiResult<()> {
        self.rest_auth(self.rest.delete(format!("/api/wishlist/{product_id}")), session)
            .send_empty()
            .await?;
        Ok(())
    }

    async fn list_addresses(&self, session: &Session) -> ApiResult<Vec<ShippingAddress>> {
        let rows: Vec<AddressDto> = self
            .rest_auth(self.rest.get("/api/addresses"), session)
            .send_json()
            .await?;
        Ok(rows.into_iter().map(ShippingAddress::from).collect())
    }

    async fn create_address(
        &self,
        session: &Session,
        draft: &AddressDraft,
    ) -> ApiResult<ShippingAddress> {
        let row: AddressDto = self
            .rest_auth(self.rest.post("/api/addresses"), session)
            .json(&AddressRequest::from(draft))?
            .send_json()
            .await?;
        Ok(row.into())
    }

    async fn update_address(
        &self,
        session: &Session,
        id: AddressId,
        draft: &AddressDraft,
    ) -> ApiResult<ShippingAddress> {
        let row: AddressDto = self
            .rest_auth(self.rest.put(format!("/api/addresses/{id}")), session)
            .json(&AddressRequest::from(draft))?
            .send_json()
            .await?;
        Ok(row.into())
    }

    async fn delete_address(&self, session: &Session, id: AddressId) -> ApiResult<()> {
        self.rest_auth(self.rest.delete(format!("/api/addresses/{id}")), session)
            .send_empty()
            .await?;
        Ok(())
    }

    async fn create_order(&self, session: &Session, order: &NewOrder) -> ApiResult<OrderSummary> {
        let row = OrderRow {
            user_id: session.user_id(),
            order_number: &order.order_number,
            status: order.status,
            total_amount: order.total_amount,
            shipping_address: &order.shipping_address,
            payment_method: order.payment_method,
        };
        let rows: Vec<OrderSummary> = self
            .records_auth(self.records.post("/orders"), session)
            .header("Prefer", "return=representation")
            .query("select", ORDER_COLUMNS)
            .json(&row)?
            .send_json()
            .await?;
        single(rows, "order")
    }

    async fn create_order_items(
        &self,
        session: &Session,
        order_id: OrderId,
        lines: &[OrderLine],
    ) -> ApiResult<()> {
        let rows: Vec<OrderItemRow<'_>> = lines
            .iter()
            .map(|line| OrderItemRow {
                order_id,
                product_id: line.product_id,
                product_name: &line.product_name,
                product_image: &line.product_image,
                price: line.price,
                quantity: line.quantity,
            })
            .collect();
        self.records_auth(self.records.post("/order_items"), session)
            .json(&rows)?
            .send_empty()
            .await?;
        Ok(())
    }

    async fn delete_order(&self, session: &Session, order_id: OrderId) -> ApiResult<()> {
        self.records_auth(self.records.delete("/order_items"), session)
            .query("order_id", eq(order_id))
            .send_empty()
            .await?;
        self.records_auth(self.records.delete("/orders"), session)
            .query("id", eq(order_id))
            .query("user_id", eq(session.user_id()))
            .send_empty()
            .await?;
        Ok(())
    }

    async fn place_order_atomic(
        &self,
        session: &Session,
        order: &NewOrder,
        lines: &[OrderLine],
    ) -> ApiResult<OrderSummary> {
        let body = AtomicOrderRequest {
            order_number: &order.order_number,
            status: order.status,
            total_amount: order.total_amount,
            shipping_address: &order.shipping_address,
            payment_method: order.payment_method,
            items: lines
                .iter()
                .map(|line| AtomicOrderItem {
                    product_id: line.product_id,
                    product_name: &line.product_name,
                    product_image: &line.product_image,
                    price: line.price,
                    quantity: line.quantity,
                })
                .collect(),
        };
        let placed: AtomicOrderResponse = self
            .rest_auth(self.rest.post("/api/orders"), session)
            .json(&body)?
            .send_json()
            .await?;
        Ok(placed.into())
    }

    async fn list_orders(&self, session: &Session, limit: usize) -> ApiResult<Vec<OrderSummary>> {
        let rows: Vec<OrderSummary> = self
            .records_auth(self.records.get("/orders"), session)
            .query("select", ORDER_COLUMNS)
            .query("user_id", eq(session.user_id()))
            .query("order", "created_at.desc")
            .query("limit", limit.to_string())
            .send_json()
            .await?;
        Ok(rows)
    }
}

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    RelationTrait, Set, TransactionTrait, sea_query::LockType,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    domain::order_status::OrderStatus,
    dto::orders::{
        CreateOrderRequest, CustomerContact, OrderCreated, OrderDetails, OrderLine, OrderList,
        OrderStatusChanged, SellerOrderDetails, SellerOrderList, SellerOrderSummary,
        UpdateOrderStatusRequest,
    },
    entity::{
        CartEntries, Carts, CustomerAddresses, Listings, OrderEntries, Orders, Users,
        cart_entries::Column as CartEntryCol,
        carts::Column as CartCol,
        customer_addresses::{ActiveModel as AddressActive, Column as AddressCol},
        listings::{self, Column as ListingCol},
        order_entries::{self, ActiveModel as OrderEntryActive, Column as OrderEntryCol},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        products::Column as ProductCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_customer, ensure_seller},
    models::{Order, ShippingAddress},
    notify::{self, Notification, NotificationKind},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::inventory_service,
    state::AppState,
};

/// Turns the caller's cart into a pending order.
///
/// Cart rows and listing rows are locked for the whole transaction, so the stock
/// check and the decrement see the same quantities. Any error before `commit`
/// drops the transaction and leaves no order, entry or stock change behind.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderCreated>> {
    ensure_customer(user)?;
    let address = payload.validate()?;

    let txn = state.orm.begin().await?;

    let cart = Carts::find()
        .filter(CartCol::CustomerId.eq(user.user_id))
        .one(&txn)
        .await?;
    let cart = match cart {
        Some(c) => c,
        None => return Err(AppError::EmptyCart),
    };

    let entries = CartEntries::find()
        .filter(CartEntryCol::CartId.eq(cart.id))
        .order_by_asc(CartEntryCol::ListingId)
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    if entries.is_empty() {
        return Err(AppError::EmptyCart);
    }

    // Lock in listing id order so two checkouts never wait on each other crosswise.
    let listing_ids: Vec<Uuid> = entries.iter().map(|e| e.listing_id).collect();
    let listings: HashMap<Uuid, listings::Model> = Listings::find()
        .filter(ListingCol::Id.is_in(listing_ids))
        .order_by_asc(ListingCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|l| (l.id, l))
        .collect();

    let mut total = Decimal::ZERO;
    let mut unit_prices = Vec::with_capacity(entries.len());
    for entry in &entries {
        let listing = match listings.get(&entry.listing_id) {
            Some(l) => l,
            None => return Err(AppError::NotFound),
        };
        if entry.amount > listing.quantity {
            return Err(AppError::InsufficientStock {
                listing_id: listing.id,
                requested: entry.amount,
                available: listing.quantity,
            });
        }
        total += listing.price * Decimal::from(entry.amount);
        unit_prices.push(listing.price);
    }

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(user.user_id),
        price: Set(total),
        order_status: Set(OrderStatus::Pending.as_str().to_string()),
        purchased_at: Set(now.into()),
        address_street: Set(address.street.clone()),
        address_city: Set(address.city.clone()),
        address_state: Set(address.state.clone()),
        address_country: Set(address.country.clone()),
        address_postal_code: Set(address.postal_code.clone()),
        modified_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    for (entry, unit_price) in entries.iter().zip(unit_prices) {
        OrderEntryActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            listing_id: Set(entry.listing_id),
            quantity: Set(entry.amount),
            unit_price: Set(unit_price),
        }
        .insert(&txn)
        .await?;

        inventory_service::reserve(&txn, entry.listing_id, entry.amount).await?;
    }

    CartEntries::delete_many()
        .filter(CartEntryCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    remember_address(&txn, user.user_id, &address).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, customer_id = %user.user_id, price = %total, "order created");
    audit::record(
        &state.pool,
        user.user_id,
        "order_create",
        "orders",
        json!({ "order_id": order.id, "price": total, "entries": entries.len() }),
    )
    .await;
    notify::dispatch(
        state,
        Notification {
            recipient: user.user_id,
            kind: NotificationKind::OrderConfirmation,
            context: json!({ "order_id": order.id, "price": total }),
        },
    );

    Ok(ApiResponse::success(
        "Order created",
        OrderCreated { id: order.id },
        Some(Meta::empty()),
    ))
}

/// Customer cancellation. Only pending orders can be cancelled.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderStatusChanged>> {
    ensure_customer(user)?;

    let txn = state.orm.begin().await?;
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::CustomerId.eq(user.user_id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let order = apply_transition(&txn, order, OrderStatus::Cancelled).await?;
    txn.commit().await?;

    after_status_change(state, user, &order, OrderStatus::Cancelled).await;

    Ok(ApiResponse::success(
        "Order cancelled",
        OrderStatusChanged {
            order_id: order.id,
            new_status: OrderStatus::Cancelled,
        },
        Some(Meta::empty()),
    ))
}

/// Seller driven transition on an order that contains at least one of their listings.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderStatusChanged>> {
    ensure_seller(user)?;
    let next: OrderStatus = payload.status.parse()?;

    let txn = state.orm.begin().await?;

    let owned_entries = OrderEntries::find()
        .inner_join(Listings)
        .filter(OrderEntryCol::OrderId.eq(id))
        .filter(ListingCol::SellerId.eq(user.user_id))
        .count(&txn)
        .await?;
    if owned_entries == 0 {
        return Err(AppError::NotFound);
    }

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let order = apply_transition(&txn, order, next).await?;
    txn.commit().await?;

    after_status_change(state, user, &order, next).await;

    Ok(ApiResponse::success(
        "Order status updated",
        OrderStatusChanged {
            order_id: order.id,
            new_status: next,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_customer(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(OrderCol::CustomerId.eq(user.user_id));
    if let Some(status) = parse_status_filter(query.status.as_deref())? {
        condition = condition.add(OrderCol::OrderStatus.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or_default() {
        SortOrder::Asc => finder.order_by_asc(OrderCol::PurchasedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::PurchasedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetails>> {
    ensure_customer(user)?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::CustomerId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let entries = order_lines(&state.orm, vec![order.id], None)
        .await?
        .into_iter()
        .map(|(_, line)| line)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderDetails {
            order: Order::from_entity(order)?,
            entries,
        },
        Some(Meta::empty()),
    ))
}

/// Orders that contain at least one of the seller's listings. `total_amount` only
/// counts the seller's own lines.
pub async fn list_seller_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<SellerOrderList>> {
    ensure_seller(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let seller_order_ids = OrderEntries::find()
        .select_only()
        .column(OrderEntryCol::OrderId)
        .inner_join(Listings)
        .filter(ListingCol::SellerId.eq(user.user_id))
        .into_query();

    let mut condition = Condition::all().add(OrderCol::Id.in_subquery(seller_order_ids));
    if let Some(status) = parse_status_filter(query.status.as_deref())? {
        condition = condition.add(OrderCol::OrderStatus.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or_default() {
        SortOrder::Asc => finder.order_by_asc(OrderCol::PurchasedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::PurchasedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids = orders.iter().map(|o| o.id).collect();
    let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
    for (order_id, line) in order_lines(&state.orm, ids, Some(user.user_id)).await? {
        *totals.entry(order_id).or_default() += line.line_total;
    }

    let items = orders
        .into_iter()
        .map(|o| {
            Ok(SellerOrderSummary {
                order_id: o.id,
                status: OrderStatus::from_db(&o.order_status)?,
                purchased_at: o.purchased_at.with_timezone(&Utc),
                total_amount: totals.get(&o.id).copied().unwrap_or_default(),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        SellerOrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_seller_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SellerOrderDetails>> {
    ensure_seller(user)?;

    let entries: Vec<OrderLine> = order_lines(&state.orm, vec![id], Some(user.user_id))
        .await?
        .into_iter()
        .map(|(_, line)| line)
        .collect();
    if entries.is_empty() {
        return Err(AppError::NotFound);
    }

    let order = match Orders::find_by_id(id).one(&state.orm).await? {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    let customer = match Users::find_by_id(order.customer_id).one(&state.orm).await? {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "OK",
        SellerOrderDetails {
            order: Order::from_entity(order)?,
            customer: CustomerContact {
                name: format!("{} {}", customer.name, customer.surname),
                email: customer.email,
            },
            entries,
        },
        Some(Meta::empty()),
    ))
}

fn parse_status_filter(status: Option<&str>) -> AppResult<Option<OrderStatus>> {
    match status.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Ok(Some(s.parse()?)),
        None => Ok(None),
    }
}

/// Applies a checked transition to a locked order. Cancelling hands every
/// entry's quantity back to the stock ledger in the same transaction.
async fn apply_transition(
    txn: &DatabaseTransaction,
    order: OrderModel,
    requested: OrderStatus,
) -> AppResult<OrderModel> {
    let current = OrderStatus::from_db(&order.order_status)?;
    let next = current.transition_to(requested)?;

    if next == OrderStatus::Cancelled {
        let entries = OrderEntries::find()
            .filter(OrderEntryCol::OrderId.eq(order.id))
            .order_by_asc(OrderEntryCol::ListingId)
            .all(txn)
            .await?;
        for entry in entries {
            inventory_service::release(txn, entry.listing_id, entry.quantity).await?;
        }
    }

    let mut active: OrderActive = order.into();
    active.order_status = Set(next.as_str().to_string());
    active.modified_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

async fn after_status_change(state: &AppState, user: &AuthUser, order: &OrderModel, next: OrderStatus) {
    tracing::info!(
        order_id = %order.id,
        actor = %user.user_id,
        status = %next,
        "order status changed"
    );
    audit::record(
        &state.pool,
        user.user_id,
        "order_status",
        "orders",
        json!({ "order_id": order.id, "status": next }),
    )
    .await;

    if next == OrderStatus::Cancelled {
        notify::dispatch(
            state,
            Notification {
                recipient: order.customer_id,
                kind: NotificationKind::OrderCancellation,
                context: json!({ "order_id": order.id, "cancelled_by": user.role }),
            },
        );
    }
}

/// Reuses a stored address when the customer already shipped to it.
async fn remember_address(
    txn: &DatabaseTransaction,
    customer_id: Uuid,
    address: &ShippingAddress,
) -> AppResult<()> {
    let existing = CustomerAddresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::CustomerId.eq(customer_id))
                .add(AddressCol::Street.eq(address.street.as_str()))
                .add(AddressCol::City.eq(address.city.as_str()))
                .add(AddressCol::State.eq(address.state.as_str()))
                .add(AddressCol::Country.eq(address.country.as_str()))
                .add(AddressCol::PostalCode.eq(address.postal_code.as_str())),
        )
        .one(txn)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    AddressActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer_id),
        street: Set(address.street.clone()),
        city: Set(address.city.clone()),
        state: Set(address.state.clone()),
        country: Set(address.country.clone()),
        postal_code: Set(address.postal_code.clone()),
        created_at: Set(Utc::now().into()),
    }
    .insert(txn)
    .await?;
    Ok(())
}

#[derive(Debug, FromQueryResult)]
struct OrderLineRow {
    order_id: Uuid,
    entry_id: Uuid,
    listing_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    product_id: Uuid,
    seller_id: Uuid,
    product_name: String,
}

/// Entries of the given orders joined with listing and product in one read,
/// optionally narrowed to one seller's listings.
async fn order_lines<C: ConnectionTrait>(
    conn: &C,
    order_ids: Vec<Uuid>,
    seller_id: Option<Uuid>,
) -> AppResult<Vec<(Uuid, OrderLine)>> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut select = OrderEntries::find()
        .select_only()
        .column_as(OrderEntryCol::OrderId, "order_id")
        .column_as(OrderEntryCol::Id, "entry_id")
        .column_as(OrderEntryCol::ListingId, "listing_id")
        .column_as(OrderEntryCol::Quantity, "quantity")
        .column_as(OrderEntryCol::UnitPrice, "unit_price")
        .column_as(ListingCol::ProductId, "product_id")
        .column_as(ListingCol::SellerId, "seller_id")
        .column_as(ProductCol::Name, "product_name")
        .join(JoinType::InnerJoin, order_entries::Relation::Listings.def())
        .join(JoinType::InnerJoin, listings::Relation::Products.def())
        .filter(OrderEntryCol::OrderId.is_in(order_ids));
    if let Some(seller_id) = seller_id {
        select = select.filter(ListingCol::SellerId.eq(seller_id));
    }

    let rows = select
        .order_by_asc(OrderEntryCol::OrderId)
        .order_by_asc(ProductCol::Name)
        .into_model::<OrderLineRow>()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            (
                row.order_id,
                OrderLine {
                    entry_id: row.entry_id,
                    listing_id: row.listing_id,
                    product_id: row.product_id,
                    product_name: row.product_name,
                    seller_id: row.seller_id,
                    quantity: row.quantity,
                    unit_price: row.unit_price,
                    line_total: row.unit_price * Decimal::from(row.quantity),
                },
            )
        })
        .collect())
}

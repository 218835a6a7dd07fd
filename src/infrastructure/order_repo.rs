use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::{run_blocking, DbPool};
use crate::domain::errors::DomainError;
use crate::domain::events::{OrderCreated, OrderEvent};
use crate::domain::order::{NewOrder, Order, OrderLine, OrderStatus, PaymentStatus};
use crate::domain::ports::{OrderRepository, PaymentOutcome, TransitionOutcome};
use crate::domain::settlement::SettlementLine;
use crate::schema::{commerce_order_outbox, order_lines, orders};

use super::models::{NewOrderLineRow, NewOrderRow, NewOutboxEventRow, OrderLineRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

fn parse_column<T>(column: &str, value: &str) -> Result<T, DomainError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| DomainError::Internal(format!("corrupt {column} '{value}': {e}")))
}

fn line_from_row(row: OrderLineRow) -> Result<OrderLine, DomainError> {
    Ok(OrderLine {
        item_model: parse_column("item_model", &row.item_model)?,
        source: parse_column("source", &row.source)?,
        source_model: parse_column("source_model", &row.source_model)?,
        product_id: row.product_id,
        name: row.name,
        price: row.price,
        quantity: row.quantity,
        source_id: row.source_id,
        is_settled: row.is_settled,
    })
}

fn order_from_rows(row: OrderRow, lines: Vec<OrderLineRow>) -> Result<Order, DomainError> {
    Ok(Order {
        payment_method: parse_column("payment_method", &row.payment_method)?,
        payment_status: parse_column("payment_status", &row.payment_status)?,
        status: parse_column("status", &row.status)?,
        items: lines.into_iter().map(line_from_row).collect::<Result<_, _>>()?,
        id: row.id,
        user_id: row.user_id,
        total_amount: row.total_amount,
        user_name: row.user_name,
        user_phone: row.user_phone,
        address: row.address,
        room_number: row.room_number,
        razorpay_order_id: row.razorpay_order_id,
        razorpay_payment_id: row.razorpay_payment_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Attaches lines to `rows`, keeping the order of `rows`.
fn with_lines(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
    let lines: Vec<OrderLineRow> = OrderLineRow::belonging_to(&rows)
        .select(OrderLineRow::as_select())
        .order(order_lines::position.asc())
        .load(conn)?;
    let lines = lines.grouped_by(&rows);
    rows.into_iter()
        .zip(lines)
        .map(|(row, lines)| order_from_rows(row, lines))
        .collect()
}

fn load_order(conn: &mut PgConnection, id: Uuid) -> Result<Option<Order>, DomainError> {
    let row: Option<OrderRow> = orders::table
        .find(id)
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;
    match row {
        Some(row) => Ok(with_lines(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

fn append_outbox(conn: &mut PgConnection, event: &OrderEvent) -> Result<(), DomainError> {
    // Debezium's EventRouter SMT derives the Kafka topic from `aggregate_type`.
    diesel::insert_into(commerce_order_outbox::table)
        .values(&NewOutboxEventRow {
            id: Uuid::new_v4(),
            aggregate_type: event.aggregate_type().to_string(),
            aggregate_id: event.aggregate_id(),
            event_type: event.event_type().to_string(),
            payload: event.payload(),
        })
        .execute(conn)?;
    Ok(())
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn create(&self, new: NewOrder) -> Result<Order, DomainError> {
        run_blocking(&self.pool, move |conn| {
            conn.transaction::<_, DomainError, _>(|conn| {
                // 1. Insert the order
                let order_id = Uuid::new_v4();
                diesel::insert_into(orders::table)
                    .values(&NewOrderRow {
                        id: order_id,
                        user_id: new.user_id,
                        total_amount: new.total_amount.clone(),
                        user_name: new.customer.name.clone(),
                        user_phone: new.customer.phone.clone(),
                        address: new.address.clone(),
                        room_number: new.room_number.clone(),
                        payment_method: new.payment_method.as_str().to_string(),
                        payment_status: PaymentStatus::Pending.as_str().to_string(),
                        razorpay_order_id: new.razorpay_order_id.clone(),
                        status: OrderStatus::Pending.as_str().to_string(),
                    })
                    .execute(conn)?;

                // 2. Insert order lines
                let new_lines: Vec<NewOrderLineRow> = new
                    .items
                    .iter()
                    .enumerate()
                    .map(|(position, l)| NewOrderLineRow {
                        id: Uuid::new_v4(),
                        order_id,
                        position: position as i32,
                        product_id: l.product_id.clone(),
                        item_model: l.item_model.as_str().to_string(),
                        name: l.name.clone(),
                        price: l.price.clone(),
                        quantity: l.quantity,
                        source: l.source.as_str().to_string(),
                        source_id: l.source_id.clone(),
                        source_model: l.source_model.as_str().to_string(),
                        is_settled: false,
                    })
                    .collect();
                diesel::insert_into(order_lines::table)
                    .values(&new_lines)
                    .execute(conn)?;

                // 3. Outbox event in the same transaction.
                let order = load_order(conn, order_id)?.ok_or_else(|| {
                    DomainError::Internal(format!("order {order_id} missing after insert"))
                })?;
                append_outbox(
                    conn,
                    &OrderEvent::Created(OrderCreated {
                        order: order.clone(),
                    }),
                )?;

                Ok(order)
            })
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        run_blocking(&self.pool, move |conn| load_order(conn, id)).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        run_blocking(&self.pool, move |conn| {
            let rows: Vec<OrderRow> = orders::table
                .filter(orders::user_id.eq(user_id))
                .order(orders::created_at.desc())
                .select(OrderRow::as_select())
                .load(conn)?;
            with_lines(conn, rows)
        })
        .await
    }

    async fn list_for_vendor(&self, source_id: &str) -> Result<Vec<Order>, DomainError> {
        let source_id = source_id.to_string();
        run_blocking(&self.pool, move |conn| {
            let vendor_orders = order_lines::table
                .filter(order_lines::source_id.eq(&source_id))
                .select(order_lines::order_id);
            let rows: Vec<OrderRow> = orders::table
                .filter(orders::id.eq_any(vendor_orders))
                .order(orders::created_at.desc())
                .select(OrderRow::as_select())
                .load(conn)?;
            with_lines(conn, rows)
        })
        .await
    }

    async fn record_payment(
        &self,
        id: Uuid,
        payment_id: &str,
    ) -> Result<PaymentOutcome, DomainError> {
        let payment_id = payment_id.to_string();
        run_blocking(&self.pool, move |conn| {
            conn.transaction::<_, DomainError, _>(|conn| {
                let current: Option<(String, Option<String>, String)> = orders::table
                    .find(id)
                    .select((
                        orders::payment_status,
                        orders::razorpay_payment_id,
                        orders::status,
                    ))
                    .for_update()
                    .first(conn)
                    .optional()?;
                let Some((payment_status, recorded, status)) = current else {
                    return Ok(PaymentOutcome::NotFound);
                };

                let payment_status: PaymentStatus =
                    parse_column("payment_status", &payment_status)?;
                if payment_status != PaymentStatus::Pending {
                    return Ok(PaymentOutcome::NotPending {
                        payment_status,
                        payment_id: recorded,
                    });
                }

                let status: OrderStatus = parse_column("status", &status)?;
                let confirmed = status == OrderStatus::Pending;
                let new_status = if confirmed {
                    OrderStatus::Confirmed
                } else {
                    status
                };
                diesel::update(orders::table.find(id))
                    .set((
                        orders::payment_status.eq(PaymentStatus::Completed.as_str()),
                        orders::razorpay_payment_id.eq(payment_id.as_str()),
                        orders::status.eq(new_status.as_str()),
                        orders::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;

                append_outbox(
                    conn,
                    &OrderEvent::PaymentCaptured {
                        order_id: id,
                        payment_id: payment_id.clone(),
                        confirmed,
                    },
                )?;
                Ok(PaymentOutcome::Captured { confirmed })
            })
        })
        .await
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: &[OrderStatus],
        to: OrderStatus,
    ) -> Result<TransitionOutcome, DomainError> {
        let from = from.to_vec();
        run_blocking(&self.pool, move |conn| {
            conn.transaction::<_, DomainError, _>(|conn| {
                let current: Option<String> = orders::table
                    .find(id)
                    .select(orders::status)
                    .for_update()
                    .first(conn)
                    .optional()?;
                let Some(current) = current else {
                    return Ok(TransitionOutcome::NotFound);
                };
                let current: OrderStatus = parse_column("status", &current)?;
                if !from.contains(&current) {
                    return Ok(TransitionOutcome::Rejected { current });
                }

                diesel::update(orders::table.find(id))
                    .set((
                        orders::status.eq(to.as_str()),
                        orders::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
                append_outbox(
                    conn,
                    &OrderEvent::StatusChanged {
                        order_id: id,
                        from: current,
                        to,
                    },
                )?;
                Ok(TransitionOutcome::Applied { from: current })
            })
        })
        .await
    }

    async fn settlement_lines(&self) -> Result<Vec<SettlementLine>, DomainError> {
        run_blocking(&self.pool, |conn| {
            let rows: Vec<(String, String, BigDecimal, i32, bool)> = order_lines::table
                .inner_join(orders::table)
                .filter(orders::status.ne(OrderStatus::Cancelled.as_str()))
                .select((
                    order_lines::source,
                    order_lines::source_id,
                    order_lines::price,
                    order_lines::quantity,
                    order_lines::is_settled,
                ))
                .load(conn)?;
            rows.into_iter()
                .map(|(source, source_id, price, quantity, is_settled)| {
                    Ok(SettlementLine {
                        source: parse_column("source", &source)?,
                        source_id,
                        price,
                        quantity,
                        is_settled,
                    })
                })
                .collect()
        })
        .await
    }

    async fn settle_vendor(&self, source_id: &str) -> Result<u64, DomainError> {
        let source_id = source_id.to_string();
        run_blocking(&self.pool, move |conn| {
            conn.transaction::<_, DomainError, _>(|conn| {
                // One conditional UPDATE: concurrent settlements of the same
                // vendor serialise on the row locks and cannot lose lines.
                let settled = diesel::update(
                    order_lines::table
                        .filter(order_lines::source_id.eq(&source_id))
                        .filter(order_lines::is_settled.eq(false)),
                )
                .set(order_lines::is_settled.eq(true))
                .execute(conn)? as u64;

                if settled > 0 {
                    append_outbox(
                        conn,
                        &OrderEvent::VendorSettled {
                            source_id: source_id.clone(),
                            lines: settled,
                        },
                    )?;
                }
                Ok(settled)
            })
        })
        .await
    }
}

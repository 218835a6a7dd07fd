use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::{run_blocking, DbPool};
use crate::domain::errors::DomainError;
use crate::domain::ports::{UserDirectory, UserProfile, VendorDirectory};
use crate::domain::vendor::{Vendor, VendorKind};
use crate::schema::{stores, user_order_history, users, vending_machines};

use super::models::{StoreRow, UserRow, VendingMachineRow};

/// Reads the user and vendor records the storefront maintains.
pub struct DieselDirectory {
    pool: DbPool,
}

impl DieselDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl From<StoreRow> for Vendor {
    fn from(row: StoreRow) -> Self {
        Vendor {
            kind: VendorKind::Store,
            id: row.id,
            code: row.code,
            name: row.name,
            email: row.email,
        }
    }
}

impl From<VendingMachineRow> for Vendor {
    fn from(row: VendingMachineRow) -> Self {
        Vendor {
            kind: VendorKind::VendingMachine,
            id: row.id,
            code: row.code,
            name: row.name,
            email: None,
        }
    }
}

#[async_trait]
impl UserDirectory for DieselDirectory {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserProfile>, DomainError> {
        run_blocking(&self.pool, move |conn| {
            let row: Option<UserRow> = users::table
                .find(id)
                .select(UserRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(|u| UserProfile {
                id: u.id,
                name: u.name,
                phone: u.phone,
                email: u.email,
            }))
        })
        .await
    }

    async fn append_order_history(&self, user_id: Uuid, order_id: Uuid) -> Result<(), DomainError> {
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(user_order_history::table)
                .values((
                    user_order_history::user_id.eq(user_id),
                    user_order_history::order_id.eq(order_id),
                ))
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl VendorDirectory for DieselDirectory {
    async fn find_by_id(&self, kind: VendorKind, id: Uuid) -> Result<Option<Vendor>, DomainError> {
        run_blocking(&self.pool, move |conn| {
            let vendor = match kind {
                VendorKind::Store => stores::table
                    .find(id)
                    .select(StoreRow::as_select())
                    .first::<StoreRow>(conn)
                    .optional()?
                    .map(Vendor::from),
                VendorKind::VendingMachine => vending_machines::table
                    .find(id)
                    .select(VendingMachineRow::as_select())
                    .first::<VendingMachineRow>(conn)
                    .optional()?
                    .map(Vendor::from),
            };
            Ok(vendor)
        })
        .await
    }

    async fn find_by_code(
        &self,
        kind: VendorKind,
        code: &str,
    ) -> Result<Option<Vendor>, DomainError> {
        let code = code.to_string();
        run_blocking(&self.pool, move |conn| {
            let vendor = match kind {
                VendorKind::Store => stores::table
                    .filter(stores::code.eq(&code))
                    .select(StoreRow::as_select())
                    .first::<StoreRow>(conn)
                    .optional()?
                    .map(Vendor::from),
                VendorKind::VendingMachine => vending_machines::table
                    .filter(vending_machines::code.eq(&code))
                    .select(VendingMachineRow::as_select())
                    .first::<VendingMachineRow>(conn)
                    .optional()?
                    .map(Vendor::from),
            };
            Ok(vendor)
        })
        .await
    }
}

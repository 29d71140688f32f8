use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use moneta_core::sync::{
    remote_wins, CategoryImport, PaymentMethodImport, ReminderImport, ReplicaStore,
    TransactionImport, UpsertOutcome,
};
use moneta_core::Result;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{categories, payment_methods, reminders, transactions};

use super::model::{CategoryDB, PaymentMethodDB, ReminderDB, TransactionDB};

/// Upsert repository for the four replicated tables.
///
/// Rows are keyed on `(zenith_id, user_id)`; applied writes carry the remote
/// `created_at` as the local `updated_at`, so re-delivering the same page is a
/// no-op and only a strictly newer remote row overwrites local state.
pub struct ReplicaRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ReplicaRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ReplicaStore for ReplicaRepository {
    async fn upsert_category(&self, row: CategoryImport) -> Result<UpsertOutcome> {
        self.writer
            .exec(move |conn| {
                let existing = categories::table
                    .filter(categories::zenith_id.eq(&row.zenith_id))
                    .filter(categories::user_id.eq(&row.user_id))
                    .first::<CategoryDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                match existing {
                    Some(local) => {
                        if !remote_wins(&row.remote_created_at, &local.updated_at) {
                            return Ok(UpsertOutcome::Unchanged);
                        }
                        diesel::update(categories::table.find(&local.id))
                            .set((
                                categories::name.eq(&row.name),
                                categories::color.eq(&row.color),
                                categories::icon.eq(&row.icon),
                                categories::updated_at.eq(&row.remote_created_at),
                            ))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        Ok(UpsertOutcome::Updated)
                    }
                    None => {
                        let record = CategoryDB {
                            id: Uuid::new_v4().to_string(),
                            user_id: row.user_id,
                            name: row.name,
                            color: row.color,
                            icon: row.icon,
                            zenith_id: Some(row.zenith_id),
                            created_at: row.remote_created_at.clone(),
                            updated_at: row.remote_created_at,
                        };
                        diesel::insert_into(categories::table)
                            .values(&record)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        Ok(UpsertOutcome::Inserted)
                    }
                }
            })
            .await
    }

    async fn upsert_payment_method(&self, row: PaymentMethodImport) -> Result<UpsertOutcome> {
        self.writer
            .exec(move |conn| {
                let existing = payment_methods::table
                    .filter(payment_methods::zenith_id.eq(&row.zenith_id))
                    .filter(payment_methods::user_id.eq(&row.user_id))
                    .first::<PaymentMethodDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                match existing {
                    Some(local) => {
                        if !remote_wins(&row.remote_created_at, &local.updated_at) {
                            return Ok(UpsertOutcome::Unchanged);
                        }
                        diesel::update(payment_methods::table.find(&local.id))
                            .set((
                                payment_methods::name.eq(&row.name),
                                payment_methods::method_type.eq(&row.method_type),
                                payment_methods::updated_at.eq(&row.remote_created_at),
                            ))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        Ok(UpsertOutcome::Updated)
                    }
                    None => {
                        let record = PaymentMethodDB {
                            id: Uuid::new_v4().to_string(),
                            user_id: row.user_id,
                            name: row.name,
                            method_type: row.method_type,
                            zenith_id: Some(row.zenith_id),
                            created_at: row.remote_created_at.clone(),
                            updated_at: row.remote_created_at,
                        };
                        diesel::insert_into(payment_methods::table)
                            .values(&record)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        Ok(UpsertOutcome::Inserted)
                    }
                }
            })
            .await
    }

    async fn upsert_transaction(&self, row: TransactionImport) -> Result<UpsertOutcome> {
        self.writer
            .exec(move |conn| {
                let existing = transactions::table
                    .filter(transactions::zenith_id.eq(&row.zenith_id))
                    .filter(transactions::user_id.eq(&row.user_id))
                    .first::<TransactionDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                let amount = row.amount.to_string();
                match existing {
                    Some(local) => {
                        if !remote_wins(&row.remote_created_at, &local.updated_at) {
                            return Ok(UpsertOutcome::Unchanged);
                        }
                        diesel::update(transactions::table.find(&local.id))
                            .set((
                                transactions::description.eq(&row.description),
                                transactions::amount.eq(&amount),
                                transactions::transaction_date.eq(&row.transaction_date),
                                transactions::category_id.eq(&row.category_id),
                                transactions::payment_method_id.eq(&row.payment_method_id),
                                transactions::notes.eq(&row.notes),
                                transactions::updated_at.eq(&row.remote_created_at),
                            ))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        Ok(UpsertOutcome::Updated)
                    }
                    None => {
                        let record = TransactionDB {
                            id: Uuid::new_v4().to_string(),
                            user_id: row.user_id,
                            description: row.description,
                            amount,
                            transaction_date: row.transaction_date,
                            category_id: row.category_id,
                            payment_method_id: row.payment_method_id,
                            notes: row.notes,
                            zenith_id: Some(row.zenith_id),
                            created_at: row.remote_created_at.clone(),
                            updated_at: row.remote_created_at,
                        };
                        diesel::insert_into(transactions::table)
                            .values(&record)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        Ok(UpsertOutcome::Inserted)
                    }
                }
            })
            .await
    }

    async fn upsert_reminder(&self, row: ReminderImport) -> Result<UpsertOutcome> {
        self.writer
            .exec(move |conn| {
                let existing = reminders::table
                    .filter(reminders::zenith_id.eq(&row.zenith_id))
                    .filter(reminders::user_id.eq(&row.user_id))
                    .first::<ReminderDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?;

                let amount = row.amount.map(|a| a.to_string());
                match existing {
                    Some(local) => {
                        if !remote_wins(&row.remote_created_at, &local.updated_at) {
                            return Ok(UpsertOutcome::Unchanged);
                        }
                        diesel::update(reminders::table.find(&local.id))
                            .set((
                                reminders::title.eq(&row.title),
                                reminders::due_date.eq(&row.due_date),
                                reminders::amount.eq(&amount),
                                reminders::is_paid.eq(row.is_paid as i32),
                                reminders::notes.eq(&row.notes),
                                reminders::updated_at.eq(&row.remote_created_at),
                            ))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        Ok(UpsertOutcome::Updated)
                    }
                    None => {
                        let record = ReminderDB {
                            id: Uuid::new_v4().to_string(),
                            user_id: row.user_id,
                            title: row.title,
                            due_date: row.due_date,
                            amount,
                            is_paid: row.is_paid as i32,
                            notes: row.notes,
                            zenith_id: Some(row.zenith_id),
                            created_at: row.remote_created_at.clone(),
                            updated_at: row.remote_created_at,
                        };
                        diesel::insert_into(reminders::table)
                            .values(&record)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                        Ok(UpsertOutcome::Inserted)
                    }
                }
            })
            .await
    }

    fn resolve_category_id(&self, zenith_id: &str, user_id: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let id = categories::table
            .filter(categories::zenith_id.eq(zenith_id))
            .filter(categories::user_id.eq(user_id))
            .select(categories::id)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(id)
    }

    fn resolve_payment_method_id(&self, zenith_id: &str, user_id: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let id = payment_methods::table
            .filter(payment_methods::zenith_id.eq(zenith_id))
            .filter(payment_methods::user_id.eq(user_id))
            .select(payment_methods::id)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(id)
    }
}

use diesel::prelude::*;

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CategoryDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub zenith_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::payment_methods)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PaymentMethodDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub method_type: Option<String>,
    pub zenith_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub amount: String,
    pub transaction_date: String,
    pub category_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub notes: Option<String>,
    pub zenith_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::reminders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReminderDB {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub due_date: String,
    pub amount: Option<String>,
    pub is_paid: i32,
    pub notes: Option<String>,
    pub zenith_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

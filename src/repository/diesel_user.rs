//! Diesel-based user repository for SQLite.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{NewUserRecord, UserRecord};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::{format_datetime, parse_datetime};
use crate::models::{NewUser, User};
use crate::schema::users;

/// Convert a database record to a domain model.
impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            username: record.username,
            email: record.email,
            password_hash: record.password_hash,
            role: record.role,
            is_active: record.is_active,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// Diesel-based user repository.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: AsyncSqlitePool,
}

impl DieselUserRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user and return it with its assigned ID.
    pub async fn create(&self, user: &NewUser) -> Result<User, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = format_datetime(&Utc::now());

        diesel::insert_into(users::table)
            .values(&NewUserRecord {
                username: &user.username,
                email: &user.email,
                password_hash: &user.password_hash,
                role: &user.role,
                is_active: user.is_active,
                created_at: &now,
                updated_at: &now,
            })
            .returning(UserRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map(User::from)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>, DieselError> {
        let mut conn = self.pool.get().await?;

        users::table
            .find(id)
            .select(UserRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(User::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, DieselError> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::username.eq(username))
            .select(UserRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DieselError> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::email.eq(email))
            .select(UserRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(User::from))
    }

    /// Persist every mutable field of `user` and bump `updated_at`.
    ///
    /// Returns the stored row, or `user` unchanged when no row has its ID.
    pub async fn update(&self, user: &User) -> Result<User, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = format_datetime(&Utc::now());

        let updated = diesel::update(users::table.find(user.id))
            .set((
                users::username.eq(&user.username),
                users::email.eq(&user.email),
                users::password_hash.eq(&user.password_hash),
                users::role.eq(&user.role),
                users::is_active.eq(user.is_active),
                users::updated_at.eq(&now),
            ))
            .returning(UserRecord::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;

        Ok(updated.map(User::from).unwrap_or_else(|| user.clone()))
    }

    /// Delete a user. Returns whether a row was removed.
    pub async fn delete(&self, id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::delete(users::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(rows > 0)
    }
}

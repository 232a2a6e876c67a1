use chrono::NaiveDate;
use sqlx::MySqlPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::model::attendance::{AttendanceRecord, AttendanceRow, AttendanceStatus, NewAttendance};
use crate::model::leave_request::{
    RequestDetails, RequestKind, RequestStatus, TimeOffRequest, TimeOffRow,
};
use crate::model::member::{Member, MemberRow, MemberUpdate};
use crate::store::{
    AttendanceStore, InsertOutcome, MemberFilter, MemberStore, RequestFilter, RequestStore,
    StoreError,
};

const ATTENDANCE_COLUMNS: &str = "id, subject_id, date, status, notes, created_at, updated_at";
const REQUEST_COLUMNS: &str =
    "id, subject_id, reason, message, requested_days, status, created_at, updated_at";
const MEMBER_COLUMNS: &str =
    "id, username, full_name, avatar_url, role, last_sign_in_at, created_at, updated_at";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl AttendanceStore for MySqlStore {
    async fn find_by_subject_and_date(
        &self,
        subject_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE subject_id = ? AND date = ?",
            ATTENDANCE_COLUMNS
        );

        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(subject_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(AttendanceRecord::from))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {} FROM attendance WHERE id = ?", ATTENDANCE_COLUMNS);

        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(AttendanceRecord::from))
    }

    async fn list_by_subject_in_range(
        &self,
        subject_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM attendance
            WHERE subject_id = ? AND date BETWEEN ? AND ?
            ORDER BY date DESC
            "#,
            ATTENDANCE_COLUMNS
        );

        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(subject_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn insert_if_absent(&self, new: NewAttendance) -> Result<InsertOutcome, StoreError> {
        let id = Uuid::new_v4().to_string();

        // unique key on (subject_id, date) turns a duplicate into a no-op
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO attendance (id, subject_id, date, status, notes)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.subject_id)
        .bind(new.date)
        .bind(new.status.as_ref())
        .bind(&new.notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            let record = self.find_by_id(&id).await?.ok_or(sqlx::Error::RowNotFound)?;
            return Ok(InsertOutcome::Inserted(record));
        }

        let existing = self
            .find_by_subject_and_date(&new.subject_id, new.date)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(InsertOutcome::Existing(existing))
    }

    async fn update(
        &self,
        id: &str,
        status: AttendanceStatus,
        notes: Option<String>,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        sqlx::query("UPDATE attendance SET status = ?, notes = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(notes)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.find_by_id(id).await
    }
}

impl RequestStore for MySqlStore {
    async fn create(
        &self,
        kind: RequestKind,
        subject_id: &str,
        details: RequestDetails,
    ) -> Result<TimeOffRequest, StoreError> {
        let id = Uuid::new_v4().to_string();
        let sql = format!(
            r#"
            INSERT INTO {}
                (id, subject_id, reason, message, requested_days, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            kind.table()
        );

        sqlx::query(&sql)
            .bind(&id)
            .bind(subject_id)
            .bind(&details.reason)
            .bind(&details.message)
            .bind(Json(&details.requested_days))
            .bind(RequestStatus::Pending.as_ref())
            .execute(&self.pool)
            .await?;

        let created = self.find(kind, &id).await?.ok_or(sqlx::Error::RowNotFound)?;
        Ok(created)
    }

    async fn find(&self, kind: RequestKind, id: &str) -> Result<Option<TimeOffRequest>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?", REQUEST_COLUMNS, kind.table());

        let row = sqlx::query_as::<_, TimeOffRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(TimeOffRequest::from))
    }

    async fn list(
        &self,
        kind: RequestKind,
        filter: &RequestFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<TimeOffRequest>, i64), StoreError> {
        let offset = page.saturating_sub(1) * per_page;

        // -------------------------
        // WHERE clause
        // -------------------------
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<&str> = Vec::new();

        if let Some(subject_id) = filter.subject_id.as_deref() {
            where_sql.push_str(" AND subject_id = ?");
            args.push(subject_id);
        }

        if let Some(status) = filter.status.as_ref() {
            where_sql.push_str(" AND status = ?");
            args.push(status.as_ref());
        }

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*) FROM {}{}", kind.table(), where_sql);

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = count_q.bind(*arg);
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            r#"
            SELECT {}
            FROM {}
            {}
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
            REQUEST_COLUMNS,
            kind.table(),
            where_sql
        );

        let mut data_q = sqlx::query_as::<_, TimeOffRow>(&data_sql);
        for arg in args {
            data_q = data_q.bind(arg);
        }

        let rows = data_q
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(TimeOffRequest::from).collect(), total))
    }

    async fn update_details(
        &self,
        kind: RequestKind,
        id: &str,
        subject_id: &str,
        details: RequestDetails,
    ) -> Result<Option<TimeOffRequest>, StoreError> {
        let sql = format!(
            r#"
            UPDATE {}
            SET reason = ?, message = ?, requested_days = ?
            WHERE id = ? AND subject_id = ? AND status = 'pending'
            "#,
            kind.table()
        );

        sqlx::query(&sql)
            .bind(&details.reason)
            .bind(&details.message)
            .bind(Json(&details.requested_days))
            .bind(id)
            .bind(subject_id)
            .execute(&self.pool)
            .await?;

        // MySQL reports zero affected rows when the values did not change
        let current = self.find(kind, id).await?;
        Ok(current.filter(|r| r.subject_id == subject_id && r.status == RequestStatus::Pending))
    }

    async fn set_status(
        &self,
        kind: RequestKind,
        id: &str,
        status: RequestStatus,
    ) -> Result<Option<TimeOffRequest>, StoreError> {
        let sql = format!(
            "UPDATE {} SET status = ? WHERE id = ? AND status = 'pending'",
            kind.table()
        );

        let result = sqlx::query(&sql)
            .bind(status.as_ref())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find(kind, id).await
    }
}

impl MemberStore for MySqlStore {
    async fn list_members(
        &self,
        filter: &MemberFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<Member>, i64), StoreError> {
        let offset = page.saturating_sub(1) * per_page;

        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<String> = Vec::new();

        if let Some(search) = filter.search.as_deref() {
            where_sql.push_str(" AND (username LIKE ? OR full_name LIKE ?)");
            let pattern = format!("%{}%", search);
            args.push(pattern.clone());
            args.push(pattern);
        }

        if let Some(role) = filter.role {
            // rows written by the old dashboard carry the kr_ prefix
            where_sql.push_str(" AND role IN (?, ?)");
            args.push(role.to_string());
            args.push(format!("kr_{}", role));
        }

        let count_sql = format!("SELECT COUNT(*) FROM profiles{}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = count_q.bind(arg);
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            r#"
            SELECT {}
            FROM profiles
            {}
            ORDER BY full_name ASC
            LIMIT ? OFFSET ?
            "#,
            MEMBER_COLUMNS, where_sql
        );
        let mut data_q = sqlx::query_as::<_, MemberRow>(&data_sql);
        for arg in args {
            data_q = data_q.bind(arg);
        }

        let rows = data_q
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Member::from).collect(), total))
    }

    async fn find_member(&self, id: &str) -> Result<Option<Member>, StoreError> {
        let sql = format!("SELECT {} FROM profiles WHERE id = ?", MEMBER_COLUMNS);

        let row = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Member::from))
    }

    async fn update_member(
        &self,
        id: &str,
        update: MemberUpdate,
    ) -> Result<Option<Member>, StoreError> {
        sqlx::query("UPDATE profiles SET username = ?, full_name = ?, avatar_url = ? WHERE id = ?")
            .bind(&update.username)
            .bind(&update.full_name)
            .bind(&update.avatar_url)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.find_member(id).await
    }
}

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::time_format::{
    format_date, format_time, format_timestamp, parse_date, parse_time, parse_timestamp,
};
use crate::models::{
    Approval, ApprovalAction, ApprovalCategory, ApprovalStatus, Booking, Business, Event,
    EventCondition, EventDetails, EventSpecification, EventStatus, PriceCategory, Role, User,
};

// ── Users ──

pub fn create_user(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO users (name, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
        params![name, email, password_hash, role.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let row = conn
        .query_row(
            "SELECT id, name, email, password_hash, role, created_at FROM users WHERE id = ?1",
            params![id],
            |row| Ok(parse_user_row(row)),
        )
        .optional()?;
    row.transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let row = conn
        .query_row(
            "SELECT id, name, email, password_hash, role, created_at FROM users WHERE email = ?1",
            params![email],
            |row| Ok(parse_user_row(row)),
        )
        .optional()?;
    row.transpose()
}

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let role_str: String = row.get(4)?;
    let created_at_str: String = row.get(5)?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::parse(&role_str)
            .ok_or_else(|| anyhow::anyhow!("unknown role in users table: {role_str}"))?,
        created_at: parse_timestamp(&created_at_str)?,
    })
}

// ── Businesses & Tourists ──

pub fn create_business(conn: &Connection, user_id: i64, name: &str) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO businesses (user_id, name) VALUES (?1, ?2)",
        params![user_id, name],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_business(conn: &Connection, id: i64) -> anyhow::Result<Option<Business>> {
    let business = conn
        .query_row(
            "SELECT id, user_id, name FROM businesses WHERE id = ?1",
            params![id],
            |row| {
                Ok(Business {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(business)
}

pub fn get_business_id_for_user(conn: &Connection, user_id: i64) -> anyhow::Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM businesses WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn create_tourist(conn: &Connection, user_id: i64) -> anyhow::Result<i64> {
    conn.execute("INSERT INTO tourists (user_id) VALUES (?1)", params![user_id])?;
    Ok(conn.last_insert_rowid())
}

pub fn get_tourist_id_for_user(conn: &Connection, user_id: i64) -> anyhow::Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM tourists WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

// ── Events ──

const EVENT_COLUMNS: &str = "id, business_id, name, event_type, category, maximum_count, \
     coordinator_name, coordinator_contact, description, hashtag, location, country, discount, \
     refund_policy, date, start_time, end_time, banner_url, status, created_at, updated_at";

pub fn insert_event(
    conn: &Connection,
    business_id: i64,
    details: &EventDetails,
    now: &NaiveDateTime,
) -> anyhow::Result<i64> {
    let now = format_timestamp(now);
    conn.execute(
        "INSERT INTO events (business_id, name, event_type, category, maximum_count, coordinator_name,
             coordinator_contact, description, hashtag, location, country, discount, refund_policy,
             date, start_time, end_time, banner_url, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, 'enabled', ?18, ?18)",
        params![
            business_id,
            details.name,
            details.event_type,
            details.category,
            details.maximum_count,
            details.coordinator_name,
            details.coordinator_contact,
            details.description,
            details.hashtag,
            details.location,
            details.country,
            details.discount,
            details.refund_policy,
            format_date(&details.date),
            format_time(&details.start_time),
            format_time(&details.end_time),
            details.banner_url,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_event(
    conn: &Connection,
    id: i64,
    business_id: i64,
    details: &EventDetails,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE events SET business_id = ?1, name = ?2, event_type = ?3, category = ?4,
             maximum_count = ?5, coordinator_name = ?6, coordinator_contact = ?7, description = ?8,
             hashtag = ?9, location = ?10, country = ?11, discount = ?12, refund_policy = ?13,
             date = ?14, start_time = ?15, end_time = ?16, banner_url = ?17, updated_at = ?18
         WHERE id = ?19",
        params![
            business_id,
            details.name,
            details.event_type,
            details.category,
            details.maximum_count,
            details.coordinator_name,
            details.coordinator_contact,
            details.description,
            details.hashtag,
            details.location,
            details.country,
            details.discount,
            details.refund_policy,
            format_date(&details.date),
            format_time(&details.start_time),
            format_time(&details.end_time),
            details.banner_url,
            format_timestamp(now),
            id,
        ],
    )?;
    Ok(count > 0)
}

pub fn set_event_status(
    conn: &Connection,
    id: i64,
    status: EventStatus,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE events SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), format_timestamp(now), id],
    )?;
    Ok(count > 0)
}

pub fn get_event(conn: &Connection, id: i64) -> anyhow::Result<Option<Event>> {
    let row = conn
        .query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
            params![id],
            |row| Ok(parse_event_row(row)),
        )
        .optional()?;
    row.transpose()
}

/// Enabled events of `business_id` on `date`, optionally leaving one event
/// out (the one being updated).
pub fn get_enabled_events_on_date(
    conn: &Connection,
    business_id: i64,
    date: &NaiveDate,
    exclude_event_id: Option<i64>,
) -> anyhow::Result<Vec<Event>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM events
         WHERE business_id = ?1 AND date = ?2 AND status = 'enabled' AND (?3 IS NULL OR id != ?3)
         ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(
        params![business_id, format_date(date), exclude_event_id],
        |row| Ok(parse_event_row(row)),
    )?;

    let mut events = vec![];
    for row in rows {
        events.push(row??);
    }
    Ok(events)
}

pub fn search_events(
    conn: &Connection,
    name: Option<&str>,
    hashtag: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Event>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM events
         WHERE (?1 IS NULL OR name LIKE '%' || ?1 || '%')
           AND (?2 IS NULL OR hashtag LIKE '%' || ?2 || '%')
         ORDER BY date ASC, start_time ASC
         LIMIT ?3 OFFSET ?4"
    ))?;

    let rows = stmt.query_map(params![name, hashtag, limit, offset], |row| {
        Ok(parse_event_row(row))
    })?;

    let mut events = vec![];
    for row in rows {
        events.push(row??);
    }
    Ok(events)
}

pub fn count_events(
    conn: &Connection,
    name: Option<&str>,
    hashtag: Option<&str>,
) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM events
         WHERE (?1 IS NULL OR name LIKE '%' || ?1 || '%')
           AND (?2 IS NULL OR hashtag LIKE '%' || ?2 || '%')",
        params![name, hashtag],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_event_row(row: &rusqlite::Row) -> anyhow::Result<Event> {
    let date_str: String = row.get(14)?;
    let start_str: String = row.get(15)?;
    let end_str: String = row.get(16)?;
    let status_str: String = row.get(18)?;
    let created_at_str: String = row.get(19)?;
    let updated_at_str: String = row.get(20)?;

    Ok(Event {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        event_type: row.get(3)?,
        category: row.get(4)?,
        maximum_count: row.get(5)?,
        coordinator_name: row.get(6)?,
        coordinator_contact: row.get(7)?,
        description: row.get(8)?,
        hashtag: row.get(9)?,
        location: row.get(10)?,
        country: row.get(11)?,
        discount: row.get(12)?,
        refund_policy: row.get(13)?,
        date: parse_date(&date_str)?,
        start_time: parse_time(&start_str)?,
        end_time: parse_time(&end_str)?,
        banner_url: row.get(17)?,
        status: EventStatus::parse(&status_str),
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

// ── Event children ──

pub fn insert_specification(
    conn: &Connection,
    event_id: i64,
    title: &str,
    detail: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO event_specifications (event_id, title, detail) VALUES (?1, ?2, ?3)",
        params![event_id, title, detail],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_specifications(conn: &Connection, event_id: i64) -> anyhow::Result<Vec<EventSpecification>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_id, title, detail FROM event_specifications WHERE event_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![event_id], |row| {
        Ok(EventSpecification {
            id: row.get(0)?,
            event_id: row.get(1)?,
            title: row.get(2)?,
            detail: row.get(3)?,
        })
    })?;

    let mut specs = vec![];
    for row in rows {
        specs.push(row?);
    }
    Ok(specs)
}

pub fn insert_condition(conn: &Connection, event_id: i64, description: &str) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO event_conditions (event_id, description) VALUES (?1, ?2)",
        params![event_id, description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_conditions(conn: &Connection, event_id: i64) -> anyhow::Result<Vec<EventCondition>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_id, description FROM event_conditions WHERE event_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![event_id], |row| {
        Ok(EventCondition {
            id: row.get(0)?,
            event_id: row.get(1)?,
            description: row.get(2)?,
        })
    })?;

    let mut conditions = vec![];
    for row in rows {
        conditions.push(row?);
    }
    Ok(conditions)
}

// ── Price Categories ──

pub fn insert_price_category(
    conn: &Connection,
    event_id: i64,
    name: &str,
    price: i64,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO price_categories (event_id, name, price) VALUES (?1, ?2, ?3)",
        params![event_id, name, price],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_price_categories(conn: &Connection, event_id: i64) -> anyhow::Result<Vec<PriceCategory>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_id, name, price FROM price_categories WHERE event_id = ?1 ORDER BY price ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![event_id], |row| {
        Ok(PriceCategory {
            id: row.get(0)?,
            event_id: row.get(1)?,
            name: row.get(2)?,
            price: row.get(3)?,
        })
    })?;

    let mut categories = vec![];
    for row in rows {
        categories.push(row?);
    }
    Ok(categories)
}

/// Looks a price category up by id *and* owning event, so a tier of another
/// event is reported as absent.
pub fn get_price_category_for_event(
    conn: &Connection,
    id: i64,
    event_id: i64,
) -> anyhow::Result<Option<PriceCategory>> {
    let category = conn
        .query_row(
            "SELECT id, event_id, name, price FROM price_categories WHERE id = ?1 AND event_id = ?2",
            params![id, event_id],
            |row| {
                Ok(PriceCategory {
                    id: row.get(0)?,
                    event_id: row.get(1)?,
                    name: row.get(2)?,
                    price: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(category)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str =
    "id, reference, tourist_id, event_id, price_category_id, ticket_count, payment_amount, paid_at";

/// Capacity aggregate: tickets already booked against `event_id`.
pub fn booked_ticket_count(conn: &Connection, event_id: i64) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COALESCE(SUM(ticket_count), 0) FROM bookings WHERE event_id = ?1",
        params![event_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn find_booking(
    conn: &Connection,
    tourist_id: i64,
    event_id: i64,
) -> anyhow::Result<Option<Booking>> {
    let row = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE tourist_id = ?1 AND event_id = ?2"),
            params![tourist_id, event_id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;
    row.transpose()
}

#[allow(clippy::too_many_arguments)]
pub fn insert_booking(
    conn: &Connection,
    reference: &str,
    tourist_id: i64,
    event_id: i64,
    price_category_id: i64,
    ticket_count: i64,
    payment_amount: i64,
    paid_at: &NaiveDateTime,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO bookings (reference, tourist_id, event_id, price_category_id, ticket_count, payment_amount, paid_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            reference,
            tourist_id,
            event_id,
            price_category_id,
            ticket_count,
            payment_amount,
            format_timestamp(paid_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_bookings_for_tourist(conn: &Connection, tourist_id: i64) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE tourist_id = ?1 ORDER BY paid_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map(params![tourist_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let paid_at_str: String = row.get(7)?;

    Ok(Booking {
        id: row.get(0)?,
        reference: row.get(1)?,
        tourist_id: row.get(2)?,
        event_id: row.get(3)?,
        price_category_id: row.get(4)?,
        ticket_count: row.get(5)?,
        payment_amount: row.get(6)?,
        paid_at: parse_timestamp(&paid_at_str)?,
    })
}

// ── Approvals ──

pub fn insert_approval(
    conn: &Connection,
    event_id: Option<i64>,
    business_id: Option<i64>,
    category: ApprovalCategory,
    action: ApprovalAction,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO approvals (event_id, business_id, category, action, status) VALUES (?1, ?2, ?3, ?4, 'PENDING')",
        params![event_id, business_id, category.as_str(), action.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_approvals_by_status(
    conn: &Connection,
    statuses: &[ApprovalStatus],
) -> anyhow::Result<Vec<Approval>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_id, business_id, category, action, status, authorized_by, authorized_at, created_at
         FROM approvals ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map([], |row| Ok(parse_approval_row(row)))?;

    let mut approvals = vec![];
    for row in rows {
        let approval = row??;
        if statuses.contains(&approval.status) {
            approvals.push(approval);
        }
    }
    Ok(approvals)
}

pub fn update_approval_status(
    conn: &Connection,
    id: i64,
    status: ApprovalStatus,
    authorized_by: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE approvals SET status = ?1, authorized_by = ?2, authorized_at = ?3 WHERE id = ?4",
        params![status.as_str(), authorized_by, format_timestamp(now), id],
    )?;
    Ok(count > 0)
}

pub fn get_approval(conn: &Connection, id: i64) -> anyhow::Result<Option<Approval>> {
    let row = conn
        .query_row(
            "SELECT id, event_id, business_id, category, action, status, authorized_by, authorized_at, created_at
             FROM approvals WHERE id = ?1",
            params![id],
            |row| Ok(parse_approval_row(row)),
        )
        .optional()?;
    row.transpose()
}

fn parse_approval_row(row: &rusqlite::Row) -> anyhow::Result<Approval> {
    let category_str: String = row.get(3)?;
    let action_str: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    let authorized_at_str: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;

    Ok(Approval {
        id: row.get(0)?,
        event_id: row.get(1)?,
        business_id: row.get(2)?,
        category: ApprovalCategory::parse(&category_str),
        action: ApprovalAction::parse(&action_str),
        status: ApprovalStatus::parse(&status_str)
            .ok_or_else(|| anyhow::anyhow!("unknown approval status: {status_str}"))?,
        authorized_by: row.get(6)?,
        authorized_at: authorized_at_str.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&created_at_str)?,
    })
}

// ── Stats ──

pub struct DashboardStats {
    pub tourist_count: i64,
    pub business_count: i64,
    pub event_count: i64,
    pub booking_count: i64,
    pub tickets_sold: i64,
    pub revenue: i64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let tourist_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = 'TOURIST'",
        [],
        |row| row.get(0),
    )?;

    let business_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM businesses", [], |row| row.get(0))?;

    let event_count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;

    let (booking_count, tickets_sold, revenue): (i64, i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(ticket_count), 0), COALESCE(SUM(payment_amount), 0) FROM bookings",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(DashboardStats {
        tourist_count,
        business_count,
        event_count,
        booking_count,
        tickets_sold,
        revenue,
    })
}

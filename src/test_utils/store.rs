//! In-memory implementation of every repository trait.
//!
//! One `InMemoryStore` backs all repos so cross-table behavior (expansion of user and
//! service summaries, cascading deletes, unique keys) matches the Postgres schema.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        pagination::PageRequest,
        use_cases::{
            analytics::AnalyticsRepo,
            client::{ClientFilter, ClientPatch, ClientRepo, NewClient},
            purchase::{ALREADY_SUBSCRIBED, NewPurchase, PurchaseRepo},
            service::{NewService, SERVICE_HAS_PURCHASES, ServiceFilter, ServicePatch, ServiceRepo},
            ticket::{NewTicket, TicketFilter, TicketPatch, TicketRepo},
            user::{Credentials, NewUser, UserRepo},
        },
    },
    domain::entities::{
        analytics::{CategoryPerformance, DistributionSlice, TicketStats, Window},
        client::{Client, SubscriptionStatus},
        purchase::{BillingCycle, Purchase, PurchaseStatus},
        service::Service,
        ticket::{Ticket, TicketCategory, TicketNote, TicketPriority, TicketStatus},
        user::{NotificationPreferences, User, UserSummary},
    },
    test_utils::{TEST_BCRYPT_COST, TEST_PASSWORD},
};

struct UserRow {
    user: User,
    password_hash: String,
    seq: u64,
}

struct ClientRow {
    client: Client,
    created_by: Option<Uuid>,
    seq: u64,
}

struct ServiceRow {
    service: Service,
    created_by: Option<Uuid>,
    seq: u64,
}

struct PurchaseRow {
    id: Uuid,
    user_id: Uuid,
    service_id: Uuid,
    status: PurchaseStatus,
    start_date: DateTime<Utc>,
    next_billing_date: DateTime<Utc>,
    billing_cycle: BillingCycle,
    price: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    seq: u64,
}

struct NoteRow {
    id: Uuid,
    message: String,
    added_by: Option<Uuid>,
    added_at: DateTime<Utc>,
}

struct TicketRow {
    id: Uuid,
    title: String,
    description: String,
    priority: TicketPriority,
    status: TicketStatus,
    category: TicketCategory,
    user_id: Uuid,
    assigned_to: Option<Uuid>,
    resolved_at: Option<DateTime<Utc>>,
    notes: Vec<NoteRow>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Default)]
struct Tables {
    seq: u64,
    users: HashMap<Uuid, UserRow>,
    clients: HashMap<Uuid, ClientRow>,
    services: HashMap<Uuid, ServiceRow>,
    purchases: HashMap<Uuid, PurchaseRow>,
    tickets: HashMap<Uuid, TicketRow>,
}

fn referenced_missing() -> AppError {
    AppError::invalid("id", "Referenced record not found")
}

fn matches_search(term: Option<&str>, fields: &[&str]) -> bool {
    match term.map(str::trim).filter(|t| !t.is_empty()) {
        None => true,
        Some(term) => {
            let term = term.to_lowercase();
            fields.iter().any(|f| f.to_lowercase().contains(&term))
        }
    }
}

/// Newest first, ties broken by insertion order, then sliced to the page.
fn paginate<T>(mut rows: Vec<(DateTime<Utc>, u64, T)>, page: PageRequest) -> (Vec<T>, i64) {
    rows.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
    let total = rows.len() as i64;
    let records = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .map(|(_, _, record)| record)
        .collect();
    (records, total)
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn summary(&self, user_id: Option<Uuid>) -> Option<UserSummary> {
        user_id
            .and_then(|id| self.users.get(&id))
            .map(|row| row.user.summary())
    }

    fn required_summary(&self, user_id: Uuid) -> UserSummary {
        self.summary(Some(user_id)).unwrap_or(UserSummary {
            id: user_id,
            name: String::new(),
            email: String::new(),
        })
    }

    fn client(&self, row: &ClientRow) -> Client {
        Client {
            created_by: self.summary(row.created_by),
            ..row.client.clone()
        }
    }

    fn service(&self, row: &ServiceRow) -> Service {
        Service {
            created_by: self.summary(row.created_by),
            ..row.service.clone()
        }
    }

    fn purchase(&self, row: &PurchaseRow) -> Option<Purchase> {
        let service = self.services.get(&row.service_id)?;
        Some(Purchase {
            id: row.id,
            user: self.required_summary(row.user_id),
            service: service.service.summary(),
            status: row.status,
            start_date: row.start_date,
            next_billing_date: row.next_billing_date,
            billing_cycle: row.billing_cycle,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn ticket(&self, row: &TicketRow) -> Ticket {
        Ticket {
            id: row.id,
            title: row.title.clone(),
            description: row.description.clone(),
            priority: row.priority,
            status: row.status,
            category: row.category,
            user: self.required_summary(row.user_id),
            assigned_to: self.summary(row.assigned_to),
            resolved_at: row.resolved_at,
            notes: row
                .notes
                .iter()
                .map(|n| TicketNote {
                    id: n.id,
                    message: n.message.clone(),
                    added_by: self.summary(n.added_by),
                    added_at: n.added_at,
                })
                .collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|r| r.user.email == email && Some(r.user.id) != except)
    }
}

/// Shared in-memory backing store for all repository traits.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user whose password is [`TEST_PASSWORD`].
    pub fn seed_user(&self, user: User) -> User {
        let password_hash = bcrypt::hash(TEST_PASSWORD, TEST_BCRYPT_COST).unwrap();
        let mut tables = self.tables.lock().unwrap();
        let seq = tables.next_seq();
        tables.users.insert(
            user.id,
            UserRow {
                user: user.clone(),
                password_hash,
                seq,
            },
        );
        user
    }

    /// Inserts a client as-is, keeping its `created_at`.
    pub fn seed_client(&self, client: Client) -> Client {
        let mut tables = self.tables.lock().unwrap();
        let seq = tables.next_seq();
        let row = ClientRow {
            created_by: client.created_by.as_ref().map(|u| u.id),
            client,
            seq,
        };
        let expanded = tables.client(&row);
        tables.clients.insert(row.client.id, row);
        expanded
    }

    /// Inserts a service as-is, keeping its `created_at`.
    pub fn seed_service(&self, service: Service) -> Service {
        let mut tables = self.tables.lock().unwrap();
        let seq = tables.next_seq();
        let row = ServiceRow {
            created_by: service.created_by.as_ref().map(|u| u.id),
            service,
            seq,
        };
        let expanded = tables.service(&row);
        tables.services.insert(row.service.id, row);
        expanded
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }
}

#[async_trait]
impl UserRepo for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables.email_taken(&user.email, None) {
            return Err(AppError::Conflict("User already exists".into()));
        }
        let now = Utc::now();
        let seq = tables.next_seq();
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            role: user.role,
            notifications: NotificationPreferences::default(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(
            record.id,
            UserRow {
                user: record.clone(),
                password_hash: user.password_hash,
                seq,
            },
        );
        Ok(record)
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.get(&id).map(|r| r.user.clone()))
    }

    async fn get_credentials(&self, id: Uuid) -> AppResult<Option<Credentials>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.get(&id).map(|r| Credentials {
            user: r.user.clone(),
            password_hash: r.password_hash.clone(),
        }))
    }

    async fn get_credentials_by_email(&self, email: &str) -> AppResult<Option<Credentials>> {
        let email = email.to_lowercase();
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .values()
            .find(|r| r.user.email == email)
            .map(|r| Credentials {
                user: r.user.clone(),
                password_hash: r.password_hash.clone(),
            }))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> AppResult<Option<User>> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(email) = email.as_deref() {
            if tables.email_taken(email, Some(id)) {
                return Err(AppError::Conflict("User already exists".into()));
            }
        }
        let Some(row) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            row.user.name = name;
        }
        if let Some(email) = email {
            row.user.email = email;
        }
        row.user.updated_at = Utc::now();
        Ok(Some(row.user.clone()))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        row.password_hash = password_hash.to_string();
        row.user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_notifications(
        &self,
        id: Uuid,
        notifications: NotificationPreferences,
    ) -> AppResult<Option<User>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.users.get_mut(&id).map(|row| {
            row.user.notifications = notifications;
            row.user.updated_at = Utc::now();
            row.user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.purchases.retain(|_, p| p.user_id != id);
        tables.tickets.retain(|_, t| t.user_id != id);
        Ok(true)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .users
            .values()
            .map(|r| (r.user.created_at, r.seq, r.user.clone()))
            .collect();
        Ok(paginate(rows, PageRequest { page: 1, limit: i64::MAX }).0)
    }
}

#[async_trait]
impl ClientRepo for InMemoryStore {
    async fn create_client(&self, client: NewClient) -> AppResult<Client> {
        let mut tables = self.tables.lock().unwrap();
        if tables.clients.values().any(|r| r.client.email == client.email) {
            return Err(AppError::Conflict(
                "Client with this email already exists".into(),
            ));
        }
        let now = Utc::now();
        let seq = tables.next_seq();
        let row = ClientRow {
            client: Client {
                id: Uuid::new_v4(),
                name: client.name,
                email: client.email,
                company: client.company,
                contact_number: client.contact_number,
                plan_type: client.plan_type,
                subscription_status: client.subscription_status,
                address: client.address,
                created_by: None,
                created_at: now,
                updated_at: now,
            },
            created_by: Some(client.created_by),
            seq,
        };
        let expanded = tables.client(&row);
        tables.clients.insert(row.client.id, row);
        Ok(expanded)
    }

    async fn get_client(&self, id: Uuid) -> AppResult<Option<Client>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.clients.get(&id).map(|r| tables.client(r)))
    }

    async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Client>, i64)> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .clients
            .values()
            .filter(|r| {
                let c = &r.client;
                matches_search(filter.search.as_deref(), &[&c.name, &c.email, &c.company])
                    && filter.status.is_none_or(|s| c.subscription_status == s)
            })
            .map(|r| (r.client.created_at, r.seq, tables.client(r)))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn update_client(&self, id: Uuid, patch: ClientPatch) -> AppResult<Option<Client>> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(email) = patch.email.as_deref() {
            let taken = tables
                .clients
                .values()
                .any(|r| r.client.email == email && r.client.id != id);
            if taken {
                return Err(AppError::Conflict(
                    "Client with this email already exists".into(),
                ));
            }
        }
        let Some(row) = tables.clients.get_mut(&id) else {
            return Ok(None);
        };
        let c = &mut row.client;
        if let Some(v) = patch.name {
            c.name = v;
        }
        if let Some(v) = patch.email {
            c.email = v;
        }
        if let Some(v) = patch.company {
            c.company = v;
        }
        if let Some(v) = patch.contact_number {
            c.contact_number = v;
        }
        if let Some(v) = patch.plan_type {
            c.plan_type = v;
        }
        if let Some(v) = patch.subscription_status {
            c.subscription_status = v;
        }
        if let Some(v) = patch.address {
            c.address = Some(v);
        }
        c.updated_at = Utc::now();
        let tables = &*tables;
        Ok(tables.clients.get(&id).map(|r| tables.client(r)))
    }

    async fn delete_client(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.lock().unwrap().clients.remove(&id).is_some())
    }
}

#[async_trait]
impl ServiceRepo for InMemoryStore {
    async fn create_service(&self, service: NewService) -> AppResult<Service> {
        let mut tables = self.tables.lock().unwrap();
        if tables.services.values().any(|r| r.service.name == service.name) {
            return Err(AppError::Conflict(
                "Service with this name already exists".into(),
            ));
        }
        let now = Utc::now();
        let seq = tables.next_seq();
        let row = ServiceRow {
            service: Service {
                id: Uuid::new_v4(),
                name: service.name,
                description: service.description,
                price: service.price,
                category: service.category,
                active_status: service.active_status,
                features: service.features,
                icon: service.icon,
                created_by: None,
                created_at: now,
                updated_at: now,
            },
            created_by: Some(service.created_by),
            seq,
        };
        let expanded = tables.service(&row);
        tables.services.insert(row.service.id, row);
        Ok(expanded)
    }

    async fn get_service(&self, id: Uuid) -> AppResult<Option<Service>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.services.get(&id).map(|r| tables.service(r)))
    }

    async fn list_services(
        &self,
        filter: &ServiceFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Service>, i64)> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .services
            .values()
            .filter(|r| {
                let s = &r.service;
                matches_search(filter.search.as_deref(), &[&s.name, &s.description])
                    && filter.category.is_none_or(|c| s.category == c)
                    && filter.active.is_none_or(|a| s.active_status == a)
            })
            .map(|r| (r.service.created_at, r.seq, tables.service(r)))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn update_service(&self, id: Uuid, patch: ServicePatch) -> AppResult<Option<Service>> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(name) = patch.name.as_deref() {
            let taken = tables
                .services
                .values()
                .any(|r| r.service.name == name && r.service.id != id);
            if taken {
                return Err(AppError::Conflict(
                    "Service with this name already exists".into(),
                ));
            }
        }
        let Some(row) = tables.services.get_mut(&id) else {
            return Ok(None);
        };
        let s = &mut row.service;
        if let Some(v) = patch.name {
            s.name = v;
        }
        if let Some(v) = patch.description {
            s.description = v;
        }
        if let Some(v) = patch.price {
            s.price = v;
        }
        if let Some(v) = patch.category {
            s.category = v;
        }
        if let Some(v) = patch.active_status {
            s.active_status = v;
        }
        if let Some(v) = patch.features {
            s.features = v;
        }
        if let Some(v) = patch.icon {
            s.icon = v;
        }
        s.updated_at = Utc::now();
        let tables = &*tables;
        Ok(tables.services.get(&id).map(|r| tables.service(r)))
    }

    async fn delete_service(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.services.contains_key(&id) {
            return Ok(false);
        }
        if tables.purchases.values().any(|p| p.service_id == id) {
            return Err(AppError::Conflict(SERVICE_HAS_PURCHASES.into()));
        }
        tables.services.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl PurchaseRepo for InMemoryStore {
    async fn create_purchase(&self, purchase: NewPurchase) -> AppResult<Purchase> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.users.contains_key(&purchase.user_id)
            || !tables.services.contains_key(&purchase.service_id)
        {
            return Err(referenced_missing());
        }
        let duplicate = tables.purchases.values().any(|p| {
            p.user_id == purchase.user_id
                && p.service_id == purchase.service_id
                && p.status == PurchaseStatus::Active
        });
        if duplicate {
            return Err(AppError::Conflict(ALREADY_SUBSCRIBED.into()));
        }
        let now = Utc::now();
        let seq = tables.next_seq();
        let row = PurchaseRow {
            id: Uuid::new_v4(),
            user_id: purchase.user_id,
            service_id: purchase.service_id,
            status: PurchaseStatus::Active,
            start_date: purchase.start_date,
            next_billing_date: purchase.next_billing_date,
            billing_cycle: purchase.billing_cycle,
            price: purchase.price,
            created_at: now,
            updated_at: now,
            seq,
        };
        let expanded = tables.purchase(&row).ok_or_else(referenced_missing)?;
        tables.purchases.insert(row.id, row);
        Ok(expanded)
    }

    async fn get_purchase(&self, id: Uuid) -> AppResult<Option<Purchase>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.purchases.get(&id).and_then(|r| tables.purchase(r)))
    }

    async fn has_active_purchase(&self, user_id: Uuid, service_id: Uuid) -> AppResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.purchases.values().any(|p| {
            p.user_id == user_id && p.service_id == service_id && p.status == PurchaseStatus::Active
        }))
    }

    async fn list_purchases(
        &self,
        user_id: Option<Uuid>,
        status: Option<PurchaseStatus>,
    ) -> AppResult<Vec<Purchase>> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .purchases
            .values()
            .filter(|p| user_id.is_none_or(|u| p.user_id == u) && status.is_none_or(|s| p.status == s))
            .filter_map(|p| tables.purchase(p).map(|expanded| (p.created_at, p.seq, expanded)))
            .collect();
        Ok(paginate(rows, PageRequest { page: 1, limit: i64::MAX }).0)
    }

    async fn set_purchase_status(
        &self,
        id: Uuid,
        status: PurchaseStatus,
    ) -> AppResult<Option<Purchase>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(row) = tables.purchases.get_mut(&id) else {
            return Ok(None);
        };
        row.status = status;
        row.updated_at = Utc::now();
        let tables = &*tables;
        Ok(tables.purchases.get(&id).and_then(|r| tables.purchase(r)))
    }
}

#[async_trait]
impl TicketRepo for InMemoryStore {
    async fn create_ticket(&self, ticket: NewTicket) -> AppResult<Ticket> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.users.contains_key(&ticket.user_id) {
            return Err(referenced_missing());
        }
        let now = Utc::now();
        let seq = tables.next_seq();
        let row = TicketRow {
            id: Uuid::new_v4(),
            title: ticket.title,
            description: ticket.description,
            priority: ticket.priority,
            status: TicketStatus::Open,
            category: ticket.category,
            user_id: ticket.user_id,
            assigned_to: None,
            resolved_at: None,
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
            seq,
        };
        let expanded = tables.ticket(&row);
        tables.tickets.insert(row.id, row);
        Ok(expanded)
    }

    async fn get_ticket(&self, id: Uuid) -> AppResult<Option<Ticket>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.tickets.get(&id).map(|r| tables.ticket(r)))
    }

    async fn list_tickets(
        &self,
        filter: &TicketFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Ticket>, i64)> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .tickets
            .values()
            .filter(|t| {
                filter.owner.is_none_or(|o| t.user_id == o)
                    && matches_search(filter.search.as_deref(), &[&t.title, &t.description])
                    && filter.status.is_none_or(|s| t.status == s)
                    && filter.priority.is_none_or(|p| t.priority == p)
            })
            .map(|t| (t.created_at, t.seq, tables.ticket(t)))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn update_ticket(&self, id: Uuid, patch: TicketPatch) -> AppResult<Option<Ticket>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(row) = tables.tickets.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = patch.title {
            row.title = v;
        }
        if let Some(v) = patch.description {
            row.description = v;
        }
        if let Some(v) = patch.priority {
            row.priority = v;
        }
        if let Some(v) = patch.status {
            row.status = v;
        }
        if let Some(v) = patch.category {
            row.category = v;
        }
        if let Some(v) = patch.assigned_to {
            row.assigned_to = v;
        }
        if row.resolved_at.is_none() {
            row.resolved_at = patch.resolved_at;
        }
        row.updated_at = Utc::now();
        let tables = &*tables;
        Ok(tables.tickets.get(&id).map(|r| tables.ticket(r)))
    }

    async fn add_ticket_note(
        &self,
        id: Uuid,
        message: &str,
        added_by: Uuid,
    ) -> AppResult<Option<Ticket>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(row) = tables.tickets.get_mut(&id) else {
            return Ok(None);
        };
        let now = Utc::now();
        row.notes.push(NoteRow {
            id: Uuid::new_v4(),
            message: message.to_string(),
            added_by: Some(added_by),
            added_at: now,
        });
        row.updated_at = now;
        let tables = &*tables;
        Ok(tables.tickets.get(&id).map(|r| tables.ticket(r)))
    }

    async fn delete_ticket(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.lock().unwrap().tickets.remove(&id).is_some())
    }
}

#[async_trait]
impl AnalyticsRepo for InMemoryStore {
    async fn count_services_created(&self, window: Window) -> AppResult<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .services
            .values()
            .filter(|r| window.contains(r.service.created_at))
            .count() as i64)
    }

    async fn count_clients_created(&self, window: Window) -> AppResult<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .clients
            .values()
            .filter(|r| window.contains(r.client.created_at))
            .count() as i64)
    }

    async fn average_service_price(&self) -> AppResult<f64> {
        let tables = self.tables.lock().unwrap();
        if tables.services.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = tables.services.values().map(|r| r.service.price).sum();
        Ok(sum / tables.services.len() as f64)
    }

    async fn count_clients_by_status(&self) -> AppResult<Vec<(SubscriptionStatus, i64)>> {
        let tables = self.tables.lock().unwrap();
        let mut counts: HashMap<SubscriptionStatus, i64> = HashMap::new();
        for row in tables.clients.values() {
            *counts.entry(row.client.subscription_status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn ticket_stats(&self, window: Window) -> AppResult<TicketStats> {
        let tables = self.tables.lock().unwrap();
        let in_window: Vec<_> = tables
            .tickets
            .values()
            .filter(|t| window.contains(t.created_at))
            .collect();
        Ok(TicketStats {
            total: in_window.len() as i64,
            open: in_window.iter().filter(|t| t.status == TicketStatus::Open).count() as i64,
            resolved: in_window
                .iter()
                .filter(|t| t.status == TicketStatus::Resolved)
                .count() as i64,
        })
    }

    async fn plan_distribution(&self) -> AppResult<Vec<DistributionSlice>> {
        let tables = self.tables.lock().unwrap();
        let mut counts = HashMap::new();
        for row in tables.clients.values() {
            *counts.entry(row.client.plan_type).or_insert(0_i64) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(plan, value)| DistributionSlice {
                name: plan.to_string(),
                value,
            })
            .collect())
    }

    async fn category_performance(&self) -> AppResult<Vec<CategoryPerformance>> {
        let tables = self.tables.lock().unwrap();
        let mut groups: HashMap<_, (i64, f64)> = HashMap::new();
        for row in tables.services.values() {
            let entry = groups.entry(row.service.category).or_default();
            entry.0 += 1;
            entry.1 += row.service.price;
        }
        Ok(groups
            .into_iter()
            .map(|(category, (services, revenue))| CategoryPerformance {
                name: category.to_string(),
                services,
                revenue,
            })
            .collect())
    }
}

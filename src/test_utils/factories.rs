//! Test data factories.
//!
//! Each factory returns a complete, valid record with unique identifying fields.
//! Use the closure parameter to override specific fields as needed.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entities::{
    client::{Client, PlanType, SubscriptionStatus},
    service::{DEFAULT_SERVICE_ICON, Service, ServiceCategory},
    user::{NotificationPreferences, Role, User},
};

/// Plain-text password of every user created through [`InMemoryStore::seed_user`].
///
/// [`InMemoryStore::seed_user`]: super::InMemoryStore::seed_user
pub const TEST_PASSWORD: &str = "password123";

/// Lowest cost bcrypt accepts; keeps hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Create a test user (role `Client`) with a unique email.
pub fn create_test_user(overrides: impl FnOnce(&mut User)) -> User {
    let now = Utc::now();
    let tag = short_id();
    let mut user = User {
        id: Uuid::new_v4(),
        name: format!("User {tag}"),
        email: format!("user-{tag}@example.com"),
        role: Role::Client,
        notifications: NotificationPreferences::default(),
        created_at: now,
        updated_at: now,
    };
    overrides(&mut user);
    user
}

/// Create a test client (Basic, Active) with a unique email.
pub fn create_test_client(overrides: impl FnOnce(&mut Client)) -> Client {
    let now = Utc::now();
    let tag = short_id();
    let mut client = Client {
        id: Uuid::new_v4(),
        name: format!("Client {tag}"),
        email: format!("client-{tag}@example.com"),
        company: "Acme Corp".to_string(),
        contact_number: "5551234567".to_string(),
        plan_type: PlanType::Basic,
        subscription_status: SubscriptionStatus::Active,
        address: None,
        created_by: None,
        created_at: now,
        updated_at: now,
    };
    overrides(&mut client);
    client
}

/// Create an active test service with a unique name.
pub fn create_test_service(overrides: impl FnOnce(&mut Service)) -> Service {
    let now = Utc::now();
    let mut service = Service {
        id: Uuid::new_v4(),
        name: format!("Service {}", short_id()),
        description: "Managed infrastructure".to_string(),
        price: 99.0,
        category: ServiceCategory::CloudHosting,
        active_status: true,
        features: vec!["24/7 support".to_string()],
        icon: DEFAULT_SERVICE_ICON.to_string(),
        created_by: None,
        created_at: now,
        updated_at: now,
    };
    overrides(&mut service);
    service
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_produce_unique_keys() {
        let a = create_test_user(|_| {});
        let b = create_test_user(|_| {});
        assert_ne!(a.email, b.email);

        let s1 = create_test_service(|_| {});
        let s2 = create_test_service(|_| {});
        assert_ne!(s1.name, s2.name);
    }

    #[test]
    fn overrides_apply() {
        let client = create_test_client(|c| c.plan_type = PlanType::Enterprise);
        assert_eq!(client.plan_type, PlanType::Enterprise);
    }
}

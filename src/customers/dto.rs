use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::customers::repo::Customer;

/// Request body for customer creation.
#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl UpdateCustomerRequest {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub customer_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub update: Option<OffsetDateTime>,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            customer_id: c.customer_id,
            first_name: c.first_name,
            last_name: c.last_name,
            phone: c.phone,
            address: c.address,
            created_at: c.created_at,
            update: c.update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_emptiness() {
        let u: UpdateCustomerRequest = serde_json::from_str("{}").unwrap();
        assert!(u.is_empty());
        let u: UpdateCustomerRequest = serde_json::from_str(r#"{"phone":"555-0100"}"#).unwrap();
        assert!(!u.is_empty());
    }

    #[test]
    fn response_exposes_null_update_before_first_change() {
        let body = CustomerResponse::from(Customer {
            customer_id: 1,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            phone: None,
            address: None,
            created_at: OffsetDateTime::now_utc(),
            update: None,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["first_name"], "Jane");
        assert!(json["update"].is_null());
    }
}

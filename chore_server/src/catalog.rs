//! The services and vendors offered through the web form.
//!
//! There is a single vendor and a single service, so the catalog is a fixed value built at startup rather than
//! something kept in the order store.
use chore_common::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub base_price: Money,
    #[serde(rename = "type")]
    pub service_type: String,
    pub allowed_payment_methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub day: String,
    pub open: String,
    pub close: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub services: Vec<String>,
    pub royalty_rate: f64,
    pub payment_methods: Vec<String>,
    pub email: String,
    pub operating_hours: Vec<OpeningHours>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub services: Vec<ServiceInfo>,
    pub vendors: Vec<VendorInfo>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let laundry = ServiceInfo {
            id: "laundry".into(),
            name: "Laundry Service".into(),
            description: "Professional laundry service".into(),
            is_active: true,
            base_price: Money::from_cents(1500),
            service_type: "laundry".into(),
            allowed_payment_methods: vec!["stripe".into()],
        };
        let operating_hours = ["monday", "tuesday", "wednesday", "thursday", "friday"]
            .iter()
            .map(|day| OpeningHours { day: day.to_string(), open: "08:00".into(), close: "20:00".into() })
            .collect();
        let angie = VendorInfo {
            id: "angie".into(),
            name: "Angie's Laundry".into(),
            description: "Professional laundry service".into(),
            is_active: true,
            services: vec!["laundry".into()],
            royalty_rate: 0.15,
            payment_methods: vec!["stripe".into()],
            email: "info@angieslaundry.com".into(),
            operating_hours,
        };
        Self { services: vec![laundry], vendors: vec![angie] }
    }
}

impl CatalogConfig {
    /// Uses `royalty_rate` as the vendor's commission, so that the listing agrees with the rate orders are charged.
    pub fn with_royalty_rate(mut self, royalty_rate: f64) -> Self {
        self.vendors.iter_mut().for_each(|v| v.royalty_rate = royalty_rate);
        self
    }

    pub fn active_services(&self) -> Vec<ServiceInfo> {
        self.services.iter().filter(|s| s.is_active).cloned().collect()
    }

    pub fn active_vendors(&self) -> Vec<VendorInfo> {
        self.vendors.iter().filter(|v| v.is_active).cloned().collect()
    }

    pub fn service_ids(&self) -> Vec<String> {
        self.services.iter().map(|s| s.id.clone()).collect()
    }

    pub fn vendor_ids(&self) -> Vec<String> {
        self.vendors.iter().map(|v| v.id.clone()).collect()
    }
}

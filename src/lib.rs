pub(crate) mod data {
    pub(crate) mod datasources {
        pub(crate) mod broadcast_event_sink;
        pub(crate) mod entitlement_storage_datasource;
        pub(crate) mod receipt_file_datasource;
        pub(crate) mod verify_receipt_datasource;
    }
    pub(crate) mod models {
        pub(crate) mod verify_receipt {
            pub(crate) mod verify_receipt_request_model;
            pub(crate) mod verify_receipt_response_model;
        }
    }
    pub(crate) mod repositories {
        pub(crate) mod entitlement_ledger_impl;
        pub(crate) mod receipt_validator_impl;
    }
}

pub mod domain {
    pub mod entities {
        pub mod environment;
        pub mod product;
        pub mod queue_update;
        pub mod receipt;
        pub mod receipt_status;
        pub mod store_event;
        pub mod transaction;
        pub mod validation_result;
    }
    pub mod repositories {
        pub mod entitlement_ledger;
        pub mod entitlement_storage;
        pub mod event_sink;
        pub mod payment_queue;
        pub mod product_catalog;
        pub mod receipt_source;
        pub mod receipt_validator;
    }
}

pub mod config;
mod constants;
pub mod coordinator;
pub mod errors;
pub mod util;

pub use data::{
    datasources::{
        broadcast_event_sink::BroadcastEventSink,
        entitlement_storage_datasource::{InMemoryEntitlementStorage, JsonFileEntitlementStorage},
        receipt_file_datasource::FileReceiptSource,
    },
    repositories::entitlement_ledger_impl::EntitlementLedgerImpl,
};

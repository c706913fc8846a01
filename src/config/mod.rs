//! Configuration management

mod settings;

pub use settings::{
    CatalogSettings, ContractSpec, DatabaseSettings, GroupSettings, HttpSettings,
    SchedulerSettings, Settings,
};

// Domain layer: tables, records and the ports the stages depend on.

pub mod model;
pub mod ports;

pub use model::{Record, Table};
pub use ports::{CollectionSource, Estimator, ModelLoader, Storage};

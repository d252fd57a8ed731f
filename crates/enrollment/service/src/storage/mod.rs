//! Storage backends for the service

mod postgres;

pub use postgres::PostgresEnrollmentStore;

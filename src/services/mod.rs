pub mod delivery_service;
pub mod ingest_service;
pub mod parser;
pub mod payload_builder;
pub mod resolver;

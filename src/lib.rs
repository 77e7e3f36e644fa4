// Library for tests to access modules

pub mod archive_repo;
pub mod bid_worker;
pub mod config;
pub mod estimator;
pub mod launch_repo;
pub mod lifecycle;
pub mod market_repo;
pub mod models;
pub mod param_repo;
pub mod publisher;
pub mod retry;
pub mod routes;
pub mod sampler;
pub mod scaler_repo;
pub mod stores;
pub mod version;

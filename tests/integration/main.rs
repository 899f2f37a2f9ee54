//! Integration tests across the namespace, storage, and live query layers.

mod helpers;

mod live_test;
mod namespace_test;
mod reconcile_test;
mod sqlite_test;
mod upload_test;

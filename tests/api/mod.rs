//! HTTP Endpoint Tests

mod info_tests;

//! Common test utilities and infrastructure
//!
//! This module provides shared utilities for integration tests including:
//! - An in-process mock SSM
//! - Subscriber credential fixtures

pub mod subscriber;

pub use mock_ssm::*;
pub use subscriber::*;

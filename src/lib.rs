//! Confidential-data gateway for AI integrations.
//!
//! Scans content passed to an AI model for secrets, PII, and financial
//! data, replaces real values with opaque tokens before the content ever
//! reaches the model, and restores those tokens back to the real values in
//! the model's response — under the originating session only.
//!
//! # Example
//!
//! ```
//! use privacy_gateway::config::GatewayConfig;
//! use privacy_gateway::gateway::ConfidentialDataGateway;
//! use privacy_gateway::types::Content;
//!
//! let gateway = ConfidentialDataGateway::new(GatewayConfig::default(), "framework-secret");
//! let protected = gateway
//!     .protect(&Content::text("sk-proj-abcdefghijklmnopqrstuvwxyz0123456789"))
//!     .unwrap();
//! assert!(protected.items_vaulted > 0);
//!
//! let restored = gateway.restore(&protected.safe_content, &protected.session_id).unwrap();
//! assert_eq!(restored.as_text(), Some("sk-proj-abcdefghijklmnopqrstuvwxyz0123456789"));
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod types;
pub mod vault;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::ConfidentialDataGateway;
pub use types::{AlertLevel, Content, DataFamily, ProtectResult, ScanResult};

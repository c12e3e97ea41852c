//! Command boundary.
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌──────────────────────────┐
//! │ stdin / pipe │──▶│  wire    │──▶│ Dispatcher               │
//! │ (JSON lines) │   │ (serde)  │   │  → IntensityController   │
//! └──────────────┘   └──────────┘   └──────────────────────────┘
//! ```

pub mod dispatch;
pub mod wire;

pub use dispatch::Dispatcher;

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

//! Platform shims.

pub mod time {
    //! Clocks for fence deadlines.
    //!
    //! `std::time::Instant` panics on wasm32-unknown-unknown, so the browser build takes both
    //! types from `web_time` instead.

    #[cfg(not(target_arch = "wasm32"))]
    pub use std::time::{Duration, Instant};

    #[cfg(target_arch = "wasm32")]
    pub use web_time::{Duration, Instant};
}

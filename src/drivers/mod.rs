//! Torch drivers and thread helpers.

pub mod gpio_torch;
pub mod worker;

//! Cross-crate scenarios.

mod byzantine;
mod e2e_burn_mint;
mod tcp_cluster;

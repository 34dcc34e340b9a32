//! Parser layer
//! - terraform.rs: `required_version` scanner for Terraform configuration

pub mod terraform;

pub use terraform::TerraformParser;

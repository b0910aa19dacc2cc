//! Provisioning manifest loading and environment overrides.

pub mod manifest;

pub use manifest::{
    EditorConfig, EnvOverrides, Manifest, NodeConfig, PoetryConfig, PythonConfig, RConfig,
    VendorConfig,
};

//! Remote asset resolution for overlay operations.

pub mod reference;
pub mod resolver;

pub use reference::{AssetReference, AssetRole};
pub use resolver::{AssetFetcher, HttpAssetFetcher, ResolvedAsset, resolve_asset};

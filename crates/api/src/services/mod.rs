//! Service implementations behind the domain seams.

pub mod local_asset_store;
pub mod thumbnail;

pub use local_asset_store::LocalAssetStore;

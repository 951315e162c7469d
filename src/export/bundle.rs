use serde::{Deserialize, Serialize};

use crate::{
    export::{
        archive::{ArchiveEntry, write_zip},
        artifact::Artifact,
        fetch::AssetFetcher,
        snapshot::ExportSnapshot,
    },
    foundation::error::{FetchError, GenSceneResult},
};

/// Source paths and archive entry names of a bundle export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleLayout {
    /// Player runtime source path.
    pub runtime_path: String,
    /// Player page source path.
    pub page_path: String,
    /// Stylesheet source path.
    pub style_path: String,
    /// Runtime entry name.
    pub runtime_entry: String,
    /// Page entry name.
    pub page_entry: String,
    /// Stylesheet entry name.
    pub style_entry: String,
    /// Scene script entry name.
    pub scene_entry: String,
    /// Global the scene script assigns the snapshot to.
    pub scene_global: String,
    /// Source directory of auxiliary images.
    pub asset_source_dir: String,
    /// Archive directory of auxiliary images.
    pub assets_dir: String,
    /// Base name of the image bundled next to the product name.
    pub secondary_asset: String,
    /// Extension of auxiliary images.
    pub asset_ext: String,
}

impl Default for BundleLayout {
    fn default() -> Self {
        Self {
            runtime_path: "./player.bundle.js".to_owned(),
            page_path: "./index.player.html".to_owned(),
            style_path: "./index.css".to_owned(),
            runtime_entry: "player.bundle.js".to_owned(),
            page_entry: "index.html".to_owned(),
            style_entry: "index.css".to_owned(),
            scene_entry: "scene.js".to_owned(),
            scene_global: "jsGenScene".to_owned(),
            asset_source_dir: "./assets".to_owned(),
            assets_dir: "assets".to_owned(),
            secondary_asset: "jetbrains".to_owned(),
            asset_ext: "svg".to_owned(),
        }
    }
}

impl BundleLayout {
    /// `<product>-text.<ext>`.
    pub fn product_asset_name(&self, product: &str) -> String {
        format!("{product}-text.{}", self.asset_ext)
    }

    /// `<secondary>.<ext>`.
    pub fn secondary_asset_name(&self) -> String {
        format!("{}.{}", self.secondary_asset, self.asset_ext)
    }

    /// Auxiliary image names bundled for `product`, in archive order.
    pub fn auxiliary_names(&self, product: &str) -> Vec<String> {
        vec![self.product_asset_name(product), self.secondary_asset_name()]
    }

    /// Path an auxiliary image is fetched from.
    pub fn asset_source_path(&self, name: &str) -> String {
        format!("{}/{name}", self.asset_source_dir.trim_end_matches('/'))
    }

    /// Archive entry name of an auxiliary image.
    pub fn asset_entry_name(&self, name: &str) -> String {
        format!("{}/{name}", self.assets_dir.trim_end_matches('/'))
    }

    /// `<product>_html5.zip`.
    pub fn archive_name(&self, product: &str) -> String {
        format!("{product}_html5.zip")
    }

    /// Script that publishes the snapshot to the player.
    pub fn scene_script(&self, json: &str) -> String {
        format!("window.{} = {json};", self.scene_global)
    }
}

async fn fetch_named(
    fetcher: &dyn AssetFetcher,
    name: String,
    path: String,
) -> Result<(String, Vec<u8>), FetchError> {
    let bytes = fetcher.fetch(path).await?;
    Ok((name, bytes))
}

/// Assemble a self-contained player bundle for `snapshot`.
///
/// Every file is fetched concurrently and all fetches must succeed before the archive is built;
/// the first failure aborts the export and no archive is produced.
#[tracing::instrument(skip_all, fields(product = %snapshot.source.config.product))]
pub async fn export_bundle(
    layout: &BundleLayout,
    fetcher: &dyn AssetFetcher,
    snapshot: &ExportSnapshot,
) -> GenSceneResult<Artifact> {
    let product = snapshot.source.config.product.as_str();

    let primary = futures::future::try_join3(
        fetcher.fetch(layout.runtime_path.clone()),
        fetcher.fetch(layout.page_path.clone()),
        fetcher.fetch(layout.style_path.clone()),
    );
    let auxiliary = futures::future::try_join_all(layout.auxiliary_names(product).into_iter().map(
        |name| {
            let path = layout.asset_source_path(&name);
            fetch_named(fetcher, name, path)
        },
    ));
    let ((runtime, page, style), images) = futures::future::try_join(primary, auxiliary).await?;

    let mut entries = vec![
        ArchiveEntry::new(layout.runtime_entry.as_str(), runtime),
        ArchiveEntry::new(
            layout.scene_entry.as_str(),
            layout.scene_script(&snapshot.json),
        ),
        ArchiveEntry::new(layout.page_entry.as_str(), page),
        ArchiveEntry::new(layout.style_entry.as_str(), style),
    ];
    entries.extend(
        images
            .into_iter()
            .map(|(name, bytes)| ArchiveEntry::new(layout.asset_entry_name(&name), bytes)),
    );

    let bytes = write_zip(&entries)?;
    tracing::info!(entries = entries.len(), bytes = bytes.len(), "bundle assembled");
    Ok(Artifact {
        file_name: layout.archive_name(product),
        bytes,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/export/bundle.rs"]
mod tests;

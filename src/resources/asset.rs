use std::path::{Path, PathBuf};

use anyhow::Context as _;
use base64::Engine as _;

use crate::errors::FormatError;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("No browser window available")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("Could not read page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{}/", origin))?;
    Ok(base.join(file_name)?)
}

/// Reads a whole file: from disk on native, over HTTP relative to the page
/// origin on wasm.
pub async fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let file_name = path.to_string_lossy().replace('\\', "/");
        let url = format_url(&file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))?;
    Ok(data)
}

/// Loads every buffer of `gltf` in file order.
///
/// The GLB binary chunk is used for buffers without a uri, `data:` uris are
/// decoded in place and anything else is percent-decoded and read relative to
/// `base_dir`.
pub async fn load_buffers(gltf: &gltf::Gltf, base_dir: &Path) -> anyhow::Result<Vec<Vec<u8>>> {
    let loads = gltf.buffers().map(|buffer| async move {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or(FormatError::MissingBuffer(buffer.index()))?,
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => decode_data_uri(uri)
                .with_context(|| format!("Buffer {} has a malformed data uri", buffer.index()))?,
            gltf::buffer::Source::Uri(uri) => load_binary(&buffer_path(base_dir, uri)?).await?,
        };
        if data.len() < buffer.length() {
            anyhow::bail!(
                "Buffer {} declares {} bytes but only {} were loaded",
                buffer.index(),
                buffer.length(),
                data.len()
            );
        }
        Ok::<_, anyhow::Error>(data)
    });
    futures::future::try_join_all(loads).await
}

fn buffer_path(base_dir: &Path, uri: &str) -> anyhow::Result<PathBuf> {
    let decoded = urlencoding::decode(uri)
        .with_context(|| format!("Buffer uri {uri} is not valid percent-encoded UTF-8"))?;
    Ok(base_dir.join(decoded.as_ref()))
}

fn decode_data_uri(uri: &str) -> anyhow::Result<Vec<u8>> {
    let (header, payload) = uri
        .split_once(',')
        .context("Data uri without payload")?;
    anyhow::ensure!(header.ends_with(";base64"), "Only base64 data uris are supported");
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

//! Moving packed stream data into destination buffers.
//!
//! [`BufferUploader`] is the seam between the packer and whatever owns the
//! device memory. A load creates one buffer per stream and then hands the whole
//! staging buffer over in a single [`BufferUploader::upload`] call with one
//! region per stream, never one per mesh or primitive.
//!
//! - [`WgpuUploader`] writes to GPU buffers through one staging buffer and one
//!   command submission.
//! - [`HostUploader`] keeps everything in `Vec<u8>`s, for tools without a GPU.

use std::iter;

use wgpu::util::DeviceExt;

use crate::{data_structures::scene::Stream, errors::UploadError};

/// A stream's region inside the staging buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamRegion {
    pub stream: Stream,
    pub offset: u64,
    pub size: u64,
}

impl StreamRegion {
    fn check(&self, staging_len: u64) -> Result<(), UploadError> {
        let alignment = wgpu::COPY_BUFFER_ALIGNMENT;
        if self.offset % alignment != 0 || self.size % alignment != 0 {
            return Err(UploadError::Misaligned {
                stream: self.stream,
                offset: self.offset,
                size: self.size,
                alignment,
            });
        }
        if self.offset + self.size > staging_len {
            return Err(UploadError::RegionOutOfBounds {
                stream: self.stream,
                offset: self.offset,
                end: self.offset + self.size,
                staging: staging_len,
            });
        }
        Ok(())
    }
}

pub trait BufferUploader {
    type Buffer;

    /// Creates an empty destination buffer for `stream`.
    fn create_buffer(&self, stream: Stream, size: u64) -> Result<Self::Buffer, UploadError>;

    /// Copies each region of `staging` to the start of its buffer, as one batch.
    fn upload(
        &self,
        staging: &[u8],
        copies: Vec<(StreamRegion, &mut Self::Buffer)>,
    ) -> Result<(), UploadError>;
}

/// Uploads through a wgpu device and queue.
pub struct WgpuUploader<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    label: &'a str,
}

impl<'a> WgpuUploader<'a> {
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue, label: &'a str) -> Self {
        Self {
            device,
            queue,
            label,
        }
    }
}

impl BufferUploader for WgpuUploader<'_> {
    type Buffer = wgpu::Buffer;

    fn create_buffer(&self, stream: Stream, size: u64) -> Result<wgpu::Buffer, UploadError> {
        let max = self.device.limits().max_buffer_size;
        if size > max {
            return Err(UploadError::BufferTooLarge { stream, size, max });
        }
        let usage = match stream {
            Stream::Index => wgpu::BufferUsages::INDEX,
            _ => wgpu::BufferUsages::VERTEX,
        };
        Ok(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} {} Buffer", self.label, stream)),
            size,
            // COPY_SRC allows reading the data back for inspection
            usage: usage | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        }))
    }

    fn upload(
        &self,
        staging: &[u8],
        copies: Vec<(StreamRegion, &mut wgpu::Buffer)>,
    ) -> Result<(), UploadError> {
        for (region, _) in &copies {
            region.check(staging.len() as u64)?;
        }
        if staging.is_empty() {
            return Ok(());
        }

        let staging_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Staging Buffer", self.label)),
                contents: staging,
                usage: wgpu::BufferUsages::COPY_SRC,
            });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&format!("{} Upload Encoder", self.label)),
            });
        let mut uploads = 0;
        for (region, buffer) in copies.into_iter().filter(|(region, _)| region.size > 0) {
            encoder.copy_buffer_to_buffer(&staging_buffer, region.offset, buffer, 0, region.size);
            uploads += 1;
        }
        self.queue.submit(iter::once(encoder.finish()));
        log::debug!(
            "Uploaded {} staging bytes in {uploads} copies",
            staging.len()
        );
        // the staging buffer is released once the queue is done with it
        Ok(())
    }
}

/// Uploader backed by plain host memory.
#[derive(Debug, Default)]
pub struct HostUploader {
    max_buffer_size: Option<u64>,
}

impl HostUploader {
    /// Refuses buffers larger than `max_buffer_size`, like a device limit would.
    pub fn with_limit(max_buffer_size: u64) -> Self {
        Self {
            max_buffer_size: Some(max_buffer_size),
        }
    }
}

impl BufferUploader for HostUploader {
    type Buffer = Vec<u8>;

    fn create_buffer(&self, stream: Stream, size: u64) -> Result<Vec<u8>, UploadError> {
        if let Some(max) = self.max_buffer_size.filter(|max| size > *max) {
            return Err(UploadError::BufferTooLarge { stream, size, max });
        }
        Ok(vec![0; size as usize])
    }

    fn upload(
        &self,
        staging: &[u8],
        copies: Vec<(StreamRegion, &mut Vec<u8>)>,
    ) -> Result<(), UploadError> {
        for (region, _) in &copies {
            region.check(staging.len() as u64)?;
        }
        for (region, buffer) in copies {
            let range = region.offset as usize..(region.offset + region.size) as usize;
            buffer[..region.size as usize].copy_from_slice(&staging[range]);
        }
        Ok(())
    }
}

/// Reads a GPU buffer back to the host. Blocks on native until the copy is done.
pub async fn read_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
) -> anyhow::Result<Vec<u8>> {
    let size = buffer.size();
    if size == 0 {
        return Ok(Vec::new());
    }
    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_buffer_to_buffer(buffer, 0, &output_buffer, 0, size);
    queue.submit(iter::once(encoder.finish()));

    // NOTE: the mapping has to be requested before polling, otherwise the
    // receiver below never resolves.
    let buffer_slice = output_buffer.slice(..);
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    #[cfg(target_arch = "wasm32")]
    device
        .poll(wgpu::PollType::Poll)
        .map_err(|e| anyhow::anyhow!("Device poll failed: {e:?}"))?;
    #[cfg(not(target_arch = "wasm32"))]
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .map_err(|e| anyhow::anyhow!("Device poll failed: {e:?}"))?;
    rx.receive()
        .await
        .ok_or_else(|| anyhow::anyhow!("Buffer mapping was cancelled"))?
        .map_err(|e| anyhow::anyhow!("Failed to map readback buffer: {e:?}"))?;

    let data = buffer_slice.get_mapped_range().to_vec();
    output_buffer.unmap();
    Ok(data)
}
